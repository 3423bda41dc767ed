//! Command-line interface for alcop.

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::catalog;
use crate::config::Config;
use crate::engine::Dispatcher;
use crate::harness::{FixtureFrontend, Frontend};
use crate::report;
use crate::semantic::SemanticTree;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Diagnostic rules for resolved AL syntax trees.
///
/// Reads the resolved trees a host exports as JSON and reports LinterCop
/// style diagnostics. Plain `.al` sources are resolved with the built-in
/// fixture front end.
#[derive(Parser)]
#[command(name = "alcop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a tree export or a directory of them
    #[command(visible_alias = "lint")]
    Check(CheckArgs),
    /// List the diagnostic catalog
    Rules(RulesArgs),
}

/// Arguments for the check command.
#[derive(Parser)]
pub struct CheckArgs {
    /// Path to check (file or directory)
    pub path: PathBuf,

    /// Path to configuration YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty, json, or sarif
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Show suppressed diagnostics in output
    #[arg(long)]
    pub show_suppressed: bool,
}

/// Arguments for the rules command.
#[derive(Parser)]
pub struct RulesArgs {
    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

/// JSON files of an AL project that are not tree exports.
const PROJECT_MANIFESTS: &[&str] = &["app.json", "launch.json", "settings.json"];

/// Collect tree exports and sources under `root`.
fn collect_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            // Skip hidden and build output directories
            !(e.file_type().is_dir()
                && e.depth() > 0
                && (name.starts_with('.') || name == "target"))
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_input(entry.path()) {
            continue;
        }
        if is_project_manifest(entry.path()) {
            log::debug!("skipping project manifest {}", entry.path().display());
            continue;
        }
        files.push(entry.path().to_path_buf());
    }

    Ok(files)
}

fn is_input(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("json") | Some("al")
    )
}

fn is_project_manifest(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |name| {
            PROJECT_MANIFESTS
                .iter()
                .any(|m| m.eq_ignore_ascii_case(name))
        })
}

/// Load one input: a JSON export as is, an `.al` source through the front end.
pub fn load_tree(path: &Path) -> anyhow::Result<SemanticTree> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("al") => {
            let source = std::fs::read_to_string(path)?;
            FixtureFrontend.resolve(&path.to_string_lossy(), &source)
        }
        _ => SemanticTree::from_json_file(path),
    }
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<i32> {
    if args.format != "pretty" && args.format != "json" && args.format != "sarif" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty', 'json', or 'sarif'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let abs_path = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };
    let config_dir = if abs_path.is_dir() {
        abs_path.clone()
    } else {
        abs_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    };

    let config = match Config::load(args.config.as_deref(), &config_dir) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let dispatcher = Dispatcher::builtin()?.with_config(&config)?;

    let files = if abs_path.is_dir() {
        collect_files(&abs_path)?
    } else {
        vec![abs_path.clone()]
    };
    if files.is_empty() {
        eprintln!("Warning: no tree exports to check");
        return Ok(EXIT_SUCCESS);
    }

    let loaded: Vec<anyhow::Result<SemanticTree>> =
        files.par_iter().map(|f| load_tree(f)).collect();
    let mut trees = Vec::with_capacity(loaded.len());
    let mut load_failures = 0;
    for (file, tree) in files.iter().zip(loaded) {
        match tree {
            Ok(tree) => trees.push(tree),
            Err(e) => {
                log::warn!("skipping {}: {:#}", file.display(), e);
                load_failures += 1;
            }
        }
    }

    let result = dispatcher.analyze_all(&trees);

    let path_str = args.path.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_json(&path_str, &result)?,
        "sarif" => report::write_sarif(&abs_path, dispatcher.catalog(), &result)?,
        _ => report::write_pretty(&path_str, &result, args.show_suppressed),
    }

    if load_failures > 0 {
        eprintln!("Error: {} of {} inputs could not be loaded", load_failures, files.len());
        return Ok(EXIT_ERROR);
    }
    if result.has_errors() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the rules command.
pub fn run_rules(args: &RulesArgs) -> anyhow::Result<i32> {
    let catalog = catalog::init()?;
    match args.format.as_str() {
        "json" => report::write_rules_json(&catalog)?,
        "pretty" => report::write_rules_pretty(&catalog),
        other => {
            eprintln!("Error: invalid format {:?}, must be 'pretty' or 'json'", other);
            return Ok(EXIT_ERROR);
        }
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_files_skips_hidden_dirs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".alpackages")).unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join(".alpackages/dep.json"), "{}").unwrap();
        fs::write(dir.path().join("src/b.json"), "{}").unwrap();
        fs::write(dir.path().join("src/a.al"), "").unwrap();
        fs::write(dir.path().join("src/notes.md"), "").unwrap();

        let files = collect_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.al", "b.json"]);
    }

    #[test]
    fn test_collect_files_skips_project_manifests() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("app.json"), "{ \"id\": \"x\" }").unwrap();
        fs::write(dir.path().join("src/Launch.json"), "{}").unwrap();
        fs::write(dir.path().join("src/Cust.Codeunit.json"), "{}").unwrap();

        let files = collect_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/Cust.Codeunit.json"));
    }

    #[test]
    fn test_invalid_format_is_usage_error() {
        let args = CheckArgs {
            path: PathBuf::from("."),
            config: None,
            format: "xml".to_string(),
            show_suppressed: false,
        };
        assert_eq!(run_check(&args).unwrap(), EXIT_ERROR);
        let rules = RulesArgs {
            format: "xml".to_string(),
        };
        assert_eq!(run_rules(&rules).unwrap(), EXIT_ERROR);
    }
}
