//! Output formatting for analysis results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration

use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::catalog::{help_uri, Catalog, DiagnosticDescriptor, Severity};
use crate::engine::{AnalysisResult, Diagnostic, PragmaAction, RuleFault};

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub trees_analyzed: usize,
    pub diagnostics: Vec<JsonDiagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<JsonSuppressedDiagnostic>,
    pub suppressed_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faults: Vec<JsonFault>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub id: String,
    pub severity: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub help_uri: String,
}

/// Suppressed diagnostic with the directive that silenced it.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSuppressedDiagnostic {
    pub diagnostic: JsonDiagnostic,
    pub pragma_line: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonFault {
    pub rule: String,
    pub file: String,
    pub line: usize,
    pub message: String,
}

/// Catalog entry as listed by `alcop rules --format json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRule {
    pub id: String,
    pub name: String,
    pub category: String,
    pub severity: Severity,
    pub enabled_by_default: bool,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
    pub help_uri: String,
}

/// Build the JSON report for `result`.
pub fn json_report(path: &str, result: &AnalysisResult) -> JsonReport {
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        trees_analyzed: result.trees_analyzed,
        diagnostics: result.diagnostics.iter().map(diagnostic_to_json).collect(),
        suppressed: result
            .suppressed
            .iter()
            .map(|s| JsonSuppressedDiagnostic {
                diagnostic: diagnostic_to_json(&s.diagnostic),
                pragma_line: s.pragma.line,
            })
            .collect(),
        suppressed_count: result.suppressed_count(),
        faults: result.faults.iter().map(fault_to_json).collect(),
    }
}

/// Write results in JSON format.
pub fn write_json(path: &str, result: &AnalysisResult) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&json_report(path, result))?;
    println!("{}", json);
    Ok(())
}

fn diagnostic_to_json(d: &Diagnostic) -> JsonDiagnostic {
    JsonDiagnostic {
        id: d.id.clone(),
        severity: d.severity.to_string(),
        file: d.file.clone(),
        line: d.line(),
        column: d.column(),
        message: d.message.clone(),
        help_uri: help_uri(&d.id),
    }
}

fn fault_to_json(f: &RuleFault) -> JsonFault {
    JsonFault {
        rule: f.rule_id.clone(),
        file: f.file.clone(),
        line: f.span.start_line,
        message: f.message.clone(),
    }
}

/// Catalog listing, primaries and aliases alike.
pub fn rules_json(catalog: &Catalog) -> Vec<JsonRule> {
    catalog.descriptors().iter().map(rule_to_json).collect()
}

fn rule_to_json(d: &DiagnosticDescriptor) -> JsonRule {
    JsonRule {
        id: d.id.to_string(),
        name: d.name.to_string(),
        category: d.category.to_string(),
        severity: d.severity,
        enabled_by_default: d.enabled_by_default,
        title: d.title.to_string(),
        alias_of: d.alias_of.map(str::to_string),
        help_uri: d.help_uri(),
    }
}

// =============================================================================
// SARIF Format
// =============================================================================

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "alcop";
const INFO_URI: &str = "https://github.com/StefanMaron/BusinessCentral.LinterCop";

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifReport {
    pub version: String,
    #[serde(rename = "$schema")]
    pub schema: String,
    pub runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifDriver {
    pub name: String,
    pub version: String,
    #[serde(rename = "informationUri")]
    pub information_uri: String,
    pub rules: Vec<SarifRule>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRule {
    pub id: String,
    pub name: String,
    #[serde(rename = "shortDescription")]
    pub short_description: SarifMessage,
    #[serde(rename = "fullDescription", skip_serializing_if = "Option::is_none")]
    pub full_description: Option<SarifMessage>,
    #[serde(rename = "helpUri")]
    pub help_uri: String,
    #[serde(rename = "defaultConfiguration")]
    pub default_config: SarifRuleConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRuleConfig {
    pub level: String,
    pub enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifResult {
    #[serde(rename = "ruleId")]
    pub rule_id: String,
    pub level: String,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    pub physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    pub artifact_location: SarifArtifact,
    pub region: SarifRegion,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifArtifact {
    pub uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRegion {
    #[serde(rename = "startLine")]
    pub start_line: usize,
    #[serde(rename = "startColumn")]
    pub start_column: usize,
    #[serde(rename = "endLine")]
    pub end_line: usize,
    #[serde(rename = "endColumn")]
    pub end_column: usize,
}

fn map_severity_to_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "note",
        Severity::Hidden => "none",
    }
}

fn make_relative_path(file_path: &str, base_path: &Path) -> String {
    if base_path.to_string_lossy().is_empty() {
        return file_path.to_string();
    }

    let file = Path::new(file_path);

    // Single file scan: just the file name.
    if file == base_path {
        return file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string());
    }

    file.strip_prefix(base_path)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| file_path.to_string())
}

/// Build the SARIF log for `result`, with rule metadata from `catalog`.
pub fn sarif_report(base_path: &Path, catalog: &Catalog, result: &AnalysisResult) -> SarifReport {
    let reported: BTreeSet<&str> = result.diagnostics.iter().map(|d| d.id.as_str()).collect();

    let rules: Vec<SarifRule> = reported
        .iter()
        .filter_map(|id| catalog.get(id))
        .map(|d| SarifRule {
            id: d.id.to_string(),
            name: d.name.to_string(),
            short_description: SarifMessage {
                text: d.title.to_string(),
            },
            full_description: (!d.description.is_empty()).then(|| SarifMessage {
                text: d.description.to_string(),
            }),
            help_uri: d.help_uri(),
            default_config: SarifRuleConfig {
                level: map_severity_to_level(d.severity).to_string(),
                enabled: d.enabled_by_default,
            },
        })
        .collect();

    let results: Vec<SarifResult> = result
        .diagnostics
        .iter()
        .map(|d| SarifResult {
            rule_id: d.id.clone(),
            level: map_severity_to_level(d.severity).to_string(),
            message: SarifMessage {
                text: d.message.clone(),
            },
            locations: vec![SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifact {
                        uri: make_relative_path(&d.file, base_path),
                    },
                    region: SarifRegion {
                        start_line: d.span.start_line.max(1),
                        start_column: d.span.start_col.max(1),
                        end_line: d.span.end_line.max(1),
                        end_column: d.span.end_col.max(1),
                    },
                },
            }],
        })
        .collect();

    SarifReport {
        version: SARIF_VERSION.to_string(),
        schema: SARIF_SCHEMA.to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: TOOL_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    information_uri: INFO_URI.to_string(),
                    rules,
                },
            },
            results,
        }],
    }
}

/// Write results in SARIF format.
pub fn write_sarif(base_path: &Path, catalog: &Catalog, result: &AnalysisResult) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&sarif_report(base_path, catalog, result))?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(path: &str, result: &AnalysisResult, show_suppressed: bool) {
    println!();
    print!("  ");
    print!("{}", "alcop".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Checking: ".dimmed());
    println!("{}", path);
    print!("  {}", "Trees:    ".dimmed());
    println!("{}", result.trees_analyzed);
    println!();

    if !result.diagnostics.is_empty() {
        write_diagnostics(&result.diagnostics);
        println!();
    }

    if !result.suppressed.is_empty() {
        write_suppressed_summary(result, show_suppressed);
        println!();
    }

    if !result.faults.is_empty() {
        write_faults(&result.faults);
        println!();
    }

    write_final_status(result);
    println!();
}

fn write_diagnostics(diagnostics: &[Diagnostic]) {
    println!("  {} ({}):", "Diagnostics".bold(), diagnostics.len());
    println!();

    for d in diagnostics {
        write_severity_tag(d.severity);
        print!("   ");
        print!("{:<8}", d.id.dimmed());
        print!("{}", d.file.blue());
        print!("{}", format!(":{}:{}", d.line(), d.column()).dimmed());
        println!();

        println!("            {}", d.message);
        println!();
    }
}

fn write_severity_tag(severity: Severity) {
    match severity {
        Severity::Error => print!("    {} ", "ERROR".red()),
        Severity::Warning => print!("    {} ", "WARN ".yellow()),
        Severity::Info => print!("    {} ", "INFO ".blue()),
        Severity::Hidden => print!("    {} ", "HIDE ".dimmed()),
    }
}

fn write_suppressed_summary(result: &AnalysisResult, show_details: bool) {
    println!("  {} ({}):", "Suppressed".dimmed(), result.suppressed_count());

    if !show_details {
        println!("    {}", "(use --show-suppressed to see details)".dimmed());
        return;
    }

    println!();
    for s in &result.suppressed {
        let d = &s.diagnostic;
        print!("    {:<8}", d.id.dimmed());
        print!("{}", d.file.blue());
        print!("{}", format!(":{}", d.line()).dimmed());
        println!();
        if s.pragma.action == PragmaAction::Disable {
            println!(
                "            {}",
                format!("#pragma warning disable at line {}", s.pragma.line).dimmed()
            );
        }
    }
}

fn write_faults(faults: &[RuleFault]) {
    println!("  {} ({}):", "Rule faults".yellow().bold(), faults.len());
    for f in faults {
        print!("    {:<24}", f.rule_id.dimmed());
        print!("{}", f.file.blue());
        println!("{}", format!(":{}", f.span.start_line).dimmed());
        println!("            {}", f.message);
    }
}

fn write_final_status(result: &AnalysisResult) {
    let count = |severity: Severity| {
        result
            .diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    };
    print!(
        "  {}",
        format!(
            "{} errors, {} warnings, {} info",
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Info)
        )
        .dimmed()
    );
    print!("  ");

    if result.has_errors() {
        print!("{}", "FAILED".red());
    } else {
        print!("{}", "PASSED".green());
    }
    println!();
}

/// List the catalog as a table.
pub fn write_rules_pretty(catalog: &Catalog) {
    println!();
    for d in catalog.descriptors() {
        let state = if d.enabled_by_default {
            "on ".green()
        } else {
            "off".dimmed()
        };
        print!("  {}  {}  {:<8}", d.id.bold(), state, d.severity.to_string());
        print!("{}", d.title);
        if let Some(primary) = d.alias_of {
            print!("  {}", format!("(alias of {})", primary).dimmed());
        }
        println!();
    }
    println!();
}

/// List the catalog as JSON.
pub fn write_rules_json(catalog: &Catalog) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&rules_json(catalog))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::LineIndex;

    fn result() -> AnalysisResult {
        let span = LineIndex::new("a\n  Rec.Modify();").span(4, 16);
        let mut result = AnalysisResult::new();
        result.trees_analyzed = 1;
        result.add_diagnostic(Diagnostic {
            id: "LC0040".to_string(),
            severity: Severity::Info,
            file: "src/Cust.Codeunit.al".to_string(),
            span,
            message: "Explicitly set the RunTrigger parameter.".to_string(),
        });
        result
    }

    #[test]
    fn test_json_report() {
        let report = json_report("src", &result());
        assert_eq!(report.trees_analyzed, 1);
        let d = &report.diagnostics[0];
        assert_eq!((d.line, d.column), (2, 3));
        assert_eq!(d.severity, "info");
        assert!(d.help_uri.ends_with("LC0040"));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("suppressed").is_none());
        assert_eq!(json["suppressed_count"], 0);
    }

    #[test]
    fn test_sarif_rules_come_from_catalog() {
        let catalog = Catalog::builtin().unwrap();
        let sarif = sarif_report(Path::new("src"), &catalog, &result());
        let run = &sarif.runs[0];
        assert_eq!(run.tool.driver.rules.len(), 1);
        assert_eq!(run.tool.driver.rules[0].name, "ExplicitlySetRunTrigger");
        assert_eq!(run.results[0].level, "note");
        assert_eq!(
            run.results[0].locations[0].physical_location.artifact_location.uri,
            "Cust.Codeunit.al"
        );

        let json = serde_json::to_value(&sarif).unwrap();
        assert_eq!(json["version"], "2.1.0");
        assert!(json["$schema"].as_str().unwrap().contains("sarif-schema-2.1.0"));
    }

    #[test]
    fn test_relative_paths() {
        assert_eq!(make_relative_path("a/b.al", Path::new("")), "a/b.al");
        assert_eq!(make_relative_path("a/b.al", Path::new("a/b.al")), "b.al");
        assert_eq!(make_relative_path("x/b.al", Path::new("a")), "x/b.al");
    }

    #[test]
    fn test_rules_listing_includes_aliases() {
        let catalog = Catalog::builtin().unwrap();
        let rules = rules_json(&catalog);
        assert_eq!(rules.len(), catalog.len());
        assert!(rules.iter().any(|r| r.alias_of.is_some()));
    }
}
