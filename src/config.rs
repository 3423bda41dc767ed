//! Analyzer configuration.
//!
//! A configuration file adjusts which descriptors report and at what
//! severity, and which documents are skipped.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::{is_valid_id, Catalog, DiagnosticDescriptor, Severity};

/// File names probed, in order, when no configuration is given explicitly.
pub const CONFIG_FILE_NAMES: &[&str] = &["alcop.yaml", ".alcop.yaml", "alcop.yml", ".alcop.yml"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Per-descriptor overrides keyed by id
    #[serde(default)]
    pub rules: BTreeMap<String, RuleSetting>,
    /// Glob patterns for document paths to skip (e.g., "**/generated/**")
    #[serde(default)]
    pub excluded_paths: Vec<String>,
}

/// Override for one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleSetting {
    pub action: RuleAction,
}

/// What to do with a descriptor's diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    /// Keep the catalog defaults
    Default,
    /// Do not report
    None,
    Hidden,
    Info,
    Warning,
    Error,
}

impl RuleAction {
    fn severity(self) -> Option<Severity> {
        match self {
            RuleAction::Hidden => Some(Severity::Hidden),
            RuleAction::Info => Some(Severity::Info),
            RuleAction::Warning => Some(Severity::Warning),
            RuleAction::Error => Some(Severity::Error),
            RuleAction::Default | RuleAction::None => None,
        }
    }
}

impl From<Severity> for RuleAction {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Hidden => RuleAction::Hidden,
            Severity::Info => RuleAction::Info,
            Severity::Warning => RuleAction::Warning,
            Severity::Error => RuleAction::Error,
        }
    }
}

impl Config {
    /// Enable `ids` at their catalog severity, whatever their default.
    pub fn enabling<'a, I>(catalog: &Catalog, ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let rules = ids
            .into_iter()
            .filter_map(|id| catalog.get(id))
            .map(|d| {
                let setting = RuleSetting {
                    action: d.severity.into(),
                };
                (d.id.to_string(), setting)
            })
            .collect();
        Self {
            rules,
            ..Default::default()
        }
    }

    /// Parse a configuration from a YAML (or JSON) file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Find a configuration file in `dir`.
    pub fn discover<P: AsRef<Path>>(dir: P) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.as_ref().join(name))
            .find(|path| path.is_file())
    }

    /// Load the explicit file, else a discovered one, else defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(dir),
        };
        let Some(path) = path else {
            return Ok(Self::default());
        };

        log::debug!("loading configuration from {}", path.display());
        let config = Self::parse_file(&path)
            .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", path.display(), e))?;
        validate(&config)?;
        Ok(config)
    }

    /// Severity a descriptor reports at, or `None` when it is disabled.
    pub fn effective_severity(&self, descriptor: &DiagnosticDescriptor) -> Option<Severity> {
        match self.rules.get(descriptor.id).map(|s| s.action) {
            None | Some(RuleAction::Default) => {
                descriptor.enabled_by_default.then_some(descriptor.severity)
            }
            Some(action) => action.severity(),
        }
    }

    /// Compile `excluded_paths` into a matcher.
    pub fn exclusions(&self) -> anyhow::Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            let glob = Glob::new(pattern).map_err(|e| {
                anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e)
            })?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    for id in config.rules.keys() {
        if !is_valid_id(id) {
            anyhow::bail!("invalid rule id {:?} in rules, expected LC followed by four digits", id);
        }
    }

    for pattern in &config.excluded_paths {
        Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
rules:
  LC0040:
    action: warning
  LC0021: { action: none }
excluded_paths:
  - "**/generated/**"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules["LC0040"].action, RuleAction::Warning);
        validate(&config).unwrap();

        let catalog = Catalog::builtin().unwrap();
        let run_trigger = catalog.lookup("LC0040").unwrap();
        assert_eq!(config.effective_severity(run_trigger), Some(Severity::Warning));
        let confirm = catalog.lookup("LC0021").unwrap();
        assert_eq!(config.effective_severity(confirm), None);
    }

    #[test]
    fn test_defaults_follow_catalog() {
        let config = Config::default();
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(
            config.effective_severity(catalog.lookup("LC0006").unwrap()),
            Some(Severity::Error)
        );
        // Disabled by default.
        assert_eq!(config.effective_severity(catalog.lookup("LC0007").unwrap()), None);

        let enabled: Config = serde_yaml::from_str("rules: { LC0007: { action: info } }").unwrap();
        assert_eq!(
            enabled.effective_severity(catalog.lookup("LC0007").unwrap()),
            Some(Severity::Info)
        );
    }

    #[test]
    fn test_enabling_overrides_default_disabled() {
        let catalog = Catalog::builtin().unwrap();
        let config = Config::enabling(&catalog, ["LC0007", "LC9999"]);
        assert_eq!(config.rules.len(), 1);
        let descriptor = catalog.lookup("LC0007").unwrap();
        assert_eq!(config.effective_severity(descriptor), Some(descriptor.severity));
    }

    #[test]
    fn test_validate_rejects_bad_entries() {
        let bad_id: Config = serde_yaml::from_str("rules: { RunTrigger: { action: none } }").unwrap();
        assert!(validate(&bad_id).is_err());

        let bad_glob = Config {
            excluded_paths: vec!["[".to_string()],
            ..Default::default()
        };
        assert!(validate(&bad_glob).is_err());
        assert!(serde_yaml::from_str::<Config>("rules: { LC0040: { action: loud } }").is_err());
    }

    #[test]
    fn test_exclusions_match_paths() {
        let config = Config {
            excluded_paths: vec!["**/generated/**".to_string()],
            ..Default::default()
        };
        let set = config.exclusions().unwrap();
        assert!(set.is_match("src/generated/Cust.Table.al"));
        assert!(!set.is_match("src/Cust.Table.al"));
    }

    #[test]
    fn test_discover_and_load() {
        let dir = TempDir::new().unwrap();
        assert!(Config::discover(dir.path()).is_none());
        assert!(Config::load(None, dir.path()).unwrap().rules.is_empty());

        fs::write(dir.path().join(".alcop.yaml"), "rules:\n  LC0040: { action: error }\n").unwrap();
        let found = Config::discover(dir.path()).unwrap();
        assert!(found.ends_with(".alcop.yaml"));
        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config.rules["LC0040"].action, RuleAction::Error);

        let missing = dir.path().join("nope.yaml");
        assert!(Config::load(Some(&missing), dir.path()).is_err());
    }
}
