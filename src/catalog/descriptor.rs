//! Diagnostic descriptor metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix shared by every diagnostic id of this analyzer set.
pub const ID_PREFIX: &str = "LC";

/// Documentation pages live under this URL, one page per id.
pub const HELP_URI_BASE: &str = "https://github.com/StefanMaron/BusinessCentral.LinterCop/wiki/";

/// Severity levels, ordered `Hidden < Info < Warning < Error`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Hidden,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Hidden => write!(f, "hidden"),
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hidden" => Ok(Severity::Hidden),
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Immutable metadata describing one kind of diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticDescriptor {
    /// Stable id, `LC` followed by four digits.
    pub id: &'static str,
    /// Unique descriptor name (ids may be shared by documented aliases).
    pub name: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub enabled_by_default: bool,
    pub title: &'static str,
    /// Message template with positional `{0}`, `{1}`, ... placeholders.
    pub message: &'static str,
    pub description: &'static str,
    /// Name of the primary descriptor this one shares its id with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<&'static str>,
}

impl DiagnosticDescriptor {
    /// Documentation link for this descriptor's id.
    pub fn help_uri(&self) -> String {
        help_uri(self.id)
    }

    pub fn is_alias(&self) -> bool {
        self.alias_of.is_some()
    }

    /// Fill the message template's `{n}` placeholders with `args`.
    ///
    /// Placeholders without a matching argument are left as written.
    pub fn format_message(&self, args: &[&str]) -> String {
        format_template(self.message, args)
    }
}

/// Documentation link for a diagnostic id.
pub fn help_uri(id: &str) -> String {
    format!("{}{}", HELP_URI_BASE, id)
}

/// Check an id against the `LC` + four digits format.
pub fn is_valid_id(id: &str) -> bool {
    id.strip_prefix(ID_PREFIX)
        .map_or(false, |n| n.len() == 4 && n.bytes().all(|b| b.is_ascii_digit()))
}

fn format_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            let arg = args.get(index)?;
            Some((arg, close))
        });
        match replaced {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
