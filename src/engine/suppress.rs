//! Region suppression of diagnostics via pragmas.
//!
//! Supports the directives of the language:
//! - `#pragma warning disable LC0040, LC0021` (no ids: every diagnostic)
//! - `#pragma warning restore LC0040` (no ids: every diagnostic)
//!
//! A directive applies from its own position to the end of the document or
//! the matching `restore`.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Diagnostic, SuppressedDiagnostic};

/// Whether a pragma opens or closes a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PragmaAction {
    Disable,
    Restore,
}

/// A `#pragma warning` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pragma {
    pub action: PragmaAction,
    /// Ids named by the directive; empty means all.
    pub ids: Vec<String>,
    /// Line of the directive (1-indexed)
    pub line: usize,
    /// Byte offset of the directive
    pub offset: usize,
}

impl Pragma {
    pub fn applies_to(&self, id: &str) -> bool {
        self.ids.is_empty() || self.ids.iter().any(|i| i.eq_ignore_ascii_case(id))
    }
}

lazy_static::lazy_static! {
    static ref PRAGMA_PATTERN: Regex =
        Regex::new(r"(?mi)^[ \t]*#pragma[ \t]+warning[ \t]+(disable|restore)\b([^\r\n]*)").unwrap();
}

/// Parse pragma directives from source text, in document order.
pub fn parse_pragmas(source: &str) -> Vec<Pragma> {
    PRAGMA_PATTERN
        .captures_iter(source)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let action = match caps.get(1)?.as_str().to_ascii_lowercase().as_str() {
                "disable" => PragmaAction::Disable,
                _ => PragmaAction::Restore,
            };
            let rest = caps.get(2).map_or("", |m| m.as_str());
            // Trailing comment.
            let rest = rest.split("//").next().unwrap_or("");
            let ids = rest
                .split(',')
                .map(|id| id.trim())
                .filter(|id| !id.is_empty())
                .map(|id| id.to_string())
                .collect();
            Some(Pragma {
                action,
                ids,
                line: source[..whole.start()].matches('\n').count() + 1,
                offset: whole.start(),
            })
        })
        .collect()
}

/// The disabling pragma in effect for `id` at byte `offset`, if any.
pub fn active_pragma<'p>(pragmas: &'p [Pragma], id: &str, offset: usize) -> Option<&'p Pragma> {
    let mut current = None;
    for pragma in pragmas.iter().take_while(|p| p.offset <= offset) {
        if !pragma.applies_to(id) {
            continue;
        }
        current = match pragma.action {
            PragmaAction::Disable => Some(pragma),
            PragmaAction::Restore => None,
        };
    }
    current
}

/// Separate diagnostics into active and suppressed.
pub fn filter_suppressed(
    diagnostics: Vec<Diagnostic>,
    pragmas: &[Pragma],
) -> (Vec<Diagnostic>, Vec<SuppressedDiagnostic>) {
    if pragmas.is_empty() {
        return (diagnostics, Vec::new());
    }

    let mut active = Vec::new();
    let mut suppressed = Vec::new();

    for diagnostic in diagnostics {
        match active_pragma(pragmas, &diagnostic.id, diagnostic.span.start_byte) {
            Some(pragma) => suppressed.push(SuppressedDiagnostic {
                pragma: pragma.clone(),
                diagnostic,
            }),
            None => active.push(diagnostic),
        }
    }

    (active, suppressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Severity;
    use crate::semantic::LineIndex;

    const SOURCE: &str = "codeunit 50100 C
{
    procedure A()
    begin
#pragma warning disable LC0040, LC0021 // legacy
        Cust.Modify();
#pragma warning restore LC0040
        Cust.Modify();
#pragma warning disable
        Cust.Modify();
    end;
}
";

    fn diagnostic_at(id: &str, needle_index: usize) -> Diagnostic {
        let offset = SOURCE
            .match_indices("Cust.Modify")
            .nth(needle_index)
            .map(|(i, _)| i)
            .unwrap();
        Diagnostic {
            id: id.to_string(),
            severity: Severity::Info,
            file: "c.al".to_string(),
            span: LineIndex::new(SOURCE).span(offset, offset + 13),
            message: "m".to_string(),
        }
    }

    #[test]
    fn test_parse_pragmas() {
        let pragmas = parse_pragmas(SOURCE);
        assert_eq!(pragmas.len(), 3);
        assert_eq!(pragmas[0].action, PragmaAction::Disable);
        assert_eq!(pragmas[0].ids, vec!["LC0040", "LC0021"]);
        assert_eq!(pragmas[0].line, 5);
        assert_eq!(pragmas[1].action, PragmaAction::Restore);
        assert!(pragmas[2].ids.is_empty());
    }

    #[test]
    fn test_regions() {
        let pragmas = parse_pragmas(SOURCE);
        let diagnostics = vec![
            diagnostic_at("LC0040", 0),
            diagnostic_at("LC0040", 1),
            diagnostic_at("LC0021", 1),
            diagnostic_at("LC0040", 2),
        ];
        let (active, suppressed) = filter_suppressed(diagnostics, &pragmas);

        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "LC0040");
        assert_eq!(active[0].line(), 8);

        assert_eq!(suppressed.len(), 3);
        // LC0021 was never restored.
        assert!(suppressed
            .iter()
            .any(|s| s.diagnostic.id == "LC0021" && s.pragma.line == 5));
        assert!(suppressed.iter().any(|s| s.pragma.ids.is_empty()));
    }

    #[test]
    fn test_no_pragmas_keeps_everything() {
        let (active, suppressed) = filter_suppressed(vec![diagnostic_at("LC0040", 0)], &[]);
        assert_eq!(active.len(), 1);
        assert!(suppressed.is_empty());
    }
}
