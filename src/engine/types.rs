//! Core types for analysis results.

use serde::{Deserialize, Serialize};

use crate::catalog::Severity;
use crate::semantic::Span;

use super::suppress::Pragma;

/// A single reported occurrence of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Id of the descriptor this diagnostic was reported under.
    pub id: String,
    /// Effective severity after configuration.
    pub severity: Severity,
    pub file: String,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn line(&self) -> usize {
        self.span.start_line
    }

    pub fn column(&self) -> usize {
        self.span.start_col
    }

    /// Key for comparing diagnostics irrespective of their message text.
    pub fn key(&self) -> String {
        format!("{}|{}|{}", self.id, self.file, self.span.start_byte)
    }
}

/// A diagnostic silenced by a `#pragma warning disable` region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressedDiagnostic {
    pub diagnostic: Diagnostic,
    pub pragma: Pragma,
}

/// A rule that failed on a node. Recorded, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFault {
    pub rule_id: String,
    pub file: String,
    pub span: Span,
    pub message: String,
}

/// Results of analyzing one or more trees.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub diagnostics: Vec<Diagnostic>,
    #[serde(default)]
    pub suppressed: Vec<SuppressedDiagnostic>,
    #[serde(default)]
    pub faults: Vec<RuleFault>,
    /// Number of trees analyzed (excluded trees are not counted)
    pub trees_analyzed: usize,
    #[serde(default)]
    pub nodes_visited: usize,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge another result into this one.
    pub fn merge(&mut self, other: AnalysisResult) {
        self.diagnostics.extend(other.diagnostics);
        self.suppressed.extend(other.suppressed);
        self.faults.extend(other.faults);
        self.trees_analyzed += other.trees_analyzed;
        self.nodes_visited += other.nodes_visited;
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Check if there are any error-severity diagnostics.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Diagnostics reported under `id`.
    pub fn with_id<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics.iter().filter(move |d| d.id == id)
    }

    pub fn count(&self, id: &str) -> usize {
        self.with_id(id).count()
    }

    pub fn suppressed_count(&self) -> usize {
        self.suppressed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::LineIndex;

    fn diagnostic(id: &str, severity: Severity) -> Diagnostic {
        Diagnostic {
            id: id.to_string(),
            severity,
            file: "a.al".to_string(),
            span: LineIndex::new("abc").span(0, 3),
            message: "m".to_string(),
        }
    }

    #[test]
    fn test_merge_and_counts() {
        let mut a = AnalysisResult::new();
        a.add_diagnostic(diagnostic("LC0040", Severity::Info));
        a.trees_analyzed = 1;

        let mut b = AnalysisResult::new();
        b.add_diagnostic(diagnostic("LC0040", Severity::Info));
        b.add_diagnostic(diagnostic("LC0021", Severity::Warning));
        b.trees_analyzed = 1;

        a.merge(b);
        assert_eq!(a.trees_analyzed, 2);
        assert_eq!(a.count("LC0040"), 2);
        assert_eq!(a.count("LC0021"), 1);
        assert!(!a.has_errors());

        a.add_diagnostic(diagnostic("LC0006", Severity::Error));
        assert!(a.has_errors());
    }

    #[test]
    fn test_position_accessors() {
        let d = diagnostic("LC0040", Severity::Info);
        assert_eq!((d.line(), d.column()), (1, 1));
        assert_eq!(d.key(), "LC0040|a.al|0");
    }
}
