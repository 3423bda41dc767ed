//! Dispatcher that binds rules to node kinds and drives analysis.

use globset::GlobSet;
use rayon::prelude::*;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::catalog::{self, ids, Catalog, Severity};
use crate::config::Config;
use crate::rules::{builtin_rules, RuleRegistration};
use crate::semantic::{NodeHandle, NodeKind, SemanticTree};

use super::suppress::{filter_suppressed, parse_pragmas};
use super::{AnalysisResult, Diagnostic, EngineError, RuleContext, RuleFault};

/// Invokes every subscribed rule once per node occurrence.
///
/// Immutable once configured, so one dispatcher can serve any number of
/// concurrent analyses.
pub struct Dispatcher {
    catalog: Arc<Catalog>,
    rules: Vec<RuleRegistration>,
    by_kind: HashMap<NodeKind, Vec<usize>>,
    /// Effective severity per enabled descriptor id.
    severities: HashMap<&'static str, Severity>,
    exclusions: GlobSet,
}

impl Dispatcher {
    /// Create a dispatcher with no rules and the catalog defaults.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let severities = effective_severities(&catalog, &Config::default());
        Self {
            catalog,
            rules: Vec::new(),
            by_kind: HashMap::new(),
            severities,
            exclusions: GlobSet::empty(),
        }
    }

    /// The process-wide catalog with every built-in rule registered.
    pub fn builtin() -> Result<Self, EngineError> {
        let mut dispatcher = Self::new(catalog::init()?);
        for rule in builtin_rules() {
            dispatcher.register(*rule)?;
        }
        Ok(dispatcher)
    }

    /// Apply severity overrides and path exclusions.
    pub fn with_config(mut self, config: &Config) -> Result<Self, EngineError> {
        self.exclusions = config
            .exclusions()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        self.severities = effective_severities(&self.catalog, config);
        Ok(self)
    }

    /// Register a rule and subscribe it to its node kinds.
    pub fn register(&mut self, rule: RuleRegistration) -> Result<(), EngineError> {
        if self.rules.iter().any(|r| r.rule_id == rule.rule_id) {
            return Err(EngineError::DuplicateRule(rule.rule_id.to_string()));
        }
        for id in rule.descriptors {
            if !self.catalog.contains(id) {
                return Err(EngineError::UnknownDescriptor {
                    rule: rule.rule_id.to_string(),
                    id: id.to_string(),
                });
            }
        }

        let index = self.rules.len();
        for kind in rule.kinds {
            let subscribers = self.by_kind.entry(*kind).or_default();
            if !subscribers.contains(&index) {
                subscribers.push(index);
            }
        }
        log::debug!("registered rule {} for {:?}", rule.rule_id, rule.kinds);
        self.rules.push(rule);
        Ok(())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rules(&self) -> &[RuleRegistration] {
        &self.rules
    }

    /// Severity diagnostics of `id` report at, `None` when disabled.
    pub fn severity_for(&self, id: &str) -> Option<Severity> {
        self.severities.get(id).copied()
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclusions.is_match(path)
    }

    /// Analyze one tree, visiting its nodes in document order.
    pub fn analyze(&self, tree: &SemanticTree) -> AnalysisResult {
        let mut result = AnalysisResult::new();
        if self.is_excluded(tree.path()) {
            log::debug!("skipping excluded {}", tree.path());
            return result;
        }

        log::debug!("analyzing {} ({} nodes)", tree.path(), tree.node_count());
        for node in tree.nodes() {
            self.visit(node, &mut result);
        }
        self.finish(tree, &mut result);
        result
    }

    /// Close the analysis of `tree`: apply its pragma regions and count it.
    ///
    /// Hosts driving `visit` themselves call this once they stop visiting
    /// the tree's nodes.
    pub fn finish(&self, tree: &SemanticTree, result: &mut AnalysisResult) {
        if let Some(source) = tree.source() {
            let pragmas = parse_pragmas(source);
            let (active, suppressed) =
                filter_suppressed(std::mem::take(&mut result.diagnostics), &pragmas);
            result.diagnostics = active;
            result.suppressed.extend(suppressed);
        }
        result.trees_analyzed += 1;
    }

    /// Analyze independent trees in parallel; results keep the input order.
    pub fn analyze_all(&self, trees: &[SemanticTree]) -> AnalysisResult {
        let results: Vec<AnalysisResult> = trees.par_iter().map(|t| self.analyze(t)).collect();
        let mut merged = AnalysisResult::new();
        for result in results {
            merged.merge(result);
        }
        merged
    }

    /// Run every rule subscribed to `node`'s kind.
    ///
    /// Hosts streaming their own traversal call this per node and may stop
    /// at any point. Pragma regions are applied by `finish`, not here.
    pub fn visit(&self, node: NodeHandle<'_>, result: &mut AnalysisResult) {
        result.nodes_visited += 1;
        let Some(subscribers) = self.by_kind.get(&node.kind()) else {
            return;
        };

        for &index in subscribers {
            let rule = &self.rules[index];
            if !rule.descriptors.iter().any(|id| self.severities.contains_key(id)) {
                continue;
            }

            let ctx = RuleContext::new(node, &self.catalog, rule.rule_id, rule.descriptors);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (rule.check)(&ctx)))
                .unwrap_or_else(|payload| {
                    Err(anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref())))
                });

            match outcome {
                Ok(Some(diagnostic)) => self.report(diagnostic, result),
                Ok(None) => {}
                Err(error) => self.record_fault(rule, node, error, result),
            }
        }
    }

    fn report(&self, mut diagnostic: Diagnostic, result: &mut AnalysisResult) {
        if let Some(severity) = self.severity_for(&diagnostic.id) {
            diagnostic.severity = severity;
            result.add_diagnostic(diagnostic);
        }
    }

    fn record_fault(
        &self,
        rule: &RuleRegistration,
        node: NodeHandle<'_>,
        error: anyhow::Error,
        result: &mut AnalysisResult,
    ) {
        let file = node.tree().path();
        let message = format!("{:#}", error);
        log::warn!(
            "rule {} failed at {}:{}: {}",
            rule.rule_id,
            file,
            node.span(),
            message
        );

        if let (Some(severity), Some(descriptor)) = (
            self.severity_for(ids::ERROR_IN_RULE),
            self.catalog.get(ids::ERROR_IN_RULE),
        ) {
            result.add_diagnostic(Diagnostic {
                id: descriptor.id.to_string(),
                severity,
                file: file.to_string(),
                span: node.span(),
                message: descriptor.format_message(&[rule.rule_id, &message]),
            });
        }
        result.faults.push(RuleFault {
            rule_id: rule.rule_id.to_string(),
            file: file.to_string(),
            span: node.span(),
            message,
        });
    }
}

fn effective_severities(catalog: &Catalog, config: &Config) -> HashMap<&'static str, Severity> {
    catalog
        .primaries()
        .filter_map(|d| config.effective_severity(d).map(|s| (d.id, s)))
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
