//! The per-node context handed to rule checks.

use anyhow::{bail, Context as _};

use crate::catalog::Catalog;
use crate::semantic::{NodeHandle, SemanticTree, Span, SymbolRef};

use super::{obsolete, Diagnostic};

/// Read-only view a rule receives for one node occurrence.
///
/// Valid for a single check call; nothing in it may be retained.
pub struct RuleContext<'a> {
    node: NodeHandle<'a>,
    catalog: &'a Catalog,
    rule_id: &'static str,
    descriptors: &'static [&'static str],
}

impl<'a> RuleContext<'a> {
    pub fn new(
        node: NodeHandle<'a>,
        catalog: &'a Catalog,
        rule_id: &'static str,
        descriptors: &'static [&'static str],
    ) -> Self {
        Self {
            node,
            catalog,
            rule_id,
            descriptors,
        }
    }

    pub fn node(&self) -> NodeHandle<'a> {
        self.node
    }

    pub fn tree(&self) -> &'a SemanticTree {
        self.node.tree()
    }

    pub fn file(&self) -> &'a str {
        self.node.tree().path()
    }

    pub fn rule_id(&self) -> &'static str {
        self.rule_id
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn containing_symbol(&self) -> Option<SymbolRef<'a>> {
        self.node.containing_symbol()
    }

    /// Whether the node lives in obsolete code. Rules call this first.
    pub fn is_obsolete(&self) -> bool {
        obsolete::is_node_suppressed(&self.node)
    }

    /// A diagnostic for `id` anchored at the node's full span.
    pub fn diagnostic(&self, id: &str, args: &[&str]) -> anyhow::Result<Diagnostic> {
        self.diagnostic_at(id, self.node.span(), args)
    }

    pub fn diagnostic_at(&self, id: &str, span: Span, args: &[&str]) -> anyhow::Result<Diagnostic> {
        if !self.descriptors.contains(&id) {
            bail!("rule {} reported undeclared descriptor {}", self.rule_id, id);
        }
        let descriptor = self
            .catalog
            .lookup(id)
            .with_context(|| format!("rule {}", self.rule_id))?;

        Ok(Diagnostic {
            id: descriptor.id.to_string(),
            severity: descriptor.severity,
            file: self.file().to_string(),
            span,
            message: descriptor.format_message(args),
        })
    }
}
