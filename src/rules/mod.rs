//! Built-in rules.
//!
//! A rule is plain data: the node kinds it subscribes to, the descriptors it
//! may report, and a check function. Every check starts with the
//! obsolescence guard and reports at most one diagnostic per node.

mod helper_codeunits;
mod run_trigger;

pub use helper_codeunits::HELPER_CODEUNITS;
pub use run_trigger::EXPLICITLY_SET_RUN_TRIGGER;

use crate::engine::{Diagnostic, RuleContext};
use crate::semantic::NodeKind;

/// Signature of a rule check.
pub type CheckFn = fn(&RuleContext<'_>) -> anyhow::Result<Option<Diagnostic>>;

/// A rule as registered with the dispatcher.
#[derive(Clone, Copy)]
pub struct RuleRegistration {
    /// Stable rule identifier, unique within a dispatcher.
    pub rule_id: &'static str,
    /// Descriptor ids the rule may report.
    pub descriptors: &'static [&'static str],
    pub kinds: &'static [NodeKind],
    pub check: CheckFn,
}

impl std::fmt::Debug for RuleRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistration")
            .field("rule_id", &self.rule_id)
            .field("descriptors", &self.descriptors)
            .field("kinds", &self.kinds)
            .finish()
    }
}

static BUILTIN_RULES: &[RuleRegistration] = &[EXPLICITLY_SET_RUN_TRIGGER, HELPER_CODEUNITS];

/// Every built-in rule.
pub fn builtin_rules() -> &'static [RuleRegistration] {
    BUILTIN_RULES
}
