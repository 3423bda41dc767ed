//! Built-in record mutations must state whether table triggers run.

use phf::phf_set;

use super::RuleRegistration;
use crate::catalog::ids;
use crate::engine::{Diagnostic, RuleContext};
use crate::semantic::{MethodKind, NodeHandle, NodeKind, TypeInfo};

/// Name of the trigger-suppression parameter of the mutating methods.
pub const RUN_TRIGGER_PARAMETER: &str = "RunTrigger";

/// Built-in record methods taking a `RunTrigger` parameter (lowercase).
static MUTATING_METHODS: phf::Set<&'static str> = phf_set! {
    "insert",
    "modify",
    "modifyall",
    "delete",
    "deleteall",
};

pub const EXPLICITLY_SET_RUN_TRIGGER: RuleRegistration = RuleRegistration {
    rule_id: "ExplicitlySetRunTrigger",
    descriptors: &[ids::EXPLICITLY_SET_RUN_TRIGGER],
    kinds: &[NodeKind::InvocationExpression],
    check,
};

fn check(ctx: &RuleContext<'_>) -> anyhow::Result<Option<Diagnostic>> {
    if ctx.is_obsolete() {
        return Ok(None);
    }

    let node = ctx.node();
    let Some(invocation) = node.invocation() else {
        anyhow::bail!("invocation {} has no resolved target", node.id());
    };
    if invocation.method.kind != MethodKind::BuiltInMethod {
        return Ok(None);
    }
    if !MUTATING_METHODS.contains(invocation.method.name.to_ascii_lowercase().as_str()) {
        return Ok(None);
    }
    // Storage abstractions share these method names; only record receivers count.
    if !references_record(&node) {
        return Ok(None);
    }
    if invocation
        .arguments
        .iter()
        .any(|argument| argument.binds(RUN_TRIGGER_PARAMETER))
    {
        return Ok(None);
    }

    Ok(Some(ctx.diagnostic(ids::EXPLICITLY_SET_RUN_TRIGGER, &[])?))
}

/// Whether any symbol reference within `node` resolves to a record.
///
/// The node's resolved type decides; an untyped node falls back to the
/// declared type of its symbol.
fn references_record(node: &NodeHandle<'_>) -> bool {
    node.descendants_and_self().any(|n| {
        n.symbol().map_or(false, |symbol| {
            n.resolved_type()
                .or_else(|| symbol.declared_type())
                .map_or(false, TypeInfo::is_record)
        })
    })
}
