//! Built-in methods that have a helper codeunit wrapping them.
//!
//! `Confirm` belongs behind "Confirm Management" and setting
//! `GlobalLanguage` behind "Translation Helper"; calls made from inside the
//! helper itself are fine.

use super::RuleRegistration;
use crate::catalog::ids;
use crate::engine::{Diagnostic, RuleContext};
use crate::semantic::{is_same_name, Invocation, MethodKind, NodeKind, SymbolKind};

pub const HELPER_CODEUNITS: RuleRegistration = RuleRegistration {
    rule_id: "BuiltInMethodImplementThroughCodeunit",
    descriptors: &[
        ids::CONFIRM_IMPLEMENT_CONFIRM_MANAGEMENT,
        ids::GLOBAL_LANGUAGE_IMPLEMENT_TRANSLATION_HELPER,
    ],
    kinds: &[NodeKind::InvocationExpression],
    check,
};

/// The descriptor and helper codeunit for a built-in call, if it has one.
fn helper_for(invocation: &Invocation) -> Option<(&'static str, &'static str)> {
    match invocation.method.name.to_ascii_lowercase().as_str() {
        "confirm" => Some((ids::CONFIRM_IMPLEMENT_CONFIRM_MANAGEMENT, "Confirm Management")),
        // Reading the current language is fine.
        "globallanguage" if !invocation.arguments.is_empty() => Some((
            ids::GLOBAL_LANGUAGE_IMPLEMENT_TRANSLATION_HELPER,
            "Translation Helper",
        )),
        _ => None,
    }
}

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
    let Some((id, helper)) = helper_for(invocation) else {
        return Ok(None);
    };

    let inside_helper = ctx
        .containing_symbol()
        .and_then(|symbol| symbol.containing_object())
        .map_or(false, |object| {
            object.kind() == SymbolKind::Codeunit && is_same_name(object.name(), helper)
        });
    if inside_helper {
        return Ok(None);
    }

    Ok(Some(ctx.diagnostic(id, &[])?))
}
