//! Obsolescence guard shared by every rule.

use crate::semantic::{NodeHandle, SymbolRef};

/// Whether code declared in `symbol` is exempt from analysis.
///
/// True when the symbol itself or its containing object is pending removal
/// or removed. A missing symbol is never suppressed.
pub fn is_suppressed(symbol: Option<SymbolRef<'_>>) -> bool {
    let Some(symbol) = symbol else {
        return false;
    };
    symbol.obsolete_state().is_obsolete()
        || symbol
            .containing_object()
            .map_or(false, |object| object.obsolete_state().is_obsolete())
}

/// Guard applied to the symbol whose body contains `node`.
pub fn is_node_suppressed(node: &NodeHandle<'_>) -> bool {
    is_suppressed(node.containing_symbol())
}
