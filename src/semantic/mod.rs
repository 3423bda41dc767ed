//! Read-only semantic facade over the host's resolved tree.
//!
//! The host (parser + semantic resolver) owns tokenization and type
//! resolution. What reaches the engine is a `SemanticTree` per document:
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Host export  │────▶│ SemanticTree │────▶│ NodeHandle / │
//! │ (JSON)       │     │ (arenas)     │     │ SymbolRef    │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Rules only ever see borrowed handles, valid for one analysis pass.

mod facts;
mod handle;
mod tree;

pub use facts::{
    is_same_name, unquote, BoundArgument, Invocation, LineIndex, MethodKind, NodeKind,
    ObsoleteState, Span, SymbolKind, TargetMethod, TypeInfo, TypeKind,
};
pub use handle::{Ancestors, Descendants, NodeHandle, SymbolRef};
pub use tree::{NodeData, NodeId, SemanticTree, Symbol, SymbolId, TreeBuilder, TreeError};
