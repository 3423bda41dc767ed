//! Arena representation of one resolved document.
//!
//! The host exports each analyzed document as a `SemanticTree`: a symbol
//! arena and a node arena stored in document (pre-)order. Child lists are
//! derived on load, so a tree can be deserialized straight from the host's
//! JSON export.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

use super::{Invocation, NodeKind, ObsoleteState, Span, SymbolKind, TypeInfo};

/// Index of a node within its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a symbol within its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A symbol from the host's symbol table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    #[serde(default)]
    pub obsolete_state: ObsoleteState,
    /// The symbol this one is declared in (method -> object, variable -> method).
    #[serde(default)]
    pub containing: Option<SymbolId>,
    /// Declared type, for variables, parameters and fields.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_info: Option<TypeInfo>,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            obsolete_state: ObsoleteState::None,
            containing: None,
            type_info: None,
        }
    }

    pub fn within(mut self, containing: SymbolId) -> Self {
        self.containing = Some(containing);
        self
    }

    pub fn obsolete(mut self, state: ObsoleteState) -> Self {
        self.obsolete_state = state;
        self
    }

    pub fn typed(mut self, type_info: TypeInfo) -> Self {
        self.type_info = Some(type_info);
        self
    }
}

/// A node of the resolved tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    pub kind: NodeKind,
    pub span: Span,
    #[serde(default)]
    pub parent: Option<NodeId>,
    /// The symbol this node references (variable, method, field, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
    /// The resolved type of the expression, if any.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_info: Option<TypeInfo>,
    /// The method, trigger or object whose body contains this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containing_symbol: Option<SymbolId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation: Option<Invocation>,
}

impl NodeData {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            parent: None,
            symbol: None,
            type_info: None,
            containing_symbol: None,
            invocation: None,
        }
    }

    pub fn with_symbol(mut self, symbol: SymbolId) -> Self {
        self.symbol = Some(symbol);
        self
    }

    pub fn with_type(mut self, type_info: TypeInfo) -> Self {
        self.type_info = Some(type_info);
        self
    }

    pub fn contained_in(mut self, symbol: SymbolId) -> Self {
        self.containing_symbol = Some(symbol);
        self
    }

    pub fn with_invocation(mut self, invocation: Invocation) -> Self {
        self.invocation = Some(invocation);
        self
    }
}

/// Errors raised when a host export is structurally invalid.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {node} has parent {parent} which does not precede it")]
    ParentOrder { node: NodeId, parent: NodeId },
    #[error("node {node} references unknown symbol {symbol}")]
    UnknownSymbol { node: NodeId, symbol: u32 },
    #[error("symbol {symbol} is contained in unknown symbol {containing}")]
    UnknownContainingSymbol { symbol: u32, containing: u32 },
    #[error("symbol {0} is its own ancestor")]
    SymbolCycle(u32),
    #[error("argument of node {node} points at unknown node {value}")]
    UnknownArgument { node: NodeId, value: NodeId },
    #[error("tree has too many nodes")]
    TooLarge,
}

/// Serialized form of a tree as exported by the host.
#[derive(Deserialize)]
struct RawTree {
    path: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    symbols: Vec<Symbol>,
    #[serde(default)]
    nodes: Vec<NodeData>,
}

impl TryFrom<RawTree> for SemanticTree {
    type Error = TreeError;

    fn try_from(raw: RawTree) -> Result<Self, Self::Error> {
        SemanticTree::from_parts(raw.path, raw.source, raw.symbols, raw.nodes)
    }
}

/// A resolved document: symbols plus nodes in document order.
///
/// Trees are immutable once built and may be analyzed from several threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawTree")]
pub struct SemanticTree {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    symbols: Vec<Symbol>,
    nodes: Vec<NodeData>,
    #[serde(skip)]
    children: Vec<Vec<NodeId>>,
}

impl SemanticTree {
    /// Build a tree from its parts, validating cross references.
    pub fn from_parts(
        path: impl Into<String>,
        source: Option<String>,
        symbols: Vec<Symbol>,
        nodes: Vec<NodeData>,
    ) -> Result<Self, TreeError> {
        if nodes.len() > u32::MAX as usize || symbols.len() > u32::MAX as usize {
            return Err(TreeError::TooLarge);
        }

        for (i, symbol) in symbols.iter().enumerate() {
            if let Some(containing) = symbol.containing {
                if containing.index() >= symbols.len() {
                    return Err(TreeError::UnknownContainingSymbol {
                        symbol: i as u32,
                        containing: containing.0,
                    });
                }
            }
        }
        // Containment must form a forest; a chain longer than the arena is a cycle.
        for i in 0..symbols.len() {
            let mut current = symbols[i].containing;
            let mut steps = 0;
            while let Some(id) = current {
                steps += 1;
                if steps > symbols.len() {
                    return Err(TreeError::SymbolCycle(i as u32));
                }
                current = symbols[id.index()].containing;
            }
        }

        let mut children = vec![Vec::new(); nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            let id = NodeId(i as u32);
            if let Some(parent) = node.parent {
                if parent.index() >= i {
                    return Err(TreeError::ParentOrder { node: id, parent });
                }
                children[parent.index()].push(id);
            }
            for symbol in [node.symbol, node.containing_symbol].into_iter().flatten() {
                if symbol.index() >= symbols.len() {
                    return Err(TreeError::UnknownSymbol {
                        node: id,
                        symbol: symbol.0,
                    });
                }
            }
            if let Some(invocation) = &node.invocation {
                for value in invocation.arguments.iter().filter_map(|a| a.value) {
                    if value.index() >= nodes.len() {
                        return Err(TreeError::UnknownArgument { node: id, value });
                    }
                }
            }
        }

        Ok(Self {
            path: path.into(),
            source,
            symbols,
            nodes,
            children,
        })
    }

    /// Load a tree from a host export file (JSON).
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let tree: SemanticTree = serde_json::from_str(&content)?;
        Ok(tree)
    }

    /// Document path as reported by the host.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Source text, when the host included it in the export.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub(crate) fn node_data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub(crate) fn child_ids(&self, id: NodeId) -> &[NodeId] {
        &self.children[id.index()]
    }

    pub(crate) fn symbol_data(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }
}

/// Incrementally builds a `SemanticTree` in document order.
///
/// Used by front ends and tests; nodes must be pushed parent-first.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    path: String,
    source: Option<String>,
    symbols: Vec<Symbol>,
    nodes: Vec<NodeData>,
}

impl TreeBuilder {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn add_symbol(&mut self, symbol: Symbol) -> SymbolId {
        self.symbols.push(symbol);
        SymbolId((self.symbols.len() - 1) as u32)
    }

    /// Append a node under `parent` (or as a root).
    pub fn push(&mut self, parent: Option<NodeId>, mut node: NodeData) -> NodeId {
        node.parent = parent;
        self.nodes.push(node);
        NodeId((self.nodes.len() - 1) as u32)
    }

    /// Mutable access to an already pushed node.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.index())
    }

    pub fn build(self) -> Result<SemanticTree, TreeError> {
        SemanticTree::from_parts(self.path, self.source, self.symbols, self.nodes)
    }
}
