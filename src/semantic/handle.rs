//! Borrowed views into a `SemanticTree`.

use std::fmt;

use super::{
    Invocation, NodeId, NodeKind, ObsoleteState, SemanticTree, Span, SymbolId, SymbolKind,
    TypeInfo, TypeKind,
};

/// A reference to one node of a tree.
///
/// Handles are cheap to copy and never outlive the tree they point into.
#[derive(Clone, Copy)]
pub struct NodeHandle<'t> {
    tree: &'t SemanticTree,
    id: NodeId,
}

impl<'t> NodeHandle<'t> {
    pub(crate) fn new(tree: &'t SemanticTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t SemanticTree {
        self.tree
    }

    pub fn kind(&self) -> NodeKind {
        self.tree.node_data(self.id).kind
    }

    pub fn span(&self) -> Span {
        self.tree.node_data(self.id).span
    }

    /// The resolved type of this node, if the host determined one.
    pub fn resolved_type(&self) -> Option<&'t TypeInfo> {
        self.tree.node_data(self.id).type_info.as_ref()
    }

    pub fn type_kind(&self) -> Option<TypeKind> {
        self.resolved_type().map(|t| t.kind)
    }

    /// The symbol this node references.
    pub fn symbol(&self) -> Option<SymbolRef<'t>> {
        self.tree
            .node_data(self.id)
            .symbol
            .map(|id| SymbolRef::new(self.tree, id))
    }

    /// The method, trigger or object whose body contains this node.
    pub fn containing_symbol(&self) -> Option<SymbolRef<'t>> {
        self.tree
            .node_data(self.id)
            .containing_symbol
            .map(|id| SymbolRef::new(self.tree, id))
    }

    pub fn invocation(&self) -> Option<&'t Invocation> {
        self.tree.node_data(self.id).invocation.as_ref()
    }

    pub fn parent(&self) -> Option<NodeHandle<'t>> {
        self.tree
            .node_data(self.id)
            .parent
            .map(|id| NodeHandle::new(self.tree, id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeHandle<'t>> + 't {
        let tree = self.tree;
        tree.child_ids(self.id)
            .iter()
            .map(move |&id| NodeHandle::new(tree, id))
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self) -> Ancestors<'t> {
        Ancestors {
            tree: self.tree,
            next: self.tree.node_data(self.id).parent,
        }
    }

    /// All nodes below this one, in document order.
    ///
    /// The iterator is lazy; every call starts a fresh walk.
    pub fn descendants(&self) -> Descendants<'t> {
        let mut stack: Vec<NodeId> = self.tree.child_ids(self.id).to_vec();
        stack.reverse();
        Descendants {
            tree: self.tree,
            stack,
        }
    }

    /// This node followed by all nodes below it, in document order.
    pub fn descendants_and_self(&self) -> Descendants<'t> {
        Descendants {
            tree: self.tree,
            stack: vec![self.id],
        }
    }

    /// Source text covered by this node, when the tree carries its source.
    pub fn text(&self) -> Option<&'t str> {
        let span = self.span();
        self.tree.source().and_then(|s| s.get(span.range()))
    }
}

impl fmt::Debug for NodeHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("span", &self.span())
            .finish()
    }
}

impl PartialEq for NodeHandle<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeHandle<'_> {}

/// Pre-order walk below a node.
pub struct Descendants<'t> {
    tree: &'t SemanticTree,
    stack: Vec<NodeId>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = NodeHandle<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.child_ids(id).iter().rev().copied());
        Some(NodeHandle::new(self.tree, id))
    }
}

/// Walk from a node's parent up to the root.
pub struct Ancestors<'t> {
    tree: &'t SemanticTree,
    next: Option<NodeId>,
}

impl<'t> Iterator for Ancestors<'t> {
    type Item = NodeHandle<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.node_data(id).parent;
        Some(NodeHandle::new(self.tree, id))
    }
}

/// A reference to one symbol of a tree.
#[derive(Clone, Copy)]
pub struct SymbolRef<'t> {
    tree: &'t SemanticTree,
    id: SymbolId,
}

impl<'t> SymbolRef<'t> {
    pub(crate) fn new(tree: &'t SemanticTree, id: SymbolId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn name(&self) -> &'t str {
        &self.tree.symbol_data(self.id).name
    }

    pub fn kind(&self) -> SymbolKind {
        self.tree.symbol_data(self.id).kind
    }

    pub fn obsolete_state(&self) -> ObsoleteState {
        self.tree.symbol_data(self.id).obsolete_state
    }

    pub fn declared_type(&self) -> Option<&'t TypeInfo> {
        self.tree.symbol_data(self.id).type_info.as_ref()
    }

    /// The symbol this one is declared in.
    pub fn containing(&self) -> Option<SymbolRef<'t>> {
        self.tree
            .symbol_data(self.id)
            .containing
            .map(|id| SymbolRef::new(self.tree, id))
    }

    /// The nearest enclosing application object.
    ///
    /// An object symbol is its own containing object.
    pub fn containing_object(&self) -> Option<SymbolRef<'t>> {
        let mut current = Some(*self);
        while let Some(symbol) = current {
            if symbol.kind().is_object() {
                return Some(symbol);
            }
            current = symbol.containing();
        }
        None
    }
}

impl fmt::Debug for SymbolRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolRef")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("obsolete_state", &self.obsolete_state())
            .finish()
    }
}

impl SemanticTree {
    pub fn node(&self, id: NodeId) -> Option<NodeHandle<'_>> {
        (id.index() < self.node_count()).then(|| NodeHandle::new(self, id))
    }

    pub fn symbol(&self, id: SymbolId) -> Option<SymbolRef<'_>> {
        (id.index() < self.symbols().len()).then(|| SymbolRef::new(self, id))
    }

    /// Every node of the tree in document order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeHandle<'_>> + '_ {
        (0..self.node_count()).map(move |i| NodeHandle::new(self, NodeId(i as u32)))
    }

    /// Root nodes (nodes without a parent), in document order.
    pub fn roots(&self) -> impl Iterator<Item = NodeHandle<'_>> + '_ {
        self.nodes().filter(|n| n.parent().is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::{LineIndex, NodeData, Symbol, TreeBuilder};

    /// root
    /// ├── a
    /// │   └── a1
    /// └── b
    fn sample() -> SemanticTree {
        let index = LineIndex::new("0123456789");
        let mut builder = TreeBuilder::new("t.al");
        let object = builder.add_symbol(Symbol::new(SymbolKind::Codeunit, "C"));
        let method = builder.add_symbol(Symbol::new(SymbolKind::Method, "M").within(object));
        let var = builder.add_symbol(
            Symbol::new(SymbolKind::LocalVariable, "V")
                .within(method)
                .typed(TypeInfo::named(TypeKind::Record, "Customer")),
        );
        let root = builder.push(None, NodeData::new(NodeKind::Block, index.span(0, 10)));
        let a = builder.push(
            Some(root),
            NodeData::new(NodeKind::InvocationExpression, index.span(0, 5)).contained_in(method),
        );
        builder.push(
            Some(a),
            NodeData::new(NodeKind::LocalReference, index.span(0, 1))
                .with_symbol(var)
                .with_type(TypeInfo::named(TypeKind::Record, "Customer")),
        );
        builder.push(Some(root), NodeData::new(NodeKind::Literal, index.span(6, 7)));
        builder.build().unwrap()
    }

    #[test]
    fn test_descendants_in_document_order() {
        let tree = sample();
        let root = tree.node(NodeId(0)).unwrap();
        let kinds: Vec<_> = root.descendants().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::InvocationExpression,
                NodeKind::LocalReference,
                NodeKind::Literal
            ]
        );
        assert_eq!(root.descendants_and_self().count(), 4);
        // A fresh call starts over.
        assert_eq!(root.descendants().count(), 3);
    }

    #[test]
    fn test_ancestors_and_parent() {
        let tree = sample();
        let leaf = tree.node(NodeId(2)).unwrap();
        let ids: Vec<_> = leaf.ancestors().map(|n| n.id()).collect();
        assert_eq!(ids, vec![NodeId(1), NodeId(0)]);
        assert_eq!(leaf.parent().unwrap().id(), NodeId(1));
        assert_eq!(tree.roots().count(), 1);
    }

    #[test]
    fn test_symbol_navigation() {
        let tree = sample();
        let call = tree.node(NodeId(1)).unwrap();
        let method = call.containing_symbol().unwrap();
        assert_eq!(method.name(), "M");
        assert_eq!(method.containing_object().unwrap().name(), "C");

        let object = method.containing().unwrap();
        assert_eq!(object.containing_object().unwrap().id(), object.id());

        let reference = tree.node(NodeId(2)).unwrap();
        assert_eq!(reference.type_kind(), Some(TypeKind::Record));
        assert_eq!(reference.symbol().unwrap().name(), "V");
    }
}
