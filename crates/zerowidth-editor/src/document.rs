//! Core document tree trait.
//!
//! Defines the `DocumentTree` trait: the tree operations plugins are allowed
//! to perform while an update is open. [`EditorTree`](crate::EditorTree) is
//! the arena-backed implementation used by [`Editor`](crate::Editor); other
//! hosts can implement the trait over their own storage and drive plugin
//! reconciliation functions directly.

use crate::error::TreeError;
use crate::node::{Node, NodeKey, NodeKind};
use crate::selection::RangeSelection;

/// Tree access and mutation inside an update.
pub trait DocumentTree {
    // === Required: Lookup ===

    /// Key of the document root.
    fn root(&self) -> NodeKey;

    /// Look up a node by key. Returns `None` for unknown keys.
    fn node(&self, key: NodeKey) -> Option<&Node>;

    /// Whether the node is reachable from the root.
    fn is_attached(&self, key: NodeKey) -> bool;

    fn parent(&self, key: NodeKey) -> Option<NodeKey>;

    fn previous_sibling(&self, key: NodeKey) -> Option<NodeKey>;

    fn next_sibling(&self, key: NodeKey) -> Option<NodeKey>;

    /// Last node of `key`'s subtree in depth-first order.
    fn last_descendant(&self, key: NodeKey) -> Option<NodeKey>;

    /// Attached nodes with the given type tag, in depth-first order.
    fn nodes_of_type(&self, node_type: &str) -> Vec<NodeKey>;

    // === Required: Mutation ===

    /// Create a detached node. It is dropped at commit unless inserted.
    fn create_node(&mut self, kind: NodeKind) -> NodeKey;

    /// Append `child` as the last child of the element `parent`.
    fn append(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), TreeError>;

    /// Insert `node` as the previous sibling of `target`, moving it if it is
    /// already attached elsewhere.
    fn insert_before(&mut self, target: NodeKey, node: NodeKey) -> Result<(), TreeError>;

    /// Insert `node` as the next sibling of `target`, moving it if it is
    /// already attached elsewhere.
    fn insert_after(&mut self, target: NodeKey, node: NodeKey) -> Result<(), TreeError>;

    /// Remove a node and its subtree from the document.
    fn remove(&mut self, key: NodeKey) -> Result<(), TreeError>;

    // === Required: Selection ===

    fn selection(&self) -> Option<&RangeSelection>;

    fn set_selection(&mut self, selection: Option<RangeSelection>);

    /// Collapse the selection at the end of `key`.
    fn select_end(&mut self, key: NodeKey) -> Result<(), TreeError>;

    /// Nodes covered by the current selection, in document order.
    fn selection_nodes(&self) -> Vec<NodeKey>;

    // === Provided: Type guards ===

    fn kind(&self, key: NodeKey) -> Option<&NodeKind> {
        self.node(key).map(Node::kind)
    }

    fn node_type(&self, key: NodeKey) -> Option<&'static str> {
        self.node(key).map(Node::node_type)
    }

    fn is_decorator(&self, key: NodeKey) -> bool {
        matches!(self.kind(key), Some(NodeKind::Decorator(_)))
    }

    fn is_line_break(&self, key: NodeKey) -> bool {
        matches!(self.kind(key), Some(NodeKind::LineBreak))
    }

    /// Plain text only; custom text variants are not plain text.
    fn is_text(&self, key: NodeKey) -> bool {
        matches!(self.kind(key), Some(NodeKind::Text(_)))
    }

    /// Reported content of a text-like node.
    fn text_content(&self, key: NodeKey) -> Option<&str> {
        self.kind(key).and_then(NodeKind::text_content)
    }
}
