//! Arena-backed document tree.
//!
//! `EditorTree` owns every node in a flat map addressed by [`NodeKey`].
//! Topology is stored as parent links plus ordered child lists; sibling
//! queries are lookups in the parent's child list. Nodes created during an
//! update but never attached are garbage collected at commit.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;

use smol_str::SmolStr;

use crate::document::DocumentTree;
use crate::error::TreeError;
use crate::listeners::NodeMutation;
use crate::node::{
    DECORATOR_NODE_TYPE, Node, NodeKey, NodeKind, TEXT_NODE_TYPE,
};
use crate::selection::{Point, RangeSelection};

/// Arena storage for one document.
#[derive(Clone, Debug)]
pub struct EditorTree {
    nodes: HashMap<NodeKey, Node>,
    root: NodeKey,
    next_key: u32,
    selection: Option<RangeSelection>,
    dirty: HashSet<NodeKey>,
}

impl Default for EditorTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Attached node types plus decorator set, captured before an update so the
/// commit can diff against it.
#[derive(Clone, Debug, Default)]
pub(crate) struct TreeIndex {
    types: BTreeMap<NodeKey, &'static str>,
    decorators: BTreeSet<NodeKey>,
    selection: Option<RangeSelection>,
}

/// What a committed update changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Per node type, the keys that were created, updated or destroyed.
    pub mutations: BTreeMap<&'static str, BTreeMap<NodeKey, NodeMutation>>,
    /// Decorator set or decorator content changed.
    pub decorators_changed: bool,
    /// Plain text nodes created or updated by this update.
    pub settled_text: Vec<NodeKey>,
    pub selection_changed: bool,
}

impl UpdateSummary {
    pub fn has_node_changes(&self) -> bool {
        !self.mutations.is_empty()
    }

    /// Mutations recorded for one node type.
    pub fn mutations_of(&self, node_type: &str) -> Option<&BTreeMap<NodeKey, NodeMutation>> {
        self.mutations.get(node_type)
    }
}

impl EditorTree {
    /// Create a tree holding only the root.
    pub fn new() -> Self {
        let root = NodeKey(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::new(root, NodeKind::Root));
        Self {
            nodes,
            root,
            next_key: 1,
            selection: None,
            dirty: HashSet::new(),
        }
    }

    fn alloc_key(&mut self) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        key
    }

    fn node_ref(&self, key: NodeKey) -> Result<&Node, TreeError> {
        self.nodes.get(&key).ok_or(TreeError::NodeNotFound(key))
    }

    fn node_mut(&mut self, key: NodeKey) -> Result<&mut Node, TreeError> {
        self.nodes.get_mut(&key).ok_or(TreeError::NodeNotFound(key))
    }

    fn mark_dirty(&mut self, key: NodeKey) {
        self.dirty.insert(key);
    }

    /// Children of an element; empty for leaves and unknown keys.
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes.get(&key).map(Node::children).unwrap_or(&[])
    }

    /// Number of nodes in the arena, including the root and any nodes
    /// created but not yet attached.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// Depth-first preorder of `key`'s subtree, excluding `key` itself.
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeKey> = self.children(key).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    fn index_in_parent(&self, key: NodeKey) -> Option<(NodeKey, usize)> {
        let parent = self.nodes.get(&key)?.parent?;
        let index = self.children(parent).iter().position(|&k| k == key)?;
        Some((parent, index))
    }

    fn first_descendant_or_self(&self, key: NodeKey) -> NodeKey {
        let mut current = key;
        while let Some(&first) = self.children(current).first() {
            current = first;
        }
        current
    }

    /// True if `ancestor` is `key` or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.nodes.get(&k).and_then(|n| n.parent);
        }
        false
    }

    /// Unlink a node from its parent, keeping it in the arena.
    fn detach(&mut self, key: NodeKey) -> Option<(NodeKey, usize)> {
        let (parent, index) = self.index_in_parent(key)?;
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.remove(index);
        }
        if let Some(node) = self.nodes.get_mut(&key) {
            node.parent = None;
        }
        self.mark_dirty(parent);
        self.mark_dirty(key);
        Some((parent, index))
    }

    fn check_insertable(&self, target: NodeKey, node: NodeKey) -> Result<(), TreeError> {
        if node == self.root {
            return Err(TreeError::RootOperation);
        }
        self.node_ref(node)?;
        self.node_ref(target)?;
        if self.is_ancestor_or_self(node, target) {
            return Err(TreeError::Cycle(node));
        }
        Ok(())
    }

    fn insert_at(&mut self, parent: NodeKey, index: usize, node: NodeKey) -> Result<(), TreeError> {
        let parent_node = self.node_mut(parent)?;
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, node);
        self.node_mut(node)?.parent = Some(parent);
        self.mark_dirty(parent);
        self.mark_dirty(node);
        Ok(())
    }

    fn insert_sibling(&mut self, target: NodeKey, node: NodeKey, after: bool) -> Result<(), TreeError> {
        if target == self.root {
            return Err(TreeError::RootOperation);
        }
        if target == node {
            return Ok(());
        }
        self.check_insertable(target, node)?;
        if self.node_ref(target)?.parent.is_none() {
            return Err(TreeError::Detached(target));
        }
        self.detach(node);
        let (parent, index) = self
            .index_in_parent(target)
            .ok_or(TreeError::Detached(target))?;
        self.insert_at(parent, if after { index + 1 } else { index }, node)
    }

    /// Replace the content of a plain text node.
    pub fn set_text(&mut self, key: NodeKey, text: impl Into<String>) -> Result<(), TreeError> {
        let node = self.node_mut(key)?;
        let NodeKind::Text(text_node) = &mut node.kind else {
            return Err(TreeError::TypeMismatch {
                expected: SmolStr::new_static(TEXT_NODE_TYPE),
                found: SmolStr::new_static(node.kind.node_type()),
            });
        };
        text_node.text = text.into();
        let len = text_node.text.chars().count();
        self.mark_dirty(key);

        // Keep carets inside the shortened text.
        if let Some(sel) = self.selection.as_mut() {
            for point in [&mut sel.anchor, &mut sel.focus] {
                if point.key == key && point.offset > len {
                    point.offset = len;
                }
            }
        }
        Ok(())
    }

    /// Replace the payload of a decorator node.
    pub fn set_decorator_data(
        &mut self,
        key: NodeKey,
        data: serde_json::Value,
    ) -> Result<(), TreeError> {
        let node = self.node_mut(key)?;
        let NodeKind::Decorator(decorator) = &mut node.kind else {
            return Err(TreeError::TypeMismatch {
                expected: SmolStr::new_static(DECORATOR_NODE_TYPE),
                found: SmolStr::new_static(node.kind.node_type()),
            });
        };
        decorator.data = data;
        self.mark_dirty(key);
        Ok(())
    }

    /// Indented structural dump, one node per line.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(&mut out, self.root, 0);
        out.truncate(out.trim_end().len());
        out
    }

    fn write_outline(&self, out: &mut String, key: NodeKey, depth: usize) {
        let Some(node) = self.nodes.get(&key) else {
            return;
        };
        let _ = write!(out, "{:indent$}", "", indent = depth * 2);
        let _ = match &node.kind {
            NodeKind::Root | NodeKind::Paragraph | NodeKind::LineBreak => {
                writeln!(out, "{}", node.node_type())
            }
            NodeKind::Text(text) => writeln!(out, "text {:?}", text.text),
            NodeKind::Decorator(decorator) => {
                writeln!(out, "decorator({})", decorator.decorator_type)
            }
            NodeKind::Custom(variant) => {
                writeln!(out, "{} {:?}", variant.node_type(), variant.text_content())
            }
        };
        for &child in &node.children {
            self.write_outline(out, child, depth + 1);
        }
    }

    fn resolve_point(&self, point: Point) -> Option<NodeKey> {
        let node = self.nodes.get(&point.key)?;
        if !node.kind.is_element() {
            return Some(point.key);
        }
        match node.children.get(point.offset) {
            Some(&child) => Some(self.first_descendant_or_self(child)),
            None => self.last_descendant(point.key).or(Some(point.key)),
        }
    }

    pub(crate) fn index(&self) -> TreeIndex {
        let mut index = TreeIndex {
            selection: self.selection,
            ..TreeIndex::default()
        };
        for key in self.descendants(self.root) {
            let Some(node) = self.nodes.get(&key) else {
                continue;
            };
            index.types.insert(key, node.node_type());
            if matches!(node.kind, NodeKind::Decorator(_)) {
                index.decorators.insert(key);
            }
        }
        index
    }

    fn collect_garbage(&mut self) {
        let mut live: HashSet<NodeKey> = self.descendants(self.root).into_iter().collect();
        live.insert(self.root);
        self.nodes.retain(|key, _| live.contains(key));
    }

    /// Close the current update: drop unattached nodes and diff against the
    /// state captured in `before`.
    pub(crate) fn commit(&mut self, before: &TreeIndex) -> UpdateSummary {
        self.collect_garbage();
        let after = self.index();
        let mut summary = UpdateSummary::default();

        for (&key, &node_type) in &after.types {
            let mutation = if !before.types.contains_key(&key) {
                NodeMutation::Created
            } else if self.dirty.contains(&key) {
                NodeMutation::Updated
            } else {
                continue;
            };
            summary
                .mutations
                .entry(node_type)
                .or_default()
                .insert(key, mutation);
            if node_type == TEXT_NODE_TYPE {
                summary.settled_text.push(key);
            }
            if node_type == DECORATOR_NODE_TYPE && mutation == NodeMutation::Updated {
                summary.decorators_changed = true;
            }
        }
        for (&key, &node_type) in &before.types {
            if !after.types.contains_key(&key) {
                summary
                    .mutations
                    .entry(node_type)
                    .or_default()
                    .insert(key, NodeMutation::Destroyed);
            }
        }
        summary.decorators_changed |= before.decorators != after.decorators;
        summary.selection_changed = before.selection != self.selection;
        self.dirty.clear();
        summary
    }

    /// Copy of the committed state for the history stack.
    pub(crate) fn snapshot(&self) -> EditorTree {
        let mut snapshot = self.clone();
        snapshot.dirty.clear();
        snapshot
    }

    /// Replace the content with a history snapshot. Key allocation keeps
    /// moving forward so restored and future keys never collide.
    pub(crate) fn restore(&mut self, snapshot: EditorTree) {
        let next_key = self.next_key.max(snapshot.next_key);
        *self = snapshot;
        self.next_key = next_key;
        self.dirty.clear();
    }
}

impl DocumentTree for EditorTree {
    fn root(&self) -> NodeKey {
        self.root
    }

    fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(&key)
    }

    fn is_attached(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key) && self.is_ancestor_or_self(self.root, key)
    }

    fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&key)?.parent
    }

    fn previous_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let (parent, index) = self.index_in_parent(key)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    fn next_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let (parent, index) = self.index_in_parent(key)?;
        self.children(parent).get(index + 1).copied()
    }

    fn last_descendant(&self, key: NodeKey) -> Option<NodeKey> {
        let mut last = *self.children(key).last()?;
        while let Some(&child) = self.children(last).last() {
            last = child;
        }
        Some(last)
    }

    fn nodes_of_type(&self, node_type: &str) -> Vec<NodeKey> {
        self.descendants(self.root)
            .into_iter()
            .filter(|key| self.node_type(*key) == Some(node_type))
            .collect()
    }

    fn create_node(&mut self, kind: NodeKind) -> NodeKey {
        let key = self.alloc_key();
        self.nodes.insert(key, Node::new(key, kind));
        self.mark_dirty(key);
        key
    }

    fn append(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), TreeError> {
        if !self.node_ref(parent)?.kind.is_element() {
            return Err(TreeError::NotAnElement(parent));
        }
        self.check_insertable(parent, child)?;
        self.detach(child);
        let len = self.children(parent).len();
        self.insert_at(parent, len, child)
    }

    fn insert_before(&mut self, target: NodeKey, node: NodeKey) -> Result<(), TreeError> {
        self.insert_sibling(target, node, false)
    }

    fn insert_after(&mut self, target: NodeKey, node: NodeKey) -> Result<(), TreeError> {
        self.insert_sibling(target, node, true)
    }

    fn remove(&mut self, key: NodeKey) -> Result<(), TreeError> {
        if key == self.root {
            return Err(TreeError::RootOperation);
        }
        self.node_ref(key)?;
        let position = self.detach(key);

        let mut removed = self.descendants(key);
        removed.push(key);
        let removed: HashSet<NodeKey> = removed.into_iter().collect();

        // Carets inside the removed subtree fall back to the gap it left.
        if let Some(mut sel) = self.selection {
            let mut touched = false;
            for point in [&mut sel.anchor, &mut sel.focus] {
                if removed.contains(&point.key) {
                    touched = true;
                    match position {
                        Some((parent, index)) => *point = Point::new(parent, index),
                        None => {
                            self.selection = None;
                            break;
                        }
                    }
                }
            }
            if touched && self.selection.is_some() {
                self.selection = Some(sel);
            }
        }

        self.nodes.retain(|k, _| !removed.contains(k));
        Ok(())
    }

    fn selection(&self) -> Option<&RangeSelection> {
        self.selection.as_ref()
    }

    fn set_selection(&mut self, selection: Option<RangeSelection>) {
        self.selection = selection;
    }

    fn select_end(&mut self, key: NodeKey) -> Result<(), TreeError> {
        let node = self.node_ref(key)?;
        let point = if let Some(text) = node.kind.rendered_text() {
            Point::new(key, text.chars().count())
        } else if node.kind.is_element() {
            Point::new(key, node.children.len())
        } else {
            let (parent, index) = self.index_in_parent(key).ok_or(TreeError::Detached(key))?;
            Point::new(parent, index + 1)
        };
        self.selection = Some(RangeSelection::new(point, point));
        Ok(())
    }

    fn selection_nodes(&self) -> Vec<NodeKey> {
        let Some(sel) = self.selection else {
            return Vec::new();
        };
        let (Some(anchor), Some(focus)) =
            (self.resolve_point(sel.anchor), self.resolve_point(sel.focus))
        else {
            return Vec::new();
        };
        if anchor == focus {
            return vec![anchor];
        }
        let order = self.descendants(self.root);
        let (Some(a), Some(f)) = (
            order.iter().position(|&k| k == anchor),
            order.iter().position(|&k| k == focus),
        ) else {
            return Vec::new();
        };
        order[a.min(f)..=a.max(f)].to_vec()
    }
}
