//! Registry linking each marker to the decorator it serves.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::rc::Rc;

use zerowidth_editor::NodeKey;

/// Marker key → counterpart (decorator) key.
///
/// An entry exists only while the marker is serving that counterpart.
/// Reconciliations remove the entry in the same pass that deletes the
/// marker, so no key outlives its node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkMap {
    links: BTreeMap<NodeKey, NodeKey>,
}

impl LinkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counterpart recorded for `marker`.
    pub fn get(&self, marker: NodeKey) -> Option<NodeKey> {
        self.links.get(&marker).copied()
    }

    /// Record that `marker` serves `counterpart`. Returns the previous
    /// counterpart, if any.
    pub fn link(&mut self, marker: NodeKey, counterpart: NodeKey) -> Option<NodeKey> {
        self.links.insert(marker, counterpart)
    }

    pub fn unlink(&mut self, marker: NodeKey) -> Option<NodeKey> {
        self.links.remove(&marker)
    }

    pub fn contains(&self, marker: NodeKey) -> bool {
        self.links.contains_key(&marker)
    }

    /// Marker keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.links.keys().copied()
    }

    /// `(marker, counterpart)` pairs in ascending marker order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, NodeKey)> + '_ {
        self.links.iter().map(|(&marker, &counterpart)| (marker, counterpart))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn clear(&mut self) {
        self.links.clear();
    }
}

/// Shared handle to one session's [`LinkMap`].
///
/// Every listener registered for a session holds a clone. Borrows are held
/// only for the length of one reconciliation.
#[derive(Clone, Debug, Default)]
pub struct LinkMapRef(Rc<RefCell<LinkMap>>);

impl LinkMapRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn borrow(&self) -> Ref<'_, LinkMap> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, LinkMap> {
        self.0.borrow_mut()
    }

    /// Whether two handles share the same registry.
    pub fn ptr_eq(&self, other: &LinkMapRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
