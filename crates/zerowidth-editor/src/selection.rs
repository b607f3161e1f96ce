//! Caret and range selection over the node tree.
//!
//! Points address either a character offset inside a text-like node or a
//! child index inside an element, mirroring how the browser Selection API
//! addresses DOM positions.

use crate::node::NodeKey;

/// A position in the tree.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    /// Node the offset is relative to.
    pub key: NodeKey,
    /// Character offset for text-like nodes, child index for elements.
    pub offset: usize,
}

impl Point {
    pub fn new(key: NodeKey, offset: usize) -> Self {
        Self { key, offset }
    }
}

/// Range selection with anchor and focus points.
///
/// The anchor is where the selection started, the focus is where the caret
/// is now. They may be in any document order.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct RangeSelection {
    /// Where selection started
    pub anchor: Point,
    /// Where the caret is now
    pub focus: Point,
}

impl RangeSelection {
    /// Create a new selection.
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    /// Create a collapsed selection (caret position).
    pub fn collapsed(key: NodeKey, offset: usize) -> Self {
        let point = Point::new(key, offset);
        Self {
            anchor: point,
            focus: point,
        }
    }

    /// Check if the selection is collapsed (caret only).
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Whether either point refers to `key`.
    pub fn touches(&self, key: NodeKey) -> bool {
        self.anchor.key == key || self.focus.key == key
    }
}
