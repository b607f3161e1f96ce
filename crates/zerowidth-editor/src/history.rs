//! Undo/redo history for editor updates.
//!
//! Provides:
//! - `UpdateTag` - how a committed update is folded into history
//! - `History` - bounded snapshot stacks driven by those tags

use serde::{Deserialize, Serialize};

use crate::tree::EditorTree;

/// Transaction metadata controlling how an update enters history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateTag {
    /// Start a new undo step.
    #[default]
    HistoryPush,
    /// Fold into the current undo step so it is undone together with the
    /// change that triggered it.
    HistoryMerge,
    /// Replay of an undo/redo step. Never recorded.
    Historic,
}

/// Snapshot-based undo/redo stacks.
///
/// Each undo entry is the committed tree as it was *before* the step, so
/// undoing restores it wholesale.
pub struct History {
    undo_stack: Vec<EditorTree>,
    redo_stack: Vec<EditorTree>,
    max_steps: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}

impl History {
    /// Create an empty history keeping at most `max_steps` undo entries.
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Record a committed update. `before` is the tree prior to the update.
    pub(crate) fn record(&mut self, before: EditorTree, tag: UpdateTag) {
        match tag {
            UpdateTag::HistoryPush => {
                // Clear redo stack on new edit
                self.redo_stack.clear();
                self.undo_stack.push(before);

                // Trim if over max
                while self.undo_stack.len() > self.max_steps {
                    self.undo_stack.remove(0);
                }
            }
            // The top entry already holds the state before the step being
            // merged into; nothing to store.
            UpdateTag::HistoryMerge | UpdateTag::Historic => {}
        }
    }

    /// Pop the previous state, stashing `current` for redo.
    pub(crate) fn undo(&mut self, current: EditorTree) -> Option<EditorTree> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    /// Pop the next state, stashing `current` for undo.
    pub(crate) fn redo(&mut self, current: EditorTree) -> Option<EditorTree> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo steps available.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
