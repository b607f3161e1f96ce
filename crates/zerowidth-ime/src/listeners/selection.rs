//! Keeps the caret off the leading edge of a marker.

use zerowidth_editor::{
    Command, CommandPriority, DocumentTree, Editor, Unregister, merge_register,
};

use crate::node::is_zero_width_node;

/// Move a collapsed caret at offset 0 of a marker to the marker's end.
///
/// Always returns `false` so other handlers still see the change.
pub fn guard_selection_change<T: DocumentTree + ?Sized>(tree: &mut T) -> bool {
    let Some(selection) = tree.selection().copied() else {
        return false;
    };
    if !selection.is_collapsed() || selection.anchor.offset != 0 {
        return false;
    }
    let Some(first) = tree.selection_nodes().first().copied() else {
        return false;
    };
    if is_zero_width_node(&*tree, first) {
        match tree.select_end(first) {
            Ok(()) => tracing::debug!(target: "zerowidth::selection", marker = %first, "moved caret past marker"),
            Err(error) => tracing::warn!(target: "zerowidth::selection", %error, marker = %first, "failed to move caret"),
        }
    }
    false
}

/// When the caret sits in a marker and the user presses left, jump to the
/// end of the marker's previous sibling so one keypress crosses the
/// invisible character.
///
/// Always returns `false`.
pub fn guard_arrow_left<T: DocumentTree + ?Sized>(tree: &mut T) -> bool {
    let Some(selection) = tree.selection().copied() else {
        return false;
    };
    if !selection.is_collapsed() {
        return false;
    }
    let marker = selection.anchor.key;
    if !is_zero_width_node(&*tree, marker) {
        return false;
    }
    if let Some(previous) = tree.previous_sibling(marker) {
        match tree.select_end(previous) {
            Ok(()) => tracing::debug!(target: "zerowidth::selection", %marker, %previous, "moved caret before marker"),
            Err(error) => tracing::warn!(target: "zerowidth::selection", %error, %marker, "failed to move caret"),
        }
    }
    false
}

pub fn register_selection_commands(editor: &Editor, priority: CommandPriority) -> Unregister {
    merge_register([
        editor.register_command(Command::SelectionChange, priority, |tree, _| {
            guard_selection_change(tree)
        }),
        editor.register_command(Command::KeyArrowLeft, priority, |tree, _| {
            guard_arrow_left(tree)
        }),
    ])
}
