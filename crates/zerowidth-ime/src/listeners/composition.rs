//! Removes markers that stopped being useful once composition settles.
//!
//! Text-settled notifications only fire for committed text, so deleting
//! markers here never interrupts an IME session in progress.

use zerowidth_editor::{DocumentTree, Editor, NodeKey, Unregister, UpdateTag};

use crate::link_map::{LinkMap, LinkMapRef};
use crate::node::ZERO_WIDTH_IME_NODE_TYPE;

/// A marker is needed only directly after a decorator and directly before a
/// line break or the end of its parent.
pub fn is_necessary<T: DocumentTree + ?Sized>(tree: &T, marker: NodeKey) -> bool {
    let after_decorator = tree
        .previous_sibling(marker)
        .is_some_and(|key| tree.is_decorator(key));
    let before_break_or_end = tree
        .next_sibling(marker)
        .is_none_or(|key| tree.is_line_break(key));
    after_decorator && before_break_or_end
}

/// Delete every marker that is no longer necessary and return how many were
/// deleted.
///
/// All of them are unlinked before any is deleted, so counterpart cleanup
/// sees no destroyed marker with a recorded counterpart and leaves the
/// decorators alone.
pub fn remove_unnecessary_zero_width_nodes<T: DocumentTree + ?Sized>(
    tree: &mut T,
    links: &mut LinkMap,
) -> usize {
    let unnecessary: Vec<NodeKey> = tree
        .nodes_of_type(ZERO_WIDTH_IME_NODE_TYPE)
        .into_iter()
        .filter(|&marker| !is_necessary(&*tree, marker))
        .collect();

    for &marker in &unnecessary {
        links.unlink(marker);
    }

    let mut removed = 0;
    for marker in unnecessary {
        let next = tree.next_sibling(marker);
        if let Err(error) = tree.remove(marker) {
            tracing::warn!(target: "zerowidth::composition", %error, %marker, "failed to remove marker");
            continue;
        }
        removed += 1;

        // Some IMEs select the whole following text node when the marker
        // before it disappears mid-word; collapse to its end.
        let Some(next) = next else {
            continue;
        };
        let selects_only_next = tree.selection().is_some_and(|sel| !sel.is_collapsed())
            && tree.selection_nodes() == [next];
        if selects_only_next {
            if let Err(error) = tree.select_end(next) {
                tracing::warn!(target: "zerowidth::composition", %error, node = %next, "failed to collapse selection");
            }
        }
    }

    if removed > 0 {
        tracing::debug!(target: "zerowidth::composition", removed, "removed unnecessary markers");
    }
    removed
}

/// Run [`remove_unnecessary_zero_width_nodes`] after every update that
/// settled plain text.
pub fn register_composition_cleanup(editor: &Editor, links: LinkMapRef) -> Unregister {
    editor.register_text_settled_listener(move |editor, _settled| {
        editor.update(UpdateTag::HistoryMerge, |tree| {
            remove_unnecessary_zero_width_nodes(tree, &mut links.borrow_mut());
        });
    })
}
