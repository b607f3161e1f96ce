//! Deletes the decorator whose marker was deleted by the user.

use std::collections::BTreeSet;

use zerowidth_editor::{
    DocumentTree, Editor, MutationBatch, NodeKey, NodeMutation, TreeError, Unregister, UpdateTag,
};

use crate::link_map::{LinkMap, LinkMapRef};
use crate::node::{ZERO_WIDTH_IME_CHARACTER, ZERO_WIDTH_IME_NODE_TYPE, create_zero_width_node};

/// Outcome of one counterpart cleanup pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CounterpartReport {
    /// Decorators deleted because their marker was deleted.
    pub removed_counterparts: Vec<NodeKey>,
    /// Replacement markers created while repairing merged text.
    pub repaired_merges: Vec<NodeKey>,
}

impl CounterpartReport {
    pub fn is_empty(&self) -> bool {
        self.removed_counterparts.is_empty() && self.repaired_merges.is_empty()
    }
}

pub fn has_destroyed(batch: &MutationBatch) -> bool {
    batch
        .values()
        .any(|mutation| *mutation == NodeMutation::Destroyed)
}

/// For every linked marker no longer in the tree, delete its counterpart
/// and drop the entry.
///
/// Entries whose counterpart is already gone are dropped without touching
/// the tree. With `merge_artifact_workaround`, a counterpart followed by a
/// plain text node that starts with the marker character is kept: the host
/// merged the marker into that text rather than the user deleting it, so the
/// text node is replaced by a fresh unlinked marker holding the caret.
pub fn remove_orphaned_counterparts<T: DocumentTree + ?Sized>(
    tree: &mut T,
    links: &mut LinkMap,
    merge_artifact_workaround: bool,
) -> CounterpartReport {
    let mut report = CounterpartReport::default();
    let remaining: BTreeSet<NodeKey> = tree
        .nodes_of_type(ZERO_WIDTH_IME_NODE_TYPE)
        .into_iter()
        .collect();
    let destroyed: Vec<NodeKey> = links
        .keys()
        .filter(|marker| !remaining.contains(marker))
        .collect();

    for marker in destroyed {
        let Some(counterpart) = links.get(marker) else {
            continue;
        };
        if !tree.is_attached(counterpart) {
            links.unlink(marker);
            tracing::debug!(target: "zerowidth::counterpart", %marker, %counterpart, "dropped link to missing counterpart");
            continue;
        }

        if merge_artifact_workaround {
            if let Some(merged) = merged_text_after(&*tree, counterpart) {
                links.unlink(marker);
                match repair_merge(tree, merged) {
                    Ok(replacement) => report.repaired_merges.push(replacement),
                    Err(error) => {
                        tracing::warn!(target: "zerowidth::counterpart", %error, text = %merged, "failed to repair merged marker");
                    }
                }
                continue;
            }
        }

        match tree.remove(counterpart) {
            Ok(()) => report.removed_counterparts.push(counterpart),
            Err(error) => {
                tracing::warn!(target: "zerowidth::counterpart", %error, %counterpart, "failed to remove counterpart");
            }
        }
        links.unlink(marker);
    }

    if !report.is_empty() {
        tracing::debug!(
            target: "zerowidth::counterpart",
            removed = report.removed_counterparts.len(),
            repaired = report.repaired_merges.len(),
            "cleaned up after destroyed markers"
        );
    }
    report
}

/// Plain text sibling after `counterpart` that begins with the marker
/// character.
fn merged_text_after<T: DocumentTree + ?Sized>(tree: &T, counterpart: NodeKey) -> Option<NodeKey> {
    let next = tree.next_sibling(counterpart)?;
    let merged = tree.is_text(next)
        && tree
            .text_content(next)
            .is_some_and(|text| text.starts_with(ZERO_WIDTH_IME_CHARACTER));
    merged.then_some(next)
}

fn repair_merge<T: DocumentTree + ?Sized>(tree: &mut T, merged: NodeKey) -> Result<NodeKey, TreeError> {
    let replacement = tree.create_node(create_zero_width_node(""));
    tree.insert_after(merged, replacement)?;
    tree.select_end(replacement)?;
    tree.remove(merged)?;
    Ok(replacement)
}

/// Run [`remove_orphaned_counterparts`] whenever a marker is destroyed.
pub fn register_counterpart_cleanup(
    editor: &Editor,
    links: LinkMapRef,
    merge_artifact_workaround: bool,
) -> Unregister {
    editor.register_mutation_listener(ZERO_WIDTH_IME_NODE_TYPE, move |editor, batch| {
        if !has_destroyed(batch) {
            return;
        }
        editor.update(UpdateTag::HistoryMerge, |tree| {
            remove_orphaned_counterparts(tree, &mut links.borrow_mut(), merge_artifact_workaround);
        });
    })
}
