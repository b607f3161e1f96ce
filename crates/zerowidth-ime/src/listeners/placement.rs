//! Creates, prunes and relocates markers when decorators change.

use zerowidth_editor::{
    DocumentTree, Editor, LINE_BREAK_NODE_TYPE, NodeKey, Unregister, UpdateTag,
};

use crate::link_map::{LinkMap, LinkMapRef};
use crate::node::{ZERO_WIDTH_IME_NODE_TYPE, create_zero_width_node};

/// Markers removed and created by one placement pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub removed: Vec<NodeKey>,
    pub created: Vec<NodeKey>,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.created.is_empty()
    }
}

/// Bring markers in line with the decorators currently in the tree.
///
/// 1. Markers without a registry entry, or whose previous sibling is no
///    longer their counterpart, are deleted.
/// 2. If the document ends in a decorator, every remaining marker is deleted
///    and a single marker is placed after that decorator.
/// 3. Every line break directly preceded by a decorator gets a marker
///    inserted before it.
///
/// Every deletion unlinks the marker first. Running the pass twice without
/// intervening edits changes nothing.
pub fn sync_zero_width_nodes<T: DocumentTree + ?Sized>(
    tree: &mut T,
    links: &mut LinkMap,
    text_content: &str,
) -> SyncReport {
    let mut report = SyncReport::default();
    let markers = tree.nodes_of_type(ZERO_WIDTH_IME_NODE_TYPE);

    for &marker in &markers {
        let in_place = links
            .get(marker)
            .is_some_and(|counterpart| tree.previous_sibling(marker) == Some(counterpart));
        if !in_place {
            remove_marker(tree, links, marker, &mut report);
        }
    }

    let root = tree.root();
    if let Some(last) = tree.last_descendant(root).filter(|&key| tree.is_decorator(key)) {
        for &marker in &markers {
            if tree.is_attached(marker) {
                remove_marker(tree, links, marker, &mut report);
            }
        }
        let marker = tree.create_node(create_zero_width_node(text_content));
        match tree.insert_after(last, marker) {
            Ok(()) => {
                links.link(marker, last);
                report.created.push(marker);
            }
            Err(error) => {
                tracing::warn!(target: "zerowidth::placement", %error, decorator = %last, "failed to place trailing marker");
            }
        }
    }

    for line_break in tree.nodes_of_type(LINE_BREAK_NODE_TYPE) {
        let Some(decorator) = tree
            .previous_sibling(line_break)
            .filter(|&key| tree.is_decorator(key))
        else {
            continue;
        };
        let marker = tree.create_node(create_zero_width_node(text_content));
        match tree.insert_before(line_break, marker) {
            Ok(()) => {
                links.link(marker, decorator);
                report.created.push(marker);
            }
            Err(error) => {
                tracing::warn!(target: "zerowidth::placement", %error, %decorator, "failed to place marker before line break");
            }
        }
    }

    if !report.is_empty() {
        tracing::debug!(
            target: "zerowidth::placement",
            removed = report.removed.len(),
            created = report.created.len(),
            linked = links.len(),
            "synced markers"
        );
    }
    report
}

fn remove_marker<T: DocumentTree + ?Sized>(
    tree: &mut T,
    links: &mut LinkMap,
    marker: NodeKey,
    report: &mut SyncReport,
) {
    links.unlink(marker);
    match tree.remove(marker) {
        Ok(()) => report.removed.push(marker),
        Err(error) => {
            tracing::warn!(target: "zerowidth::placement", %error, %marker, "failed to remove marker");
        }
    }
}

/// Run [`sync_zero_width_nodes`] whenever the decorator set changes, merged
/// into the history step that changed it.
pub fn register_placement_listener(
    editor: &Editor,
    links: LinkMapRef,
    text_content: String,
) -> Unregister {
    editor.register_decorator_listener(move |editor, _decorators| {
        editor.update(UpdateTag::HistoryMerge, |tree| {
            sync_zero_width_nodes(tree, &mut links.borrow_mut(), &text_content);
        });
    })
}
