use zerowidth_editor::{
    Command, DocumentTree, Editor, NodeKey, NodeKind, Point, RangeSelection, Unregister, UpdateTag,
};
use zerowidth_ime::{
    LinkMapRef, ZERO_WIDTH_IME_NODE_TYPE, ZeroWidthImeConfig, ZeroWidthNode,
    register_zero_width_ime, register_zero_width_ime_plugin, register_zero_width_ime_with_config,
};

struct Harness {
    editor: Editor,
    links: LinkMapRef,
    paragraph: NodeKey,
    handle: Unregister,
}

fn harness_with(config: ZeroWidthImeConfig) -> Harness {
    let mut editor = Editor::new();
    let links = LinkMapRef::new();
    let handle = register_zero_width_ime_with_config(&mut editor, &links, &config);
    let paragraph = editor.update(UpdateTag::HistoryPush, |tree| {
        let root = tree.root();
        let paragraph = tree.create_node(NodeKind::Paragraph);
        tree.append(root, paragraph).unwrap();
        paragraph
    });
    editor.clear_history();
    Harness {
        editor,
        links,
        paragraph,
        handle,
    }
}

fn harness() -> Harness {
    harness_with(ZeroWidthImeConfig::default())
}

impl Harness {
    fn append(&mut self, kinds: Vec<NodeKind>) -> Vec<NodeKey> {
        let paragraph = self.paragraph;
        self.editor.update(UpdateTag::HistoryPush, |tree| {
            kinds
                .into_iter()
                .map(|kind| {
                    let key = tree.create_node(kind);
                    tree.append(paragraph, key).unwrap();
                    key
                })
                .collect()
        })
    }

    fn markers(&self) -> Vec<NodeKey> {
        self.editor.tree().nodes_of_type(ZERO_WIDTH_IME_NODE_TYPE)
    }

    fn outline(&self) -> String {
        self.editor.tree().outline()
    }

    /// Every entry points from a live marker to its previous sibling.
    fn assert_links_consistent(&self) {
        let tree = self.editor.tree();
        for (marker, counterpart) in self.links.borrow().iter() {
            assert!(tree.is_attached(marker), "dangling marker {marker}");
            assert_eq!(tree.previous_sibling(marker), Some(counterpart));
        }
    }
}

#[test]
fn trailing_decorator_gets_marker() {
    let mut h = harness();
    let keys = h.append(vec![NodeKind::decorator("image")]);

    insta::assert_snapshot!(h.outline(), @r#"
    root
      paragraph
        decorator(image)
        zeroWidthIME ""
    "#);
    let markers = h.markers();
    assert_eq!(markers.len(), 1);
    assert_eq!(h.links.borrow().get(markers[0]), Some(keys[0]));
    assert_eq!(h.links.borrow().len(), 1);
}

#[test]
fn decorator_before_line_break_gets_marker() {
    let mut h = harness();
    let keys = h.append(vec![NodeKind::decorator("image"), NodeKind::LineBreak]);

    insta::assert_snapshot!(h.outline(), @r#"
    root
      paragraph
        decorator(image)
        zeroWidthIME ""
        linebreak
    "#);
    assert_eq!(h.links.borrow().len(), 1);
    assert_eq!(h.links.borrow().get(h.markers()[0]), Some(keys[0]));
}

#[test]
fn deleting_marker_deletes_decorator() {
    let mut h = harness();
    h.append(vec![NodeKind::decorator("image")]);
    let marker = h.markers()[0];

    let paragraph = h.paragraph;
    h.editor.update(UpdateTag::HistoryPush, |tree| {
        tree.remove(marker).unwrap();
        let text = tree.create_node(NodeKind::text("abc"));
        tree.append(paragraph, text).unwrap();
    });

    insta::assert_snapshot!(h.outline(), @r#"
    root
      paragraph
        text "abc"
    "#);
    assert!(h.links.borrow().is_empty());
}

#[test]
fn merged_marker_keeps_decorator() {
    let mut h = harness();
    let keys = h.append(vec![NodeKind::decorator("image")]);
    let marker = h.markers()[0];

    let paragraph = h.paragraph;
    h.editor.update(UpdateTag::HistoryPush, |tree| {
        tree.remove(marker).unwrap();
        let text = tree.create_node(NodeKind::text("\u{FEFF}a"));
        tree.append(paragraph, text).unwrap();
    });

    insta::assert_snapshot!(h.outline(), @r#"
    root
      paragraph
        decorator(image)
        zeroWidthIME ""
    "#);
    assert!(h.editor.tree().is_attached(keys[0]));
    assert!(h.links.borrow().is_empty());

    let replacement = h.markers()[0];
    assert_ne!(replacement, marker);
    assert_eq!(
        h.editor.tree().selection().copied(),
        Some(RangeSelection::collapsed(replacement, 1))
    );
}

#[test]
fn merged_marker_without_workaround_deletes_decorator() {
    let mut h = harness_with(ZeroWidthImeConfig::default().with_merge_artifact_workaround(false));
    let keys = h.append(vec![NodeKind::decorator("image")]);
    let marker = h.markers()[0];

    let paragraph = h.paragraph;
    h.editor.update(UpdateTag::HistoryPush, |tree| {
        tree.remove(marker).unwrap();
        let text = tree.create_node(NodeKind::text("\u{FEFF}a"));
        tree.append(paragraph, text).unwrap();
    });

    assert!(!h.editor.tree().is_attached(keys[0]));
    assert!(h.markers().is_empty());
    let texts = h.editor.tree().nodes_of_type("text");
    assert_eq!(texts.len(), 1);
    assert_eq!(h.editor.tree().text_content(texts[0]), Some("\u{FEFF}a"));
}

#[test]
fn typing_after_marker_removes_only_the_marker() {
    let mut h = harness();
    let keys = h.append(vec![NodeKind::decorator("image")]);
    let marker = h.markers()[0];

    // Text lands right after the marker, selected by the IME.
    let paragraph = h.paragraph;
    let text = h.editor.update(UpdateTag::HistoryPush, |tree| {
        let text = tree.create_node(NodeKind::text("tt"));
        tree.append(paragraph, text).unwrap();
        tree.set_selection(Some(RangeSelection::new(
            Point::new(text, 0),
            Point::new(text, 2),
        )));
        text
    });

    insta::assert_snapshot!(h.outline(), @r#"
    root
      paragraph
        decorator(image)
        text "tt"
    "#);
    assert!(h.editor.tree().is_attached(keys[0]));
    assert!(!h.links.borrow().contains(marker));
    assert_eq!(
        h.editor.tree().selection().copied(),
        Some(RangeSelection::collapsed(text, 2))
    );
}

#[test]
fn settled_text_elsewhere_keeps_needed_markers() {
    let mut h = harness();
    h.append(vec![
        NodeKind::decorator("a"),
        NodeKind::LineBreak,
        NodeKind::decorator("b"),
    ]);
    let before = h.outline();
    assert_eq!(h.markers().len(), 2);

    let text = h.editor.update(UpdateTag::HistoryPush, |tree| {
        let root = tree.root();
        let paragraph = tree.create_node(NodeKind::Paragraph);
        tree.append(root, paragraph).unwrap();
        let text = tree.create_node(NodeKind::text("x"));
        tree.append(paragraph, text).unwrap();
        text
    });
    h.editor.update(UpdateTag::HistoryPush, |tree| tree.set_text(text, "xy").unwrap());

    assert!(h.outline().starts_with(&before));
    assert_eq!(h.markers().len(), 2);
    assert_eq!(h.links.borrow().len(), 2);
    h.assert_links_consistent();
}

#[test]
fn moving_decorator_relocates_marker() {
    let mut h = harness();
    let keys = h.append(vec![NodeKind::decorator("image"), NodeKind::text("tail")]);
    assert!(h.markers().is_empty());

    h.editor.update(UpdateTag::HistoryPush, |tree| {
        tree.insert_after(keys[1], keys[0]).unwrap();
        tree.set_decorator_data(keys[0], serde_json::json!({"moved": true}))
            .unwrap();
    });

    insta::assert_snapshot!(h.outline(), @r#"
    root
      paragraph
        text "tail"
        decorator(image)
        zeroWidthIME ""
    "#);
    h.assert_links_consistent();

    // Moving it back leaves the old marker displaced; placement prunes it.
    h.editor.update(UpdateTag::HistoryPush, |tree| {
        tree.insert_before(keys[1], keys[0]).unwrap();
        tree.set_decorator_data(keys[0], serde_json::json!({"moved": false}))
            .unwrap();
    });
    h.assert_links_consistent();
    assert!(h.markers().is_empty());
    assert!(h.editor.tree().is_attached(keys[0]));
}

#[test]
fn caret_at_marker_start_moves_to_end() {
    let mut h = harness();
    h.append(vec![NodeKind::decorator("image")]);
    let marker = h.markers()[0];

    h.editor
        .select(Some(RangeSelection::collapsed(marker, 0)));
    assert_eq!(
        h.editor.tree().selection().copied(),
        Some(RangeSelection::collapsed(marker, 1))
    );

    let range = RangeSelection::new(Point::new(marker, 0), Point::new(marker, 1));
    h.editor.select(Some(range));
    assert_eq!(h.editor.tree().selection().copied(), Some(range));
}

#[test]
fn arrow_left_crosses_marker() {
    let mut h = harness();
    h.append(vec![NodeKind::decorator("image")]);
    let marker = h.markers()[0];

    h.editor
        .select(Some(RangeSelection::collapsed(marker, 1)));
    assert!(!h.editor.dispatch_command(Command::KeyArrowLeft));
    assert_eq!(
        h.editor.tree().selection().copied(),
        Some(RangeSelection::collapsed(h.paragraph, 1))
    );
}

#[test]
fn undo_removes_decorator_and_marker_together() {
    let mut h = harness();
    h.append(vec![NodeKind::decorator("image")]);
    assert_eq!(h.markers().len(), 1);

    assert!(h.editor.undo());
    insta::assert_snapshot!(h.outline(), @r"
    root
      paragraph
    ");
    assert!(!h.editor.can_undo());
    assert!(h.links.borrow().is_empty());

    // Redo brings both back and placement relinks a fresh marker.
    assert!(h.editor.redo());
    insta::assert_snapshot!(h.outline(), @r#"
    root
      paragraph
        decorator(image)
        zeroWidthIME ""
    "#);
    assert_eq!(h.links.borrow().len(), 1);
    h.assert_links_consistent();
}

#[test]
fn payload_is_reported_as_content() {
    let mut h = harness_with(ZeroWidthImeConfig::default().with_text_content("@"));
    h.append(vec![NodeKind::decorator("mention")]);
    let marker = h.markers()[0];

    insta::assert_snapshot!(h.outline(), @r#"
    root
      paragraph
        decorator(mention)
        zeroWidthIME "@"
    "#);
    assert_eq!(h.editor.tree().text_content(marker), Some("@"));

    let record = h.editor.export_text_node(marker).unwrap();
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["type"], "zeroWidthIME");
    assert_eq!(json["text"], "@");
    assert_eq!(json["mode"], "segmented");

    let imported = h
        .editor
        .import_text_node(&record)
        .unwrap();
    assert_eq!(
        ZeroWidthNode::from_kind(&imported),
        Some(&ZeroWidthNode::new("@"))
    );
}

#[test]
fn teardown_unregisters_everything() {
    let Harness {
        mut editor,
        links,
        paragraph,
        handle,
    } = harness();
    assert_eq!(editor.listener_count(), 5);

    handle.unregister();
    assert_eq!(editor.listener_count(), 0);

    editor.update(UpdateTag::HistoryPush, |tree| {
        let image = tree.create_node(NodeKind::decorator("image"));
        tree.append(paragraph, image).unwrap();
    });
    assert!(editor.tree().nodes_of_type(ZERO_WIDTH_IME_NODE_TYPE).is_empty());
    assert!(links.borrow().is_empty());
}

#[test]
fn plain_entry_points() {
    let mut editor = Editor::new();
    let handle = register_zero_width_ime_plugin(&mut editor, None);
    assert!(editor.has_node_type(ZERO_WIDTH_IME_NODE_TYPE));
    editor.update(UpdateTag::HistoryPush, |tree| {
        let root = tree.root();
        let paragraph = tree.create_node(NodeKind::Paragraph);
        tree.append(root, paragraph).unwrap();
        let image = tree.create_node(NodeKind::decorator("image"));
        tree.append(paragraph, image).unwrap();
    });
    assert_eq!(editor.tree().nodes_of_type(ZERO_WIDTH_IME_NODE_TYPE).len(), 1);
    handle.unregister();

    let mut editor = Editor::new();
    let links = LinkMapRef::new();
    let _handle = register_zero_width_ime(&mut editor, &links, Some("x"));
    editor.update(UpdateTag::HistoryPush, |tree| {
        let root = tree.root();
        let paragraph = tree.create_node(NodeKind::Paragraph);
        tree.append(root, paragraph).unwrap();
        let image = tree.create_node(NodeKind::decorator("image"));
        tree.append(paragraph, image).unwrap();
    });
    let marker = links.borrow().keys().next().unwrap();
    assert_eq!(editor.tree().text_content(marker), Some("x"));
}

#[test]
fn links_stay_consistent_across_edits() {
    let mut h = harness();
    let keys = h.append(vec![
        NodeKind::decorator("a"),
        NodeKind::LineBreak,
        NodeKind::decorator("b"),
        NodeKind::LineBreak,
        NodeKind::decorator("c"),
    ]);
    assert_eq!(h.links.borrow().len(), 3);
    h.assert_links_consistent();

    // Drop the middle decorator directly.
    h.editor
        .update(UpdateTag::HistoryPush, |tree| tree.remove(keys[2]).unwrap());
    h.assert_links_consistent();
    assert_eq!(h.links.borrow().len(), 2);

    // Delete the first marker: its decorator goes with it.
    let first_marker = h
        .links
        .borrow()
        .iter()
        .find(|&(_, counterpart)| counterpart == keys[0])
        .map(|(marker, _)| marker)
        .unwrap();
    h.editor
        .update(UpdateTag::HistoryPush, |tree| tree.remove(first_marker).unwrap());
    assert!(!h.editor.tree().is_attached(keys[0]));
    h.assert_links_consistent();
    assert_eq!(h.links.borrow().len(), 1);

    insta::assert_snapshot!(h.outline(), @r#"
    root
      paragraph
        linebreak
        linebreak
        decorator(c)
        zeroWidthIME ""
    "#);
}

#[test]
fn undo_relinks_restored_marker() {
    let mut h = harness();
    let keys = h.append(vec![NodeKind::decorator("image")]);
    // Typing after the marker makes composition cleanup drop it.
    h.append(vec![NodeKind::text("x")]);
    assert!(h.markers().is_empty());
    assert!(h.links.borrow().is_empty());

    assert!(h.editor.undo());
    insta::assert_snapshot!(h.outline(), @r#"
    root
      paragraph
        decorator(image)
        zeroWidthIME ""
    "#);
    let marker = h.markers()[0];
    assert_eq!(h.links.borrow().get(marker), Some(keys[0]));
    h.assert_links_consistent();

    h.editor
        .update(UpdateTag::HistoryPush, |tree| tree.remove(marker).unwrap());
    let decorator_attached = h.editor.read(|tree| tree.is_attached(keys[0]));
    assert!(!decorator_attached);
    assert!(h.links.borrow().is_empty());
}
