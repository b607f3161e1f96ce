//! Entry points wiring every reconciliation to an editor.

use zerowidth_editor::{Editor, Unregister, merge_register};

use crate::config::ZeroWidthImeConfig;
use crate::link_map::LinkMapRef;
use crate::listeners::{
    register_composition_cleanup, register_counterpart_cleanup, register_placement_listener,
    register_selection_commands,
};
use crate::node::{ZERO_WIDTH_IME_NODE_TYPE, import_zero_width_node};

/// Teach the editor to import serialized markers.
pub fn register_zero_width_node_type(editor: &mut Editor) {
    editor.register_node_type(ZERO_WIDTH_IME_NODE_TYPE, import_zero_width_node);
}

/// Register placement, composition cleanup, counterpart cleanup and the two
/// caret guards against one shared registry. `None` means an empty payload.
pub fn register_zero_width_ime(
    editor: &mut Editor,
    links: &LinkMapRef,
    text_content: Option<&str>,
) -> Unregister {
    let config = ZeroWidthImeConfig::default().with_text_content(text_content.unwrap_or_default());
    register_zero_width_ime_with_config(editor, links, &config)
}

pub fn register_zero_width_ime_with_config(
    editor: &mut Editor,
    links: &LinkMapRef,
    config: &ZeroWidthImeConfig,
) -> Unregister {
    register_zero_width_node_type(editor);
    tracing::debug!(
        target: "zerowidth::editor",
        text_content = %config.text_content,
        merge_artifact_workaround = config.merge_artifact_workaround,
        priority = ?config.priority,
        "registering zero-width IME plugin"
    );
    merge_register([
        register_placement_listener(editor, links.clone(), config.text_content.clone()),
        register_composition_cleanup(editor, links.clone()),
        register_counterpart_cleanup(editor, links.clone(), config.merge_artifact_workaround),
        register_selection_commands(editor, config.priority),
    ])
}

/// Register the plugin with a registry of its own.
pub fn register_zero_width_ime_plugin(editor: &mut Editor, text_content: Option<&str>) -> Unregister {
    register_zero_width_ime(editor, &LinkMapRef::new(), text_content)
}
