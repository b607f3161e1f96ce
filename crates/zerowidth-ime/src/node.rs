//! The zero-width marker node.
//!
//! A marker renders as a single U+FEFF so the caret has a real text position
//! after a decorator, while reporting its configured payload as content.

use std::any::Any;

use zerowidth_editor::{
    DocumentTree, NodeKey, NodeKind, SerializedTextNode, SmolStr, TextMode, TextNodeVariant,
    TreeError,
};

/// Zero width no-break space, the only character a marker renders.
pub const ZERO_WIDTH_IME_CHARACTER: char = '\u{FEFF}';

/// Type tag of the marker node and its serialized record.
pub const ZERO_WIDTH_IME_NODE_TYPE: &str = "zeroWidthIME";

const RENDERED: &str = "\u{FEFF}";

/// Serialized marker. `text` carries the payload, not the rendered character.
pub type SerializedZeroWidthNode = SerializedTextNode;

/// Invisible text node placed directly after a decorator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZeroWidthNode {
    text_content: String,
}

impl ZeroWidthNode {
    pub fn new(text_content: impl Into<String>) -> Self {
        Self {
            text_content: text_content.into(),
        }
    }

    /// Downcast a node kind to a marker.
    pub fn from_kind(kind: &NodeKind) -> Option<&ZeroWidthNode> {
        kind.downcast_ref::<ZeroWidthNode>()
    }

    pub fn import_json(record: &SerializedZeroWidthNode) -> Result<Self, TreeError> {
        if record.node_type != ZERO_WIDTH_IME_NODE_TYPE {
            return Err(TreeError::TypeMismatch {
                expected: SmolStr::new_static(ZERO_WIDTH_IME_NODE_TYPE),
                found: SmolStr::new(&record.node_type),
            });
        }
        Ok(Self::new(record.text.clone()))
    }
}

impl TextNodeVariant for ZeroWidthNode {
    fn node_type(&self) -> &'static str {
        ZERO_WIDTH_IME_NODE_TYPE
    }

    fn text(&self) -> &str {
        RENDERED
    }

    fn text_content(&self) -> &str {
        &self.text_content
    }

    // Segmented so a single delete removes the whole marker.
    fn mode(&self) -> TextMode {
        TextMode::Segmented
    }

    fn is_text_entity(&self) -> bool {
        true
    }

    fn export_json(&self) -> SerializedZeroWidthNode {
        SerializedZeroWidthNode {
            detail: 0,
            format: 0,
            mode: self.mode(),
            style: String::new(),
            text: self.text_content.clone(),
            node_type: ZERO_WIDTH_IME_NODE_TYPE.to_owned(),
            version: 1,
        }
    }

    fn clone_variant(&self) -> Box<dyn TextNodeVariant> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// New marker carrying `text_content` as payload.
pub fn create_zero_width_node(text_content: impl Into<String>) -> NodeKind {
    NodeKind::custom(ZeroWidthNode::new(text_content))
}

pub fn is_zero_width_node<T: DocumentTree + ?Sized>(tree: &T, key: NodeKey) -> bool {
    tree.kind(key).and_then(ZeroWidthNode::from_kind).is_some()
}

/// Importer registered with the editor's node type registry.
pub fn import_zero_width_node(record: &SerializedZeroWidthNode) -> Result<NodeKind, TreeError> {
    ZeroWidthNode::import_json(record).map(NodeKind::custom)
}
