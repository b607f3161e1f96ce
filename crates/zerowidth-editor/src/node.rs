//! Node identities and node kinds stored in the document arena.
//!
//! The tree is made of a small fixed set of built-in kinds plus
//! [`NodeKind::Custom`] leaf text variants that plugins register with the
//! editor (see [`TextNodeVariant`]).

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Stable identity of a node.
///
/// Keys are handed out by the tree at creation and are never reused within a
/// session, including across undo/redo.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey(pub(crate) u32);

impl NodeKey {
    /// Returns the raw key value (for diagnostics only).
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeKey({})", self.0)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type tags of the built-in node kinds.
pub const ROOT_NODE_TYPE: &str = "root";
pub const PARAGRAPH_NODE_TYPE: &str = "paragraph";
pub const TEXT_NODE_TYPE: &str = "text";
pub const LINE_BREAK_NODE_TYPE: &str = "linebreak";
pub const DECORATOR_NODE_TYPE: &str = "decorator";

/// How a text node reacts to editing.
///
/// `Segmented` nodes are removed wholly by a single delete instead of being
/// consumed one character at a time. `Token` nodes are immutable units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextMode {
    #[default]
    Normal,
    Token,
    Segmented,
}

/// Plain text leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextNode {
    pub text: String,
    pub mode: TextMode,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: TextMode::Normal,
        }
    }
}

/// Embedded non-text element (image, mention chip, widget...).
///
/// The tree only knows its type and an opaque JSON payload; rendering is the
/// host's business.
#[derive(Clone, Debug, PartialEq)]
pub struct DecoratorNode {
    pub decorator_type: SmolStr,
    pub data: serde_json::Value,
}

impl DecoratorNode {
    pub fn new(decorator_type: impl Into<SmolStr>) -> Self {
        Self {
            decorator_type: decorator_type.into(),
            data: serde_json::Value::Null,
        }
    }
}

/// Serialized form shared by every text-like node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedTextNode {
    #[serde(default)]
    pub detail: u32,
    #[serde(default)]
    pub format: u32,
    #[serde(default)]
    pub mode: TextMode,
    #[serde(default)]
    pub style: String,
    pub text: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    1
}

impl SerializedTextNode {
    /// Serialized record for a plain text node.
    pub fn from_text(node: &TextNode) -> Self {
        Self {
            detail: 0,
            format: 0,
            mode: node.mode,
            style: String::new(),
            text: node.text.clone(),
            node_type: TEXT_NODE_TYPE.to_owned(),
            version: 1,
        }
    }
}

/// A leaf text variant registered by a plugin.
///
/// Implementors distinguish between the characters actually rendered
/// ([`text`](Self::text)) and the content reported to the rest of the
/// editor ([`text_content`](Self::text_content)); most variants return the
/// same string for both.
pub trait TextNodeVariant: fmt::Debug + 'static {
    /// Fixed type tag, unique among registered variants.
    fn node_type(&self) -> &'static str;

    /// Characters rendered into the document. Caret offsets index this.
    fn text(&self) -> &str;

    /// Content reported by text extraction.
    fn text_content(&self) -> &str {
        self.text()
    }

    fn mode(&self) -> TextMode {
        TextMode::Normal
    }

    /// Whether the node is an atomic entity for editing purposes.
    fn is_text_entity(&self) -> bool {
        false
    }

    fn export_json(&self) -> SerializedTextNode;

    fn clone_variant(&self) -> Box<dyn TextNodeVariant>;

    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn TextNodeVariant> {
    fn clone(&self) -> Self {
        self.clone_variant()
    }
}

/// What a node is.
#[derive(Clone, Debug)]
pub enum NodeKind {
    Root,
    Paragraph,
    Text(TextNode),
    LineBreak,
    Decorator(DecoratorNode),
    Custom(Box<dyn TextNodeVariant>),
}

impl NodeKind {
    pub fn text(text: impl Into<String>) -> Self {
        NodeKind::Text(TextNode::new(text))
    }

    pub fn decorator(decorator_type: impl Into<SmolStr>) -> Self {
        NodeKind::Decorator(DecoratorNode::new(decorator_type))
    }

    pub fn custom(variant: impl TextNodeVariant) -> Self {
        NodeKind::Custom(Box::new(variant))
    }

    /// The node's type tag.
    pub fn node_type(&self) -> &'static str {
        match self {
            NodeKind::Root => ROOT_NODE_TYPE,
            NodeKind::Paragraph => PARAGRAPH_NODE_TYPE,
            NodeKind::Text(_) => TEXT_NODE_TYPE,
            NodeKind::LineBreak => LINE_BREAK_NODE_TYPE,
            NodeKind::Decorator(_) => DECORATOR_NODE_TYPE,
            NodeKind::Custom(variant) => variant.node_type(),
        }
    }

    /// Elements can hold children; everything else is a leaf.
    pub fn is_element(&self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Paragraph)
    }

    /// Plain text and custom text variants.
    pub fn is_text_like(&self) -> bool {
        matches!(self, NodeKind::Text(_) | NodeKind::Custom(_))
    }

    /// Rendered characters of a text-like node.
    pub fn rendered_text(&self) -> Option<&str> {
        match self {
            NodeKind::Text(node) => Some(&node.text),
            NodeKind::Custom(variant) => Some(variant.text()),
            _ => None,
        }
    }

    /// Reported content of a text-like node.
    pub fn text_content(&self) -> Option<&str> {
        match self {
            NodeKind::Text(node) => Some(&node.text),
            NodeKind::Custom(variant) => Some(variant.text_content()),
            _ => None,
        }
    }

    /// Downcast a custom variant to its concrete type.
    pub fn downcast_ref<T: TextNodeVariant>(&self) -> Option<&T> {
        match self {
            NodeKind::Custom(variant) => variant.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Serialized record for text-like nodes.
    pub fn export_text_json(&self) -> Option<SerializedTextNode> {
        match self {
            NodeKind::Text(node) => Some(SerializedTextNode::from_text(node)),
            NodeKind::Custom(variant) => Some(variant.export_json()),
            _ => None,
        }
    }
}

/// A node slot in the arena.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) key: NodeKey,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(key: NodeKey, kind: NodeKind) -> Self {
        Self {
            key,
            parent: None,
            children: Vec::new(),
            kind,
        }
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn node_type(&self) -> &'static str {
        self.kind.node_type()
    }
}
