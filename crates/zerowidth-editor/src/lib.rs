//! zerowidth-editor: minimal in-memory rich-text editor engine.
//!
//! This crate provides:
//! - `DocumentTree` trait for tree access inside an update
//! - `EditorTree` - arena-backed implementation
//! - `Editor` - transactional updates, undo history, listener and command bus
//! - Node kinds, including plugin-defined text variants (`TextNodeVariant`)

pub mod document;
pub mod editor;
pub mod error;
pub mod history;
pub mod listeners;
pub mod node;
pub mod selection;
pub mod tree;

pub use document::DocumentTree;
pub use editor::{Editor, EditorConfig, NodeImporter};
pub use error::TreeError;
pub use history::{History, UpdateTag};
pub use listeners::{
    Command, CommandListener, CommandPriority, DecoratorListener, DecoratorSet, MutationBatch,
    MutationListener, NodeMutation, TextSettledListener, Unregister, merge_register,
};
pub use node::{
    DECORATOR_NODE_TYPE, DecoratorNode, LINE_BREAK_NODE_TYPE, Node, NodeKey, NodeKind,
    PARAGRAPH_NODE_TYPE, ROOT_NODE_TYPE, SerializedTextNode, TEXT_NODE_TYPE, TextMode, TextNode,
    TextNodeVariant,
};
pub use selection::{Point, RangeSelection};
pub use smol_str::SmolStr;
pub use tree::{EditorTree, UpdateSummary};
