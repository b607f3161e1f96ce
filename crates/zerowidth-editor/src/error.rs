//! Error types for tree operations.

use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

use crate::node::NodeKey;

/// Errors returned by [`DocumentTree`](crate::DocumentTree) operations and
/// node import.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum TreeError {
    /// No node with this key exists in the arena.
    #[error("node {0} not found")]
    #[diagnostic(code(zerowidth::tree::not_found))]
    NodeNotFound(NodeKey),

    /// The node exists but is not attached to the root.
    #[error("node {0} is not attached to the document")]
    #[diagnostic(code(zerowidth::tree::detached))]
    Detached(NodeKey),

    /// Children were requested from a leaf.
    #[error("node {0} cannot hold children")]
    #[diagnostic(code(zerowidth::tree::not_an_element))]
    NotAnElement(NodeKey),

    /// The root cannot be removed, moved or given siblings.
    #[error("operation not permitted on the root node")]
    #[diagnostic(code(zerowidth::tree::root))]
    RootOperation,

    /// A node cannot be inserted into its own subtree.
    #[error("node {0} cannot be moved into its own subtree")]
    #[diagnostic(code(zerowidth::tree::cycle))]
    Cycle(NodeKey),

    /// No importer is registered for this type tag.
    #[error("no node type registered for `{0}`")]
    #[diagnostic(
        code(zerowidth::import::unknown_type),
        help("register the node type with `Editor::register_node_type` first")
    )]
    UnknownNodeType(SmolStr),

    /// A serialized record was handed to the wrong importer.
    #[error("expected node type `{expected}`, found `{found}`")]
    #[diagnostic(code(zerowidth::import::type_mismatch))]
    TypeMismatch { expected: SmolStr, found: SmolStr },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    #[diagnostic(code(zerowidth::serde))]
    Serialization(#[from] serde_json::Error),
}
