//! zerowidth-ime: zero-width markers that make decorator nodes IME friendly.
//!
//! Browsers mishandle composition and caret movement next to non-text inline
//! elements. This crate keeps an invisible U+FEFF text node after each
//! decorator that needs one, linked to it through a [`LinkMap`]:
//!
//! - placement creates and relocates markers when decorators change
//! - composition cleanup drops markers made redundant by typed text
//! - counterpart cleanup deletes a decorator when the user deletes its marker
//! - selection guards keep the caret off the marker's leading edge
//!
//! [`register_zero_width_ime`] wires all of them to a
//! [`zerowidth_editor::Editor`]. The reconciliations are also exported as
//! plain functions over any [`zerowidth_editor::DocumentTree`].

pub mod config;
pub mod link_map;
pub mod listeners;
pub mod node;
pub mod register;

pub use config::ZeroWidthImeConfig;
pub use link_map::{LinkMap, LinkMapRef};
pub use listeners::{
    CounterpartReport, SyncReport, guard_arrow_left, guard_selection_change, is_necessary,
    remove_orphaned_counterparts, remove_unnecessary_zero_width_nodes, sync_zero_width_nodes,
};
pub use node::{
    SerializedZeroWidthNode, ZERO_WIDTH_IME_CHARACTER, ZERO_WIDTH_IME_NODE_TYPE, ZeroWidthNode,
    create_zero_width_node, import_zero_width_node, is_zero_width_node,
};
pub use register::{
    register_zero_width_ime, register_zero_width_ime_plugin, register_zero_width_ime_with_config,
    register_zero_width_node_type,
};
