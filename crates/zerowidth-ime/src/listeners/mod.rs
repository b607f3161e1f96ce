//! Reconciliations that keep markers in step with the tree.
//!
//! Each module exposes a free function generic over [`DocumentTree`] that
//! performs one reconciliation pass, plus a `register_*` function that wires
//! it to the matching [`Editor`](zerowidth_editor::Editor) notification.
//!
//! [`DocumentTree`]: zerowidth_editor::DocumentTree

pub mod composition;
pub mod counterpart;
pub mod placement;
pub mod selection;

pub use composition::{
    is_necessary, register_composition_cleanup, remove_unnecessary_zero_width_nodes,
};
pub use counterpart::{
    CounterpartReport, has_destroyed, register_counterpart_cleanup, remove_orphaned_counterparts,
};
pub use placement::{SyncReport, register_placement_listener, sync_zero_width_nodes};
pub use selection::{guard_arrow_left, guard_selection_change, register_selection_commands};
