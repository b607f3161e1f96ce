//! The editor: owns the tree, runs updates, and dispatches notifications.
//!
//! Every mutation goes through [`Editor::update`]. When the closure returns,
//! the update is committed: unattached nodes are collected, the change set
//! is diffed against the pre-update state, history is recorded according to
//! the [`UpdateTag`], and notifications are queued. Listeners may open
//! updates of their own; those commit immediately but their notifications
//! join the queue, which the outermost update drains in FIFO order.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::document::DocumentTree;
use crate::error::TreeError;
use crate::history::{History, UpdateTag};
use crate::listeners::{
    Command, CommandPriority, DecoratorSet, ListenerRegistry, MutationBatch, Unregister,
};
use crate::node::{
    DECORATOR_NODE_TYPE, NodeKey, NodeKind, SerializedTextNode, TEXT_NODE_TYPE, TextNode,
};
use crate::selection::RangeSelection;
use crate::tree::{EditorTree, UpdateSummary};

/// Builds a node from its serialized record.
pub type NodeImporter = Rc<dyn Fn(&SerializedTextNode) -> Result<NodeKind, TreeError>>;

/// Editor settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo steps kept before the oldest is dropped.
    pub history_max_steps: usize,
    /// Notifications dispatched per flush before the queue is abandoned.
    pub max_dispatch_passes: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_max_steps: 100,
            max_dispatch_passes: 256,
        }
    }
}

enum Notification {
    Decorators(DecoratorSet),
    Mutations {
        node_type: &'static str,
        batch: MutationBatch,
    },
    TextSettled(Vec<NodeKey>),
}

/// Single-threaded editor session.
pub struct Editor {
    tree: EditorTree,
    history: History,
    listeners: Rc<RefCell<ListenerRegistry>>,
    node_types: HashMap<SmolStr, NodeImporter>,
    pending: VecDeque<Notification>,
    dispatching: bool,
    config: EditorConfig,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            tree: EditorTree::new(),
            history: History::new(config.history_max_steps),
            listeners: Rc::new(RefCell::new(ListenerRegistry::default())),
            node_types: HashMap::new(),
            pending: VecDeque::new(),
            dispatching: false,
            config,
        }
    }

    /// Committed tree, read-only.
    pub fn tree(&self) -> &EditorTree {
        &self.tree
    }

    pub fn read<R>(&self, f: impl FnOnce(&EditorTree) -> R) -> R {
        f(&self.tree)
    }

    // === Updates ===

    /// Run `f` as one transaction and commit it.
    pub fn update<R>(&mut self, tag: UpdateTag, f: impl FnOnce(&mut EditorTree) -> R) -> R {
        let before_index = self.tree.index();
        let before = self.tree.snapshot();
        let result = f(&mut self.tree);
        let summary = self.tree.commit(&before_index);

        tracing::trace!(
            target: "zerowidth::editor",
            ?tag,
            node_types = summary.mutations.len(),
            decorators_changed = summary.decorators_changed,
            settled_text = summary.settled_text.len(),
            "committed update"
        );

        if summary.has_node_changes() {
            self.history.record(before, tag);
        }
        self.enqueue(summary);
        self.flush();
        result
    }

    /// Replace the selection and announce it with
    /// [`Command::SelectionChange`].
    pub fn select(&mut self, selection: Option<RangeSelection>) {
        self.update(UpdateTag::HistoryPush, |tree| tree.set_selection(selection));
        self.dispatch_command(Command::SelectionChange);
    }

    /// Run command handlers in priority order inside one update.
    ///
    /// Returns `true` if a handler reported the command as handled.
    pub fn dispatch_command(&mut self, command: Command) -> bool {
        let handlers = self.listeners.borrow().command_listeners(command);
        if handlers.is_empty() {
            return false;
        }
        self.update(UpdateTag::HistoryPush, |tree| {
            handlers.iter().any(|handler| handler(&mut *tree, command))
        })
    }

    // === History ===

    pub fn undo(&mut self) -> bool {
        let current = self.tree.snapshot();
        let Some(previous) = self.history.undo(current) else {
            return false;
        };
        self.apply_historic(previous);
        true
    }

    pub fn redo(&mut self) -> bool {
        let current = self.tree.snapshot();
        let Some(next) = self.history.redo(current) else {
            return false;
        };
        self.apply_historic(next);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn apply_historic(&mut self, state: EditorTree) {
        let before_index = self.tree.index();
        self.tree.restore(state);
        let mut summary = self.tree.commit(&before_index);
        // A restored tree may hold nodes whose listener-side bookkeeping was
        // dropped after the snapshot; let decorator listeners reconcile.
        summary.decorators_changed |= !self.tree.nodes_of_type(DECORATOR_NODE_TYPE).is_empty();
        tracing::trace!(target: "zerowidth::editor", tag = ?UpdateTag::Historic, "restored history step");
        self.enqueue(summary);
        self.flush();
    }

    // === Notifications ===

    fn decorator_set(&self) -> DecoratorSet {
        self.tree
            .nodes_of_type(DECORATOR_NODE_TYPE)
            .into_iter()
            .filter_map(|key| match self.tree.kind(key) {
                Some(NodeKind::Decorator(decorator)) => {
                    Some((key, decorator.decorator_type.clone()))
                }
                _ => None,
            })
            .collect()
    }

    fn enqueue(&mut self, summary: UpdateSummary) {
        if summary.decorators_changed {
            let decorators = self.decorator_set();
            self.pending.push_back(Notification::Decorators(decorators));
        }
        if self.listeners.borrow().has_mutation_listeners() {
            for (node_type, batch) in summary.mutations {
                self.pending
                    .push_back(Notification::Mutations { node_type, batch });
            }
        }
        if !summary.settled_text.is_empty() {
            self.pending
                .push_back(Notification::TextSettled(summary.settled_text));
        }
    }

    fn flush(&mut self) {
        if self.dispatching {
            return;
        }
        self.dispatching = true;
        let mut passes = 0;
        while let Some(notification) = self.pending.pop_front() {
            passes += 1;
            if passes > self.config.max_dispatch_passes {
                tracing::warn!(
                    target: "zerowidth::editor",
                    dropped = self.pending.len() + 1,
                    limit = self.config.max_dispatch_passes,
                    "listener feedback loop, dropping queued notifications"
                );
                self.pending.clear();
                break;
            }
            self.dispatch(notification);
        }
        self.dispatching = false;
    }

    fn dispatch(&mut self, notification: Notification) {
        match notification {
            Notification::Decorators(decorators) => {
                let listeners = self.listeners.borrow().decorator_listeners();
                for listener in listeners {
                    listener(self, &decorators);
                }
            }
            Notification::Mutations { node_type, batch } => {
                let listeners = self.listeners.borrow().mutation_listeners(node_type);
                for listener in listeners {
                    listener(self, &batch);
                }
            }
            Notification::TextSettled(keys) => {
                let live: Vec<NodeKey> = keys
                    .into_iter()
                    .filter(|key| self.tree.is_attached(*key))
                    .collect();
                if live.is_empty() {
                    return;
                }
                let listeners = self.listeners.borrow().text_settled_listeners();
                for listener in listeners {
                    listener(self, &live);
                }
            }
        }
    }

    // === Registration ===

    /// Called after any commit that adds, removes or changes a decorator.
    pub fn register_decorator_listener(
        &self,
        listener: impl Fn(&mut Editor, &DecoratorSet) + 'static,
    ) -> Unregister {
        let id = self.listeners.borrow_mut().add_decorator(Rc::new(listener));
        Unregister::for_listener(&self.listeners, id)
    }

    /// Called with the plain text nodes created or changed by a commit.
    ///
    /// Hosts commit text only once IME composition is finalised, so
    /// listeners here may mutate freely without disturbing composition.
    pub fn register_text_settled_listener(
        &self,
        listener: impl Fn(&mut Editor, &[NodeKey]) + 'static,
    ) -> Unregister {
        let id = self
            .listeners
            .borrow_mut()
            .add_text_settled(Rc::new(listener));
        Unregister::for_listener(&self.listeners, id)
    }

    /// Called with the per-node mutations of `node_type` after each commit
    /// that touched such nodes.
    pub fn register_mutation_listener(
        &self,
        node_type: impl Into<SmolStr>,
        listener: impl Fn(&mut Editor, &MutationBatch) + 'static,
    ) -> Unregister {
        let id = self
            .listeners
            .borrow_mut()
            .add_mutation(node_type.into(), Rc::new(listener));
        Unregister::for_listener(&self.listeners, id)
    }

    pub fn register_command(
        &self,
        command: Command,
        priority: CommandPriority,
        listener: impl Fn(&mut EditorTree, Command) -> bool + 'static,
    ) -> Unregister {
        let id = self
            .listeners
            .borrow_mut()
            .add_command(command, priority, Rc::new(listener));
        Unregister::for_listener(&self.listeners, id)
    }

    /// Number of live listeners and command handlers.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    // === Node types ===

    /// Register the importer for a custom text node type tag. Registering
    /// the same tag again replaces the importer.
    pub fn register_node_type(
        &mut self,
        node_type: impl Into<SmolStr>,
        importer: impl Fn(&SerializedTextNode) -> Result<NodeKind, TreeError> + 'static,
    ) {
        self.node_types.insert(node_type.into(), Rc::new(importer));
    }

    pub fn has_node_type(&self, node_type: &str) -> bool {
        node_type == TEXT_NODE_TYPE || self.node_types.contains_key(node_type)
    }

    /// Build a node from a serialized text record.
    pub fn import_text_node(&self, record: &SerializedTextNode) -> Result<NodeKind, TreeError> {
        if record.node_type == TEXT_NODE_TYPE {
            return Ok(NodeKind::Text(TextNode {
                text: record.text.clone(),
                mode: record.mode,
            }));
        }
        let importer = self
            .node_types
            .get(record.node_type.as_str())
            .ok_or_else(|| TreeError::UnknownNodeType(SmolStr::new(&record.node_type)))?;
        importer(record)
    }

    pub fn import_text_node_json(&self, json: &str) -> Result<NodeKind, TreeError> {
        let record: SerializedTextNode = serde_json::from_str(json)?;
        self.import_text_node(&record)
    }

    /// Serialized record of an attached text-like node.
    pub fn export_text_node(&self, key: NodeKey) -> Option<SerializedTextNode> {
        self.tree.kind(key)?.export_text_json()
    }
}
