//! Listener and command registration.
//!
//! Listeners are stored in a shared registry so the [`Unregister`] handles
//! returned at registration can remove them without borrowing the editor.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::editor::Editor;
use crate::node::NodeKey;
use crate::tree::EditorTree;

/// Per-node change reported to mutation listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeMutation {
    Created,
    Updated,
    Destroyed,
}

/// Mutations of one node type in one committed update.
pub type MutationBatch = BTreeMap<NodeKey, NodeMutation>;

/// Attached decorators, keyed by node, valued by decorator type.
pub type DecoratorSet = BTreeMap<NodeKey, SmolStr>;

/// Commands dispatched through [`Editor::dispatch_command`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// The selection moved (fired by the host after caret changes).
    SelectionChange,
    KeyArrowLeft,
    KeyArrowRight,
}

/// Ordering of command handlers; higher priorities run first.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CommandPriority {
    #[default]
    Editor,
    Low,
    Normal,
    High,
    Critical,
}

pub type DecoratorListener = Rc<dyn Fn(&mut Editor, &DecoratorSet)>;
pub type TextSettledListener = Rc<dyn Fn(&mut Editor, &[NodeKey])>;
pub type MutationListener = Rc<dyn Fn(&mut Editor, &MutationBatch)>;
/// Returns `true` when the command was handled and propagation should stop.
pub type CommandListener = Rc<dyn Fn(&mut EditorTree, Command) -> bool>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct ListenerId(u64);

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    decorators: Vec<(ListenerId, DecoratorListener)>,
    text_settled: Vec<(ListenerId, TextSettledListener)>,
    mutations: Vec<(ListenerId, SmolStr, MutationListener)>,
    commands: Vec<(ListenerId, Command, CommandPriority, CommandListener)>,
}

impl ListenerRegistry {
    fn alloc_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn add_decorator(&mut self, listener: DecoratorListener) -> ListenerId {
        let id = self.alloc_id();
        self.decorators.push((id, listener));
        id
    }

    pub(crate) fn add_text_settled(&mut self, listener: TextSettledListener) -> ListenerId {
        let id = self.alloc_id();
        self.text_settled.push((id, listener));
        id
    }

    pub(crate) fn add_mutation(&mut self, node_type: SmolStr, listener: MutationListener) -> ListenerId {
        let id = self.alloc_id();
        self.mutations.push((id, node_type, listener));
        id
    }

    pub(crate) fn add_command(
        &mut self,
        command: Command,
        priority: CommandPriority,
        listener: CommandListener,
    ) -> ListenerId {
        let id = self.alloc_id();
        self.commands.push((id, command, priority, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) {
        self.decorators.retain(|(i, _)| *i != id);
        self.text_settled.retain(|(i, _)| *i != id);
        self.mutations.retain(|(i, _, _)| *i != id);
        self.commands.retain(|(i, _, _, _)| *i != id);
    }

    pub(crate) fn decorator_listeners(&self) -> Vec<DecoratorListener> {
        self.decorators.iter().map(|(_, l)| l.clone()).collect()
    }

    pub(crate) fn text_settled_listeners(&self) -> Vec<TextSettledListener> {
        self.text_settled.iter().map(|(_, l)| l.clone()).collect()
    }

    pub(crate) fn mutation_listeners(&self, node_type: &str) -> Vec<MutationListener> {
        self.mutations
            .iter()
            .filter(|(_, ty, _)| ty == node_type)
            .map(|(_, _, l)| l.clone())
            .collect()
    }

    pub(crate) fn has_mutation_listeners(&self) -> bool {
        !self.mutations.is_empty()
    }

    /// Handlers for `command`, highest priority first; registration order
    /// breaks ties.
    pub(crate) fn command_listeners(&self, command: Command) -> Vec<CommandListener> {
        let mut matching: Vec<_> = self
            .commands
            .iter()
            .filter(|(_, c, _, _)| *c == command)
            .collect();
        matching.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
        matching.into_iter().map(|(_, _, _, l)| l.clone()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.decorators.len() + self.text_settled.len() + self.mutations.len() + self.commands.len()
    }
}

/// Teardown handle returned by every registration.
///
/// Calling [`unregister`](Self::unregister) removes what was registered.
/// Dropping the handle without calling it leaves the registration in place.
#[must_use = "keep the handle to unregister later"]
pub struct Unregister {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Unregister {
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    pub(crate) fn for_listener(registry: &Rc<RefCell<ListenerRegistry>>, id: ListenerId) -> Self {
        let registry: Weak<RefCell<ListenerRegistry>> = Rc::downgrade(registry);
        Self::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.borrow_mut().remove(id);
            }
        })
    }

    pub fn unregister(mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl fmt::Debug for Unregister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unregister")
            .field("armed", &self.teardown.is_some())
            .finish()
    }
}

/// Combine several teardown handles into one that runs them in order.
pub fn merge_register(handles: impl IntoIterator<Item = Unregister>) -> Unregister {
    let handles: Vec<Unregister> = handles.into_iter().collect();
    Unregister::new(move || {
        for handle in handles {
            handle.unregister();
        }
    })
}
