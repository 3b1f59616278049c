//! Listener registry for list events.

use serde::Serialize;

/// Something the list reports to its consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ListEvent {
    /// The visible set changed.
    VisibilityChanged {
        /// Every visible index, ascending.
        all: Vec<usize>,
        /// Indexes that became visible.
        now: Vec<usize>,
        /// Indexes that stopped being visible.
        not_now: Vec<usize>,
    },
    /// The start threshold was reached.
    StartReached,
    /// The end threshold was reached.
    EndReached,
    /// The list was rebuilt from a saved context.
    Recreated {
        /// Offset the previous instance was at.
        last_offset: f64,
    },
    /// A mounted item reported its measured size.
    ItemLaidOut {
        /// Data index of the item.
        index: usize,
    },
}

/// Handle returned by [`ListenerRegistry::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Boxed event callback.
pub type Listener = Box<dyn FnMut(&ListEvent)>;

/// Ordered set of event callbacks.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener)>,
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; it sees every event emitted from now on.
    pub fn add(&mut self, listener: impl FnMut(&ListEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unregister a callback. Returns whether it was registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        self.listeners.len() != before
    }

    /// Deliver `event` to every callback in registration order.
    pub fn emit(&mut self, event: &ListEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
