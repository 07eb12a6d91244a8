//! Typed pub/sub bus for feed events.
//!
//! Maintains a per-event-kind subscriber registry:
//!
//! - [`subscribe`](EventBus::subscribe) registers a handler and returns a
//!   [`Subscription`] guard; dropping the guard (or calling
//!   [`unsubscribe`](Subscription::unsubscribe)) removes the handler.
//! - When the last handler for a kind is removed, the registry entry is
//!   deleted rather than left empty, so the map never grows past the set of
//!   kinds with live subscribers.
//! - [`emit`](EventBus::emit) delivers to a snapshot of the current
//!   handlers for the event's kind, synchronously, isolating panics per
//!   handler. Delivery order between handlers is unspecified.
//!
//! Lifecycle pseudo-events (`connected`, `disconnected`, `error`) travel
//! through the same registry as domain broadcast events; subscribers
//! discriminate by [`FeedEvent::kind`].

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use crate::models::{EventKind, FeedEvent};

/// Callback invoked for every event of the subscribed kind.
pub type EventHandler = Arc<dyn Fn(&FeedEvent) + Send + Sync>;

struct RegisteredHandler {
    id: u64,
    handler: EventHandler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<EventKind, Vec<RegisteredHandler>>,
}

/// Per-kind subscriber registry with synchronous fan-out.
///
/// The bus exclusively owns its subscriber sets: entries are only ever
/// added by [`subscribe`](EventBus::subscribe) and only ever removed by the
/// matching [`Subscription`] guard, so a live guard always refers to a
/// registration the bus still knows about. Clones share the registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind.
    ///
    /// The returned guard unsubscribes on drop. Handlers must be
    /// order-agnostic with respect to other handlers of the same kind.
    pub fn subscribe(
        &self,
        kind: EventKind,
        handler: impl Fn(&FeedEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = {
            let mut registry = self.registry.lock().expect("event bus poisoned");
            let id = registry.next_id;
            registry.next_id += 1;
            registry.subscribers.entry(kind).or_default().push(RegisteredHandler {
                id,
                handler: Arc::new(handler),
            });
            id
        };
        Subscription {
            bus: self.clone(),
            kind,
            id,
            active: true,
        }
    }

    /// Deliver an event to every handler currently registered for its kind.
    ///
    /// The handler list is snapshotted before delivery, so handlers may
    /// subscribe or unsubscribe reentrantly without deadlocking; such
    /// changes take effect from the next emission. A panicking handler is
    /// logged and skipped without affecting the remaining handlers.
    pub fn emit(&self, event: &FeedEvent) {
        let kind = event.kind();
        let snapshot: Vec<EventHandler> = {
            let registry = self.registry.lock().expect("event bus poisoned");
            match registry.subscribers.get(&kind) {
                Some(handlers) => handlers.iter().map(|h| Arc::clone(&h.handler)).collect(),
                None => return,
            }
        };
        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                log::error!("[comanda-link] Subscriber for '{}' events panicked", kind);
            }
        }
    }

    /// Number of handlers currently registered for a kind.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        let registry = self.registry.lock().expect("event bus poisoned");
        registry.subscribers.get(&kind).map_or(0, Vec::len)
    }

    /// Kinds that currently have at least one registered handler.
    pub fn registered_kinds(&self) -> Vec<EventKind> {
        let registry = self.registry.lock().expect("event bus poisoned");
        registry.subscribers.keys().copied().collect()
    }

    fn unsubscribe(&self, kind: EventKind, id: u64) {
        let mut registry = self.registry.lock().expect("event bus poisoned");
        if let Some(handlers) = registry.subscribers.get_mut(&kind) {
            handlers.retain(|h| h.id != id);
            if handlers.is_empty() {
                registry.subscribers.remove(&kind);
            }
        }
    }
}

/// Opaque unsubscribe handle returned by [`EventBus::subscribe`].
///
/// Unsubscribing is idempotent: an explicit [`unsubscribe`] consumes the
/// guard, and `Drop` is a no-op afterwards.
///
/// [`unsubscribe`]: Subscription::unsubscribe
pub struct Subscription {
    bus: EventBus,
    kind: EventKind,
    id: u64,
    active: bool,
}

impl Subscription {
    /// The event kind this subscription listens to.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Remove the handler from the bus.
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if self.active {
            self.active = false;
            self.bus.unsubscribe(self.kind, self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}
