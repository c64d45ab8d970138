// Unified signal subscription surface
// Both the host transport and the client-internal application-event
// surface are addressed through the same contract, so dispatcher and
// notifier code is agnostic to which physical channel a signal
// arrives on

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;

/// Handler invoked with the positional payload of a named signal.
pub type Handler = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// A duplex, asynchronous, named-message channel.
///
/// `send` is fire-and-forget: it never blocks and gives no delivery
/// guarantee. Handlers registered for one signal name fire in
/// registration order; nothing is guaranteed across distinct names.
pub trait SignalChannel: Send + Sync {
    /// Send a named message with a positional payload.
    fn send(&self, name: &str, args: Vec<Value>);

    /// Register a handler invoked whenever a message of that name
    /// arrives. Returns a disposer.
    fn subscribe(&self, name: &str, handler: Handler) -> Subscription;

    /// Register a handler retired immediately before its first
    /// matching invocation. Retirement is a property of this
    /// primitive: late emits after the first match are ignored, never
    /// double-delivered.
    fn subscribe_once(&self, name: &str, handler: Handler) -> Subscription;
}

struct Entry {
    id: u64,
    once: bool,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: HashMap<String, Vec<Entry>>,
}

/// In-process signal bus. Serves as the client-internal signal surface
/// and as an in-memory channel double in tests; `send` dispatches
/// locally to subscribers.
#[derive(Clone, Default)]
pub struct SignalHub {
    registry: Arc<Mutex<Registry>>,
}

impl SignalHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, name: &str, handler: Handler, once: bool) -> Subscription {
        let mut registry = self.registry.lock().unwrap();
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .entries
            .entry(name.to_string())
            .or_default()
            .push(Entry { id, once, handler });
        Subscription {
            registry: Arc::downgrade(&self.registry),
            name: name.to_string(),
            id,
        }
    }

    /// Dispatch a signal to every live subscriber of `name`.
    ///
    /// One-shot entries are removed from the registry before their
    /// handler runs, and handlers run outside the registry lock so
    /// they may subscribe, dispose, or emit further signals.
    pub fn emit(&self, name: &str, args: &[Value]) {
        let to_run: Vec<Handler> = {
            let mut registry = self.registry.lock().unwrap();
            let Some(list) = registry.entries.get_mut(name) else {
                return;
            };
            let handlers = list.iter().map(|e| Arc::clone(&e.handler)).collect();
            list.retain(|e| !e.once);
            handlers
        };
        for handler in to_run {
            handler(args);
        }
    }

    /// Number of live subscriptions for a signal name.
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.registry
            .lock()
            .unwrap()
            .entries
            .get(name)
            .map(|list| list.len())
            .unwrap_or(0)
    }
}

impl SignalChannel for SignalHub {
    fn send(&self, name: &str, args: Vec<Value>) {
        self.emit(name, &args);
    }

    fn subscribe(&self, name: &str, handler: Handler) -> Subscription {
        self.register(name, handler, false)
    }

    fn subscribe_once(&self, name: &str, handler: Handler) -> Subscription {
        self.register(name, handler, true)
    }
}

/// Disposer handle for a registered handler.
///
/// Disposal is explicit and idempotent. Dropping the handle leaves the
/// handler registered, so fire-and-forget registrations at bridge
/// startup need not keep their handles alive.
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    name: String,
    id: u64,
}

impl Subscription {
    /// Unregister the handler. A no-op if it already retired or the
    /// channel is gone.
    pub fn dispose(&self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock().unwrap();
            if let Some(list) = registry.entries.get_mut(&self.name) {
                list.retain(|entry| entry.id != self.id);
            }
        }
    }

    /// Whether the handler is still registered.
    pub fn is_active(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry
                .lock()
                .unwrap()
                .entries
                .get(&self.name)
                .map(|list| list.iter().any(|entry| entry.id == self.id))
                .unwrap_or(false),
            None => false,
        }
    }
}
