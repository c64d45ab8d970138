// Shared state store collaborator
// The bridge never owns store data: it reads via selectors over an
// AppState snapshot and writes via dispatched actions only

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Business identifier of a site. Doubles as the correlation key for
/// host-initiated request/response exchanges.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SiteId(pub i64);

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The currently selected site, as set by the host or by internal
/// navigation. `slug` feeds route building; `url` is the origin
/// reported in editor faults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRef {
    pub id: SiteId,
    pub slug: Option<String>,
    pub url: String,
}

/// Per-site flags the bridge consults when answering the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteCapabilities {
    pub can_manage_options: bool,
}

/// Snapshot of the slices of application state the bridge reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    /// Whether the notifications panel is open
    pub notifications_open: bool,

    /// Whether the embedded editor has finished loading
    pub editor_loaded: bool,

    /// Cached unseen-notification count, if one is known
    pub unseen_count: Option<i64>,

    /// Most recent navigation target
    pub current_route: Option<String>,

    /// Per-site capability flags
    pub site_capabilities: HashMap<SiteId, SiteCapabilities>,

    /// Site refreshes dispatched but not yet completed
    pub pending_site_requests: Vec<SiteId>,

    /// Module activations dispatched but not yet completed
    pub pending_module_activations: Vec<(SiteId, String)>,
}

/// Actions the bridge dispatches into the store. The store is the only
/// shared mutable resource and `dispatch` is its single mutation entry
/// point.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Change the visible view
    Navigate { path: String },
    /// Open the notifications panel if closed, close it if open
    ToggleNotificationsPanel,
    /// Reload a site's data; completion is signalled asynchronously
    RequestSite { site_id: SiteId },
    /// Enable a site-level module; completion is signalled asynchronously
    ActivateModule { site_id: SiteId, module: String },
    /// Record the latest unseen-notification count
    SetUnseenCount { count: i64 },
    /// Record whether the embedded editor is ready
    SetEditorLoaded { loaded: bool },
    /// Record what the current user may do on a site
    SetSiteCapabilities {
        site_id: SiteId,
        capabilities: SiteCapabilities,
    },
}

/// Listener invoked with a fresh snapshot after every dispatched action.
pub type StoreListener = Arc<dyn Fn(&AppState) + Send + Sync>;

/// Narrow interface of the dispatchable action store.
///
/// Listeners registered through `subscribe` live for the store's
/// lifetime; the bridge registers exactly one and never retires it.
pub trait StateStore: Send + Sync {
    /// Snapshot of the current state
    fn state(&self) -> AppState;
    /// Apply an action
    fn dispatch(&self, action: Action);
    /// Register a change listener
    fn subscribe(&self, listener: StoreListener);
}

/// Reducer-backed in-memory store. The reference implementation used in
/// tests and small embedders; a real client supplies its own
/// `StateStore` over whatever state container it already runs.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<AppState>,
    listeners: Mutex<Vec<StoreListener>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: AppState) -> Self {
        Self {
            state: Mutex::new(state),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn reduce(state: &mut AppState, action: &Action) {
        match action {
            Action::Navigate { path } => {
                state.current_route = Some(path.clone());
            }
            Action::ToggleNotificationsPanel => {
                state.notifications_open = !state.notifications_open;
            }
            Action::RequestSite { site_id } => {
                state.pending_site_requests.push(*site_id);
            }
            Action::ActivateModule { site_id, module } => {
                state
                    .pending_module_activations
                    .push((*site_id, module.clone()));
            }
            Action::SetUnseenCount { count } => {
                state.unseen_count = Some(*count);
            }
            Action::SetEditorLoaded { loaded } => {
                state.editor_loaded = *loaded;
            }
            Action::SetSiteCapabilities {
                site_id,
                capabilities,
            } => {
                state.site_capabilities.insert(*site_id, capabilities.clone());
            }
        }
    }
}

impl StateStore for MemoryStore {
    fn state(&self) -> AppState {
        self.state.lock().unwrap().clone()
    }

    fn dispatch(&self, action: Action) {
        tracing::debug!(?action, "dispatching store action");
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            Self::reduce(&mut state, &action);
            state.clone()
        };
        // Listeners run outside both locks so they can re-enter
        // dispatch or read state without deadlocking.
        let listeners: Vec<StoreListener> = self.listeners.lock().unwrap().clone();
        for listener in &listeners {
            listener(&snapshot);
        }
    }

    fn subscribe(&self, listener: StoreListener) {
        self.listeners.lock().unwrap().push(listener);
    }
}
