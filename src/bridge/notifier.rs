// Edge-triggered state watching
// Derived values are recomputed on every store change but notify only
// on observed transitions, so the host never sees redundant pushes

use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::store::{AppState, StateStore};

type Probe = Arc<dyn Fn(&AppState) -> Value + Send + Sync>;
type OnChange = Arc<dyn Fn(&Value) + Send + Sync>;

/// One derived value watched for transitions.
///
/// `on_change` fires with the new value whenever the probe's result
/// differs from the previously observed one (strict inequality). With
/// `feed_startup_value`, the initial value is fed to `on_change` at
/// attach time as well: startup state counts as an edge when there is
/// no transition to observe.
pub struct Tracker {
    name: String,
    probe: Probe,
    on_change: OnChange,
    feed_startup_value: bool,
}

impl Tracker {
    pub fn new(
        name: impl Into<String>,
        probe: impl Fn(&AppState) -> Value + Send + Sync + 'static,
        on_change: impl Fn(&Value) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            probe: Arc::new(probe),
            on_change: Arc::new(on_change),
            feed_startup_value: false,
        }
    }

    /// Feed the initial value to the callback at attach time.
    pub fn feed_startup_value(mut self) -> Self {
        self.feed_startup_value = true;
        self
    }
}

struct Tracked {
    tracker: Tracker,
    previous: Mutex<Value>,
}

/// Watches a fixed set of derived values over one store subscription.
pub struct StateNotifier {
    trackers: Vec<Tracker>,
}

impl StateNotifier {
    pub fn new() -> Self {
        Self {
            trackers: Vec::new(),
        }
    }

    pub fn track(mut self, tracker: Tracker) -> Self {
        self.trackers.push(tracker);
        self
    }

    /// Capture the current value of every tracker, perform the startup
    /// feeds, and subscribe to the store. Consumes the notifier; the
    /// subscription lives for the store's lifetime.
    pub fn attach(self, store: &dyn StateStore) {
        let initial = store.state();
        let tracked: Vec<Tracked> = self
            .trackers
            .into_iter()
            .map(|tracker| {
                let value = (tracker.probe)(&initial);
                if tracker.feed_startup_value {
                    tracing::debug!(tracker = %tracker.name, ?value, "feeding startup value");
                    (tracker.on_change)(&value);
                }
                Tracked {
                    tracker,
                    previous: Mutex::new(value),
                }
            })
            .collect();

        let tracked = Arc::new(tracked);
        store.subscribe(Arc::new(move |state: &AppState| {
            for entry in tracked.iter() {
                let value = (entry.tracker.probe)(state);
                let mut previous = entry.previous.lock().unwrap();
                if value != *previous {
                    tracing::debug!(
                        tracker = %entry.tracker.name,
                        from = ?*previous,
                        to = ?value,
                        "tracked value transition"
                    );
                    *previous = value.clone();
                    drop(previous);
                    (entry.tracker.on_change)(&value);
                }
            }
        }));
    }
}

impl Default for StateNotifier {
    fn default() -> Self {
        Self::new()
    }
}
