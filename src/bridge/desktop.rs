// Bridge assembly
// One instance per client process, constructed with injected
// dependencies and initialized once

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::bail;
use serde_json::{Value, json};

use super::correlator::Correlator;
use super::dispatcher::Dispatcher;
use super::emitter::{CommandEmitter, Connectivity};
use super::hub::{SignalChannel, Subscription};
use super::message::{EditorFault, EditorUnavailable, PrintJob};
use super::notifier::{StateNotifier, Tracker};
use super::signals::notify;
use crate::config::BridgeConfig;
use crate::selectors;
use crate::session::UserSession;
use crate::store::{Action, AppState, SiteRef, StateStore};

/// The client half of the host/client bridge.
///
/// Construction takes every collaborator up front, so by the time any
/// subscription is registered the store handle is already available.
/// `init` wires the inbound dispatcher, the internal signal surface,
/// and the edge-triggered notifier, then performs the startup pushes.
pub struct DesktopBridge {
    transport: Arc<dyn SignalChannel>,
    signals: Arc<dyn SignalChannel>,
    store: Arc<dyn StateStore>,
    session: Arc<dyn UserSession>,
    emitter: Arc<CommandEmitter>,
    correlator: Arc<Correlator>,
    selection: Arc<Mutex<Option<SiteRef>>>,
    initialized: AtomicBool,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl DesktopBridge {
    /// `transport` carries host traffic; `signals` is the
    /// client-internal surface other subsystems raise completion and
    /// notification events on.
    pub fn new(
        transport: Arc<dyn SignalChannel>,
        signals: Arc<dyn SignalChannel>,
        store: Arc<dyn StateStore>,
        session: Arc<dyn UserSession>,
        connectivity: Arc<dyn Connectivity>,
        config: BridgeConfig,
    ) -> Self {
        let emitter = Arc::new(CommandEmitter::new(Arc::clone(&transport), connectivity));
        let correlator = Arc::new(Correlator::new(
            Arc::clone(&signals),
            Arc::clone(&emitter),
            config.response_timeout(),
            config.outstanding_policy,
        ));
        Self {
            transport,
            signals,
            store,
            session,
            emitter,
            correlator,
            selection: Arc::new(Mutex::new(None)),
            initialized: AtomicBool::new(false),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Register all listeners and perform the startup pushes.
    ///
    /// Errors if called a second time: per-signal handlers are
    /// permanent for the bridge's lifetime and must not be duplicated.
    pub fn init(&self) -> anyhow::Result<()> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            bail!("bridge already initialized");
        }
        tracing::debug!("registering bridge listeners");

        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&self.store),
            Arc::clone(&self.session),
            Arc::clone(&self.correlator),
            Arc::clone(&self.selection),
        ));
        let mut subscriptions = dispatcher.register(self.transport.as_ref());
        subscriptions.extend(self.register_internal_handlers());
        *self.subscriptions.lock().unwrap() = subscriptions;

        self.attach_notifier();

        // Seed the host's state: badge count by direct query, then the
        // login status.
        self.send_cached_unseen_count();
        self.send_login_status();

        Ok(())
    }

    /// Record the site the host's menus should act on. Single writer of
    /// the selection context.
    pub fn set_selected_site(&self, site: Option<SiteRef>) {
        tracing::debug!(site = ?site.as_ref().map(|s| s.id), "selection changed");
        *self.selection.lock().unwrap() = site;
    }

    pub fn selected_site(&self) -> Option<SiteRef> {
        self.selection.lock().unwrap().clone()
    }

    /// Exchanges still awaiting a store-side completion signal.
    pub fn outstanding_exchanges(&self) -> usize {
        self.correlator.outstanding_count()
    }

    fn register_internal_handlers(&self) -> Vec<Subscription> {
        let mut subscriptions = Vec::new();

        let emitter = Arc::clone(&self.emitter);
        let store = Arc::clone(&self.store);
        subscriptions.push(self.signals.subscribe(
            notify::CANNOT_USE_EDITOR,
            Arc::new(move |args| {
                let Some(fault) = parse_payload::<EditorFault>(args, notify::CANNOT_USE_EDITOR)
                else {
                    return;
                };
                let state = store.state();
                let can_user_manage_options =
                    selectors::can_manage_site_options(&state, fault.site_id);
                emitter.send_editor_unavailable(&EditorUnavailable {
                    site_id: fault.site_id,
                    reason: fault.reason,
                    editor_url: fault.editor_url,
                    wp_admin_login_url: fault.wp_admin_login_url,
                    origin: fault.origin,
                    can_user_manage_options,
                });
            }),
        ));

        let emitter = Arc::clone(&self.emitter);
        subscriptions.push(self.signals.subscribe(
            notify::VIEW_POST_CLICKED,
            Arc::new(move |args| {
                if let Some(url) = args.first().and_then(Value::as_str) {
                    emitter.send_view_post_clicked(url);
                }
            }),
        ));

        let emitter = Arc::clone(&self.emitter);
        subscriptions.push(self.signals.subscribe(
            notify::SEND_TO_PRINTER,
            Arc::new(move |args| {
                let Some(job) = parse_payload::<PrintJob>(args, notify::SEND_TO_PRINTER) else {
                    return;
                };
                emitter.send_print_job(&job.title, &job.contents);
            }),
        ));

        // The unseen-count signal feeds the store; the notifier owns
        // the outbound send, so repeated identical counts collapse.
        let store = Arc::clone(&self.store);
        subscriptions.push(self.signals.subscribe(
            notify::UNSEEN_COUNT,
            Arc::new(move |args| {
                if let Some(count) = args.first().and_then(Value::as_i64) {
                    store.dispatch(Action::SetUnseenCount { count });
                }
            }),
        ));

        subscriptions
    }

    fn attach_notifier(&self) {
        let emitter = Arc::clone(&self.emitter);
        let editor_tracker = Tracker::new(
            "editor-loaded",
            |state: &AppState| json!(selectors::is_editor_loaded(state)),
            move |value| {
                // Rising edges announce the editor; a teardown is not
                // reported to the host.
                if value.as_bool() == Some(true) {
                    emitter.send_editor_loaded();
                }
            },
        )
        .feed_startup_value();

        let emitter = Arc::clone(&self.emitter);
        let unseen_tracker = Tracker::new(
            "unseen-count",
            |state: &AppState| json!(selectors::unseen_count(state)),
            move |value| {
                if let Some(count) = value.as_i64() {
                    emitter.send_unseen_count(count);
                }
            },
        );

        StateNotifier::new()
            .track(editor_tracker)
            .track(unseen_tracker)
            .attach(self.store.as_ref());
    }

    fn send_cached_unseen_count(&self) {
        if let Some(count) = selectors::unseen_count(&self.store.state()) {
            self.emitter.send_unseen_count(count);
        }
    }

    fn send_login_status(&self) {
        let user = self.session.current_user();
        let token = self.session.oauth_token();
        self.emitter.send_login_status(user.as_ref(), token.as_deref());
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(args: &[Value], signal: &str) -> Option<T> {
    match args.first().cloned().map(serde_json::from_value) {
        Some(Ok(payload)) => Some(payload),
        _ => {
            tracing::warn!(signal, "unusable payload on internal signal");
            None
        }
    }
}
