// Inbound command dispatch
// Each host-originated signal maps to exactly one handler; handlers
// issue a store action or navigation call and return without blocking

use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::correlator::Correlator;
use super::hub::{SignalChannel, Subscription};
use super::signals::{host, notify};
use crate::routes;
use crate::selectors;
use crate::session::UserSession;
use crate::store::{Action, SiteId, SiteRef, StateStore};

/// Routes host commands to store actions, navigation, and correlated
/// exchanges.
pub struct Dispatcher {
    store: Arc<dyn StateStore>,
    session: Arc<dyn UserSession>,
    correlator: Arc<Correlator>,
    selection: Arc<Mutex<Option<SiteRef>>>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn StateStore>,
        session: Arc<dyn UserSession>,
        correlator: Arc<Correlator>,
        selection: Arc<Mutex<Option<SiteRef>>>,
    ) -> Self {
        Self {
            store,
            session,
            correlator,
            selection,
        }
    }

    /// Register every host-command handler on `channel`. Called once at
    /// bridge startup; the registrations live for the bridge's
    /// lifetime.
    pub fn register(self: &Arc<Self>, channel: &dyn SignalChannel) -> Vec<Subscription> {
        tracing::debug!("registering host command handlers");

        let mut subscriptions = Vec::new();
        let mut on = |name: &str, handler: Arc<dyn Fn(&Dispatcher, &[Value]) + Send + Sync>| {
            let dispatcher = Arc::clone(self);
            subscriptions.push(channel.subscribe(
                name,
                Arc::new(move |args| handler(&dispatcher, args)),
            ));
        };

        on(host::PAGE_MY_SITES, Arc::new(|d, _| d.on_show_my_sites()));
        on(host::PAGE_READER, Arc::new(|d, _| d.navigate(routes::READER)));
        on(host::PAGE_PROFILE, Arc::new(|d, _| d.navigate(routes::PROFILE)));
        on(host::NEW_POST, Arc::new(|d, _| d.on_new_post()));
        on(host::SIGNOUT, Arc::new(|d, _| d.on_signout()));
        on(
            host::TOGGLE_NOTIFICATION_BAR,
            Arc::new(|d, _| d.toggle_notifications_panel()),
        );
        on(
            host::CLOSE_NOTIFICATIONS_PANEL,
            Arc::new(|d, _| d.close_notifications_panel()),
        );
        on(host::PAGE_HELP, Arc::new(|d, _| d.navigate(routes::HELP)));
        on(host::NAVIGATE, Arc::new(|d, args| d.on_navigate(args)));
        on(host::REQUEST_SITE, Arc::new(|d, args| d.on_request_site(args)));
        on(
            host::ENABLE_SITE_OPTION,
            Arc::new(|d, args| d.on_enable_site_option(args)),
        );

        subscriptions
    }

    fn selected_site(&self) -> Option<SiteRef> {
        self.selection.lock().unwrap().clone()
    }

    /// Close the notifications panel if open, then change the view.
    fn navigate(&self, path: &str) {
        tracing::debug!(path, "navigating");
        self.close_notifications_panel();
        self.store.dispatch(Action::Navigate {
            path: path.to_string(),
        });
    }

    fn toggle_notifications_panel(&self) {
        self.store.dispatch(Action::ToggleNotificationsPanel);
    }

    fn close_notifications_panel(&self) {
        if selectors::is_notifications_open(&self.store.state()) {
            self.toggle_notifications_panel();
        }
    }

    fn on_show_my_sites(&self) {
        let site = self.selected_site();
        self.navigate(&routes::stats_path(site.as_ref()));
    }

    fn on_new_post(&self) {
        let site = self.selected_site();
        self.navigate(&routes::new_post_path(site.as_ref()));
    }

    fn on_signout(&self) {
        tracing::debug!("host requested signout");
        self.session.logout();
    }

    fn on_navigate(&self, args: &[Value]) {
        // An empty or missing url is a no-op, not an error: nothing is
        // navigated and the panel is left alone.
        match args.first().and_then(Value::as_str) {
            Some(url) if !url.is_empty() => self.navigate(url),
            _ => {}
        }
    }

    fn on_request_site(&self, args: &[Value]) {
        let Some(site_id) = site_id_arg(args.first()) else {
            tracing::warn!("request-site without a usable siteId");
            return;
        };
        let store = Arc::clone(&self.store);
        self.correlator.correlate(
            site_id,
            host::REQUEST_SITE,
            notify::DID_REQUEST_SITE,
            move |key| {
                store.dispatch(Action::RequestSite { site_id: key });
            },
        );
    }

    fn on_enable_site_option(&self, args: &[Value]) {
        let Some(site_id) = site_id_arg(args.first()) else {
            tracing::warn!("enable-site-option without a usable siteId");
            return;
        };
        let Some(option) = args
            .get(1)
            .and_then(|info| info.get("option"))
            .and_then(Value::as_str)
            .map(str::to_string)
        else {
            tracing::warn!(%site_id, "enable-site-option without an option name");
            return;
        };
        let store = Arc::clone(&self.store);
        self.correlator.correlate(
            site_id,
            host::ENABLE_SITE_OPTION,
            notify::DID_ACTIVATE_SITE_MODULE,
            move |key| {
                store.dispatch(Action::ActivateModule {
                    site_id: key,
                    module: option.clone(),
                });
            },
        );
    }
}

/// Accept a numeric site id, or a numeric string as the host's menu
/// layer has historically sent.
fn site_id_arg(value: Option<&Value>) -> Option<SiteId> {
    let value = value?;
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .map(SiteId)
}
