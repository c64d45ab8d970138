use std::sync::Arc;

use serde_json::{Value, json};

use super::hub::SignalChannel;
use super::message::{EditorUnavailable, OperationResponse};
use super::signals;
use crate::session::User;

/// Network-reachability collaborator. The unseen-count push is
/// suppressed while offline, so a flapping connection does not spray
/// the host with stale badge updates.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Reports online unconditionally, for embedders without a
/// reachability source. Matches the fallback the bridge has always
/// used when no connection status was available.
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Formats and sends fire-and-forget commands to the host.
///
/// Pure formatting plus transport send; no local state is mutated
/// here.
pub struct CommandEmitter {
    channel: Arc<dyn SignalChannel>,
    connectivity: Arc<dyn Connectivity>,
}

impl CommandEmitter {
    pub fn new(channel: Arc<dyn SignalChannel>, connectivity: Arc<dyn Connectivity>) -> Self {
        Self {
            channel,
            connectivity,
        }
    }

    /// Report the login state, then the credentials, as two commands.
    pub fn send_login_status(&self, user: Option<&User>, oauth_token: Option<&str>) {
        let logged_in = user.is_some();
        tracing::debug!(logged_in, "sending login status");
        self.channel
            .send(signals::client::USER_LOGIN_STATUS, vec![json!(logged_in)]);

        let user_value = user
            .map(|u| serde_json::to_value(u).unwrap_or(Value::Null))
            .unwrap_or(Value::Null);
        let token_value = oauth_token.map(|t| json!(t)).unwrap_or(Value::Null);
        self.channel
            .send(signals::client::USER_AUTH, vec![user_value, token_value]);
    }

    /// Push the unseen-notification badge count. Silent no-op while
    /// offline; that is rate-limiting policy, not an error.
    pub fn send_unseen_count(&self, count: i64) {
        if !self.connectivity.is_online() {
            tracing::debug!(count, "offline, suppressing unseen count push");
            return;
        }
        tracing::debug!(count, "sending unseen count");
        self.channel
            .send(signals::client::UNREAD_NOTICES_COUNT, vec![json!(count)]);
    }

    /// Hand a rendered document to the host's printer facility.
    pub fn send_print_job(&self, title: &str, html: &str) {
        self.channel
            .send(signals::client::PRINT, vec![json!(title), json!(html)]);
    }

    /// Tell the host the embedded editor cannot be used for a site.
    pub fn send_editor_unavailable(&self, details: &EditorUnavailable) {
        let payload = serde_json::to_value(details).unwrap_or(Value::Null);
        self.channel
            .send(signals::client::CANNOT_USE_EDITOR, vec![payload]);
    }

    /// Forward a "View Post" click so the host can open the URL.
    pub fn send_view_post_clicked(&self, url: &str) {
        self.channel
            .send(signals::client::VIEW_POST_CLICKED, vec![json!(url)]);
    }

    /// Announce that the embedded editor finished loading.
    pub fn send_editor_loaded(&self) {
        self.channel.send(signals::client::EDITOR_LOADED, vec![]);
    }

    /// Answer a `request-site` exchange.
    pub fn send_request_site_response(&self, response: &OperationResponse) {
        self.send_response(signals::host::REQUEST_SITE, response);
    }

    /// Answer an `enable-site-option` exchange.
    pub fn send_module_activation_response(&self, response: &OperationResponse) {
        self.send_response(signals::host::ENABLE_SITE_OPTION, response);
    }

    /// Answer a correlated exchange under `<request>-response`.
    pub fn send_response(&self, request_signal: &str, response: &OperationResponse) {
        let name = format!("{request_signal}{}", signals::RESPONSE_SUFFIX);
        let payload = serde_json::to_value(response).unwrap_or(Value::Null);
        self.channel.send(&name, vec![payload]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::hub::SignalHub;
    use crate::store::SiteId;
    use std::sync::Mutex;

    struct Offline;
    impl Connectivity for Offline {
        fn is_online(&self) -> bool {
            false
        }
    }

    fn recorded(hub: &SignalHub, name: &str) -> Arc<Mutex<Vec<Vec<Value>>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_handler = Arc::clone(&seen);
        hub.subscribe(
            name,
            Arc::new(move |args| {
                seen_in_handler.lock().unwrap().push(args.to_vec());
            }),
        );
        seen
    }

    fn emitter_over(hub: &SignalHub, connectivity: Arc<dyn Connectivity>) -> CommandEmitter {
        CommandEmitter::new(Arc::new(hub.clone()), connectivity)
    }

    #[test]
    fn offline_suppresses_unseen_count() {
        let hub = SignalHub::new();
        let sent = recorded(&hub, signals::client::UNREAD_NOTICES_COUNT);
        let emitter = emitter_over(&hub, Arc::new(Offline));

        emitter.send_unseen_count(5);
        assert!(sent.lock().unwrap().is_empty());
    }

    #[test]
    fn online_sends_unseen_count_once() {
        let hub = SignalHub::new();
        let sent = recorded(&hub, signals::client::UNREAD_NOTICES_COUNT);
        let emitter = emitter_over(&hub, Arc::new(AlwaysOnline));

        emitter.send_unseen_count(5);
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], vec![json!(5)]);
    }

    #[test]
    fn login_status_sends_status_then_auth() {
        let hub = SignalHub::new();
        let status = recorded(&hub, signals::client::USER_LOGIN_STATUS);
        let auth = recorded(&hub, signals::client::USER_AUTH);
        let emitter = emitter_over(&hub, Arc::new(AlwaysOnline));

        let user = User {
            id: 1,
            username: "pat".to_string(),
            display_name: None,
        };
        emitter.send_login_status(Some(&user), Some("token-abc"));

        assert_eq!(status.lock().unwrap()[0], vec![json!(true)]);
        let auth = auth.lock().unwrap();
        assert_eq!(auth[0][0]["username"], "pat");
        assert_eq!(auth[0][1], json!("token-abc"));
    }

    #[test]
    fn logged_out_status_sends_false_with_null_credentials() {
        let hub = SignalHub::new();
        let status = recorded(&hub, signals::client::USER_LOGIN_STATUS);
        let auth = recorded(&hub, signals::client::USER_AUTH);
        let emitter = emitter_over(&hub, Arc::new(AlwaysOnline));

        emitter.send_login_status(None, None);

        assert_eq!(status.lock().unwrap()[0], vec![json!(false)]);
        assert_eq!(auth.lock().unwrap()[0], vec![Value::Null, Value::Null]);
    }

    #[test]
    fn print_job_carries_title_and_html() {
        let hub = SignalHub::new();
        let sent = recorded(&hub, signals::client::PRINT);
        let emitter = emitter_over(&hub, Arc::new(AlwaysOnline));

        emitter.send_print_job("Invoice", "<p>total</p>");
        assert_eq!(
            sent.lock().unwrap()[0],
            vec![json!("Invoice"), json!("<p>total</p>")]
        );
    }

    #[test]
    fn responses_use_request_specific_signal_names() {
        let hub = SignalHub::new();
        let site = recorded(&hub, "request-site-response");
        let module = recorded(&hub, "enable-site-option-response");
        let emitter = emitter_over(&hub, Arc::new(AlwaysOnline));

        emitter.send_request_site_response(&OperationResponse::ok(SiteId(7), "success"));
        emitter.send_module_activation_response(&OperationResponse::err(
            SiteId(8),
            "error",
            "activation failed",
        ));

        assert_eq!(site.lock().unwrap()[0][0]["siteId"], 7);
        let module = module.lock().unwrap();
        assert_eq!(module[0][0]["siteId"], 8);
        assert_eq!(module[0][0]["error"], "activation failed");
    }

    #[test]
    fn view_post_clicked_forwards_url() {
        let hub = SignalHub::new();
        let sent = recorded(&hub, signals::client::VIEW_POST_CLICKED);
        let emitter = emitter_over(&hub, Arc::new(AlwaysOnline));

        emitter.send_view_post_clicked("https://example.com/post/1");
        assert_eq!(
            sent.lock().unwrap()[0],
            vec![json!("https://example.com/post/1")]
        );
    }
}
