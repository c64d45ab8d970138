use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

use deskbridge::bridge::signals::{host, notify};
use deskbridge::bridge::{AlwaysOnline, DesktopBridge, Message, SignalHub, SocketTransport};
use deskbridge::config::BridgeConfig;
use deskbridge::session::{StaticSession, User};
use deskbridge::store::{Action, AppState, MemoryStore, SiteId, StateStore};

fn temp_socket_path() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("host.sock");
    (dir, path)
}

struct Host {
    reader: BufReader<UnixStream>,
}

impl Host {
    /// Send a host command to the client as one JSON line.
    async fn send(&mut self, name: &str, args: Vec<Value>) {
        let mut json = serde_json::to_string(&Message::with_args(name, args)).unwrap();
        json.push('\n');
        let stream = self.reader.get_mut();
        stream.write_all(json.as_bytes()).await.unwrap();
        stream.flush().await.unwrap();
    }

    /// Read the next client message.
    async fn recv(&mut self) -> Message {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await.unwrap();
        assert!(n > 0, "client closed the channel");
        serde_json::from_str(&line).unwrap()
    }

    /// Consume the startup handshake (`user-login-status`, `user-auth`)
    /// sent by `init`.
    async fn drain_handshake(&mut self) {
        let status = self.recv().await;
        assert_eq!(status.name, "user-login-status");
        let auth = self.recv().await;
        assert_eq!(auth.name, "user-auth");
    }
}

struct Fixture {
    _dir: TempDir,
    host: Host,
    signals: SignalHub,
    store: Arc<MemoryStore>,
    bridge: DesktopBridge,
}

async fn fixture_with(state: AppState, session: StaticSession) -> Fixture {
    let (dir, path) = temp_socket_path();
    let listener = UnixListener::bind(&path).unwrap();
    let transport = SocketTransport::connect(&path).await.unwrap();
    let (host_stream, _addr) = listener.accept().await.unwrap();

    let signals = SignalHub::new();
    let store = Arc::new(MemoryStore::with_state(state));
    let bridge = DesktopBridge::new(
        Arc::new(transport),
        Arc::new(signals.clone()),
        store.clone() as Arc<dyn StateStore>,
        Arc::new(session),
        Arc::new(AlwaysOnline),
        BridgeConfig {
            response_timeout_secs: 0,
            ..Default::default()
        },
    );

    Fixture {
        _dir: dir,
        host: Host {
            reader: BufReader::new(host_stream),
        },
        signals,
        store,
        bridge,
    }
}

async fn fixture() -> Fixture {
    fixture_with(AppState::default(), StaticSession::anonymous()).await
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

/// Startup handshake: login status and credentials arrive as the first
/// client messages.
#[tokio::test]
async fn init_pushes_login_status_to_host() {
    let session = StaticSession::logged_in(
        User {
            id: 1,
            username: "pat".to_string(),
            display_name: Some("Pat".to_string()),
        },
        "token-abc",
    );
    let mut f = fixture_with(AppState::default(), session).await;
    f.bridge.init().unwrap();

    let status = f.host.recv().await;
    assert_eq!(status.name, "user-login-status");
    assert_eq!(status.args, vec![json!(true)]);

    let auth = f.host.recv().await;
    assert_eq!(auth.name, "user-auth");
    assert_eq!(auth.args[0]["username"], "pat");
    assert_eq!(auth.args[1], json!("token-abc"));
}

/// A cached badge count is pushed before the login status.
#[tokio::test]
async fn init_pushes_cached_unseen_count_first() {
    let state = AppState {
        unseen_count: Some(5),
        ..Default::default()
    };
    let mut f = fixture_with(state, StaticSession::anonymous()).await;
    f.bridge.init().unwrap();

    let first = f.host.recv().await;
    assert_eq!(first.name, "unread-notices-count");
    assert_eq!(first.args, vec![json!(5)]);
}

/// Host navigation commands route into the store.
#[tokio::test]
async fn host_page_commands_navigate_the_client() {
    let f = fixture().await;
    let mut host_side = f.host;
    f.bridge.init().unwrap();

    host_side.send(host::PAGE_READER, vec![]).await;
    settle().await;
    assert_eq!(f.store.state().current_route.as_deref(), Some("/read"));

    host_side.send(host::PAGE_HELP, vec![]).await;
    settle().await;
    assert_eq!(f.store.state().current_route.as_deref(), Some("/help"));
}

/// Empty navigate is a no-op even across the real socket.
#[tokio::test]
async fn empty_navigate_leaves_client_untouched() {
    let f = fixture().await;
    let mut host_side = f.host;
    f.bridge.init().unwrap();
    f.store.dispatch(Action::ToggleNotificationsPanel);

    host_side.send(host::NAVIGATE, vec![json!("")]).await;
    settle().await;

    let state = f.store.state();
    assert_eq!(state.current_route, None);
    assert!(state.notifications_open);
}

/// Full correlated exchange: request-site in, store dispatch, internal
/// completion signal, response line out.
#[tokio::test]
async fn request_site_round_trip() {
    let session = StaticSession::anonymous();
    let mut f = fixture_with(AppState::default(), session).await;
    f.bridge.init().unwrap();
    f.host.drain_handshake().await;

    f.host.send(host::REQUEST_SITE, vec![json!(42)]).await;
    settle().await;
    assert_eq!(f.store.state().pending_site_requests, vec![SiteId(42)]);
    assert_eq!(f.bridge.outstanding_exchanges(), 1);

    // Another subsystem reports the refresh complete.
    f.signals.emit(
        notify::DID_REQUEST_SITE,
        &[json!({"siteId": 42, "status": "success"})],
    );

    let response = f.host.recv().await;
    assert_eq!(response.name, "request-site-response");
    assert_eq!(response.args[0]["siteId"], 42);
    assert_eq!(response.args[0]["status"], "success");
    assert_eq!(response.args[0].get("error"), None);
    assert_eq!(f.bridge.outstanding_exchanges(), 0);
}

/// A completion for the wrong site is forwarded with an error naming
/// both keys.
#[tokio::test]
async fn mismatched_completion_reports_both_keys() {
    let mut f = fixture().await;
    f.bridge.init().unwrap();
    f.host.drain_handshake().await;

    f.host
        .send(host::ENABLE_SITE_OPTION, vec![json!(1), json!({"option": "stats"})])
        .await;
    settle().await;

    f.signals.emit(
        notify::DID_ACTIVATE_SITE_MODULE,
        &[json!({"siteId": 2, "status": "success"})],
    );

    let response = f.host.recv().await;
    assert_eq!(response.name, "enable-site-option-response");
    assert_eq!(response.args[0]["siteId"], 1);
    let error = response.args[0]["error"].as_str().unwrap();
    assert!(error.contains('1') && error.contains('2'), "error was: {error}");
}

/// Internal print signal becomes a host print command.
#[tokio::test]
async fn print_flows_from_internal_signal_to_host() {
    let mut f = fixture().await;
    f.bridge.init().unwrap();
    f.host.drain_handshake().await;

    f.signals.emit(
        notify::SEND_TO_PRINTER,
        &[json!({"title": "Invoice", "contents": "<p>total</p>"})],
    );

    let print = f.host.recv().await;
    assert_eq!(print.name, "print");
    assert_eq!(print.args, vec![json!("Invoice"), json!("<p>total</p>")]);
}

/// Edge-triggered unseen count: identical repeats collapse, changes go
/// out.
#[tokio::test]
async fn unseen_count_changes_reach_host_once_per_value() {
    let mut f = fixture().await;
    f.bridge.init().unwrap();
    f.host.drain_handshake().await;

    f.signals.emit(notify::UNSEEN_COUNT, &[json!(3)]);
    f.signals.emit(notify::UNSEEN_COUNT, &[json!(3)]);
    f.signals.emit(notify::UNSEEN_COUNT, &[json!(4)]);

    let first = f.host.recv().await;
    assert_eq!(first.name, "unread-notices-count");
    assert_eq!(first.args, vec![json!(3)]);

    let second = f.host.recv().await;
    assert_eq!(second.name, "unread-notices-count");
    assert_eq!(second.args, vec![json!(4)]);
}

/// The bridge keeps working after the host drops: sends become
/// silent no-ops rather than faults.
#[tokio::test]
async fn host_disconnect_does_not_fault_the_client() {
    let f = fixture().await;
    f.bridge.init().unwrap();
    drop(f.host);
    settle().await;

    // Store-driven work continues without the host.
    f.signals.emit(notify::UNSEEN_COUNT, &[json!(9)]);
    f.store.dispatch(Action::SetEditorLoaded { loaded: true });
    assert_eq!(f.store.state().unseen_count, Some(9));
}
