use std::io;
use std::path::Path;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::mpsc;

use serde_json::Value;

use super::hub::{Handler, SignalChannel, SignalHub, Subscription};
use super::message::Message;

/// Channel to the host process over a Unix socket.
///
/// Wire format is one JSON-encoded [`Message`] per line. Outbound sends
/// are queued and drained by a writer task; once the host side is gone
/// they are dropped silently, matching the no-delivery-guarantee
/// contract. Inbound lines are pumped by a reader task into an
/// internal hub that fans out to subscribers; malformed lines are
/// logged and skipped.
pub struct SocketTransport {
    outbound: mpsc::UnboundedSender<Message>,
    inbound: SignalHub,
}

impl SocketTransport {
    /// Connect to the host's socket.
    pub async fn connect(socket_path: impl AsRef<Path>) -> io::Result<Self> {
        let stream = UnixStream::connect(socket_path).await?;
        Ok(Self::from_stream(stream))
    }

    /// Wrap an already-established stream, spawning the pump tasks.
    pub fn from_stream(stream: UnixStream) -> Self {
        let (read_half, mut write_half) = stream.into_split();
        let (outbound, mut queue) = mpsc::unbounded_channel::<Message>();
        let inbound = SignalHub::new();

        tokio::spawn(async move {
            while let Some(message) = queue.recv().await {
                let mut json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(err) => {
                        tracing::warn!(%err, name = %message.name, "unserializable message");
                        continue;
                    }
                };
                json.push('\n');
                if write_half.write_all(json.as_bytes()).await.is_err() {
                    // Host side is gone; stop draining. Senders keep
                    // succeeding and their messages are dropped.
                    break;
                }
                let _ = write_half.flush().await;
            }
        });

        let hub = inbound.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(read_half);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<Message>(trimmed) {
                            Ok(message) => {
                                tracing::debug!(name = %message.name, "inbound host message");
                                hub.emit(&message.name, &message.args);
                            }
                            Err(err) => {
                                tracing::warn!(%err, "skipping malformed message line");
                            }
                        }
                    }
                    Err(_) => break,
                }
            }
            tracing::debug!("host channel closed");
        });

        Self { outbound, inbound }
    }
}

impl SignalChannel for SocketTransport {
    fn send(&self, name: &str, args: Vec<Value>) {
        if self.outbound.send(Message::with_args(name, args)).is_err() {
            tracing::debug!(%name, "host side gone, dropping message");
        }
    }

    fn subscribe(&self, name: &str, handler: Handler) -> Subscription {
        self.inbound.subscribe(name, handler)
    }

    fn subscribe_once(&self, name: &str, handler: Handler) -> Subscription {
        self.inbound.subscribe_once(name, handler)
    }
}
