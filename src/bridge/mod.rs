// Host/client bridge core
// Duplex command channel, correlated request/response exchanges, and
// edge-triggered state notifications

pub mod correlator;
pub mod desktop;
pub mod dispatcher;
pub mod emitter;
pub mod hub;
pub mod message;
pub mod notifier;
pub mod signals;
pub mod transport;

pub use correlator::{CorrelatedRequest, Correlator};
pub use desktop::DesktopBridge;
pub use dispatcher::Dispatcher;
pub use emitter::{AlwaysOnline, CommandEmitter, Connectivity};
pub use hub::{Handler, SignalChannel, SignalHub, Subscription};
pub use message::{EditorFault, EditorUnavailable, Message, OperationOutcome, OperationResponse, PrintJob};
pub use notifier::{StateNotifier, Tracker};
pub use transport::SocketTransport;
