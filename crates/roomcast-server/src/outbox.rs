use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use roomcast_core::net::messages::{JoinNotice, ServerEvent};

/// Why a notice could not be handed to a recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The recipient's writer is gone.
    Closed,
    /// The recipient is not draining its queue.
    Full,
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "outbox closed"),
            Self::Full => write!(f, "outbox full"),
        }
    }
}

impl std::error::Error for DeliveryError {}

/// Outbound capability of one connection. Implementations must not block:
/// the broadcaster calls `send` while holding the presence lock.
pub trait Outbox: Send + Sync {
    fn send(&self, notice: &JoinNotice) -> Result<(), DeliveryError>;
}

/// Outbox backed by a bounded channel drained by the socket writer task.
#[derive(Clone)]
pub struct ChannelOutbox {
    tx: mpsc::Sender<ServerEvent>,
}

impl ChannelOutbox {
    pub fn new(tx: mpsc::Sender<ServerEvent>) -> Self {
        Self { tx }
    }

    /// Create an outbox together with the receiving end for the writer task.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl Outbox for ChannelOutbox {
    fn send(&self, notice: &JoinNotice) -> Result<(), DeliveryError> {
        self.tx
            .try_send(ServerEvent::from(notice))
            .map_err(|e| match e {
                TrySendError::Full(_) => DeliveryError::Full,
                TrySendError::Closed(_) => DeliveryError::Closed,
            })
    }
}
