//! Client Handles
//!
//! A room's view of a connected human: identity plus a bounded outbound
//! queue drained by the connection's writer task.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use super::protocol::{ClientId, ServerMessage};

/// Generate a fresh client id.
pub fn new_client_id() -> ClientId {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Sending side of one client's outbound queue.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    /// Client identifier
    pub id: ClientId,
    /// Display name
    pub name: String,
    outbox: mpsc::Sender<ServerMessage>,
}

impl ClientHandle {
    /// Create a handle.
    pub fn new(id: ClientId, name: impl Into<String>, outbox: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id,
            name: name.into(),
            outbox,
        }
    }

    /// Queue a message without waiting. A full queue drops the message.
    ///
    /// Returns whether the message was queued.
    pub fn send(&self, message: ServerMessage) -> bool {
        match self.outbox.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(client = %self.id, "Outbound queue full, dropping message");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(client = %self.id, "Outbound queue closed");
                false
            }
        }
    }

    /// Is the connection's writer still listening?
    pub fn is_connected(&self) -> bool {
        !self.outbox.is_closed()
    }
}
