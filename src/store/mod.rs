pub mod http;

use async_trait::async_trait;
use log::warn;
use thiserror::Error;

use crate::web::models::Message;

/// Whether a relay round trip is currently outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Busy,
}

/// Relay failure classes the store renders differently.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The relay never delivered a usable response.
    #[error("connection to the chat server failed")]
    Connection(#[source] anyhow::Error),
    /// The relay answered and reported a failure of its own.
    #[error("{0}")]
    Relay(String),
}

/// Payload for one outbound relay call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub message: String,
    /// The full sequence as it stood before the new user turn was appended.
    pub history: Vec<Message>,
}

#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn send(&self, message: &str, history: &[Message]) -> Result<String, RelayError>;
}

const CONNECTION_FAILED: &str = "Could not reach the chat server. Please try again.";

/// Ordered conversation plus the single-flight latch.
///
/// `begin` and `finish` are the only state transitions; `submit` composes
/// them around one relay call. At most one call is outstanding at a time;
/// input arriving while busy is dropped, not queued.
pub struct ConversationStore {
    messages: Vec<Message>,
    status: Status,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            status: Status::Idle,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_busy(&self) -> bool {
        self.status == Status::Busy
    }

    /// Starts a turn: appends the user message and latches the store.
    ///
    /// Returns `None` without touching state when the trimmed text is empty
    /// or a call is already outstanding.
    pub fn begin(&mut self, text: &str) -> Option<Outbound> {
        let text = text.trim();
        if text.is_empty() || self.status == Status::Busy {
            return None;
        }

        let outbound = Outbound {
            message: text.to_string(),
            history: self.messages.clone(),
        };
        self.messages.push(Message::user(text));
        self.status = Status::Busy;
        Some(outbound)
    }

    /// Settles the in-flight turn: appends the assistant reply (or its error
    /// rendering) and releases the latch. Failures become ordinary
    /// conversation turns, indistinguishable from real replies.
    pub fn finish(&mut self, result: Result<String, RelayError>) {
        let content = match result {
            Ok(text) => text,
            Err(RelayError::Relay(message)) => format!("Error: {}", message),
            Err(RelayError::Connection(e)) => {
                warn!("Relay unreachable: {:#}", e);
                CONNECTION_FAILED.to_string()
            }
        };
        self.messages.push(Message::assistant(content));
        self.status = Status::Idle;
    }

    /// Submits one user turn over the given relay.
    ///
    /// Returns `false` when the input was dropped: empty after trimming, or
    /// another call is still in flight.
    pub async fn submit(&mut self, text: &str, relay: &dyn RelayClient) -> bool {
        let Some(outbound) = self.begin(text) else {
            return false;
        };
        let result = relay.send(&outbound.message, &outbound.history).await;
        self.finish(result);
        true
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
