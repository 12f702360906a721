//! Session channel and task
//!
//! Each transport hands the session task a `SessionChannel`: inbound client
//! messages on one side, outbound server messages on the other.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use agent_core::{Agent, SessionId};

use crate::handlers::McpHandler;

/// Messages buffered per direction
pub const CHANNEL_CAPACITY: usize = 32;

pub struct SessionChannel {
    inbound: mpsc::Receiver<Value>,
    outbound: mpsc::Sender<Value>,
}

impl SessionChannel {
    pub const fn new(inbound: mpsc::Receiver<Value>, outbound: mpsc::Sender<Value>) -> Self {
        Self { inbound, outbound }
    }

    /// Channel plus the transport's ends: inbound sender, outbound receiver
    pub fn pair() -> (Self, mpsc::Sender<Value>, mpsc::Receiver<Value>) {
        let (inbound_tx, inbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
        (Self::new(inbound_rx, outbound_tx), inbound_tx, outbound_rx)
    }

    /// Next client message; `None` once the transport hung up
    pub async fn receive(&mut self) -> Option<Value> {
        self.inbound.recv().await
    }

    /// Returns false if the client is gone
    pub async fn send(&self, message: Value) -> bool {
        self.outbound.send(message).await.is_ok()
    }

    /// Resolves when the transport stops reading replies
    pub async fn closed(&self) {
        self.outbound.closed().await;
    }
}

/// Serve one session until either side hangs up.
///
/// Messages are handled one at a time, so a turn finishes before the next
/// message of the same session is looked at. If the client disconnects
/// mid-turn the turn is dropped.
pub async fn run_session(agent: Arc<Agent>, id: SessionId, mut channel: SessionChannel) {
    let mut handler = McpHandler::new(agent, id.clone());
    tracing::info!(session = %id, "Session opened");

    while let Some(message) = channel.receive().await {
        let reply = tokio::select! {
            reply = handler.handle(message) => reply,
            () = channel.closed() => {
                tracing::warn!(session = %id, "Client disconnected mid-turn; abandoning it");
                break;
            }
        };

        if let Some(reply) = reply {
            if !channel.send(reply).await {
                break;
            }
        }
    }

    tracing::info!(
        session = %id,
        messages = handler.session().message_count(),
        "Session closed"
    );
}
