//! Application State

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tokio::sync::mpsc;

use agent_core::{Agent, SessionId};

use crate::session::{SessionChannel, run_session};

/// Why a posted message could not be handed to its session
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("unknown session")]
    UnknownSession,
}

/// Shared application state for the networked transport
#[derive(Clone)]
pub struct AppState {
    /// The agent every session talks to
    pub agent: Arc<Agent>,

    /// Inbound sender of each live SSE session
    sessions: Arc<RwLock<HashMap<SessionId, mpsc::Sender<Value>>>>,
}

impl AppState {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self {
            agent,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a session, spawn its task and return the outbound side
    pub fn open_session(&self) -> (SessionId, mpsc::Receiver<Value>) {
        let id = SessionId::new();
        let (channel, inbound, outbound) = SessionChannel::pair();

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), inbound);
        tokio::spawn(run_session(Arc::clone(&self.agent), id.clone(), channel));

        (id, outbound)
    }

    /// Hand one client message to its session
    pub async fn deliver(&self, id: &SessionId, message: Value) -> Result<(), DeliveryError> {
        let sender = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or(DeliveryError::UnknownSession)?;

        if sender.send(message).await.is_err() {
            // session task already finished
            self.close_session(id);
            return Err(DeliveryError::UnknownSession);
        }
        Ok(())
    }

    /// Forget a session; its task ends once the inbound side is dropped
    pub fn close_session(&self, id: &SessionId) {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if removed.is_some() {
            tracing::info!(session = %id, "Client disconnected");
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
