//! Transports
//!
//! Each transport turns client connections into `SessionChannel`s served by
//! `run_session`. Exactly one runs per process.

pub mod sse;
pub mod stdio;

use std::sync::Arc;

use agent_core::Agent;

use crate::config::TransportConfig;

/// Serve the agent over the configured transport until it shuts down
pub async fn serve(config: TransportConfig, agent: Arc<Agent>) -> anyhow::Result<()> {
    match config {
        TransportConfig::Stream => stdio::serve(agent).await,
        TransportConfig::Networked { addr } => sse::serve(addr, agent).await,
    }
}
