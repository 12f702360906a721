//! Session Management
//!
//! A session is one client's conversation with the agent. Sessions live
//! only as long as the connection that created them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::message::{Conversation, Message};
use crate::reasoning::Agent;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A complete agent session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    /// Conversation history
    conversation: Conversation,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    /// Create with specific ID
    pub fn with_id(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            conversation: Conversation::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Run one turn: append the user input and let the agent answer
    pub async fn turn(&mut self, agent: &Agent, input: impl Into<String>) -> Result<Message> {
        self.conversation.push(Message::user(input));
        self.touch();
        let reply = agent.respond(&mut self.conversation).await;
        self.touch();
        reply
    }

    /// Read-only view of the history
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Message count
    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }

    /// Duration since creation
    pub fn duration(&self) -> chrono::Duration {
        self.updated_at - self.created_at
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::message::Role;
    use crate::provider::Completion;
    use crate::provider::mock::ScriptedProvider;
    use std::sync::Arc;

    fn agent(script: Vec<crate::Result<Completion>>) -> Agent {
        Agent::builder()
            .provider(Arc::new(ScriptedProvider::new(script)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_session_creation() {
        let session = Session::new();
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.id.as_str().len(), 32);
    }

    #[tokio::test]
    async fn test_turn_appends_user_and_reply() {
        let agent = agent(vec![Ok(Completion::text("Clam Chowder"))]);
        let mut session = Session::new();

        let reply = session.turn(&agent, "What's the soup?").await.unwrap();
        assert_eq!(reply.content, "Clam Chowder");

        let roles: Vec<Role> = session.conversation().messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_user_message() {
        let agent = agent(vec![Err(AgentError::Upstream("timeout".into()))]);
        let mut session = Session::new();

        assert!(session.turn(&agent, "hello").await.is_err());
        assert_eq!(session.message_count(), 1);
        assert!(session.duration() >= chrono::Duration::zero());
    }
}
