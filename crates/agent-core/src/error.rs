//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Model-invocation client failed (network, bad status, bad payload)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Model endpoint rejected the credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Model endpoint throttled the request
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Tool not found in registry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments do not satisfy the tool's declared parameters
    #[error("Invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// A tool with this name is already registered
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    /// Maximum iterations reached in reasoning loop
    #[error("Maximum iterations ({0}) reached")]
    MaxIterations(usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if error is retryable.
    ///
    /// Nothing in the agent retries on its own; callers may use this to decide.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::RateLimited(_))
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Upstream(msg) => format!("The AI service encountered an error: {msg}"),
            Self::Auth(_) => {
                "Authentication with the AI service failed. Please check the subscription key."
                    .into()
            }
            Self::RateLimited(_) => {
                "The AI service is rate limiting requests. Please wait a moment.".into()
            }
            Self::UnknownTool(name) => format!("The tool '{name}' is not available."),
            Self::InvalidArguments { tool, reason } => {
                format!("Invalid input for '{tool}': {reason}")
            }
            Self::MaxIterations(_) => {
                "The request took too many steps to answer. Please try a simpler question.".into()
            }
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
