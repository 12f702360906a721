//! # agent-runtime
//!
//! Runtime providers for the menu agent.
//!
//! ## Providers
//!
//! - **Azure OpenAI** (default): chat completions with native tool calling,
//!   reached directly or through an API-management gateway
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::azure::{AzureOpenAiConfig, AzureOpenAiProvider};
//!
//! let config = AzureOpenAiConfig::new(gateway_url, subscription_key, "2024-10-21", "gpt-4o");
//! let provider = AzureOpenAiProvider::new(config)?;
//! let agent = Agent::builder()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

#[cfg(feature = "azure")]
pub mod azure;

#[cfg(feature = "azure")]
pub use azure::{AzureOpenAiConfig, AzureOpenAiProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, LlmProvider, Message, Result, Role, Session, Tool, ToolRegistry,
};
