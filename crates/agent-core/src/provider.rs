//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for model-invocation clients so the agent
//! loop never depends on a particular hosted model API.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{GenerationOptions, LlmProvider};
//!
//! let provider = AzureOpenAiProvider::new(config)?;
//! let completion = provider.complete(&messages, &tools, &options).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::tool::{ToolCall, ToolSchema};

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature; `None` leaves the deployment default
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate; `None` leaves the deployment default
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: None,
            max_tokens: Some(default_max_tokens()),
        }
    }
}

const fn default_max_tokens() -> u32 {
    1024
}

/// Response from an LLM completion
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text (may be empty when only tools are requested)
    pub content: String,

    /// Tool calls requested by the model
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    /// A plain text answer
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        }
    }

    /// A response asking for tool calls
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            finish_reason: Some(FinishReason::ToolUse),
            ..Default::default()
        }
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolUse,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    /// Map an OpenAI-style finish reason string
    pub fn parse(reason: &str) -> Self {
        match reason {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "tool_calls" | "function_call" => Self::ToolUse,
            "content_filter" => Self::ContentFilter,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Provider metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "Azure OpenAI")
    pub name: String,

    /// Model or deployment the provider talks to
    pub model: String,

    /// Whether tool/function calling is supported
    pub supports_tools: bool,
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
/// The agent works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get provider information and capabilities
    fn info(&self) -> ProviderInfo;

    /// Check if the provider is reachable and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Generate a completion from messages, offering the given tools
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion>;
}

#[cfg(any(test, feature = "testing"))]
pub mod mock {
    //! Provider that replays queued completions.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{Completion, GenerationOptions, LlmProvider, ProviderInfo};
    use crate::error::{AgentError, Result};
    use crate::message::Message;
    use crate::tool::ToolSchema;

    type Fallback = Box<dyn Fn(&[Message]) -> Result<Completion> + Send + Sync>;

    /// Replays scripted completions in order, then falls back to a closure.
    pub struct ScriptedProvider {
        script: Mutex<VecDeque<Result<Completion>>>,
        fallback: Option<Fallback>,
        requests: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedProvider {
        pub fn new(script: impl IntoIterator<Item = Result<Completion>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                fallback: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Answer every request with the closure
        pub fn always(
            f: impl Fn(&[Message]) -> Result<Completion> + Send + Sync + 'static,
        ) -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                fallback: Some(Box::new(f)),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Message lists seen so far, one entry per `complete` call
        pub fn requests(&self) -> Vec<Vec<Message>> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                name: "Scripted".into(),
                model: "scripted".into(),
                supports_tools: true,
            }
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            messages: &[Message],
            _tools: &[ToolSchema],
            _options: &GenerationOptions,
        ) -> Result<Completion> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(messages.to_vec());
            }
            let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
            match (next, &self.fallback) {
                (Some(completion), _) => completion,
                (None, Some(fallback)) => fallback(messages),
                (None, None) => Err(AgentError::Upstream("script exhausted".into())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert_eq!(opts.temperature, None);
        assert_eq!(opts.max_tokens, Some(1024));
    }

    #[test]
    fn test_finish_reason_parse() {
        assert_eq!(FinishReason::parse("tool_calls"), FinishReason::ToolUse);
        assert_eq!(FinishReason::parse("stop"), FinishReason::Stop);
        assert_eq!(
            FinishReason::parse("weird"),
            FinishReason::Other("weird".into())
        );
    }
}
