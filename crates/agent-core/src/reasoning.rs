//! Reasoning Loop
//!
//! The agent sends the conversation to the model, runs any tools it asks
//! for, feeds the results back and repeats until the model answers in text.

use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::tool::{Tool, ToolRegistry};

/// Default cap on model calls per turn
pub const DEFAULT_MAX_ITERATIONS: usize = 8;

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Agent name, also the name it is published under
    pub name: String,

    /// One-line description for clients listing the agent
    pub description: String,

    /// Instructions sent as the system prompt
    pub instructions: String,

    /// Maximum model calls per turn before giving up
    pub max_iterations: usize,

    /// Generation options
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "Agent".into(),
            description: "A helpful assistant.".into(),
            instructions: DEFAULT_INSTRUCTIONS.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            generation: GenerationOptions::default(),
        }
    }
}

const DEFAULT_INSTRUCTIONS: &str = "You are a helpful AI assistant. Be concise and accurate.";

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Start building an agent
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Produce the assistant's reply to the conversation.
    ///
    /// Every model reply and tool result is appended to `conversation`;
    /// the returned message is the final assistant answer, also appended.
    pub async fn respond(&self, conversation: &mut Conversation) -> Result<Message> {
        let system = Message::system(&self.config.instructions);
        let schemas = self.tools.schemas();

        for iteration in 1..=self.config.max_iterations {
            let request: Vec<Message> = std::iter::once(system.clone())
                .chain(conversation.messages().iter().cloned())
                .collect();

            let completion = self
                .provider
                .complete(&request, &schemas, &self.config.generation)
                .await?;

            if completion.tool_calls.is_empty() {
                let answer = Message::assistant(completion.content);
                conversation.push(answer.clone());
                return Ok(answer);
            }

            tracing::debug!(
                agent = %self.config.name,
                iteration,
                calls = completion.tool_calls.len(),
                "Model requested tools"
            );

            let calls = completion.tool_calls;
            conversation.push(Message::assistant_with_calls(
                completion.content,
                calls.clone(),
            ));

            for call in &calls {
                tracing::debug!(tool = %call.name, id = %call.id, "Executing tool");
                let result = self.tools.execute(call).await;
                conversation.push(Message::tool(result.content(), result.id));
            }
        }

        tracing::warn!(
            agent = %self.config.name,
            max = self.config.max_iterations,
            "Tool-call loop hit the iteration cap"
        );
        Err(AgentError::MaxIterations(self.config.max_iterations))
    }

    /// Answer a single question in a fresh conversation
    pub async fn ask(&self, question: &str) -> Result<String> {
        let mut conversation = Conversation::new();
        conversation.push(Message::user(question));
        self.respond(&mut conversation).await.map(|m| m.content)
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get the provider
    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Agent name
    pub fn name(&self) -> &str {
        &self.config.name
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    pending_error: Option<AgentError>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            pending_error: None,
            config: AgentConfig::default(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Register one tool; a duplicate name fails at `build`
    #[must_use]
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        if let Err(e) = self.tools.register(tool) {
            self.pending_error.get_or_insert(e);
        }
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.config.description = description.into();
        self
    }

    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.config.instructions = instructions.into();
        self
    }

    #[must_use]
    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        if let Some(e) = self.pending_error {
            return Err(e);
        }

        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        if self.config.max_iterations == 0 {
            return Err(AgentError::Config("max_iterations must be at least 1".into()));
        }

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}
