//! Azure OpenAI Provider
//!
//! Implementation of `LlmProvider` for an Azure OpenAI chat-completions
//! deployment, optionally behind an API-management gateway that accepts the
//! subscription key in the `api-key` header.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{
        Completion, FinishReason, GenerationOptions, LlmProvider, ProviderInfo, TokenUsage,
    },
    tool::{ToolArguments, ToolCall, ToolSchema},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Azure OpenAI connection settings
#[derive(Clone)]
pub struct AzureOpenAiConfig {
    /// Resource or gateway base URL
    pub endpoint: String,

    /// Subscription / API key
    pub api_key: String,

    /// REST API version (e.g. "2024-10-21")
    pub api_version: String,

    /// Deployment name of the chat model
    pub deployment: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl AzureOpenAiConfig {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            api_version: api_version.into(),
            deployment: deployment.into(),
            timeout_secs: 120,
        }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }

    /// Model listing; answering it costs no tokens
    fn models_url(&self) -> String {
        format!(
            "{}/openai/models?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.api_version
        )
    }
}

impl std::fmt::Debug for AzureOpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("deployment", &self.deployment)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct ApiRequest {
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ApiFunction,
}

#[derive(Debug, Serialize)]
struct ApiFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: ApiFunctionCall,
}

fn function_kind() -> String {
    "function".into()
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ApiToolCall>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Azure OpenAI LLM provider
pub struct AzureOpenAiProvider {
    client: reqwest::Client,
    config: AzureOpenAiConfig,
}

impl AzureOpenAiProvider {
    /// Create from configuration
    pub fn new(config: AzureOpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Configuration in use
    pub const fn config(&self) -> &AzureOpenAiConfig {
        &self.config
    }

    /// Convert agent messages to chat-completions format
    fn convert_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::Tool => "tool",
                };
                let content = if m.content.is_empty() && m.requests_tools() {
                    None
                } else {
                    Some(m.content.clone())
                };
                ApiMessage {
                    role,
                    content,
                    tool_calls: m.tool_calls.iter().map(Self::convert_call).collect(),
                    tool_call_id: m.tool_call_id.clone(),
                }
            })
            .collect()
    }

    fn convert_call(call: &ToolCall) -> ApiToolCall {
        ApiToolCall {
            id: call.id.clone(),
            kind: function_kind(),
            function: ApiFunctionCall {
                name: call.name.clone(),
                arguments: Value::Object(call.arguments.clone()).to_string(),
            },
        }
    }

    fn convert_tools(tools: &[ToolSchema]) -> Vec<ApiTool> {
        tools
            .iter()
            .map(|t| ApiTool {
                kind: "function",
                function: ApiFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.input_schema(),
                },
            })
            .collect()
    }

    /// Parse the JSON-encoded argument string of a function call
    fn parse_arguments(call: &ApiToolCall) -> ToolArguments {
        if call.function.arguments.trim().is_empty() {
            return ToolArguments::new();
        }
        serde_json::from_str(&call.function.arguments).unwrap_or_else(|e| {
            tracing::warn!(
                tool = %call.function.name,
                error = %e,
                "Model sent unparsable tool arguments"
            );
            ToolArguments::new()
        })
    }

    /// Convert chat-completions response to agent completion
    fn convert_completion(response: ApiResponse, deployment: &str) -> Result<Completion> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Upstream("response contained no choices".into()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .iter()
            .map(|c| ToolCall::new(&c.id, &c.function.name, Self::parse_arguments(c)))
            .collect();

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            model: response.model.unwrap_or_else(|| deployment.to_string()),
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::parse),
        })
    }

    fn status_error(status: StatusCode, body: &str) -> AgentError {
        let detail = format!("{status}: {body}");
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(detail),
            StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(detail),
            _ => AgentError::Upstream(detail),
        }
    }
}

#[async_trait]
impl LlmProvider for AzureOpenAiProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Azure OpenAI".into(),
            model: self.config.deployment.clone(),
            supports_tools: true,
        }
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.config.models_url())
            .header("api-key", &self.config.api_key)
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => Ok(true),
            Ok(r) => {
                tracing::warn!("Azure OpenAI health check failed: {}", r.status());
                Ok(false)
            }
            Err(e) => {
                tracing::warn!("Azure OpenAI health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = ApiRequest {
            messages: Self::convert_messages(messages),
            tools: Self::convert_tools(tools),
            tool_choice: (!tools.is_empty()).then_some("auto"),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        tracing::debug!(
            deployment = %self.config.deployment,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending chat completion"
        );

        let response = self
            .client
            .post(self.config.completions_url())
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, &body));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Upstream(format!("invalid response: {e}")))?;

        Self::convert_completion(api_response, &self.config.deployment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::tool::ParameterSchema;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> AzureOpenAiProvider {
        let config = AzureOpenAiConfig::new(server.uri(), "secret", "2024-10-21", "gpt-4o");
        AzureOpenAiProvider::new(config).unwrap()
    }

    fn price_schema() -> ToolSchema {
        ToolSchema {
            name: "get_item_price".into(),
            description: "Provides the price of the requested menu item.".into(),
            parameters: vec![ParameterSchema::string("menu_item", "The name of the menu item.")],
        }
    }

    #[test]
    fn test_completions_url() {
        let config = AzureOpenAiConfig::new("https://gw.example.com/", "k", "2024-10-21", "gpt-4o");
        assert_eq!(
            config.completions_url(),
            "https://gw.example.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-10-21"
        );
        assert_eq!(
            config.models_url(),
            "https://gw.example.com/openai/models?api-version=2024-10-21"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = AzureOpenAiConfig::new("https://gw", "super-secret", "v", "d");
        assert!(!format!("{config:?}").contains("super-secret"));
    }

    #[test]
    fn test_message_conversion() {
        let call = ToolCall::new("c1", "get_specials", ToolArguments::new());
        let messages = vec![
            Message::system("You are helpful."),
            Message::user("Specials?"),
            Message::assistant_with_calls("", vec![call]),
            Message::tool("Clam Chowder", "c1"),
        ];

        let converted = AzureOpenAiProvider::convert_messages(&messages);
        assert_eq!(converted.len(), 4);
        assert_eq!(converted[2].role, "assistant");
        assert!(converted[2].content.is_none());
        assert_eq!(converted[2].tool_calls[0].function.arguments, "{}");
        assert_eq!(converted[3].role, "tool");
        assert_eq!(converted[3].tool_call_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_text_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4o/chat/completions"))
            .and(query_param("api-version", "2024-10-21"))
            .and(header("api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-4o-2024-08-06",
                "choices": [{
                    "message": {"role": "assistant", "content": "Clam Chowder"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = provider(&server)
            .complete(&[Message::user("soup?")], &[], &GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(completion.content, "Clam Chowder");
        assert!(completion.tool_calls.is_empty());
        assert_eq!(completion.model, "gpt-4o-2024-08-06");
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
        assert_eq!(completion.usage.map(|u| u.total_tokens), Some(13));
    }

    #[tokio::test]
    async fn test_tool_call_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "tool_choice": "auto",
                "tools": [{"type": "function", "function": {"name": "get_item_price"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_abc",
                            "type": "function",
                            "function": {
                                "name": "get_item_price",
                                "arguments": "{\"menu_item\":\"Soup\"}"
                            }
                        }]
                    },
                    "finish_reason": "tool_calls"
                }]
            })))
            .mount(&server)
            .await;

        let completion = provider(&server)
            .complete(
                &[Message::user("price of soup?")],
                &[price_schema()],
                &GenerationOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(completion.content, "");
        assert_eq!(completion.model, "gpt-4o");
        assert_eq!(completion.finish_reason, Some(FinishReason::ToolUse));
        assert_eq!(completion.tool_calls.len(), 1);
        let call = &completion.tool_calls[0];
        assert_eq!(call.id, "call_abc");
        assert_eq!(call.name, "get_item_price");
        assert_eq!(call.arguments["menu_item"], "Soup");
    }

    #[tokio::test]
    async fn test_unparsable_arguments_become_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "tool_calls": [{
                            "id": "c1",
                            "function": {"name": "get_item_price", "arguments": "{not json"}
                        }]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let completion = provider(&server)
            .complete(&[Message::user("?")], &[price_schema()], &GenerationOptions::default())
            .await
            .unwrap();
        assert!(completion.tool_calls[0].arguments.is_empty());
    }

    #[tokio::test]
    async fn test_status_mapping() {
        fn kind(e: &AgentError) -> &'static str {
            match e {
                AgentError::Auth(_) => "auth",
                AgentError::RateLimited(_) => "rate_limited",
                AgentError::Upstream(_) => "upstream",
                _ => "other",
            }
        }

        for (status, expected) in [
            (401u16, "auth"),
            (403, "auth"),
            (429, "rate_limited"),
            (500, "upstream"),
        ] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
                .mount(&server)
                .await;

            let err = provider(&server)
                .complete(&[Message::user("hi")], &[], &GenerationOptions::default())
                .await
                .unwrap_err();
            assert_eq!(kind(&err), expected, "status {status} mapped to {err:?}");
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = provider(&server)
            .complete(&[Message::user("hi")], &[], &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_health_check_lists_models_without_completing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/openai/models"))
            .and(query_param("api-version", "2024-10-21"))
            .and(header("api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = provider(&server);
        for _ in 0..3 {
            assert!(provider.health_check().await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_health_check_reports_false_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(!provider(&server).health_check().await.unwrap());
    }
}
