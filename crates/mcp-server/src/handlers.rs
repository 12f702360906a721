//! MCP Request Handlers
//!
//! One `McpHandler` per client session. It owns that session's
//! conversation and answers JSON-RPC messages against the shared agent.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};

use agent_core::{Agent, ParameterSchema, Session, SessionId, ToolSchema};

use crate::protocol::{
    CallToolParams, CallToolResult, Incoming, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, McpTool, PROTOCOL_VERSION, ServerCapabilities, ServerInfo,
};

/// Argument carrying the user's question
const MESSAGE_ARG: &str = "message";

pub struct McpHandler {
    agent: Arc<Agent>,
    session: Session,
}

impl McpHandler {
    pub fn new(agent: Arc<Agent>, id: SessionId) -> Self {
        Self {
            agent,
            session: Session::with_id(id),
        }
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Handle one client message; `None` when no reply is due
    pub async fn handle(&mut self, message: Value) -> Option<Value> {
        match Incoming::classify(message) {
            Incoming::Request(request) => {
                let id = request.id.clone();
                let response = match self.dispatch(request).await {
                    Ok(result) => JsonRpcResponse::success(id, result),
                    Err(error) => {
                        tracing::debug!(session = %self.session.id, %error, "Request failed");
                        JsonRpcResponse::failure(Some(id), error)
                    }
                };
                Some(response.into_value())
            }
            Incoming::Notification { method } => {
                tracing::debug!(session = %self.session.id, %method, "Notification");
                None
            }
            Incoming::Response => None,
            Incoming::Invalid { id, reason } => {
                tracing::warn!(session = %self.session.id, %reason, "Invalid request");
                let error = JsonRpcError::invalid_request(reason);
                Some(JsonRpcResponse::failure(id, error).into_value())
            }
        }
    }

    async fn dispatch(&mut self, request: JsonRpcRequest) -> Result<Value, JsonRpcError> {
        tracing::debug!(session = %self.session.id, method = %request.method, "Request");

        match request.method.as_str() {
            "initialize" => to_result(&self.initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => to_result(&self.list_tools()),
            "tools/call" => {
                let result = self.call_tool(request.params).await?;
                to_result(&result)
            }
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }

    fn initialize(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION,
            capabilities: ServerCapabilities::default(),
            server_info: ServerInfo {
                name: self.agent.name().to_string(),
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }

    fn list_tools(&self) -> ListToolsResult {
        let schema = self.agent_tool();
        ListToolsResult {
            tools: vec![McpTool {
                input_schema: schema.input_schema(),
                name: schema.name,
                description: schema.description,
            }],
        }
    }

    async fn call_tool(&mut self, params: Option<Value>) -> Result<CallToolResult, JsonRpcError> {
        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(JsonRpcError::invalid_params)?;

        let schema = self.agent_tool();
        if params.name != schema.name {
            return Err(JsonRpcError::invalid_params(format!("unknown tool '{}'", params.name)));
        }
        schema
            .validate(&params.arguments)
            .map_err(JsonRpcError::invalid_params)?;

        let text = params
            .arguments
            .get(MESSAGE_ARG)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let agent = Arc::clone(&self.agent);
        match self.session.turn(&agent, text).await {
            Ok(reply) => Ok(CallToolResult::text(reply.content)),
            Err(e) => {
                tracing::error!(session = %self.session.id, error = %e, "Agent turn failed");
                Ok(CallToolResult::error(e.user_message()))
            }
        }
    }

    /// The agent itself, published as a single MCP tool
    fn agent_tool(&self) -> ToolSchema {
        ToolSchema {
            name: self.agent.name().to_string(),
            description: self.agent.config().description.clone(),
            parameters: vec![ParameterSchema::string(
                MESSAGE_ARG,
                "The question or request for the agent.",
            )],
        }
    }
}

fn to_result(value: &impl Serialize) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(JsonRpcError::internal)
}
