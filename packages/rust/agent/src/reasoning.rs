//! Reasoning backend: the seam between the agent loop and the external
//! reasoning capability.
//!
//! [`ReasoningBackend`] is the trait the loop drives; [`ChatBackend`] is the
//! production implementation over an OpenAI-compatible chat-completions API.
//! The loop never constructs prompts for a specific provider — it hands over
//! the transcript and the tool surface, and gets back one [`Message`].

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use docquery_shared::{DocQueryError, ReasoningConfig, Result};

use crate::conversation::{Message, Role, ToolCallRequest};
use crate::tools::ToolSpec;

const REQUEST_TIMEOUT_SECS: u64 = 120;

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// One reasoning step: given the transcript so far and the advertised tools,
/// produce the next reply.
///
/// Errors from this trait are fatal to the run; the loop does not retry them.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    async fn complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<Message>;
}

// ---------------------------------------------------------------------------
// ChatBackend
// ---------------------------------------------------------------------------

/// OpenAI-compatible chat-completions backend.
pub struct ChatBackend {
    client: Client,
    config: ReasoningConfig,
    api_key: String,
}

impl ChatBackend {
    /// Create a backend. Reads the API key from the env var the config
    /// names — missing key fails fast before any network use.
    pub fn new(config: ReasoningConfig) -> Result<Self> {
        let api_key = docquery_shared::resolve_api_key(&config.api_key_env)?;
        Self::with_api_key(config, api_key)
    }

    /// Create a backend with an explicit API key, bypassing env-var
    /// resolution.
    pub fn with_api_key(config: ReasoningConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DocQueryError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn handle_response(response: Response) -> Result<Message> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_response(status, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| DocQueryError::Reasoning(format!("failed to read response body: {e}")))?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| DocQueryError::Reasoning(format!("malformed completion payload: {e}")))?;

        reply_from_response(parsed)
    }

    async fn handle_error_response(status: StatusCode, response: Response) -> DocQueryError {
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        match status.as_u16() {
            401 => DocQueryError::Reasoning(format!("authentication failed: {detail}")),
            429 => DocQueryError::Reasoning(format!("rate limit exceeded: {detail}")),
            500..=599 => DocQueryError::Reasoning(format!("provider error: {detail}")),
            _ => DocQueryError::Reasoning(format!("HTTP {status}: {detail}")),
        }
    }
}

#[async_trait]
impl ReasoningBackend for ChatBackend {
    async fn complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<Message> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(wire_message).collect(),
            temperature: self.config.temperature,
            tools: if tools.is_empty() {
                None
            } else {
                Some(tools.iter().map(wire_tool).collect())
            },
        };

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map(|t| t.len()).unwrap_or(0),
            "sending completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| DocQueryError::Reasoning(format!("request failed: {e}")))?;

        Self::handle_response(response).await
    }
}

// ---------------------------------------------------------------------------
// Wire conversion
// ---------------------------------------------------------------------------

fn wire_message(message: &Message) -> ChatMessage {
    match message.role {
        Role::System => ChatMessage {
            role: "system",
            content: Some(message.content.clone()),
            tool_calls: None,
            tool_call_id: None,
        },
        Role::Human => ChatMessage {
            role: "user",
            content: Some(message.content.clone()),
            tool_calls: None,
            tool_call_id: None,
        },
        Role::Ai => ChatMessage {
            role: "assistant",
            content: if message.content.is_empty() {
                None
            } else {
                Some(message.content.clone())
            },
            tool_calls: if message.tool_calls.is_empty() {
                None
            } else {
                Some(message.tool_calls.iter().map(wire_tool_call).collect())
            },
            tool_call_id: None,
        },
        Role::ToolResult => ChatMessage {
            role: "tool",
            content: Some(message.content.clone()),
            tool_calls: None,
            tool_call_id: message.tool_call_id.clone(),
        },
    }
}

fn wire_tool_call(call: &ToolCallRequest) -> ChatToolCall {
    ChatToolCall {
        id: call.id.clone(),
        call_type: "function".to_string(),
        function: ChatFunctionCall {
            name: call.name.clone(),
            arguments: call.arguments.to_string(),
        },
    }
}

fn wire_tool(spec: &ToolSpec) -> ChatTool {
    ChatTool {
        tool_type: "function",
        function: ChatFunction {
            name: spec.name,
            description: spec.advertised_description(),
            parameters: spec.parameters.clone(),
        },
    }
}

fn reply_from_response(response: ChatResponse) -> Result<Message> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| DocQueryError::Reasoning("completion returned no choices".to_string()))?;

    let content = choice.message.content.unwrap_or_default();
    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| {
            // Arguments arrive as a JSON-encoded string.
            let arguments: Value = serde_json::from_str(&tc.function.arguments).map_err(|e| {
                DocQueryError::Reasoning(format!(
                    "malformed arguments for tool call '{}': {e}",
                    tc.function.name
                ))
            })?;
            Ok(ToolCallRequest {
                id: tc.id,
                name: tc.function.name,
                arguments,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Message::ai(content, tool_calls))
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ChatTool>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ChatFunction,
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: &'static str,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: ChatFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
