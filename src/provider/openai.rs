//! OpenAI Chat Completions adapter (`POST /chat/completions`).
//!
//! The wire types here serialize directly to the JSON payloads expected by
//! OpenAI-compatible endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use super::transport::{build_http_client, post_json};
use super::{Provider, ProviderKind, ProviderRequest};
use crate::error::ProviderError;
use crate::types::{ProviderResult, StopReason, TokenUsage, ToolArguments, ToolCall, Turn};

/// Adapter for OpenAI-compatible chat models.
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Self {
        Self {
            http: build_http_client(timeout),
            api_key: api_key.trim().to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn send(&self, request: &ProviderRequest<'_>) -> Result<ProviderResult, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = build_request(request);
        let headers = [("Authorization", format!("Bearer {}", self.api_key))];
        let response: ChatResponse = post_json(&self.http, &url, &headers, &body).await?;
        parse_response(response)
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Conversation participant role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single message in the request history.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: Role,
    /// Null when the assistant message is purely tool calls.
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    /// Set when role == Tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl Message {
    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

/// A tool invocation in an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: FunctionCall,
}

/// Function name and JSON-encoded arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_type() -> String {
    "function".into()
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: FunctionDefinition<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionDefinition<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

fn build_request<'a>(request: &'a ProviderRequest<'a>) -> ChatRequest<'a> {
    let system = request.system_prompt();
    let mut messages = Vec::with_capacity(request.turns.len() + 1);
    if !system.is_empty() {
        messages.push(Message::text(Role::System, system));
    }
    messages.extend(request.turns.iter().filter_map(translate_turn));

    ChatRequest {
        model: request.model,
        max_tokens: request.options.max_tokens,
        messages,
        tools: request
            .tools
            .iter()
            .map(|tool| WireTool {
                tool_type: "function",
                function: FunctionDefinition {
                    name: &tool.name,
                    description: &tool.description,
                    parameters: &tool.parameters,
                },
            })
            .collect(),
        temperature: request.options.temperature,
    }
}

/// Map one transcript turn to a chat message.
///
/// Assistant turns with neither text nor tool calls have no valid wire form
/// and are skipped.
fn translate_turn(turn: &Turn) -> Option<Message> {
    let message = match turn {
        Turn::User { text } => Message::text(Role::User, text.clone()),
        Turn::Assistant { text, tool_calls } if text.is_empty() && tool_calls.is_empty() => {
            return None;
        }
        Turn::Assistant { text, tool_calls } => Message {
            role: Role::Assistant,
            content: (!text.is_empty()).then(|| text.clone()),
            tool_calls: tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: call.id.clone(),
                    call_type: function_type(),
                    function: FunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments_json(),
                    },
                })
                .collect(),
            tool_call_id: None,
        },
        Turn::ToolResult(result) => Message {
            role: Role::Tool,
            content: Some(if result.is_error {
                format!("error: {}", result.output)
            } else {
                result.output.clone()
            }),
            tool_calls: Vec::new(),
            tool_call_id: Some(result.call_id.clone()),
        },
    };
    Some(message)
}

fn parse_response(response: ChatResponse) -> Result<ProviderResult, ProviderError> {
    let Some(first) = response.choices.first() else {
        return Err(ProviderError::malformed("response contained no choices"));
    };
    let stop_reason = map_finish_reason(first.finish_reason.as_deref());

    let mut text_segments = Vec::new();
    let mut tool_calls = Vec::new();
    for choice in response.choices {
        if let Some(content) = choice.message.content {
            text_segments.push(content);
        }
        for call in choice.message.tool_calls {
            let arguments = parse_arguments(&call.function.name, &call.function.arguments)?;
            tool_calls.push(ToolCall::new(call.id, call.function.name, arguments));
        }
    }

    let usage = response
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(ProviderResult {
        stop_reason: stop_reason.normalize(!tool_calls.is_empty()),
        text_segments,
        tool_calls,
        usage,
    })
}

/// Decode the JSON-encoded arguments string of a function call.
fn parse_arguments(tool: &str, raw: &str) -> Result<ToolArguments, ProviderError> {
    if raw.trim().is_empty() {
        return Ok(ToolArguments::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ProviderError::malformed(format!(
            "arguments for `{tool}` must be a JSON object, got {other}"
        ))),
        Err(e) => Err(ProviderError::malformed(format!(
            "arguments for `{tool}` are not valid JSON: {e}"
        ))),
    }
}

fn map_finish_reason(reason: Option<&str>) -> StopReason {
    match reason {
        None | Some("stop") => StopReason::EndTurn,
        Some("tool_calls") | Some("function_call") => StopReason::ToolUse,
        Some("length") => StopReason::MaxTokens,
        Some("content_filter") => StopReason::Error,
        Some(other) => {
            warn!(finish_reason = other, "unrecognized openai finish reason");
            StopReason::EndTurn
        }
    }
}
