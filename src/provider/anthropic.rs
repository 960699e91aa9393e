//! Anthropic Messages API adapter (`POST /v1/messages`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use super::transport::{build_http_client, post_json};
use super::{Provider, ProviderKind, ProviderRequest};
use crate::error::ProviderError;
use crate::types::{
    ProviderResult, StopReason, TokenUsage, ToolArguments, ToolCall, ToolDefinition, Turn,
};

const API_VERSION: &str = "2023-06-01";

/// Adapter for Claude models.
pub struct AnthropicProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Self {
        Self {
            http: build_http_client(timeout),
            api_key: api_key.trim().to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn send(&self, request: &ProviderRequest<'_>) -> Result<ProviderResult, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = build_request(request);
        let headers = [
            ("x-api-key", self.api_key.clone()),
            ("anthropic-version", API_VERSION.to_string()),
        ];
        let response: MessagesResponse = post_json(&self.http, &url, &headers, &body).await?;
        parse_response(response)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    system: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
    /// Block types this adapter does not consume (thinking, images, ...).
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

fn build_request<'a>(request: &'a ProviderRequest<'a>) -> MessagesRequest<'a> {
    MessagesRequest {
        model: request.model,
        max_tokens: request.options.max_tokens,
        system: request.system_prompt(),
        messages: translate_turns(request.turns),
        tools: request.tools.iter().map(translate_tool).collect(),
        temperature: request.options.temperature,
    }
}

fn translate_tool(tool: &ToolDefinition) -> WireTool<'_> {
    WireTool {
        name: &tool.name,
        description: &tool.description,
        input_schema: &tool.parameters,
    }
}

/// Map transcript turns onto alternating user/assistant messages.
///
/// Tool results travel as `tool_result` blocks inside a user message, and
/// consecutive turns with the same wire role are merged into one message.
fn translate_turns(turns: &[Turn]) -> Vec<WireMessage> {
    let mut messages: Vec<WireMessage> = Vec::new();
    for turn in turns {
        let (role, blocks) = match turn {
            Turn::User { text } => ("user", vec![ContentBlock::Text { text: text.clone() }]),
            Turn::Assistant { text, tool_calls } => {
                let mut blocks = Vec::new();
                if !text.trim().is_empty() {
                    blocks.push(ContentBlock::Text { text: text.clone() });
                }
                blocks.extend(tool_calls.iter().map(|call| ContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: Value::Object(call.arguments.clone()),
                }));
                ("assistant", blocks)
            }
            Turn::ToolResult(result) => (
                "user",
                vec![ContentBlock::ToolResult {
                    tool_use_id: result.call_id.clone(),
                    content: result.output.clone(),
                    is_error: result.is_error,
                }],
            ),
        };
        if blocks.is_empty() {
            continue;
        }
        match messages.last_mut() {
            Some(last) if last.role == role => last.content.extend(blocks),
            _ => messages.push(WireMessage {
                role,
                content: blocks,
            }),
        }
    }
    messages
}

fn parse_response(response: MessagesResponse) -> Result<ProviderResult, ProviderError> {
    let mut text_segments = Vec::new();
    let mut tool_calls = Vec::new();
    for block in response.content {
        match block {
            ContentBlock::Text { text } => text_segments.push(text),
            ContentBlock::ToolUse { id, name, input } => {
                tool_calls.push(ToolCall::new(id, name, tool_input(input)?));
            }
            ContentBlock::ToolResult { .. } | ContentBlock::Unsupported => {}
        }
    }

    let stop_reason = map_stop_reason(response.stop_reason.as_deref());
    Ok(ProviderResult {
        stop_reason: stop_reason.normalize(!tool_calls.is_empty()),
        text_segments,
        tool_calls,
        usage: TokenUsage {
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        },
    })
}

fn tool_input(input: Value) -> Result<ToolArguments, ProviderError> {
    match input {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(ToolArguments::new()),
        other => Err(ProviderError::malformed(format!(
            "tool_use input must be an object, got {other}"
        ))),
    }
}

fn map_stop_reason(reason: Option<&str>) -> StopReason {
    match reason {
        None | Some("end_turn") | Some("stop_sequence") | Some("pause_turn") => StopReason::EndTurn,
        Some("tool_use") => StopReason::ToolUse,
        Some("max_tokens") => StopReason::MaxTokens,
        Some("refusal") => StopReason::Error,
        Some(other) => {
            warn!(stop_reason = other, "unrecognized anthropic stop reason");
            StopReason::EndTurn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorKind;
    use crate::provider::RequestOptions;
    use crate::types::ToolResult;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn list_call() -> ToolCall {
        let mut args = ToolArguments::new();
        args.insert("path".into(), json!("."));
        ToolCall::new("toolu_1", "list_files", args)
    }

    fn parse(value: Value) -> Result<ProviderResult, ProviderError> {
        parse_response(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn tool_results_become_user_blocks() {
        let turns = vec![
            Turn::user("list files in ."),
            Turn::assistant("Let me look.", vec![list_call()]),
            Turn::ToolResult(ToolResult::failure("toolu_1", "denied")),
        ];
        let value = serde_json::to_value(translate_turns(&turns)).unwrap();
        assert_eq!(value[0]["role"], "user");
        assert_eq!(value[0]["content"][0]["type"], "text");
        assert_eq!(value[1]["role"], "assistant");
        assert_eq!(value[1]["content"][0]["text"], "Let me look.");
        assert_eq!(value[1]["content"][1]["type"], "tool_use");
        assert_eq!(value[1]["content"][1]["input"]["path"], ".");
        assert_eq!(value[2]["role"], "user");
        assert_eq!(value[2]["content"][0]["type"], "tool_result");
        assert_eq!(value[2]["content"][0]["tool_use_id"], "toolu_1");
        assert_eq!(value[2]["content"][0]["is_error"], true);
    }

    #[test]
    fn consecutive_same_role_turns_merge() {
        let mut second = list_call();
        second.id = "toolu_2".into();
        let turns = vec![
            Turn::user("go"),
            Turn::assistant("", vec![list_call(), second]),
            Turn::ToolResult(ToolResult::success("toolu_1", "[]")),
            Turn::ToolResult(ToolResult::success("toolu_2", "[]")),
            Turn::user("thanks"),
        ];
        let messages = translate_turns(&turns);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content.len(), 2);
        assert_eq!(messages[2].role, "user");
        assert_eq!(messages[2].content.len(), 3);
    }

    #[test]
    fn empty_assistant_turns_are_skipped() {
        let turns = vec![Turn::user("hi"), Turn::assistant("  ", Vec::new())];
        assert_eq!(translate_turns(&turns).len(), 1);
    }

    #[test]
    fn request_body_carries_system_tools_and_options() {
        let tools = vec![ToolDefinition {
            name: "list_files".into(),
            description: "List files".into(),
            parameters: json!({"type": "object"}),
        }];
        let options = RequestOptions {
            max_tokens: 256,
            temperature: Some(0.2),
            ..RequestOptions::default()
        };
        let turns = vec![Turn::user("hi")];
        let request = ProviderRequest {
            system: "sys",
            turns: &turns,
            tools: &tools,
            model: "claude-test",
            options: &options,
            hint: None,
        };
        let body = serde_json::to_value(build_request(&request)).unwrap();
        assert_eq!(body["model"], "claude-test");
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["system"], "sys");
        assert_eq!(body["tools"][0]["input_schema"]["type"], "object");
        assert!(body["temperature"].is_number());
    }

    #[test]
    fn request_body_omits_empty_optional_fields() {
        let options = RequestOptions::default();
        let request = ProviderRequest {
            system: "",
            turns: &[],
            tools: &[],
            model: "m",
            options: &options,
            hint: None,
        };
        let body = serde_json::to_value(build_request(&request)).unwrap();
        assert!(body.get("system").is_none());
        assert!(body.get("tools").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn parses_tool_use_response() {
        let result = parse(json!({
            "content": [
                {"type": "text", "text": "Checking."},
                {"type": "tool_use", "id": "toolu_1", "name": "list_files", "input": {"path": "."}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 20, "output_tokens": 7}
        }))
        .unwrap();
        assert_eq!(result.stop_reason, StopReason::ToolUse);
        assert_eq!(result.text_segments, vec!["Checking."]);
        assert_eq!(result.tool_calls, vec![list_call()]);
        assert_eq!(result.usage.total(), 27);
    }

    #[test]
    fn tool_calls_force_tool_use_even_on_end_turn() {
        let result = parse(json!({
            "content": [{"type": "tool_use", "id": "toolu_1", "name": "list_files", "input": {"path": "."}}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 1, "output_tokens": 1}
        }))
        .unwrap();
        assert_eq!(result.stop_reason, StopReason::ToolUse);
    }

    #[test]
    fn maps_stop_reasons() {
        assert_eq!(map_stop_reason(Some("end_turn")), StopReason::EndTurn);
        assert_eq!(map_stop_reason(Some("max_tokens")), StopReason::MaxTokens);
        assert_eq!(map_stop_reason(Some("refusal")), StopReason::Error);
        assert_eq!(map_stop_reason(None), StopReason::EndTurn);
    }

    #[test]
    fn unsupported_blocks_are_ignored() {
        let result = parse(json!({
            "content": [{"type": "thinking", "thinking": "hmm"}, {"type": "text", "text": "hi"}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 1, "output_tokens": 1}
        }))
        .unwrap();
        assert_eq!(result.joined_text(), "hi");
    }

    #[test]
    fn non_object_tool_input_is_malformed() {
        let err = parse(json!({
            "content": [{"type": "tool_use", "id": "t", "name": "x", "input": "oops"}],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 1, "output_tokens": 1}
        }))
        .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::MalformedResponse);
    }

    async fn serve(status_line: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut buf = [0u8; 16384];
            let _ = stream.read(&mut buf).await;
            let _ = stream.write_all(response.as_bytes()).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn send_maps_unauthorized_to_auth() {
        let base = serve(
            "401 Unauthorized",
            r#"{"type":"error","error":{"type":"authentication_error"}}"#,
        )
        .await;
        let provider = AnthropicProvider::new("bad", &base, Duration::from_secs(3));
        let options = RequestOptions::default();
        let turns = vec![Turn::user("hi")];
        let err = provider
            .send(&ProviderRequest {
                system: "",
                turns: &turns,
                tools: &[],
                model: "m",
                options: &options,
                hint: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Auth);
    }

    #[tokio::test]
    async fn send_parses_successful_response() {
        let base = serve(
            "200 OK",
            r#"{"content":[{"type":"text","text":"Paris."}],"stop_reason":"end_turn","usage":{"input_tokens":12,"output_tokens":3}}"#,
        )
        .await;
        let provider = AnthropicProvider::new("key", &base, Duration::from_secs(3));
        let options = RequestOptions::default();
        let turns = vec![Turn::user("capital of France?")];
        let result = provider
            .send(&ProviderRequest {
                system: "",
                turns: &turns,
                tools: &[],
                model: "m",
                options: &options,
                hint: None,
            })
            .await
            .unwrap();
        assert_eq!(result.joined_text(), "Paris.");
        assert_eq!(result.stop_reason, StopReason::EndTurn);
        assert_eq!(result.usage.input_tokens, 12);
    }

    #[tokio::test]
    async fn send_reports_missing_fields_as_malformed() {
        let base = serve("200 OK", r#"{"content":[]}"#).await;
        let provider = AnthropicProvider::new("key", &base, Duration::from_secs(3));
        let options = RequestOptions::default();
        let err = provider
            .send(&ProviderRequest {
                system: "",
                turns: &[],
                tools: &[],
                model: "m",
                options: &options,
                hint: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::MalformedResponse);
    }
}
