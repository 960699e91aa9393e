//! Provider-agnostic data model shared by the loop, the adapters and export.
//!
//! Backend wire formats live next to their adapters under `provider::*`; the
//! types here are what the orchestration loop reasons about.

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// JSON object carried as tool-call arguments.
pub type ToolArguments = Map<String, Value>;

// ---------------------------------------------------------------------------
// Transcript turns
// ---------------------------------------------------------------------------

/// One atomic entry in the conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    User {
        text: String,
    },
    Assistant {
        /// Text segments of the response joined with newlines.
        text: String,
        #[serde(default)]
        tool_calls: Vec<ToolCall>,
    },
    ToolResult(ToolResult),
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::User { text: text.into() }
    }

    pub fn assistant(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            text: text.into(),
            tool_calls,
        }
    }

    /// Role label used in exported documents.
    pub fn role(&self) -> &'static str {
        match self {
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
            Self::ToolResult(_) => "tool_result",
        }
    }
}

// ---------------------------------------------------------------------------
// Tool calls and results
// ---------------------------------------------------------------------------

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id, unique within one assistant turn.
    pub id: String,
    /// Registered tool name.
    pub name: String,
    #[serde(default)]
    pub arguments: ToolArguments,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: ToolArguments) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Compact JSON rendering of the arguments for status lines.
    pub fn arguments_json(&self) -> String {
        Value::Object(self.arguments.clone()).to_string()
    }
}

/// Outcome of one tool call, fed back to the model on the next request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub output: String,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            output: output.into(),
            is_error: false,
        }
    }

    pub fn failure(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            output: output.into(),
            is_error: true,
        }
    }
}

/// Tool schema published to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema object describing the arguments.
    pub parameters: Value,
}

// ---------------------------------------------------------------------------
// Provider results
// ---------------------------------------------------------------------------

/// Normalized reason a provider call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Error,
}

impl StopReason {
    /// Apply the normalization contract: tool calls always mean `ToolUse`
    /// unless the backend reported an error stop.
    pub fn normalize(self, has_tool_calls: bool) -> Self {
        match self {
            Self::Error => Self::Error,
            _ if has_tool_calls => Self::ToolUse,
            Self::ToolUse => Self::EndTurn,
            other => other,
        }
    }
}

/// Token counters reported for a single provider call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Provider-agnostic outcome of one model call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResult {
    pub text_segments: Vec<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: TokenUsage,
    pub stop_reason: StopReason,
}

impl ProviderResult {
    /// Plain final answer with no tool calls.
    pub fn text(text: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            text_segments: vec![text.into()],
            tool_calls: Vec::new(),
            usage,
            stop_reason: StopReason::EndTurn,
        }
    }

    /// Response requesting the given tool calls.
    pub fn tool_use(tool_calls: Vec<ToolCall>, usage: TokenUsage) -> Self {
        Self {
            text_segments: Vec::new(),
            tool_calls,
            usage,
            stop_reason: StopReason::ToolUse,
        }
    }

    /// Non-empty text segments joined with newlines.
    pub fn joined_text(&self) -> String {
        self.text_segments
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Stop reason after enforcing the normalization contract.
    pub fn effective_stop_reason(&self) -> StopReason {
        self.stop_reason.normalize(!self.tool_calls.is_empty())
    }

    /// Reject tool calls the transcript could never answer: empty or repeated ids.
    pub fn check_tool_call_ids(&self) -> Result<(), ProviderError> {
        let mut seen = BTreeSet::new();
        for call in &self.tool_calls {
            if call.id.is_empty() {
                return Err(ProviderError::malformed(format!(
                    "tool call `{}` has an empty id",
                    call.name
                )));
            }
            if !seen.insert(call.id.as_str()) {
                return Err(ProviderError::malformed(format!(
                    "tool call id `{}` appears more than once",
                    call.id
                )));
            }
        }
        Ok(())
    }
}
