//! Model backends.
//!
//! The provider set is closed: [`ProviderKind`] names every supported backend
//! and [`build_provider`] constructs the matching adapter. Each adapter owns
//! its wire translation and normalizes responses into [`ProviderResult`].
//!
//! - `anthropic`: `/v1/messages`
//! - `openai`: `/chat/completions`
//! - `transport`: shared HTTP plumbing and status classification

use crate::error::ProviderError;
use crate::tools::selection::ToolHint;
use crate::types::{ProviderResult, ToolDefinition, Turn};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub mod anthropic;
pub mod openai;
pub mod transport;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

// ---------------------------------------------------------------------------
// Provider kinds
// ---------------------------------------------------------------------------

/// Supported model backends.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Anthropic,
    #[value(name = "openai")]
    OpenAi,
}

impl ProviderKind {
    /// All kinds in registration order; the first is the default.
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Anthropic, ProviderKind::OpenAi];

    pub fn name(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }

    /// Environment variable that holds the API key unless overridden in config.
    pub fn credential_env(self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::Anthropic => "claude-3-7-sonnet-latest",
            Self::OpenAi => "gpt-4-turbo-preview",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com",
            Self::OpenAi => "https://api.openai.com/v1",
        }
    }

    /// Parse a provider name as written in config or on the command line.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Per-call generation options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestOptions {
    /// Caps the response length.
    pub max_tokens: u32,
    /// Sampling temperature; backend default when `None`.
    pub temperature: Option<f32>,
    /// Maximum wait for one call.
    pub timeout: Duration,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: None,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Everything an adapter needs for one model call.
#[derive(Debug, Clone, Copy)]
pub struct ProviderRequest<'a> {
    pub system: &'a str,
    pub turns: &'a [Turn],
    pub tools: &'a [ToolDefinition],
    pub model: &'a str,
    pub options: &'a RequestOptions,
    pub hint: Option<&'a ToolHint>,
}

impl ProviderRequest<'_> {
    /// System prompt with the tool hint, if any, appended.
    pub fn system_prompt(&self) -> String {
        let base = self.system.trim();
        match self.hint {
            Some(hint) if base.is_empty() => hint.render(),
            Some(hint) => format!("{base}\n\n{}", hint.render()),
            None => base.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// One model backend.
///
/// Adapters perform exactly one HTTP call per `send` and never retry; retry
/// policy belongs to the orchestration loop. Tests substitute scripted
/// implementations.
#[async_trait]
pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn send(&self, request: &ProviderRequest<'_>) -> Result<ProviderResult, ProviderError>;
}

/// Resolved connection settings for one backend.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Construct the adapter for `settings.kind`.
pub fn build_provider(settings: &ProviderSettings) -> Box<dyn Provider> {
    match settings.kind {
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(
            &settings.api_key,
            &settings.base_url,
            settings.timeout,
        )),
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(
            &settings.api_key,
            &settings.base_url,
            settings.timeout,
        )),
    }
}
