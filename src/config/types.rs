//! Configuration data model.
//!
//! Struct and enum definitions plus default values. Source discovery lives in
//! `sources`, env overrides in `env` and credential resolution in `resolve`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use super::defaults::{
    DEFAULT_API_TIMEOUT_SECS, DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_BACKOFF_MS, DEFAULT_MAX_ROUNDS, DEFAULT_MAX_TOKENS,
};
use crate::agent::RetryPolicy;
use crate::provider::ProviderKind;

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub agent: AgentConfig,
    pub network: NetworkConfig,
    /// Per-backend overrides keyed by provider name (`anthropic`, `openai`).
    pub providers: BTreeMap<String, ProviderConfig>,
    pub display: DisplayConfig,
}

/// Proactive tool-hint strategy.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolHintMode {
    #[default]
    Keyword,
    Off,
}

/// Agent loop settings under `[agent]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Backend used when `--provider` is not given.
    pub provider: ProviderKind,
    /// Model override applied to whichever provider is active.
    pub model: Option<String>,
    /// Cap on tool rounds per user turn.
    pub max_rounds: u32,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub tool_hints: ToolHintMode,
    /// Run the tool calls of one batch concurrently.
    pub parallel_tools: bool,
    /// Extra operator instructions appended to the built-in system prompt.
    pub instructions: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            tool_hints: ToolHintMode::default(),
            parallel_tools: false,
            instructions: String::new(),
        }
    }
}

/// Network/HTTP timeout and retry policy under `[network]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub api_timeout_secs: u64,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

impl NetworkConfig {
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

/// Backend overrides stored under `[providers.<name>]`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: Option<String>,
}

/// Display / rendering preferences under `[display]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub color: bool,
    pub show_tool_calls: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: true,
            show_tool_calls: true,
        }
    }
}

/// Where the active configuration text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicit `--config` path.
    Explicit(PathBuf),
    /// `./codemate.toml`.
    Local,
    /// `<config dir>/codemate/codemate.toml`.
    Global(PathBuf),
    /// No file found; built-in defaults were used.
    BuiltInDefaults,
}

/// Configuration payload plus where it was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
}
