//! Unified error types for the agent.

use std::fmt;

// ---------------------------------------------------------------------------
// ToolError
// ---------------------------------------------------------------------------

/// Errors arising from tool dispatch and execution.
///
/// These never abort the loop: they are rendered into an error tool result so
/// the model can see and react to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// No tool with this name is registered.
    UnknownTool(String),
    /// The model supplied arguments that do not satisfy the tool's schema.
    InvalidArguments(String),
    /// The tool ran but encountered a failure.
    ExecutionFailed(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool(name) => {
                write!(f, "UnknownToolError: no tool named `{name}` is registered")
            }
            Self::InvalidArguments(msg) => write!(f, "InvalidArgumentsError: {msg}"),
            Self::ExecutionFailed(msg) => write!(f, "ToolExecutionError: {msg}"),
        }
    }
}

impl std::error::Error for ToolError {}

// ---------------------------------------------------------------------------
// RegistryError
// ---------------------------------------------------------------------------

/// Errors raised while registering tools at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateTool(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateTool(name) => {
                write!(f, "DuplicateToolError: tool `{name}` is already registered")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading configuration or resolving credentials.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
    /// The selected provider's credential variable is unset or empty.
    MissingCredential {
        provider: &'static str,
        env_var: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
            Self::MissingCredential { provider, env_var } => write!(
                f,
                "missing credentials for provider `{provider}`: set the {env_var} environment variable"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// ProviderError
// ---------------------------------------------------------------------------

/// Normalized failure category reported by every provider adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Auth,
    RateLimit,
    Timeout,
    MalformedResponse,
    Unknown,
}

impl ProviderErrorKind {
    /// Stable upper-case label used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            Self::Auth => "AUTH",
            Self::RateLimit => "RATE_LIMIT",
            Self::Timeout => "TIMEOUT",
            Self::MalformedResponse => "MALFORMED_RESPONSE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Error returned by a provider adapter for one model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    /// Server-provided `Retry-After` delay, when present.
    pub retry_after_secs: Option<u64>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after_secs: None,
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Auth, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::MalformedResponse, message)
    }

    pub fn with_retry_after(mut self, retry_after_secs: Option<u64>) -> Self {
        self.retry_after_secs = retry_after_secs;
        self
    }

    /// Classify a non-2xx HTTP status into a provider error.
    pub fn from_status(status: u16, body: String, retry_after_secs: Option<u64>) -> Self {
        let kind = match status {
            401 | 403 => ProviderErrorKind::Auth,
            429 | 529 => ProviderErrorKind::RateLimit,
            408 | 504 => ProviderErrorKind::Timeout,
            _ => ProviderErrorKind::Unknown,
        };
        Self::new(kind, format!("status {status}: {body}")).with_retry_after(retry_after_secs)
    }

    /// True when the loop may retry this failure with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            ProviderErrorKind::RateLimit | ProviderErrorKind::Timeout
        )
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderError[{}]: {}", self.kind.label(), self.message)
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(format!("request timed out: {e}"))
        } else if e.is_decode() {
            Self::malformed(format!("failed to decode response: {e}"))
        } else if let Some(status) = e.status() {
            Self::from_status(status.as_u16(), e.to_string(), None)
        } else {
            Self::new(ProviderErrorKind::Unknown, format!("http: {e}"))
        }
    }
}

// ---------------------------------------------------------------------------
// ProtocolError
// ---------------------------------------------------------------------------

/// Violations of the transcript ordering invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A tool result references a call id the preceding assistant turn never issued.
    UnmatchedToolResult(String),
    /// A tool result for this call id was already appended.
    DuplicateToolResult(String),
    /// An assistant turn issued the same call id twice.
    DuplicateCallId(String),
    /// A new user/assistant turn was appended while these calls had no result.
    PendingToolResults(Vec<String>),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmatchedToolResult(id) => {
                write!(f, "tool result `{id}` has no matching tool call")
            }
            Self::DuplicateToolResult(id) => {
                write!(f, "tool result `{id}` was already recorded")
            }
            Self::DuplicateCallId(id) => write!(f, "tool call id `{id}` issued twice"),
            Self::PendingToolResults(ids) => {
                write!(f, "tool calls still awaiting results: {}", ids.join(", "))
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

// ---------------------------------------------------------------------------
// ExportError
// ---------------------------------------------------------------------------

/// Errors reading or writing an exported transcript.
#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Json(serde_json::Error),
    UnsupportedVersion(u32),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Json(e) => write!(f, "json: {e}"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported transcript version {v}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

// ---------------------------------------------------------------------------
// AgentError
// ---------------------------------------------------------------------------

/// Error that ends a turn in the `Failed` state.
#[derive(Debug)]
pub enum AgentError {
    Provider(ProviderError),
    Protocol(ProtocolError),
}

impl AgentError {
    /// True when continuing the session cannot succeed (bad credentials).
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Provider(e) => e.kind == ProviderErrorKind::Auth,
            Self::Protocol(_) => true,
        }
    }
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(e) => write!(f, "{e}"),
            Self::Protocol(e) => write!(f, "transcript protocol violation: {e}"),
        }
    }
}

impl std::error::Error for AgentError {}

impl From<ProviderError> for AgentError {
    fn from(e: ProviderError) -> Self {
        Self::Provider(e)
    }
}

impl From<ProtocolError> for AgentError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}
