//! Default configuration constants.
//!
//! Callers share these constants instead of repeating literals.

/// File name looked up in the working directory and the global config dir.
pub(super) const CONFIG_FILE_NAME: &str = "codemate.toml";
/// Directory under the platform config root holding the global config.
pub(super) const CONFIG_DIR_NAME: &str = "codemate";
/// Tool rounds allowed per user turn.
pub(super) const DEFAULT_MAX_ROUNDS: u32 = 10;
/// Response length cap per model call.
pub(super) const DEFAULT_MAX_TOKENS: u32 = 1024;
/// Default timeout for model API requests.
pub(super) const DEFAULT_API_TIMEOUT_SECS: u64 = 120;
/// Attempts per provider call, including the first.
pub(super) const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub(super) const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;
pub(super) const DEFAULT_MAX_BACKOFF_MS: u64 = 8_000;
