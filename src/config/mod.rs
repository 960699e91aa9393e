//! Configuration loading from TOML files and environment variables.
//!
//! Config is resolved in this order of precedence (highest wins):
//! 1. CLI flags (applied by the caller)
//! 2. Environment variables (`CODEMATE_MODEL`, `CODEMATE_MAX_ROUNDS`,
//!    `CODEMATE_API_TIMEOUT_SECS`)
//! 3. TOML file given via `--config`
//! 4. `./codemate.toml` in the current directory
//! 5. `$XDG_CONFIG_HOME/codemate/codemate.toml` (or the platform config dir)
//! 6. Built-in defaults
//!
//! API keys are never stored in config; `[providers.<name>] api_key_env` only
//! names the variable to read.

mod defaults;
mod env;
mod loader;
mod resolve;
mod sources;
mod types;

pub use loader::{load_config, load_config_with_source};
pub use resolve::ResolvedProvider;
pub use sources::config_root_dir;
pub use types::{
    AgentConfig, Config, ConfigSource, DisplayConfig, LoadedConfig, NetworkConfig,
    ProviderConfig, ToolHintMode,
};
