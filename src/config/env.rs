//! Environment variable overrides.
//!
//! `CODEMATE_*` variables override file values; CLI flags are applied later
//! by the caller and win over both.

use crate::error::ConfigError;

use super::Config;

pub(super) const ENV_MODEL: &str = "CODEMATE_MODEL";
pub(super) const ENV_MAX_ROUNDS: &str = "CODEMATE_MAX_ROUNDS";
pub(super) const ENV_API_TIMEOUT_SECS: &str = "CODEMATE_API_TIMEOUT_SECS";

pub(super) fn apply_runtime_env_overrides<FEnv>(
    config: &mut Config,
    env_lookup: &FEnv,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(model) = non_empty(env_lookup(ENV_MODEL)) {
        config.agent.model = Some(model);
    }
    if let Some(raw) = non_empty(env_lookup(ENV_MAX_ROUNDS)) {
        let rounds = parse_u64(ENV_MAX_ROUNDS, &raw, "a positive integer")?;
        config.agent.max_rounds = u32::try_from(rounds).map_err(|_| {
            ConfigError::Invalid(format!("{ENV_MAX_ROUNDS} value `{raw}` is too large"))
        })?;
    }
    if let Some(raw) = non_empty(env_lookup(ENV_API_TIMEOUT_SECS)) {
        // Clamp to at least 1 second so zero never means "no timeout".
        config.network.api_timeout_secs =
            parse_u64(ENV_API_TIMEOUT_SECS, &raw, "positive integer seconds")?.max(1);
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_u64(name: &str, raw: &str, expected: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>().map_err(|_| {
        ConfigError::Invalid(format!("invalid {name} value `{raw}`: expected {expected}"))
    })
}
