//! Validation and per-provider resolution.

use crate::error::ConfigError;
use crate::provider::{ProviderKind, ProviderSettings};

use super::{Config, ProviderConfig};

/// Connection settings and model for the active backend.
#[derive(Debug, Clone)]
pub struct ResolvedProvider {
    pub settings: ProviderSettings,
    pub model: String,
}

/// Reject values the loop cannot run with.
pub(super) fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.agent.max_rounds == 0 {
        return Err(ConfigError::Invalid(
            "agent.max_rounds must be at least 1".into(),
        ));
    }
    if config.agent.max_tokens == 0 {
        return Err(ConfigError::Invalid(
            "agent.max_tokens must be at least 1".into(),
        ));
    }
    if let Some(t) = config.agent.temperature {
        if !(0.0..=2.0).contains(&t) {
            return Err(ConfigError::Invalid(format!(
                "agent.temperature must be within 0.0..=2.0, got {t}"
            )));
        }
    }
    if config.network.max_attempts == 0 {
        return Err(ConfigError::Invalid(
            "network.max_attempts must be at least 1".into(),
        ));
    }
    for name in config.providers.keys() {
        if ProviderKind::parse(name).is_none() {
            return Err(ConfigError::Invalid(format!(
                "unknown provider `{name}` in [providers]; expected one of: {}",
                ProviderKind::ALL.map(ProviderKind::name).join(", ")
            )));
        }
    }
    Ok(())
}

impl Config {
    /// Overrides for `kind`, or empty overrides when none are configured.
    pub fn provider_config(&self, kind: ProviderKind) -> ProviderConfig {
        self.providers
            .iter()
            .find(|(name, _)| ProviderKind::parse(name) == Some(kind))
            .map(|(_, cfg)| cfg.clone())
            .unwrap_or_default()
    }

    /// Model for `kind`: agent override, then provider config, then built-in default.
    pub fn model_for(&self, kind: ProviderKind) -> String {
        normalized_option(&self.agent.model)
            .or_else(|| normalized_option(&self.provider_config(kind).model))
            .unwrap_or_else(|| kind.default_model().to_string())
    }

    /// Resolve the credential and connection settings for `kind`.
    ///
    /// The key is read once through `env_lookup`; an unset or blank variable
    /// is a [`ConfigError::MissingCredential`].
    pub fn resolve_provider_with<FEnv>(
        &self,
        kind: ProviderKind,
        env_lookup: FEnv,
    ) -> Result<ResolvedProvider, ConfigError>
    where
        FEnv: Fn(&str) -> Option<String>,
    {
        let overrides = self.provider_config(kind);
        let env_var = normalized_option(&overrides.api_key_env)
            .unwrap_or_else(|| kind.credential_env().to_string());
        let api_key = env_lookup(&env_var)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingCredential {
                provider: kind.name(),
                env_var: env_var.clone(),
            })?;
        let base_url = normalized_option(&overrides.base_url)
            .unwrap_or_else(|| kind.default_base_url().to_string());

        Ok(ResolvedProvider {
            settings: ProviderSettings {
                kind,
                api_key,
                base_url: base_url.trim_end_matches('/').to_string(),
                timeout: self.network.api_timeout(),
            },
            model: self.model_for(kind),
        })
    }

    /// [`Config::resolve_provider_with`] against the process environment.
    pub fn resolve_provider(&self, kind: ProviderKind) -> Result<ResolvedProvider, ConfigError> {
        self.resolve_provider_with(kind, |name| std::env::var(name).ok())
    }
}

pub(super) fn normalized_option(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
