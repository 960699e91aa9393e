//! Session construction from config, CLI flags and the environment.

use crate::cli::ChatArgs;
use codemate::agent::{Agent, AgentSettings};
use codemate::config::{Config, ToolHintMode};
use codemate::prompt::{render_system_prompt, SystemPromptParams};
use codemate::provider::{build_provider, ProviderKind, RequestOptions};
use codemate::tools::files::register_file_tools;
use codemate::tools::selection::{KeywordSelector, NoSelector, ToolSelector};
use codemate::tools::ToolRegistry;
use codemate::ui::RenderSink;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Fold CLI overrides into the loaded config; flags win over env and files.
pub(crate) fn apply_cli_overrides(config: &mut Config, args: &ChatArgs) {
    if let Some(model) = &args.model {
        config.agent.model = Some(model.clone());
    }
    if let Some(rounds) = args.max_rounds {
        config.agent.max_rounds = rounds;
    }
    if args.no_color {
        config.display.color = false;
    }
}

/// Active backend: `--provider`, else `agent.provider`.
pub(crate) fn selected_provider(config: &Config, args: &ChatArgs) -> ProviderKind {
    args.provider.unwrap_or(config.agent.provider)
}

/// Build the tool registry with the file tools rooted at `root`.
pub(crate) fn build_registry(root: PathBuf) -> Result<ToolRegistry, String> {
    let mut registry = ToolRegistry::new();
    register_file_tools(&mut registry, root)
        .map_err(|e| format!("failed to register tools: {e}"))?;
    Ok(registry)
}

fn build_selector(mode: ToolHintMode) -> Box<dyn ToolSelector> {
    match mode {
        ToolHintMode::Keyword => Box::new(KeywordSelector::default()),
        ToolHintMode::Off => Box::new(NoSelector),
    }
}

/// Loop settings derived from config; `model` comes from provider resolution.
pub(crate) fn agent_settings(
    config: &Config,
    model: String,
    tools: &ToolRegistry,
    show_stats: bool,
) -> AgentSettings {
    let instructions = config.agent.instructions.trim();
    let system_prompt = render_system_prompt(SystemPromptParams {
        enabled_tools: tools.names(),
        custom_instructions: (!instructions.is_empty()).then_some(instructions),
    });
    AgentSettings {
        model,
        system_prompt,
        max_rounds: config.agent.max_rounds,
        options: RequestOptions {
            max_tokens: config.agent.max_tokens,
            temperature: config.agent.temperature,
            timeout: config.network.api_timeout(),
        },
        retry: config.network.retry_policy(),
        parallel_tools: config.agent.parallel_tools,
        show_stats,
    }
}

/// Resolve credentials and assemble a ready-to-run [`Agent`].
///
/// Credentials are read once through `env_lookup`; a missing key fails here,
/// before any session exists.
pub(crate) fn build_agent<FEnv>(
    config: &Config,
    kind: ProviderKind,
    tools: ToolRegistry,
    show_stats: bool,
    sink: Arc<dyn RenderSink>,
    env_lookup: FEnv,
) -> Result<Agent, String>
where
    FEnv: Fn(&str) -> Option<String>,
{
    let resolved = config
        .resolve_provider_with(kind, env_lookup)
        .map_err(|e| e.to_string())?;
    debug!(provider = %kind, model = %resolved.model, base_url = %resolved.settings.base_url, "resolved provider");
    let provider = build_provider(&resolved.settings);
    let settings = agent_settings(config, resolved.model, &tools, show_stats);
    Ok(Agent::new(provider, Arc::new(tools), settings, sink)
        .with_selector(build_selector(config.agent.tool_hints)))
}
