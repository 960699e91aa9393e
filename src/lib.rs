//! codemate: a terminal coding agent.
//!
//! The crate drives a tool-using conversation with a large language model.
//! An [`agent::Agent`] owns the transcript and usage stats, calls a
//! [`provider::Provider`] (Anthropic or OpenAI), dispatches requested tool
//! calls through a [`tools::ToolRegistry`], and exports the session as JSON.
//!
//! # Quick start
//!
//! ```no_run
//! use codemate::agent::{Agent, AgentSettings};
//! use codemate::config::load_config;
//! use codemate::provider::{build_provider, ProviderKind};
//! use codemate::tools::{files::register_file_tools, ToolRegistry};
//! use codemate::ui::Renderer;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config(None)?;
//! let resolved = config.resolve_provider(ProviderKind::Anthropic)?;
//! let mut tools = ToolRegistry::new();
//! register_file_tools(&mut tools, ".")?;
//! let settings = AgentSettings {
//!     model: resolved.model.clone(),
//!     ..AgentSettings::default()
//! };
//! let mut agent = Agent::new(
//!     build_provider(&resolved.settings),
//!     Arc::new(tools),
//!     settings,
//!     Arc::new(Renderer::new(true, true)),
//! );
//! let outcome = agent.send("What's in this directory?").await?;
//! println!("{}", outcome.text);
//! agent.export("chat_history.json")?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod build_info;
pub mod config;
pub mod conversation;
pub mod error;
pub mod export;
pub mod prompt;
pub mod provider;
pub mod stats;
#[cfg(test)]
pub mod testsupport;
pub mod textutil;
pub mod tools;
pub mod types;
pub mod ui;
