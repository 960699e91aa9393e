//! CLI argument parsing via clap.

use clap::{Parser, Subcommand};
use codemate::export::DEFAULT_OUTPUT_PATH;
use codemate::provider::ProviderKind;
use std::path::PathBuf;

/// A terminal coding agent backed by Anthropic or OpenAI models.
#[derive(Debug, Parser)]
#[command(name = "codemate", version = codemate::build_info::VERSION, long_version = long_version())]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an interactive chat session.
    Chat(ChatArgs),
}

#[derive(Debug, Clone, clap::Args)]
pub struct ChatArgs {
    /// Model backend (default: `agent.provider` from config, else anthropic).
    #[arg(short = 'p', long = "provider", value_enum)]
    pub provider: Option<ProviderKind>,

    /// Override the model name.
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Show a stats line after every model call and a summary at exit.
    #[arg(long = "stats")]
    pub stats: bool,

    /// Transcript export path, rewritten after every turn.
    #[arg(short = 'o', long = "output", default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Path to config file (default: ./codemate.toml or the global config dir).
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Override the tool-round cap per user message.
    #[arg(long = "max-rounds", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_rounds: Option<u32>,

    /// Disable color output.
    #[arg(long = "no-color")]
    pub no_color: bool,
}

fn long_version() -> &'static str {
    // clap wants a 'static str; the text is built once per process.
    Box::leak(codemate::build_info::cli_version_text().into_boxed_str())
}
