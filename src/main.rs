//! codemate CLI entry point.

mod app;
mod cli;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Env var holding the tracing filter directive.
const LOG_ENV: &str = "CODEMATE_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let args = cli::Args::parse();
    match args.command {
        cli::Command::Chat(chat) => app::chat::run_chat(chat).await,
    }
}

/// Diagnostics go to stderr so they never interleave with assistant output.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
