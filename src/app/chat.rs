//! Interactive `chat` command.

use crate::app::startup::{apply_cli_overrides, build_agent, build_registry, selected_provider};
use crate::cli::ChatArgs;
use codemate::agent::{Agent, TurnEnd};
use codemate::build_info::startup_metadata_line;
use codemate::config::load_config_with_source;
use codemate::ui::{RenderSink, Renderer};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info};

/// Commands that end the session when typed at the prompt.
const QUIT_COMMANDS: &[&str] = &["/quit", "/exit"];

/// What the prompt loop should do with one input line.
#[derive(Debug, PartialEq, Eq)]
enum LineAction<'a> {
    Skip,
    Quit,
    Send(&'a str),
}

fn classify_line(line: &str) -> LineAction<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineAction::Skip
    } else if QUIT_COMMANDS.contains(&trimmed) {
        LineAction::Quit
    } else {
        LineAction::Send(trimmed)
    }
}

/// Run the chat command to completion and report the process exit code.
pub(crate) async fn run_chat(args: ChatArgs) -> ExitCode {
    let loaded = match load_config_with_source(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            Renderer::new(!args.no_color, false).error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };
    debug!(source = ?loaded.source, "loaded config");
    let mut config = loaded.config;
    apply_cli_overrides(&mut config, &args);

    let sink: Arc<dyn RenderSink> = Arc::new(Renderer::new(
        config.display.color,
        config.display.show_tool_calls,
    ));
    let root = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            sink.error(&format!("cannot determine working directory: {e}"));
            return ExitCode::FAILURE;
        }
    };
    let agent = build_registry(root).and_then(|tools| {
        build_agent(
            &config,
            selected_provider(&config, &args),
            tools,
            args.stats,
            Arc::clone(&sink),
            |name| std::env::var(name).ok(),
        )
    });
    let mut agent = match agent {
        Ok(agent) => agent,
        Err(msg) => {
            sink.error(&msg);
            return ExitCode::FAILURE;
        }
    };

    sink.notice(&startup_metadata_line());
    sink.header(agent.model_label(), agent.conversation_id());

    let exit = prompt_loop(&mut agent, sink.as_ref(), &args.output).await;

    export_transcript(&agent, sink.as_ref(), &args.output);
    if args.stats {
        sink.final_stats(&agent.stats());
    }
    exit
}

async fn prompt_loop(agent: &mut Agent, sink: &dyn RenderSink, output: &Path) -> ExitCode {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        sink.prompt();
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                return ExitCode::SUCCESS;
            }
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                eprintln!();
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                sink.error(&format!("failed to read input: {e}"));
                return ExitCode::FAILURE;
            }
        };
        let input = match classify_line(&line) {
            LineAction::Skip => continue,
            LineAction::Quit => return ExitCode::SUCCESS,
            LineAction::Send(input) => input,
        };

        let (cancel_tx, cancel_rx) = watch::channel(false);
        agent.set_cancellation_receiver(Some(cancel_rx));
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = cancel_tx.send(true);
            }
        });
        let outcome = agent.send(input).await;
        interrupt.abort();
        agent.set_cancellation_receiver(None);

        match outcome {
            Ok(outcome) => {
                info!(end = ?outcome.end, "turn finished");
                if outcome.end == TurnEnd::Cancelled {
                    sink.notice("(cancelled)");
                }
            }
            Err(e) if e.is_fatal() => {
                sink.error(&e.to_string());
                return ExitCode::FAILURE;
            }
            Err(e) => sink.error(&e.to_string()),
        }
        export_transcript(agent, sink, output);
    }
}

/// Best-effort export; failures are reported but never end the session.
fn export_transcript(agent: &Agent, sink: &dyn RenderSink, output: &Path) {
    if let Err(e) = agent.export(output) {
        sink.warn(&format!("failed to export transcript to {}: {e}", output.display()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(classify_line(""), LineAction::Skip);
        assert_eq!(classify_line("   \t"), LineAction::Skip);
    }

    #[test]
    fn quit_commands_end_session() {
        assert_eq!(classify_line("/quit"), LineAction::Quit);
        assert_eq!(classify_line("  /exit "), LineAction::Quit);
    }

    #[test]
    fn other_lines_are_sent_trimmed() {
        assert_eq!(classify_line("  list files \n"), LineAction::Send("list files"));
        assert_eq!(classify_line("/quitting"), LineAction::Send("/quitting"));
    }
}
