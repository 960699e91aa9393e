//! Rendering contract and the default terminal renderer.
//!
//! `RenderSink` is the UI contract consumed by the orchestration loop and the
//! chat surface. Assistant text goes to stdout; prompts, tool traces, stats and
//! diagnostics go to stderr so redirected output stays clean.

use crate::stats::{CallStats, UsageStats};
use crate::textutil::single_line_preview;
use crossterm::style::Stylize;

const LABEL_USER: &str = "You";
const LABEL_AGENT: &str = "Agent";
const LABEL_TOOL: &str = "Tool";
const LABEL_STATS: &str = "Stats";
const LABEL_WARNING: &str = "warning:";
const LABEL_ERROR: &str = "error:";
const STATS_RULE_WIDTH: usize = 50;

/// Injectable rendering interface used by orchestration code.
///
/// [`Renderer`] is the terminal implementation; tests substitute recording or
/// silent sinks.
pub trait RenderSink: Send + Sync {
    /// Render the interactive input prompt.
    fn prompt(&self);
    /// Render a session banner line.
    fn header(&self, model: &str, conversation_id: &str);
    /// Render one assistant message.
    fn assistant_message(&self, content: &str);
    /// Render a tool invocation as `name(args)`.
    fn tool_call(&self, name: &str, args: &str);
    /// Render a tool result summary.
    fn tool_result(&self, output: &str, is_error: bool);
    /// Render the per-call stats line.
    fn call_stats(&self, stats: &CallStats);
    /// Render the end-of-session stats block.
    fn final_stats(&self, stats: &UsageStats);
    /// Render an informational line.
    fn notice(&self, msg: &str);
    /// Render a warning line.
    fn warn(&self, msg: &str);
    /// Render an error line.
    fn error(&self, msg: &str);
}

/// Handles terminal output formatting.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    /// Whether ANSI color/style output is enabled.
    color: bool,
    /// Whether tool calls and results are traced.
    show_tool_calls: bool,
}

impl Renderer {
    pub fn new(color: bool, show_tool_calls: bool) -> Self {
        Self {
            color,
            show_tool_calls,
        }
    }
}

impl RenderSink for Renderer {
    fn prompt(&self) {
        if self.color {
            eprint!("{}: ", LABEL_USER.blue().bold());
        } else {
            eprint!("{LABEL_USER}: ");
        }
    }

    fn header(&self, model: &str, conversation_id: &str) {
        let line = format!("model {model} | conversation {conversation_id}");
        if self.color {
            eprintln!("{}", line.dark_grey());
        } else {
            eprintln!("{line}");
        }
        eprintln!("Chat with the agent (/quit or Ctrl-D to exit).");
    }

    fn assistant_message(&self, content: &str) {
        if self.color {
            println!("{}: {content}", LABEL_AGENT.yellow().bold());
        } else {
            println!("{LABEL_AGENT}: {content}");
        }
    }

    fn tool_call(&self, name: &str, args: &str) {
        if !self.show_tool_calls {
            return;
        }
        let preview = single_line_preview(args, 80);
        if self.color {
            eprintln!("{}: {}({preview})", LABEL_TOOL.green().bold(), name.bold());
        } else {
            eprintln!("{LABEL_TOOL}: {name}({preview})");
        }
    }

    fn tool_result(&self, output: &str, is_error: bool) {
        if !self.show_tool_calls {
            return;
        }
        let preview = single_line_preview(output, 120);
        match (self.color, is_error) {
            (true, true) => eprintln!("  {} {}", "->".dark_grey(), preview.red()),
            (true, false) => eprintln!("  {} {}", "->".dark_grey(), preview.dark_grey()),
            (false, _) => eprintln!("  -> {preview}"),
        }
    }

    fn call_stats(&self, stats: &CallStats) {
        let line = format_call_stats(stats);
        if self.color {
            eprintln!("{}: {line}", LABEL_STATS.magenta().bold());
        } else {
            eprintln!("{LABEL_STATS}: {line}");
        }
    }

    fn final_stats(&self, stats: &UsageStats) {
        let rule = "-".repeat(STATS_RULE_WIDTH);
        eprintln!("\n{rule}");
        if self.color {
            eprintln!("{}:", "Final Stats".magenta().bold());
        } else {
            eprintln!("Final Stats:");
        }
        for line in format_final_stats(stats) {
            eprintln!("{line}");
        }
        eprintln!("{rule}");
    }

    fn notice(&self, msg: &str) {
        if self.color {
            eprintln!("{}", msg.dark_grey());
        } else {
            eprintln!("{msg}");
        }
    }

    fn warn(&self, msg: &str) {
        if self.color {
            eprintln!("{} {msg}", LABEL_WARNING.yellow().bold());
        } else {
            eprintln!("{LABEL_WARNING} {msg}");
        }
    }

    fn error(&self, msg: &str) {
        if self.color {
            eprintln!("{} {msg}", LABEL_ERROR.red().bold());
        } else {
            eprintln!("{LABEL_ERROR} {msg}");
        }
    }
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentRenderer;

impl RenderSink for SilentRenderer {
    fn prompt(&self) {}
    fn header(&self, _model: &str, _conversation_id: &str) {}
    fn assistant_message(&self, _content: &str) {}
    fn tool_call(&self, _name: &str, _args: &str) {}
    fn tool_result(&self, _output: &str, _is_error: bool) {}
    fn call_stats(&self, _stats: &CallStats) {}
    fn final_stats(&self, _stats: &UsageStats) {}
    fn notice(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

/// `Time: 0.93s, Tokens: 52 (In: 40, Out: 12)`
pub fn format_call_stats(stats: &CallStats) -> String {
    format!(
        "Time: {:.2}s, Tokens: {} (In: {}, Out: {})",
        stats.elapsed.as_secs_f64(),
        stats.total_tokens(),
        stats.input_tokens,
        stats.output_tokens
    )
}

/// Body lines of the end-of-session summary.
pub fn format_final_stats(stats: &UsageStats) -> Vec<String> {
    vec![
        format!("Total time: {:.2}s", stats.elapsed().as_secs_f64()),
        format!("Model calls: {}", stats.call_count),
        format!("Total tokens: {}", stats.total_tokens()),
        format!("  - Input tokens: {}", stats.input_tokens),
        format!("  - Output tokens: {}", stats.output_tokens),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn call_stats_line_has_totals_and_split() {
        let line = format_call_stats(&CallStats {
            input_tokens: 40,
            output_tokens: 12,
            elapsed: Duration::from_millis(930),
        });
        assert_eq!(line, "Time: 0.93s, Tokens: 52 (In: 40, Out: 12)");
    }

    #[test]
    fn final_stats_lists_every_counter() {
        let lines = format_final_stats(&UsageStats {
            input_tokens: 100,
            output_tokens: 20,
            call_count: 3,
            elapsed_ms: 2_500,
        });
        assert_eq!(lines[0], "Total time: 2.50s");
        assert_eq!(lines[1], "Model calls: 3");
        assert_eq!(lines[2], "Total tokens: 120");
        assert!(lines[3].ends_with("100"));
        assert!(lines[4].ends_with("20"));
    }

    #[test]
    fn renderer_is_object_safe_sink() {
        let sinks: Vec<Box<dyn RenderSink>> = vec![
            Box::new(Renderer::new(false, false)),
            Box::new(SilentRenderer),
        ];
        for sink in &sinks {
            sink.tool_call("list_files", "{}");
            sink.tool_result("[]", false);
        }
    }
}
