//! Tool batch execution.
//!
//! Every call of a batch yields exactly one [`ToolResult`], in issue order.
//! Failures become error results; calls skipped because of cancellation get a
//! synthetic cancelled result so the transcript stays well-formed.

use super::wait_for_cancellation;
use crate::error::ToolError;
use crate::tools::ToolRegistry;
use crate::types::{ToolCall, ToolResult};
use crate::ui::RenderSink;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Tool-result text for calls that never ran because the user cancelled.
pub const CANCELLED_BY_USER_TOOL_RESULT: &str = "operation cancelled by user";

/// Results of one dispatch batch.
#[derive(Debug)]
pub(super) struct BatchOutcome {
    pub(super) results: Vec<ToolResult>,
    pub(super) cancelled: bool,
}

/// Wrap a registry outcome into a transcript result.
pub(super) fn to_tool_result(call_id: &str, outcome: Result<String, ToolError>) -> ToolResult {
    match outcome {
        Ok(output) => ToolResult::success(call_id, output),
        Err(err) => ToolResult::failure(call_id, err.to_string()),
    }
}

fn cancelled_result(call: &ToolCall) -> ToolResult {
    ToolResult::failure(&call.id, CANCELLED_BY_USER_TOOL_RESULT)
}

fn is_cancelled(cancel: Option<&watch::Receiver<bool>>) -> bool {
    cancel.is_some_and(|rx| *rx.borrow())
}

fn log_outcome(call: &ToolCall, result: &ToolResult) {
    if result.is_error {
        warn!(tool = %call.name, call_id = %call.id, error = %result.output, "tool call failed");
    } else {
        info!(tool = %call.name, call_id = %call.id, bytes = result.output.len(), "tool call finished");
    }
}

/// Run calls one after another, checking for cancellation between calls.
pub(super) async fn run_sequential(
    tools: &ToolRegistry,
    calls: &[ToolCall],
    sink: &dyn RenderSink,
    cancel: Option<&watch::Receiver<bool>>,
) -> BatchOutcome {
    let mut results = Vec::with_capacity(calls.len());
    let mut cancelled = false;
    for call in calls {
        if cancelled || is_cancelled(cancel) {
            cancelled = true;
            results.push(cancelled_result(call));
            continue;
        }
        sink.tool_call(&call.name, &call.arguments_json());
        let result = to_tool_result(&call.id, tools.invoke(&call.name, &call.arguments).await);
        log_outcome(call, &result);
        sink.tool_result(&result.output, result.is_error);
        results.push(result);
    }
    BatchOutcome { results, cancelled }
}

/// Run all calls concurrently and reassemble results in issue order.
///
/// Cancellation is checked once before the batch starts; a started batch runs
/// to completion.
pub(super) async fn run_parallel(
    tools: &Arc<ToolRegistry>,
    calls: &[ToolCall],
    sink: &dyn RenderSink,
    cancel: Option<&watch::Receiver<bool>>,
) -> BatchOutcome {
    if is_cancelled(cancel) {
        return BatchOutcome {
            results: calls.iter().map(cancelled_result).collect(),
            cancelled: true,
        };
    }

    let handles = calls
        .iter()
        .map(|call| {
            sink.tool_call(&call.name, &call.arguments_json());
            let tools = Arc::clone(tools);
            let call = call.clone();
            tokio::spawn(async move { tools.invoke(&call.name, &call.arguments).await })
        })
        .collect::<Vec<_>>();

    let mut results = Vec::with_capacity(calls.len());
    for (call, handle) in calls.iter().zip(handles) {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => Err(ToolError::ExecutionFailed(format!(
                "{}: tool task aborted: {join_err}",
                call.name
            ))),
        };
        let result = to_tool_result(&call.id, outcome);
        log_outcome(call, &result);
        sink.tool_result(&result.output, result.is_error);
        results.push(result);
    }
    BatchOutcome {
        results,
        cancelled: false,
    }
}

/// Wait until cancellation is requested or `delay` elapses; true on cancel.
pub(super) async fn sleep_or_cancel(
    delay: std::time::Duration,
    cancel: Option<&watch::Receiver<bool>>,
) -> bool {
    match cancel {
        Some(rx) => {
            let mut rx = rx.clone();
            tokio::select! {
                _ = wait_for_cancellation(&mut rx) => true,
                _ = tokio::time::sleep(delay) => false,
            }
        }
        None => {
            tokio::time::sleep(delay).await;
            false
        }
    }
}
