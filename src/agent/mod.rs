//! Core agentic loop.
//!
//! The [`Agent`] drives one conversation: it appends the user's message,
//! calls the provider with the full transcript, executes any requested tools,
//! feeds their results back and repeats until the model produces a final
//! answer, hits its length limit, or the tool-round cap is reached.
//!
//! ```text
//! AwaitingUserInput -> CallingProvider -> (DispatchingTools -> CallingProvider)* -> AwaitingUserInput
//!                                      \-> Failed
//! ```

use crate::conversation::Conversation;
use crate::error::{AgentError, ExportError, ProviderError, ProviderErrorKind};
use crate::export::{generate_conversation_id, ChatTranscript};
use crate::provider::{Provider, ProviderRequest, RequestOptions};
use crate::stats::{StatsRecorder, UsageStats};
use crate::tools::selection::{KeywordSelector, ToolHint, ToolSelector};
use crate::tools::ToolRegistry;
use crate::types::{ProviderResult, StopReason, ToolDefinition};
use crate::ui::RenderSink;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

mod dispatch;
mod retry;

pub use dispatch::CANCELLED_BY_USER_TOOL_RESULT;
pub use retry::RetryPolicy;

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingUserInput,
    CallingProvider,
    DispatchingTools,
    /// The last turn ended with an error; the next `send` starts afresh.
    Failed,
}

/// How a turn ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEnd {
    /// The model produced a final answer.
    Completed,
    /// The model's answer was cut off by `max_tokens`.
    MaxTokens,
    /// The tool-round cap was reached; a notice was appended.
    RoundLimit,
    /// The user interrupted the turn.
    Cancelled,
}

/// Result of one [`Agent::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Final assistant text (or the round-limit notice).
    pub text: String,
    pub end: TurnEnd,
}

/// Static loop configuration.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub model: String,
    pub system_prompt: String,
    /// Maximum provider calls per user turn.
    pub max_rounds: u32,
    pub options: RequestOptions,
    pub retry: RetryPolicy,
    /// Run the calls of one batch concurrently.
    pub parallel_tools: bool,
    /// Render a stats line after every provider call.
    pub show_stats: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            system_prompt: String::new(),
            max_rounds: 10,
            options: RequestOptions::default(),
            retry: RetryPolicy::default(),
            parallel_tools: false,
            show_stats: false,
        }
    }
}

/// The orchestration loop and the session state it owns.
pub struct Agent {
    provider: Box<dyn Provider>,
    tools: Arc<ToolRegistry>,
    selector: Box<dyn ToolSelector>,
    settings: AgentSettings,
    conversation: Conversation,
    stats: StatsRecorder,
    state: LoopState,
    sink: Arc<dyn RenderSink>,
    /// Optional cancellation signal for the in-flight turn.
    cancellation_rx: Option<watch::Receiver<bool>>,
    conversation_id: String,
    model_label: String,
}

impl Agent {
    pub fn new(
        provider: Box<dyn Provider>,
        tools: Arc<ToolRegistry>,
        settings: AgentSettings,
        sink: Arc<dyn RenderSink>,
    ) -> Self {
        let model_label = format!("{}/{}", provider.kind().name(), settings.model);
        Self {
            provider,
            tools,
            selector: Box::new(KeywordSelector::default()),
            settings,
            conversation: Conversation::new(),
            stats: StatsRecorder::new(),
            state: LoopState::AwaitingUserInput,
            sink,
            cancellation_rx: None,
            conversation_id: generate_conversation_id(),
            model_label,
        }
    }

    /// Replace the proactive tool-selection strategy.
    pub fn with_selector(mut self, selector: Box<dyn ToolSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = id.into();
        self
    }

    /// Register a cancellation signal for subsequent turns.
    pub fn set_cancellation_receiver(&mut self, rx: Option<watch::Receiver<bool>>) {
        self.cancellation_rx = rx;
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Copy of the session usage counters.
    pub fn stats(&self) -> UsageStats {
        self.stats.snapshot()
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// `<provider>/<model>` label recorded in exports.
    pub fn model_label(&self) -> &str {
        &self.model_label
    }

    /// Snapshot of the session as an exportable document.
    pub fn transcript(&self) -> ChatTranscript {
        ChatTranscript::new(
            self.conversation_id.clone(),
            self.model_label.clone(),
            self.conversation.clone(),
            self.stats.snapshot(),
        )
    }

    /// Write the transcript to `path`; valid in every state, including `Failed`.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        self.transcript().export(path)
    }

    fn cancellation_requested(&self) -> bool {
        self.cancellation_rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    fn transition(&mut self, next: LoopState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "loop state");
            self.state = next;
        }
    }

    fn fail(&mut self, err: impl Into<AgentError>) -> AgentError {
        self.transition(LoopState::Failed);
        err.into()
    }

    fn finish(&mut self, text: String, end: TurnEnd) -> TurnOutcome {
        self.transition(LoopState::AwaitingUserInput);
        TurnOutcome { text, end }
    }

    /// Run one user turn through the loop.
    ///
    /// Provider failures (after retries) and `Error` stop reasons end the turn
    /// in [`LoopState::Failed`]; the transcript keeps everything appended
    /// before the failed call. Tool failures never fail the turn.
    pub async fn send(&mut self, user_input: &str) -> Result<TurnOutcome, AgentError> {
        self.transition(LoopState::AwaitingUserInput);
        if let Err(err) = self.conversation.push_user(user_input) {
            return Err(self.fail(err));
        }

        let definitions = self.tools.describe_all();
        let hint = self.selector.suggest(user_input, &definitions);
        if let Some(hint) = &hint {
            debug!(tool = %hint.tool_name, reason = %hint.reason, "tool hint");
        }

        let mut round: u32 = 0;
        loop {
            if self.cancellation_requested() {
                return Ok(self.finish(String::new(), TurnEnd::Cancelled));
            }
            round += 1;
            self.transition(LoopState::CallingProvider);

            let outcome = self.call_provider(&definitions, hint.as_ref()).await;
            let (result, elapsed) = match outcome {
                Ok(Some(done)) => done,
                Ok(None) => return Ok(self.finish(String::new(), TurnEnd::Cancelled)),
                Err(err) => {
                    warn!(error = %err, "provider call failed");
                    return Err(self.fail(err));
                }
            };

            let call_stats = self.stats.record(&result, elapsed);
            if self.settings.show_stats {
                self.sink.call_stats(&call_stats);
            }

            let end = match result.effective_stop_reason() {
                StopReason::Error => {
                    return Err(self.fail(ProviderError::new(
                        ProviderErrorKind::Unknown,
                        "provider stopped with an error (refusal or content filter)",
                    )));
                }
                StopReason::EndTurn => Some(TurnEnd::Completed),
                StopReason::MaxTokens => Some(TurnEnd::MaxTokens),
                StopReason::ToolUse => None,
            };
            if let Err(err) = result.check_tool_call_ids() {
                warn!(error = %err, "provider returned unusable tool calls");
                return Err(self.fail(err));
            }

            let text = result.joined_text();
            let tool_calls = result.tool_calls;
            if let Err(err) = self.conversation.push_assistant(text.clone(), tool_calls.clone()) {
                return Err(self.fail(err));
            }
            if !text.is_empty() {
                self.sink.assistant_message(&text);
            }

            if let Some(end) = end {
                if end == TurnEnd::MaxTokens {
                    self.sink
                        .warn("response was cut off by the max_tokens limit");
                }
                return Ok(self.finish(text, end));
            }

            self.transition(LoopState::DispatchingTools);
            info!(round, calls = tool_calls.len(), "dispatching tools");
            let cancel = self.cancellation_rx.as_ref();
            let batch = if self.settings.parallel_tools && tool_calls.len() > 1 {
                dispatch::run_parallel(&self.tools, &tool_calls, self.sink.as_ref(), cancel).await
            } else {
                dispatch::run_sequential(&self.tools, &tool_calls, self.sink.as_ref(), cancel)
                    .await
            };
            for tool_result in batch.results {
                if let Err(err) = self.conversation.push_tool_result(tool_result) {
                    return Err(self.fail(err));
                }
            }
            if batch.cancelled {
                return Ok(self.finish(String::new(), TurnEnd::Cancelled));
            }

            if round >= self.settings.max_rounds {
                let notice = format!(
                    "Stopped after {round} rounds of tool use without a final answer. Send another message to continue."
                );
                warn!(max_rounds = self.settings.max_rounds, "round limit reached");
                if let Err(err) = self.conversation.push_assistant(notice.clone(), Vec::new()) {
                    return Err(self.fail(err));
                }
                self.sink.notice(&notice);
                return Ok(self.finish(notice, TurnEnd::RoundLimit));
            }
        }
    }

    /// Call the provider with retries, racing the user's cancellation.
    ///
    /// Returns `Ok(None)` when cancellation won.
    async fn call_provider(
        &self,
        definitions: &[ToolDefinition],
        hint: Option<&ToolHint>,
    ) -> Result<Option<(ProviderResult, Duration)>, ProviderError> {
        let request = ProviderRequest {
            system: &self.settings.system_prompt,
            turns: self.conversation.turns(),
            tools: definitions,
            model: &self.settings.model,
            options: &self.settings.options,
            hint,
        };
        let timeout = self.settings.options.timeout;
        let cancel = self.cancellation_rx.as_ref();

        let mut attempt: u32 = 0;
        loop {
            info!(model = %self.settings.model, attempt, turns = request.turns.len(), "calling provider");
            let started = Instant::now();
            let call = tokio::time::timeout(timeout, self.provider.send(&request));
            let outcome = match cancel {
                Some(rx) => {
                    let mut rx = rx.clone();
                    tokio::select! {
                        _ = wait_for_cancellation(&mut rx) => return Ok(None),
                        outcome = call => outcome,
                    }
                }
                None => call.await,
            };
            let result = outcome.unwrap_or_else(|_| {
                Err(ProviderError::timeout(format!(
                    "no response within {:.1}s",
                    timeout.as_secs_f64()
                )))
            });

            match result {
                Ok(result) => return Ok(Some((result, started.elapsed()))),
                Err(err) if self.settings.retry.should_retry(&err, attempt) => {
                    let delay = self.settings.retry.retry_delay_for(attempt, &err);
                    warn!(error = %err, attempt, delay_ms = delay.as_millis() as u64, "retrying provider call");
                    self.sink.warn(&format!(
                        "{err}; retrying in {:.1}s",
                        delay.as_secs_f64()
                    ));
                    attempt = attempt.saturating_add(1);
                    if dispatch::sleep_or_cancel(delay, cancel).await {
                        return Ok(None);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Wait for cancellation signal state change (or return immediately if set).
async fn wait_for_cancellation(cancel_rx: &mut watch::Receiver<bool>) {
    if *cancel_rx.borrow() {
        return;
    }
    while cancel_rx.changed().await.is_ok() {
        if *cancel_rx.borrow() {
            return;
        }
    }
    // Sender dropped without cancelling: never resolve.
    std::future::pending::<()>().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::provider::ProviderKind;
    use crate::tools::selection::NoSelector;
    use crate::tools::Tool;
    use crate::types::{TokenUsage, ToolArguments, ToolCall, ToolResult, Turn};
    use crate::ui::SilentRenderer;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type Scripted = Result<ProviderResult, ProviderError>;

    /// Provider that replays scripted outcomes and records each request.
    struct MockProvider {
        script: Mutex<VecDeque<Scripted>>,
        seen_turns: Mutex<Vec<usize>>,
        seen_systems: Mutex<Vec<String>>,
        delay: Duration,
    }

    impl MockProvider {
        fn new(script: Vec<Scripted>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                seen_turns: Mutex::new(Vec::new()),
                seen_systems: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl Provider for Arc<MockProvider> {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Anthropic
        }

        async fn send(&self, request: &ProviderRequest<'_>) -> Result<ProviderResult, ProviderError> {
            self.seen_turns.lock().unwrap().push(request.turns.len());
            self.seen_systems.lock().unwrap().push(request.system_prompt());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ProviderResult::text("fallback", usage())))
        }
    }

    struct ListDir;

    #[async_trait]
    impl Tool for ListDir {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "list_dir".into(),
                description: "List files in a directory".into(),
                parameters: json!({
                    "type": "object",
                    "properties": {"path": {"type": "string"}},
                    "required": ["path"]
                }),
            }
        }

        async fn execute(&self, _arguments: &ToolArguments) -> Result<String, ToolError> {
            Ok("[\"a.py\", \"b.py\"]".into())
        }
    }

    struct Broken;

    #[async_trait]
    impl Tool for Broken {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "broken".into(),
                description: "always fails".into(),
                parameters: json!({"type": "object", "properties": {}}),
            }
        }

        async fn execute(&self, _arguments: &ToolArguments) -> Result<String, ToolError> {
            Err(ToolError::ExecutionFailed("disk on fire".into()))
        }
    }

    fn usage() -> TokenUsage {
        TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
        }
    }

    fn call(id: &str, name: &str) -> ToolCall {
        let args = json!({"path": "."}).as_object().cloned().unwrap();
        ToolCall::new(id, name, args)
    }

    fn agent_with(provider: Arc<MockProvider>, settings: AgentSettings) -> Agent {
        let mut tools = ToolRegistry::new();
        tools.register(ListDir).unwrap();
        tools.register(Broken).unwrap();
        Agent::new(
            Box::new(provider),
            Arc::new(tools),
            AgentSettings {
                model: "test-model".into(),
                retry: RetryPolicy {
                    max_attempts: 2,
                    initial_backoff: Duration::from_millis(1),
                    max_backoff: Duration::from_millis(2),
                },
                ..settings
            },
            Arc::new(SilentRenderer),
        )
        .with_selector(Box::new(NoSelector))
    }

    #[tokio::test]
    async fn plain_answer_completes_turn() {
        let provider = Arc::new(MockProvider::new(vec![Ok(ProviderResult::text(
            "Paris.",
            usage(),
        ))]));
        let mut agent = agent_with(provider, AgentSettings::default());
        let outcome = agent.send("capital of France?").await.unwrap();
        assert_eq!(outcome.text, "Paris.");
        assert_eq!(outcome.end, TurnEnd::Completed);
        assert_eq!(agent.state(), LoopState::AwaitingUserInput);
        assert_eq!(agent.conversation().len(), 2);
        assert_eq!(agent.stats().call_count, 1);
        assert_eq!(agent.model_label(), "anthropic/test-model");
    }

    #[tokio::test]
    async fn tool_round_feeds_results_back() {
        let provider = Arc::new(MockProvider::new(vec![
            Ok(ProviderResult::tool_use(vec![call("c1", "list_dir")], usage())),
            Ok(ProviderResult::text("Found 2 files: a.py, b.py", usage())),
        ]));
        let mut agent = agent_with(Arc::clone(&provider), AgentSettings::default());
        let outcome = agent.send("list files in .").await.unwrap();
        assert_eq!(outcome.text, "Found 2 files: a.py, b.py");

        let turns = agent.conversation().turns();
        assert_eq!(turns.len(), 4);
        assert!(matches!(&turns[2], Turn::ToolResult(r) if r.call_id == "c1" && !r.is_error));
        assert_eq!(*provider.seen_turns.lock().unwrap(), vec![1, 3]);
        assert_eq!(agent.stats().call_count, 2);
        assert_eq!(agent.stats().input_tokens, 20);
    }

    #[tokio::test]
    async fn tool_failures_stay_in_conversation() {
        let provider = Arc::new(MockProvider::new(vec![
            Ok(ProviderResult::tool_use(
                vec![call("c1", "broken"), call("c2", "nope")],
                usage(),
            )),
            Ok(ProviderResult::text("Sorry, that failed.", usage())),
        ]));
        let mut agent = agent_with(provider, AgentSettings::default());
        let outcome = agent.send("do it").await.unwrap();
        assert_eq!(outcome.end, TurnEnd::Completed);

        let turns = agent.conversation().turns();
        let Turn::ToolResult(first) = &turns[2] else {
            panic!("expected tool result");
        };
        assert!(first.is_error);
        assert!(first.output.contains("ToolExecutionError"));
        let Turn::ToolResult(second) = &turns[3] else {
            panic!("expected tool result");
        };
        assert!(second.is_error);
        assert!(second.output.contains("UnknownToolError"));
    }

    #[tokio::test]
    async fn round_cap_appends_notice() {
        let script = (0..5)
            .map(|i| Ok(ProviderResult::tool_use(vec![call(&format!("c{i}"), "list_dir")], usage())))
            .collect();
        let provider = Arc::new(MockProvider::new(script));
        let mut agent = agent_with(
            provider,
            AgentSettings {
                max_rounds: 3,
                ..AgentSettings::default()
            },
        );
        let outcome = agent.send("loop forever").await.unwrap();
        assert_eq!(outcome.end, TurnEnd::RoundLimit);
        assert_eq!(agent.stats().call_count, 3);
        assert!(agent.conversation().pending_call_ids().is_empty());
        let last = agent.conversation().turns().last().unwrap();
        assert!(matches!(last, Turn::Assistant { text, tool_calls } if text.contains("Stopped after 3 rounds") && tool_calls.is_empty()));
    }

    #[tokio::test]
    async fn auth_error_fails_without_retry() {
        let provider = Arc::new(MockProvider::new(vec![Err(ProviderError::auth("bad key"))]));
        let mut agent = agent_with(Arc::clone(&provider), AgentSettings::default());
        let err = agent.send("hi").await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(agent.state(), LoopState::Failed);
        assert_eq!(provider.seen_turns.lock().unwrap().len(), 1);
        assert_eq!(agent.conversation().len(), 1);
        assert_eq!(agent.stats().call_count, 0);
    }

    #[tokio::test]
    async fn rate_limit_is_retried() {
        let provider = Arc::new(MockProvider::new(vec![
            Err(ProviderError::new(ProviderErrorKind::RateLimit, "429")),
            Ok(ProviderResult::text("ok", usage())),
        ]));
        let mut agent = agent_with(Arc::clone(&provider), AgentSettings::default());
        let outcome = agent.send("hi").await.unwrap();
        assert_eq!(outcome.text, "ok");
        assert_eq!(provider.seen_turns.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn error_stop_reason_fails_turn_but_records_usage() {
        let mut refused = ProviderResult::text("", usage());
        refused.stop_reason = StopReason::Error;
        let provider = Arc::new(MockProvider::new(vec![Ok(refused)]));
        let mut agent = agent_with(provider, AgentSettings::default());
        let err = agent.send("something").await.unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(agent.state(), LoopState::Failed);
        assert_eq!(agent.conversation().len(), 1);
        assert_eq!(agent.stats().call_count, 1);

        // The session stays usable after a failed turn.
        let outcome = agent.send("again").await.unwrap();
        assert_eq!(outcome.text, "fallback");
        assert_eq!(agent.state(), LoopState::AwaitingUserInput);
    }

    #[tokio::test]
    async fn max_tokens_ends_turn() {
        let mut cut = ProviderResult::text("partial", usage());
        cut.stop_reason = StopReason::MaxTokens;
        let provider = Arc::new(MockProvider::new(vec![Ok(cut)]));
        let mut agent = agent_with(provider, AgentSettings::default());
        let outcome = agent.send("long essay").await.unwrap();
        assert_eq!(outcome.end, TurnEnd::MaxTokens);
        assert_eq!(outcome.text, "partial");
    }

    #[tokio::test]
    async fn cancellation_before_call_leaves_user_turn() {
        let provider = Arc::new(MockProvider::new(Vec::new()));
        let mut agent = agent_with(Arc::clone(&provider), AgentSettings::default());
        let (_tx, rx) = watch::channel(true);
        agent.set_cancellation_receiver(Some(rx));
        let outcome = agent.send("hi").await.unwrap();
        assert_eq!(outcome.end, TurnEnd::Cancelled);
        assert_eq!(agent.state(), LoopState::AwaitingUserInput);
        assert!(provider.seen_turns.lock().unwrap().is_empty());
        assert_eq!(agent.conversation().len(), 1);
    }

    #[tokio::test]
    async fn cancellation_while_waiting_on_provider() {
        let mut mock = MockProvider::new(vec![Ok(ProviderResult::text("late", usage()))]);
        mock.delay = Duration::from_secs(30);
        let mut agent = agent_with(Arc::new(mock), AgentSettings::default());
        let (tx, rx) = watch::channel(false);
        agent.set_cancellation_receiver(Some(rx));
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(true);
        });
        let outcome = agent.send("hi").await.unwrap();
        assert_eq!(outcome.end, TurnEnd::Cancelled);
        assert_eq!(agent.stats().call_count, 0);
    }

    #[tokio::test]
    async fn loop_timeout_surfaces_as_timeout_error() {
        let mut mock = MockProvider::new(Vec::new());
        mock.delay = Duration::from_secs(30);
        let mut agent = agent_with(
            Arc::new(mock),
            AgentSettings {
                options: RequestOptions {
                    timeout: Duration::from_millis(20),
                    ..RequestOptions::default()
                },
                ..AgentSettings::default()
            },
        );
        let err = agent.send("hi").await.unwrap_err();
        assert!(matches!(err, AgentError::Provider(ref e) if e.kind == ProviderErrorKind::Timeout));
        assert_eq!(agent.state(), LoopState::Failed);
    }

    #[tokio::test]
    async fn parallel_dispatch_keeps_invariant() {
        let provider = Arc::new(MockProvider::new(vec![
            Ok(ProviderResult::tool_use(
                vec![call("a", "list_dir"), call("b", "broken"), call("c", "list_dir")],
                usage(),
            )),
            Ok(ProviderResult::text("done", usage())),
        ]));
        let mut agent = agent_with(
            provider,
            AgentSettings {
                parallel_tools: true,
                ..AgentSettings::default()
            },
        );
        agent.send("go").await.unwrap();
        let ids = agent
            .conversation()
            .turns()
            .iter()
            .filter_map(|t| match t {
                Turn::ToolResult(ToolResult { call_id, .. }) => Some(call_id.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn keyword_hint_reaches_provider() {
        let provider = Arc::new(MockProvider::new(vec![Ok(ProviderResult::text("ok", usage()))]));
        let mut agent = agent_with(Arc::clone(&provider), AgentSettings::default())
            .with_selector(Box::new(KeywordSelector::default()));
        agent.send("list dir please").await.unwrap();
        let systems = provider.seen_systems.lock().unwrap();
        assert!(systems[0].contains("`list_dir`"), "got: {}", systems[0]);
    }

    #[tokio::test]
    async fn transcript_carries_identity_and_stats() {
        let provider = Arc::new(MockProvider::new(vec![Ok(ProviderResult::text("hey", usage()))]));
        let mut agent =
            agent_with(provider, AgentSettings::default()).with_conversation_id("abcd-ef01-2345-6789");
        agent.send("hello").await.unwrap();
        let transcript = agent.transcript();
        assert_eq!(transcript.conversation_id, "abcd-ef01-2345-6789");
        assert_eq!(transcript.model, "anthropic/test-model");
        assert_eq!(transcript.stats.output_tokens, 5);
        assert_eq!(transcript.turns.len(), 2);
    }
}
