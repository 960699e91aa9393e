//! Session usage accounting.
//!
//! Tracks exact counts from each provider call's usage report plus wall-clock
//! latency. Only the orchestration loop records into the tracker; everyone else
//! reads copies via [`StatsRecorder::snapshot`].

use crate::types::ProviderResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Monotonic per-session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    /// Running total of input (prompt) tokens sent.
    pub input_tokens: u64,
    /// Running total of output (completion) tokens received.
    pub output_tokens: u64,
    /// Number of successful provider calls.
    pub call_count: u64,
    /// Cumulative provider latency in milliseconds.
    pub elapsed_ms: u64,
}

impl UsageStats {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}

/// Figures for the most recent provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallStats {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub elapsed: Duration,
}

impl CallStats {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Accumulates usage across the session.
#[derive(Debug, Clone, Default)]
pub struct StatsRecorder {
    totals: UsageStats,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successful provider call.
    pub fn record(&mut self, result: &ProviderResult, elapsed: Duration) -> CallStats {
        let call = CallStats {
            input_tokens: result.usage.input_tokens,
            output_tokens: result.usage.output_tokens,
            elapsed,
        };
        self.totals.input_tokens = self.totals.input_tokens.saturating_add(call.input_tokens);
        self.totals.output_tokens = self.totals.output_tokens.saturating_add(call.output_tokens);
        self.totals.call_count = self.totals.call_count.saturating_add(1);
        let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.totals.elapsed_ms = self.totals.elapsed_ms.saturating_add(millis);
        call
    }

    pub fn snapshot(&self) -> UsageStats {
        self.totals
    }
}
