//! Append-only conversation transcript.
//!
//! [`Conversation`] is the single source of truth sent to the provider on
//! every call. Appends are validated so the transcript always satisfies the
//! tool-call protocol: an assistant turn that issues tool calls is followed by
//! exactly one result per call id before any other user or assistant turn.

use crate::error::ProtocolError;
use crate::types::{ToolCall, ToolResult, Turn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Ordered transcript of user, assistant and tool-result turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Turn>", into = "Vec<Turn>")]
pub struct Conversation {
    turns: Vec<Turn>,
    /// Call ids of the latest assistant turn still awaiting a result.
    pending: Vec<String>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a conversation by replaying `turns` through the validating appends.
    pub fn from_turns(turns: Vec<Turn>) -> Result<Self, ProtocolError> {
        let mut conversation = Self::new();
        for turn in turns {
            conversation.push(turn)?;
        }
        Ok(conversation)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Call ids issued by the latest assistant turn that have no result yet.
    pub fn pending_call_ids(&self) -> &[String] {
        &self.pending
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> Result<(), ProtocolError> {
        self.push(Turn::user(text))
    }

    pub fn push_assistant(
        &mut self,
        text: impl Into<String>,
        tool_calls: Vec<ToolCall>,
    ) -> Result<(), ProtocolError> {
        self.push(Turn::assistant(text, tool_calls))
    }

    pub fn push_tool_result(&mut self, result: ToolResult) -> Result<(), ProtocolError> {
        self.push(Turn::ToolResult(result))
    }

    /// Append one turn after checking it against the protocol invariant.
    pub fn push(&mut self, turn: Turn) -> Result<(), ProtocolError> {
        match &turn {
            Turn::User { .. } => self.ensure_no_pending()?,
            Turn::Assistant { tool_calls, .. } => {
                self.ensure_no_pending()?;
                let mut seen = BTreeSet::new();
                for call in tool_calls {
                    if !seen.insert(call.id.as_str()) {
                        return Err(ProtocolError::DuplicateCallId(call.id.clone()));
                    }
                }
                self.pending = tool_calls.iter().map(|call| call.id.clone()).collect();
            }
            Turn::ToolResult(result) => {
                let Some(idx) = self.pending.iter().position(|id| *id == result.call_id) else {
                    return Err(if self.already_answered(&result.call_id) {
                        ProtocolError::DuplicateToolResult(result.call_id.clone())
                    } else {
                        ProtocolError::UnmatchedToolResult(result.call_id.clone())
                    });
                };
                self.pending.remove(idx);
            }
        }
        self.turns.push(turn);
        Ok(())
    }

    fn ensure_no_pending(&self) -> Result<(), ProtocolError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::PendingToolResults(self.pending.clone()))
        }
    }

    /// True when `call_id` already has a result after the latest assistant turn.
    fn already_answered(&self, call_id: &str) -> bool {
        self.turns
            .iter()
            .rev()
            .take_while(|turn| !matches!(turn, Turn::Assistant { .. } | Turn::User { .. }))
            .any(|turn| matches!(turn, Turn::ToolResult(r) if r.call_id == call_id))
    }
}

impl TryFrom<Vec<Turn>> for Conversation {
    type Error = ProtocolError;

    fn try_from(turns: Vec<Turn>) -> Result<Self, Self::Error> {
        Self::from_turns(turns)
    }
}

impl From<Conversation> for Vec<Turn> {
    fn from(conversation: Conversation) -> Self {
        conversation.turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolArguments;

    fn call(id: &str) -> ToolCall {
        ToolCall::new(id, "list_files", ToolArguments::new())
    }

    #[test]
    fn results_may_arrive_in_any_order() {
        let mut c = Conversation::new();
        c.push_user("hi").unwrap();
        c.push_assistant("", vec![call("a"), call("b")]).unwrap();
        assert_eq!(c.pending_call_ids(), ["a".to_string(), "b".to_string()]);
        c.push_tool_result(ToolResult::success("b", "ok")).unwrap();
        c.push_tool_result(ToolResult::success("a", "ok")).unwrap();
        assert!(c.pending_call_ids().is_empty());
        c.push_assistant("done", Vec::new()).unwrap();
        assert_eq!(c.len(), 5);
    }

    #[test]
    fn user_turn_rejected_while_results_pending() {
        let mut c = Conversation::new();
        c.push_user("hi").unwrap();
        c.push_assistant("", vec![call("a")]).unwrap();
        let err = c.push_user("again").unwrap_err();
        assert_eq!(err, ProtocolError::PendingToolResults(vec!["a".into()]));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn unmatched_and_duplicate_results_are_rejected() {
        let mut c = Conversation::new();
        c.push_user("hi").unwrap();
        c.push_assistant("", vec![call("a")]).unwrap();
        assert_eq!(
            c.push_tool_result(ToolResult::success("zzz", "")).unwrap_err(),
            ProtocolError::UnmatchedToolResult("zzz".into())
        );
        c.push_tool_result(ToolResult::success("a", "")).unwrap();
        assert_eq!(
            c.push_tool_result(ToolResult::success("a", "")).unwrap_err(),
            ProtocolError::DuplicateToolResult("a".into())
        );
    }

    #[test]
    fn duplicate_call_ids_in_one_turn_are_rejected() {
        let mut c = Conversation::new();
        c.push_user("hi").unwrap();
        let err = c.push_assistant("", vec![call("a"), call("a")]).unwrap_err();
        assert_eq!(err, ProtocolError::DuplicateCallId("a".into()));
    }

    #[test]
    fn deserialize_validates_protocol() {
        let raw = r#"[
            {"role": "user", "text": "hi"},
            {"role": "tool_result", "call_id": "ghost", "output": "x", "is_error": false}
        ]"#;
        let err = serde_json::from_str::<Conversation>(raw).unwrap_err();
        assert!(err.to_string().contains("ghost"), "got: {err}");
    }

    #[test]
    fn serde_round_trip_preserves_pending_state() {
        let mut c = Conversation::new();
        c.push_user("hi").unwrap();
        c.push_assistant("", vec![call("a"), call("b")]).unwrap();
        c.push_tool_result(ToolResult::failure("a", "boom")).unwrap();

        let json = serde_json::to_string(&c).unwrap();
        let restored: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, c);
        assert_eq!(restored.pending_call_ids(), ["b".to_string()]);
    }

    #[cfg(feature = "fuzz-tests")]
    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn answered_rounds_round_trip_and_leave_nothing_pending(
                rounds in proptest::collection::vec((0usize..5, 0usize..5), 0..8)
            ) {
                let mut c = Conversation::new();
                for (round, (calls, rotation)) in rounds.iter().enumerate() {
                    c.push_user(format!("message {round}")).unwrap();
                    let ids = (0..*calls).map(|i| format!("r{round}_c{i}")).collect::<Vec<_>>();
                    c.push_assistant("", ids.iter().map(|id| call(id)).collect()).unwrap();
                    let mut order = ids.clone();
                    if !order.is_empty() {
                        let shift = rotation % order.len();
                        order.rotate_left(shift);
                    }
                    for id in order {
                        c.push_tool_result(ToolResult::success(id, "ok")).unwrap();
                    }
                    c.push_assistant("answer", Vec::new()).unwrap();
                }
                prop_assert!(c.pending_call_ids().is_empty());

                let json = serde_json::to_string(&c).unwrap();
                let restored: Conversation = serde_json::from_str(&json).unwrap();
                prop_assert_eq!(restored, c);
            }

            #[test]
            fn omitted_result_blocks_next_turn(calls in 1usize..5, skip_seed in 0usize..5) {
                let skip = skip_seed % calls;
                let mut c = Conversation::new();
                c.push_user("go").unwrap();
                let ids = (0..calls).map(|i| format!("c{i}")).collect::<Vec<_>>();
                c.push_assistant("", ids.iter().map(|id| call(id)).collect()).unwrap();
                for (i, id) in ids.iter().enumerate() {
                    if i != skip {
                        c.push_tool_result(ToolResult::success(id.clone(), "ok")).unwrap();
                    }
                }
                prop_assert_eq!(
                    c.push_assistant("too early", Vec::new()).unwrap_err(),
                    ProtocolError::PendingToolResults(vec![ids[skip].clone()])
                );
            }
        }
    }
}
