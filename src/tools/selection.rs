//! Proactive tool selection.
//!
//! A [`ToolSelector`] looks at the user's message and the registered tool
//! definitions and may suggest one tool. The suggestion is only a hint carried
//! in the provider request; the model still decides which tools to call.

use crate::types::ToolDefinition;
use std::collections::BTreeSet;

/// Suggested tool for the current user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolHint {
    pub tool_name: String,
    pub reason: String,
}

impl ToolHint {
    /// One-line rendering appended to the system prompt.
    pub fn render(&self) -> String {
        format!(
            "Hint: the `{}` tool is likely relevant to the user's latest message ({}).",
            self.tool_name, self.reason
        )
    }
}

/// Pure strategy mapping user text and tool definitions to an optional hint.
pub trait ToolSelector: Send + Sync {
    fn suggest(&self, user_text: &str, tools: &[ToolDefinition]) -> Option<ToolHint>;
}

/// Selector that never suggests anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSelector;

impl ToolSelector for NoSelector {
    fn suggest(&self, _user_text: &str, _tools: &[ToolDefinition]) -> Option<ToolHint> {
        None
    }
}

/// Scores tools by word overlap with the user message.
///
/// Words from the tool name weigh [`NAME_WEIGHT`], words from the description
/// weigh 1. The best tool is suggested when its score reaches `min_score`;
/// ties go to the earliest registered tool.
#[derive(Debug, Clone, Copy)]
pub struct KeywordSelector {
    min_score: usize,
}

const NAME_WEIGHT: usize = 2;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "at", "be", "by", "for", "from", "given", "if", "in", "into", "is",
    "it", "its", "me", "must", "my", "no", "not", "of", "on", "or", "the", "this", "to", "what",
    "when", "will", "with", "you", "your",
];

impl KeywordSelector {
    pub fn new(min_score: usize) -> Self {
        Self {
            min_score: min_score.max(1),
        }
    }
}

impl Default for KeywordSelector {
    fn default() -> Self {
        Self::new(NAME_WEIGHT)
    }
}

impl ToolSelector for KeywordSelector {
    fn suggest(&self, user_text: &str, tools: &[ToolDefinition]) -> Option<ToolHint> {
        let query = words(user_text);
        if query.is_empty() {
            return None;
        }

        let mut best: Option<(usize, &ToolDefinition, Vec<String>)> = None;
        for tool in tools {
            let name_words = words(&tool.name);
            let desc_words = words(&tool.description);
            let mut matched = Vec::new();
            let mut score = 0;
            for word in &query {
                if name_words.contains(word) {
                    score += NAME_WEIGHT;
                    matched.push(word.clone());
                } else if desc_words.contains(word) {
                    score += 1;
                    matched.push(word.clone());
                }
            }
            if best.as_ref().map_or(true, |(s, _, _)| score > *s) {
                best = Some((score, tool, matched));
            }
        }

        let (score, tool, matched) = best?;
        if score < self.min_score {
            return None;
        }
        Some(ToolHint {
            tool_name: tool.name.clone(),
            reason: format!("matched: {}", matched.join(", ")),
        })
    }
}

/// Lower-cased alphanumeric words with stopwords and plural `s` removed.
fn words(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .map(|w| match w.strip_suffix('s') {
            Some(stem) if stem.len() >= 3 && !stem.ends_with('s') => stem.to_string(),
            _ => w,
        })
        .collect()
}
