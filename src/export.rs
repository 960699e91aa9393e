//! Transcript export and reload.
//!
//! The exported document holds the full conversation in order plus a trailing
//! usage snapshot. Serialization is deterministic, so exporting an unchanged
//! session twice produces byte-identical files.

use crate::conversation::Conversation;
use crate::error::ExportError;
use crate::stats::UsageStats;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk schema version for [`ChatTranscript`].
const TRANSCRIPT_FILE_VERSION: u32 = 1;

/// Default export path used by the `chat` command.
pub const DEFAULT_OUTPUT_PATH: &str = "chat_history.json";

/// Serializable session state: identity, turns and usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTranscript {
    version: u32,
    pub conversation_id: String,
    /// `<provider>/<model>` label of the backend used for the session.
    pub model: String,
    pub turns: Conversation,
    pub stats: UsageStats,
}

impl ChatTranscript {
    pub fn new(
        conversation_id: impl Into<String>,
        model: impl Into<String>,
        turns: Conversation,
        stats: UsageStats,
    ) -> Self {
        Self {
            version: TRANSCRIPT_FILE_VERSION,
            conversation_id: conversation_id.into(),
            model: model.into(),
            turns,
            stats,
        }
    }

    /// Render the document as pretty JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, ExportError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Parse a document previously produced by [`ChatTranscript::to_json`].
    pub fn from_json(raw: &str) -> Result<Self, ExportError> {
        let transcript: Self = serde_json::from_str(raw)?;
        if transcript.version != TRANSCRIPT_FILE_VERSION {
            return Err(ExportError::UnsupportedVersion(transcript.version));
        }
        Ok(transcript)
    }

    /// Write the document to `path`, replacing any previous export.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let path = path.as_ref();
        let json = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // Write a sibling temp file first so a crash mid-write keeps the last
        // complete export intact.
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        fs::write(&tmp_name, json)?;
        fs::rename(&tmp_name, path)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}

/// Generate an opaque conversation id such as `3f2a-09bc-77d1-e004`.
pub fn generate_conversation_id() -> String {
    let mut bytes = [0u8; 8];
    OsRng.fill_bytes(&mut bytes);
    let hex = format!("{:016x}", u64::from_be_bytes(bytes));
    format!(
        "{}-{}-{}-{}",
        &hex[0..4],
        &hex[4..8],
        &hex[8..12],
        &hex[12..16]
    )
}
