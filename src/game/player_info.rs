//! Persisted player record: the JSON blob stored under the `playerInfo`
//! localStorage key.
//!
//! ## Record Shape
//!
//! ```text
//! {
//!   "playerId": "",
//!   "nickname": "",
//!   "gameHistory": [
//!     { "step": 2, "templeSearchAttempts": 1, "statusText": "...", "outcome": "retry" }
//!   ]
//! }
//! ```
//!
//! The last history entry is enough to put a reloaded page back where the
//! player left off. `outcome` is optional on read and defaults to `advanced`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::error::QuestError;

/// localStorage key the page persists the record under.
pub const STORAGE_KEY: &str = "playerInfo";

/// How a recorded step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// The step succeeded and the quest moved past it.
    #[default]
    Advanced,
    /// The temple guards won this round; the step may be re-attempted.
    Retry,
    /// The hunt is over.
    Failed,
}

/// One settled step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Step index (0-based) the entry was recorded at.
    pub step: u8,
    pub temple_search_attempts: u8,
    pub status_text: String,
    #[serde(default)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerInfo {
    pub player_id: String,
    pub nickname: String,
    pub game_history: Vec<HistoryEntry>,
}

impl PlayerInfo {
    pub fn last_entry(&self) -> Option<&HistoryEntry> {
        self.game_history.last()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.game_history.push(entry);
    }

    pub fn set_profile(&mut self, player_id: &str, nickname: &str) {
        self.player_id = player_id.trim().to_string();
        self.nickname = nickname.trim().to_string();
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn from_json(json: &str) -> Result<Self, QuestError> {
        serde_json::from_str(json).map_err(|e| QuestError::InvalidRecord(e.to_string()))
    }

    /// URL-safe base64 of the JSON record, used for the export file.
    pub fn encode_export(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_json())
    }

    /// Accepts either an exported base64 string or a raw JSON record.
    pub fn decode_import(input: &str) -> Result<Self, QuestError> {
        let input = input.trim();
        if input.starts_with('{') {
            return Self::from_json(input);
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(input)
            .map_err(|e| QuestError::InvalidRecord(format!("base64 decode error: {}", e)))?;
        let json = String::from_utf8(bytes)
            .map_err(|e| QuestError::InvalidRecord(format!("utf-8 error: {}", e)))?;
        Self::from_json(&json)
    }
}
