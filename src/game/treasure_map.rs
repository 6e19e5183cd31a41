//! Simulated treasure map API.
//!
//! Each story step is backed by a call that settles after a fixed delay.
//! There is no timer here: the quest records when a call becomes ready and
//! the page polls `/api/quest/resolve` once the delay has passed.

use rand::Rng;

use crate::error::QuestError;
use crate::game::config::QuestConfig;

pub const INITIAL_CLUE: &str = "Found the first clue in the old library...";
pub const DECODED: &str = "Decoded! The treasure lies in an ancient temple...";
pub const TEMPLE_FOUND: &str = "Found a mysterious box...";
pub const MECHANISM_SOLVED: &str = "The mechanism is solved, the lock on the chest springs open!";
pub const BOX_OPENED: &str = "Congratulations! You found the legendary treasure!";

/// One outstanding call against the map.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    InitialClue,
    /// Decodes whatever clue was on screen when the step started.
    DecodeScript { clue: String },
    SearchTemple,
    DecipherMechanism,
    OpenBox,
}

impl ApiCall {
    pub fn delay_ms(&self, config: &QuestConfig) -> u64 {
        match self {
            ApiCall::InitialClue => config.initial_clue_delay_ms,
            ApiCall::DecodeScript { .. } => config.decode_delay_ms,
            ApiCall::SearchTemple => config.temple_delay_ms,
            ApiCall::DecipherMechanism => config.mechanism_delay_ms,
            ApiCall::OpenBox => config.open_box_delay_ms,
        }
    }

    /// Status line shown while the call is in flight.
    pub fn in_progress_text(&self) -> &'static str {
        match self {
            ApiCall::InitialClue => "",
            ApiCall::DecodeScript { .. } => "Decoding the ancient script...",
            ApiCall::SearchTemple => "Searching the temple...",
            ApiCall::DecipherMechanism => "Deciphering the box mechanism...",
            ApiCall::OpenBox => "Opening the box...",
        }
    }

    /// Settle the call. Only decode and temple search can reject.
    pub fn settle<R: Rng>(&self, rng: &mut R, config: &QuestConfig) -> Result<String, QuestError> {
        match self {
            ApiCall::InitialClue => Ok(INITIAL_CLUE.to_string()),
            ApiCall::DecodeScript { clue } => {
                if clue.trim().is_empty() {
                    Err(QuestError::NoClue)
                } else {
                    Ok(DECODED.to_string())
                }
            }
            ApiCall::SearchTemple => {
                if rng.gen_bool(config.temple_chance()) {
                    Ok(TEMPLE_FOUND.to_string())
                } else {
                    Err(QuestError::GuardEncounter)
                }
            }
            ApiCall::DecipherMechanism => Ok(MECHANISM_SOLVED.to_string()),
            ApiCall::OpenBox => Ok(BOX_OPENED.to_string()),
        }
    }
}

/// A call in flight and the earliest time (client ms) it may settle.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCall {
    pub call: ApiCall,
    pub ready_at: u64,
}

impl PendingCall {
    pub fn start(call: ApiCall, now: u64, config: &QuestConfig) -> Self {
        let ready_at = now.saturating_add(call.delay_ms(config));
        Self { call, ready_at }
    }

    pub fn remaining_ms(&self, now: u64) -> u64 {
        self.ready_at.saturating_sub(now)
    }

    pub fn is_ready(&self, now: u64) -> bool {
        now >= self.ready_at
    }
}
