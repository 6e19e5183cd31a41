//! Domain errors for the treasure hunt.
//!
//! Rejections from the simulated map API (`NoClue`, `GuardEncounter`) share
//! this enum with the quest's own guard rails so the route layer can render
//! any of them the same way.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestError {
    /// Decode was attempted with nothing on screen to decode.
    #[error("there is no clue to decode")]
    NoClue,
    /// The temple guards caught the player.
    #[error("oh no, the temple guards spotted you")]
    GuardEncounter,
    #[error("a map call is already in progress")]
    CallInFlight,
    #[error("the hunt has failed, restart to try again")]
    QuestFailed,
    #[error("the treasure has already been found")]
    QuestComplete,
    #[error("invalid player record: {0}")]
    InvalidRecord(String),
}
