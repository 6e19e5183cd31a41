//! Tunables for the simulated map API and the temple retry cap.

use serde::{Deserialize, Serialize};

/// Quest configuration. `Default` matches the shipped game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestConfig {
    pub initial_clue_delay_ms: u64,
    pub decode_delay_ms: u64,
    pub temple_delay_ms: u64,
    pub mechanism_delay_ms: u64,
    pub open_box_delay_ms: u64,
    /// Probability in `[0, 1]` that a temple search slips past the guards.
    pub temple_success_chance: f64,
    /// Failed temple searches allowed before the hunt is lost.
    pub max_temple_attempts: u8,
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            initial_clue_delay_ms: 1000,
            decode_delay_ms: 1500,
            temple_delay_ms: 2000,
            mechanism_delay_ms: 2000,
            open_box_delay_ms: 1000,
            temple_success_chance: 0.6,
            max_temple_attempts: 3,
        }
    }
}

impl QuestConfig {
    /// Success chance clamped to a valid probability (NaN counts as 0).
    pub fn temple_chance(&self) -> f64 {
        if self.temple_success_chance.is_nan() {
            0.0
        } else {
            self.temple_success_chance.clamp(0.0, 1.0)
        }
    }
}
