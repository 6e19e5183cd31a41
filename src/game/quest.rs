//! Quest progression: the five-step treasure hunt state machine.
//!
//! The quest walks `Start → ClueFound → Decoded → TempleSearched →
//! MechanismSolved → BoxOpened`. Every step past the first is a simulated
//! map call that must be started (`advance`) and later settled (`resolve`)
//! once its delay has elapsed. Only the temple search can be retried; it is
//! capped at `max_temple_attempts` failures before the hunt is lost.
//!
//! Every settled step is appended to the player's history so a reloaded page
//! can `restore` the exact position.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::error::QuestError;
use crate::game::config::QuestConfig;
use crate::game::player_info::{HistoryEntry, PlayerInfo, StepOutcome};
use crate::game::treasure_map::{ApiCall, PendingCall};

/// Number of story steps; a step index equal to this means the hunt is won.
pub const STEP_COUNT: u8 = 5;

pub const RETRY_LABEL: &str = "Try again";
pub const START_LABEL: &str = "Start";
pub const DONE_LABEL: &str = "Done";
pub const HUNT_LOST: &str = "After several attempts, the guards still caught you. The hunt has failed.";

/// Where the treasure chest says you are, indexed by step.
const LOCATIONS: [&str; STEP_COUNT as usize] = [
    "Library",
    "Library",
    "Temple entrance",
    "Inside the temple",
    "Temple exit",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    InitialClue,
    DecodeScript,
    SearchTemple,
    DecipherMechanism,
    OpenBox,
}

impl Step {
    pub const ALL: [Step; STEP_COUNT as usize] = [
        Step::InitialClue,
        Step::DecodeScript,
        Step::SearchTemple,
        Step::DecipherMechanism,
        Step::OpenBox,
    ];

    pub fn from_index(index: u8) -> Option<Step> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Button label offered while this step is next.
    pub fn label(self) -> &'static str {
        match self {
            Step::InitialClue => "Get the first clue",
            Step::DecodeScript => "Decode the ancient script",
            Step::SearchTemple => "Search the temple",
            Step::DecipherMechanism => "Decipher the box mechanism",
            Step::OpenBox => "Open the box",
        }
    }
}

/// Story milestone reached so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    ClueFound,
    Decoded,
    TempleSearched,
    MechanismSolved,
    BoxOpened,
    Failed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::ClueFound => "clue_found",
            Stage::Decoded => "decoded",
            Stage::TempleSearched => "temple_searched",
            Stage::MechanismSolved => "mechanism_solved",
            Stage::BoxOpened => "box_opened",
            Stage::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Waiting for the player to press the button.
    Idle,
    Pending(PendingCall),
    Failed,
    Completed,
}

/// What pressing the "next" button did.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Step 0 needs no call; the clue on screen was recorded directly.
    Recorded(HistoryEntry),
    Started { delay_ms: u64 },
}

/// What a resolve poll did.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Nothing was in flight.
    Idle,
    Waiting { remaining_ms: u64 },
    /// The initial clue arrived. Not recorded in history.
    ClueShown,
    Recorded(HistoryEntry),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    pub label: &'static str,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct Quest {
    config: QuestConfig,
    rng: StdRng,
    step: u8,
    temple_search_attempts: u8,
    status_text: String,
    phase: Phase,
    player: PlayerInfo,
}

impl Default for Quest {
    fn default() -> Self {
        Self::new(QuestConfig::default(), 0)
    }
}

impl Quest {
    pub fn new(config: QuestConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            step: 0,
            temple_search_attempts: 0,
            status_text: String::new(),
            phase: Phase::Idle,
            player: PlayerInfo::default(),
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn config(&self) -> &QuestConfig {
        &self.config
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn temple_search_attempts(&self) -> u8 {
        self.temple_search_attempts
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn pending(&self) -> Option<&PendingCall> {
        match &self.phase {
            Phase::Pending(p) => Some(p),
            _ => None,
        }
    }

    pub fn player(&self) -> &PlayerInfo {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlayerInfo {
        &mut self.player
    }

    pub fn stage(&self) -> Stage {
        if self.phase == Phase::Failed {
            return Stage::Failed;
        }
        match self.step {
            0 => Stage::Start,
            1 => Stage::ClueFound,
            2 => Stage::Decoded,
            3 => Stage::TempleSearched,
            4 => Stage::MechanismSolved,
            _ => Stage::BoxOpened,
        }
    }

    /// Current location on the treasure map. Clamped to the last entry once
    /// the hunt is over.
    pub fn location(&self) -> &'static str {
        let idx = (self.step as usize).min(LOCATIONS.len() - 1);
        LOCATIONS[idx]
    }

    fn retrying_temple(&self) -> bool {
        self.step == Step::SearchTemple.index() && self.temple_search_attempts > 0
    }

    fn step_label(&self) -> &'static str {
        if self.retrying_temple() {
            return RETRY_LABEL;
        }
        Step::from_index(self.step).map(Step::label).unwrap_or(DONE_LABEL)
    }

    pub fn button(&self) -> ButtonState {
        match &self.phase {
            Phase::Pending(p) if p.call == ApiCall::InitialClue => ButtonState {
                label: START_LABEL,
                enabled: false,
            },
            Phase::Pending(_) | Phase::Failed => ButtonState {
                label: self.step_label(),
                enabled: false,
            },
            Phase::Completed => ButtonState {
                label: DONE_LABEL,
                enabled: false,
            },
            Phase::Idle if self.step == 0 && self.status_text.is_empty() => ButtonState {
                label: START_LABEL,
                enabled: true,
            },
            Phase::Idle => ButtonState {
                label: self.step_label(),
                enabled: true,
            },
        }
    }

    // ── Transitions ────────────────────────────────────────────────

    /// Page load. Fetches the first clue unless a saved game was restored
    /// or a call is already in flight.
    pub fn boot(&mut self, now: u64) {
        if self.phase == Phase::Idle && self.step == 0 && self.player.game_history.is_empty() {
            self.start_call(ApiCall::InitialClue, now);
        }
    }

    /// The "next" button.
    pub fn advance(&mut self, now: u64) -> Result<Advance, QuestError> {
        match self.phase {
            Phase::Pending(_) => return Err(QuestError::CallInFlight),
            Phase::Failed => return Err(QuestError::QuestFailed),
            Phase::Completed => return Err(QuestError::QuestComplete),
            Phase::Idle => {}
        }
        let step = Step::from_index(self.step).ok_or(QuestError::QuestComplete)?;

        let call = match step {
            Step::InitialClue if self.status_text.is_empty() => ApiCall::InitialClue,
            Step::InitialClue => {
                let entry = self.record(StepOutcome::Advanced);
                self.step += 1;
                info!(target: "quest.step", step = entry.step, "clue recorded");
                return Ok(Advance::Recorded(entry));
            }
            Step::DecodeScript => ApiCall::DecodeScript {
                clue: self.status_text.clone(),
            },
            Step::SearchTemple => ApiCall::SearchTemple,
            Step::DecipherMechanism => ApiCall::DecipherMechanism,
            Step::OpenBox => ApiCall::OpenBox,
        };
        let delay_ms = self.start_call(call, now);
        Ok(Advance::Started { delay_ms })
    }

    /// Settle the in-flight call if its delay has elapsed.
    pub fn resolve(&mut self, now: u64) -> Resolution {
        let pending = match &self.phase {
            Phase::Pending(p) => p.clone(),
            _ => return Resolution::Idle,
        };
        if !pending.is_ready(now) {
            let remaining_ms = pending.remaining_ms(now);
            debug!(target: "quest.step", remaining_ms, "call not ready");
            return Resolution::Waiting { remaining_ms };
        }

        self.phase = Phase::Idle;
        let result = pending.call.settle(&mut self.rng, &self.config);
        let entry = match result {
            Ok(clue) if pending.call == ApiCall::InitialClue => {
                self.status_text = clue;
                debug!(target: "quest.step", "initial clue shown");
                return Resolution::ClueShown;
            }
            Ok(message) => self.succeed(message),
            Err(err) => self.reject(&pending.call, err),
        };
        Resolution::Recorded(entry)
    }

    /// Wipe progress and the player record, then fetch the first clue again.
    pub fn restart(&mut self, now: u64) {
        self.step = 0;
        self.temple_search_attempts = 0;
        self.status_text.clear();
        self.player = PlayerInfo::default();
        self.phase = Phase::Idle;
        info!(target: "quest.step", "quest restarted");
        self.start_call(ApiCall::InitialClue, now);
    }

    /// Adopt a persisted record and resume from its last entry.
    pub fn restore(&mut self, player: PlayerInfo) {
        self.phase = Phase::Idle;
        self.step = 0;
        self.temple_search_attempts = 0;
        self.status_text.clear();

        if let Some(last) = player.last_entry() {
            self.status_text = last.status_text.clone();
            self.step = match last.outcome {
                StepOutcome::Advanced => last.step.saturating_add(1),
                StepOutcome::Retry | StepOutcome::Failed => last.step,
            };
            // Attempts only carry over while still stuck at the temple.
            if self.step == Step::SearchTemple.index() && last.outcome != StepOutcome::Advanced {
                self.temple_search_attempts = last.temple_search_attempts;
            }
            let out_of_attempts = last.outcome == StepOutcome::Retry
                && self.temple_search_attempts >= self.max_attempts();
            if last.outcome == StepOutcome::Failed || out_of_attempts {
                self.phase = Phase::Failed;
            }
            if self.step >= STEP_COUNT {
                self.step = STEP_COUNT;
                self.phase = Phase::Completed;
            }
        }
        info!(
            target: "quest.step",
            step = self.step,
            entries = player.game_history.len(),
            "quest restored"
        );
        self.player = player;
    }

    // ── Internals ──────────────────────────────────────────────────

    fn max_attempts(&self) -> u8 {
        self.config.max_temple_attempts.max(1)
    }

    fn start_call(&mut self, call: ApiCall, now: u64) -> u64 {
        let pending = PendingCall::start(call, now, &self.config);
        let delay_ms = pending.call.delay_ms(&self.config);
        self.status_text = pending.call.in_progress_text().to_string();
        debug!(target: "quest.step", step = self.step, delay_ms, "call started");
        self.phase = Phase::Pending(pending);
        delay_ms
    }

    fn record(&mut self, outcome: StepOutcome) -> HistoryEntry {
        let entry = HistoryEntry {
            step: self.step,
            temple_search_attempts: self.temple_search_attempts,
            status_text: self.status_text.clone(),
            outcome,
        };
        self.player.push(entry.clone());
        entry
    }

    fn succeed(&mut self, message: String) -> HistoryEntry {
        self.status_text = message;
        if self.step == Step::SearchTemple.index() {
            self.temple_search_attempts = 0;
        }
        let entry = self.record(StepOutcome::Advanced);
        self.step += 1;
        if self.step >= STEP_COUNT {
            self.phase = Phase::Completed;
            info!(target: "quest.step", "treasure found");
        } else {
            info!(target: "quest.step", step = entry.step, "step completed");
        }
        entry
    }

    fn reject(&mut self, call: &ApiCall, err: QuestError) -> HistoryEntry {
        let outcome = if *call == ApiCall::SearchTemple {
            self.temple_search_attempts = self.temple_search_attempts.saturating_add(1);
            if self.temple_search_attempts >= self.max_attempts() {
                self.status_text = HUNT_LOST.to_string();
                StepOutcome::Failed
            } else {
                self.status_text = format!(
                    "Oh no! The temple guards spotted you! You slipped into the temple corridor! Attempt {}...",
                    self.temple_search_attempts + 1
                );
                StepOutcome::Retry
            }
        } else {
            self.status_text = format!("Quest failed: {}", err);
            StepOutcome::Failed
        };

        if outcome == StepOutcome::Failed {
            self.phase = Phase::Failed;
        }
        warn!(
            target: "quest.step",
            step = self.step,
            attempts = self.temple_search_attempts,
            error = %err,
            "step rejected"
        );
        self.record(outcome)
    }
}
