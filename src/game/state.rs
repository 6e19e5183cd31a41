//! Global quest container.
//!
//! Uses `thread_local!` + `RefCell` for safe mutable access in single-threaded
//! WASM. The Web Worker keeps the WASM module alive, so the quest persists
//! across `handle_request` calls for the entire browser session. Reloads are
//! covered by the `playerInfo` record the page keeps in localStorage.

use std::cell::RefCell;

use crate::game::quest::Quest;

thread_local! {
    static QUEST: RefCell<Quest> = RefCell::new(Quest::default());
}

/// Execute a closure with read access to the quest.
pub fn with_quest<F, R>(f: F) -> R
where
    F: FnOnce(&Quest) -> R,
{
    QUEST.with(|q| f(&q.borrow()))
}

/// Execute a closure with mutable access to the quest.
pub fn with_quest_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut Quest) -> R,
{
    QUEST.with(|q| f(&mut q.borrow_mut()))
}

/// Replace the whole quest (tests and hard resets).
pub fn replace_quest(quest: Quest) {
    QUEST.with(|q| {
        *q.borrow_mut() = quest;
    });
}

/// Serialize the player record for persistence.
pub fn export_player_json() -> String {
    with_quest(|q| q.player().to_json())
}
