//! Game module: the treasure hunt quest, its simulated map API and the
//! persisted player record. State lives in WASM memory (thread_local) for
//! the lifetime of the Web Worker.

pub mod config;
pub mod player_info;
pub mod quest;
pub mod state;
pub mod treasure_map;
