//! Treasure hunt in-browser WASM server.
//!
//! Exports `handle_request(method, path, query, body)` for the Service Worker
//! bridge to call. Uses `matchit` for URL routing: the same router
//! engine that powers Axum.
//!
//! The quest lives in WASM memory for the worker's lifetime; the page keeps
//! the `playerInfo` record in localStorage and hands it back on load through
//! `/api/player/restore`.

use tracing::debug;
use wasm_bindgen::prelude::*;

pub mod error;
pub mod game;
pub mod routes;

/// Process an HTTP-like request and return an HTML fragment.
///
/// Called from JavaScript (Web Worker) via wasm-bindgen.
///
/// # Arguments
/// * `method`: HTTP method (e.g., "GET", "POST")
/// * `path`: URL path (e.g., "/api/quest/next")
/// * `query`: Query string (e.g., "?now=1700000000000")
/// * `body`: Request body (e.g., POST form data). Empty string for GET requests.
///
/// # Returns
/// An HTML string fragment suitable for HTMX to swap into the DOM.
#[wasm_bindgen]
pub fn handle_request(method: &str, path: &str, query: &str, body: &str) -> String {
    // Build the router. matchit compiles route patterns into a radix tree.
    let mut router = matchit::Router::new();

    // Register routes: the value is a &str tag we match on below
    router.insert("/api/quest/start", "quest_start").ok();
    router.insert("/api/quest/panel", "quest_panel").ok();
    router.insert("/api/quest/next", "quest_next").ok();
    router.insert("/api/quest/resolve", "quest_resolve").ok();
    router.insert("/api/quest/restart", "quest_restart").ok();
    router.insert("/api/quest/location", "quest_location").ok();

    router.insert("/api/player/state", "player_state").ok();
    router.insert("/api/player/restore", "player_restore").ok();
    router.insert("/api/player/export", "player_export").ok();
    router.insert("/api/player/import", "player_import").ok();
    router.insert("/api/player/profile", "player_profile").ok();

    debug!(target: "routes", method, path, "request");

    match router.at(path) {
        Ok(matched) => match (*matched.value, method) {
            // Quest routes
            ("quest_panel", "GET") => routes::quest::handle_panel_get(query),
            ("quest_location", "GET") => routes::quest::handle_location_get(query),
            ("quest_start", "POST") => routes::quest::handle_start_post(body),
            ("quest_next", "POST") => routes::quest::handle_next_post(body),
            ("quest_resolve", "POST") => routes::quest::handle_resolve_post(body),
            ("quest_restart", "POST") => routes::quest::handle_restart_post(body),

            // Player record routes
            ("player_state", "GET") => routes::player::handle_state_get(query),
            ("player_export", "GET") => routes::player::handle_export_get(query),
            ("player_restore", "POST") => routes::player::handle_restore_post(body),
            ("player_import", "POST") => routes::player::handle_import_post(body),
            ("player_profile", "POST") => routes::player::handle_profile_post(body),

            _ => method_not_allowed(),
        },
        Err(_) => not_found(),
    }
}

fn not_found() -> String {
    r#"<span class="text-kip-red">404 — route not found</span>"#.to_string()
}

fn method_not_allowed() -> String {
    r#"<span class="text-kip-red">405 — method not allowed</span>"#.to_string()
}
