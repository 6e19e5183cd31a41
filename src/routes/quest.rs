//! `/api/quest/*` routes: the treasure hunt panel.
//!
//! The page swaps the returned panel into `#quest-container`. While a map
//! call is in flight the panel carries a hidden poller that fires
//! `/api/quest/resolve` once the call's delay has passed; the resolve
//! handler re-renders the panel (with another poller if the client clock
//! was early). Every recorded step appends a persist `<script>` so the
//! page rewrites `localStorage.playerInfo`.

use tracing::debug;

use crate::game::quest::{Advance, Quest, Resolution};
use crate::game::state::{export_player_json, with_quest, with_quest_mut};
use crate::routes::player::persist_script;
use crate::routes::util::{escape_html, get_u64, parse_form_body, parse_query};

// ── POST /api/quest/start ──────────────────────────────────────────

/// Handle POST /api/quest/start
/// Body: now={ms}&seed={n}
/// Called once on page load, after `/api/player/restore`. Fetches the first
/// clue unless a saved game was restored.
pub fn handle_start_post(body: &str) -> String {
    let params = parse_form_body(body);
    let now = get_u64(&params, "now").unwrap_or(0);
    let seed = get_u64(&params, "seed");
    with_quest_mut(|q| {
        if let Some(seed) = seed {
            q.reseed(seed);
        }
        q.boot(now);
    });
    with_quest(|q| render_panel(q, Some(now), None))
}

// ── GET /api/quest/panel ───────────────────────────────────────────

/// Handle GET /api/quest/panel
/// Query: ?now={ms} (optional)
/// Re-renders the panel without touching the quest.
pub fn handle_panel_get(query: &str) -> String {
    let now = get_u64(&parse_query(query), "now");
    with_quest(|q| render_panel(q, now, None))
}

// ── POST /api/quest/next ───────────────────────────────────────────

/// Handle POST /api/quest/next
/// Body: now={ms}
/// The "next" button. Step 0 is recorded immediately; later steps start
/// their map call and return a panel with a resolve poller.
pub fn handle_next_post(body: &str) -> String {
    let params = parse_form_body(body);
    let now = get_u64(&params, "now").unwrap_or(0);
    let result = with_quest_mut(|q| q.advance(now));

    match result {
        Ok(Advance::Recorded(_)) => {
            let mut html = with_quest(|q| render_panel(q, Some(now), None));
            html.push_str(&persist_script(&export_player_json()));
            html
        }
        Ok(Advance::Started { delay_ms }) => {
            debug!(target: "routes", delay_ms, "map call started");
            with_quest(|q| render_panel(q, Some(now), None))
        }
        Err(e) => with_quest(|q| render_panel(q, Some(now), Some(&e.to_string()))),
    }
}

// ── POST /api/quest/resolve ────────────────────────────────────────

/// Handle POST /api/quest/resolve
/// Body: now={ms}
/// Settles the in-flight call if its delay has passed.
pub fn handle_resolve_post(body: &str) -> String {
    let params = parse_form_body(body);
    let now = get_u64(&params, "now").unwrap_or(0);
    let resolution = with_quest_mut(|q| q.resolve(now));

    let mut html = with_quest(|q| render_panel(q, Some(now), None));
    if let Resolution::Recorded(_) = resolution {
        html.push_str(&persist_script(&export_player_json()));
    }
    html
}

// ── POST /api/quest/restart ────────────────────────────────────────

/// Handle POST /api/quest/restart
/// Body: now={ms}&seed={n} (seed optional)
/// Clears the history and the persisted record, then fetches the first clue.
pub fn handle_restart_post(body: &str) -> String {
    let params = parse_form_body(body);
    let now = get_u64(&params, "now").unwrap_or(0);
    let seed = get_u64(&params, "seed");
    with_quest_mut(|q| {
        if let Some(seed) = seed {
            q.reseed(seed);
        }
        q.restart(now);
    });
    let mut html = with_quest(|q| render_panel(q, Some(now), None));
    html.push_str(&persist_script(&export_player_json()));
    html
}

// ── GET /api/quest/location ────────────────────────────────────────

/// Handle GET /api/quest/location
/// The treasure chest image: tells the player where they are on the map.
pub fn handle_location_get(_query: &str) -> String {
    let location = with_quest(|q| q.location());
    format!(
        r#"<span class="text-kip-drk-sienna font-bold">Current location: {}</span>"#,
        location
    )
}

// ── Panel rendering ────────────────────────────────────────────────

/// Render the quest panel. `now` is the client clock of the request, used to
/// schedule the resolve poller; without it the call's full delay is used.
fn render_panel(quest: &Quest, now: Option<u64>, notice: Option<&str>) -> String {
    let stage = quest.stage();
    let button = quest.button();
    let mut html = String::with_capacity(1024);

    html.push_str(&format!(
        r#"<div id="quest-panel" class="p-4 text-kip-drk-sienna" data-stage="{}">"#,
        stage.as_str()
    ));

    if let Some(msg) = notice {
        html.push_str(&format!(
            r#"<div class="text-center text-xs text-kip-red mb-2">{}</div>"#,
            escape_html(msg)
        ));
    }

    html.push_str(&format!(
        r#"<div id="status" class="text-center text-lg mb-3 visible">{}</div>"#,
        escape_html(quest.status_text())
    ));

    html.push_str(r#"<div class="flex justify-center gap-2">"#);
    let disabled = if button.enabled { "" } else { " disabled" };
    html.push_str(&format!(
        r##"<button id="nextButton" class="bg-kip-red hover:bg-emerald-600 text-amber-50 font-bold py-2 px-4 rounded text-sm disabled:opacity-50" hx-post="/api/quest/next" hx-vals='js:{{now: Date.now()}}' hx-target="#quest-container" hx-swap="innerHTML"{}>{}</button>"##,
        disabled, button.label
    ));
    html.push_str(
        r##"<button id="restartButton" class="bg-slate-500 hover:bg-slate-600 text-amber-50 font-bold py-2 px-4 rounded text-sm" hx-post="/api/quest/restart" hx-vals='js:{now: Date.now(), seed: Math.floor(Math.random() * 4294967296)}' hx-target="#quest-container" hx-swap="innerHTML">Restart</button>"##,
    );
    html.push_str(r#"</div>"#);

    if let Some(pending) = quest.pending() {
        let wait_ms = match now {
            Some(n) => pending.remaining_ms(n),
            None => pending.call.delay_ms(quest.config()),
        };
        html.push_str(&format!(
            r##"<div class="hidden" hx-post="/api/quest/resolve" hx-trigger="load delay:{}ms" hx-vals='js:{{now: Date.now()}}' hx-target="#quest-container" hx-swap="innerHTML"></div>"##,
            wait_ms
        ));
    }

    html.push_str(r#"</div>"#);
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::QuestConfig;
    use crate::game::state::replace_quest;

    fn reset(chance: f64) {
        replace_quest(Quest::new(
            QuestConfig {
                temple_success_chance: chance,
                ..QuestConfig::default()
            },
            3,
        ));
    }

    /// Start the quest and let the first clue arrive.
    fn start() {
        handle_start_post("now=0&seed=9");
        handle_resolve_post("now=1000");
    }

    #[test]
    fn start_schedules_clue_poller() {
        reset(1.0);
        let html = handle_start_post("now=0&seed=9");
        assert!(html.contains(r#"data-stage="start""#));
        assert!(html.contains("load delay:1000ms"));
        assert!(html.contains(">Start</button>"));
        assert!(html.contains(" disabled>"));
        reset(1.0);
    }

    #[test]
    fn early_resolve_reschedules_remaining_delay() {
        reset(1.0);
        handle_start_post("now=0");
        let html = handle_resolve_post("now=400");
        assert!(html.contains("load delay:600ms"));
        assert!(!html.contains("localStorage"));
        reset(1.0);
    }

    #[test]
    fn clue_arrives_without_persisting() {
        reset(1.0);
        handle_start_post("now=0");
        let html = handle_resolve_post("now=1000");
        assert!(html.contains("Found the first clue"));
        assert!(html.contains(">Get the first clue</button>"));
        assert!(!html.contains("hx-trigger"));
        assert!(!html.contains("localStorage"));
        reset(1.0);
    }

    #[test]
    fn first_step_persists_immediately() {
        reset(1.0);
        start();
        let html = handle_next_post("now=2000");
        assert!(html.contains(r#"data-stage="clue_found""#));
        assert!(html.contains("localStorage.setItem('playerInfo'"));
        assert!(html.contains(">Decode the ancient script</button>"));
        reset(1.0);
    }

    #[test]
    fn decode_shows_progress_then_result() {
        reset(1.0);
        start();
        handle_next_post("now=2000");
        let html = handle_next_post("now=3000");
        assert!(html.contains("Decoding the ancient script..."));
        assert!(html.contains("load delay:1500ms"));

        let html = handle_resolve_post("now=4500");
        assert!(html.contains("Decoded! The treasure lies in an ancient temple"));
        assert!(html.contains(r#"data-stage="decoded""#));
        assert!(html.contains("localStorage.setItem"));
        reset(1.0);
    }

    #[test]
    fn next_while_pending_shows_notice() {
        reset(1.0);
        start();
        handle_next_post("now=2000");
        handle_next_post("now=3000");
        let html = handle_next_post("now=3100");
        assert!(html.contains("already in progress"));
        reset(1.0);
    }

    #[test]
    fn guards_end_the_hunt_after_three_tries() {
        reset(0.0);
        start();
        handle_next_post("now=2000");
        handle_next_post("now=3000");
        handle_resolve_post("now=5000");

        let mut now = 10_000;
        let mut last = String::new();
        for _ in 0..3 {
            handle_next_post(&format!("now={}", now));
            now += 2000;
            last = handle_resolve_post(&format!("now={}", now));
            now += 1000;
        }
        assert!(last.contains(r#"data-stage="failed""#));
        assert!(last.contains("The hunt has failed"));
        assert!(last.contains(" disabled>"));
        reset(0.0);
    }

    #[test]
    fn retry_label_after_guard_encounter() {
        reset(0.0);
        start();
        handle_next_post("now=2000");
        handle_next_post("now=3000");
        handle_resolve_post("now=5000");
        handle_next_post("now=6000");
        let html = handle_resolve_post("now=8000");
        assert!(html.contains(">Try again</button>"));
        assert!(html.contains("Attempt 2"));
        reset(0.0);
    }

    #[test]
    fn restart_clears_and_persists_empty_record() {
        reset(1.0);
        start();
        handle_next_post("now=2000");
        let html = handle_restart_post("now=3000&seed=5");
        assert!(html.contains(r#"data-stage="start""#));
        assert!(html.contains(r#"\"gameHistory\":[]"#));
        assert!(html.contains("load delay:1000ms"));
        reset(1.0);
    }

    #[test]
    fn location_follows_progress() {
        reset(1.0);
        start();
        assert!(handle_location_get("").contains("Current location: Library"));
        handle_next_post("now=2000");
        handle_next_post("now=3000");
        handle_resolve_post("now=4500");
        assert!(handle_location_get("").contains("Temple entrance"));
        reset(1.0);
    }

    #[test]
    fn panel_get_uses_full_delay_without_clock() {
        reset(1.0);
        handle_start_post("now=0");
        let html = handle_panel_get("");
        assert!(html.contains("load delay:1000ms"));
        reset(1.0);
    }

    #[test]
    fn panel_get_with_clock_waits_only_the_remainder() {
        reset(1.0);
        handle_start_post("now=0");
        let html = handle_panel_get("?now=400");
        assert!(html.contains("load delay:600ms"));
        reset(1.0);
    }
}
