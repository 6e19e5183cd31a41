//! `/api/player/*` routes: persistence of the `playerInfo` record.
//!
//! The page owns localStorage; WASM only hands it JSON (or a `<script>`
//! that writes it) and accepts the saved record back on load.

use tracing::{info, warn};

use crate::game::player_info::{PlayerInfo, STORAGE_KEY};
use crate::game::state::{export_player_json, with_quest, with_quest_mut};
use crate::routes::util::{
    escape_html, get_param, js_string_literal, parse_form_body, state_payload,
};

/// `<script>` that overwrites the persisted record with `json`.
pub fn persist_script(json: &str) -> String {
    format!(
        "<script>localStorage.setItem('{}', {});</script>",
        STORAGE_KEY,
        js_string_literal(json)
    )
}

// ── GET /api/player/state ──────────────────────────────────────────

/// Handle GET /api/player/state
/// Returns the player record as raw JSON for the page to persist.
pub fn handle_state_get(_query: &str) -> String {
    export_player_json()
}

// ── POST /api/player/restore ───────────────────────────────────────

/// Handle POST /api/player/restore
/// Body: state={json} (or the raw JSON record as the whole body).
/// Called on page load with `localStorage.playerInfo`; resumes the quest
/// from the record's last history entry. An empty body is a no-op.
pub fn handle_restore_post(body: &str) -> String {
    let raw = state_payload(body);
    if raw.is_empty() {
        return "ok".to_string();
    }
    match PlayerInfo::from_json(&raw) {
        Ok(player) => {
            with_quest_mut(|q| q.restore(player));
            "ok".to_string()
        }
        Err(e) => {
            warn!(target: "quest.persist", error = %e, "restore rejected");
            format!("error: {}", e)
        }
    }
}

// ── GET /api/player/export ─────────────────────────────────────────

/// Handle GET /api/player/export
/// Returns a <script> tag that downloads the record as a base64 text file.
pub fn handle_export_get(_query: &str) -> String {
    let state = with_quest(|q| q.player().encode_export());
    format!(
        r#"<script>
(function() {{
  var b = new Blob(['{state}'], {{type: 'text/plain'}});
  var a = document.createElement('a');
  a.href = URL.createObjectURL(b);
  a.download = 'treasure-hunt-player.txt';
  a.click();
  URL.revokeObjectURL(a.href);
  console.log('[treasure] Player data exported');
}})();
</script>"#,
        state = state
    )
}

// ── POST /api/player/import ────────────────────────────────────────

/// Handle POST /api/player/import
/// Body: state={base64 or json}
/// Replaces the record, resumes the quest from it and persists it.
pub fn handle_import_post(body: &str) -> String {
    match PlayerInfo::decode_import(&state_payload(body)) {
        Ok(player) => {
            let entries = player.game_history.len();
            with_quest_mut(|q| q.restore(player));
            info!(target: "quest.persist", entries, "player record imported");
            let mut html =
                r#"<span class="text-emerald-600">Player data imported successfully</span>"#
                    .to_string();
            html.push_str(&persist_script(&export_player_json()));
            html
        }
        Err(e) => format!(
            r#"<span class="text-kip-red">Import failed: {}</span>"#,
            escape_html(&e.to_string())
        ),
    }
}

// ── POST /api/player/profile ───────────────────────────────────────

/// Handle POST /api/player/profile
/// Body: player_id={id}&nickname={name}
pub fn handle_profile_post(body: &str) -> String {
    let params = parse_form_body(body);
    let player_id = get_param(&params, "player_id").unwrap_or("");
    let nickname = get_param(&params, "nickname").unwrap_or("");
    if nickname.trim().is_empty() {
        return r#"<span class="text-kip-red">Missing nickname parameter</span>"#.to_string();
    }
    let nickname = with_quest_mut(|q| {
        q.player_mut().set_profile(player_id, nickname);
        q.player().nickname.clone()
    });
    let mut html = format!(
        r#"<span class="text-emerald-600">Welcome, {}!</span>"#,
        escape_html(&nickname)
    );
    html.push_str(&persist_script(&export_player_json()));
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player_info::{HistoryEntry, StepOutcome};
    use crate::game::quest::Quest;
    use crate::game::state::replace_quest;

    fn reset() {
        replace_quest(Quest::default());
    }

    fn saved_record() -> PlayerInfo {
        PlayerInfo {
            player_id: "p-2".to_string(),
            nickname: "Indy".to_string(),
            game_history: vec![
                HistoryEntry {
                    step: 0,
                    temple_search_attempts: 0,
                    status_text: "clue".to_string(),
                    outcome: StepOutcome::Advanced,
                },
                HistoryEntry {
                    step: 1,
                    temple_search_attempts: 0,
                    status_text: "decoded".to_string(),
                    outcome: StepOutcome::Advanced,
                },
            ],
        }
    }

    #[test]
    fn persist_script_targets_storage_key() {
        let html = persist_script(r#"{"nickname":"</script>"}"#);
        assert!(html.starts_with("<script>localStorage.setItem('playerInfo', \""));
        assert_eq!(html.matches("</script>").count(), 1);
    }

    #[test]
    fn state_get_returns_json() {
        reset();
        let json = handle_state_get("");
        assert!(json.contains("gameHistory"));
        assert!(json.contains("playerId"));
        reset();
    }

    #[test]
    fn restore_resumes_quest() {
        reset();
        let result = handle_restore_post(&saved_record().to_json());
        assert_eq!(result, "ok");
        with_quest(|q| {
            assert_eq!(q.step(), 2);
            assert_eq!(q.status_text(), "decoded");
            assert_eq!(q.player().nickname, "Indy");
        });
        reset();
    }

    #[test]
    fn restore_empty_body_is_noop() {
        reset();
        assert_eq!(handle_restore_post(""), "ok");
        with_quest(|q| assert_eq!(q.step(), 0));
        reset();
    }

    #[test]
    fn restore_invalid_json_reports_error() {
        reset();
        let result = handle_restore_post("state=not+json");
        assert!(result.starts_with("error:"));
        reset();
    }

    #[test]
    fn export_then_import_roundtrip() {
        reset();
        handle_restore_post(&saved_record().to_json());
        let script = handle_export_get("");
        assert!(script.contains("treasure-hunt-player.txt"));
        let encoded = with_quest(|q| q.player().encode_export());

        reset();
        let html = handle_import_post(&format!("state={}", encoded));
        assert!(html.contains("imported successfully"));
        assert!(html.contains("localStorage.setItem"));
        with_quest(|q| assert_eq!(q.player(), &saved_record()));
        reset();
    }

    #[test]
    fn saved_record_with_form_chars_in_nickname_restores() {
        reset();
        crate::routes::quest::handle_start_post("now=0&seed=1");
        crate::routes::quest::handle_resolve_post("now=1000");
        handle_profile_post("player_id=p-4&nickname=Tom%26state%3Dx");
        crate::routes::quest::handle_next_post("now=2000");
        let saved = handle_state_get("");
        assert!(saved.contains("Tom&state=x"));

        reset();
        assert_eq!(handle_restore_post(&saved), "ok");
        with_quest(|q| {
            assert_eq!(q.step(), 1);
            assert_eq!(q.player().nickname, "Tom&state=x");
        });

        reset();
        let html = handle_import_post(&saved);
        assert!(html.contains("imported successfully"));
        with_quest(|q| assert_eq!(q.player().nickname, "Tom&state=x"));
        reset();
    }

    #[test]
    fn import_garbage_fails() {
        reset();
        let html = handle_import_post("state=%%%");
        assert!(html.contains("Import failed"));
        reset();
    }

    #[test]
    fn profile_updates_and_persists() {
        reset();
        let html = handle_profile_post("player_id=p-3&nickname=Lara+Croft");
        assert!(html.contains("Welcome, Lara Croft!"));
        assert!(html.contains("Lara Croft"));
        assert!(html.contains("localStorage.setItem"));
        with_quest(|q| assert_eq!(q.player().player_id, "p-3"));
        reset();
    }

    #[test]
    fn profile_requires_nickname() {
        reset();
        let html = handle_profile_post("player_id=p-3");
        assert!(html.contains("Missing nickname"));
        reset();
    }
}
