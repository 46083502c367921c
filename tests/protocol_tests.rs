//! Wire-format conformance tests for the Parlor session protocol.
//!
//! Server payloads are written here as raw JSON literals, exactly as the
//! server emits them, so a serde attribute regression shows up as a test
//! failure rather than silently dropped events.

use parlor_client::protocol::{ClientMessage, GameCategory, GameState, ServerMessage};
use parlor_client::RoomState;
use serde_json::json;

// ════════════════════════════════════════════════════════════════════
// Inbound: server events
// ════════════════════════════════════════════════════════════════════

#[test]
fn room_created_parses_camel_case_snapshot() {
    let raw = r#"{
        "type": "room:created",
        "data": {
            "room": {
                "id": "ROOM42",
                "gameId": "connect-four",
                "hostId": "alice",
                "players": [{"id": "alice", "ready": false}],
                "state": "waiting",
                "isPrivate": true,
                "maxPlayers": 2
            }
        }
    }"#;
    let message: ServerMessage = serde_json::from_str(raw).expect("parses");
    match message {
        ServerMessage::RoomCreated { room } => {
            assert_eq!(room.id, "ROOM42");
            assert_eq!(room.game_id, "connect-four");
            assert_eq!(room.host_id, "alice");
            assert_eq!(room.state, RoomState::Waiting);
            assert!(room.is_private);
            assert_eq!(room.max_players, 2);
            assert_eq!(room.category(), GameCategory::TurnBased);
        }
        other => panic!("expected RoomCreated, got {other:?}"),
    }
}

#[test]
fn game_start_parses_with_raw_state_payload() {
    let raw = r#"{
        "type": "game:start",
        "data": {
            "room": {
                "id": "ROOM42",
                "gameId": "chess",
                "hostId": "alice",
                "players": [{"id": "alice"}, {"id": "bob"}],
                "state": "playing",
                "isPrivate": false,
                "maxPlayers": 2
            },
            "gameState": {"fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"},
            "currentTurn": "bob"
        }
    }"#;
    let message: ServerMessage = serde_json::from_str(raw).expect("parses");
    let ServerMessage::GameStart(payload) = message else {
        panic!("expected GameStart");
    };
    assert_eq!(payload.current_turn.as_deref(), Some("bob"));
    assert!(!payload.is_score_competition);

    // The raw payload decodes by the room's category, not by shape.
    let state = GameState::decode(payload.room.category(), &payload.game_state).expect("decodes");
    let GameState::TurnBased(tb) = state else {
        panic!("chess is turn-based");
    };
    assert!(tb.fen.is_some());
    assert!(tb.board.is_none());
}

#[test]
fn game_over_final_scores_are_optional() {
    let bare = r#"{"type": "game:over", "data": {"winner": "alice", "reason": "win"}}"#;
    let message: ServerMessage = serde_json::from_str(bare).expect("parses");
    let ServerMessage::GameOver(result) = message else {
        panic!("expected GameOver");
    };
    assert_eq!(result.winner.as_deref(), Some("alice"));
    assert!(result.final_scores.is_none());

    let scored = r#"{
        "type": "game:over",
        "data": {"winner": null, "reason": "time_up", "finalScores": {"alice": 12.0, "bob": 12.0}}
    }"#;
    let message: ServerMessage = serde_json::from_str(scored).expect("parses");
    let ServerMessage::GameOver(result) = message else {
        panic!("expected GameOver");
    };
    assert!(result.winner.is_none());
    assert_eq!(
        result.final_scores.expect("scores").get("bob"),
        Some(&12.0)
    );
}

#[test]
fn competition_events_parse() {
    let raw = r#"{"type": "competition:opponentScore", "data": {"score": 17.5}}"#;
    assert_eq!(
        serde_json::from_str::<ServerMessage>(raw).expect("parses"),
        ServerMessage::OpponentScore { score: 17.5 }
    );

    let raw = r#"{"type": "competition:opponentFinished", "data": {"score": 31.0}}"#;
    assert_eq!(
        serde_json::from_str::<ServerMessage>(raw).expect("parses"),
        ServerMessage::OpponentFinished { score: 31.0 }
    );
}

#[test]
fn unknown_event_name_fails_to_parse() {
    let raw = r#"{"type": "spectator:joined", "data": {"id": "x"}}"#;
    assert!(serde_json::from_str::<ServerMessage>(raw).is_err());
}

// ════════════════════════════════════════════════════════════════════
// Outbound: client intents
// ════════════════════════════════════════════════════════════════════

#[test]
fn auth_intent_wire_shape() {
    let value = serde_json::to_value(ClientMessage::Auth {
        user_id: "alice".into(),
        token: "tok-1".into(),
    })
    .expect("serializes");
    assert_eq!(
        value,
        json!({"type": "auth", "data": {"userId": "alice", "token": "tok-1"}})
    );
}

#[test]
fn move_intent_uses_move_key() {
    let value = serde_json::to_value(ClientMessage::GameMove {
        mv: json!({"row": 1, "col": 2}),
    })
    .expect("serializes");
    assert_eq!(
        value,
        json!({"type": "game:move", "data": {"move": {"row": 1, "col": 2}}})
    );
}

#[test]
fn competition_intents_wire_shape() {
    let value = serde_json::to_value(ClientMessage::CompetitionFinished { final_score: 99.0 })
        .expect("serializes");
    assert_eq!(
        value,
        json!({"type": "competition:finished", "data": {"finalScore": 99.0}})
    );
}

// ════════════════════════════════════════════════════════════════════
// Category resolution and state decoding
// ════════════════════════════════════════════════════════════════════

#[test]
fn category_comes_from_game_id_alone() {
    assert_eq!(GameCategory::of("tic-tac-toe"), GameCategory::TurnBased);
    assert_eq!(GameCategory::of("connect-four"), GameCategory::TurnBased);
    assert_eq!(GameCategory::of("chess"), GameCategory::TurnBased);
    assert_eq!(
        GameCategory::of("rock-paper-scissors"),
        GameCategory::Simultaneous
    );
    // Everything else is a score race: the embedded-game catalog is open.
    assert_eq!(GameCategory::of("snake"), GameCategory::ScoreRace);
    assert_eq!(GameCategory::of("some-future-game"), GameCategory::ScoreRace);
}

#[test]
fn score_race_state_decodes_with_sparse_fields() {
    let state = GameState::decode(
        GameCategory::ScoreRace,
        &json!({"scores": {"alice": 3.0}, "timeLimit": 30}),
    )
    .expect("decodes");
    let GameState::ScoreRace(race) = state else {
        panic!("expected score race state");
    };
    assert_eq!(race.scores.get("alice"), Some(&3.0));
    assert_eq!(race.time_limit, Some(30));
    assert!(race.finished.is_empty());
    assert!(race.start_time.is_none());
}

#[test]
fn mismatched_state_shape_fails_decode() {
    // A board where a choices map is expected is a decode error, reported
    // rather than misread.
    let result = GameState::decode(
        GameCategory::Simultaneous,
        &json!({"choices": "not-a-map"}),
    );
    assert!(result.is_err());
}
