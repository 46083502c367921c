//! End-to-end session scenarios over a mock transport.
//!
//! Each test drives a real `SessionClient` transport loop plus a
//! `GameSession` pump, injecting server events through a channel-backed
//! transport and asserting the projection and the wire traffic.

mod common;

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use parlor_client::{
    EventBus, GameSession, ParlorError, SessionClient, SessionConfig, SessionEvent, SessionPhase,
};
use serde_json::json;
use tokio::sync::mpsc;

use common::{
    auth_success_json, error_json, game_start_json, game_state_json, init_tracing,
    room_created_json, ChannelTransport,
};

// ════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════

type ServerHandle = mpsc::UnboundedSender<Result<String, ParlorError>>;

/// Connect a session as `user-1` over a channel transport. Events injected
/// through the returned handle after this point are seen by the session.
async fn start_session() -> (GameSession, ServerHandle, Arc<StdMutex<Vec<String>>>) {
    init_tracing();
    let (transport, server, sent, _closed) = ChannelTransport::new();
    server
        .send(Ok(auth_success_json("user-1")))
        .expect("preload ack");

    let bus = Arc::new(EventBus::new());
    let config = SessionConfig::new("user-1", "tok");
    let client = Arc::new(
        SessionClient::connect(transport, config, Arc::clone(&bus))
            .await
            .expect("handshake"),
    );
    (GameSession::new(client, bus), server, sent)
}

/// Inject one server event and fold the resulting session event.
async fn pump(session: &mut GameSession, server: &ServerHandle, raw: String) -> SessionEvent {
    server.send(Ok(raw)).expect("inject");
    session.next_change().await.expect("event")
}

/// Poll until at least `count` messages reached the wire.
async fn wait_for_sent(sent: &Arc<StdMutex<Vec<String>>>, count: usize) {
    for _ in 0..200 {
        if sent.lock().expect("sent lock").len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {count} sent messages");
}

fn ttt_board_state(board: serde_json::Value, turn: Option<&str>) -> String {
    game_state_json(
        json!({"board": board, "symbols": {"user-1": "X", "user-2": "O"}}),
        turn,
    )
}

// ════════════════════════════════════════════════════════════════════
// Session startup
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn session_starts_connected_after_handshake() {
    let (session, _server, _sent) = start_session().await;

    // The handshake completed before the session subscribed, so the
    // projection must be seeded rather than waiting for a bus event.
    assert!(session.state().connected);
    assert_eq!(session.phase(), SessionPhase::Menu);
}

// ════════════════════════════════════════════════════════════════════
// Matchmaking into a turn-based game
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn matchmaking_into_chess_waits_for_opponent_turn() {
    let (mut session, server, sent) = start_session().await;

    session.find_match("chess").expect("find");
    assert_eq!(session.phase(), SessionPhase::Matchmaking);
    wait_for_sent(&sent, 2).await;
    assert!(sent.lock().expect("lock")[1].contains(r#""type":"matchmaking:find""#));

    let event = pump(
        &mut session,
        &server,
        game_start_json(
            "chess",
            &["user-2", "user-1"],
            json!({"fen": "startpos", "symbols": {"user-1": "b", "user-2": "w"}}),
            Some("user-2"),
            None,
        ),
    )
    .await;
    assert!(matches!(event, SessionEvent::GameStart(_)));

    assert_eq!(session.phase(), SessionPhase::Playing);
    assert!(!session.is_my_turn());
    assert_eq!(session.my_symbol(), "b");
    assert!(matches!(
        session.make_move(json!({"from": "e2", "to": "e4"})),
        Err(ParlorError::NotYourTurn)
    ));
}

// ════════════════════════════════════════════════════════════════════
// Turn-based move flow
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn move_is_optimistic_until_the_refresh_discards_it() {
    let (mut session, server, sent) = start_session().await;

    pump(
        &mut session,
        &server,
        game_start_json(
            "tic-tac-toe",
            &["user-1", "user-2"],
            json!({"board": [[null, null, null], [null, null, null], [null, null, null]],
                   "symbols": {"user-1": "X", "user-2": "O"}}),
            Some("user-1"),
            None,
        ),
    )
    .await;
    assert!(session.is_my_turn());

    session.make_move(json!({"row": 0, "col": 0})).expect("move");
    assert!(session.pending_move().is_some());
    wait_for_sent(&sent, 2).await;
    assert!(sent.lock().expect("lock")[1].contains(r#""type":"game:move""#));

    // Authoritative refresh lands: pending discarded, turn moves on.
    pump(
        &mut session,
        &server,
        ttt_board_state(
            json!([["X", null, null], [null, null, null], [null, null, null]]),
            Some("user-2"),
        ),
    )
    .await;
    assert!(session.pending_move().is_none());
    assert!(!session.is_my_turn());

    // Back on turn, the occupied cell is rejected before the wire.
    pump(
        &mut session,
        &server,
        ttt_board_state(
            json!([["X", "O", null], [null, null, null], [null, null, null]]),
            Some("user-1"),
        ),
    )
    .await;
    assert!(matches!(
        session.make_move(json!({"row": 0, "col": 0})),
        Err(ParlorError::MoveUnavailable)
    ));
    assert!(session
        .make_move(json!({"row": 1, "col": 1}))
        .is_ok());
}

// ════════════════════════════════════════════════════════════════════
// Room creation failure
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn failed_create_returns_to_menu_with_error() {
    let (mut session, server, _sent) = start_session().await;

    session.create_room("tic-tac-toe", false).expect("create");
    assert_eq!(session.phase(), SessionPhase::Creating);
    assert!(matches!(
        session.create_room("chess", false),
        Err(ParlorError::AlreadyInRoom)
    ));

    pump(&mut session, &server, error_json("room limit reached")).await;
    assert_eq!(session.phase(), SessionPhase::Menu);
    assert_eq!(session.error(), Some("room limit reached"));
}

#[tokio::test]
async fn successful_ready_toggle_clears_stale_error() {
    let (mut session, server, sent) = start_session().await;

    session.create_room("tic-tac-toe", false).expect("create");
    pump(
        &mut session,
        &server,
        room_created_json("tic-tac-toe", "user-1"),
    )
    .await;
    assert_eq!(session.phase(), SessionPhase::Waiting);

    // A lobby-time error leaves the phase alone but sets the banner.
    pump(&mut session, &server, error_json("invite failed")).await;
    assert_eq!(session.error(), Some("invite failed"));

    session.set_ready(true).expect("ready");
    assert_eq!(session.error(), None);
    wait_for_sent(&sent, 3).await;
    assert!(sent.lock().expect("lock")[2].contains(r#""type":"room:ready""#));
}

// ════════════════════════════════════════════════════════════════════
// Simultaneous reveal window
// ════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn rps_reveal_shows_then_expires() {
    let (mut session, server, _sent) = start_session().await;

    pump(
        &mut session,
        &server,
        game_start_json(
            "rock-paper-scissors",
            &["user-1", "user-2"],
            json!({"round": 1, "choices": {}}),
            None,
            None,
        ),
    )
    .await;
    session.make_move(json!({"choice": "rock"})).expect("choice");

    pump(
        &mut session,
        &server,
        game_state_json(
            json!({"round": 1, "choices": {"user-1": "rock", "user-2": "scissors"},
                   "scores": {"user-1": 1, "user-2": 0}}),
            None,
        ),
    )
    .await;
    let reveal = session.reveal().expect("reveal window open");
    assert_eq!(reveal.round, 1);
    assert_eq!(reveal.opponent_choice, "scissors");

    // The 2-second window elapses (paused clock auto-advances).
    let event = session.next_change().await.expect("expiry");
    assert_eq!(event, SessionEvent::RevealElapsed { round: 1 });
    assert!(session.reveal().is_none());
}

// ════════════════════════════════════════════════════════════════════
// Score race
// ════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn race_clock_expiry_settles_at_current_scores() {
    let (mut session, server, sent) = start_session().await;

    pump(
        &mut session,
        &server,
        game_start_json("snake", &["user-1", "user-2"], json!({}), None, Some(3)),
    )
    .await;
    assert_eq!(session.phase(), SessionPhase::Playing);
    assert_eq!(session.time_left(), Some(3));

    session
        .handle_runtime_message(r#"{"type": "score", "score": 10}"#)
        .expect("score report");
    assert_eq!(session.standings().expect("standings").my_score, 10.0);

    let event = session.next_change().await.expect("expiry");
    assert_eq!(event, SessionEvent::RaceClockExpired);
    assert_eq!(session.phase(), SessionPhase::Finished);
    let over = session.game_over().expect("result");
    assert_eq!(over.reason, "time_up");
    assert_eq!(over.winner.as_deref(), Some("user-1"));

    // The unreported completion was submitted at expiry.
    wait_for_sent(&sent, 3).await;
    let messages = sent.lock().expect("lock");
    assert!(messages[1].contains(r#""type":"competition:score""#));
    assert!(messages[2].contains(r#""type":"competition:finished""#));
}

#[tokio::test]
async fn race_completes_when_both_report_finished() {
    let (mut session, server, _sent) = start_session().await;

    pump(
        &mut session,
        &server,
        game_start_json("snake", &["user-1", "user-2"], json!({}), None, None),
    )
    .await;

    session
        .handle_runtime_message(r#"{"type": "gameOver", "score": 7}"#)
        .expect("local finish");
    assert_eq!(session.phase(), SessionPhase::Playing);

    pump(
        &mut session,
        &server,
        r#"{"type": "competition:opponentFinished", "data": {"score": 9.0}}"#.to_string(),
    )
    .await;
    assert_eq!(session.phase(), SessionPhase::Finished);
    let over = session.game_over().expect("result");
    assert_eq!(over.reason, "completed");
    assert_eq!(over.winner.as_deref(), Some("user-2"));
}

#[tokio::test(start_paused = true)]
async fn leaving_cancels_the_race_clock() {
    let (mut session, server, sent) = start_session().await;

    pump(
        &mut session,
        &server,
        game_start_json("snake", &["user-1", "user-2"], json!({}), None, Some(30)),
    )
    .await;
    assert_eq!(session.time_left(), Some(30));

    session.leave_room().expect("leave");
    assert_eq!(session.phase(), SessionPhase::Menu);
    assert_eq!(session.time_left(), None);
    wait_for_sent(&sent, 2).await;
    assert!(sent.lock().expect("lock")[1].contains(r#""type":"room:leave""#));

    // Well past the would-be deadline, no expiry ever fires.
    let raced = tokio::time::timeout(Duration::from_secs(60), session.next_change()).await;
    assert!(raced.is_err(), "no event should arrive after leaving");
    assert_eq!(session.phase(), SessionPhase::Menu);
}

// ════════════════════════════════════════════════════════════════════
// Runtime bridge hygiene
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn malformed_runtime_messages_are_dropped() {
    let (mut session, server, sent) = start_session().await;

    pump(
        &mut session,
        &server,
        game_start_json("snake", &["user-1", "user-2"], json!({}), None, None),
    )
    .await;

    session.handle_runtime_message("not json").expect("dropped");
    session
        .handle_runtime_message(r#"{"type": "score", "score": -5}"#)
        .expect("dropped");
    session
        .handle_runtime_message(r#"{"type": "cheat", "score": 1e9}"#)
        .expect("dropped");

    // Give the loop a beat; only the auth message should be on the wire.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(sent.lock().expect("lock").len(), 1);
}
