//! Integration-style client tests for the Parlor Client.
//!
//! Uses the shared `MockTransport` from `tests/common` to script server
//! events and verify that `SessionClient` processes them correctly:
//! handshake, intent serialization, event delivery, and shutdown.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use parlor_client::protocol::ClientMessage;
use parlor_client::{
    EventBus, ParlorError, SessionClient, SessionConfig, SessionEvent,
};
use serde_json::json;
use tokio::sync::mpsc;

use common::{
    auth_success_json, error_json, game_start_json, init_tracing, player_joined_json,
    room_created_json, MockTransport,
};

// ════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════

/// Connect a client over a mock transport whose first scripted response is
/// the auth ack, followed by `rest`.
#[allow(clippy::type_complexity)]
async fn connect_client(
    rest: Vec<Option<Result<String, ParlorError>>>,
) -> (
    SessionClient,
    Arc<EventBus>,
    mpsc::Receiver<SessionEvent>,
    Arc<StdMutex<Vec<String>>>,
    Arc<AtomicBool>,
) {
    init_tracing();
    let mut incoming = vec![Some(Ok(auth_success_json("user-1")))];
    incoming.extend(rest);
    let (transport, sent, closed) = MockTransport::new(incoming);
    let bus = Arc::new(EventBus::new());
    let (_sub, events) = bus.subscribe_all();

    let config = SessionConfig::new("user-1", "tok");
    let client = SessionClient::connect(transport, config, Arc::clone(&bus))
        .await
        .expect("handshake");
    (client, bus, events, sent, closed)
}

/// Poll until the client has written at least `count` messages to the wire.
async fn wait_for_sent(sent: &Arc<StdMutex<Vec<String>>>, count: usize) {
    for _ in 0..200 {
        if sent.lock().expect("sent lock").len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "timed out waiting for {count} sent messages, have {}",
        sent.lock().expect("sent lock").len()
    );
}

/// Consume events up to and including the auth ack.
async fn drain_handshake(rx: &mut mpsc::Receiver<SessionEvent>) {
    let ev = rx.recv().await.expect("expected Connected event");
    assert!(matches!(ev, SessionEvent::Connected), "got {ev:?}");
    let ev = rx.recv().await.expect("expected AuthSuccess event");
    assert!(matches!(ev, SessionEvent::AuthSuccess { .. }), "got {ev:?}");
}

// ════════════════════════════════════════════════════════════════════
// Intent serialization
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn intents_reach_the_wire_in_call_order() {
    let (mut client, _bus, _events, sent, _closed) = connect_client(vec![]).await;

    client.create_room("connect-four", true).expect("create");
    client.set_ready(true).expect("ready");
    client
        .send_move(json!({"column": 3}))
        .expect("move");
    client.leave_room().expect("leave");

    // Auth plus the four intents.
    wait_for_sent(&sent, 5).await;
    let messages = sent.lock().expect("sent lock");
    let parsed: Vec<ClientMessage> = messages
        .iter()
        .map(|m| serde_json::from_str(m).expect("wire message parses"))
        .collect();

    assert_eq!(
        parsed[1],
        ClientMessage::RoomCreate {
            game_id: "connect-four".into(),
            is_private: true,
        }
    );
    assert_eq!(parsed[2], ClientMessage::RoomReady { ready: true });
    assert_eq!(
        parsed[3],
        ClientMessage::GameMove {
            mv: json!({"column": 3}),
        }
    );
    assert_eq!(parsed[4], ClientMessage::RoomLeave);

    client.shutdown().await;
}

#[tokio::test]
async fn matchmaking_and_competition_wire_shapes() {
    let (mut client, _bus, _events, sent, _closed) = connect_client(vec![]).await;

    client.find_match("chess").expect("find");
    client.cancel_matchmaking("chess").expect("cancel");
    client.send_invite("friend-9", "snake").expect("invite");
    client.report_score(41.5).expect("score");
    client.report_finished(44.0).expect("finished");

    wait_for_sent(&sent, 6).await;
    let messages = sent.lock().expect("sent lock");

    assert!(messages[1].contains(r#""type":"matchmaking:find""#));
    assert!(messages[2].contains(r#""type":"matchmaking:cancel""#));
    assert!(messages[3].contains(r#""type":"invite:send""#));
    assert!(messages[3].contains(r#""friendId":"friend-9""#));
    assert!(messages[4].contains(r#""type":"competition:score""#));
    assert!(messages[5].contains(r#""type":"competition:finished""#));
    assert!(messages[5].contains(r#""finalScore":44.0"#));

    client.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Event delivery
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn room_lifecycle_events_delivered_in_order() {
    let (mut client, _bus, mut events, _sent, _closed) = connect_client(vec![
        Some(Ok(room_created_json("tic-tac-toe", "user-1"))),
        Some(Ok(player_joined_json("tic-tac-toe", &["user-1", "user-2"]))),
        Some(Ok(game_start_json(
            "tic-tac-toe",
            &["user-1", "user-2"],
            json!({"board": [[null, null, null], [null, null, null], [null, null, null]]}),
            Some("user-2"),
            None,
        ))),
    ])
    .await;
    drain_handshake(&mut events).await;

    match events.recv().await.expect("room:created") {
        SessionEvent::RoomCreated { room } => {
            assert_eq!(room.id, "room-1");
            assert_eq!(room.players.len(), 1);
        }
        other => panic!("expected RoomCreated, got {other:?}"),
    }
    match events.recv().await.expect("room:playerJoined") {
        SessionEvent::PlayerJoined { room } => assert_eq!(room.players.len(), 2),
        other => panic!("expected PlayerJoined, got {other:?}"),
    }
    match events.recv().await.expect("game:start") {
        SessionEvent::GameStart(payload) => {
            assert_eq!(payload.current_turn.as_deref(), Some("user-2"));
        }
        other => panic!("expected GameStart, got {other:?}"),
    }

    client.shutdown().await;
}

#[tokio::test]
async fn server_error_is_delivered_and_not_fatal() {
    let (mut client, _bus, mut events, _sent, _closed) = connect_client(vec![
        Some(Ok(error_json("room full"))),
        Some(Ok(room_created_json("chess", "user-1"))),
    ])
    .await;
    drain_handshake(&mut events).await;

    assert_eq!(
        events.recv().await.expect("error"),
        SessionEvent::ServerError {
            message: "room full".into(),
        }
    );
    // The connection survives the error.
    assert!(matches!(
        events.recv().await.expect("room:created"),
        SessionEvent::RoomCreated { .. }
    ));
    assert!(client.is_connected());

    client.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Shutdown
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn shutdown_closes_transport_and_emits_disconnected() {
    let (mut client, _bus, mut events, _sent, closed) = connect_client(vec![]).await;
    drain_handshake(&mut events).await;

    client.shutdown().await;

    assert!(closed.load(Ordering::Relaxed));
    assert_eq!(
        events.recv().await.expect("disconnected"),
        SessionEvent::Disconnected {
            reason: Some("client shut down".into()),
        }
    );
    assert!(!client.is_connected());
    assert!(matches!(
        client.create_room("chess", false),
        Err(ParlorError::NotConnected)
    ));
}

#[tokio::test]
async fn server_close_emits_disconnected() {
    let (mut client, _bus, mut events, _sent, _closed) =
        connect_client(vec![Some(Ok(room_created_json("chess", "user-1"))), None]).await;
    drain_handshake(&mut events).await;

    assert!(matches!(
        events.recv().await.expect("room:created"),
        SessionEvent::RoomCreated { .. }
    ));
    assert_eq!(
        events.recv().await.expect("disconnected"),
        SessionEvent::Disconnected { reason: None }
    );

    client.shutdown().await;
}
