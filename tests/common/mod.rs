#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Shared test utilities for Parlor Client integration tests.
//!
//! Provides a channel-based [`MockTransport`] and helper functions for
//! constructing common server event JSON strings.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use parlor_client::protocol::{GameStartPayload, Player, RoomState, ServerMessage};
use parlor_client::{ParlorError, Room, Transport};

/// Install a fmt subscriber honoring `RUST_LOG`, once per test binary.
///
/// Safe to call from every test; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── MockTransport ───────────────────────────────────────────────────

/// A channel-based mock transport for integration testing.
///
/// Scripted server responses are consumed in order by `recv()`.
/// All messages sent by the client are recorded in `sent`.
pub struct MockTransport {
    /// Scripted server responses (consumed in order by `recv`).
    incoming: VecDeque<Option<Result<String, ParlorError>>>,
    /// Recorded outgoing messages from the client.
    pub sent: Arc<StdMutex<Vec<String>>>,
    /// Whether `close()` has been called.
    pub closed: Arc<AtomicBool>,
}

impl MockTransport {
    /// Create a new mock transport with the given scripted incoming messages.
    ///
    /// Returns the transport plus shared handles for inspecting sent messages
    /// and whether close was called.
    pub fn new(
        incoming: Vec<Option<Result<String, ParlorError>>>,
    ) -> (Self, Arc<StdMutex<Vec<String>>>, Arc<AtomicBool>) {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let transport = Self {
            incoming: VecDeque::from(incoming),
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        };
        (transport, sent, closed)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, message: String) -> Result<(), ParlorError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, ParlorError>> {
        if let Some(item) = self.incoming.pop_front() {
            item
        } else {
            // No more scripted messages — hang forever so the transport loop
            // stays alive until shutdown is called.
            std::future::pending().await
        }
    }

    async fn close(&mut self) -> Result<(), ParlorError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── ChannelTransport ────────────────────────────────────────────────

/// A transport fed by the test through an unbounded channel, for scenarios
/// where server events must be injected after setup rather than scripted
/// up front.
///
/// Dropping the sender half reads as a clean server-side close.
pub struct ChannelTransport {
    incoming: tokio::sync::mpsc::UnboundedReceiver<Result<String, ParlorError>>,
    pub sent: Arc<StdMutex<Vec<String>>>,
    pub closed: Arc<AtomicBool>,
}

impl ChannelTransport {
    #[allow(clippy::type_complexity)]
    pub fn new() -> (
        Self,
        tokio::sync::mpsc::UnboundedSender<Result<String, ParlorError>>,
        Arc<StdMutex<Vec<String>>>,
        Arc<AtomicBool>,
    ) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let transport = Self {
            incoming: rx,
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        };
        (transport, tx, sent, closed)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&mut self, message: String) -> Result<(), ParlorError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, ParlorError>> {
        self.incoming.recv().await
    }

    async fn close(&mut self) -> Result<(), ParlorError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── JSON helper functions ───────────────────────────────────────────

/// Returns the JSON string for a successful `auth:success` server event.
pub fn auth_success_json(user_id: &str) -> String {
    serde_json::to_string(&ServerMessage::AuthSuccess {
        user_id: user_id.into(),
    })
    .expect("auth_success_json serialization")
}

/// A two-player waiting room snapshot.
pub fn room(id: &str, game_id: &str, state: RoomState, players: &[&str]) -> Room {
    Room {
        id: id.into(),
        game_id: game_id.into(),
        host_id: players.first().map(|p| (*p).to_string()).unwrap_or_default(),
        players: players
            .iter()
            .map(|p| Player {
                id: (*p).to_string(),
                ready: false,
            })
            .collect(),
        state,
        is_private: false,
        max_players: 2,
    }
}

/// Returns the JSON string for a `room:created` server event.
pub fn room_created_json(game_id: &str, host: &str) -> String {
    serde_json::to_string(&ServerMessage::RoomCreated {
        room: room("room-1", game_id, RoomState::Waiting, &[host]),
    })
    .expect("room_created_json serialization")
}

/// Returns the JSON string for a `room:playerJoined` server event.
pub fn player_joined_json(game_id: &str, players: &[&str]) -> String {
    serde_json::to_string(&ServerMessage::RoomPlayerJoined {
        room: room("room-1", game_id, RoomState::Waiting, players),
    })
    .expect("player_joined_json serialization")
}

/// Returns the JSON string for a `game:start` server event.
pub fn game_start_json(
    game_id: &str,
    players: &[&str],
    game_state: serde_json::Value,
    current_turn: Option<&str>,
    time_limit: Option<u64>,
) -> String {
    serde_json::to_string(&ServerMessage::GameStart(Box::new(GameStartPayload {
        room: room("room-1", game_id, RoomState::Playing, players),
        game_state,
        current_turn: current_turn.map(str::to_string),
        is_score_competition: time_limit.is_some(),
        time_limit,
    })))
    .expect("game_start_json serialization")
}

/// Returns the JSON string for a `game:state` server event.
pub fn game_state_json(game_state: serde_json::Value, current_turn: Option<&str>) -> String {
    serde_json::to_string(&ServerMessage::GameStateSync {
        game_state,
        current_turn: current_turn.map(str::to_string),
    })
    .expect("game_state_json serialization")
}

/// Returns the JSON string for an `error` server event.
pub fn error_json(message: &str) -> String {
    serde_json::to_string(&ServerMessage::Error {
        message: message.into(),
    })
    .expect("error_json serialization")
}
