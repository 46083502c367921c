//! Typed session events fanned out over the [`EventBus`](crate::EventBus).
//!
//! [`SessionEvent`] is the tagged union of every inbound protocol event plus
//! the handful of locally synthesized ones (connection lifecycle, reveal
//! window expiry, race clock expiry). Funneling local timers through the
//! same union keeps one state shape for the UI regardless of where an
//! update originated.

use crate::protocol::{GameOverResult, GameStartPayload, PlayerId, Room, ServerMessage};

/// Every event a session consumer can observe.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Transport established; emitted once before the handshake.
    Connected,
    /// Transport torn down. Always the final event on a subscription.
    Disconnected { reason: Option<String> },
    /// Authentication handshake acknowledged.
    AuthSuccess { user_id: PlayerId },
    /// `room:created` snapshot.
    RoomCreated { room: Room },
    /// `room:playerJoined` snapshot.
    PlayerJoined { room: Room },
    /// `room:playerLeft` snapshot.
    PlayerLeft { room: Room },
    /// `room:updated` snapshot.
    RoomUpdated { room: Room },
    /// `game:start`.
    GameStart(Box<GameStartPayload>),
    /// `game:state` authoritative refresh.
    GameStateSync {
        game_state: serde_json::Value,
        current_turn: Option<PlayerId>,
    },
    /// `game:over` terminal result.
    GameOver(GameOverResult),
    /// `competition:opponentScore`.
    OpponentScore { score: f64 },
    /// `competition:opponentFinished`.
    OpponentFinished { score: f64 },
    /// Server `error` event; transient and user-facing.
    ServerError { message: String },
    /// Local: the simultaneous-reveal display window for `round` elapsed.
    RevealElapsed { round: u32 },
    /// Local: the score-race countdown reached zero.
    RaceClockExpired,
}

/// Discriminant of a [`SessionEvent`], used for bus subscription filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Disconnected,
    AuthSuccess,
    RoomCreated,
    PlayerJoined,
    PlayerLeft,
    RoomUpdated,
    GameStart,
    GameStateSync,
    GameOver,
    OpponentScore,
    OpponentFinished,
    ServerError,
    RevealElapsed,
    RaceClockExpired,
}

impl SessionEvent {
    /// The discriminant of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connected => EventKind::Connected,
            Self::Disconnected { .. } => EventKind::Disconnected,
            Self::AuthSuccess { .. } => EventKind::AuthSuccess,
            Self::RoomCreated { .. } => EventKind::RoomCreated,
            Self::PlayerJoined { .. } => EventKind::PlayerJoined,
            Self::PlayerLeft { .. } => EventKind::PlayerLeft,
            Self::RoomUpdated { .. } => EventKind::RoomUpdated,
            Self::GameStart(_) => EventKind::GameStart,
            Self::GameStateSync { .. } => EventKind::GameStateSync,
            Self::GameOver(_) => EventKind::GameOver,
            Self::OpponentScore { .. } => EventKind::OpponentScore,
            Self::OpponentFinished { .. } => EventKind::OpponentFinished,
            Self::ServerError { .. } => EventKind::ServerError,
            Self::RevealElapsed { .. } => EventKind::RevealElapsed,
            Self::RaceClockExpired => EventKind::RaceClockExpired,
        }
    }
}

impl From<ServerMessage> for SessionEvent {
    fn from(msg: ServerMessage) -> Self {
        match msg {
            ServerMessage::AuthSuccess { user_id } => Self::AuthSuccess { user_id },
            ServerMessage::RoomCreated { room } => Self::RoomCreated { room },
            ServerMessage::RoomPlayerJoined { room } => Self::PlayerJoined { room },
            ServerMessage::RoomPlayerLeft { room } => Self::PlayerLeft { room },
            ServerMessage::RoomUpdated { room } => Self::RoomUpdated { room },
            ServerMessage::GameStart(payload) => Self::GameStart(payload),
            ServerMessage::GameStateSync {
                game_state,
                current_turn,
            } => Self::GameStateSync {
                game_state,
                current_turn,
            },
            ServerMessage::GameOver(result) => Self::GameOver(result),
            ServerMessage::OpponentScore { score } => Self::OpponentScore { score },
            ServerMessage::OpponentFinished { score } => Self::OpponentFinished { score },
            ServerMessage::Error { message } => Self::ServerError { message },
        }
    }
}
