//! Wire types for the Parlor game session protocol.
//!
//! Every message serializes as `{"type": "<domain:verb>", "data": {...}}`
//! with camelCase payload fields, matching the server's wire format exactly.
//! Room snapshots are always transmitted whole — the client replaces its
//! local `Room` on every `room:*` event rather than patching fields, so a
//! reordered or dropped intermediate snapshot can never leave a stale field
//! behind.
//!
//! Game state payloads arrive as raw JSON and are decoded by
//! [`GameState::decode`] using the [`GameCategory`] resolved from the room's
//! `game_id`. The category is a pure function of the id; it is never
//! inferred from which fields happen to be present in a payload.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ── Type aliases ────────────────────────────────────────────────────

/// Server-issued opaque player identifier (supplied by the auth provider).
pub type PlayerId = String;

/// Server-issued room identifier, doubling as the join code.
pub type RoomId = String;

// ── Enums ───────────────────────────────────────────────────────────

/// Server-side lifecycle state of a room.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    /// Players are gathering and toggling readiness.
    #[default]
    Waiting,
    /// A game session is in progress.
    Playing,
    /// The game has ended with a terminal result.
    Finished,
}

/// The three structurally different game paradigms the client supports.
///
/// Resolved once per room from the `game_id` via [`GameCategory::of`] and
/// carried alongside the room for the rest of the session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GameCategory {
    /// Discrete alternating-turn board games (tic-tac-toe, connect four, chess).
    TurnBased,
    /// Simultaneous-reveal games (rock-paper-scissors).
    Simultaneous,
    /// Continuous score races against a shared wall-clock deadline.
    ScoreRace,
}

impl GameCategory {
    /// Resolve the category of a game id.
    ///
    /// The built-in board games are a fixed set; everything else is an
    /// embedded single-player game played as a score race, so unknown ids
    /// map to [`GameCategory::ScoreRace`].
    pub fn of(game_id: &str) -> Self {
        match game_id {
            "tic-tac-toe" | "connect-four" | "chess" => Self::TurnBased,
            "rock-paper-scissors" => Self::Simultaneous,
            _ => Self::ScoreRace,
        }
    }
}

// ── Structs ─────────────────────────────────────────────────────────

/// A player as named by a room snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    /// Lobby readiness. Mutated only by server acknowledgment of a
    /// `room:ready` intent, never optimistically.
    #[serde(default)]
    pub ready: bool,
}

/// Full snapshot of a room. Owned by the server; the client holds at most
/// one at a time and replaces it wholesale on every `room:*` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub game_id: String,
    pub host_id: PlayerId,
    pub players: Vec<Player>,
    pub state: RoomState,
    #[serde(default)]
    pub is_private: bool,
    pub max_players: u8,
}

impl Room {
    /// The category of this room's game.
    pub fn category(&self) -> GameCategory {
        GameCategory::of(&self.game_id)
    }

    /// Whether the snapshot names the given player.
    pub fn has_player(&self, id: &str) -> bool {
        self.players.iter().any(|p| p.id == id)
    }
}

/// Terminal result of a game session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameOverResult {
    /// The winning player, or `None` for a draw.
    #[serde(default)]
    pub winner: Option<PlayerId>,
    /// Machine-readable reason (`"completed"`, `"opponent_left"`, `"time_up"`, ...).
    pub reason: String,
    /// Final per-player scores, where the game produces them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_scores: Option<HashMap<PlayerId, f64>>,
}

// ── Game state ──────────────────────────────────────────────────────

/// State slice for a turn-based positional game.
///
/// Grid games carry `board` (row-major, row 0 at the top); chess carries
/// `fen`. The `symbols` map assigns each player their glyph or color and
/// may be absent in the brief window between `game:start` and the first
/// `game:state` refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TurnBasedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<Vec<Vec<Option<String>>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fen: Option<String>,
    #[serde(default)]
    pub symbols: HashMap<PlayerId, String>,
}

/// State slice for a simultaneous-reveal game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SimultaneousState {
    /// Choices submitted for the current round.
    #[serde(default)]
    pub choices: HashMap<PlayerId, String>,
    #[serde(default)]
    pub round: u32,
    #[serde(default)]
    pub scores: HashMap<PlayerId, u32>,
    #[serde(default)]
    pub max_rounds: u32,
}

/// State slice for a score-race game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRaceState {
    #[serde(default)]
    pub scores: HashMap<PlayerId, f64>,
    /// Explicit completion flags. A high score alone never implies a side
    /// has finished.
    #[serde(default)]
    pub finished: HashMap<PlayerId, bool>,
    /// Shared time limit in seconds, if the game enforces one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u64>,
    /// Server wall-clock start, milliseconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
}

/// Typed game state. Exactly one variant is active per room, keyed by the
/// room's [`GameCategory`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum GameState {
    TurnBased(TurnBasedState),
    Simultaneous(SimultaneousState),
    ScoreRace(ScoreRaceState),
}

impl GameState {
    /// Decode a raw `gameState` wire payload into the variant selected by
    /// `category`.
    ///
    /// # Errors
    ///
    /// Returns [`ParlorError::Serialization`](crate::ParlorError::Serialization)
    /// when the payload does not match the category's shape.
    pub fn decode(category: GameCategory, value: &serde_json::Value) -> Result<Self> {
        Ok(match category {
            GameCategory::TurnBased => Self::TurnBased(serde_json::from_value(value.clone())?),
            GameCategory::Simultaneous => {
                Self::Simultaneous(serde_json::from_value(value.clone())?)
            }
            GameCategory::ScoreRace => Self::ScoreRace(serde_json::from_value(value.clone())?),
        })
    }

    /// The category this state belongs to.
    pub fn category(&self) -> GameCategory {
        match self {
            Self::TurnBased(_) => GameCategory::TurnBased,
            Self::Simultaneous(_) => GameCategory::Simultaneous,
            Self::ScoreRace(_) => GameCategory::ScoreRace,
        }
    }
}

// ── Payload structs ─────────────────────────────────────────────────

/// Payload for the `game:start` server event.
/// Boxed where embedded in enums to keep them small.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameStartPayload {
    pub room: Room,
    /// Raw state payload; decode with the category of `room.game_id`.
    pub game_state: serde_json::Value,
    /// Initial turn authority. Meaningful only for turn-based games.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_turn: Option<PlayerId>,
    #[serde(default)]
    pub is_score_competition: bool,
    /// Score-race time limit in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u64>,
}

// ── Messages ────────────────────────────────────────────────────────

/// Message types sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Authentication handshake (MUST be the first message).
    #[serde(rename = "auth")]
    Auth {
        user_id: PlayerId,
        /// Bearer token from the auth provider, used once at connect time.
        token: String,
    },
    /// Create a room for a specific game.
    #[serde(rename = "room:create")]
    RoomCreate { game_id: String, is_private: bool },
    /// Join a room by code.
    #[serde(rename = "room:join")]
    RoomJoin { room_id: RoomId },
    /// Leave the current room.
    #[serde(rename = "room:leave")]
    RoomLeave,
    /// Toggle lobby readiness.
    #[serde(rename = "room:ready")]
    RoomReady { ready: bool },
    /// Submit a turn-based move. Forwarded verbatim; legality is the
    /// server's responsibility.
    #[serde(rename = "game:move")]
    GameMove {
        #[serde(rename = "move")]
        mv: serde_json::Value,
    },
    /// Non-turn-based peer state update.
    #[serde(rename = "game:update")]
    GameUpdate { state: serde_json::Value },
    /// Search for a random opponent.
    #[serde(rename = "matchmaking:find")]
    MatchmakingFind { game_id: String },
    /// Cancel an in-flight opponent search.
    #[serde(rename = "matchmaking:cancel")]
    MatchmakingCancel { game_id: String },
    /// Invite a friend to a game out of band.
    #[serde(rename = "invite:send")]
    InviteSend { friend_id: PlayerId, game_id: String },
    /// Report the local player's running score in a score race.
    #[serde(rename = "competition:score")]
    CompetitionScore { score: f64 },
    /// Report the local player's final score and completion.
    #[serde(rename = "competition:finished")]
    CompetitionFinished { final_score: f64 },
}

/// Message types sent from server to client.
///
/// The variant set doubles as the inbound event allowlist: event names
/// outside it fail to deserialize and are dropped by the transport loop,
/// which tolerates protocol additions without a client upgrade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Authentication handshake acknowledged.
    #[serde(rename = "auth:success")]
    AuthSuccess { user_id: PlayerId },
    /// Room created by the local player. Full snapshot.
    #[serde(rename = "room:created")]
    RoomCreated { room: Room },
    /// A player joined the room. Full snapshot.
    #[serde(rename = "room:playerJoined")]
    RoomPlayerJoined { room: Room },
    /// A player left the room. Full snapshot of the survivors.
    #[serde(rename = "room:playerLeft")]
    RoomPlayerLeft { room: Room },
    /// Any other room change. Full snapshot.
    #[serde(rename = "room:updated")]
    RoomUpdated { room: Room },
    /// The game session begins (boxed to reduce enum size).
    #[serde(rename = "game:start")]
    GameStart(Box<GameStartPayload>),
    /// Authoritative state refresh.
    #[serde(rename = "game:state")]
    GameStateSync {
        game_state: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current_turn: Option<PlayerId>,
    },
    /// Terminal result for the current session.
    #[serde(rename = "game:over")]
    GameOver(GameOverResult),
    /// The remote player's running score in a score race.
    #[serde(rename = "competition:opponentScore")]
    OpponentScore { score: f64 },
    /// The remote player finished their score race.
    #[serde(rename = "competition:opponentFinished")]
    OpponentFinished { score: f64 },
    /// Any failure (invalid move, room full, room not found, ...).
    /// Never fatal to the connection.
    #[serde(rename = "error")]
    Error { message: String },
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn category_is_pure_in_game_id() {
        assert_eq!(GameCategory::of("chess"), GameCategory::TurnBased);
        assert_eq!(GameCategory::of("tic-tac-toe"), GameCategory::TurnBased);
        assert_eq!(GameCategory::of("connect-four"), GameCategory::TurnBased);
        assert_eq!(
            GameCategory::of("rock-paper-scissors"),
            GameCategory::Simultaneous
        );
        // Embedded single-player games are an open-ended catalog.
        assert_eq!(GameCategory::of("snake"), GameCategory::ScoreRace);
        assert_eq!(GameCategory::of("flappy-bird"), GameCategory::ScoreRace);
    }

    #[test]
    fn decode_ignores_payload_shape_hints() {
        // A payload that *looks* like a score race must still decode as the
        // category says, not as its fields suggest.
        let value = serde_json::json!({ "scores": { "a": 1 }, "finished": {} });
        let state = GameState::decode(GameCategory::Simultaneous, &value).unwrap();
        assert!(matches!(state, GameState::Simultaneous(_)));
    }

    #[test]
    fn decode_turn_based_board() {
        let value = serde_json::json!({
            "board": [[null, "X", null], [null, null, null], ["O", null, null]],
            "symbols": { "a": "X", "b": "O" }
        });
        let state = GameState::decode(GameCategory::TurnBased, &value).unwrap();
        let GameState::TurnBased(tb) = state else {
            panic!("expected turn-based state");
        };
        let board = tb.board.unwrap();
        assert_eq!(board[0][1].as_deref(), Some("X"));
        assert_eq!(tb.symbols.get("b").map(String::as_str), Some("O"));
    }

    #[test]
    fn client_message_wire_names() {
        let json = serde_json::to_value(ClientMessage::RoomCreate {
            game_id: "chess".into(),
            is_private: true,
        })
        .unwrap();
        assert_eq!(json["type"], "room:create");
        assert_eq!(json["data"]["gameId"], "chess");
        assert_eq!(json["data"]["isPrivate"], true);

        let json = serde_json::to_value(ClientMessage::RoomLeave).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "room:leave" }));
    }

    #[test]
    fn game_move_payload_uses_move_key() {
        let json = serde_json::to_value(ClientMessage::GameMove {
            mv: serde_json::json!({ "row": 1, "col": 2 }),
        })
        .unwrap();
        assert_eq!(json["type"], "game:move");
        assert_eq!(json["data"]["move"]["row"], 1);
    }

    #[test]
    fn unknown_event_name_fails_to_deserialize() {
        let raw = r#"{"type":"room:renamed","data":{}}"#;
        assert!(serde_json::from_str::<ServerMessage>(raw).is_err());
    }
}
