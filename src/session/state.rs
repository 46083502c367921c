//! Client-side projection of room and game progress.
//!
//! [`SessionState`] is a pure state machine driven exclusively by
//! [`SessionEvent`]s plus a small set of user-initiated intents. Server
//! state is always authoritative: every `room:*`/`game:start` event
//! replaces the local [`Room`] wholesale (never field-patched), and an
//! authoritative update discards — never merges — any optimistic value for
//! the same logical turn or round.
//!
//! # Phase transitions
//!
//! ```text
//! menu --(user: create_room)--> creating --(room:created)--> waiting
//! menu --(user: join_room)----> joining --(room:* snapshot)--> waiting
//! menu --(user: find_match)---> matchmaking --(game:start)--> playing
//! waiting --(room:updated state=playing OR game:start)--> playing
//! playing --(game:state)--> playing          [refresh, no transition]
//! playing --(game:over)--> finished
//! waiting|matchmaking|playing --(user: leave)--> menu
//! finished --(user: play_again)--> menu
//! ```

use tracing::{debug, warn};

use crate::error::{ParlorError, Result};
use crate::event::SessionEvent;
use crate::games;
use crate::games::score_race::{RaceRanking, RaceStandings};
use crate::games::simultaneous::{self, RevealPreview};
use crate::protocol::{
    GameCategory, GameOverResult, GameState, GameStartPayload, PlayerId, Room, RoomState,
};

/// Where the client believes the local player is in the room lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No room, no pending intent.
    #[default]
    Menu,
    /// `room:create` sent, awaiting `room:created`.
    Creating,
    /// `room:join` sent, awaiting the first room snapshot.
    Joining,
    /// In a room, gathering players.
    Waiting,
    /// `matchmaking:find` sent, awaiting `game:start`.
    Matchmaking,
    /// Game session in progress.
    Playing,
    /// Terminal result received; idempotent until a new room.
    Finished,
}

/// A move sent but not yet reflected in an authoritative refresh.
/// Discarded, not merged, when the next `game:state` arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMove {
    pub mv: serde_json::Value,
}

/// The session projection consumed by the UI.
///
/// All fields under "authoritative" mirror server events only; the
/// "optimistic" fields are short-lived local previews.
#[derive(Debug, Default)]
pub struct SessionState {
    my_id: PlayerId,
    pub phase: SessionPhase,

    // Authoritative.
    pub connected: bool,
    pub room: Option<Room>,
    pub category: Option<GameCategory>,
    pub game_state: Option<GameState>,
    /// Turn authority. Meaningful only for turn-based games; only the
    /// server changes it — the client never predicts the next holder.
    pub current_turn: Option<PlayerId>,
    pub game_over: Option<GameOverResult>,
    /// Transient user-facing error; cleared on the next successful action.
    pub error: Option<String>,
    /// Score-race bookkeeping, present only for score-race sessions.
    pub standings: Option<RaceStandings>,

    // Optimistic.
    pub pending_move: Option<PendingMove>,
    pub reveal: Option<RevealPreview>,

    /// Game id requested via matchmaking, kept for cancellation.
    matchmaking_game: Option<String>,
}

impl SessionState {
    pub fn new(my_id: impl Into<PlayerId>) -> Self {
        Self {
            my_id: my_id.into(),
            ..Default::default()
        }
    }

    /// Identifier of the local player.
    pub fn my_id(&self) -> &PlayerId {
        &self.my_id
    }

    /// The other player in the current room, if known.
    pub fn opponent_id(&self) -> Option<&PlayerId> {
        self.room
            .as_ref()?
            .players
            .iter()
            .map(|p| &p.id)
            .find(|id| **id != self.my_id)
    }

    /// Whether the local player may act right now.
    pub fn is_my_turn(&self) -> bool {
        match self.category {
            Some(category) => {
                self.phase == SessionPhase::Playing
                    && games::is_my_turn(category, self.current_turn.as_ref(), &self.my_id)
            }
            None => false,
        }
    }

    // ── Event projection ────────────────────────────────────────────

    /// Apply one event to the projection.
    pub fn apply(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Connected => self.connected = true,
            SessionEvent::Disconnected { reason } => {
                self.connected = false;
                // Room and game state stay last-known-good until the caller
                // explicitly reconnects and rejoins.
                self.error = Some(
                    reason
                        .clone()
                        .unwrap_or_else(|| "connection lost".to_string()),
                );
            }
            SessionEvent::AuthSuccess { .. } => {}
            SessionEvent::RoomCreated { room }
            | SessionEvent::PlayerJoined { room }
            | SessionEvent::RoomUpdated { room } => self.replace_room(room.clone()),
            SessionEvent::PlayerLeft { room } => self.player_left(room.clone()),
            SessionEvent::GameStart(payload) => self.game_start(payload),
            SessionEvent::GameStateSync {
                game_state,
                current_turn,
            } => self.state_sync(game_state, current_turn.as_ref()),
            SessionEvent::GameOver(result) => self.game_over(result.clone()),
            SessionEvent::OpponentScore { score } => {
                if let Some(standings) = &mut self.standings {
                    standings.record_opponent_score(*score);
                }
            }
            SessionEvent::OpponentFinished { score } => {
                if let Some(standings) = &mut self.standings {
                    standings.record_opponent_finished(*score);
                }
                if self.standings.as_ref().is_some_and(RaceStandings::both_finished) {
                    self.finalize_race("completed");
                }
            }
            SessionEvent::ServerError { message } => {
                self.error = Some(message.clone());
                // A failed intent returns the user to the menu to retry.
                if matches!(
                    self.phase,
                    SessionPhase::Creating | SessionPhase::Joining | SessionPhase::Matchmaking
                ) {
                    self.phase = SessionPhase::Menu;
                    self.matchmaking_game = None;
                }
            }
            SessionEvent::RevealElapsed { round } => {
                if self.reveal.as_ref().is_some_and(|r| r.round == *round) {
                    self.reveal = None;
                }
            }
            SessionEvent::RaceClockExpired => {
                if self.phase == SessionPhase::Playing {
                    if let Some(standings) = &mut self.standings {
                        standings.force_finish();
                    }
                    self.finalize_race("time_up");
                }
            }
        }
    }

    /// Replace the room wholesale and realign the phase with the server's
    /// view of the room.
    fn replace_room(&mut self, room: Room) {
        let state = room.state;
        self.category = Some(room.category());
        self.room = Some(room);
        self.error = None;
        if self.phase == SessionPhase::Finished {
            // Terminal until play_again or a fresh game:start.
            return;
        }
        self.phase = match state {
            // Server state wins over any locally initiated ready race.
            RoomState::Playing => SessionPhase::Playing,
            RoomState::Waiting => SessionPhase::Waiting,
            RoomState::Finished => self.phase,
        };
    }

    fn player_left(&mut self, room: Room) {
        if self.phase == SessionPhase::Playing {
            // Equivalent to a same-session game over. The winner is the
            // surviving player where determinable.
            let winner = match room.players.as_slice() {
                [only] => Some(only.id.clone()),
                _ => None,
            };
            self.room = Some(room);
            self.pending_move = None;
            self.reveal = None;
            self.game_over = Some(GameOverResult {
                winner,
                reason: "opponent_left".to_string(),
                final_scores: None,
            });
            self.phase = SessionPhase::Finished;
        } else {
            self.replace_room(room);
        }
    }

    fn game_start(&mut self, payload: &GameStartPayload) {
        let category = payload.room.category();
        match GameState::decode(category, &payload.game_state) {
            Ok(state) => {
                let time_limit = payload.time_limit.or_else(|| match &state {
                    GameState::ScoreRace(race) => race.time_limit,
                    _ => None,
                });
                self.room = Some(payload.room.clone());
                self.category = Some(category);
                self.game_state = Some(state);
                self.current_turn = payload.current_turn.clone();
                self.game_over = None;
                self.pending_move = None;
                self.reveal = None;
                self.error = None;
                self.matchmaking_game = None;
                self.standings = match category {
                    GameCategory::ScoreRace => Some(RaceStandings::new(time_limit)),
                    _ => None,
                };
                self.phase = SessionPhase::Playing;
            }
            Err(e) => {
                warn!("undecodable game:start state payload: {e}");
            }
        }
    }

    fn state_sync(&mut self, game_state: &serde_json::Value, current_turn: Option<&PlayerId>) {
        if self.phase == SessionPhase::Finished {
            // Terminal state is idempotent; late refreshes for the ended
            // room are ignored until a new room is created.
            debug!("ignoring game:state after game over");
            return;
        }
        let Some(category) = self.category else {
            debug!("ignoring game:state with no active room");
            return;
        };
        match GameState::decode(category, game_state) {
            Ok(state) => {
                // Authoritative refresh: the pending optimistic move is
                // discarded, never merged.
                self.pending_move = None;
                if let Some(turn) = current_turn {
                    self.current_turn = Some(turn.clone());
                }
                if let GameState::Simultaneous(sim) = &state {
                    if self.reveal.is_none() {
                        self.reveal = simultaneous::preview_round(sim, &self.my_id);
                    }
                }
                self.game_state = Some(state);
            }
            Err(e) => {
                warn!("undecodable game:state payload: {e}");
            }
        }
    }

    fn game_over(&mut self, result: GameOverResult) {
        if self.phase == SessionPhase::Finished {
            // Duplicate terminal event: the first ruling stands.
            debug!("ignoring duplicate game:over");
            return;
        }
        if let (Some(standings), Some(scores)) = (&mut self.standings, &result.final_scores) {
            // Authoritative final scores overwrite local observations.
            let my = scores.get(&self.my_id).copied();
            let opp = self
                .room
                .as_ref()
                .and_then(|room| {
                    room.players
                        .iter()
                        .map(|p| &p.id)
                        .find(|id| **id != self.my_id)
                })
                .and_then(|id| scores.get(id))
                .copied();
            if let (Some(my), Some(opp)) = (my, opp) {
                standings.apply_final(my, opp);
            }
        }
        self.pending_move = None;
        self.reveal = None;
        self.game_over = Some(result);
        self.phase = SessionPhase::Finished;
    }

    /// Locally arbitrate a finished score race into a terminal result.
    fn finalize_race(&mut self, reason: &str) {
        if self.game_over.is_some() {
            return;
        }
        let Some(standings) = &self.standings else {
            return;
        };
        let Some(ranking) = standings.ranking() else {
            return;
        };
        let opponent = self.opponent_id().cloned();
        let winner = match ranking {
            RaceRanking::LocalWins => Some(self.my_id.clone()),
            RaceRanking::OpponentWins => opponent.clone(),
            RaceRanking::Draw => None,
        };
        let mut final_scores = std::collections::HashMap::new();
        final_scores.insert(self.my_id.clone(), standings.my_score);
        if let Some(opp) = opponent {
            final_scores.insert(opp, standings.opponent_score);
        }
        self.pending_move = None;
        self.game_over = Some(GameOverResult {
            winner,
            reason: reason.to_string(),
            final_scores: Some(final_scores),
        });
        self.phase = SessionPhase::Finished;
    }

    // ── User intents ────────────────────────────────────────────────

    /// Record the `room:create` intent.
    ///
    /// # Errors
    ///
    /// [`ParlorError::AlreadyInRoom`] outside the menu.
    pub fn begin_create(&mut self) -> Result<()> {
        self.require_menu()?;
        self.error = None;
        self.phase = SessionPhase::Creating;
        Ok(())
    }

    /// Record the `room:join` intent.
    ///
    /// # Errors
    ///
    /// [`ParlorError::AlreadyInRoom`] outside the menu.
    pub fn begin_join(&mut self) -> Result<()> {
        self.require_menu()?;
        self.error = None;
        self.phase = SessionPhase::Joining;
        Ok(())
    }

    /// Record the `matchmaking:find` intent.
    ///
    /// # Errors
    ///
    /// [`ParlorError::AlreadyInRoom`] outside the menu.
    pub fn begin_matchmaking(&mut self, game_id: impl Into<String>) -> Result<()> {
        self.require_menu()?;
        self.error = None;
        self.matchmaking_game = Some(game_id.into());
        self.phase = SessionPhase::Matchmaking;
        Ok(())
    }

    /// Abandon matchmaking, returning the game id to cancel on the wire.
    pub fn end_matchmaking(&mut self) -> Option<String> {
        let game_id = self.matchmaking_game.take()?;
        if self.phase == SessionPhase::Matchmaking {
            self.phase = SessionPhase::Menu;
        }
        Some(game_id)
    }

    /// Record a score reported by the embedded game runtime.
    pub fn record_local_score(&mut self, score: f64) {
        if let Some(standings) = &mut self.standings {
            standings.record_local_score(score);
        }
    }

    /// Record local completion reported by the embedded game runtime,
    /// arbitrating the race if the opponent already finished.
    pub fn record_local_finished(&mut self, score: f64) {
        if let Some(standings) = &mut self.standings {
            standings.record_local_finished(score);
        }
        if self.standings.as_ref().is_some_and(RaceStandings::both_finished) {
            self.finalize_race("completed");
        }
    }

    /// Record a queued turn-based move as pending optimistic state.
    pub fn note_pending_move(&mut self, mv: serde_json::Value) {
        self.error = None;
        self.pending_move = Some(PendingMove { mv });
    }

    /// Synchronously clear all room, game, optimistic, and race state.
    /// Returns `true` if there was a room or search to leave.
    pub fn leave(&mut self) -> bool {
        let had_context =
            self.room.is_some() || self.matchmaking_game.is_some() || self.phase != SessionPhase::Menu;
        self.phase = SessionPhase::Menu;
        self.room = None;
        self.category = None;
        self.game_state = None;
        self.current_turn = None;
        self.game_over = None;
        self.standings = None;
        self.pending_move = None;
        self.reveal = None;
        self.matchmaking_game = None;
        self.error = None;
        had_context
    }

    /// Return from the result screen to the menu.
    pub fn play_again(&mut self) {
        if self.phase == SessionPhase::Finished {
            self.leave();
        }
    }

    fn require_menu(&self) -> Result<()> {
        if self.phase == SessionPhase::Menu {
            Ok(())
        } else {
            Err(ParlorError::AlreadyInRoom)
        }
    }
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
    use crate::protocol::Player;
    use serde_json::json;

    fn room(id: &str, game_id: &str, state: RoomState, players: &[&str]) -> Room {
        Room {
            id: id.to_string(),
            game_id: game_id.to_string(),
            host_id: players.first().map(|p| p.to_string()).unwrap_or_default(),
            players: players
                .iter()
                .map(|p| Player {
                    id: p.to_string(),
                    ready: false,
                })
                .collect(),
            state,
            is_private: false,
            max_players: 2,
        }
    }

    fn start_payload(game_id: &str, state: serde_json::Value, turn: Option<&str>) -> SessionEvent {
        SessionEvent::GameStart(Box::new(GameStartPayload {
            room: room("r1", game_id, RoomState::Playing, &["alice", "bob"]),
            game_state: state,
            current_turn: turn.map(str::to_string),
            is_score_competition: game_id == "snake",
            time_limit: if game_id == "snake" { Some(30) } else { None },
        }))
    }

    fn playing_ttt() -> SessionState {
        let mut s = SessionState::new("alice");
        s.apply(&start_payload(
            "tic-tac-toe",
            json!({"board": [[null, null, null], [null, null, null], [null, null, null]],
                   "symbols": {"alice": "X", "bob": "O"}}),
            Some("alice"),
        ));
        s
    }

    #[test]
    fn create_flow_reaches_waiting() {
        let mut s = SessionState::new("alice");
        s.begin_create().unwrap();
        assert_eq!(s.phase, SessionPhase::Creating);
        s.apply(&SessionEvent::RoomCreated {
            room: room("r1", "tic-tac-toe", RoomState::Waiting, &["alice"]),
        });
        assert_eq!(s.phase, SessionPhase::Waiting);
        assert_eq!(s.room.as_ref().unwrap().id, "r1");
        assert_eq!(s.category, Some(GameCategory::TurnBased));
    }

    #[test]
    fn create_refused_outside_menu() {
        let mut s = SessionState::new("alice");
        s.begin_create().unwrap();
        assert!(matches!(s.begin_create(), Err(ParlorError::AlreadyInRoom)));
    }

    #[test]
    fn room_snapshot_replaces_wholesale() {
        let mut s = SessionState::new("alice");
        s.apply(&SessionEvent::RoomCreated {
            room: room("r1", "tic-tac-toe", RoomState::Waiting, &["alice"]),
        });
        s.apply(&SessionEvent::RoomUpdated {
            room: room("r1", "tic-tac-toe", RoomState::Waiting, &["alice", "bob"]),
        });
        let players = &s.room.as_ref().unwrap().players;
        assert_eq!(players.len(), 2);
        assert_eq!(players[1].id, "bob");
    }

    #[test]
    fn server_playing_state_wins_over_ready_race() {
        let mut s = SessionState::new("alice");
        s.apply(&SessionEvent::RoomCreated {
            room: room("r1", "chess", RoomState::Waiting, &["alice", "bob"]),
        });
        s.apply(&SessionEvent::RoomUpdated {
            room: room("r1", "chess", RoomState::Playing, &["alice", "bob"]),
        });
        assert_eq!(s.phase, SessionPhase::Playing);
    }

    #[test]
    fn game_start_resets_session() {
        let mut s = SessionState::new("alice");
        s.begin_matchmaking("tic-tac-toe").unwrap();
        s.apply(&start_payload(
            "tic-tac-toe",
            json!({"board": [[null]], "symbols": {"alice": "X"}}),
            Some("bob"),
        ));
        assert_eq!(s.phase, SessionPhase::Playing);
        assert_eq!(s.current_turn.as_deref(), Some("bob"));
        assert!(!s.is_my_turn());
        assert!(s.game_over.is_none());
        assert!(s.end_matchmaking().is_none());
    }

    #[test]
    fn score_race_start_builds_standings_with_limit() {
        let mut s = SessionState::new("alice");
        s.apply(&start_payload("snake", json!({}), None));
        let standings = s.standings.as_ref().unwrap();
        assert_eq!(standings.time_limit, Some(30));
        // Score races ignore turn authority entirely.
        assert!(s.is_my_turn());
    }

    #[test]
    fn sync_discards_pending_move_and_keeps_turn_when_absent() {
        let mut s = playing_ttt();
        s.note_pending_move(json!({"row": 0, "col": 0}));
        s.apply(&SessionEvent::GameStateSync {
            game_state: json!({"board": [[ "X", null, null]], "symbols": {"alice": "X"}}),
            current_turn: None,
        });
        assert!(s.pending_move.is_none());
        assert_eq!(s.current_turn.as_deref(), Some("alice"));
        s.apply(&SessionEvent::GameStateSync {
            game_state: json!({"board": [["X", null, null]], "symbols": {"alice": "X"}}),
            current_turn: Some("bob".to_string()),
        });
        assert_eq!(s.current_turn.as_deref(), Some("bob"));
    }

    #[test]
    fn sync_ignored_after_game_over() {
        let mut s = playing_ttt();
        s.apply(&SessionEvent::GameOver(GameOverResult {
            winner: Some("bob".to_string()),
            reason: "win".to_string(),
            final_scores: None,
        }));
        let before = s.game_state.clone();
        s.apply(&SessionEvent::GameStateSync {
            game_state: json!({"board": [["O"]], "symbols": {}}),
            current_turn: Some("alice".to_string()),
        });
        assert_eq!(s.game_state, before);
        assert_eq!(s.phase, SessionPhase::Finished);
    }

    #[test]
    fn duplicate_game_over_first_ruling_stands() {
        let mut s = playing_ttt();
        s.apply(&SessionEvent::GameOver(GameOverResult {
            winner: Some("alice".to_string()),
            reason: "win".to_string(),
            final_scores: None,
        }));
        s.apply(&SessionEvent::GameOver(GameOverResult {
            winner: Some("bob".to_string()),
            reason: "win".to_string(),
            final_scores: None,
        }));
        assert_eq!(
            s.game_over.as_ref().unwrap().winner.as_deref(),
            Some("alice")
        );
    }

    #[test]
    fn opponent_leaving_mid_game_ends_session() {
        let mut s = playing_ttt();
        s.apply(&SessionEvent::PlayerLeft {
            room: room("r1", "tic-tac-toe", RoomState::Waiting, &["alice"]),
        });
        assert_eq!(s.phase, SessionPhase::Finished);
        let over = s.game_over.as_ref().unwrap();
        assert_eq!(over.reason, "opponent_left");
        assert_eq!(over.winner.as_deref(), Some("alice"));
    }

    #[test]
    fn player_left_in_lobby_is_plain_update() {
        let mut s = SessionState::new("alice");
        s.apply(&SessionEvent::RoomCreated {
            room: room("r1", "chess", RoomState::Waiting, &["alice", "bob"]),
        });
        s.apply(&SessionEvent::PlayerLeft {
            room: room("r1", "chess", RoomState::Waiting, &["alice"]),
        });
        assert_eq!(s.phase, SessionPhase::Waiting);
        assert!(s.game_over.is_none());
    }

    #[test]
    fn server_error_reverts_intent_to_menu() {
        let mut s = SessionState::new("alice");
        s.begin_join().unwrap();
        s.apply(&SessionEvent::ServerError {
            message: "room full".to_string(),
        });
        assert_eq!(s.phase, SessionPhase::Menu);
        assert_eq!(s.error.as_deref(), Some("room full"));
        // The next successful action clears the sticky error.
        s.begin_create().unwrap();
        assert!(s.error.is_none());
    }

    #[test]
    fn disconnect_keeps_last_known_room() {
        let mut s = playing_ttt();
        s.apply(&SessionEvent::Disconnected { reason: None });
        assert!(!s.connected);
        assert!(s.room.is_some());
        assert_eq!(s.error.as_deref(), Some("connection lost"));
    }

    #[test]
    fn reveal_set_on_full_round_and_cleared_by_matching_expiry() {
        let mut s = SessionState::new("alice");
        s.apply(&start_payload("rock-paper-scissors", json!({"round": 1}), None));
        s.apply(&SessionEvent::GameStateSync {
            game_state: json!({"round": 1, "choices": {"alice": "rock", "bob": "scissors"}}),
            current_turn: None,
        });
        assert_eq!(s.reveal.as_ref().unwrap().round, 1);
        s.apply(&SessionEvent::RevealElapsed { round: 2 });
        assert!(s.reveal.is_some());
        s.apply(&SessionEvent::RevealElapsed { round: 1 });
        assert!(s.reveal.is_none());
    }

    #[test]
    fn race_clock_expiry_forces_time_up_result() {
        let mut s = SessionState::new("alice");
        s.apply(&start_payload("snake", json!({}), None));
        if let Some(standings) = &mut s.standings {
            standings.record_local_score(12.0);
            standings.record_opponent_finished(5.0);
        }
        s.apply(&SessionEvent::RaceClockExpired);
        assert_eq!(s.phase, SessionPhase::Finished);
        let over = s.game_over.as_ref().unwrap();
        assert_eq!(over.reason, "time_up");
        assert_eq!(over.winner.as_deref(), Some("alice"));
        assert_eq!(
            over.final_scores.as_ref().unwrap().get("alice"),
            Some(&12.0)
        );
    }

    #[test]
    fn race_completes_when_both_sides_finish() {
        let mut s = SessionState::new("alice");
        s.apply(&start_payload("snake", json!({}), None));
        if let Some(standings) = &mut s.standings {
            standings.record_local_finished(7.0);
        }
        s.apply(&SessionEvent::OpponentFinished { score: 9.0 });
        assert_eq!(s.phase, SessionPhase::Finished);
        let over = s.game_over.as_ref().unwrap();
        assert_eq!(over.reason, "completed");
        assert_eq!(over.winner.as_deref(), Some("bob"));
    }

    #[test]
    fn leave_clears_everything() {
        let mut s = playing_ttt();
        s.note_pending_move(json!({"row": 1, "col": 1}));
        assert!(s.leave());
        assert_eq!(s.phase, SessionPhase::Menu);
        assert!(s.room.is_none());
        assert!(s.game_state.is_none());
        assert!(s.pending_move.is_none());
        assert!(s.standings.is_none());
        assert!(!s.leave());
    }

    #[test]
    fn play_again_only_from_finished() {
        let mut s = playing_ttt();
        s.play_again();
        assert_eq!(s.phase, SessionPhase::Playing);
        s.apply(&SessionEvent::GameOver(GameOverResult {
            winner: None,
            reason: "draw".to_string(),
            final_scores: None,
        }));
        s.play_again();
        assert_eq!(s.phase, SessionPhase::Menu);
        assert!(s.game_over.is_none());
    }
}
