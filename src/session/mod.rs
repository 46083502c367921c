//! High-level session driver.
//!
//! [`GameSession`] owns one subscription on the event bus, folds every
//! event into a [`SessionState`] projection, and runs the side effects the
//! pure projection cannot: the score-race countdown, the simultaneous-game
//! reveal window, and wire intents derived from local state changes.
//!
//! The intended loop is: call an action method in response to user input,
//! await [`GameSession::next_change`] to pump events, and re-render from
//! the accessors after every change.

pub mod state;

pub use state::{PendingMove, SessionPhase, SessionState};

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::bridge::{self, RuntimeMessage};
use crate::bus::{EventBus, SubscriptionId};
use crate::client::SessionClient;
use crate::error::{ParlorError, Result};
use crate::event::SessionEvent;
use crate::games::score_race::{RaceStandings, RaceTimer};
use crate::games::simultaneous::{RevealPreview, REVEAL_DURATION};
use crate::games;
use crate::protocol::{GameOverResult, GameState, PlayerId, Room, RoomId};

/// Session facade combining the wire client, the event bus, and the local
/// projection.
///
/// Not `Clone`: exactly one owner pumps events. Share read access by
/// rendering from the accessors after each [`next_change`] returns.
///
/// [`next_change`]: GameSession::next_change
pub struct GameSession {
    client: Arc<SessionClient>,
    bus: Arc<EventBus>,
    subscription: SubscriptionId,
    events: mpsc::Receiver<SessionEvent>,
    state: SessionState,
    race_timer: Option<RaceTimer>,
    reveal_task: Option<JoinHandle<()>>,
}

impl GameSession {
    /// Attach a session to a connected client.
    pub fn new(client: Arc<SessionClient>, bus: Arc<EventBus>) -> Self {
        let (subscription, events) = bus.subscribe_all();
        let mut state = SessionState::new(client.user_id().clone());
        // The handshake events were published before this subscription
        // existed; seed the flag from the client instead.
        state.connected = client.is_connected();
        Self {
            client,
            bus,
            subscription,
            events,
            state,
            race_timer: None,
            reveal_task: None,
        }
    }

    // ── Event pump ──────────────────────────────────────────────────

    /// Wait for the next event, fold it into the projection, and run any
    /// side effects it triggers. Returns `None` once the bus drops the
    /// subscription (client shut down).
    pub async fn next_change(&mut self) -> Option<SessionEvent> {
        let event = self.events.recv().await?;
        self.process_event(&event);
        Some(event)
    }

    fn process_event(&mut self, event: &SessionEvent) {
        let prev_reveal = self.state.reveal.as_ref().map(|r| r.round);
        let was_locally_finished = self
            .state
            .standings
            .as_ref()
            .is_none_or(|s| s.my_finished);

        self.state.apply(event);

        match event {
            SessionEvent::GameStart(_) => {
                self.cancel_timers();
                if let Some(limit) = self.state.standings.as_ref().and_then(|s| s.time_limit) {
                    self.race_timer = Some(RaceTimer::start(limit, Arc::clone(&self.bus)));
                }
            }
            SessionEvent::GameStateSync { .. } => {
                let round = self.state.reveal.as_ref().map(|r| r.round);
                if let Some(round) = round {
                    if Some(round) != prev_reveal {
                        self.spawn_reveal_expiry(round);
                    }
                }
            }
            SessionEvent::RaceClockExpired => {
                // The local runtime never got to report completion; submit
                // the score observed at expiry so the server can settle.
                if !was_locally_finished {
                    let score = self
                        .state
                        .standings
                        .as_ref()
                        .map_or(0.0, |s| s.my_score);
                    if let Err(e) = self.client.report_finished(score) {
                        warn!("failed to report score at clock expiry: {e}");
                    }
                }
            }
            SessionEvent::Disconnected { .. } => self.cancel_timers(),
            _ => {}
        }

        if self.state.phase == SessionPhase::Finished {
            self.cancel_timers();
        }
    }

    fn spawn_reveal_expiry(&mut self, round: u32) {
        if let Some(task) = self.reveal_task.take() {
            task.abort();
        }
        let bus = Arc::clone(&self.bus);
        self.reveal_task = Some(tokio::spawn(async move {
            tokio::time::sleep(REVEAL_DURATION).await;
            bus.publish_always(SessionEvent::RevealElapsed { round }).await;
        }));
    }

    fn cancel_timers(&mut self) {
        if let Some(timer) = self.race_timer.take() {
            timer.cancel();
        }
        if let Some(task) = self.reveal_task.take() {
            task.abort();
        }
    }

    // ── Actions ─────────────────────────────────────────────────────

    /// Request a new room for `game_id`.
    ///
    /// # Errors
    ///
    /// [`ParlorError::AlreadyInRoom`] outside the menu, or a transport
    /// error from the underlying client.
    pub fn create_room(&mut self, game_id: impl Into<String>, is_private: bool) -> Result<()> {
        self.state.begin_create()?;
        self.undo_on_err(self.client.create_room(game_id, is_private))
    }

    /// Join an existing room by id.
    pub fn join_room(&mut self, room_id: impl Into<RoomId>) -> Result<()> {
        self.state.begin_join()?;
        self.undo_on_err(self.client.join_room(room_id))
    }

    /// Enter the matchmaking queue for `game_id`.
    pub fn find_match(&mut self, game_id: impl Into<String>) -> Result<()> {
        let game_id = game_id.into();
        self.state.begin_matchmaking(game_id.clone())?;
        self.undo_on_err(self.client.find_match(game_id))
    }

    /// Leave the matchmaking queue. A no-op when no search is active.
    pub fn cancel_matchmaking(&mut self) -> Result<()> {
        match self.state.end_matchmaking() {
            Some(game_id) => self.client.cancel_matchmaking(game_id),
            None => Ok(()),
        }
    }

    /// Toggle lobby readiness.
    ///
    /// # Errors
    ///
    /// [`ParlorError::NotInRoom`] outside the waiting phase.
    pub fn set_ready(&mut self, ready: bool) -> Result<()> {
        if self.state.phase != SessionPhase::Waiting {
            return Err(ParlorError::NotInRoom);
        }
        self.client.set_ready(ready)?;
        self.state.error = None;
        Ok(())
    }

    /// Submit a move or round choice for the current game.
    ///
    /// The move is recorded optimistically as pending and sent as-is; the
    /// server remains the rules authority.
    ///
    /// # Errors
    ///
    /// [`ParlorError::NotInRoom`] outside a game session,
    /// [`ParlorError::NotYourTurn`] when the turn authority is elsewhere,
    /// [`ParlorError::MoveUnavailable`] when the target cell or column is
    /// already occupied.
    pub fn make_move(&mut self, mv: serde_json::Value) -> Result<()> {
        if self.state.phase != SessionPhase::Playing {
            return Err(ParlorError::NotInRoom);
        }
        if !self.state.is_my_turn() {
            return Err(ParlorError::NotYourTurn);
        }
        if let Some(state) = &self.state.game_state {
            if !games::move_allowed(state, &mv) {
                return Err(ParlorError::MoveUnavailable);
            }
        }
        self.state.note_pending_move(mv.clone());
        self.client.send_move(mv)
    }

    /// Push a raw state update for games that stream state rather than
    /// discrete moves.
    pub fn send_update(&mut self, update: serde_json::Value) -> Result<()> {
        if self.state.phase != SessionPhase::Playing {
            return Err(ParlorError::NotInRoom);
        }
        self.client.send_update(update)
    }

    /// Leave the current room or matchmaking queue.
    ///
    /// Local state is cleared and timers are cancelled before anything is
    /// sent, so the session is back at the menu even if the send fails.
    pub fn leave_room(&mut self) -> Result<()> {
        let searching = self.state.end_matchmaking();
        let had_room = self.state.room.is_some();
        self.state.leave();
        self.cancel_timers();
        match searching {
            Some(game_id) => self.client.cancel_matchmaking(game_id),
            None if had_room => self.client.leave_room(),
            None => Ok(()),
        }
    }

    /// Invite a friend to play `game_id`.
    pub fn send_invite(
        &self,
        friend_id: impl Into<PlayerId>,
        game_id: impl Into<String>,
    ) -> Result<()> {
        self.client.send_invite(friend_id, game_id)
    }

    /// Dismiss the result screen and return to the menu.
    pub fn play_again(&mut self) {
        self.state.play_again();
        self.cancel_timers();
    }

    /// Forward one message from the embedded game runtime.
    ///
    /// Malformed or out-of-session messages are dropped with a debug log;
    /// the runtime is untrusted and must not be able to wedge the session.
    pub fn handle_runtime_message(&mut self, raw: &str) -> Result<()> {
        let Some(message) = bridge::parse_runtime_message(raw) else {
            debug!("dropping malformed runtime message");
            return Ok(());
        };
        if self.state.phase != SessionPhase::Playing {
            debug!("dropping runtime message outside an active game");
            return Ok(());
        }
        match message {
            RuntimeMessage::Score { score } => {
                self.state.record_local_score(score);
                self.client.report_score(score)
            }
            RuntimeMessage::GameOver { score } => {
                self.state.record_local_finished(score);
                let result = self.client.report_finished(score);
                if self.state.phase == SessionPhase::Finished {
                    self.cancel_timers();
                }
                result
            }
        }
    }

    fn undo_on_err(&mut self, result: Result<()>) -> Result<()> {
        if result.is_err() {
            self.state.leave();
        }
        result
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn room(&self) -> Option<&Room> {
        self.state.room.as_ref()
    }

    pub fn game_state(&self) -> Option<&GameState> {
        self.state.game_state.as_ref()
    }

    pub fn current_turn(&self) -> Option<&PlayerId> {
        self.state.current_turn.as_ref()
    }

    pub fn game_over(&self) -> Option<&GameOverResult> {
        self.state.game_over.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn is_my_turn(&self) -> bool {
        self.state.is_my_turn()
    }

    /// The local player's glyph, or a neutral placeholder before symbols
    /// are assigned.
    pub fn my_symbol(&self) -> String {
        match &self.state.game_state {
            Some(state) => games::my_symbol(state, self.state.my_id()),
            None => games::NEUTRAL_SYMBOL.to_string(),
        }
    }

    pub fn pending_move(&self) -> Option<&PendingMove> {
        self.state.pending_move.as_ref()
    }

    pub fn reveal(&self) -> Option<&RevealPreview> {
        self.state.reveal.as_ref()
    }

    pub fn standings(&self) -> Option<&RaceStandings> {
        self.state.standings.as_ref()
    }

    /// Seconds left on the race clock, if one is running.
    pub fn time_left(&self) -> Option<u64> {
        self.race_timer.as_ref().map(RaceTimer::time_left)
    }

    /// Direct access to the underlying projection, for rendering.
    pub fn state(&self) -> &SessionState {
        &self.state
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("phase", &self.state.phase)
            .field("room", &self.state.room.as_ref().map(|r| &r.id))
            .field("race_timer", &self.race_timer.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.subscription);
        self.cancel_timers();
    }
}
