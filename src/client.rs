//! Async connection manager for the Parlor session protocol.
//!
//! [`SessionClient`] is a thin handle that communicates with a background
//! transport loop task via an unbounded MPSC channel. The loop decodes
//! every inbound wire message and publishes it as a typed
//! [`SessionEvent`] on the injected [`EventBus`]; consumers subscribe to
//! the bus rather than to the client.
//!
//! The client owns the one physical connection. Reconnection is never
//! automatic: a dropped connection surfaces as `connected = false` plus a
//! final `Disconnected` event, and resuming requires a fresh explicit
//! [`SessionClient::connect`] call — silently reconnecting mid-game could
//! resume into a room the server has already torn down.
//!
//! # Example
//!
//! ```rust,ignore
//! let bus = Arc::new(EventBus::new());
//! let transport = WebSocketTransport::connect("ws://localhost:4000/ws").await?;
//! let config = SessionConfig::new("user-42", "bearer-token");
//! let client = SessionClient::connect(transport, config, Arc::clone(&bus)).await?;
//!
//! client.find_match("chess")?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::bus::EventBus;
use crate::error::{ParlorError, Result};
use crate::event::SessionEvent;
use crate::protocol::{ClientMessage, PlayerId, RoomId, ServerMessage};
use crate::transport::Transport;

/// Default timeout for the authentication handshake.
const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`SessionClient`] connection.
///
/// The user id and bearer token come from the external auth provider and
/// are used once, at connect time.
///
/// # Example
///
/// ```
/// use parlor_client::client::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::new("user-42", "tok_abc")
///     .with_handshake_timeout(Duration::from_secs(5));
/// assert_eq!(config.user_id, "user-42");
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Identifier of the local player.
    pub user_id: PlayerId,
    /// Bearer token presented during the handshake.
    pub token: String,
    /// How long [`SessionClient::connect`] waits for `auth:success`.
    ///
    /// Defaults to **10 seconds**.
    pub handshake_timeout: Duration,
    /// Timeout for the graceful shutdown before the loop task is aborted.
    ///
    /// Defaults to **1 second**.
    pub shutdown_timeout: Duration,
}

impl SessionConfig {
    /// Create a new configuration with default timeouts.
    pub fn new(user_id: impl Into<PlayerId>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Set the authentication handshake timeout.
    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the graceful shutdown timeout. A zero timeout aborts the
    /// transport loop immediately without waiting.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

// ── Shared state ────────────────────────────────────────────────────

/// Internal shared state between the client handle and the transport loop.
struct ClientState {
    connected: AtomicBool,
    authenticated: AtomicBool,
}

impl ClientState {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            authenticated: AtomicBool::new(false),
        }
    }
}

// ── Client handle ───────────────────────────────────────────────────

/// Handle to the one physical connection.
///
/// Created via [`SessionClient::connect`] (waits for the handshake) or
/// [`SessionClient::start`] (returns immediately with the ack receiver).
///
/// All intent methods serialize a [`ClientMessage`] and queue it to the
/// transport loop; they return once the message is queued, without a
/// round-trip await. Only this handle writes to the transport — every
/// other component is a read-only bus observer.
pub struct SessionClient {
    /// Sender half of the command channel to the transport loop.
    cmd_tx: mpsc::UnboundedSender<ClientMessage>,
    /// Shared state updated by the transport loop.
    state: Arc<ClientState>,
    /// Identifier of the local player.
    user_id: PlayerId,
    /// Handle to the background transport loop task.
    task: Option<tokio::task::JoinHandle<()>>,
    /// Oneshot sender to signal the transport loop to shut down gracefully.
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// Timeout for the graceful shutdown.
    shutdown_timeout: Duration,
}

impl SessionClient {
    /// Connect: start the transport loop, send the `auth` handshake, and
    /// wait for the server's `auth:success`.
    ///
    /// # Errors
    ///
    /// - [`ParlorError::HandshakeTimeout`] if no ack arrives in time
    /// - [`ParlorError::AuthFailed`] if the server rejects the handshake
    /// - [`ParlorError::TransportClosed`] if the transport drops first
    ///
    /// On any error the transport loop is shut down before returning.
    pub async fn connect(
        transport: impl Transport,
        config: SessionConfig,
        bus: Arc<EventBus>,
    ) -> Result<Self> {
        let handshake_timeout = config.handshake_timeout;
        let (mut client, ack_rx) = Self::start(transport, config, bus);

        match tokio::time::timeout(handshake_timeout, ack_rx).await {
            Ok(Ok(Ok(_user_id))) => Ok(client),
            Ok(Ok(Err(e))) => {
                client.shutdown().await;
                Err(e)
            }
            // Ack sender dropped: the loop exited before the handshake.
            Ok(Err(_)) => {
                client.shutdown().await;
                Err(ParlorError::TransportClosed)
            }
            Err(_) => {
                client.shutdown().await;
                Err(ParlorError::HandshakeTimeout)
            }
        }
    }

    /// Start the transport loop without waiting for the handshake.
    ///
    /// The loop immediately queues the `auth` message as its first outgoing
    /// message. The returned receiver resolves with the handshake outcome;
    /// most callers want [`SessionClient::connect`] instead.
    #[must_use = "the ack receiver reports the handshake outcome"]
    pub fn start(
        transport: impl Transport,
        config: SessionConfig,
        bus: Arc<EventBus>,
    ) -> (Self, oneshot::Receiver<Result<PlayerId>>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (ack_tx, ack_rx) = oneshot::channel::<Result<PlayerId>>();

        let state = Arc::new(ClientState::new());
        let loop_state = Arc::clone(&state);

        // Queue the handshake so the transport loop picks it up as the very
        // first outgoing message.
        let auth_msg = ClientMessage::Auth {
            user_id: config.user_id.clone(),
            token: config.token,
        };
        // Cannot fail: the channel was just created.
        let _ = cmd_tx.send(auth_msg);

        let task = tokio::spawn(transport_loop(
            transport,
            cmd_rx,
            bus,
            loop_state,
            shutdown_rx,
            ack_tx,
        ));

        let client = Self {
            cmd_tx,
            state,
            user_id: config.user_id,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout: config.shutdown_timeout,
        };

        (client, ack_rx)
    }

    // ── Public API methods ──────────────────────────────────────────

    /// Create a room for the given game.
    ///
    /// # Errors
    ///
    /// Returns [`ParlorError::NotConnected`] if the transport has closed.
    pub fn create_room(&self, game_id: impl Into<String>, is_private: bool) -> Result<()> {
        self.send(ClientMessage::RoomCreate {
            game_id: game_id.into(),
            is_private,
        })
    }

    /// Join a room by code.
    ///
    /// # Errors
    ///
    /// Returns [`ParlorError::NotConnected`] if the transport has closed.
    pub fn join_room(&self, room_id: impl Into<RoomId>) -> Result<()> {
        self.send(ClientMessage::RoomJoin {
            room_id: room_id.into(),
        })
    }

    /// Leave the current room.
    ///
    /// # Errors
    ///
    /// Returns [`ParlorError::NotConnected`] if the transport has closed.
    pub fn leave_room(&self) -> Result<()> {
        self.send(ClientMessage::RoomLeave)
    }

    /// Toggle lobby readiness.
    ///
    /// # Errors
    ///
    /// Returns [`ParlorError::NotConnected`] if the transport has closed.
    pub fn set_ready(&self, ready: bool) -> Result<()> {
        self.send(ClientMessage::RoomReady { ready })
    }

    /// Submit a turn-based move, forwarded verbatim to the server.
    ///
    /// # Errors
    ///
    /// Returns [`ParlorError::NotConnected`] if the transport has closed.
    pub fn send_move(&self, mv: serde_json::Value) -> Result<()> {
        self.send(ClientMessage::GameMove { mv })
    }

    /// Send a non-turn-based peer state update.
    ///
    /// # Errors
    ///
    /// Returns [`ParlorError::NotConnected`] if the transport has closed.
    pub fn send_update(&self, state: serde_json::Value) -> Result<()> {
        self.send(ClientMessage::GameUpdate { state })
    }

    /// Search for a random opponent for the given game.
    ///
    /// # Errors
    ///
    /// Returns [`ParlorError::NotConnected`] if the transport has closed.
    pub fn find_match(&self, game_id: impl Into<String>) -> Result<()> {
        self.send(ClientMessage::MatchmakingFind {
            game_id: game_id.into(),
        })
    }

    /// Cancel an in-flight opponent search.
    ///
    /// # Errors
    ///
    /// Returns [`ParlorError::NotConnected`] if the transport has closed.
    pub fn cancel_matchmaking(&self, game_id: impl Into<String>) -> Result<()> {
        self.send(ClientMessage::MatchmakingCancel {
            game_id: game_id.into(),
        })
    }

    /// Invite a friend to a game.
    ///
    /// # Errors
    ///
    /// Returns [`ParlorError::NotConnected`] if the transport has closed.
    pub fn send_invite(
        &self,
        friend_id: impl Into<PlayerId>,
        game_id: impl Into<String>,
    ) -> Result<()> {
        self.send(ClientMessage::InviteSend {
            friend_id: friend_id.into(),
            game_id: game_id.into(),
        })
    }

    /// Report the local player's running score in a score race.
    ///
    /// # Errors
    ///
    /// Returns [`ParlorError::NotConnected`] if the transport has closed.
    pub fn report_score(&self, score: f64) -> Result<()> {
        self.send(ClientMessage::CompetitionScore { score })
    }

    /// Report the local player's final score and completion.
    ///
    /// # Errors
    ///
    /// Returns [`ParlorError::NotConnected`] if the transport has closed.
    pub fn report_finished(&self, final_score: f64) -> Result<()> {
        self.send(ClientMessage::CompetitionFinished { final_score })
    }

    /// Shut down the client, closing the transport and stopping the
    /// background task. Idempotent.
    ///
    /// Subscribers receive a final `Disconnected` event once the loop exits.
    pub async fn shutdown(&mut self) {
        debug!("SessionClient: shutdown requested");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        // Await the transport loop with a timeout; abort it if it does not
        // exit in time so the task cannot detach and run indefinitely.
        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("transport loop terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("transport loop did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("transport loop aborted: {join_err}");
                    }
                }
            }
        }

        self.state.connected.store(false, Ordering::Release);
    }

    // ── State accessors ─────────────────────────────────────────────

    /// Returns `true` if the transport is believed to be connected.
    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::Acquire)
    }

    /// Returns `true` if the server has confirmed authentication.
    pub fn is_authenticated(&self) -> bool {
        self.state.authenticated.load(Ordering::Acquire)
    }

    /// Identifier of the local player.
    pub fn user_id(&self) -> &PlayerId {
        &self.user_id
    }

    // ── Internal helpers ────────────────────────────────────────────

    /// Queue a `ClientMessage` to the transport loop.
    fn send(&self, msg: ClientMessage) -> Result<()> {
        if !self.state.connected.load(Ordering::Acquire) {
            return Err(ParlorError::NotConnected);
        }
        self.cmd_tx.send(msg).map_err(|_| ParlorError::NotConnected)
    }
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("user_id", &self.user_id)
            .field("connected", &self.is_connected())
            .field("authenticated", &self.is_authenticated())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Drop for SessionClient {
    fn drop(&mut self) {
        // `Drop` is synchronous so a graceful shutdown cannot be awaited.
        // Aborting the spawned task drops the transport loop future
        // immediately. The `shutdown_tx` oneshot is intentionally not sent
        // here: it would trigger the graceful path that awaits
        // `transport.close()`, and there is no executor context to drive it.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Transport loop ──────────────────────────────────────────────────

/// Background transport loop that multiplexes send/receive via `tokio::select!`.
///
/// Exits when:
/// - The command channel closes (client handle dropped or shutdown called)
/// - The transport returns `None` (server closed connection)
/// - A transport error occurs
async fn transport_loop(
    mut transport: impl Transport,
    mut cmd_rx: mpsc::UnboundedReceiver<ClientMessage>,
    bus: Arc<EventBus>,
    state: Arc<ClientState>,
    mut shutdown_rx: oneshot::Receiver<()>,
    ack_tx: oneshot::Sender<Result<PlayerId>>,
) {
    debug!("transport loop started");

    // Consumed on the first handshake outcome.
    let mut ack_tx = Some(ack_tx);

    // Synthetic Connected event before entering the select loop.
    bus.publish(&SessionEvent::Connected);

    loop {
        tokio::select! {
            // Branch 1: outgoing command from the client handle
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(msg) => {
                        debug!("sending client message: {:?}", std::mem::discriminant(&msg));
                        match serde_json::to_string(&msg) {
                            Ok(json) => {
                                if let Err(e) = transport.send(json).await {
                                    error!("transport send error: {e}");
                                    emit_disconnected(
                                        &bus,
                                        &state,
                                        &mut ack_tx,
                                        Some(format!("transport send error: {e}")),
                                    ).await;
                                    break;
                                }
                            }
                            Err(e) => {
                                error!("failed to serialize ClientMessage: {e}");
                                // Serialization errors are programming bugs; don't kill the loop.
                            }
                        }
                    }
                    // Command channel closed — client handle dropped.
                    None => {
                        debug!("command channel closed, shutting down transport loop");
                        let _ = transport.close().await;
                        emit_disconnected(&bus, &state, &mut ack_tx, Some("client shut down".into())).await;
                        break;
                    }
                }
            }

            // Branch 2: shutdown signal
            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                let _ = transport.close().await;
                emit_disconnected(&bus, &state, &mut ack_tx, Some("client shut down".into())).await;
                break;
            }

            // Branch 3: incoming message from the server
            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(text)) => {
                        match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(server_msg) => {
                                handle_handshake(&state, &mut ack_tx, &server_msg);
                                bus.publish(&SessionEvent::from(server_msg));
                            }
                            // Unknown event names land here too; dropping
                            // them tolerates protocol additions.
                            Err(e) => {
                                warn!("dropping unrecognized server message: {e} — raw: {text}");
                            }
                        }
                    }
                    Some(Err(e)) => {
                        error!("transport receive error: {e}");
                        emit_disconnected(
                            &bus,
                            &state,
                            &mut ack_tx,
                            Some(format!("transport receive error: {e}")),
                        ).await;
                        break;
                    }
                    // Transport closed cleanly.
                    None => {
                        debug!("transport closed by server");
                        emit_disconnected(&bus, &state, &mut ack_tx, None).await;
                        break;
                    }
                }
            }
        }
    }

    debug!("transport loop exited");
}

/// Resolve the handshake ack from a received [`ServerMessage`].
fn handle_handshake(
    state: &ClientState,
    ack_tx: &mut Option<oneshot::Sender<Result<PlayerId>>>,
    msg: &ServerMessage,
) {
    match msg {
        ServerMessage::AuthSuccess { user_id } => {
            state.authenticated.store(true, Ordering::Release);
            debug!(user_id = %user_id, "state: authenticated");
            if let Some(tx) = ack_tx.take() {
                let _ = tx.send(Ok(user_id.clone()));
            }
        }
        // An error before the ack is a handshake rejection.
        ServerMessage::Error { message } if !state.authenticated.load(Ordering::Acquire) => {
            if let Some(tx) = ack_tx.take() {
                let _ = tx.send(Err(ParlorError::AuthFailed {
                    message: message.clone(),
                }));
            }
        }
        _ => {}
    }
}

/// Publish the final `Disconnected` event and update shared state.
///
/// Uses [`EventBus::publish_always`] because `Disconnected` is always the
/// last event on a subscription and must never be dropped by backpressure.
async fn emit_disconnected(
    bus: &EventBus,
    state: &ClientState,
    ack_tx: &mut Option<oneshot::Sender<Result<PlayerId>>>,
    reason: Option<String>,
) {
    state.connected.store(false, Ordering::Release);
    state.authenticated.store(false, Ordering::Release);
    if let Some(tx) = ack_tx.take() {
        let _ = tx.send(Err(ParlorError::TransportClosed));
    }
    bus.publish_always(SessionEvent::Disconnected { reason }).await;
}

// ── Tests ───────────────────────────────────────────────────────────

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
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    // ── Mock transport ──────────────────────────────────────────────

    /// A mock transport that records sent messages and replays scripted responses.
    struct MockTransport {
        incoming: VecDeque<Option<std::result::Result<String, ParlorError>>>,
        sent: Arc<StdMutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    impl MockTransport {
        fn new(
            incoming: Vec<Option<std::result::Result<String, ParlorError>>>,
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
        async fn send(&mut self, message: String) -> std::result::Result<(), ParlorError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn recv(&mut self) -> Option<std::result::Result<String, ParlorError>> {
            if let Some(item) = self.incoming.pop_front() {
                // An explicit `None` entry signals a clean transport close.
                item
            } else {
                // All scripted messages delivered — hang so the loop stays
                // alive until shutdown.
                std::future::pending().await
            }
        }

        async fn close(&mut self) -> std::result::Result<(), ParlorError> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    fn auth_success_json() -> String {
        serde_json::to_string(&ServerMessage::AuthSuccess {
            user_id: "user-1".into(),
        })
        .unwrap()
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn connect_sends_auth_first_and_resolves_on_ack() {
        let (transport, sent, _closed) = MockTransport::new(vec![Some(Ok(auth_success_json()))]);
        let bus = Arc::new(EventBus::new());

        let config = SessionConfig::new("user-1", "tok");
        let mut client = SessionClient::connect(transport, config, bus).await.unwrap();

        assert!(client.is_connected());
        assert!(client.is_authenticated());

        {
            let messages = sent.lock().unwrap();
            assert!(!messages.is_empty());
            let first: ClientMessage = serde_json::from_str(&messages[0]).unwrap();
            assert_eq!(
                first,
                ClientMessage::Auth {
                    user_id: "user-1".into(),
                    token: "tok".into(),
                }
            );
        }

        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn connect_times_out_without_ack() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);
        let bus = Arc::new(EventBus::new());

        let config = SessionConfig::new("user-1", "tok")
            .with_handshake_timeout(Duration::from_millis(100));
        let result = SessionClient::connect(transport, config, bus).await;
        assert!(matches!(result, Err(ParlorError::HandshakeTimeout)));
    }

    #[tokio::test]
    async fn connect_rejects_on_pre_auth_error() {
        let error_json = serde_json::to_string(&ServerMessage::Error {
            message: "invalid token".into(),
        })
        .unwrap();
        let (transport, _sent, _closed) = MockTransport::new(vec![Some(Ok(error_json))]);
        let bus = Arc::new(EventBus::new());

        let config = SessionConfig::new("user-1", "bad-tok");
        let result = SessionClient::connect(transport, config, bus).await;
        match result {
            Err(ParlorError::AuthFailed { message }) => assert_eq!(message, "invalid token"),
            other => panic!("expected AuthFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connect_rejects_on_transport_close() {
        let (transport, _sent, _closed) = MockTransport::new(vec![None]);
        let bus = Arc::new(EventBus::new());

        let config = SessionConfig::new("user-1", "tok");
        let result = SessionClient::connect(transport, config, bus).await;
        assert!(matches!(result, Err(ParlorError::TransportClosed)));
    }

    #[tokio::test]
    async fn unknown_event_is_dropped_not_fatal() {
        let (transport, _sent, _closed) = MockTransport::new(vec![
            Some(Ok(auth_success_json())),
            Some(Ok(r#"{"type":"lobby:chatMessage","data":{"text":"hi"}}"#.into())),
            Some(Ok(
                r#"{"type":"error","data":{"message":"room full"}}"#.into()
            )),
        ]);
        let bus = Arc::new(EventBus::new());
        let (_sub, mut rx) = bus.subscribe_all();

        let config = SessionConfig::new("user-1", "tok");
        let mut client = SessionClient::connect(transport, config, Arc::clone(&bus))
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), SessionEvent::Connected);
        assert!(matches!(
            rx.recv().await.unwrap(),
            SessionEvent::AuthSuccess { .. }
        ));
        // The unknown event is silently dropped; the next delivered event
        // is the server error.
        let ev = rx.recv().await.unwrap();
        assert_eq!(
            ev,
            SessionEvent::ServerError {
                message: "room full".into()
            }
        );

        client.shutdown().await;
    }

    #[tokio::test]
    async fn transport_close_emits_disconnected_and_clears_flag() {
        let (transport, _sent, _closed) =
            MockTransport::new(vec![Some(Ok(auth_success_json())), None]);
        let bus = Arc::new(EventBus::new());
        let (_sub, mut rx) = bus.subscribe_all();

        let config = SessionConfig::new("user-1", "tok");
        let mut client = SessionClient::connect(transport, config, Arc::clone(&bus))
            .await
            .unwrap();

        let _ = rx.recv().await; // Connected
        let _ = rx.recv().await; // AuthSuccess
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev, SessionEvent::Disconnected { reason: None });
        assert!(!client.is_connected());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn not_connected_error_after_shutdown() {
        let (transport, _sent, _closed) = MockTransport::new(vec![Some(Ok(auth_success_json()))]);
        let bus = Arc::new(EventBus::new());

        let config = SessionConfig::new("user-1", "tok");
        let mut client = SessionClient::connect(transport, config, bus).await.unwrap();

        client.shutdown().await;

        let result = client.leave_room();
        assert!(matches!(result, Err(ParlorError::NotConnected)));
    }

    #[tokio::test]
    async fn intents_reach_the_wire_in_order() {
        let (transport, sent, _closed) = MockTransport::new(vec![Some(Ok(auth_success_json()))]);
        let bus = Arc::new(EventBus::new());

        let config = SessionConfig::new("user-1", "tok");
        let mut client = SessionClient::connect(transport, config, bus).await.unwrap();

        client.create_room("chess", false).unwrap();
        client.set_ready(true).unwrap();
        client.leave_room().unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        {
            let messages = sent.lock().unwrap();
            let parsed: Vec<ClientMessage> = messages
                .iter()
                .map(|m| serde_json::from_str(m).unwrap())
                .collect();
            assert!(matches!(parsed[0], ClientMessage::Auth { .. }));
            assert!(matches!(parsed[1], ClientMessage::RoomCreate { .. }));
            assert_eq!(parsed[2], ClientMessage::RoomReady { ready: true });
            assert_eq!(parsed[3], ClientMessage::RoomLeave);
        }

        client.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_closes_transport_and_emits_disconnected() {
        let (transport, _sent, closed) = MockTransport::new(vec![Some(Ok(auth_success_json()))]);
        let bus = Arc::new(EventBus::new());
        let (_sub, mut rx) = bus.subscribe_all();

        let config = SessionConfig::new("user-1", "tok");
        let mut client = SessionClient::connect(transport, config, Arc::clone(&bus))
            .await
            .unwrap();

        let _ = rx.recv().await; // Connected
        let _ = rx.recv().await; // AuthSuccess

        client.shutdown().await;

        let ev = rx.recv().await.unwrap();
        assert_eq!(
            ev,
            SessionEvent::Disconnected {
                reason: Some("client shut down".into())
            }
        );
        assert!(closed.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn double_shutdown_does_not_panic() {
        let (transport, _sent, _closed) = MockTransport::new(vec![Some(Ok(auth_success_json()))]);
        let bus = Arc::new(EventBus::new());

        let config = SessionConfig::new("user-1", "tok");
        let mut client = SessionClient::connect(transport, config, bus).await.unwrap();

        client.shutdown().await;
        client.shutdown().await;
    }

    #[tokio::test]
    async fn config_defaults() {
        let config = SessionConfig::new("user-1", "tok");
        assert_eq!(config.user_id, "user-1");
        assert_eq!(config.handshake_timeout, Duration::from_secs(10));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn debug_impl_for_client() {
        let (transport, _sent, _closed) = MockTransport::new(vec![Some(Ok(auth_success_json()))]);
        let bus = Arc::new(EventBus::new());

        let config = SessionConfig::new("user-1", "tok");
        let mut client = SessionClient::connect(transport, config, bus).await.unwrap();

        let debug_str = format!("{client:?}");
        assert!(debug_str.contains("SessionClient"));
        assert!(debug_str.contains("user-1"));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn drop_without_explicit_shutdown() {
        let (transport, _sent, _closed) = MockTransport::new(vec![Some(Ok(auth_success_json()))]);
        let bus = Arc::new(EventBus::new());
        let (_sub, mut rx) = bus.subscribe_all();

        let config = SessionConfig::new("user-1", "tok");
        let client = SessionClient::connect(transport, config, Arc::clone(&bus))
            .await
            .unwrap();

        drop(client);

        // Drain whatever was delivered; the point is that nothing hangs or
        // panics once the handle is gone.
        while rx.try_recv().is_ok() {}
    }
}
