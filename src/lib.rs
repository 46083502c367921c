//! # Parlor Client
//!
//! Transport-agnostic Rust client for Parlor multiplayer game sessions.
//!
//! This crate provides a high-level async client that speaks the Parlor
//! session protocol — JSON text messages over any bidirectional transport —
//! plus a session layer that projects server events into render-ready
//! state for turn-based, simultaneous-reveal, and score-race games.
//!
//! ## Features
//!
//! - **Transport-agnostic** — implement the [`Transport`] trait for any backend
//! - **WebSocket built-in** — default `transport-websocket` feature provides [`WebSocketTransport`]
//! - **Event-driven** — subscribe to typed [`SessionEvent`]s on the [`EventBus`]
//! - **Session projection** — [`GameSession`] folds events into one [`SessionState`]
//!   the UI can render after every change
//!
//! ## Quick Start
//!
//! ```text
//! let bus = Arc::new(EventBus::new());
//! let transport = WebSocketTransport::connect("wss://example.org/session").await?;
//! let config = SessionConfig::new("player-1", token);
//! let client = Arc::new(SessionClient::connect(transport, config, bus.clone()).await?);
//!
//! let mut session = GameSession::new(client, bus);
//! session.find_match("tic-tac-toe")?;
//! while let Some(event) = session.next_change().await {
//!     render(session.state());
//! }
//! ```

pub mod bridge;
pub mod bus;
pub mod client;
pub mod error;
pub mod event;
pub mod games;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod transports;

// Re-export primary types for ergonomic imports.
pub use bridge::RuntimeMessage;
pub use bus::{EventBus, SubscriptionId};
pub use client::{SessionClient, SessionConfig};
pub use error::{ParlorError, Result};
pub use event::{EventKind, SessionEvent};
pub use protocol::{
    ClientMessage, GameCategory, GameOverResult, GameState, Player, PlayerId, Room, RoomId,
    RoomState, ServerMessage,
};
pub use session::{GameSession, SessionPhase, SessionState};
pub use transport::Transport;

#[cfg(feature = "transport-websocket")]
pub use transports::websocket::WebSocketTransport;
