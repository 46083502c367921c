//! Error types for the Parlor session client.

use thiserror::Error;

/// Errors that can occur when using the Parlor session client.
#[derive(Debug, Error)]
pub enum ParlorError {
    /// Failed to send a message through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a message from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was closed unexpectedly.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize or deserialize a protocol message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Attempted an operation that requires an active connection, but the client is not connected.
    #[error("not connected to server")]
    NotConnected,

    /// Attempted a room operation but the session is not in a room.
    #[error("not in a room")]
    NotInRoom,

    /// Attempted to create or join a room while already in one.
    #[error("already in a room")]
    AlreadyInRoom,

    /// Attempted a turn-based move while turn authority is held by another player.
    #[error("not your turn")]
    NotYourTurn,

    /// The targeted cell or column is already occupied.
    #[error("move target unavailable")]
    MoveUnavailable,

    /// The server did not acknowledge authentication within the handshake timeout.
    #[error("authentication handshake timed out")]
    HandshakeTimeout,

    /// The server rejected the authentication handshake.
    #[error("authentication failed: {message}")]
    AuthFailed {
        /// Human-readable rejection reason from the server.
        message: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for Parlor client operations.
pub type Result<T> = std::result::Result<T, ParlorError>;
