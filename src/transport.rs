//! Transport abstraction for the Parlor session protocol.
//!
//! The [`Transport`] trait defines a bidirectional text message channel
//! between the client and server. The session protocol uses JSON text
//! messages, so every transport implementation must handle message framing
//! internally (e.g. WebSocket frames, length-prefixed TCP).
//!
//! Connection setup is intentionally NOT part of this trait — different
//! transports have fundamentally different connection parameters. Construct
//! a connected transport externally, then pass it to
//! [`SessionClient::connect`](crate::SessionClient::connect).

use async_trait::async_trait;

use crate::error::ParlorError;

/// A bidirectional text message transport for the Parlor session protocol.
///
/// Implementors shuttle serialized JSON strings between the client and
/// server. Each call to [`send`](Transport::send) transmits one complete
/// JSON message; each call to [`recv`](Transport::recv) returns one.
///
/// # Cancel Safety
///
/// The [`recv`](Transport::recv) method **MUST** be cancel-safe because it
/// is used inside `tokio::select!`. If `recv` is cancelled before
/// completion, calling it again must not lose data. Channel-based
/// implementations are naturally cancel-safe.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send a JSON text message to the server.
    ///
    /// # Errors
    ///
    /// Returns [`ParlorError::TransportSend`] if the message could not be
    /// sent (e.g. connection broken, write buffer full).
    async fn send(&mut self, message: String) -> Result<(), ParlorError>;

    /// Receive the next JSON text message from the server.
    ///
    /// Returns:
    /// - `Some(Ok(text))` — a complete message was received
    /// - `Some(Err(e))` — a transport error occurred
    /// - `None` — the connection was closed cleanly by the server
    ///
    /// # Cancel Safety
    ///
    /// This method **MUST** be cancel-safe (see [trait documentation](Transport)).
    async fn recv(&mut self) -> Option<Result<String, ParlorError>>;

    /// Close the transport connection gracefully.
    ///
    /// After calling this method, subsequent calls to [`send`](Transport::send)
    /// and [`recv`](Transport::recv) may return errors or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the graceful shutdown fails. Implementations
    /// should still release resources even if the close handshake fails.
    async fn close(&mut self) -> Result<(), ParlorError>;
}
