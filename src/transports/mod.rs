//! Transport implementations for the Parlor session protocol.
//!
//! This module provides concrete [`Transport`](crate::Transport)
//! implementations behind feature gates:
//!
//! | Feature                | Transport              |
//! |------------------------|------------------------|
//! | `transport-websocket`  | [`WebSocketTransport`] |

#[cfg(feature = "transport-websocket")]
pub mod websocket;

#[cfg(feature = "transport-websocket")]
pub use websocket::WebSocketTransport;
