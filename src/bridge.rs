//! Embedded game runtime bridge.
//!
//! Score-race games run inside an embedded runtime (an iframe or webview)
//! that reports progress as JSON strings. The runtime is untrusted input:
//! malformed JSON, unknown message types, and absurd scores must never
//! propagate into session state or onto the wire.

use serde::Deserialize;
use tracing::debug;

/// A message posted by the embedded game runtime.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RuntimeMessage {
    /// Incremental score report while the game is running.
    Score { score: f64 },
    /// The local game has ended with a final score.
    GameOver { score: f64 },
}

impl RuntimeMessage {
    pub fn score(&self) -> f64 {
        match self {
            Self::Score { score } | Self::GameOver { score } => *score,
        }
    }
}

/// Parse one raw runtime message, returning `None` for anything that
/// should be dropped: malformed JSON, unknown types, and scores that are
/// negative or non-finite.
pub fn parse_runtime_message(raw: &str) -> Option<RuntimeMessage> {
    let message: RuntimeMessage = match serde_json::from_str(raw) {
        Ok(message) => message,
        Err(e) => {
            debug!("unparseable runtime message: {e}");
            return None;
        }
    };
    let score = message.score();
    if !score.is_finite() || score < 0.0 {
        debug!(score, "rejecting runtime message with invalid score");
        return None;
    }
    Some(message)
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
    fn parses_score_and_game_over() {
        assert_eq!(
            parse_runtime_message(r#"{"type": "score", "score": 12.5}"#),
            Some(RuntimeMessage::Score { score: 12.5 })
        );
        assert_eq!(
            parse_runtime_message(r#"{"type": "gameOver", "score": 40}"#),
            Some(RuntimeMessage::GameOver { score: 40.0 })
        );
    }

    #[test]
    fn rejects_malformed_json() {
        assert_eq!(parse_runtime_message("not json"), None);
        assert_eq!(parse_runtime_message(r#"{"type": "score"}"#), None);
    }

    #[test]
    fn rejects_unknown_type() {
        assert_eq!(parse_runtime_message(r#"{"type": "cheat", "score": 1}"#), None);
    }

    #[test]
    fn rejects_invalid_scores() {
        assert_eq!(parse_runtime_message(r#"{"type": "score", "score": -1}"#), None);
        assert_eq!(
            parse_runtime_message(r#"{"type": "score", "score": 1e999}"#),
            None
        );
    }
}
