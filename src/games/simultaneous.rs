//! Simultaneous-reveal round resolution.
//!
//! Once both players' choices for the current round are known, the client
//! computes the round result locally for instant feedback. The result is
//! display-only: the authoritative score increment still arrives with the
//! server's next `game:state`. After [`REVEAL_DURATION`] the preview is
//! cleared so the next round's choices are accepted.

use std::time::Duration;

use crate::protocol::{PlayerId, SimultaneousState};

/// How long the locally computed round result is displayed before the next
/// round's choices are accepted.
pub const REVEAL_DURATION: Duration = Duration::from_secs(2);

/// Outcome of one round from the local player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Win,
    Loss,
    Tie,
}

/// Display-only preview of a resolved round. Lives in the optimistic layer
/// of the session state and is discarded when the reveal window elapses,
/// never merged into authoritative fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealPreview {
    pub round: u32,
    pub my_choice: String,
    pub opponent_choice: String,
    pub outcome: RoundOutcome,
}

/// Resolve a rock-paper-scissors round: rock beats scissors, scissors
/// beats paper, paper beats rock; equal choices tie.
///
/// Returns `None` for choices outside the known set — the server may add
/// variants the client does not understand yet.
pub fn resolve_round(mine: &str, theirs: &str) -> Option<RoundOutcome> {
    const BEATS: [(&str, &str); 3] = [
        ("rock", "scissors"),
        ("scissors", "paper"),
        ("paper", "rock"),
    ];
    let known = |c: &str| BEATS.iter().any(|(w, _)| *w == c);
    if !known(mine) || !known(theirs) {
        return None;
    }
    if mine == theirs {
        Some(RoundOutcome::Tie)
    } else if BEATS.contains(&(mine, theirs)) {
        Some(RoundOutcome::Win)
    } else {
        Some(RoundOutcome::Loss)
    }
}

/// Build a reveal preview from an authoritative state refresh, once both
/// sides' choices for the current round are populated.
pub fn preview_round(state: &SimultaneousState, my_id: &PlayerId) -> Option<RevealPreview> {
    let my_choice = state.choices.get(my_id)?;
    let (_, opponent_choice) = state.choices.iter().find(|(id, _)| *id != my_id)?;
    let outcome = resolve_round(my_choice, opponent_choice)?;
    Some(RevealPreview {
        round: state.round,
        my_choice: my_choice.clone(),
        opponent_choice: opponent_choice.clone(),
        outcome,
    })
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
    fn rock_beats_scissors() {
        assert_eq!(resolve_round("rock", "scissors"), Some(RoundOutcome::Win));
        assert_eq!(resolve_round("scissors", "rock"), Some(RoundOutcome::Loss));
    }

    #[test]
    fn scissors_beats_paper() {
        assert_eq!(resolve_round("scissors", "paper"), Some(RoundOutcome::Win));
        assert_eq!(resolve_round("paper", "scissors"), Some(RoundOutcome::Loss));
    }

    #[test]
    fn paper_beats_rock() {
        assert_eq!(resolve_round("paper", "rock"), Some(RoundOutcome::Win));
        assert_eq!(resolve_round("rock", "paper"), Some(RoundOutcome::Loss));
    }

    #[test]
    fn equal_choices_tie() {
        for choice in ["rock", "paper", "scissors"] {
            assert_eq!(resolve_round(choice, choice), Some(RoundOutcome::Tie));
        }
    }

    #[test]
    fn unknown_choice_is_unresolved() {
        assert_eq!(resolve_round("lizard", "rock"), None);
        assert_eq!(resolve_round("rock", "spock"), None);
    }

    #[test]
    fn preview_requires_both_choices() {
        let my_id = "A".to_string();
        let mut state = SimultaneousState {
            round: 3,
            ..Default::default()
        };
        state.choices.insert("A".into(), "rock".into());
        assert_eq!(preview_round(&state, &my_id), None);

        state.choices.insert("B".into(), "scissors".into());
        let preview = preview_round(&state, &my_id).unwrap();
        assert_eq!(preview.round, 3);
        assert_eq!(preview.outcome, RoundOutcome::Win);
        assert_eq!(preview.opponent_choice, "scissors");
    }
}
