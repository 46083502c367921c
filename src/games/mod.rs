//! Game adapter layer.
//!
//! Normalizes the three game paradigms behind one interaction pattern:
//! whose turn is it, what glyph is mine, and is a given move target even
//! worth a round-trip. The client never enforces game rules — legality is
//! the server's responsibility; these checks only prevent obviously wasted
//! round-trips (acting out of turn, dropping into a full column).

pub mod score_race;
pub mod simultaneous;

use crate::protocol::{GameCategory, GameState, PlayerId};

/// Placeholder glyph shown between `game:start` and the first `game:state`
/// refresh, before the server has assigned symbols.
pub const NEUTRAL_SYMBOL: &str = "·";

/// Whether the local player may act right now.
///
/// Strict equality against the server-issued turn authority for turn-based
/// games; unconditionally true for simultaneous and score-race games, where
/// both players act independently at any time.
pub fn is_my_turn(category: GameCategory, current_turn: Option<&PlayerId>, my_id: &str) -> bool {
    match category {
        GameCategory::TurnBased => current_turn.is_some_and(|turn| turn == my_id),
        GameCategory::Simultaneous | GameCategory::ScoreRace => true,
    }
}

/// The local player's glyph or color for a turn-based game.
///
/// Tolerates the symbol map being absent or incomplete (the window between
/// `game:start` and the first refresh), returning a neutral placeholder
/// rather than failing.
pub fn my_symbol(state: &GameState, my_id: &str) -> String {
    match state {
        GameState::TurnBased(tb) => tb
            .symbols
            .get(my_id)
            .cloned()
            .unwrap_or_else(|| NEUTRAL_SYMBOL.to_string()),
        GameState::Simultaneous(_) | GameState::ScoreRace(_) => NEUTRAL_SYMBOL.to_string(),
    }
}

/// Occupancy pre-check for a move payload against the current state.
///
/// Recognizes `{row, col}` cell moves and `{column}` drop moves on grid
/// boards; anything else (chess SAN/FEN moves, simultaneous choices, race
/// updates) passes through as allowed and is validated by the server.
pub fn move_allowed(state: &GameState, mv: &serde_json::Value) -> bool {
    let GameState::TurnBased(tb) = state else {
        return true;
    };
    let Some(board) = &tb.board else {
        return true;
    };

    if let (Some(row), Some(col)) = (index_field(mv, "row"), index_field(mv, "col")) {
        return board
            .get(row)
            .and_then(|r| r.get(col))
            .is_some_and(Option::is_none);
    }

    if let Some(col) = index_field(mv, "column") {
        // A column accepts a drop while its top cell is empty.
        return board
            .first()
            .and_then(|top| top.get(col))
            .is_some_and(Option::is_none);
    }

    true
}

fn index_field(mv: &serde_json::Value, key: &str) -> Option<usize> {
    mv.get(key)?.as_u64().map(|n| n as usize)
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
    use crate::protocol::{ScoreRaceState, SimultaneousState, TurnBasedState};

    fn turn_based_with_board(board: Vec<Vec<Option<String>>>) -> GameState {
        GameState::TurnBased(TurnBasedState {
            board: Some(board),
            ..Default::default()
        })
    }

    #[test]
    fn is_my_turn_strict_equality_for_turn_based() {
        let a = "A".to_string();
        let b = "B".to_string();
        assert!(is_my_turn(GameCategory::TurnBased, Some(&a), "A"));
        assert!(!is_my_turn(GameCategory::TurnBased, Some(&b), "A"));
        assert!(!is_my_turn(GameCategory::TurnBased, None, "A"));
    }

    #[test]
    fn is_my_turn_always_true_for_independent_play() {
        let b = "B".to_string();
        assert!(is_my_turn(GameCategory::Simultaneous, Some(&b), "A"));
        assert!(is_my_turn(GameCategory::Simultaneous, None, "A"));
        assert!(is_my_turn(GameCategory::ScoreRace, Some(&b), "A"));
        assert!(is_my_turn(GameCategory::ScoreRace, None, "A"));
    }

    #[test]
    fn my_symbol_reads_assignment() {
        let state = GameState::TurnBased(TurnBasedState {
            symbols: [("A".to_string(), "X".to_string())].into_iter().collect(),
            ..Default::default()
        });
        assert_eq!(my_symbol(&state, "A"), "X");
    }

    #[test]
    fn my_symbol_defaults_before_assignment() {
        // The window between game:start and the first game:state refresh.
        let state = GameState::TurnBased(TurnBasedState::default());
        assert_eq!(my_symbol(&state, "A"), NEUTRAL_SYMBOL);

        let state = GameState::ScoreRace(ScoreRaceState::default());
        assert_eq!(my_symbol(&state, "A"), NEUTRAL_SYMBOL);
    }

    #[test]
    fn occupied_cell_is_disallowed() {
        let state = turn_based_with_board(vec![
            vec![None, Some("X".into()), None],
            vec![None, None, None],
            vec![None, None, None],
        ]);
        assert!(!move_allowed(&state, &serde_json::json!({"row": 0, "col": 1})));
        assert!(move_allowed(&state, &serde_json::json!({"row": 0, "col": 0})));
    }

    #[test]
    fn out_of_bounds_cell_is_disallowed() {
        let state = turn_based_with_board(vec![vec![None; 3]; 3]);
        assert!(!move_allowed(&state, &serde_json::json!({"row": 7, "col": 0})));
    }

    #[test]
    fn full_column_is_disallowed() {
        // Column 2 is full when its top cell is occupied.
        let mut board = vec![vec![None; 7]; 6];
        board[0][2] = Some("R".into());
        let state = turn_based_with_board(board);
        assert!(!move_allowed(&state, &serde_json::json!({"column": 2})));
        assert!(move_allowed(&state, &serde_json::json!({"column": 3})));
    }

    #[test]
    fn non_positional_moves_pass_through() {
        let state = GameState::TurnBased(TurnBasedState {
            fen: Some("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".into()),
            ..Default::default()
        });
        assert!(move_allowed(&state, &serde_json::json!({"from": "e2", "to": "e4"})));

        let state = GameState::Simultaneous(SimultaneousState::default());
        assert!(move_allowed(&state, &serde_json::json!({"choice": "rock"})));
    }
}
