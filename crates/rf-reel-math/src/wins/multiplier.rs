//! Multiplier strategies

use serde::{Deserialize, Serialize};

use crate::board::{Board, Position};

/// How line wins are multiplied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineMultiplier {
    /// Running global multiplier only
    Global,
    /// Sum of multiplier symbols on the winning positions
    #[default]
    Symbol,
    /// Sum of multiplier symbols anywhere on the board
    Board,
    /// Symbol sum times the global multiplier
    Combined,
}

/// How ways wins are multiplied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaysMultiplier {
    /// Running global multiplier only
    Global,
    /// Multiplier symbols count as extra ways
    #[default]
    Symbol,
    /// Multiplier symbols are pooled and applied once
    Board,
}

/// Round to cents
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sum of boosting multipliers on `positions`, at least 1
pub fn positions_multiplier(board: &Board, positions: &[Position]) -> f64 {
    let sum: u32 = positions
        .iter()
        .filter_map(|p| board.get(*p).boosting_multiplier())
        .sum();
    sum.max(1) as f64
}

/// Apply a line strategy; returns `(win, applied multiplier)`
pub fn apply_line_multiplier(
    strategy: LineMultiplier,
    board: &Board,
    positions: &[Position],
    base_win: f64,
    global_multiplier: f64,
) -> (f64, f64) {
    let mult = match strategy {
        LineMultiplier::Global => global_multiplier,
        LineMultiplier::Symbol => positions_multiplier(board, positions),
        LineMultiplier::Board => board.multiplier_total().max(1) as f64,
        LineMultiplier::Combined => positions_multiplier(board, positions) * global_multiplier,
    };
    (round2(base_win * mult), mult)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;
    use approx::assert_relative_eq;

    #[test]
    fn test_round2() {
        assert_relative_eq!(round2(2.345678), 2.35);
        assert_relative_eq!(round2(0.1 + 0.2), 0.3);
    }

    #[test]
    fn test_line_strategies() {
        let config = presets::ways_5x3().unwrap();
        let mut board = Board::from_names(
            config.symbols(),
            &[
                vec!["H1", "L1", "L2"],
                vec!["W", "L1", "L2"],
                vec!["H1", "W", "L2"],
            ],
        )
        .unwrap();
        board.reels[1][0].set_multiplier(3).unwrap();
        board.reels[2][1].set_multiplier(4).unwrap();
        let line = [Position::new(0, 0), Position::new(1, 0), Position::new(2, 0)];

        assert_eq!(apply_line_multiplier(LineMultiplier::Global, &board, &line, 2.0, 2.0), (4.0, 2.0));
        assert_eq!(apply_line_multiplier(LineMultiplier::Symbol, &board, &line, 2.0, 2.0), (6.0, 3.0));
        assert_eq!(apply_line_multiplier(LineMultiplier::Board, &board, &line, 2.0, 2.0), (14.0, 7.0));
        assert_eq!(
            apply_line_multiplier(LineMultiplier::Combined, &board, &line, 2.0, 2.0),
            (12.0, 6.0)
        );
    }

    #[test]
    fn test_plain_symbols_floor_at_one() {
        let config = presets::ways_5x3().unwrap();
        let board = Board::from_names(config.symbols(), &[vec!["H1", "H2", "L1"]]).unwrap();
        assert_eq!(positions_multiplier(&board, &[Position::new(0, 0)]), 1.0);
    }
}
