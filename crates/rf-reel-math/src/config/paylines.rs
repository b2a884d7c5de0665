//! Payline definitions

use serde::{Deserialize, Serialize};

/// A payline: one row index per reel, walked left to right
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payline {
    /// Payline index as reported in win records
    pub index: usize,
    /// Row position for each reel (e.g. `[1, 0, 0, 0, 1]`)
    pub rows: Vec<usize>,
}

impl Payline {
    pub fn new(index: usize, rows: Vec<usize>) -> Self {
        Self { index, rows }
    }

    /// Same row across all reels
    pub fn straight(index: usize, row: usize, reel_count: usize) -> Self {
        Self {
            index,
            rows: vec![row; reel_count],
        }
    }

    /// Number of reels the line crosses
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The classic 20 lines of a 5×3 grid
pub fn standard_20_paylines() -> Vec<Payline> {
    let patterns: [[usize; 5]; 20] = [
        // Straight
        [1, 1, 1, 1, 1],
        [0, 0, 0, 0, 0],
        [2, 2, 2, 2, 2],
        // V
        [0, 1, 2, 1, 0],
        [2, 1, 0, 1, 2],
        // Zigzag
        [0, 0, 1, 2, 2],
        [2, 2, 1, 0, 0],
        [1, 0, 0, 0, 1],
        [1, 2, 2, 2, 1],
        // W
        [0, 1, 0, 1, 0],
        [2, 1, 2, 1, 2],
        [0, 1, 1, 1, 0],
        [2, 1, 1, 1, 2],
        // Steps
        [1, 1, 0, 1, 1],
        [1, 1, 2, 1, 1],
        [0, 2, 0, 2, 0],
        [2, 0, 2, 0, 2],
        [1, 0, 1, 0, 1],
        [1, 2, 1, 2, 1],
        [0, 0, 2, 0, 0],
    ];

    patterns
        .iter()
        .enumerate()
        .map(|(index, rows)| Payline::new(index + 1, rows.to_vec()))
        .collect()
}
