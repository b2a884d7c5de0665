//! Win evaluation
//!
//! Every win mechanism implements [`WinEvaluator`]: it reads a board, returns
//! the winning combinations and marks their positions as exploding so a
//! tumble can remove them.
//!
//! ```text
//! Board ──► WinEvaluator::evaluate ──► WinData { total_win, wins[] }
//!               │                              │
//!               └─ marks exploding cells       └─► describe() ──► ForceDescription
//! ```

mod cluster;
mod lines;
mod multiplier;
mod scatter;
mod ways;

pub use cluster::{ClusterEvaluator, find_clusters};
pub use lines::LinesEvaluator;
pub use multiplier::*;
pub use scatter::ScatterEvaluator;
pub use ways::WaysEvaluator;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Position};
use crate::config::{GameType, Paytable, WinMechanism};
use crate::recorder::ForceDescription;

/// Extra data attached to a win for the client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinMeta {
    pub global_mult: f64,
    /// Multiplier applied by the mechanism's strategy
    pub multiplier: f64,
    pub win_without_mult: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ways: Option<u64>,
    /// Cell where the client displays the win amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<Position>,
}

/// One winning combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinRecord {
    pub symbol: String,
    /// Match size: run length, reel count, cluster size or symbol count
    pub kind: usize,
    pub win: f64,
    pub positions: Vec<Position>,
    pub meta: WinMeta,
}

/// Result of evaluating one board
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinData {
    pub total_win: f64,
    pub wins: Vec<WinRecord>,
}

impl WinData {
    pub fn push(&mut self, record: WinRecord) {
        self.total_win += record.win;
        self.wins.push(record);
    }

    pub fn is_win(&self) -> bool {
        self.total_win > 0.0
    }
}

/// Per-evaluation inputs that change during a round
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub paytable: &'a Paytable,
    pub global_multiplier: f64,
    /// Feature-round grid multipliers, indexed `[reel][row]`
    pub position_multipliers: Option<&'a [Vec<u32>]>,
}

impl<'a> EvalContext<'a> {
    pub fn new(paytable: &'a Paytable) -> Self {
        Self {
            paytable,
            global_multiplier: 1.0,
            position_multipliers: None,
        }
    }

    pub fn with_global_multiplier(mut self, multiplier: f64) -> Self {
        self.global_multiplier = multiplier;
        self
    }

    pub fn with_position_multipliers(mut self, grid: &'a [Vec<u32>]) -> Self {
        self.position_multipliers = Some(grid);
        self
    }
}

/// A win mechanism
pub trait WinEvaluator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Find every win on the board and mark winning cells exploding
    fn evaluate(&self, board: &mut Board, ctx: &EvalContext<'_>) -> WinData;

    /// Force-record description of a win
    fn describe(&self, record: &WinRecord, game_type: GameType) -> ForceDescription {
        ForceDescription::new()
            .with("kind", record.kind)
            .with("symbol", &record.symbol)
            .with("gametype", game_type)
    }
}

/// Evaluator for a configured mechanism
pub fn evaluator_for(mechanism: &WinMechanism) -> Box<dyn WinEvaluator> {
    match mechanism {
        WinMechanism::Cluster => Box::new(ClusterEvaluator),
        WinMechanism::Lines {
            paylines,
            multiplier,
            wild_symbol,
        } => Box::new(LinesEvaluator::new(paylines.clone(), *multiplier, wild_symbol.clone())),
        WinMechanism::Ways { multiplier } => Box::new(WaysEvaluator::new(*multiplier)),
        WinMechanism::Scatter => Box::new(ScatterEvaluator),
    }
}
