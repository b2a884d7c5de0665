//! Game configuration
//!
//! A game file (YAML or JSON) deserializes into [`GameConfigFile`], which is
//! validated and compiled once into an immutable [`GameConfig`]. The compiled
//! value is shared by reference with every worker.

mod betmode;
mod loader;
mod paylines;
mod paytable;
mod reels;

pub use betmode::*;
pub use loader::*;
pub use paylines::*;
pub use paytable::*;
pub use reels::*;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};
use crate::symbols::{SymbolRole, SymbolStorage};
use crate::wins::{LineMultiplier, WaysMultiplier};

/// Game phase a reveal belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameType {
    #[serde(rename = "basegame")]
    Base,
    #[serde(rename = "freegame")]
    Free,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::Base => "basegame",
            GameType::Free => "freegame",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_wild_symbol() -> String {
    "W".to_string()
}

/// Win rule of a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WinMechanism {
    /// Connected regions of one symbol
    Cluster,
    /// Fixed paths read left to right
    Lines {
        paylines: Vec<Payline>,
        #[serde(default)]
        multiplier: LineMultiplier,
        /// Symbol whose wild-only runs pay on their own
        #[serde(default = "default_wild_symbol")]
        wild_symbol: String,
    },
    /// Adjacent-reel combinations from the leftmost reel
    Ways {
        #[serde(default)]
        multiplier: WaysMultiplier,
    },
    /// Board-wide counts
    Scatter,
}

impl WinMechanism {
    pub fn name(&self) -> &'static str {
        match self {
            WinMechanism::Cluster => "cluster",
            WinMechanism::Lines { .. } => "lines",
            WinMechanism::Ways { .. } => "ways",
            WinMechanism::Scatter => "scatter",
        }
    }

    /// Cluster and scatter games cascade by default
    pub fn tumbles_by_default(&self) -> bool {
        matches!(self, WinMechanism::Cluster | WinMechanism::Scatter)
    }
}

/// Position multipliers in the feature round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridMultiplierConfig {
    /// Cap for a single position
    pub max: u32,
}

/// Optional feature-round mechanics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMechanics {
    /// Winning positions activate and then grow a per-position multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_multipliers: Option<GridMultiplierConfig>,
    /// Global multiplier steps up after every tumble, reset each spin
    #[serde(default)]
    pub tumble_global_multiplier: bool,
    /// Settled spin win is multiplied by the board's multiplier symbols
    #[serde(default)]
    pub board_multiplier_on_settle: bool,
}

/// One payout band of a win-level table, `min <= win < max`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinLevelBand {
    pub level: u32,
    pub min: f64,
    pub max: f64,
}

/// Win-level tables used to tag `setWin` and `freeSpinEnd` events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinLevels {
    pub standard: Vec<WinLevelBand>,
    pub end_feature: Vec<WinLevelBand>,
}

/// Which table to read a level from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinLevelKind {
    Standard,
    EndFeature,
}

impl WinLevels {
    /// Default tables, the top band starting at the win cap
    pub fn for_wincap(wincap: f64) -> Self {
        fn bands(edges: &[f64], wincap: f64) -> Vec<WinLevelBand> {
            let mut out: Vec<WinLevelBand> = edges
                .windows(2)
                .enumerate()
                .map(|(i, w)| WinLevelBand {
                    level: i as u32 + 1,
                    min: w[0],
                    max: w[1],
                })
                .collect();
            let last = edges[edges.len() - 1];
            out.push(WinLevelBand {
                level: out.len() as u32 + 1,
                min: last,
                max: wincap,
            });
            out.push(WinLevelBand {
                level: out.len() as u32 + 1,
                min: wincap,
                max: f64::INFINITY,
            });
            out
        }

        Self {
            standard: bands(&[0.0, 0.1, 1.0, 2.0, 5.0, 15.0, 30.0, 50.0, 100.0], wincap),
            end_feature: bands(
                &[0.0, 1.0, 5.0, 10.0, 20.0, 50.0, 100.0, 500.0, 2000.0],
                wincap,
            ),
        }
    }

    /// Level of a payout; payouts outside every band map to the top level
    pub fn level(&self, kind: WinLevelKind, win: f64) -> u32 {
        let table = match kind {
            WinLevelKind::Standard => &self.standard,
            WinLevelKind::EndFeature => &self.end_feature,
        };
        table
            .iter()
            .find(|band| win >= band.min && win < band.max)
            .or(table.last())
            .map(|band| band.level)
            .unwrap_or(0)
    }
}

/// Compiled, validated game configuration
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub game_id: String,
    pub num_reels: usize,
    pub num_rows: Vec<usize>,
    /// Read one extra symbol above and below each reel
    pub include_padding: bool,
    /// Cascade after every winning evaluation
    pub tumble: bool,
    pub win_mechanism: WinMechanism,
    pub paytable: Paytable,
    pub special_symbols: BTreeMap<SymbolRole, Vec<String>>,
    pub reels: BTreeMap<String, Vec<ReelStrip>>,
    /// Scatter count → spins awarded, per phase
    pub freespin_triggers: BTreeMap<GameType, BTreeMap<usize, u32>>,
    /// Scatter count that starts the anticipation ramp, per phase
    pub anticipation_triggers: BTreeMap<GameType, usize>,
    pub mechanics: FeatureMechanics,
    pub bet_modes: Vec<BetMode>,
    pub(crate) symbols: SymbolStorage,
}

impl GameConfig {
    pub fn symbols(&self) -> &SymbolStorage {
        &self.symbols
    }

    pub fn bet_mode(&self, name: &str) -> ReelResult<&BetMode> {
        self.bet_modes
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ReelError::UnknownBetMode(name.to_string()))
    }

    pub fn reel_set(&self, id: &str) -> ReelResult<&[ReelStrip]> {
        self.reels
            .get(id)
            .map(Vec::as_slice)
            .ok_or_else(|| ReelError::UnknownReelStrip(id.to_string()))
    }

    /// Smallest scatter count that triggers the feature in a phase
    pub fn min_freespin_trigger(&self, game_type: GameType) -> Option<usize> {
        self.freespin_triggers
            .get(&game_type)
            .and_then(|t| t.keys().next())
            .copied()
    }

    /// Spins awarded for a scatter count: the entry for the largest listed
    /// count not above `scatters`
    pub fn freespins_for(&self, game_type: GameType, scatters: usize) -> Option<u32> {
        self.freespin_triggers
            .get(&game_type)?
            .range(..=scatters)
            .next_back()
            .map(|(_, spins)| *spins)
    }

    pub fn anticipation_trigger(&self, game_type: GameType) -> Option<usize> {
        self.anticipation_triggers.get(&game_type).copied()
    }

    /// Symbol names holding a role
    pub fn role_symbols(&self, role: SymbolRole) -> &[String] {
        self.special_symbols
            .get(&role)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total_positions(&self) -> usize {
        self.num_rows.iter().sum()
    }

    pub fn max_rows(&self) -> usize {
        self.num_rows.iter().copied().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_levels_default_bands() {
        let levels = WinLevels::for_wincap(5000.0);
        assert_eq!(levels.standard.len(), 10);
        assert_eq!(levels.level(WinLevelKind::Standard, 0.0), 1);
        assert_eq!(levels.level(WinLevelKind::Standard, 0.5), 2);
        assert_eq!(levels.level(WinLevelKind::Standard, 100.0), 9);
        assert_eq!(levels.level(WinLevelKind::Standard, 5000.0), 10);
        assert_eq!(levels.level(WinLevelKind::EndFeature, 750.0), 8);
        assert_eq!(levels.level(WinLevelKind::EndFeature, 4999.0), 9);
    }

    #[test]
    fn test_game_type_keys() {
        let json = r#"{"basegame": 1, "freegame": 2}"#;
        let map: BTreeMap<GameType, u32> = serde_json::from_str(json).unwrap();
        assert_eq!(map[&GameType::Base], 1);
        assert_eq!(map[&GameType::Free], 2);
        assert_eq!(GameType::Free.to_string(), "freegame");
    }

    #[test]
    fn test_mechanism_tagging() {
        let yaml = "type: ways\nmultiplier: board\n";
        let m: WinMechanism = serde_yml::from_str(yaml).unwrap();
        assert_eq!(
            m,
            WinMechanism::Ways {
                multiplier: WaysMultiplier::Board
            }
        );
        assert!(!m.tumbles_by_default());
        assert!(WinMechanism::Cluster.tumbles_by_default());
    }
}
