//! Game file parsing and validation

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{
    BetMode, FeatureMechanics, GameConfig, GameType, PayEntry, Paytable, ReelStrip, WinMechanism,
    read_reels_csv,
};
use crate::error::{ReelError, ReelResult};
use crate::symbols::{SymbolHook, SymbolRole, SymbolStorage};

/// Rows per reel: one value for every reel, or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowSpec {
    Uniform(usize),
    PerReel(Vec<usize>),
}

/// Where a reel set comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReelSource {
    /// Reel CSV path, relative to the game file
    File(PathBuf),
    /// Symbol lists, one per reel
    Inline(Vec<Vec<String>>),
}

/// Raw game file as written by a game designer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfigFile {
    pub game_id: String,
    pub num_reels: usize,
    pub num_rows: RowSpec,
    #[serde(default)]
    pub include_padding: bool,
    pub win_mechanism: WinMechanism,
    /// Overrides the mechanism's default cascade behavior
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tumble: Option<bool>,
    pub paytable: Vec<PayEntry>,
    #[serde(default)]
    pub special_symbols: BTreeMap<SymbolRole, Vec<String>>,
    #[serde(default)]
    pub symbol_hooks: BTreeMap<String, Vec<SymbolHook>>,
    pub reels: BTreeMap<String, ReelSource>,
    #[serde(default)]
    pub freespin_triggers: BTreeMap<GameType, BTreeMap<usize, u32>>,
    #[serde(default)]
    pub anticipation_triggers: BTreeMap<GameType, usize>,
    #[serde(default)]
    pub mechanics: FeatureMechanics,
    pub bet_modes: Vec<BetMode>,
}

/// Load-time guards
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    pub max_reels: usize,
    pub max_rows: usize,
    pub max_symbols: usize,
    pub max_strip_length: usize,
    pub max_paylines: usize,
    pub max_pay_value: f64,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_reels: 12,
            max_rows: 12,
            max_symbols: 64,
            max_strip_length: 100_000,
            max_paylines: 1024,
            max_pay_value: 1_000_000.0,
        }
    }
}

fn invalid(message: String) -> ReelError {
    ReelError::InvalidConfig(message)
}

impl GameConfig {
    /// Load a `.yaml`/`.yml` or `.json` game file
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let file: GameConfigFile = if is_json {
            serde_json::from_str(&text)?
        } else {
            serde_yml::from_str(&text)?
        };
        log::debug!("Loaded game file {} ({})", path.display(), file.game_id);
        Self::compile(file, Some(base_dir), &ConfigLimits::default())
    }

    pub fn from_yaml_str(yaml: &str, base_dir: Option<&Path>) -> ReelResult<Self> {
        let file: GameConfigFile = serde_yml::from_str(yaml)?;
        Self::compile(file, base_dir, &ConfigLimits::default())
    }

    pub fn from_json_str(json: &str, base_dir: Option<&Path>) -> ReelResult<Self> {
        let file: GameConfigFile = serde_json::from_str(json)?;
        Self::compile(file, base_dir, &ConfigLimits::default())
    }

    /// Validate a raw game file and build the shared configuration
    pub fn compile(
        file: GameConfigFile,
        base_dir: Option<&Path>,
        limits: &ConfigLimits,
    ) -> ReelResult<Self> {
        if file.num_reels == 0 || file.num_reels > limits.max_reels {
            return Err(invalid(format!(
                "num_reels must be in 1..={}, got {}",
                limits.max_reels, file.num_reels
            )));
        }

        let num_rows = match file.num_rows {
            RowSpec::Uniform(rows) => vec![rows; file.num_reels],
            RowSpec::PerReel(rows) => rows,
        };
        if num_rows.len() != file.num_reels {
            return Err(invalid(format!(
                "num_rows lists {} reels, num_reels is {}",
                num_rows.len(),
                file.num_reels
            )));
        }
        if let Some(bad) = num_rows.iter().find(|&&r| r == 0 || r > limits.max_rows) {
            return Err(invalid(format!(
                "row count must be in 1..={}, got {}",
                limits.max_rows, bad
            )));
        }

        let paytable = Paytable::from_entries(&file.paytable)?;
        if let Some((kind, symbol, pay)) = paytable
            .entries()
            .find(|(_, _, pay)| *pay > limits.max_pay_value)
        {
            return Err(invalid(format!(
                "pay {} for ({}, '{}') exceeds limit {}",
                pay, kind, symbol, limits.max_pay_value
            )));
        }

        let symbols = SymbolStorage::new(&paytable, &file.special_symbols, &file.symbol_hooks);
        if symbols.len() > limits.max_symbols {
            return Err(invalid(format!(
                "too many symbols: {} > {}",
                symbols.len(),
                limits.max_symbols
            )));
        }
        validate_hooks(&file.symbol_hooks, &symbols)?;

        let mut reels = BTreeMap::new();
        for (id, source) in file.reels {
            let strips = match source {
                ReelSource::Inline(lists) => lists.into_iter().map(ReelStrip::new).collect(),
                ReelSource::File(rel) => {
                    let path = base_dir.map(|d| d.join(&rel)).unwrap_or(rel);
                    read_reels_csv(&path)?
                }
            };
            validate_reel_set(&id, &strips, file.num_reels, &symbols, limits)?;
            reels.insert(id, strips);
        }

        if let WinMechanism::Lines { paylines, .. } = &file.win_mechanism {
            if paylines.is_empty() || paylines.len() > limits.max_paylines {
                return Err(invalid(format!(
                    "payline count must be in 1..={}, got {}",
                    limits.max_paylines,
                    paylines.len()
                )));
            }
            for line in paylines {
                if line.len() != file.num_reels {
                    return Err(invalid(format!(
                        "payline {} crosses {} reels, board has {}",
                        line.index,
                        line.len(),
                        file.num_reels
                    )));
                }
                if let Some((reel, row)) = line
                    .rows
                    .iter()
                    .enumerate()
                    .find(|(reel, row)| **row >= num_rows[*reel])
                {
                    return Err(invalid(format!(
                        "payline {} uses row {} on reel {} which has {} rows",
                        line.index, row, reel, num_rows[reel]
                    )));
                }
            }
        }

        for mode in &file.bet_modes {
            mode.validate()?;
            for dist in &mode.distributions {
                for weights in dist.conditions.reel_weights.values() {
                    if let Some(id) = weights.keys().find(|id| !reels.contains_key(*id)) {
                        return Err(ReelError::UnknownReelStrip(format!(
                            "{} (bet mode '{}', criteria '{}')",
                            id, mode.name, dist.criteria
                        )));
                    }
                }
                if dist.conditions.force_freegame && !file.freespin_triggers.contains_key(&GameType::Base) {
                    return Err(invalid(format!(
                        "criteria '{}' forces the feature but no basegame freespin_triggers exist",
                        dist.criteria
                    )));
                }
            }
        }
        if file.bet_modes.is_empty() {
            return Err(invalid("at least one bet mode is required".into()));
        }

        let mut anticipation_triggers = file.anticipation_triggers;
        for (game_type, table) in &file.freespin_triggers {
            if let Some(&min) = table.keys().next() {
                anticipation_triggers
                    .entry(*game_type)
                    .or_insert_with(|| min.saturating_sub(1).max(1));
            }
        }

        let tumble = file
            .tumble
            .unwrap_or_else(|| file.win_mechanism.tumbles_by_default());

        Ok(GameConfig {
            game_id: file.game_id,
            num_reels: file.num_reels,
            num_rows,
            include_padding: file.include_padding,
            tumble,
            win_mechanism: file.win_mechanism,
            paytable,
            special_symbols: file.special_symbols,
            reels,
            freespin_triggers: file.freespin_triggers,
            anticipation_triggers,
            mechanics: file.mechanics,
            bet_modes: file.bet_modes,
            symbols,
        })
    }
}

fn validate_hooks(
    hooks: &BTreeMap<String, Vec<SymbolHook>>,
    symbols: &SymbolStorage,
) -> ReelResult<()> {
    for (name, list) in hooks {
        let def = symbols.definition(name)?;
        for hook in list {
            let role = match hook {
                SymbolHook::MultiplierFromDistribution => SymbolRole::Multiplier,
                SymbolHook::PrizeFromDistribution => SymbolRole::Prize,
            };
            if !def.has_role(role) {
                return Err(invalid(format!(
                    "hook {:?} on '{}' needs the '{}' role",
                    hook, name, role
                )));
            }
        }
    }
    Ok(())
}

fn validate_reel_set(
    id: &str,
    strips: &[ReelStrip],
    num_reels: usize,
    symbols: &SymbolStorage,
    limits: &ConfigLimits,
) -> ReelResult<()> {
    if strips.len() != num_reels {
        return Err(invalid(format!(
            "reel set '{}' has {} reels, board has {}",
            id,
            strips.len(),
            num_reels
        )));
    }
    for (reel, strip) in strips.iter().enumerate() {
        if strip.is_empty() || strip.len() > limits.max_strip_length {
            return Err(invalid(format!(
                "reel set '{}' reel {} length must be in 1..={}, got {}",
                id,
                reel,
                limits.max_strip_length,
                strip.len()
            )));
        }
    }

    let unknown: BTreeSet<&str> = strips
        .iter()
        .flat_map(|s| s.symbols.iter())
        .map(String::as_str)
        .filter(|name| !symbols.contains(name))
        .collect();
    if !unknown.is_empty() {
        return Err(invalid(format!(
            "reel set '{}' uses unregistered symbols {:?}; registered: {:?}",
            id,
            unknown,
            symbols.names()
        )));
    }
    Ok(())
}
