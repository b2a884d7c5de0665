//! Built-in demo games, one per win mechanism
//!
//! Strips are generated deterministically so the presets need no files.
//! Each preset has a `base` and a `bonus` (buy) bet mode with the usual
//! `wincap` / `freegame` / `0` / `basegame` buckets.

use std::collections::BTreeMap;

use crate::config::{
    BetMode, ConfigLimits, Distribution, DistributionConditions, FeatureMechanics, GameConfig,
    GameConfigFile, GameType, GridMultiplierConfig, PayEntry, ReelSource, RowSpec, WinMechanism,
    standard_20_paylines,
};
use crate::error::{ReelError, ReelResult};
use crate::symbols::{SymbolHook, SymbolRole};
use crate::wins::{LineMultiplier, WaysMultiplier};

/// Names accepted by [`preset`]
pub const PRESET_NAMES: [&str; 4] = ["lines_5x3", "ways_5x3", "cluster_7x7", "scatter_6x5"];

/// Game file of a preset, e.g. for export
pub fn preset_file(name: &str) -> ReelResult<GameConfigFile> {
    match name {
        "lines_5x3" => Ok(lines_5x3_file()),
        "ways_5x3" => Ok(ways_5x3_file()),
        "cluster_7x7" => Ok(cluster_7x7_file()),
        "scatter_6x5" => Ok(scatter_6x5_file()),
        other => Err(ReelError::InvalidConfig(format!(
            "unknown preset '{}', expected one of {:?}",
            other, PRESET_NAMES
        ))),
    }
}

/// Compiled preset by name
pub fn preset(name: &str) -> ReelResult<GameConfig> {
    GameConfig::compile(preset_file(name)?, None, &ConfigLimits::default())
}

pub fn lines_5x3() -> ReelResult<GameConfig> {
    preset("lines_5x3")
}

pub fn ways_5x3() -> ReelResult<GameConfig> {
    preset("ways_5x3")
}

pub fn cluster_7x7() -> ReelResult<GameConfig> {
    preset("cluster_7x7")
}

pub fn scatter_6x5() -> ReelResult<GameConfig> {
    preset("scatter_6x5")
}

// ═══════════════════════════════════════════════════════════════════════════════
// STRIP GENERATION
// ═══════════════════════════════════════════════════════════════════════════════

/// One strip: each special at a fixed spacing, fill symbols cycled with a stride
///
/// Spacing larger than the row count keeps a special from stacking in one window.
fn strip(reel: usize, length: usize, fill: &[&str], specials: &[(&str, usize)]) -> Vec<String> {
    (0..length)
        .map(|i| {
            let shifted = i + reel * 5;
            specials
                .iter()
                .find(|(_, every)| shifted % every == every - 1)
                .map(|(name, _)| *name)
                .unwrap_or_else(|| fill[(i * 7 + reel * 3) % fill.len()])
                .to_string()
        })
        .collect()
}

/// A reel set; `specials_for` picks the specials of each reel
fn reel_set(
    reels: usize,
    length: usize,
    fill: &[&str],
    specials_for: impl Fn(usize) -> Vec<(&'static str, usize)>,
) -> ReelSource {
    ReelSource::Inline(
        (0..reels)
            .map(|reel| strip(reel, length, fill, &specials_for(reel)))
            .collect(),
    )
}

fn pays(symbol: &str, table: &[(usize, f64)]) -> Vec<PayEntry> {
    table
        .iter()
        .map(|&(kind, pay)| PayEntry::exact(symbol, kind, pay))
        .collect()
}

fn range_pays(symbol: &str, table: &[(usize, usize, f64)]) -> Vec<PayEntry> {
    table
        .iter()
        .map(|&(min, max, pay)| PayEntry::range(symbol, min, max, pay))
        .collect()
}

fn weights<K: Ord + Copy>(table: &[(K, f64)]) -> BTreeMap<K, f64> {
    table.iter().copied().collect()
}

fn roles(table: &[(SymbolRole, &[&str])]) -> BTreeMap<SymbolRole, Vec<String>> {
    table
        .iter()
        .map(|(role, names)| (*role, names.iter().map(|n| n.to_string()).collect()))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// BET MODES
// ═══════════════════════════════════════════════════════════════════════════════

struct ModeSetup<'a> {
    max_win: f64,
    scatter_triggers: &'a [(usize, f64)],
    free_mults: Option<&'a [(u32, f64)]>,
}

fn conditions(free_reels: &str, setup: &ModeSetup<'_>) -> DistributionConditions {
    let mut c = DistributionConditions::with_reels("BR0", Some(free_reels));
    if let Some(mults) = setup.free_mults {
        c = c.with_mult_values(GameType::Free, weights(mults));
    }
    c
}

fn bet_modes(setup: ModeSetup<'_>) -> Vec<BetMode> {
    let triggers = weights(setup.scatter_triggers);
    let wincap = || {
        Distribution::with_quota(
            "wincap",
            0.001,
            conditions("WCAP", &setup)
                .with_force_freegame(triggers.clone())
                .with_force_wincap(),
        )
        .with_win_criteria(setup.max_win)
    };
    let freegame = |quota| {
        Distribution::with_quota(
            "freegame",
            quota,
            conditions("FR0", &setup).with_force_freegame(triggers.clone()),
        )
    };

    let base = BetMode::new("base", 1.0, 0.97, setup.max_win)
        .with_distribution(wincap())
        .with_distribution(freegame(0.1))
        .with_distribution(
            Distribution::with_quota("0", 0.4, DistributionConditions::with_reels("BR0", None))
                .with_win_criteria(0.0),
        )
        .with_distribution(Distribution::with_quota(
            "basegame",
            0.499,
            DistributionConditions::with_reels("BR0", None),
        ));

    let bonus = BetMode::new("bonus", 100.0, 0.97, setup.max_win)
        .with_buybonus()
        .with_distribution(wincap())
        .with_distribution(freegame(0.999));

    vec![base, bonus]
}

// ═══════════════════════════════════════════════════════════════════════════════
// GAMES
// ═══════════════════════════════════════════════════════════════════════════════

/// 5×3, 20 lines, padded, symbol-multiplier strategy
pub fn lines_5x3_file() -> GameConfigFile {
    let fill = [
        "L1", "L2", "L3", "L4", "L1", "L2", "L3", "L4", "H3", "H2", "H1", "L1", "L2",
    ];
    let mut paytable = Vec::new();
    paytable.extend(pays("W", &[(3, 5.0), (4, 20.0), (5, 100.0)]));
    paytable.extend(pays("H1", &[(3, 2.0), (4, 5.0), (5, 20.0)]));
    paytable.extend(pays("H2", &[(3, 1.0), (4, 3.0), (5, 10.0)]));
    paytable.extend(pays("H3", &[(3, 0.8), (4, 2.0), (5, 8.0)]));
    paytable.extend(pays("L1", &[(3, 0.5), (4, 1.0), (5, 4.0)]));
    paytable.extend(pays("L2", &[(3, 0.4), (4, 0.8), (5, 3.0)]));
    paytable.extend(pays("L3", &[(3, 0.3), (4, 0.6), (5, 2.0)]));
    paytable.extend(pays("L4", &[(3, 0.2), (4, 0.5), (5, 1.5)]));

    let reels = BTreeMap::from([
        (
            "BR0".to_string(),
            reel_set(5, 60, &fill, |_| vec![("S", 13), ("W", 11)]),
        ),
        (
            "FR0".to_string(),
            reel_set(5, 60, &fill, |_| vec![("S", 17), ("W", 6)]),
        ),
        (
            "WCAP".to_string(),
            reel_set(5, 30, &["H1"], |_| vec![("H1", 10), ("W", 1)]),
        ),
    ]);

    GameConfigFile {
        game_id: "lines_5x3".into(),
        num_reels: 5,
        num_rows: RowSpec::Uniform(3),
        include_padding: true,
        win_mechanism: WinMechanism::Lines {
            paylines: standard_20_paylines(),
            multiplier: LineMultiplier::Symbol,
            wild_symbol: "W".into(),
        },
        tumble: None,
        paytable,
        special_symbols: roles(&[
            (SymbolRole::Wild, &["W"]),
            (SymbolRole::Scatter, &["S"]),
        ]),
        symbol_hooks: BTreeMap::new(),
        reels,
        freespin_triggers: BTreeMap::from([
            (GameType::Base, BTreeMap::from([(3, 10), (4, 15), (5, 20)])),
            (GameType::Free, BTreeMap::from([(3, 5), (4, 8), (5, 10)])),
        ]),
        anticipation_triggers: BTreeMap::new(),
        mechanics: FeatureMechanics::default(),
        bet_modes: bet_modes(ModeSetup {
            max_win: 5000.0,
            scatter_triggers: &[(3, 20.0), (4, 5.0), (5, 1.0)],
            free_mults: None,
        }),
    }
}

/// 5×3 ways, wilds carrying feature multipliers
pub fn ways_5x3_file() -> GameConfigFile {
    let fill = [
        "L1", "L2", "L3", "L4", "H1", "L1", "L2", "H2", "L3", "L4", "H3", "L1", "L2",
    ];
    let mut paytable = Vec::new();
    paytable.extend(pays("H1", &[(3, 1.0), (4, 2.5), (5, 5.0)]));
    paytable.extend(pays("H2", &[(3, 0.5), (4, 1.5), (5, 3.0)]));
    paytable.extend(pays("H3", &[(3, 0.4), (4, 1.0), (5, 2.0)]));
    paytable.extend(pays("L1", &[(3, 0.2), (4, 0.5), (5, 1.0)]));
    paytable.extend(pays("L2", &[(3, 0.2), (4, 0.4), (5, 0.8)]));
    paytable.extend(pays("L3", &[(3, 0.1), (4, 0.3), (5, 0.6)]));
    paytable.extend(pays("L4", &[(3, 0.1), (4, 0.2), (5, 0.5)]));

    let no_wild_on_first = |every: usize| {
        move |reel: usize| {
            if reel == 0 {
                vec![("S", 13)]
            } else {
                vec![("S", 13), ("W", every)]
            }
        }
    };
    let reels = BTreeMap::from([
        ("BR0".to_string(), reel_set(5, 65, &fill, no_wild_on_first(12))),
        ("FR0".to_string(), reel_set(5, 65, &fill, no_wild_on_first(7))),
        (
            "WCAP".to_string(),
            reel_set(5, 20, &["H1"], |reel| if reel == 0 { vec![] } else { vec![("W", 2)] }),
        ),
    ]);

    GameConfigFile {
        game_id: "ways_5x3".into(),
        num_reels: 5,
        num_rows: RowSpec::Uniform(3),
        include_padding: true,
        win_mechanism: WinMechanism::Ways {
            multiplier: WaysMultiplier::Symbol,
        },
        tumble: None,
        paytable,
        special_symbols: roles(&[
            (SymbolRole::Wild, &["W"]),
            (SymbolRole::Multiplier, &["W"]),
            (SymbolRole::Scatter, &["S"]),
        ]),
        symbol_hooks: BTreeMap::from([(
            "W".to_string(),
            vec![SymbolHook::MultiplierFromDistribution],
        )]),
        reels,
        freespin_triggers: BTreeMap::from([
            (GameType::Base, BTreeMap::from([(3, 8), (4, 12), (5, 15)])),
            (GameType::Free, BTreeMap::from([(3, 4), (4, 6), (5, 8)])),
        ]),
        anticipation_triggers: BTreeMap::new(),
        mechanics: FeatureMechanics::default(),
        bet_modes: bet_modes(ModeSetup {
            max_win: 5000.0,
            scatter_triggers: &[(3, 20.0), (4, 4.0), (5, 1.0)],
            free_mults: Some(&[(2, 50.0), (3, 25.0), (5, 10.0), (10, 2.0)]),
        }),
    }
}

/// 7×7 cluster pays with tumbles and feature grid multipliers
pub fn cluster_7x7_file() -> GameConfigFile {
    let fill = [
        "L1", "L2", "L3", "L4", "H1", "L1", "L2", "H2", "L3", "L4", "H3", "L1", "H4",
    ];
    let mut paytable = Vec::new();
    let tiers: [(&str, f64); 8] = [
        ("H1", 1.0),
        ("H2", 0.8),
        ("H3", 0.6),
        ("H4", 0.5),
        ("L1", 0.4),
        ("L2", 0.3),
        ("L3", 0.25),
        ("L4", 0.2),
    ];
    for (symbol, unit) in tiers {
        paytable.extend(range_pays(
            symbol,
            &[
                (5, 6, unit),
                (7, 8, unit * 2.0),
                (9, 10, unit * 4.0),
                (11, 14, unit * 10.0),
                (15, 49, unit * 100.0),
            ],
        ));
    }

    let reels = BTreeMap::from([
        (
            "BR0".to_string(),
            reel_set(7, 80, &fill, |_| vec![("S", 29), ("W", 23)]),
        ),
        (
            "FR0".to_string(),
            reel_set(7, 80, &fill, |_| vec![("S", 37), ("W", 11)]),
        ),
        (
            "WCAP".to_string(),
            reel_set(7, 20, &["H1"], |_| vec![("W", 5)]),
        ),
    ]);

    GameConfigFile {
        game_id: "cluster_7x7".into(),
        num_reels: 7,
        num_rows: RowSpec::Uniform(7),
        include_padding: true,
        win_mechanism: WinMechanism::Cluster,
        tumble: None,
        paytable,
        special_symbols: roles(&[
            (SymbolRole::Wild, &["W"]),
            (SymbolRole::Scatter, &["S"]),
        ]),
        symbol_hooks: BTreeMap::new(),
        reels,
        freespin_triggers: BTreeMap::from([
            (
                GameType::Base,
                BTreeMap::from([(4, 10), (5, 12), (6, 15), (7, 18)]),
            ),
            (GameType::Free, BTreeMap::from([(3, 3), (4, 5), (5, 7)])),
        ]),
        anticipation_triggers: BTreeMap::new(),
        mechanics: FeatureMechanics {
            grid_multipliers: Some(GridMultiplierConfig { max: 512 }),
            ..Default::default()
        },
        bet_modes: bet_modes(ModeSetup {
            max_win: 5000.0,
            scatter_triggers: &[(4, 20.0), (5, 5.0), (6, 1.0)],
            free_mults: None,
        }),
    }
}

/// 6×5 pay-anywhere with tumbles, a tumble-stepped global multiplier and
/// board multipliers applied on settle in the feature
pub fn scatter_6x5_file() -> GameConfigFile {
    let fill = [
        "L1", "L1", "L2", "L1", "L3", "L2", "L4", "H1", "L1", "L2", "H2", "L3", "H3", "H4", "L4",
        "L1", "L2",
    ];
    let mut paytable = Vec::new();
    let tiers: [(&str, f64); 8] = [
        ("H1", 2.0),
        ("H2", 1.5),
        ("H3", 1.0),
        ("H4", 0.8),
        ("L1", 0.25),
        ("L2", 0.4),
        ("L3", 0.5),
        ("L4", 0.6),
    ];
    for (symbol, unit) in tiers {
        paytable.extend(range_pays(
            symbol,
            &[(8, 9, unit), (10, 11, unit * 2.5), (12, 30, unit * 10.0)],
        ));
    }

    let reels = BTreeMap::from([
        (
            "BR0".to_string(),
            reel_set(6, 70, &fill, |_| vec![("S", 19)]),
        ),
        (
            "FR0".to_string(),
            reel_set(6, 70, &fill, |_| vec![("S", 23), ("M", 9)]),
        ),
        (
            "WCAP".to_string(),
            reel_set(6, 20, &["H1"], |_| vec![("M", 4)]),
        ),
    ]);

    GameConfigFile {
        game_id: "scatter_6x5".into(),
        num_reels: 6,
        num_rows: RowSpec::Uniform(5),
        include_padding: true,
        win_mechanism: WinMechanism::Scatter,
        tumble: None,
        paytable,
        special_symbols: roles(&[
            (SymbolRole::Scatter, &["S"]),
            (SymbolRole::Multiplier, &["M"]),
        ]),
        symbol_hooks: BTreeMap::from([(
            "M".to_string(),
            vec![SymbolHook::MultiplierFromDistribution],
        )]),
        reels,
        freespin_triggers: BTreeMap::from([
            (GameType::Base, BTreeMap::from([(4, 10), (5, 12), (6, 15)])),
            (GameType::Free, BTreeMap::from([(3, 5)])),
        ]),
        anticipation_triggers: BTreeMap::new(),
        mechanics: FeatureMechanics {
            tumble_global_multiplier: true,
            board_multiplier_on_settle: true,
            ..Default::default()
        },
        bet_modes: bet_modes(ModeSetup {
            max_win: 5000.0,
            scatter_triggers: &[(4, 20.0), (5, 4.0), (6, 1.0)],
            free_mults: Some(&[(2, 100.0), (3, 50.0), (5, 20.0), (10, 5.0), (25, 1.0)]),
        }),
    }
}
