//! Board generation integration tests
//!
//! Tests for:
//! - Forcing an exact scatter count onto strips that carry scatters on a few reels
//! - Anticipation ramp after a forced reveal
//! - Tumble keeping the window shape

use proptest::prelude::*;

use rf_reel_math::config::GameType;
use rf_reel_math::random::trial_rng;
use rf_reel_math::symbols::SymbolRole;
use rf_reel_math::tumble::tumble_board;
use rf_reel_math::wins::EvalContext;
use rf_reel_math::{BoardGenerator, ForceTarget, GameConfig, evaluator_for, presets};

// ═══════════════════════════════════════════════════════════════════════════════
// FIXTURE
// ═══════════════════════════════════════════════════════════════════════════════

/// Scatters only on reels 0, 2 and 4, never twice in one window
const ODD_SCATTER_GAME: &str = r#"
game_id: odd_scatter
num_reels: 5
num_rows: 3
win_mechanism:
  type: lines
  paylines:
    - { index: 1, rows: [1, 1, 1, 1, 1] }
paytable:
  - { symbol: H1, kind: 3, pay: 5 }
  - { symbol: L1, kind: 3, pay: 1 }
special_symbols:
  scatter: [S]
reels:
  BR0:
    - [S, H1, L1, H1, L1, H1, L1, H1]
    - [H1, L1, H1, L1, H1, L1]
    - [L1, H1, S, L1, H1, L1, H1, L1]
    - [L1, L1, H1, H1, L1, H1]
    - [H1, L1, H1, L1, S, H1, L1, H1]
freespin_triggers:
  basegame: { 3: 10 }
bet_modes:
  - name: base
    cost: 1.0
    rtp: 0.96
    max_win: 1000
    distributions:
      - criteria: basegame
        quota: 1.0
        conditions:
          reel_weights: { basegame: { BR0: 1 } }
"#;

fn odd_scatter_game() -> GameConfig {
    GameConfig::from_yaml_str(ODD_SCATTER_GAME, None).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════════
// FORCING
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_forced_two_scatters_land_on_scatter_reels() {
    let config = odd_scatter_game();
    let conditions = &config.bet_mode("base").unwrap().distributions[0].conditions;
    let generator = BoardGenerator::new(&config, conditions, GameType::Base);
    let target = ForceTarget::Role(SymbolRole::Scatter);

    for seed in 0..200 {
        let mut rng = trial_rng(seed);
        let board = generator.force_special(&target, 2, &mut rng).unwrap();
        assert_eq!(board.count_role(SymbolRole::Scatter), 2, "seed {}", seed);
        for pos in board.role_positions(SymbolRole::Scatter) {
            assert!([0, 2, 4].contains(&pos.reel), "seed {} scatter on reel {}", seed, pos.reel);
        }
    }
}

#[test]
fn test_forcing_more_scatters_than_reels_allow_is_never_returned_short() {
    let config = odd_scatter_game();
    let conditions = &config.bet_mode("base").unwrap().distributions[0].conditions;
    let generator = BoardGenerator::new(&config, conditions, GameType::Base);
    let mut rng = trial_rng(7);

    let board = generator
        .force_special(&ForceTarget::Role(SymbolRole::Scatter), 3, &mut rng)
        .unwrap();
    let reels: Vec<usize> = board
        .role_positions(SymbolRole::Scatter)
        .iter()
        .map(|p| p.reel)
        .collect();
    assert_eq!(reels, vec![0, 2, 4]);
}

#[test]
fn test_forced_reveal_ramps_anticipation_after_two_scatters() {
    let config = odd_scatter_game();
    let conditions = &config.bet_mode("base").unwrap().distributions[0].conditions;
    let generator = BoardGenerator::new(&config, conditions, GameType::Base);
    let mut rng = trial_rng(11);

    let board = generator
        .force_special(&ForceTarget::Role(SymbolRole::Scatter), 2, &mut rng)
        .unwrap();
    assert!(board.anticipation.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(board.anticipation.len(), 5);
}

#[test]
fn test_unknown_symbol_cannot_be_forced() {
    let config = odd_scatter_game();
    let conditions = &config.bet_mode("base").unwrap().distributions[0].conditions;
    let generator = BoardGenerator::new(&config, conditions, GameType::Base);
    let mut rng = trial_rng(1);

    assert!(generator
        .force_special(&ForceTarget::Name("W".into()), 1, &mut rng)
        .is_err());
}

// ═══════════════════════════════════════════════════════════════════════════════
// TUMBLE (property)
// ═══════════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_tumble_keeps_window_shape(seed in any::<u64>()) {
        let config = presets::scatter_6x5().unwrap();
        let mode = config.bet_mode("base").unwrap();
        let conditions = &mode.distributions.last().unwrap().conditions;
        let generator = BoardGenerator::new(&config, conditions, GameType::Base);
        let evaluator = evaluator_for(&config.win_mechanism);
        let mut rng = trial_rng(seed);

        let mut board = generator.draw(&mut rng).unwrap();
        for _ in 0..5 {
            let data = evaluator.evaluate(&mut board, &EvalContext::new(&config.paytable));
            if !data.is_win() {
                break;
            }
            tumble_board(&mut board, &generator, &mut rng).unwrap();
            prop_assert_eq!(board.num_reels(), config.num_reels);
            for (reel, column) in board.reels.iter().enumerate() {
                prop_assert_eq!(column.len(), config.num_rows[reel]);
            }
            prop_assert!(board.exploding_positions().is_empty());
        }
    }
}
