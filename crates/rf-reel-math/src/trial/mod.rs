//! Trial controller
//!
//! One trial is one seeded game round played under one criteria bucket:
//!
//! ```text
//! Start ─► Reveal ─► Evaluate ─► (Tumble ─► Evaluate)* ─► Settle
//!   ▲                                                       │
//!   │                                 [FeatureEntry ─► FeatureLoop ─► FeatureSettle]
//!   │                                                       │
//!   └──────────── reject ◄──────── Finalize ◄───────────────┘
//!                                     │ accept
//!                                     ▼
//!                             imprint force records
//! ```
//!
//! A rejected attempt discards its book and buffered force records and plays
//! again from the same RNG stream. Rejection is ordinary control flow.

mod feature;
mod repeat;

pub use repeat::{RejectReason, RepeatMonitor};

use rand::Rng;

use crate::board::{Board, BoardGenerator, Position};
use crate::book::Book;
use crate::config::{BetMode, Distribution, GameConfig, GameType, WinLevelKind, WinLevels};
use crate::error::{ReelError, ReelResult};
use crate::events::{BoardMultiplierWin, EventFormat, EventKind, MultiplierCell};
use crate::random::trial_rng;
use crate::recorder::{ForceDescription, ForceRecorder};
use crate::symbols::SymbolRole;
use crate::tumble::tumble_board;
use crate::win_manager::WinManager;
use crate::wins::{EvalContext, WinData, WinEvaluator, evaluator_for, round2};

/// Criteria name of the bucket allowed to pay nothing
pub const ZERO_CRITERIA: &str = "0";

/// Accepted trial
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub book: Book,
    /// Attempts discarded before acceptance
    pub repeats: u64,
}

/// State of one attempt
struct Attempt<'a> {
    id: u64,
    distribution: &'a Distribution,
    book: Book,
    game_type: GameType,
    global_multiplier: u32,
    grid: Option<Vec<Vec<u32>>>,
    fs: u32,
    tot_fs: u32,
    wincap_triggered: bool,
    triggered_freegame: bool,
    rejected: Option<RejectReason>,
    final_win: f64,
}

impl<'a> Attempt<'a> {
    fn new(id: u64, distribution: &'a Distribution) -> Self {
        Self {
            id,
            distribution,
            book: Book::new(id, distribution.criteria.clone()),
            game_type: GameType::Base,
            global_multiplier: 1,
            grid: None,
            fs: 0,
            tot_fs: 0,
            wincap_triggered: false,
            triggered_freegame: false,
            rejected: None,
            final_win: 0.0,
        }
    }
}

/// Plays trials of one bet mode
pub struct TrialController<'a> {
    config: &'a GameConfig,
    mode: &'a BetMode,
    evaluator: Box<dyn WinEvaluator>,
    levels: WinLevels,
    format: EventFormat,
    win_manager: WinManager,
    recorder: ForceRecorder,
    monitor: RepeatMonitor,
}

impl<'a> TrialController<'a> {
    pub fn new(config: &'a GameConfig, mode_name: &str) -> ReelResult<Self> {
        let mode = config.bet_mode(mode_name)?;
        Ok(Self {
            config,
            mode,
            evaluator: evaluator_for(&config.win_mechanism),
            levels: WinLevels::for_wincap(mode.max_win),
            format: EventFormat {
                padding: config.include_padding,
                wincap: mode.max_win,
            },
            win_manager: WinManager::new(mode.max_win),
            recorder: ForceRecorder::new(),
            monitor: RepeatMonitor::default(),
        })
    }

    pub fn with_repeat_warning(mut self, every: u64) -> Self {
        self.monitor = RepeatMonitor::new(every);
        self
    }

    pub fn with_win_levels(mut self, levels: WinLevels) -> Self {
        self.levels = levels;
        self
    }

    pub fn bet_mode(&self) -> &'a BetMode {
        self.mode
    }

    /// Cumulative totals of every accepted trial
    pub fn win_manager(&self) -> &WinManager {
        &self.win_manager
    }

    pub fn recorder(&self) -> &ForceRecorder {
        &self.recorder
    }

    pub fn into_recorder(self) -> ForceRecorder {
        self.recorder
    }

    /// Play trial `id` under `criteria` until it satisfies the bucket
    pub fn run_trial(&mut self, id: u64, criteria: &str, seed: u64) -> ReelResult<TrialOutcome> {
        let distribution = self.mode.distribution(criteria)?;
        let mut rng = trial_rng(seed);
        self.monitor.reset();

        loop {
            let mut attempt = Attempt::new(id, distribution);
            self.recorder.discard_pending();
            self.win_manager.reset_end_round_wins();

            let generator = BoardGenerator::new(self.config, &distribution.conditions, GameType::Base);
            let mut board = generator.draw_for_phase(&mut rng)?;
            attempt
                .book
                .add_event(self.format.reveal(&board, GameType::Base));
            self.play_board(&mut attempt, &mut board, &generator, &mut rng)?;

            self.check_feature_entry(&mut attempt, &board, &mut rng)?;
            self.finalize(&mut attempt)?;

            match self.verdict(&attempt) {
                None => {
                    self.recorder.imprint(id);
                    self.win_manager.update_end_round_wins();
                    log::debug!(
                        "trial {} [{}] accepted after {} repeats",
                        id,
                        criteria,
                        self.monitor.count()
                    );
                    return Ok(TrialOutcome {
                        book: attempt.book,
                        repeats: self.monitor.count(),
                    });
                }
                Some(reason) => {
                    self.monitor.record(id, criteria, reason);
                }
            }
        }
    }

    /// Evaluate, cascade and settle one revealed board
    fn play_board<R: Rng + ?Sized>(
        &mut self,
        attempt: &mut Attempt<'a>,
        board: &mut Board,
        generator: &BoardGenerator<'a>,
        rng: &mut R,
    ) -> ReelResult<()> {
        let mut data = self.evaluate(attempt, board);
        while self.config.tumble && data.is_win() && !attempt.wincap_triggered {
            let outcome = tumble_board(board, generator, rng)?;
            attempt
                .book
                .add_event(self.format.tumble_board(&outcome.exploded, &outcome.new_symbols));

            if attempt.game_type == GameType::Free && self.config.mechanics.tumble_global_multiplier {
                attempt.global_multiplier += 1;
                attempt.book.add_event(EventKind::UpdateGlobalMult {
                    global_mult: attempt.global_multiplier,
                });
            }
            data = self.evaluate(attempt, board);
        }
        if self.config.tumble && self.win_manager.spin_win > 0.0 {
            attempt.book.add_event(EventKind::SetTumbleWin {
                amount: self.format.cents(self.win_manager.spin_win),
            });
        }
        self.settle(attempt, board);
        Ok(())
    }

    fn evaluate(&mut self, attempt: &mut Attempt<'a>, board: &mut Board) -> WinData {
        let mut ctx = EvalContext::new(&self.config.paytable)
            .with_global_multiplier(attempt.global_multiplier as f64);
        if attempt.game_type == GameType::Free {
            if let Some(grid) = attempt.grid.as_deref() {
                ctx = ctx.with_position_multipliers(grid);
            }
        }
        let data = self.evaluator.evaluate(board, &ctx);

        for record in &data.wins {
            self.recorder
                .record(self.evaluator.describe(record, attempt.game_type));
        }
        self.win_manager.update_spin_win(data.total_win);
        self.win_manager.tumble_win = data.total_win;

        if data.is_win() {
            attempt.book.add_event(self.format.win_info(&data));
            if self.config.tumble {
                attempt.book.add_event(EventKind::UpdateTumbleWin {
                    amount: self.format.cents(self.win_manager.spin_win),
                });
            }
            self.evaluate_wincap(attempt);
        }

        if attempt.game_type == GameType::Free && data.is_win() {
            if let (Some(grid), Some(cfg)) = (attempt.grid.as_mut(), self.config.mechanics.grid_multipliers) {
                grow_grid(grid, &data, cfg.max);
                attempt.book.add_event(EventKind::UpdateGridMultipliers {
                    grid_multipliers: grid.clone(),
                });
            }
        }
        data
    }

    fn evaluate_wincap(&mut self, attempt: &mut Attempt<'a>) {
        if self.win_manager.wincap_reached() && !attempt.wincap_triggered {
            attempt.wincap_triggered = true;
            attempt.book.add_event(EventKind::Wincap {
                amount: self.format.cents(self.win_manager.running_bet_win),
            });
        }
    }

    /// Close a reveal: board multiplier, win ticker, phase totals
    fn settle(&mut self, attempt: &mut Attempt<'a>, board: &Board) {
        if attempt.game_type == GameType::Free && self.config.mechanics.board_multiplier_on_settle {
            let cells: Vec<MultiplierCell> = board
                .role_positions(SymbolRole::Multiplier)
                .iter()
                .filter_map(|p| {
                    board.get(*p).multiplier().map(|m| MultiplierCell {
                        reel: p.reel,
                        row: self.format.position(*p).row,
                        multiplier: m,
                    })
                })
                .collect();
            let board_mult = cells.iter().map(|c| c.multiplier).sum::<u32>().max(1);
            let base = self.win_manager.spin_win;
            self.win_manager.set_spin_win(base * board_mult as f64);

            if self.win_manager.spin_win > 0.0 && !cells.is_empty() {
                attempt.book.add_event(EventKind::BoardMultiplierInfo {
                    mult_info: cells,
                    win_info: BoardMultiplierWin {
                        tumble_win: self.format.cents(base),
                        board_mult,
                        total_win: self.format.cents(self.win_manager.spin_win),
                    },
                });
                attempt.book.add_event(EventKind::UpdateTumbleWin {
                    amount: self.format.cents(self.win_manager.spin_win),
                });
                self.evaluate_wincap(attempt);
            }
        }

        if self.win_manager.spin_win > 0.0 && !attempt.wincap_triggered {
            attempt.book.add_event(EventKind::SetWin {
                amount: self.format.cents(self.win_manager.spin_win),
                win_level: self
                    .levels
                    .level(WinLevelKind::Standard, self.win_manager.spin_win),
            });
        }
        attempt.book.add_event(EventKind::SetTotalWin {
            amount: self.format.cents(self.win_manager.running_bet_win),
        });
        self.win_manager.update_game_type_wins(attempt.game_type);
    }

    fn check_feature_entry<R: Rng + ?Sized>(
        &mut self,
        attempt: &mut Attempt<'a>,
        board: &Board,
        rng: &mut R,
    ) -> ReelResult<()> {
        let Some(min) = self.config.min_freespin_trigger(GameType::Base) else {
            return Ok(());
        };
        let count = board.count_role(SymbolRole::Scatter);
        if count < min {
            return Ok(());
        }
        if !attempt.distribution.conditions.force_freegame {
            attempt.rejected = Some(RejectReason::FeatureNotExpected);
            return Ok(());
        }

        self.recorder.record(
            ForceDescription::new()
                .with("kind", count)
                .with("symbol", SymbolRole::Scatter)
                .with("gametype", GameType::Base),
        );
        attempt.tot_fs = self.freespins(GameType::Base, count)?;
        attempt.book.add_event(EventKind::FreeSpinTrigger {
            total_fs: attempt.tot_fs,
            positions: self.scatter_positions(board),
        });
        self.run_feature(attempt, rng)
    }

    fn freespins(&self, game_type: GameType, count: usize) -> ReelResult<u32> {
        self.config.freespins_for(game_type, count).ok_or_else(|| {
            ReelError::InvalidConfig(format!(
                "no {} freespin award for {} scatters",
                game_type, count
            ))
        })
    }

    fn scatter_positions(&self, board: &Board) -> Vec<Position> {
        self.format.positions(board.role_positions(SymbolRole::Scatter))
    }

    /// Cap the payout and check the phase split adds up
    fn finalize(&mut self, attempt: &mut Attempt<'a>) -> ReelResult<()> {
        let cap = self.mode.max_win;
        let wm = &self.win_manager;
        let final_win = round2(wm.running_bet_win.min(cap));
        let base = round2(wm.base_wins.min(cap));
        let free = round2(wm.free_wins.min(cap));

        let split = round2(wm.base_wins + wm.free_wins).min(cap);
        if (split - final_win).abs() > 1e-6 {
            return Err(ReelError::PayoutMismatch {
                base,
                feature: free,
                total: final_win,
            });
        }

        attempt.final_win = final_win;
        attempt.book.payout_multiplier = self.format.cents(final_win);
        attempt.book.base_game_wins = base;
        attempt.book.free_game_wins = free;
        attempt.book.add_event(EventKind::FinalWin {
            amount: self.format.cents(final_win),
        });
        Ok(())
    }

    fn verdict(&self, attempt: &Attempt<'a>) -> Option<RejectReason> {
        if let Some(reason) = attempt.rejected {
            return Some(reason);
        }
        let distribution = attempt.distribution;
        if let Some(target) = distribution.win_criteria {
            if (attempt.final_win - target).abs() > 1e-9 {
                return Some(RejectReason::WinCriteria);
            }
        }
        if distribution.conditions.force_freegame && !attempt.triggered_freegame {
            return Some(RejectReason::FeatureMissing);
        }
        if distribution.conditions.force_wincap && !attempt.wincap_triggered {
            return Some(RejectReason::WincapMissing);
        }
        if self.win_manager.running_bet_win == 0.0 && distribution.criteria != ZERO_CRITERIA {
            return Some(RejectReason::ZeroPayout);
        }
        None
    }
}

/// Winning cells activate at 1, then grow by 1 up to `max`
fn grow_grid(grid: &mut [Vec<u32>], data: &WinData, max: u32) {
    for record in &data.wins {
        for pos in &record.positions {
            if let Some(cell) = grid.get_mut(pos.reel).and_then(|c| c.get_mut(pos.row)) {
                *cell = if *cell == 0 { 1 } else { (*cell + 1).min(max) };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;

    #[test]
    fn test_same_seed_same_book() {
        let config = presets::lines_5x3().unwrap();
        let mut a = TrialController::new(&config, "base").unwrap();
        let mut b = TrialController::new(&config, "base").unwrap();
        let x = a.run_trial(1, "basegame", 1234).unwrap();
        let y = b.run_trial(1, "basegame", 1234).unwrap();
        assert_eq!(x.book, y.book);
        assert_eq!(x.repeats, y.repeats);
    }

    #[test]
    fn test_zero_bucket_pays_nothing() {
        let config = presets::lines_5x3().unwrap();
        let mut controller = TrialController::new(&config, "base").unwrap();
        for id in 1..=5 {
            let outcome = controller.run_trial(id, ZERO_CRITERIA, id * 17).unwrap();
            assert_eq!(outcome.book.payout_multiplier, 0);
            assert_eq!(outcome.book.criteria, "0");
        }
    }

    #[test]
    fn test_non_zero_bucket_always_pays() {
        let config = presets::lines_5x3().unwrap();
        let mut controller = TrialController::new(&config, "base").unwrap();
        for id in 1..=5 {
            let outcome = controller.run_trial(id, "basegame", id).unwrap();
            assert!(outcome.book.payout_multiplier > 0);
        }
    }

    #[test]
    fn test_final_event_closes_book() {
        let config = presets::cluster_7x7().unwrap();
        let mut controller = TrialController::new(&config, "base").unwrap();
        let outcome = controller.run_trial(3, "basegame", 3).unwrap();
        let events = &outcome.book.events;
        assert_eq!(events.first().unwrap().kind.type_name(), "reveal");
        assert_eq!(events.last().unwrap().kind.type_name(), "finalWin");
        assert!(events.iter().enumerate().all(|(i, e)| e.index == i));
    }

    #[test]
    fn test_grid_growth() {
        let mut grid = vec![vec![0u32; 2]; 2];
        let data = WinData {
            total_win: 1.0,
            wins: vec![crate::wins::WinRecord {
                symbol: "H1".into(),
                kind: 2,
                win: 1.0,
                positions: vec![Position::new(0, 0), Position::new(1, 1)],
                meta: Default::default(),
            }],
        };
        grow_grid(&mut grid, &data, 3);
        assert_eq!(grid, vec![vec![1, 0], vec![0, 1]]);
        grow_grid(&mut grid, &data, 3);
        grow_grid(&mut grid, &data, 3);
        grow_grid(&mut grid, &data, 3);
        assert_eq!(grid[0][0], 3);
    }
}
