//! Feature round (free spins)

use rand::Rng;

use super::{Attempt, TrialController};
use crate::board::BoardGenerator;
use crate::config::{GameType, WinLevelKind};
use crate::error::ReelResult;
use crate::events::EventKind;
use crate::symbols::SymbolRole;

impl<'a> TrialController<'a> {
    /// Play the awarded spins, adding retriggers, until they run out or the
    /// win cap is reached
    pub(super) fn run_feature<R: Rng + ?Sized>(
        &mut self,
        attempt: &mut Attempt<'a>,
        rng: &mut R,
    ) -> ReelResult<()> {
        attempt.triggered_freegame = true;
        attempt.fs = 0;
        attempt.game_type = GameType::Free;
        self.win_manager.reset_spin_win();
        if self.config.mechanics.grid_multipliers.is_some() {
            attempt.grid = Some(self.config.num_rows.iter().map(|&rows| vec![0; rows]).collect());
        }

        let distribution = attempt.distribution;
        let generator = BoardGenerator::new(self.config, &distribution.conditions, GameType::Free);
        let retrigger_min = self.config.min_freespin_trigger(GameType::Free);

        while attempt.fs < attempt.tot_fs && !attempt.wincap_triggered {
            attempt.fs += 1;
            attempt.book.add_event(EventKind::UpdateFreeSpin {
                amount: attempt.fs,
                total: attempt.tot_fs,
            });
            self.win_manager.reset_spin_win();
            attempt.global_multiplier = 1;
            if self.config.mechanics.tumble_global_multiplier {
                attempt.book.add_event(EventKind::UpdateGlobalMult { global_mult: 1 });
            }

            let mut board = generator.draw_for_phase(rng)?;
            attempt.book.add_event(self.format.reveal(&board, GameType::Free));
            if let Some(grid) = &attempt.grid {
                attempt.book.add_event(EventKind::UpdateGridMultipliers {
                    grid_multipliers: grid.clone(),
                });
            }
            self.play_board(attempt, &mut board, &generator, rng)?;

            if let Some(min) = retrigger_min {
                let count = board.count_role(SymbolRole::Scatter);
                if count >= min {
                    attempt.tot_fs += self.freespins(GameType::Free, count)?;
                    attempt.book.add_event(EventKind::FreeSpinRetrigger {
                        total_fs: attempt.tot_fs,
                        positions: self.scatter_positions(&board),
                    });
                }
            }
        }

        let free_wins = self.win_manager.free_wins;
        attempt.book.add_event(EventKind::FreeSpinEnd {
            amount: self.format.cents(free_wins),
            win_level: self.levels.level(WinLevelKind::EndFeature, free_wins),
        });
        log::trace!(
            "trial {}: feature ended after {}/{} spins",
            attempt.id,
            attempt.fs,
            attempt.tot_fs
        );
        Ok(())
    }
}
