//! Payout bookkeeping for a trial and for a worker's whole run

use crate::config::GameType;

/// Win totals at reveal, trial and cumulative scope
#[derive(Debug, Clone, Default)]
pub struct WinManager {
    /// Win cap in bet multiples
    pub max_win: f64,

    /// Wins of the current reveal, tumbles included
    pub spin_win: f64,
    /// Wins of the latest tumble step
    pub tumble_win: f64,
    /// Everything the trial has paid so far
    pub running_bet_win: f64,
    pub base_wins: f64,
    pub free_wins: f64,

    pub cumulative_total: f64,
    pub cumulative_base: f64,
    pub cumulative_free: f64,
}

impl WinManager {
    pub fn new(max_win: f64) -> Self {
        Self {
            max_win,
            ..Default::default()
        }
    }

    pub fn update_spin_win(&mut self, amount: f64) {
        self.spin_win += amount;
        self.running_bet_win += amount;
    }

    /// Replace the reveal win, carrying the difference into the running total
    pub fn set_spin_win(&mut self, amount: f64) {
        self.running_bet_win += amount - self.spin_win;
        self.spin_win = amount;
    }

    pub fn reset_spin_win(&mut self) {
        self.spin_win = 0.0;
    }

    /// Credit the reveal win to its phase
    pub fn update_game_type_wins(&mut self, game_type: GameType) {
        match game_type {
            GameType::Base => self.base_wins += self.spin_win,
            GameType::Free => self.free_wins += self.spin_win,
        }
    }

    pub fn wincap_reached(&self) -> bool {
        self.running_bet_win >= self.max_win
    }

    /// Fold the accepted trial into the cumulative totals, each phase capped
    pub fn update_end_round_wins(&mut self) {
        let base = self.base_wins.min(self.max_win);
        let free = self.free_wins.min(self.max_win);
        self.cumulative_total += base + free;
        self.cumulative_base += base;
        self.cumulative_free += free;
    }

    pub fn reset_end_round_wins(&mut self) {
        self.base_wins = 0.0;
        self.free_wins = 0.0;
        self.running_bet_win = 0.0;
        self.spin_win = 0.0;
        self.tumble_win = 0.0;
    }
}
