//! Shards: contiguous slices of a mode's trial plan, one worker each

use std::ops::Range;

use rf_reel_math::{Book, ForceRecorder, GameConfig, TrialController};

use crate::allocation::TrialPlan;
use crate::error::{SimError, SimResult};

/// Trials `range` of the plan, run by one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardPlan {
    pub index: usize,
    pub range: Range<usize>,
}

impl ShardPlan {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Split `total` trials into `threads × batches` contiguous shards
///
/// Batches are added until no shard holds more than `batch_size` trials.
/// Shard sizes differ by at most one.
pub fn plan_shards(total: usize, threads: usize, batch_size: usize) -> SimResult<Vec<ShardPlan>> {
    if threads == 0 || batch_size == 0 {
        return Err(SimError::InvalidRun(format!(
            "threads ({}) and batch size ({}) must be positive",
            threads, batch_size
        )));
    }
    if total == 0 {
        return Ok(Vec::new());
    }

    let batches = total.div_ceil(threads * batch_size).max(1);
    let count = (threads * batches).min(total);
    Ok((0..count)
        .map(|index| ShardPlan {
            index,
            range: total * index / count..total * (index + 1) / count,
        })
        .collect())
}

/// Payout totals of one shard
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShardTotals {
    pub trials: usize,
    pub repeats: u64,
    pub total_wins: f64,
    pub base_wins: f64,
    pub free_wins: f64,
}

impl ShardTotals {
    pub fn add(&mut self, other: &ShardTotals) {
        self.trials += other.trials;
        self.repeats += other.repeats;
        self.total_wins += other.total_wins;
        self.base_wins += other.base_wins;
        self.free_wins += other.free_wins;
    }

    /// (total, base, free) return per unit of stake
    pub fn rtp(&self, cost: f64) -> (f64, f64, f64) {
        let stake = self.trials as f64 * cost;
        if stake <= 0.0 {
            return (0.0, 0.0, 0.0);
        }
        (
            self.total_wins / stake,
            self.base_wins / stake,
            self.free_wins / stake,
        )
    }
}

/// Everything a worker produced
#[derive(Debug, Clone)]
pub struct ShardOutput {
    pub index: usize,
    pub books: Vec<Book>,
    pub recorder: ForceRecorder,
    pub totals: ShardTotals,
}

/// Play the shard's trials in plan order with a fresh controller
pub fn run_shard(
    config: &GameConfig,
    mode_name: &str,
    shard: &ShardPlan,
    plans: &[TrialPlan],
) -> SimResult<ShardOutput> {
    let trials = plans.get(shard.range.clone()).ok_or(SimError::ShardMismatch {
        shard: shard.index,
        expected: shard.len(),
        actual: plans.len().saturating_sub(shard.range.start),
    })?;

    let mut controller = TrialController::new(config, mode_name)?;
    let mut books = Vec::with_capacity(trials.len());
    let mut repeats = 0;
    for trial in trials {
        let outcome = controller.run_trial(trial.id, &trial.criteria, trial.seed)?;
        log::debug!(
            "Trial {} [{}] accepted after {} repeats, payout {}",
            trial.id,
            trial.criteria,
            outcome.repeats,
            outcome.book.payout_multiplier
        );
        repeats += outcome.repeats;
        books.push(outcome.book);
    }

    let wins = controller.win_manager();
    let totals = ShardTotals {
        trials: books.len(),
        repeats,
        total_wins: wins.cumulative_total,
        base_wins: wins.cumulative_base,
        free_wins: wins.cumulative_free,
    };
    let (rtp, base, free) = totals.rtp(controller.bet_mode().cost);
    log::info!(
        "Shard {} finished with {:.3} RTP [baseGame: {:.3}, freeGame: {:.3}]",
        shard.index,
        rtp,
        base,
        free
    );

    Ok(ShardOutput {
        index: shard.index,
        books,
        recorder: controller.into_recorder(),
        totals,
    })
}
