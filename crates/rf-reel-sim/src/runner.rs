//! Batch runner: allocate, fan out shards on a rayon pool, merge

use std::time::Instant;

use rayon::prelude::*;

use rf_reel_math::GameConfig;

use crate::allocation::allocate;
use crate::error::{SimError, SimResult};
use crate::output::{self, OutputLayout};
use crate::shard::{ShardTotals, plan_shards, run_shard};

/// Fan-out settings
#[derive(Debug, Clone)]
pub struct SimSettings {
    pub threads: usize,
    /// Upper bound on trials per shard
    pub batch_size: usize,
    pub write_books: bool,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            batch_size: 10_000,
            write_books: true,
        }
    }
}

impl SimSettings {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_books(mut self, write_books: bool) -> Self {
        self.write_books = write_books;
        self
    }
}

/// Result of one bet mode
#[derive(Debug, Clone)]
pub struct ModeReport {
    pub mode: String,
    pub shards: usize,
    pub totals: ShardTotals,
    pub rtp: f64,
    pub base_rtp: f64,
    pub free_rtp: f64,
    pub force_records: usize,
}

/// Runs bet modes of one game into one output directory
pub struct BatchRunner<'a> {
    config: &'a GameConfig,
    settings: SimSettings,
    layout: OutputLayout,
}

impl<'a> BatchRunner<'a> {
    pub fn new(config: &'a GameConfig, layout: OutputLayout) -> Self {
        Self {
            config,
            settings: SimSettings::default(),
            layout,
        }
    }

    pub fn with_settings(mut self, settings: SimSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Run every `(mode, trials)` request in order; zero-trial requests are skipped
    pub fn run(&self, requests: &[(String, usize)]) -> SimResult<Vec<ModeReport>> {
        self.layout.create_dirs()?;
        let requested: usize = requests.iter().map(|(_, n)| n).sum();
        if !self.settings.write_books {
            log::info!("Books disabled, writing lookup and force files only");
        } else if requested > 10_000 {
            log::warn!("Writing {} uncompressed books", requested);
        }

        let mut reports = Vec::new();
        for (mode, trials) in requests {
            if *trials == 0 {
                log::info!("Skipping mode '{}' (0 trials)", mode);
                continue;
            }
            reports.push(self.run_mode(mode, *trials)?);
        }
        output::cleanup_temp(&self.layout)?;
        Ok(reports)
    }

    /// One bet mode: allocation, parallel shards, fragment merge
    pub fn run_mode(&self, mode_name: &str, requested: usize) -> SimResult<ModeReport> {
        let started = Instant::now();
        let mode = self.config.bet_mode(mode_name)?;
        let plans = allocate(mode, requested)?;
        let shards = plan_shards(plans.len(), self.settings.threads, self.settings.batch_size)?;
        log::info!(
            "Running {} trials of '{}' in mode '{}' ({} shards, {} threads)",
            plans.len(),
            self.config.game_id,
            mode.name,
            shards.len(),
            self.settings.threads
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.threads)
            .build()
            .map_err(|e| SimError::ThreadPool(e.to_string()))?;

        let results: Vec<SimResult<ShardTotals>> = pool.install(|| {
            shards
                .par_iter()
                .map(|shard| {
                    let out = run_shard(self.config, &mode.name, shard, &plans)?;
                    if out.books.len() != shard.len() {
                        return Err(SimError::ShardMismatch {
                            shard: shard.index,
                            expected: shard.len(),
                            actual: out.books.len(),
                        });
                    }
                    output::write_fragments(
                        &self.layout,
                        &mode.name,
                        mode.max_win,
                        &out,
                        self.settings.write_books,
                    )?;
                    Ok(out.totals)
                })
                .collect()
        });

        let mut totals = ShardTotals::default();
        for result in results {
            totals.add(&result?);
        }

        let merged = output::merge_fragments(&self.layout, &mode.name, &shards, self.settings.write_books)?;
        if merged.trials != plans.len() {
            return Err(SimError::ShardMismatch {
                shard: shards.len(),
                expected: plans.len(),
                actual: merged.trials,
            });
        }
        output::update_force_options(&self.layout, &mode.name, &merged.recorder)?;

        let (rtp, base_rtp, free_rtp) = totals.rtp(mode.cost);
        log::info!(
            "Mode '{}' finished in {:.2?}: RTP {:.4} [base {:.4}, feature {:.4}], {} repeats",
            mode.name,
            started.elapsed(),
            rtp,
            base_rtp,
            free_rtp,
            totals.repeats
        );
        log::info!("Lookup table: {}", self.layout.lookup_table(&mode.name).display());

        Ok(ModeReport {
            mode: mode.name.clone(),
            shards: shards.len(),
            totals,
            rtp,
            base_rtp,
            free_rtp,
            force_records: merged.recorder.len(),
        })
    }
}
