//! Reelsim Batch Trial Runner
//!
//! Usage:
//!   reelsim run --game <file|preset> --mode base=100000 --out <dir>
//!   reelsim summary --lookup <csv> [--segmented <csv>] --cost 1
//!   reelsim publish --out <dir> --mode base --adjusted <csv>
//!   reelsim presets [--export <dir>]
//!   reelsim validate --game <file|preset>

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use rf_reel_math::{GameConfig, presets};
use rf_reel_sim::{BatchRunner, OutputLayout, SimSettings, lookup, output, summarize};

#[derive(Parser)]
#[command(name = "reelsim", about = "Reel game batch trial runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run trials and write books, lookup tables and force files
    Run {
        /// Game file (.yaml/.json) or built-in preset name
        #[arg(short, long)]
        game: String,
        /// Trials per bet mode, e.g. `base=100000`
        #[arg(short, long = "mode", value_parser = parse_mode_request, required = true)]
        modes: Vec<(String, usize)>,
        /// Worker threads (default: all cores)
        #[arg(short, long)]
        threads: Option<usize>,
        /// Maximum trials per shard
        #[arg(short, long, default_value_t = 10_000)]
        batch_size: usize,
        /// Output directory
        #[arg(short, long, default_value = "library")]
        out: PathBuf,
        /// Skip writing books
        #[arg(long)]
        no_books: bool,
    },
    /// Print statistics of a lookup table
    Summary {
        #[arg(short, long)]
        lookup: PathBuf,
        /// Segmented table for the base/feature split
        #[arg(short, long)]
        segmented: Option<PathBuf>,
        /// Bet cost of the mode
        #[arg(short, long, default_value_t = 1.0)]
        cost: f64,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Check an optimizer-adjusted table and copy it to publish/
    Publish {
        #[arg(short, long)]
        out: PathBuf,
        #[arg(short, long)]
        mode: String,
        #[arg(short, long)]
        adjusted: PathBuf,
    },
    /// List built-in sample games
    Presets {
        /// Write each preset as a YAML game file into this directory
        #[arg(short, long)]
        export: Option<PathBuf>,
    },
    /// Load a game and print an overview
    Validate {
        #[arg(short, long)]
        game: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            game,
            modes,
            threads,
            batch_size,
            out,
            no_books,
        } => run(&game, &modes, threads, batch_size, &out, no_books),
        Commands::Summary {
            lookup,
            segmented,
            cost,
            json,
        } => summary(&lookup, segmented.as_deref(), cost, json),
        Commands::Publish { out, mode, adjusted } => {
            let target = output::publish_lookup(&OutputLayout::new(out), &mode, &adjusted)
                .with_context(|| format!("Failed to publish {}", adjusted.display()))?;
            println!("{}", target.display());
            Ok(())
        }
        Commands::Presets { export } => list_presets(export.as_deref()),
        Commands::Validate { game } => validate(&game),
    }
}

fn parse_mode_request(arg: &str) -> Result<(String, usize), String> {
    let (name, count) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected <mode>=<trials>, got '{}'", arg))?;
    let count = count
        .trim()
        .parse()
        .map_err(|_| format!("invalid trial count '{}'", count))?;
    Ok((name.trim().to_string(), count))
}

fn load_game(game: &str) -> Result<GameConfig> {
    if presets::PRESET_NAMES.contains(&game) {
        return presets::preset(game).with_context(|| format!("Failed to build preset {}", game));
    }
    let path = Path::new(game);
    if !path.exists() {
        bail!(
            "'{}' is neither a game file nor a preset ({})",
            game,
            presets::PRESET_NAMES.join(", ")
        );
    }
    GameConfig::from_path(path).with_context(|| format!("Failed to load game {}", path.display()))
}

fn run(
    game: &str,
    modes: &[(String, usize)],
    threads: Option<usize>,
    batch_size: usize,
    out: &Path,
    no_books: bool,
) -> Result<()> {
    let config = load_game(game)?;
    let mut settings = SimSettings::default()
        .with_batch_size(batch_size)
        .with_books(!no_books);
    if let Some(threads) = threads {
        settings = settings.with_threads(threads);
    }

    let runner = BatchRunner::new(&config, OutputLayout::new(out)).with_settings(settings);
    let reports = runner.run(modes).context("Batch run failed")?;
    for report in reports {
        println!(
            "{:<12} {:>10} trials  RTP {:.4}  (base {:.4}, feature {:.4})  {} force records",
            report.mode,
            report.totals.trials,
            report.rtp,
            report.base_rtp,
            report.free_rtp,
            report.force_records
        );
    }
    Ok(())
}

fn summary(lookup_path: &Path, segmented: Option<&Path>, cost: f64, json: bool) -> Result<()> {
    let rows = lookup::read_lookup(lookup_path)
        .with_context(|| format!("Failed to read {}", lookup_path.display()))?;
    let segmented = segmented
        .map(|p| lookup::read_segmented(p).with_context(|| format!("Failed to read {}", p.display())))
        .transpose()?;
    let stats = summarize(&rows, segmented.as_deref(), cost)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", stats);
    }
    Ok(())
}

fn list_presets(export: Option<&Path>) -> Result<()> {
    if let Some(dir) = export {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    for name in presets::PRESET_NAMES {
        let file = presets::preset_file(name)?;
        let modes: Vec<&str> = file.bet_modes.iter().map(|m| m.name.as_str()).collect();
        println!(
            "{:<12} {:<8} {} reels  modes: {}",
            name,
            file.win_mechanism.name(),
            file.num_reels,
            modes.join(", ")
        );
        if let Some(dir) = export {
            let path = dir.join(format!("{}.yaml", name));
            let yaml = serde_yml::to_string(&file).context("Failed to serialize preset")?;
            fs::write(&path, yaml).with_context(|| format!("Failed to write {}", path.display()))?;
        }
    }
    Ok(())
}

fn validate(game: &str) -> Result<()> {
    let config = load_game(game)?;
    println!("Game:       {}", config.game_id);
    println!("Mechanism:  {}", config.win_mechanism.name());
    println!("Board:      {} reels, rows {:?}", config.num_reels, config.num_rows);
    println!("Tumble:     {}", config.tumble);
    println!("Symbols:    {}", config.symbols().names().join(" "));
    println!("Paytable:   {} entries", config.paytable.len());
    for (id, strips) in &config.reels {
        let lengths: Vec<usize> = strips.iter().map(|s| s.len()).collect();
        println!("Reels {:<6} lengths {:?}", id, lengths);
    }
    for mode in &config.bet_modes {
        let criteria: Vec<&str> = mode.distributions.iter().map(|d| d.criteria.as_str()).collect();
        println!(
            "Mode {:<8} cost {:>6}  max win {:>8}  criteria: {}",
            mode.name,
            mode.cost,
            mode.max_win,
            criteria.join(", ")
        );
    }
    Ok(())
}
