//! Batch runner integration tests
//!
//! Tests for:
//! - Byte-identical output for the same request, whatever the fan-out
//! - Criteria composition of the written tables
//! - Artifact layout and temp cleanup
//! - Publishing an optimizer-adjusted table

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rf_reel_math::GameConfig;
use rf_reel_sim::{BatchRunner, OutputLayout, SimSettings, lookup, output, quota_splits, summarize};

// ═══════════════════════════════════════════════════════════════════════════════
// FIXTURE
// ═══════════════════════════════════════════════════════════════════════════════

const SMALL_GAME: &str = r#"
game_id: small_lines
num_reels: 3
num_rows: 3
win_mechanism:
  type: lines
  paylines:
    - { index: 1, rows: [1, 1, 1] }
    - { index: 2, rows: [0, 1, 2] }
paytable:
  - { symbol: H1, kind: 3, pay: 5 }
  - { symbol: L1, kind: 3, pay: 1 }
  - { symbol: L2, kind: 3, pay: 0.5 }
reels:
  BR0:
    - [H1, L1, L2, H1, L2, L1, H1, L2]
    - [L1, H1, L2, L1, H1, L2, L1]
    - [L2, L1, H1, L2, H1, L1, L2, H1, L1]
bet_modes:
  - name: base
    cost: 1.0
    rtp: 0.96
    max_win: 100
    distributions:
      - criteria: basegame
        quota: 0.6
        conditions:
          reel_weights: { basegame: { BR0: 1 } }
      - criteria: "0"
        quota: 0.4
        win_criteria: 0
        conditions:
          reel_weights: { basegame: { BR0: 1 } }
"#;

fn small_game() -> GameConfig {
    GameConfig::from_yaml_str(SMALL_GAME, None).unwrap()
}

fn run_into(config: &GameConfig, dir: &Path, threads: usize, batch_size: usize, trials: usize) {
    let settings = SimSettings::default()
        .with_threads(threads)
        .with_batch_size(batch_size);
    BatchRunner::new(config, OutputLayout::new(dir))
        .with_settings(settings)
        .run(&[("base".to_string(), trials)])
        .unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// DETERMINISM
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_repeated_run_is_byte_identical() {
    let config = small_game();
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    run_into(&config, a.path(), 2, 16, 60);
    run_into(&config, b.path(), 2, 16, 60);

    let (la, lb) = (OutputLayout::new(a.path()), OutputLayout::new(b.path()));
    for (x, y) in [
        (la.lookup_table("base"), lb.lookup_table("base")),
        (la.segmented_table("base"), lb.segmented_table("base")),
        (la.books("base"), lb.books("base")),
        (la.force_record("base"), lb.force_record("base")),
    ] {
        assert_eq!(fs::read(&x).unwrap(), fs::read(&y).unwrap(), "{}", x.display());
    }
}

#[test]
fn test_fan_out_does_not_change_lookup_table() {
    let config = small_game();
    let narrow = tempfile::tempdir().unwrap();
    let wide = tempfile::tempdir().unwrap();
    run_into(&config, narrow.path(), 1, 100, 45);
    run_into(&config, wide.path(), 3, 4, 45);

    let read = |dir: &Path| fs::read_to_string(OutputLayout::new(dir).lookup_table("base")).unwrap();
    assert_eq!(read(narrow.path()), read(wide.path()));
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPOSITION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_segmented_table_matches_quota_split() {
    let config = small_game();
    let dir = tempfile::tempdir().unwrap();
    run_into(&config, dir.path(), 2, 10, 50);

    let layout = OutputLayout::new(dir.path());
    let rows = lookup::read_segmented(layout.segmented_table("base")).unwrap();
    let mut written: BTreeMap<String, usize> = BTreeMap::new();
    for row in &rows {
        *written.entry(row.criteria.clone()).or_default() += 1;
    }
    let expected: BTreeMap<String, usize> = quota_splits(config.bet_mode("base").unwrap(), 50)
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(written, expected);

    for row in rows.iter().filter(|r| r.criteria == "0") {
        assert_eq!(row.base + row.free, 0);
    }
}

#[test]
fn test_lookup_ids_are_sequential_and_paying_rows_match_criteria() {
    let config = small_game();
    let dir = tempfile::tempdir().unwrap();
    run_into(&config, dir.path(), 2, 8, 30);

    let layout = OutputLayout::new(dir.path());
    let table = lookup::read_lookup(layout.lookup_table("base")).unwrap();
    let ids: Vec<u64> = table.iter().map(|r| r.id).collect();
    assert_eq!(ids, (1..=30).collect::<Vec<u64>>());

    let segmented = lookup::read_segmented(layout.segmented_table("base")).unwrap();
    for (row, seg) in table.iter().zip(&segmented) {
        assert_eq!(row.id, seg.id);
        assert_eq!(row.payout > 0, seg.criteria == "basegame");
    }

    let stats = summarize(&table, Some(&segmented), 1.0).unwrap();
    assert_eq!(stats.trials, 30);
    assert_eq!(stats.criteria["basegame"].count, 18);
}

// ═══════════════════════════════════════════════════════════════════════════════
// ARTIFACTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_run_writes_artifacts_and_removes_temp() {
    let config = small_game();
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());
    let reports = BatchRunner::new(&config, layout.clone())
        .with_settings(SimSettings::default().with_threads(2).with_batch_size(5))
        .run(&[("base".to_string(), 20), ("base".to_string(), 0)])
        .unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].totals.trials, 20);
    assert_eq!(reports[0].shards, 4);

    assert!(layout.books("base").is_file());
    assert!(layout.lookup_table("base").is_file());
    assert!(layout.segmented_table("base").is_file());
    assert!(layout.force_record("base").is_file());
    assert!(!layout.temp_dir().exists());

    let books = fs::read_to_string(layout.books("base")).unwrap();
    assert_eq!(books.lines().count(), 20);

    let options: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(layout.force_options()).unwrap()).unwrap();
    assert!(options.get("base").is_some());
}

#[test]
fn test_books_can_be_skipped() {
    let config = small_game();
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());
    BatchRunner::new(&config, layout.clone())
        .with_settings(SimSettings::default().with_threads(1).with_books(false))
        .run(&[("base".to_string(), 10)])
        .unwrap();

    assert!(!layout.books("base").exists());
    assert!(layout.lookup_table("base").is_file());
}

#[test]
fn test_unknown_mode_fails() {
    let config = small_game();
    let dir = tempfile::tempdir().unwrap();
    let result = BatchRunner::new(&config, OutputLayout::new(dir.path()))
        .with_settings(SimSettings::default().with_threads(1))
        .run(&[("bonus".to_string(), 10)]);
    assert!(result.is_err());
}

// ═══════════════════════════════════════════════════════════════════════════════
// PUBLISH
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_publish_accepts_reweighted_table_only() {
    let config = small_game();
    let dir = tempfile::tempdir().unwrap();
    run_into(&config, dir.path(), 1, 100, 12);
    let layout = OutputLayout::new(dir.path());

    let mut table = lookup::read_lookup(layout.lookup_table("base")).unwrap();
    for (i, row) in table.iter_mut().enumerate() {
        row.weight = 1_000 + i as u64;
    }
    let adjusted = dir.path().join("adjusted.csv");
    lookup::write_table(&adjusted, &table).unwrap();

    let published = output::publish_lookup(&layout, "base", &adjusted).unwrap();
    assert_eq!(published, layout.published_table("base"));
    assert_eq!(lookup::read_lookup(&published).unwrap(), table);

    table[3].payout += 1;
    lookup::write_table(&adjusted, &table).unwrap();
    assert!(output::publish_lookup(&layout, "base", &adjusted).is_err());
}
