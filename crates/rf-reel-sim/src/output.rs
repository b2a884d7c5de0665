//! Output artifacts
//!
//! ```text
//! <out>/
//!   books/books_<mode>.jsonl
//!   lookup/lookUpTable_<mode>.csv
//!   lookup/lookUpTableSegmented_<mode>.csv
//!   force/force_record_<mode>.json
//!   force/force.json
//!   publish/lookUpTable_<mode>_0.csv
//!   temp/                     per-shard fragments, removed after the merge
//! ```
//!
//! Each worker writes only its own fragments. The merge is the single reader
//! of all fragments and the single writer of the final files.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rf_reel_math::{ForceEntry, ForceRecorder};

use crate::error::{SimError, SimResult};
use crate::lookup::{self, LookupRow, SegmentedRow};
use crate::shard::{ShardOutput, ShardPlan};

/// Paths of every artifact under one output directory
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn books_dir(&self) -> PathBuf {
        self.root.join("books")
    }

    pub fn lookup_dir(&self) -> PathBuf {
        self.root.join("lookup")
    }

    pub fn force_dir(&self) -> PathBuf {
        self.root.join("force")
    }

    pub fn publish_dir(&self) -> PathBuf {
        self.root.join("publish")
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.join("temp")
    }

    pub fn create_dirs(&self) -> SimResult<()> {
        for dir in [
            self.books_dir(),
            self.lookup_dir(),
            self.force_dir(),
            self.temp_dir(),
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn books(&self, mode: &str) -> PathBuf {
        self.books_dir().join(format!("books_{}.jsonl", mode))
    }

    pub fn lookup_table(&self, mode: &str) -> PathBuf {
        self.lookup_dir().join(format!("lookUpTable_{}.csv", mode))
    }

    pub fn segmented_table(&self, mode: &str) -> PathBuf {
        self.lookup_dir().join(format!("lookUpTableSegmented_{}.csv", mode))
    }

    pub fn force_record(&self, mode: &str) -> PathBuf {
        self.force_dir().join(format!("force_record_{}.json", mode))
    }

    pub fn force_options(&self) -> PathBuf {
        self.force_dir().join("force.json")
    }

    pub fn published_table(&self, mode: &str) -> PathBuf {
        self.publish_dir().join(format!("lookUpTable_{}_0.csv", mode))
    }

    fn fragment(&self, kind: &str, mode: &str, shard: usize, ext: &str) -> PathBuf {
        self.temp_dir()
            .join(format!("{}_{}_{}.{}", kind, mode, shard, ext))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARD FRAGMENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Write one worker's fragments
pub fn write_fragments(
    layout: &OutputLayout,
    mode: &str,
    wincap: f64,
    shard: &ShardOutput,
    write_books: bool,
) -> SimResult<()> {
    let index = shard.index;
    let lookup_rows: Vec<LookupRow> = shard.books.iter().map(LookupRow::from_book).collect();
    lookup::write_table(layout.fragment("lookup", mode, index, "csv"), &lookup_rows)?;
    let segmented_rows: Vec<SegmentedRow> = shard
        .books
        .iter()
        .map(|b| SegmentedRow::from_book(b, wincap))
        .collect();
    lookup::write_table(layout.fragment("segmented", mode, index, "csv"), &segmented_rows)?;
    fs::write(
        layout.fragment("force", mode, index, "json"),
        serde_json::to_string(&shard.recorder.to_entries())?,
    )?;

    if write_books {
        let mut out = BufWriter::new(File::create(layout.fragment("books", mode, index, "jsonl"))?);
        for book in &shard.books {
            writeln!(out, "{}", book.to_json_line()?)?;
        }
        out.flush()?;
    }
    Ok(())
}

/// What the merge wrote for one mode
#[derive(Debug, Clone)]
pub struct MergedMode {
    pub trials: usize,
    pub recorder: ForceRecorder,
}

/// Concatenate fragments in shard order, merge force records, drop fragments
pub fn merge_fragments(
    layout: &OutputLayout,
    mode: &str,
    shards: &[ShardPlan],
    write_books: bool,
) -> SimResult<MergedMode> {
    let mut lookup_out = BufWriter::new(File::create(layout.lookup_table(mode))?);
    let mut segmented_out = BufWriter::new(File::create(layout.segmented_table(mode))?);
    let mut books_out = if write_books {
        Some(BufWriter::new(File::create(layout.books(mode))?))
    } else {
        None
    };
    let mut recorder = ForceRecorder::new();
    let mut trials = 0;

    for shard in shards {
        let lookup_path = layout.fragment("lookup", mode, shard.index, "csv");
        let text = fs::read_to_string(&lookup_path)?;
        let rows = lookup::parse_lookup(&text)?.len();
        if rows != shard.len() {
            return Err(SimError::ShardMismatch {
                shard: shard.index,
                expected: shard.len(),
                actual: rows,
            });
        }
        lookup_out.write_all(text.as_bytes())?;
        trials += rows;

        let segmented_path = layout.fragment("segmented", mode, shard.index, "csv");
        segmented_out.write_all(fs::read_to_string(&segmented_path)?.as_bytes())?;

        let force_path = layout.fragment("force", mode, shard.index, "json");
        let entries: Vec<ForceEntry> = serde_json::from_str(&fs::read_to_string(&force_path)?)?;
        recorder.merge(ForceRecorder::from_entries(entries));

        let mut fragments = vec![lookup_path, segmented_path, force_path];
        if let Some(out) = books_out.as_mut() {
            let books_path = layout.fragment("books", mode, shard.index, "jsonl");
            out.write_all(fs::read_to_string(&books_path)?.as_bytes())?;
            fragments.push(books_path);
        }
        for path in fragments {
            fs::remove_file(path)?;
        }
    }

    lookup_out.flush()?;
    segmented_out.flush()?;
    if let Some(mut out) = books_out {
        out.flush()?;
    }

    if recorder.is_empty() {
        log::warn!("No force records for mode '{}'", mode);
    }
    fs::write(
        layout.force_record(mode),
        serde_json::to_string_pretty(&recorder.to_entries())?,
    )?;

    Ok(MergedMode { trials, recorder })
}

/// Add a mode's distinct description values to `force.json`, keeping other modes
pub fn update_force_options(
    layout: &OutputLayout,
    mode: &str,
    recorder: &ForceRecorder,
) -> SimResult<()> {
    let path = layout.force_options();
    let mut options: BTreeMap<String, BTreeMap<String, Vec<String>>> = match fs::read_to_string(&path) {
        Ok(text) if !text.trim().is_empty() => serde_json::from_str(&text)?,
        Ok(_) => BTreeMap::new(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(e) => return Err(e.into()),
    };
    options.insert(mode.to_string(), recorder.key_values());
    fs::write(&path, serde_json::to_string_pretty(&options)?)?;
    Ok(())
}

/// Remove the temp directory once it holds nothing
pub fn cleanup_temp(layout: &OutputLayout) -> SimResult<()> {
    let temp = layout.temp_dir();
    if temp.is_dir() && fs::read_dir(&temp)?.next().is_none() {
        fs::remove_dir(temp)?;
    }
    Ok(())
}

/// Validate an optimizer-adjusted table and publish it
pub fn publish_lookup(layout: &OutputLayout, mode: &str, adjusted: &Path) -> SimResult<PathBuf> {
    let generated = lookup::read_lookup(layout.lookup_table(mode))?;
    let table = lookup::read_lookup(adjusted)?;
    lookup::verify_adjusted(&generated, &table)?;

    fs::create_dir_all(layout.publish_dir())?;
    let target = layout.published_table(mode);
    lookup::write_table(&target, &table)?;
    log::info!("Published {} ({} rows)", target.display(), table.len());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = OutputLayout::new("/tmp/game");
        assert_eq!(
            layout.lookup_table("base"),
            Path::new("/tmp/game/lookup/lookUpTable_base.csv")
        );
        assert_eq!(
            layout.published_table("bonus"),
            Path::new("/tmp/game/publish/lookUpTable_bonus_0.csv")
        );
        assert_eq!(
            layout.force_record("base"),
            Path::new("/tmp/game/force/force_record_base.json")
        );
    }

    #[test]
    fn test_force_options_keep_other_modes() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        layout.create_dirs().unwrap();

        let mut recorder = ForceRecorder::new();
        recorder.record(rf_reel_math::ForceDescription::new().with("kind", 3));
        recorder.imprint(1);
        update_force_options(&layout, "base", &recorder).unwrap();
        update_force_options(&layout, "bonus", &ForceRecorder::new()).unwrap();

        let text = fs::read_to_string(layout.force_options()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["base"]["kind"][0], "3");
        assert!(json["bonus"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_merge_detects_short_shard() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        layout.create_dirs().unwrap();
        fs::write(layout.fragment("lookup", "base", 0, "csv"), "1,1,0\n").unwrap();
        fs::write(layout.fragment("segmented", "base", 0, "csv"), "1,0,0,0\n").unwrap();
        fs::write(layout.fragment("force", "base", 0, "json"), "[]").unwrap();

        let shards = vec![ShardPlan { index: 0, range: 0..2 }];
        match merge_fragments(&layout, "base", &shards, false) {
            Err(SimError::ShardMismatch { expected, actual, .. }) => {
                assert_eq!((expected, actual), (2, 1));
            }
            other => panic!("expected shard mismatch, got {:?}", other.map(|m| m.trials)),
        }
    }
}
