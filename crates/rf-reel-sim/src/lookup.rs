//! Lookup tables: one line per trial, exchanged with the weight optimizer

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use rf_reel_math::Book;
use rf_reel_math::events::cents;

use crate::error::{SimError, SimResult};

/// `id,weight,payout_cents`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRow {
    pub id: u64,
    pub weight: u64,
    pub payout: u64,
}

impl LookupRow {
    pub const COLUMNS: usize = 3;

    pub fn from_book(book: &Book) -> Self {
        Self {
            id: book.id,
            weight: 1,
            payout: book.payout_multiplier,
        }
    }
}

/// `id,criteria,base_cents,free_cents`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentedRow {
    pub id: u64,
    pub criteria: String,
    pub base: u64,
    pub free: u64,
}

impl SegmentedRow {
    pub const COLUMNS: usize = 4;

    pub fn from_book(book: &Book, wincap: f64) -> Self {
        Self {
            id: book.id,
            criteria: book.criteria.clone(),
            base: cents(book.base_game_wins, wincap),
            free: cents(book.free_game_wins, wincap),
        }
    }
}

fn lookup_error(line: usize, message: impl Into<String>) -> SimError {
    SimError::Lookup {
        line,
        message: message.into(),
    }
}

fn record_line(record: &StringRecord, fallback: usize) -> usize {
    record.position().map_or(fallback, |p| p.line() as usize)
}

/// Headerless rows with a fixed column count; blank lines are skipped
fn parse_rows<T: DeserializeOwned, R: Read>(source: R, columns: usize) -> SimResult<Vec<T>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(source);

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            let line = e.position().map_or(index + 1, |p| p.line() as usize);
            lookup_error(line, e.to_string())
        })?;
        let line = record_line(&record, index + 1);
        if record.len() != columns {
            return Err(lookup_error(
                line,
                format!("expected {} columns, found {}", columns, record.len()),
            ));
        }
        rows.push(
            record
                .deserialize(None)
                .map_err(|e| lookup_error(line, e.to_string()))?,
        );
    }
    Ok(rows)
}

pub fn parse_lookup(text: &str) -> SimResult<Vec<LookupRow>> {
    parse_rows(text.as_bytes(), LookupRow::COLUMNS)
}

pub fn parse_segmented(text: &str) -> SimResult<Vec<SegmentedRow>> {
    parse_rows(text.as_bytes(), SegmentedRow::COLUMNS)
}

pub fn read_lookup(path: impl AsRef<Path>) -> SimResult<Vec<LookupRow>> {
    parse_rows(File::open(path)?, LookupRow::COLUMNS)
}

pub fn read_segmented(path: impl AsRef<Path>) -> SimResult<Vec<SegmentedRow>> {
    parse_rows(File::open(path)?, SegmentedRow::COLUMNS)
}

/// Write headerless rows, one record per line
pub fn write_rows<'a, T, W>(writer: W, rows: impl IntoIterator<Item = &'a T>) -> SimResult<()>
where
    T: Serialize + 'a,
    W: Write,
{
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_table<'a, T: Serialize + 'a>(
    path: impl AsRef<Path>,
    rows: impl IntoIterator<Item = &'a T>,
) -> SimResult<()> {
    write_rows(File::create(path)?, rows)
}

/// Check an optimizer-adjusted table against the generated one
///
/// Ids and payouts must match line for line; only weights may change.
pub fn verify_adjusted(generated: &[LookupRow], adjusted: &[LookupRow]) -> SimResult<()> {
    if generated.len() != adjusted.len() {
        return Err(lookup_error(
            adjusted.len().min(generated.len()) + 1,
            format!(
                "adjusted table has {} rows, generated has {}",
                adjusted.len(),
                generated.len()
            ),
        ));
    }
    for (i, (g, a)) in generated.iter().zip(adjusted).enumerate() {
        if g.id != a.id || g.payout != a.payout {
            return Err(lookup_error(
                i + 1,
                format!(
                    "expected id {} payout {}, found id {} payout {}",
                    g.id, g.payout, a.id, a.payout
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lookup() {
        let rows = parse_lookup("1,1,0\n2,1,150\n\n3,7,2000\n").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], LookupRow { id: 3, weight: 7, payout: 2000 });
        let mut out = Vec::new();
        write_rows(&mut out, &rows).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1,1,0\n2,1,150\n3,7,2000\n");
    }

    #[test]
    fn test_parse_errors_name_the_line() {
        match parse_lookup("1,1,0\n2,x,5\n") {
            Err(SimError::Lookup { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected lookup error, got {:?}", other),
        }
        match parse_lookup("1,1,0\n\n3,1,0,9\n") {
            Err(SimError::Lookup { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected lookup error, got {:?}", other),
        }
    }

    #[test]
    fn test_segmented_line() {
        let row = SegmentedRow {
            id: 4,
            criteria: "freegame".into(),
            base: 0,
            free: 1250,
        };
        let mut out = Vec::new();
        write_rows(&mut out, [&row]).unwrap();
        assert_eq!(out, b"4,freegame,0,1250\n");
        let parsed = parse_segmented(" 4, freegame ,0,1250\n").unwrap();
        assert_eq!(parsed, vec![row]);
    }

    #[test]
    fn test_verify_adjusted() {
        let generated = parse_lookup("1,1,0\n2,1,150\n").unwrap();
        let reweighted = parse_lookup("1,900,0\n2,13,150\n").unwrap();
        assert!(verify_adjusted(&generated, &reweighted).is_ok());

        let changed = parse_lookup("1,900,0\n2,13,151\n").unwrap();
        assert!(verify_adjusted(&generated, &changed).is_err());
        assert!(verify_adjusted(&generated, &reweighted[..1]).is_err());
    }
}
