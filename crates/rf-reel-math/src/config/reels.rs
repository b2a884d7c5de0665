//! Reel strips and reel-strip CSV files

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};

/// A virtual reel strip: symbol names in stop order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReelStrip {
    pub symbols: Vec<String>,
}

impl ReelStrip {
    pub fn new(symbols: Vec<String>) -> Self {
        Self { symbols }
    }

    /// Symbol at a stop offset, wrapping in both directions
    pub fn symbol_at(&self, position: isize) -> &str {
        let len = self.symbols.len() as isize;
        &self.symbols[position.rem_euclid(len) as usize]
    }

    /// Normalize a possibly negative offset into `0..len`
    pub fn wrap(&self, position: isize) -> usize {
        position.rem_euclid(self.symbols.len() as isize) as usize
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Stop offsets holding a symbol matching the predicate
    pub fn stops_where(&self, mut matches: impl FnMut(&str) -> bool) -> Vec<usize> {
        self.symbols
            .iter()
            .enumerate()
            .filter(|(_, name)| matches(name))
            .map(|(stop, _)| stop)
            .collect()
    }
}

/// Parse a reel-strip CSV: one line per stop, one column per reel
///
/// Cells are trimmed and may be quoted, so spreadsheet exports load
/// unchanged. Every line must have the same column count and no cell may be
/// empty.
pub fn parse_reels_csv<R: Read>(source: R) -> ReelResult<Vec<ReelStrip>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(source);
    let mut strips: Vec<ReelStrip> = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| ReelError::Csv {
            line: e.position().map_or(index + 1, |p| p.line() as usize),
            message: e.to_string(),
        })?;
        let line = record.position().map_or(index + 1, |p| p.line() as usize);

        if strips.is_empty() {
            strips = vec![ReelStrip::new(Vec::new()); record.len()];
        } else if record.len() != strips.len() {
            return Err(ReelError::Csv {
                line,
                message: format!("expected {} columns, found {}", strips.len(), record.len()),
            });
        }

        for (reel, cell) in record.iter().enumerate() {
            if cell.is_empty() {
                return Err(ReelError::Csv {
                    line,
                    message: format!("empty symbol on reel {}", reel),
                });
            }
            strips[reel].symbols.push(cell.to_string());
        }
    }

    if strips.is_empty() {
        return Err(ReelError::Csv {
            line: 0,
            message: "reel file is empty".into(),
        });
    }

    Ok(strips)
}

/// Read and parse a reel-strip CSV file
pub fn read_reels_csv(path: impl AsRef<Path>) -> ReelResult<Vec<ReelStrip>> {
    parse_reels_csv(File::open(path.as_ref())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reel_strip_wrap() {
        let strip = ReelStrip::new(vec!["A".into(), "B".into(), "C".into()]);
        assert_eq!(strip.symbol_at(0), "A");
        assert_eq!(strip.symbol_at(3), "A");
        assert_eq!(strip.symbol_at(-1), "C");
        assert_eq!(strip.wrap(-4), 2);
    }

    #[test]
    fn test_parse_csv_columns_are_reels() {
        let csv = "H1,L1,S\nL2,W,H1\n\"L3\", L4 ,L1\n";
        let strips = parse_reels_csv(csv.as_bytes()).unwrap();
        assert_eq!(strips.len(), 3);
        assert_eq!(strips[0].symbols, vec!["H1", "L2", "L3"]);
        assert_eq!(strips[1].symbols, vec!["L1", "W", "L4"]);
        assert_eq!(strips[2].symbols, vec!["S", "H1", "L1"]);
    }

    #[test]
    fn test_parse_csv_ragged_line() {
        let err = parse_reels_csv("H1,L1\n\nL2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ReelError::Csv { line: 3, .. }));
    }

    #[test]
    fn test_parse_csv_empty_cell() {
        let err = parse_reels_csv("H1,,L1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ReelError::Csv { line: 1, .. }));
    }

    #[test]
    fn test_stops_where() {
        let strip = ReelStrip::new(vec!["S".into(), "L1".into(), "S".into()]);
        assert_eq!(strip.stops_where(|s| s == "S"), vec![0, 2]);
    }
}
