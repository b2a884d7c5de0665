//! Paytable: `(kind, symbol) → payout` in bet multiples

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};

/// One paytable line as written in a game file
///
/// Either `kind` (an exact match size) or `range` (an inclusive size
/// interval, typical for cluster and scatter pays) must be given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayEntry {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<[usize; 2]>,
    pub pay: f64,
}

impl PayEntry {
    pub fn exact(symbol: impl Into<String>, kind: usize, pay: f64) -> Self {
        Self {
            symbol: symbol.into(),
            kind: Some(kind),
            range: None,
            pay,
        }
    }

    pub fn range(symbol: impl Into<String>, min: usize, max: usize, pay: f64) -> Self {
        Self {
            symbol: symbol.into(),
            kind: None,
            range: Some([min, max]),
            pay,
        }
    }
}

/// Expanded paytable keyed by symbol, then by match size
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paytable {
    pays: BTreeMap<String, BTreeMap<usize, f64>>,
}

impl Paytable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand game-file entries, rejecting sizes declared twice for one symbol
    pub fn from_entries(entries: &[PayEntry]) -> ReelResult<Self> {
        let mut table = Self::new();
        for entry in entries {
            let (min, max) = match (entry.kind, entry.range) {
                (Some(kind), None) => (kind, kind),
                (None, Some([min, max])) if min <= max => (min, max),
                (None, Some([min, max])) => {
                    return Err(ReelError::InvalidConfig(format!(
                        "pay range {}..={} for '{}' is empty",
                        min, max, entry.symbol
                    )));
                }
                _ => {
                    return Err(ReelError::InvalidConfig(format!(
                        "pay entry for '{}' needs exactly one of kind or range",
                        entry.symbol
                    )));
                }
            };
            if min == 0 {
                return Err(ReelError::InvalidConfig(format!(
                    "pay entry for '{}' has a zero match size",
                    entry.symbol
                )));
            }
            if !entry.pay.is_finite() || entry.pay < 0.0 {
                return Err(ReelError::InvalidConfig(format!(
                    "pay for '{}' must be a non-negative number",
                    entry.symbol
                )));
            }
            for kind in min..=max {
                if table.get(kind, &entry.symbol).is_some() {
                    return Err(ReelError::InvalidConfig(format!(
                        "overlapping pay entries for ({}, '{}')",
                        kind, entry.symbol
                    )));
                }
                table.insert(kind, &entry.symbol, entry.pay);
            }
        }
        Ok(table)
    }

    /// Insert or replace a single entry
    pub fn insert(&mut self, kind: usize, symbol: &str, pay: f64) {
        self.pays
            .entry(symbol.to_string())
            .or_default()
            .insert(kind, pay);
    }

    /// Builder-style insert
    pub fn with(mut self, kind: usize, symbol: &str, pay: f64) -> Self {
        self.insert(kind, symbol, pay);
        self
    }

    /// Payout for an exact `(kind, symbol)` pair
    pub fn get(&self, kind: usize, symbol: &str) -> Option<f64> {
        self.pays.get(symbol).and_then(|kinds| kinds.get(&kind)).copied()
    }

    /// Payout or zero when the pair is not declared
    pub fn pay(&self, kind: usize, symbol: &str) -> f64 {
        self.get(kind, symbol).unwrap_or(0.0)
    }

    /// Smallest paying size for a symbol
    pub fn min_kind(&self, symbol: &str) -> Option<usize> {
        self.pays
            .get(symbol)
            .and_then(|kinds| kinds.keys().next())
            .copied()
    }

    /// All sizes declared for a symbol
    pub fn kinds(&self, symbol: &str) -> BTreeMap<usize, f64> {
        self.pays.get(symbol).cloned().unwrap_or_default()
    }

    /// Paying symbol names in sorted order
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.pays.keys().map(String::as_str)
    }

    pub fn contains_symbol(&self, symbol: &str) -> bool {
        self.pays.contains_key(symbol)
    }

    /// Flattened `(kind, symbol, pay)` triples
    pub fn entries(&self) -> impl Iterator<Item = (usize, &str, f64)> {
        self.pays.iter().flat_map(|(symbol, kinds)| {
            kinds
                .iter()
                .map(move |(&kind, &pay)| (kind, symbol.as_str(), pay))
        })
    }

    pub fn len(&self) -> usize {
        self.pays.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pays.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_expansion() {
        let table = Paytable::from_entries(&[
            PayEntry::range("H1", 5, 6, 1.0),
            PayEntry::range("H1", 7, 8, 2.5),
            PayEntry::exact("W", 3, 80.0),
        ])
        .unwrap();

        assert_eq!(table.get(5, "H1"), Some(1.0));
        assert_eq!(table.get(6, "H1"), Some(1.0));
        assert_eq!(table.get(8, "H1"), Some(2.5));
        assert_eq!(table.get(9, "H1"), None);
        assert_eq!(table.min_kind("H1"), Some(5));
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_overlap_rejected() {
        let result = Paytable::from_entries(&[
            PayEntry::range("L1", 5, 8, 0.1),
            PayEntry::range("L1", 8, 9, 0.2),
        ]);
        assert!(matches!(result, Err(ReelError::InvalidConfig(_))));
    }

    #[test]
    fn test_entry_needs_kind_or_range() {
        let entry = PayEntry {
            symbol: "H1".into(),
            kind: Some(3),
            range: Some([3, 4]),
            pay: 1.0,
        };
        assert!(Paytable::from_entries(&[entry]).is_err());
    }

    #[test]
    fn test_pay_defaults_to_zero() {
        let table = Paytable::new().with(3, "H1", 5.0);
        assert_eq!(table.pay(3, "H1"), 5.0);
        assert_eq!(table.pay(4, "H1"), 0.0);
        assert_eq!(table.pay(3, "H2"), 0.0);
    }
}
