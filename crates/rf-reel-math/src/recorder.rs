//! Force records: which trials produced which notable events
//!
//! Descriptions recorded during a trial are buffered and only imprinted once
//! the trial is accepted, so rejected attempts never leave a trace.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Sorted key/value description of a notable event
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ForceDescription(BTreeMap<String, String>);

impl ForceDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Display) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Aggregated occurrences of one description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceRecord {
    pub times_triggered: u64,
    pub book_ids: Vec<u64>,
}

/// One `{name, value}` pair of a serialized description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTerm {
    pub name: String,
    pub value: String,
}

/// Serialized form of one aggregated description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceEntry {
    pub search: Vec<SearchTerm>,
    pub times_triggered: u64,
    pub book_ids: Vec<u64>,
}

/// Force-record aggregation for one worker
#[derive(Debug, Clone, Default)]
pub struct ForceRecorder {
    records: BTreeMap<ForceDescription, ForceRecord>,
    pending: Vec<ForceDescription>,
}

impl ForceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a description for the trial in progress
    pub fn record(&mut self, description: ForceDescription) {
        self.pending.push(description);
    }

    /// Drop the buffer of a rejected attempt
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Move buffered descriptions into the aggregate under `book_id`
    ///
    /// A description counts once per book no matter how often it fired.
    pub fn imprint(&mut self, book_id: u64) {
        for description in self.pending.drain(..) {
            let entry = self.records.entry(description).or_insert_with(|| ForceRecord {
                times_triggered: 0,
                book_ids: Vec::new(),
            });
            if !entry.book_ids.contains(&book_id) {
                entry.times_triggered += 1;
                entry.book_ids.push(book_id);
            }
        }
    }

    /// Fold another worker's aggregate into this one
    pub fn merge(&mut self, other: ForceRecorder) {
        for (description, record) in other.records {
            match self.records.get_mut(&description) {
                Some(existing) => {
                    existing.times_triggered += record.times_triggered;
                    existing.book_ids.extend(record.book_ids);
                }
                None => {
                    self.records.insert(description, record);
                }
            }
        }
    }

    /// Rebuild an aggregate from its serialized entries
    pub fn from_entries(entries: Vec<ForceEntry>) -> Self {
        let mut recorder = Self::new();
        for entry in entries {
            let description = ForceDescription(
                entry
                    .search
                    .into_iter()
                    .map(|term| (term.name, term.value))
                    .collect(),
            );
            let mut single = Self::new();
            single.records.insert(
                description,
                ForceRecord {
                    times_triggered: entry.times_triggered,
                    book_ids: entry.book_ids,
                },
            );
            recorder.merge(single);
        }
        recorder
    }

    /// Entries in description order
    pub fn to_entries(&self) -> Vec<ForceEntry> {
        self.records
            .iter()
            .map(|(description, record)| ForceEntry {
                search: description
                    .entries()
                    .map(|(name, value)| SearchTerm {
                        name: name.to_string(),
                        value: value.to_string(),
                    })
                    .collect(),
                times_triggered: record.times_triggered,
                book_ids: record.book_ids.clone(),
            })
            .collect()
    }

    pub fn records(&self) -> &BTreeMap<ForceDescription, ForceRecord> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct values per description key
    pub fn key_values(&self) -> BTreeMap<String, Vec<String>> {
        let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for description in self.records.keys() {
            for (key, value) in description.entries() {
                let values = out.entry(key.to_string()).or_default();
                if !values.iter().any(|v| v == value) {
                    values.push(value.to_string());
                }
            }
        }
        for values in out.values_mut() {
            values.sort();
        }
        out
    }
}
