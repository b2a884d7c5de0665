//! Per-trial result record

use serde::{Deserialize, Serialize};

use crate::events::{Event, EventKind};

/// Everything a client needs to replay one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: u64,
    /// Final payout in bet cents
    pub payout_multiplier: u64,
    pub events: Vec<Event>,
    pub criteria: String,
    pub base_game_wins: f64,
    pub free_game_wins: f64,
}

impl Book {
    pub fn new(id: u64, criteria: impl Into<String>) -> Self {
        Self {
            id,
            payout_multiplier: 0,
            events: Vec::new(),
            criteria: criteria.into(),
            base_game_wins: 0.0,
            free_game_wins: 0.0,
        }
    }

    /// Append an event, assigning the next index
    pub fn add_event(&mut self, kind: EventKind) -> usize {
        let index = self.events.len();
        self.events.push(Event { index, kind });
        index
    }

    pub fn events_of<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events
            .iter()
            .filter(move |e| e.kind.type_name() == type_name)
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
