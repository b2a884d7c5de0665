//! Client event stream
//!
//! Every step of a trial that a client must replay is appended to the book as
//! an [`Event`]. Amounts are integer cents of the bet, capped at the win cap.
//! When the game reads padding cells, row indices are shifted down by one so
//! they address the padded board the client renders.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Position};
use crate::config::GameType;
use crate::symbols::Symbol;
use crate::wins::{WinData, WinRecord};

/// Bet multiple as integer cents, capped
pub fn cents(amount: f64, cap: f64) -> u64 {
    (amount.min(cap) * 100.0).round().max(0.0) as u64
}

/// Client view of one cell
///
/// Multiplier and prize roles show their current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolView {
    pub name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub wild: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub scatter: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize: Option<u32>,
}

impl From<&Symbol> for SymbolView {
    fn from(symbol: &Symbol) -> Self {
        Self {
            name: symbol.name().to_string(),
            wild: symbol.is_wild(),
            scatter: symbol.is_scatter(),
            multiplier: symbol.multiplier(),
            prize: symbol.prize(),
        }
    }
}

/// Win record in client units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinView {
    pub symbol: String,
    pub kind: usize,
    pub win: u64,
    pub positions: Vec<Position>,
    pub meta: WinMetaView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinMetaView {
    pub global_mult: f64,
    pub multiplier: f64,
    pub win_without_mult: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ways: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<Position>,
}

/// One board multiplier cell shown on settle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierCell {
    pub reel: usize,
    pub row: usize,
    pub multiplier: u32,
}

/// Spin win before and after the board multiplier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardMultiplierWin {
    pub tumble_win: u64,
    pub board_mult: u32,
    pub total_win: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EventKind {
    Reveal {
        board: Vec<Vec<SymbolView>>,
        padding_positions: Vec<usize>,
        game_type: GameType,
        anticipation: Vec<u32>,
    },
    WinInfo {
        total_win: u64,
        wins: Vec<WinView>,
    },
    TumbleBoard {
        new_symbols: Vec<Vec<SymbolView>>,
        exploding_symbols: Vec<Position>,
    },
    SetTumbleWin {
        amount: u64,
    },
    UpdateTumbleWin {
        amount: u64,
    },
    SetWin {
        amount: u64,
        win_level: u32,
    },
    SetTotalWin {
        amount: u64,
    },
    Wincap {
        amount: u64,
    },
    FreeSpinTrigger {
        total_fs: u32,
        positions: Vec<Position>,
    },
    FreeSpinRetrigger {
        total_fs: u32,
        positions: Vec<Position>,
    },
    UpdateFreeSpin {
        amount: u32,
        total: u32,
    },
    FreeSpinEnd {
        amount: u64,
        win_level: u32,
    },
    UpdateGlobalMult {
        global_mult: u32,
    },
    UpdateGridMultipliers {
        grid_multipliers: Vec<Vec<u32>>,
    },
    BoardMultiplierInfo {
        mult_info: Vec<MultiplierCell>,
        win_info: BoardMultiplierWin,
    },
    FinalWin {
        amount: u64,
    },
}

impl EventKind {
    /// Wire name of the event type
    pub fn type_name(&self) -> &'static str {
        match self {
            EventKind::Reveal { .. } => "reveal",
            EventKind::WinInfo { .. } => "winInfo",
            EventKind::TumbleBoard { .. } => "tumbleBoard",
            EventKind::SetTumbleWin { .. } => "setTumbleWin",
            EventKind::UpdateTumbleWin { .. } => "updateTumbleWin",
            EventKind::SetWin { .. } => "setWin",
            EventKind::SetTotalWin { .. } => "setTotalWin",
            EventKind::Wincap { .. } => "wincap",
            EventKind::FreeSpinTrigger { .. } => "freeSpinTrigger",
            EventKind::FreeSpinRetrigger { .. } => "freeSpinRetrigger",
            EventKind::UpdateFreeSpin { .. } => "updateFreeSpin",
            EventKind::FreeSpinEnd { .. } => "freeSpinEnd",
            EventKind::UpdateGlobalMult { .. } => "updateGlobalMult",
            EventKind::UpdateGridMultipliers { .. } => "updateGridMultipliers",
            EventKind::BoardMultiplierInfo { .. } => "boardMultiplierInfo",
            EventKind::FinalWin { .. } => "finalWin",
        }
    }
}

/// Indexed event as stored in a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub index: usize,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Shared conversion settings for one game and bet mode
#[derive(Debug, Clone, Copy)]
pub struct EventFormat {
    pub padding: bool,
    pub wincap: f64,
}

impl EventFormat {
    pub fn position(&self, pos: Position) -> Position {
        if self.padding {
            Position::new(pos.reel, pos.row + 1)
        } else {
            pos
        }
    }

    pub fn positions(&self, positions: &[Position]) -> Vec<Position> {
        positions.iter().map(|p| self.position(*p)).collect()
    }

    pub fn cents(&self, amount: f64) -> u64 {
        cents(amount, self.wincap)
    }

    pub fn reveal(&self, board: &Board, game_type: GameType) -> EventKind {
        let view = board
            .reels
            .iter()
            .enumerate()
            .map(|(reel, column)| {
                let mut cells: Vec<SymbolView> = Vec::with_capacity(column.len() + 2);
                if let Some(top) = board.top_padding.get(reel) {
                    cells.push(top.into());
                }
                cells.extend(column.iter().map(SymbolView::from));
                if let Some(bottom) = board.bottom_padding.get(reel) {
                    cells.push(bottom.into());
                }
                cells
            })
            .collect();

        EventKind::Reveal {
            board: view,
            padding_positions: board.stops.clone(),
            game_type,
            anticipation: board.anticipation.clone(),
        }
    }

    pub fn win_info(&self, data: &WinData) -> EventKind {
        EventKind::WinInfo {
            total_win: self.cents(data.total_win),
            wins: data.wins.iter().map(|w| self.win_view(w)).collect(),
        }
    }

    fn win_view(&self, record: &WinRecord) -> WinView {
        WinView {
            symbol: record.symbol.clone(),
            kind: record.kind,
            win: self.cents(record.win),
            positions: self.positions(&record.positions),
            meta: WinMetaView {
                global_mult: record.meta.global_mult,
                multiplier: record.meta.multiplier,
                win_without_mult: self.cents(record.meta.win_without_mult),
                line_index: record.meta.line_index,
                ways: record.meta.ways,
                overlay: record.meta.overlay.map(|p| self.position(p)),
            },
        }
    }

    pub fn tumble_board(&self, exploded: &[Position], new_symbols: &[Vec<Symbol>]) -> EventKind {
        let mut exploding = self.positions(exploded);
        exploding.sort_by_key(|p| p.reel);
        EventKind::TumbleBoard {
            new_symbols: new_symbols
                .iter()
                .map(|column| column.iter().map(SymbolView::from).collect())
                .collect(),
            exploding_symbols: exploding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let event = Event {
            index: 3,
            kind: EventKind::SetWin {
                amount: 250,
                win_level: 4,
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["index"], 3);
        assert_eq!(json["type"], "setWin");
        assert_eq!(json["amount"], 250);
        assert_eq!(json["winLevel"], 4);

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_type_names_match_serialization() {
        let kinds = [
            EventKind::Wincap { amount: 1 },
            EventKind::UpdateFreeSpin { amount: 1, total: 10 },
            EventKind::UpdateGlobalMult { global_mult: 2 },
            EventKind::FreeSpinTrigger {
                total_fs: 10,
                positions: vec![],
            },
        ];
        for kind in kinds {
            let json = serde_json::to_value(&kind).unwrap();
            assert_eq!(json["type"], kind.type_name());
        }
    }

    #[test]
    fn test_cents_capped() {
        assert_eq!(cents(1.234, 100.0), 123);
        assert_eq!(cents(250.0, 100.0), 10_000);
        assert_eq!(cents(0.0, 100.0), 0);
    }

    #[test]
    fn test_padding_shifts_rows() {
        let fmt = EventFormat {
            padding: true,
            wincap: 100.0,
        };
        assert_eq!(fmt.position(Position::new(2, 0)), Position::new(2, 1));
        let fmt = EventFormat {
            padding: false,
            wincap: 100.0,
        };
        assert_eq!(fmt.position(Position::new(2, 0)), Position::new(2, 0));
    }

    #[test]
    fn test_symbol_view_skips_absent_flags() {
        let view = SymbolView {
            name: "H1".into(),
            wild: false,
            scatter: false,
            multiplier: None,
            prize: None,
        };
        assert_eq!(serde_json::to_string(&view).unwrap(), r#"{"name":"H1"}"#);
    }
}
