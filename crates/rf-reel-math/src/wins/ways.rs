//! Ways evaluation

use crate::board::{Board, Position};
use crate::config::GameType;
use crate::recorder::ForceDescription;

use super::{EvalContext, WaysMultiplier, WinData, WinEvaluator, WinMeta, WinRecord, round2};

/// Combinations of a symbol on adjacent reels from the leftmost
#[derive(Debug, Clone)]
pub struct WaysEvaluator {
    multiplier: WaysMultiplier,
}

struct SymbolWays {
    kind: usize,
    ways: u64,
    board_pool: u32,
    positions: Vec<Position>,
}

impl WaysEvaluator {
    pub fn new(multiplier: WaysMultiplier) -> Self {
        Self { multiplier }
    }

    fn count_ways(&self, board: &Board, name: &str) -> SymbolWays {
        let mut result = SymbolWays {
            kind: 0,
            ways: 1,
            board_pool: 0,
            positions: Vec::new(),
        };

        for (reel, column) in board.reels.iter().enumerate() {
            let hits: Vec<usize> = (0..column.len())
                .filter(|&row| column[row].name() == name || column[row].is_wild())
                .collect();
            if hits.is_empty() {
                break;
            }
            result.kind += 1;

            let mut count: u64 = 0;
            for &row in &hits {
                let symbol = &column[row];
                let mult = symbol.multiplier();
                let weight = match (self.multiplier, mult) {
                    (WaysMultiplier::Symbol, Some(m)) => m as u64,
                    (WaysMultiplier::Board, Some(m)) => {
                        if m > 1 {
                            result.board_pool = result.board_pool.saturating_add(m);
                        }
                        1
                    }
                    _ => 1,
                };
                count = count.saturating_add(weight);
                result.positions.push(Position::new(reel, row));
            }
            result.ways = result.ways.saturating_mul(count);
        }
        result
    }
}

impl WinEvaluator for WaysEvaluator {
    fn name(&self) -> &'static str {
        "ways"
    }

    fn evaluate(&self, board: &mut Board, ctx: &EvalContext<'_>) -> WinData {
        let mut candidates: Vec<&str> = Vec::new();
        for symbol in board.reels.first().into_iter().flatten() {
            if !symbol.is_wild() && !candidates.contains(&symbol.name()) {
                candidates.push(symbol.name());
            }
        }

        let mut data = WinData::default();
        for name in candidates {
            let found = self.count_ways(board, name);
            let Some(pay) = ctx.paytable.get(found.kind, name) else {
                continue;
            };
            let mult = match self.multiplier {
                WaysMultiplier::Global => ctx.global_multiplier,
                WaysMultiplier::Board => found.board_pool.max(1) as f64,
                WaysMultiplier::Symbol => 1.0,
            };
            let base = round2(pay * found.ways as f64);
            data.push(WinRecord {
                symbol: name.to_string(),
                kind: found.kind,
                win: round2(base * mult),
                positions: found.positions,
                meta: WinMeta {
                    global_mult: ctx.global_multiplier,
                    multiplier: mult,
                    win_without_mult: base,
                    ways: Some(found.ways),
                    ..Default::default()
                },
            });
        }

        for record in &data.wins {
            board.mark_exploding(&record.positions);
        }
        data
    }

    fn describe(&self, record: &WinRecord, game_type: GameType) -> ForceDescription {
        ForceDescription::new()
            .with("kind", record.kind)
            .with("symbol", &record.symbol)
            .with("ways", record.meta.ways.unwrap_or(0))
            .with("gametype", game_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;

    #[test]
    fn test_ways_count_multiplies_per_reel() {
        let config = presets::ways_5x3().unwrap();
        let mut board = Board::from_names(
            config.symbols(),
            &[
                vec!["H1", "H1", "L1"],
                vec!["H1", "L2", "L2"],
                vec!["W", "H1", "L3"],
                vec!["L1", "L2", "L3"],
                vec!["L1", "L2", "L3"],
            ],
        )
        .unwrap();
        let evaluator = WaysEvaluator::new(WaysMultiplier::Global);
        let data = evaluator.evaluate(&mut board, &EvalContext::new(&config.paytable));
        let h1 = data.wins.iter().find(|w| w.symbol == "H1").unwrap();
        assert_eq!(h1.kind, 3);
        assert_eq!(h1.meta.ways, Some(4));
        assert_eq!(h1.positions.len(), 5);
        assert_eq!(h1.win, round2(config.paytable.pay(3, "H1") * 4.0));
    }

    #[test]
    fn test_missing_second_reel_breaks() {
        let config = presets::ways_5x3().unwrap();
        let mut board = Board::from_names(
            config.symbols(),
            &[
                vec!["H1", "L1", "L1"],
                vec!["L2", "L2", "L3"],
                vec!["H1", "H1", "H1"],
                vec!["H1", "H1", "H1"],
                vec!["H1", "H1", "H1"],
            ],
        )
        .unwrap();
        let data = WaysEvaluator::new(WaysMultiplier::Symbol)
            .evaluate(&mut board, &EvalContext::new(&config.paytable));
        assert!(data.wins.iter().all(|w| w.symbol != "H1"));
    }

    #[test]
    fn test_multiplier_wild_strategies() {
        let config = presets::ways_5x3().unwrap();
        let names = [
            vec!["H1", "L1", "L1"],
            vec!["W", "L2", "L2"],
            vec!["H1", "L3", "L3"],
            vec!["L4", "L4", "L4"],
            vec!["L4", "L4", "L4"],
        ];
        let pay = config.paytable.pay(3, "H1");

        let mut board = Board::from_names(config.symbols(), &names).unwrap();
        board.reels[1][0].set_multiplier(3).unwrap();
        let data = WaysEvaluator::new(WaysMultiplier::Symbol)
            .evaluate(&mut board, &EvalContext::new(&config.paytable));
        let h1 = data.wins.iter().find(|w| w.symbol == "H1").unwrap();
        assert_eq!(h1.meta.ways, Some(3));
        assert_eq!(h1.win, round2(pay * 3.0));

        let mut board = Board::from_names(config.symbols(), &names).unwrap();
        board.reels[1][0].set_multiplier(3).unwrap();
        let data = WaysEvaluator::new(WaysMultiplier::Board)
            .evaluate(&mut board, &EvalContext::new(&config.paytable));
        let h1 = data.wins.iter().find(|w| w.symbol == "H1").unwrap();
        assert_eq!(h1.meta.ways, Some(1));
        assert_eq!(h1.meta.multiplier, 3.0);
        assert_eq!(h1.win, round2(pay * 3.0));
    }

    #[test]
    fn test_huge_symbol_multipliers_saturate_way_count() {
        let config = presets::ways_5x3().unwrap();
        let mut board = Board::from_names(
            config.symbols(),
            &[
                vec!["H1", "W", "W"],
                vec!["W", "W", "W"],
                vec!["W", "W", "W"],
                vec!["W", "W", "W"],
                vec!["W", "W", "W"],
            ],
        )
        .unwrap();
        for column in board.reels.iter_mut() {
            for symbol in column.iter_mut().filter(|s| s.is_wild()) {
                symbol.set_multiplier(u32::MAX).unwrap();
            }
        }
        let data = WaysEvaluator::new(WaysMultiplier::Symbol)
            .evaluate(&mut board, &EvalContext::new(&config.paytable));
        let h1 = data.wins.iter().find(|w| w.symbol == "H1").unwrap();
        assert_eq!(h1.kind, 5);
        assert_eq!(h1.meta.ways, Some(u64::MAX));
    }
}
