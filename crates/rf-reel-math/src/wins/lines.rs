//! Payline evaluation

use crate::board::{Board, Position};
use crate::config::{GameType, Payline};
use crate::recorder::ForceDescription;

use super::{EvalContext, LineMultiplier, WinData, WinEvaluator, WinMeta, WinRecord, apply_line_multiplier};

/// Left-to-right runs along fixed paylines
#[derive(Debug, Clone)]
pub struct LinesEvaluator {
    paylines: Vec<Payline>,
    multiplier: LineMultiplier,
    wild_symbol: String,
}

impl LinesEvaluator {
    pub fn new(paylines: Vec<Payline>, multiplier: LineMultiplier, wild_symbol: String) -> Self {
        Self {
            paylines,
            multiplier,
            wild_symbol,
        }
    }

    fn evaluate_line(&self, board: &Board, line: &Payline, ctx: &EvalContext<'_>) -> Option<WinRecord> {
        let cells: Vec<Position> = line
            .rows
            .iter()
            .enumerate()
            .map(|(reel, &row)| Position::new(reel, row))
            .collect();
        let symbols: Vec<_> = cells.iter().map(|p| board.get(*p)).collect();

        let wild_matches = symbols.iter().take_while(|s| s.is_wild()).count();
        let first_non_wild = symbols.get(wild_matches).map(|s| s.name());
        let matches = match first_non_wild {
            Some(name) => symbols[wild_matches..]
                .iter()
                .take_while(|s| s.is_wild() || s.name() == name)
                .count(),
            None => 0,
        };

        let wild_win = if wild_matches > 0 {
            ctx.paytable.pay(wild_matches, &self.wild_symbol)
        } else {
            0.0
        };
        let base_win = first_non_wild
            .map(|name| ctx.paytable.pay(wild_matches + matches, name))
            .unwrap_or(0.0);

        if wild_win <= 0.0 && base_win <= 0.0 {
            return None;
        }

        let (symbol, kind, pay) = if wild_win >= base_win {
            (symbols[0].name(), wild_matches, wild_win)
        } else {
            (first_non_wild?, wild_matches + matches, base_win)
        };
        let positions = cells[..kind].to_vec();
        let (win, mult) =
            apply_line_multiplier(self.multiplier, board, &positions, pay, ctx.global_multiplier);

        Some(WinRecord {
            symbol: symbol.to_string(),
            kind,
            win,
            positions,
            meta: WinMeta {
                global_mult: ctx.global_multiplier,
                multiplier: mult,
                win_without_mult: pay,
                line_index: Some(line.index),
                ..Default::default()
            },
        })
    }
}

impl WinEvaluator for LinesEvaluator {
    fn name(&self) -> &'static str {
        "lines"
    }

    fn evaluate(&self, board: &mut Board, ctx: &EvalContext<'_>) -> WinData {
        let mut data = WinData::default();
        for line in &self.paylines {
            if let Some(record) = self.evaluate_line(board, line, ctx) {
                data.push(record);
            }
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
            .with("mult", record.meta.multiplier)
            .with("gametype", game_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::standard_20_paylines;
    use crate::presets;

    fn evaluator() -> LinesEvaluator {
        LinesEvaluator::new(standard_20_paylines(), LineMultiplier::Symbol, "W".into())
    }

    #[test]
    fn test_wild_substitutes_inside_run() {
        let config = presets::lines_5x3().unwrap();
        let mut board = Board::from_names(
            config.symbols(),
            &[
                vec!["L1", "H1", "L2"],
                vec!["L2", "W", "L3"],
                vec!["L3", "H1", "L4"],
                vec!["L4", "L1", "L1"],
                vec!["L1", "L2", "L3"],
            ],
        )
        .unwrap();
        let data = evaluator().evaluate(&mut board, &EvalContext::new(&config.paytable));
        let middle = data.wins.iter().find(|w| w.meta.line_index == Some(1)).unwrap();
        assert_eq!(middle.symbol, "H1");
        assert_eq!(middle.kind, 3);
        assert_eq!(middle.positions.len(), 3);
        assert!(board.get(Position::new(1, 1)).exploding);
    }

    #[test]
    fn test_wild_run_beats_weaker_symbol_run() {
        let config = presets::lines_5x3().unwrap();
        // W W W L4 L4: wild 3-kind pays more than L4 5-kind
        let mut board = Board::from_names(
            config.symbols(),
            &[
                vec!["L1", "W", "L2"],
                vec!["L2", "W", "L3"],
                vec!["L3", "W", "L1"],
                vec!["L1", "L4", "L2"],
                vec!["L2", "L4", "L3"],
            ],
        )
        .unwrap();
        let ctx = EvalContext::new(&config.paytable);
        let data = evaluator().evaluate(&mut board, &ctx);
        let middle = data.wins.iter().find(|w| w.meta.line_index == Some(1)).unwrap();
        let wild3 = config.paytable.pay(3, "W");
        let l4_5 = config.paytable.pay(5, "L4");
        assert!(wild3 > l4_5);
        assert_eq!(middle.symbol, "W");
        assert_eq!(middle.kind, 3);
        assert_eq!(middle.win, wild3);
    }

    #[test]
    fn test_global_strategy_scales_win() {
        let config = presets::lines_5x3().unwrap();
        let evaluator = LinesEvaluator::new(
            vec![Payline::straight(1, 0, 5)],
            LineMultiplier::Global,
            "W".into(),
        );
        let mut board = Board::from_names(
            config.symbols(),
            &[
                vec!["H1"],
                vec!["H1"],
                vec!["H1"],
                vec!["L1"],
                vec!["L2"],
            ],
        )
        .unwrap();
        let ctx = EvalContext::new(&config.paytable).with_global_multiplier(3.0);
        let data = evaluator.evaluate(&mut board, &ctx);
        assert_eq!(data.wins.len(), 1);
        assert_eq!(data.total_win, config.paytable.pay(3, "H1") * 3.0);
        assert_eq!(data.wins[0].meta.win_without_mult, config.paytable.pay(3, "H1"));
    }
}
