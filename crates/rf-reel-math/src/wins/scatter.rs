//! Pay-anywhere evaluation

use std::collections::BTreeSet;

use crate::board::{Board, Position};
use crate::config::GameType;
use crate::recorder::ForceDescription;

use super::{EvalContext, WinData, WinEvaluator, WinMeta, WinRecord};

/// Board-wide symbol counts, wilds adding to every count
#[derive(Debug, Clone, Copy, Default)]
pub struct ScatterEvaluator;

impl ScatterEvaluator {
    /// Cell closest to the board centre on a row no earlier win claimed
    fn overlay(claimed: &BTreeSet<usize>, positions: &[Position], num_reels: usize, max_rows: usize) -> Position {
        let centre_reel = num_reels as f64 / 2.0;
        let centre_row = max_rows as f64 / 2.0;
        positions
            .iter()
            .filter(|p| !claimed.contains(&p.row))
            .map(|p| {
                let d = (p.reel as f64 - centre_reel).powi(2) + (p.row as f64 - centre_row).powi(2);
                (d, *p)
            })
            .fold(None::<(f64, Position)>, |best, (d, p)| match best {
                Some((bd, _)) if bd <= d => best,
                _ => Some((d, p)),
            })
            .map(|(_, p)| p)
            .unwrap_or(Position::new(0, 0))
    }
}

impl WinEvaluator for ScatterEvaluator {
    fn name(&self) -> &'static str {
        "scatter"
    }

    fn evaluate(&self, board: &mut Board, ctx: &EvalContext<'_>) -> WinData {
        let mut groups: Vec<(String, Vec<Position>)> = Vec::new();
        let mut wilds = Vec::new();
        for pos in board.positions() {
            let symbol = board.get(pos);
            if symbol.is_wild() {
                wilds.push(pos);
                continue;
            }
            match groups.iter_mut().find(|(name, _)| name == symbol.name()) {
                Some((_, list)) => list.push(pos),
                None => groups.push((symbol.name().to_string(), vec![pos])),
            }
        }

        let num_reels = board.num_reels();
        let max_rows = board.reels.iter().map(Vec::len).max().unwrap_or(0);
        let mut claimed_rows = BTreeSet::new();
        let mut data = WinData::default();

        for (name, mut positions) in groups {
            positions.extend_from_slice(&wilds);
            let Some(pay) = ctx.paytable.get(positions.len(), &name) else {
                continue;
            };
            let mult = positions
                .iter()
                .filter_map(|p| board.get(*p).multiplier())
                .sum::<u32>()
                .max(1) as f64;
            let overlay = Self::overlay(&claimed_rows, &positions, num_reels, max_rows);
            claimed_rows.insert(overlay.row);

            data.push(WinRecord {
                symbol: name,
                kind: positions.len(),
                win: pay * ctx.global_multiplier * mult,
                meta: WinMeta {
                    global_mult: ctx.global_multiplier,
                    multiplier: mult,
                    win_without_mult: pay,
                    overlay: Some(overlay),
                    ..Default::default()
                },
                positions,
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
            .with("totalMult", (record.meta.global_mult + record.meta.multiplier) as u64)
            .with("gametype", game_type)
    }
}
