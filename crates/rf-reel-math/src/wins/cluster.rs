//! Cluster evaluation

use crate::board::{Board, Position};
use crate::config::GameType;
use crate::recorder::ForceDescription;

use super::{EvalContext, WinData, WinEvaluator, WinMeta, WinRecord};

/// Orthogonally connected regions of one symbol, wilds joining any region
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterEvaluator;

/// Connected regions by symbol name, in discovery order
///
/// Seeds are scanned reel-major then row-minor and never start on a wild.
/// A wild may belong to several regions; any other cell belongs to exactly one.
pub fn find_clusters(board: &Board) -> Vec<(String, Vec<Position>)> {
    let mut visited: Vec<Vec<bool>> = board.reels.iter().map(|c| vec![false; c.len()]).collect();
    let mut clusters = Vec::new();

    for seed in board.positions() {
        if visited[seed.reel][seed.row] || board.get(seed).is_wild() {
            continue;
        }
        let name = board.get(seed).name().to_string();
        visited[seed.reel][seed.row] = true;

        let mut local: Vec<Vec<bool>> = board.reels.iter().map(|c| vec![false; c.len()]).collect();
        local[seed.reel][seed.row] = true;
        let mut members = vec![seed];
        let mut stack = vec![seed];

        while let Some(pos) = stack.pop() {
            for next in neighbours(board, pos) {
                if local[next.reel][next.row] {
                    continue;
                }
                local[next.reel][next.row] = true;
                let symbol = board.get(next);
                if symbol.is_wild() || symbol.name() == name {
                    visited[next.reel][next.row] = true;
                    members.push(next);
                    stack.push(next);
                }
            }
        }
        clusters.push((name, members));
    }
    clusters
}

fn neighbours(board: &Board, pos: Position) -> impl Iterator<Item = Position> {
    let reels = board.num_reels();
    let rows = board.reels[pos.reel].len();
    let mut out = Vec::with_capacity(4);
    if pos.reel > 0 && pos.row < board.reels[pos.reel - 1].len() {
        out.push(Position::new(pos.reel - 1, pos.row));
    }
    if pos.reel + 1 < reels && pos.row < board.reels[pos.reel + 1].len() {
        out.push(Position::new(pos.reel + 1, pos.row));
    }
    if pos.row > 0 {
        out.push(Position::new(pos.reel, pos.row - 1));
    }
    if pos.row + 1 < rows {
        out.push(Position::new(pos.reel, pos.row + 1));
    }
    out.into_iter()
}

/// Display cell: mean reel and row, rounded half to even
fn overlay(positions: &[Position]) -> Position {
    let n = positions.len().max(1) as f64;
    let reel = positions.iter().map(|p| p.reel).sum::<usize>() as f64 / n;
    let row = positions.iter().map(|p| p.row).sum::<usize>() as f64 / n;
    Position::new(reel.round_ties_even() as usize, row.round_ties_even() as usize)
}

impl ClusterEvaluator {
    fn cluster_multiplier(board: &Board, positions: &[Position], ctx: &EvalContext<'_>) -> f64 {
        let sum: u32 = match ctx.position_multipliers {
            Some(grid) => positions
                .iter()
                .map(|p| grid.get(p.reel).and_then(|c| c.get(p.row)).copied().unwrap_or(0))
                .sum(),
            None => positions
                .iter()
                .filter_map(|p| board.get(*p).multiplier())
                .filter(|&m| m > 0)
                .sum(),
        };
        sum.max(1) as f64
    }
}

impl WinEvaluator for ClusterEvaluator {
    fn name(&self) -> &'static str {
        "cluster"
    }

    fn evaluate(&self, board: &mut Board, ctx: &EvalContext<'_>) -> WinData {
        let mut data = WinData::default();
        for (name, positions) in find_clusters(board) {
            let Some(pay) = ctx.paytable.get(positions.len(), &name) else {
                continue;
            };
            let mult = Self::cluster_multiplier(board, &positions, ctx);
            data.push(WinRecord {
                symbol: name,
                kind: positions.len(),
                win: pay * mult * ctx.global_multiplier,
                meta: WinMeta {
                    global_mult: ctx.global_multiplier,
                    multiplier: mult,
                    win_without_mult: pay,
                    overlay: Some(overlay(&positions)),
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
            .with("mult", (record.meta.global_mult + record.meta.multiplier) as u64)
            .with("gametype", game_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;

    #[test]
    fn test_wild_shared_between_clusters() {
        let config = presets::cluster_7x7().unwrap();
        let board = Board::from_names(
            config.symbols(),
            &[
                vec!["H1", "H1", "L1"],
                vec!["W", "L2", "L1"],
                vec!["H2", "H2", "L3"],
            ],
        )
        .unwrap();
        let clusters = find_clusters(&board);
        let h1 = clusters.iter().find(|(n, _)| n == "H1").unwrap();
        let h2 = clusters.iter().find(|(n, _)| n == "H2").unwrap();
        assert!(h1.1.contains(&Position::new(1, 0)));
        assert!(h2.1.contains(&Position::new(1, 0)));
        assert_eq!(h1.1.len(), 3);
        assert_eq!(h2.1.len(), 3);
    }

    #[test]
    fn test_non_wild_cells_partition() {
        let config = presets::cluster_7x7().unwrap();
        let board = Board::from_names(
            config.symbols(),
            &[
                vec!["H1", "L1", "H1"],
                vec!["H1", "L1", "H1"],
                vec!["H1", "H1", "H1"],
            ],
        )
        .unwrap();
        let clusters = find_clusters(&board);
        assert_eq!(clusters.len(), 2);
        let total: usize = clusters.iter().map(|(_, p)| p.len()).sum();
        assert_eq!(total, 9);
    }

    #[test]
    fn test_grid_multipliers_replace_symbol_multipliers() {
        let config = presets::cluster_7x7().unwrap();
        let names: Vec<Vec<&str>> = (0..7)
            .map(|reel| {
                (0..7)
                    .map(|row| if reel < 1 && row < 5 { "H1" } else if (reel + row) % 2 == 0 { "L1" } else { "L2" })
                    .collect()
            })
            .collect();
        let mut board = Board::from_names(config.symbols(), &names).unwrap();
        let mut grid = vec![vec![0u32; 7]; 7];
        grid[0][0] = 2;
        grid[0][1] = 3;
        let ctx = EvalContext::new(&config.paytable).with_position_multipliers(&grid);
        let data = ClusterEvaluator.evaluate(&mut board, &ctx);
        let h1 = data.wins.iter().find(|w| w.symbol == "H1").unwrap();
        assert_eq!(h1.kind, 5);
        assert_eq!(h1.meta.multiplier, 5.0);
        assert_eq!(h1.win, config.paytable.pay(5, "H1") * 5.0);
        assert_eq!(h1.meta.overlay, Some(Position::new(0, 2)));
        assert!(board.get(Position::new(0, 4)).exploding);
    }
}
