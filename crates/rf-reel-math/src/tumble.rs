//! Tumble (cascade)
//!
//! Exploding cells are removed, survivors fall, and each reel pulls the
//! symbols above its window from the strip. With padding the first refill
//! on a reel is the old top padding cell and a new padding cell is read.

use rand::Rng;

use crate::board::{Board, BoardGenerator, Position, strip_for};
use crate::error::{ReelError, ReelResult};
use crate::symbols::Symbol;

/// What a tumble changed
#[derive(Debug, Clone, Default)]
pub struct TumbleOutcome {
    /// Cells removed, reel-major
    pub exploded: Vec<Position>,
    /// Newly revealed symbols per reel, top first, including a new top
    /// padding cell when padding is on
    pub new_symbols: Vec<Vec<Symbol>>,
}

impl TumbleOutcome {
    pub fn exploded_count(&self) -> usize {
        self.exploded.len()
    }
}

/// Remove exploding cells and refill from the reel strips
pub fn tumble_board<R: Rng + ?Sized>(
    board: &mut Board,
    generator: &BoardGenerator<'_>,
    rng: &mut R,
) -> ReelResult<TumbleOutcome> {
    let config = generator.config();
    let padding = board.has_padding();
    let exploded = board.exploding_positions();
    let mut new_symbols = vec![Vec::new(); board.num_reels()];

    for reel in 0..board.num_reels() {
        let strip = strip_for(config, board, reel)?;
        let removed = board.reels[reel].iter().filter(|s| s.exploding).count();
        if removed == 0 {
            continue;
        }

        let mut stop = board.stops[reel] as isize;
        let mut refill: Vec<Symbol> = Vec::with_capacity(removed);
        for i in 0..removed {
            stop = strip.wrap(stop - 1) as isize;
            if i == 0 && padding {
                let mut top = board.top_padding[reel].clone();
                top.exploding = false;
                refill.insert(0, top);
            } else {
                let symbol = generator.instantiate(strip.symbol_at(stop), rng)?;
                new_symbols[reel].insert(0, symbol.clone());
                refill.insert(0, symbol);
            }
        }

        let expected = config.num_rows[reel];
        let column: Vec<Symbol> = refill
            .into_iter()
            .chain(board.reels[reel].iter().filter(|s| !s.exploding).cloned())
            .collect();
        if column.len() != expected {
            return Err(ReelError::BoardShape {
                reel,
                expected,
                actual: column.len(),
            });
        }

        board.reels[reel] = column;
        board.stops[reel] = stop as usize;
        board.padding_positions[reel] = strip.wrap(stop + expected as isize + 1);
        if padding {
            let top = generator.instantiate(strip.symbol_at(stop - 1), rng)?;
            new_symbols[reel].insert(0, top.clone());
            board.top_padding[reel] = top;
        }
    }

    board.refresh_special_positions();
    Ok(TumbleOutcome {
        exploded,
        new_symbols,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameType;
    use crate::presets;
    use crate::random::trial_rng;
    use crate::wins::{EvalContext, evaluator_for};

    #[test]
    fn test_tumble_keeps_row_counts() {
        let config = presets::scatter_6x5().unwrap();
        let mode = config.bet_mode("base").unwrap();
        let conditions = &mode.distributions.last().unwrap().conditions;
        let generator = BoardGenerator::new(&config, conditions, GameType::Base);
        let evaluator = evaluator_for(&config.win_mechanism);
        let mut rng = trial_rng(99);

        for _ in 0..50 {
            let mut board = generator.draw(&mut rng).unwrap();
            let data = evaluator.evaluate(&mut board, &EvalContext::new(&config.paytable));
            let marked = board.exploding_positions().len();
            let outcome = tumble_board(&mut board, &generator, &mut rng).unwrap();
            assert_eq!(outcome.exploded_count(), marked);
            assert!(data.is_win() || marked == 0);
            assert!(board.reels.iter().all(|c| c.len() == 5));
            assert!(board.exploding_positions().is_empty());
        }
    }

    #[test]
    fn test_refill_reads_strip_above_window() {
        let config = presets::scatter_6x5().unwrap();
        let mode = config.bet_mode("base").unwrap();
        let conditions = &mode.distributions.last().unwrap().conditions;
        let generator = BoardGenerator::new(&config, conditions, GameType::Base);
        let mut rng = trial_rng(4);

        let mut board = generator.draw(&mut rng).unwrap();
        let strip = config.reel_set(&board.reelstrip_id).unwrap()[0].clone();
        let stop = board.stops[0] as isize;
        let survivors: Vec<String> = board.reels[0][1..].iter().map(|s| s.name().to_string()).collect();
        board.reels[0][0].exploding = true;

        let outcome = tumble_board(&mut board, &generator, &mut rng).unwrap();
        assert_eq!(outcome.exploded, vec![Position::new(0, 0)]);
        assert_eq!(board.stops[0], strip.wrap(stop - 1));
        assert_eq!(board.padding_positions[0], strip.wrap(stop + 5));
        assert_eq!(board.reels[0][0].name(), strip.symbol_at(stop - 1));
        let after: Vec<&str> = board.reels[0][1..].iter().map(|s| s.name()).collect();
        assert_eq!(after, survivors);
        assert!(outcome.new_symbols[1].is_empty());
    }
}
