//! Board model and reel-strip board generation
//!
//! A board is one column of [`Symbol`]s per reel, read from a reel strip at a
//! stop position. [`BoardGenerator`] draws boards at random, forces chosen
//! stops, and forces an exact count of a special symbol.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::config::{DistributionConditions, GameConfig, GameType, ReelStrip};
use crate::error::{ReelError, ReelResult};
use crate::random::{weighted_index, weighted_pick};
use crate::symbols::{HookContext, Symbol, SymbolRole, SymbolStorage};

/// Cell coordinate, reel-major
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub reel: usize,
    pub row: usize,
}

impl Position {
    pub fn new(reel: usize, row: usize) -> Self {
        Self { reel, row }
    }
}

/// A revealed board plus the strip state needed to tumble it
#[derive(Debug, Clone)]
pub struct Board {
    pub reels: Vec<Vec<Symbol>>,
    pub reelstrip_id: String,
    /// Strip index of the top visible cell, per reel
    pub stops: Vec<usize>,
    /// Strip index `rows + 1` past the top stop, per reel; a tumble moves it
    /// with the stop
    pub padding_positions: Vec<usize>,
    /// Cell above each reel, empty when padding is off
    pub top_padding: Vec<Symbol>,
    /// Cell below each reel, empty when padding is off
    pub bottom_padding: Vec<Symbol>,
    /// Reveal-delay ramp, non-decreasing across reels
    pub anticipation: Vec<u32>,
    /// Positions of every role-carrying symbol
    pub special_positions: BTreeMap<SymbolRole, Vec<Position>>,
}

impl Board {
    /// Board built straight from symbol names, without a strip
    ///
    /// Stops are zero and padding is empty; useful for scripted scenarios.
    pub fn from_names(storage: &SymbolStorage, reels: &[Vec<&str>]) -> ReelResult<Self> {
        let reels = reels
            .iter()
            .map(|column| column.iter().map(|name| storage.create(name)).collect())
            .collect::<ReelResult<Vec<Vec<Symbol>>>>()?;
        let num_reels = reels.len();
        let mut board = Self {
            reels,
            reelstrip_id: String::new(),
            stops: vec![0; num_reels],
            padding_positions: vec![0; num_reels],
            top_padding: Vec::new(),
            bottom_padding: Vec::new(),
            anticipation: vec![0; num_reels],
            special_positions: BTreeMap::new(),
        };
        board.refresh_special_positions();
        Ok(board)
    }

    pub fn num_reels(&self) -> usize {
        self.reels.len()
    }

    pub fn get(&self, pos: Position) -> &Symbol {
        &self.reels[pos.reel][pos.row]
    }

    pub fn get_mut(&mut self, pos: Position) -> &mut Symbol {
        &mut self.reels[pos.reel][pos.row]
    }

    pub fn has_padding(&self) -> bool {
        !self.top_padding.is_empty()
    }

    /// All positions, reel-major then row-minor
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.reels
            .iter()
            .enumerate()
            .flat_map(|(reel, column)| (0..column.len()).map(move |row| Position::new(reel, row)))
    }

    /// Rescan the board for role-carrying symbols
    pub fn refresh_special_positions(&mut self) {
        let mut found: BTreeMap<SymbolRole, Vec<Position>> = BTreeMap::new();
        for pos in self.positions() {
            let symbol = self.get(pos);
            for role in &symbol.definition().roles {
                found.entry(*role).or_default().push(pos);
            }
        }
        self.special_positions = found;
    }

    pub fn role_positions(&self, role: SymbolRole) -> &[Position] {
        self.special_positions
            .get(&role)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn count_role(&self, role: SymbolRole) -> usize {
        self.role_positions(role).len()
    }

    pub fn count_name(&self, name: &str) -> usize {
        self.reels.iter().flatten().filter(|s| s.name() == name).count()
    }

    pub fn count(&self, target: &ForceTarget) -> usize {
        match target {
            ForceTarget::Role(role) => self.count_role(*role),
            ForceTarget::Name(name) => self.count_name(name),
        }
    }

    pub fn exploding_positions(&self) -> Vec<Position> {
        self.positions().filter(|p| self.get(*p).exploding).collect()
    }

    pub fn mark_exploding(&mut self, positions: &[Position]) {
        for pos in positions {
            self.get_mut(*pos).exploding = true;
        }
    }

    /// Sum of boosting multipliers anywhere on the board
    pub fn multiplier_total(&self) -> u32 {
        self.reels
            .iter()
            .flatten()
            .filter_map(Symbol::boosting_multiplier)
            .sum()
    }

    /// Symbol names, one list per reel
    pub fn names(&self) -> Vec<Vec<&str>> {
        self.reels
            .iter()
            .map(|column| column.iter().map(Symbol::name).collect())
            .collect()
    }
}

/// What a forced board must contain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForceTarget {
    /// Any symbol carrying the role
    Role(SymbolRole),
    /// One symbol by name
    Name(String),
}

/// Draws boards for one game phase under one distribution
#[derive(Debug, Clone, Copy)]
pub struct BoardGenerator<'a> {
    config: &'a GameConfig,
    conditions: &'a DistributionConditions,
    game_type: GameType,
}

impl<'a> BoardGenerator<'a> {
    pub fn new(
        config: &'a GameConfig,
        conditions: &'a DistributionConditions,
        game_type: GameType,
    ) -> Self {
        Self {
            config,
            conditions,
            game_type,
        }
    }

    pub fn game_type(&self) -> GameType {
        self.game_type
    }

    pub fn config(&self) -> &'a GameConfig {
        self.config
    }

    /// New symbol instance with hooks applied
    pub fn instantiate<R: Rng + ?Sized>(&self, name: &str, rng: &mut R) -> ReelResult<Symbol> {
        let ctx = HookContext {
            conditions: self.conditions,
            game_type: self.game_type,
        };
        self.config.symbols().instantiate(name, ctx, rng)
    }

    /// Pick a reel-strip set by the distribution's weights
    pub fn choose_reelstrip<R: Rng + ?Sized>(&self, rng: &mut R) -> ReelResult<&'a str> {
        let weights = self.conditions.reel_weights_for(self.game_type)?;
        Ok(weighted_pick(rng, weights)?.as_str())
    }

    /// Uniformly random stop on every reel
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> ReelResult<Board> {
        let strip_id = self.choose_reelstrip(rng)?;
        let strips = self.config.reel_set(strip_id)?;
        let stops = strips.iter().map(|s| rng.random_range(0..s.len())).collect();
        self.build(strip_id, stops, rng)
    }

    /// Board where each forced reel shows its forced stop on a random row
    pub fn force_from_stops<R: Rng + ?Sized>(
        &self,
        strip_id: &str,
        forced: &BTreeMap<usize, usize>,
        rng: &mut R,
    ) -> ReelResult<Board> {
        let strips = self.config.reel_set(strip_id)?;
        let mut stops = Vec::with_capacity(strips.len());
        for (reel, strip) in strips.iter().enumerate() {
            let stop = match forced.get(&reel) {
                Some(&stop) => {
                    let offset = rng.random_range(0..self.config.num_rows[reel]);
                    strip.wrap(stop as isize - offset as isize)
                }
                None => rng.random_range(0..strip.len()),
            };
            stops.push(stop);
        }
        self.build(strip_id, stops, rng)
    }

    /// Board with exactly `count` target symbols
    ///
    /// Reels are chosen with probability proportional to the target's
    /// frequency on their strip. Attempts repeat until the board holds the
    /// exact count, so strips that stack the target can take many attempts.
    pub fn force_special<R: Rng + ?Sized>(
        &self,
        target: &ForceTarget,
        count: usize,
        rng: &mut R,
    ) -> ReelResult<Board> {
        let storage = self.config.symbols();
        let matches = |name: &str| match target {
            ForceTarget::Role(role) => storage
                .definition(name)
                .map(|d| d.has_role(*role))
                .unwrap_or(false),
            ForceTarget::Name(n) => n == name,
        };

        let mut attempts = 0u64;
        loop {
            let strip_id = self.choose_reelstrip(rng)?;
            let strips = self.config.reel_set(strip_id)?;
            let reel_stops: Vec<Vec<usize>> = strips.iter().map(|s| s.stops_where(matches)).collect();

            let mut candidates: Vec<usize> = (0..strips.len())
                .filter(|&r| !reel_stops[r].is_empty())
                .collect();
            if candidates.is_empty() && count > 0 {
                return Err(ReelError::InvalidConfig(format!(
                    "reel set '{}' never shows {:?}",
                    strip_id, target
                )));
            }

            let mut forced = BTreeMap::new();
            while forced.len() < count && !candidates.is_empty() {
                let weights: Vec<f64> = candidates
                    .iter()
                    .map(|&r| reel_stops[r].len() as f64 / strips[r].len() as f64)
                    .collect();
                let reel = candidates.remove(weighted_index(rng, &weights)?);
                if let Some(&stop) = reel_stops[reel].choose(rng) {
                    forced.insert(reel, stop);
                }
            }

            let board = self.force_from_stops(strip_id, &forced, rng)?;
            if board.count(target) == count {
                return Ok(board);
            }
            attempts += 1;
            if attempts % 10_000 == 0 {
                log::warn!(
                    "force_special: {} attempts without exactly {} {:?}",
                    attempts,
                    count,
                    target
                );
            }
        }
    }

    /// Reveal for the current phase
    ///
    /// Base reveals under a feature-forcing distribution get a forced scatter
    /// count. Other base reveals are redrawn while they would trigger the
    /// feature. Feature reveals are plain draws.
    pub fn draw_for_phase<R: Rng + ?Sized>(&self, rng: &mut R) -> ReelResult<Board> {
        if self.game_type != GameType::Base {
            return self.draw(rng);
        }
        if self.conditions.force_freegame {
            let count = *weighted_pick(rng, &self.conditions.scatter_triggers)?;
            return self.force_special(&ForceTarget::Role(SymbolRole::Scatter), count, rng);
        }

        let mut board = self.draw(rng)?;
        if let Some(min) = self.config.min_freespin_trigger(GameType::Base) {
            while board.count_role(SymbolRole::Scatter) >= min {
                board = self.draw(rng)?;
            }
        }
        Ok(board)
    }

    fn build<R: Rng + ?Sized>(
        &self,
        strip_id: &str,
        stops: Vec<usize>,
        rng: &mut R,
    ) -> ReelResult<Board> {
        let strips = self.config.reel_set(strip_id)?;
        let padding = self.config.include_padding;
        let mut reels = Vec::with_capacity(strips.len());
        let mut top_padding = Vec::new();
        let mut bottom_padding = Vec::new();
        let mut padding_positions = Vec::with_capacity(strips.len());

        for (reel, strip) in strips.iter().enumerate() {
            let stop = stops[reel] as isize;
            let rows = self.config.num_rows[reel];
            if padding {
                top_padding.push(self.instantiate(strip.symbol_at(stop - 1), rng)?);
                bottom_padding.push(self.instantiate(strip.symbol_at(stop + rows as isize), rng)?);
            }
            let column = (0..rows)
                .map(|row| self.instantiate(strip.symbol_at(stop + row as isize), rng))
                .collect::<ReelResult<Vec<Symbol>>>()?;
            reels.push(column);
            padding_positions.push(strip.wrap(stop + rows as isize + 1));
        }

        let anticipation = self.anticipation_for(&reels)?;
        let mut board = Board {
            reels,
            reelstrip_id: strip_id.to_string(),
            stops,
            padding_positions,
            top_padding,
            bottom_padding,
            anticipation,
            special_positions: BTreeMap::new(),
        };
        board.refresh_special_positions();
        Ok(board)
    }

    /// Reels after the one where the running scatter count reaches the
    /// anticipation trigger get 1, 2, 3, ...
    fn anticipation_for(&self, reels: &[Vec<Symbol>]) -> ReelResult<Vec<u32>> {
        let mut anticipation = vec![0u32; reels.len()];
        let Some(trigger) = self.config.anticipation_trigger(self.game_type) else {
            return Ok(anticipation);
        };

        let mut seen = 0;
        let mut first = None;
        'scan: for (reel, column) in reels.iter().enumerate() {
            for symbol in column {
                if symbol.is_scatter() {
                    seen += 1;
                    if seen >= trigger {
                        first = Some(reel + 1);
                        break 'scan;
                    }
                }
            }
        }

        if let Some(first) = first.filter(|&f| f < reels.len()) {
            for (step, reel) in (first..reels.len()).enumerate() {
                anticipation[reel] = step as u32 + 1;
            }
        }
        if anticipation.windows(2).any(|w| w[0] > w[1]) {
            return Err(ReelError::Anticipation(anticipation));
        }
        Ok(anticipation)
    }
}

/// Strip for a reel of a board's reel set
pub(crate) fn strip_for<'a>(config: &'a GameConfig, board: &Board, reel: usize) -> ReelResult<&'a ReelStrip> {
    config
        .reel_set(&board.reelstrip_id)?
        .get(reel)
        .ok_or_else(|| ReelError::UnknownReelStrip(format!("{} reel {}", board.reelstrip_id, reel)))
}
