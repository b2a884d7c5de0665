//! Symbol definitions, board symbol instances and the symbol registry

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{DistributionConditions, GameType, Paytable};
use crate::error::{ReelError, ReelResult};
use crate::random::weighted_pick;

/// Special role a symbol can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolRole {
    /// Substitutes for paying symbols
    Wild,
    /// Counts anywhere on the board, triggers the feature round
    Scatter,
    /// Carries a multiplier value
    Multiplier,
    /// Carries a prize value
    Prize,
}

impl SymbolRole {
    pub const ALL: [SymbolRole; 4] = [
        SymbolRole::Wild,
        SymbolRole::Scatter,
        SymbolRole::Multiplier,
        SymbolRole::Prize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolRole::Wild => "wild",
            SymbolRole::Scatter => "scatter",
            SymbolRole::Multiplier => "multiplier",
            SymbolRole::Prize => "prize",
        }
    }
}

impl fmt::Display for SymbolRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Post-construction step run on every new instance of a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolHook {
    /// Draw the multiplier from the active distribution's `mult_values`
    MultiplierFromDistribution,
    /// Draw the prize from the active distribution's `prize_values`
    PrizeFromDistribution,
}

/// Immutable per-name symbol data, shared by every instance
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolDefinition {
    pub name: String,
    pub roles: BTreeSet<SymbolRole>,
    /// Match size → payout, empty for non-paying symbols
    pub pays: BTreeMap<usize, f64>,
    pub hooks: Vec<SymbolHook>,
}

impl SymbolDefinition {
    /// Build the definition of `name` from the game's paytable and role map
    pub fn define(
        name: &str,
        paytable: &Paytable,
        special_symbols: &BTreeMap<SymbolRole, Vec<String>>,
        hooks: &BTreeMap<String, Vec<SymbolHook>>,
    ) -> Self {
        let roles = special_symbols
            .iter()
            .filter(|(_, names)| names.iter().any(|n| n == name))
            .map(|(role, _)| *role)
            .collect();

        Self {
            name: name.to_string(),
            roles,
            pays: paytable.kinds(name),
            hooks: hooks.get(name).cloned().unwrap_or_default(),
        }
    }

    pub fn has_role(&self, role: SymbolRole) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_paying(&self) -> bool {
        !self.pays.is_empty()
    }

    pub fn is_special(&self) -> bool {
        !self.roles.is_empty()
    }
}

/// One board cell
///
/// `multiplier` and `prize` exist only when the definition's role set
/// declares them; the accessors return `None` otherwise.
#[derive(Debug, Clone)]
pub struct Symbol {
    definition: Arc<SymbolDefinition>,
    /// Marked for removal by the last evaluation
    pub exploding: bool,
    multiplier: Option<u32>,
    prize: Option<u32>,
}

impl Symbol {
    /// Fresh instance with role defaults (multiplier 1, prize 0)
    pub fn new(definition: Arc<SymbolDefinition>) -> Self {
        let multiplier = definition.has_role(SymbolRole::Multiplier).then_some(1);
        let prize = definition.has_role(SymbolRole::Prize).then_some(0);
        Self {
            definition,
            exploding: false,
            multiplier,
            prize,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &SymbolDefinition {
        &self.definition
    }

    pub fn has_role(&self, role: SymbolRole) -> bool {
        self.definition.has_role(role)
    }

    pub fn is_wild(&self) -> bool {
        self.has_role(SymbolRole::Wild)
    }

    pub fn is_scatter(&self) -> bool {
        self.has_role(SymbolRole::Scatter)
    }

    pub fn multiplier(&self) -> Option<u32> {
        self.multiplier
    }

    /// Multiplier value when it boosts a win (greater than one)
    pub fn boosting_multiplier(&self) -> Option<u32> {
        self.multiplier.filter(|&m| m > 1)
    }

    pub fn prize(&self) -> Option<u32> {
        self.prize
    }

    pub fn set_multiplier(&mut self, value: u32) -> ReelResult<()> {
        if !self.has_role(SymbolRole::Multiplier) {
            return Err(self.undeclared("multiplier"));
        }
        self.multiplier = Some(value);
        Ok(())
    }

    pub fn set_prize(&mut self, value: u32) -> ReelResult<()> {
        if !self.has_role(SymbolRole::Prize) {
            return Err(self.undeclared("prize"));
        }
        self.prize = Some(value);
        Ok(())
    }

    fn undeclared(&self, attribute: &str) -> ReelError {
        ReelError::UndeclaredAttribute {
            symbol: self.name().to_string(),
            attribute: attribute.to_string(),
        }
    }
}

/// Inputs a post-construction hook may consult
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    pub conditions: &'a DistributionConditions,
    pub game_type: GameType,
}

/// Registry of every symbol a game can place on the board
#[derive(Debug, Clone, Default)]
pub struct SymbolStorage {
    definitions: HashMap<String, Arc<SymbolDefinition>>,
}

impl SymbolStorage {
    /// Register paytable symbols plus every special symbol
    pub fn new(
        paytable: &Paytable,
        special_symbols: &BTreeMap<SymbolRole, Vec<String>>,
        hooks: &BTreeMap<String, Vec<SymbolHook>>,
    ) -> Self {
        let names: BTreeSet<&str> = paytable
            .symbols()
            .chain(special_symbols.values().flatten().map(String::as_str))
            .collect();

        let definitions = names
            .into_iter()
            .map(|name| {
                let def = SymbolDefinition::define(name, paytable, special_symbols, hooks);
                (name.to_string(), Arc::new(def))
            })
            .collect();

        Self { definitions }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn definition(&self, name: &str) -> ReelResult<&Arc<SymbolDefinition>> {
        self.definitions
            .get(name)
            .ok_or_else(|| ReelError::UnknownSymbol(name.to_string()))
    }

    /// Instance with role defaults only
    pub fn create(&self, name: &str) -> ReelResult<Symbol> {
        Ok(Symbol::new(Arc::clone(self.definition(name)?)))
    }

    /// Instance with role defaults, then the symbol's hooks applied
    pub fn instantiate<R: Rng + ?Sized>(
        &self,
        name: &str,
        ctx: HookContext<'_>,
        rng: &mut R,
    ) -> ReelResult<Symbol> {
        let mut symbol = self.create(name)?;
        let definition = Arc::clone(&symbol.definition);
        for hook in &definition.hooks {
            match hook {
                SymbolHook::MultiplierFromDistribution => {
                    if let Some(table) = ctx.conditions.mult_values.get(&ctx.game_type) {
                        let value = *weighted_pick(rng, table)?;
                        symbol.set_multiplier(value)?;
                    }
                }
                SymbolHook::PrizeFromDistribution => {
                    if let Some(table) = ctx.conditions.prize_values.get(&ctx.game_type) {
                        let value = *weighted_pick(rng, table)?;
                        symbol.set_prize(value)?;
                    }
                }
            }
        }
        Ok(symbol)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
