//! Bet modes and their criteria distributions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::GameType;
use crate::error::{ReelError, ReelResult};

/// Board-generation conditions attached to one criteria bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionConditions {
    /// Reel-strip id weights per game phase
    pub reel_weights: BTreeMap<GameType, BTreeMap<String, f64>>,
    /// The base reveal must trigger the feature round
    #[serde(default)]
    pub force_freegame: bool,
    /// Attempts that stop short of the win cap are redrawn
    #[serde(default)]
    pub force_wincap: bool,
    /// Scatter count weights used when forcing the feature trigger
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scatter_triggers: BTreeMap<usize, f64>,
    /// Multiplier value weights per game phase
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mult_values: BTreeMap<GameType, BTreeMap<u32, f64>>,
    /// Prize value weights per game phase (bet multiples)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prize_values: BTreeMap<GameType, BTreeMap<u32, f64>>,
}

impl DistributionConditions {
    /// Conditions drawing from one strip set in both phases
    pub fn with_reels(base: &str, free: Option<&str>) -> Self {
        let mut reel_weights = BTreeMap::new();
        reel_weights.insert(GameType::Base, BTreeMap::from([(base.to_string(), 1.0)]));
        if let Some(free) = free {
            reel_weights.insert(GameType::Free, BTreeMap::from([(free.to_string(), 1.0)]));
        }
        Self {
            reel_weights,
            ..Default::default()
        }
    }

    pub fn with_force_freegame(mut self, scatter_triggers: BTreeMap<usize, f64>) -> Self {
        self.force_freegame = true;
        self.scatter_triggers = scatter_triggers;
        self
    }

    pub fn with_force_wincap(mut self) -> Self {
        self.force_wincap = true;
        self
    }

    pub fn with_mult_values(mut self, game_type: GameType, values: BTreeMap<u32, f64>) -> Self {
        self.mult_values.insert(game_type, values);
        self
    }

    pub fn with_reel_weights(mut self, game_type: GameType, weights: BTreeMap<String, f64>) -> Self {
        self.reel_weights.insert(game_type, weights);
        self
    }

    /// Reel-strip weights for a phase
    pub fn reel_weights_for(&self, game_type: GameType) -> ReelResult<&BTreeMap<String, f64>> {
        self.reel_weights
            .get(&game_type)
            .ok_or_else(|| ReelError::MissingCondition(format!("reel_weights.{}", game_type)))
    }
}

/// A named statistical bucket of trials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub criteria: String,
    /// Relative share of the bet mode's trials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<f64>,
    /// Exact number of trials, instead of a quota
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_amount: Option<u64>,
    /// Required final payout (bet multiples) for acceptance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_criteria: Option<f64>,
    pub conditions: DistributionConditions,
}

impl Distribution {
    pub fn with_quota(criteria: impl Into<String>, quota: f64, conditions: DistributionConditions) -> Self {
        Self {
            criteria: criteria.into(),
            quota: Some(quota),
            fixed_amount: None,
            win_criteria: None,
            conditions,
        }
    }

    pub fn with_fixed_amount(
        criteria: impl Into<String>,
        amount: u64,
        conditions: DistributionConditions,
    ) -> Self {
        Self {
            criteria: criteria.into(),
            quota: None,
            fixed_amount: Some(amount),
            win_criteria: None,
            conditions,
        }
    }

    pub fn with_win_criteria(mut self, payout: f64) -> Self {
        self.win_criteria = Some(payout);
        self
    }

    pub fn validate(&self) -> ReelResult<()> {
        match (self.quota, self.fixed_amount) {
            (Some(q), None) if q > 0.0 && q.is_finite() => {}
            (Some(q), None) => {
                return Err(ReelError::InvalidConfig(format!(
                    "criteria '{}' needs a positive quota, got {}",
                    self.criteria, q
                )));
            }
            (None, Some(_)) => {}
            _ => {
                return Err(ReelError::InvalidConfig(format!(
                    "criteria '{}' must define exactly one of quota or fixed_amount",
                    self.criteria
                )));
            }
        }
        if self.conditions.reel_weights.is_empty() {
            return Err(ReelError::MissingCondition(format!(
                "{}: reel_weights",
                self.criteria
            )));
        }
        if self.conditions.force_freegame && self.conditions.scatter_triggers.is_empty() {
            return Err(ReelError::MissingCondition(format!(
                "{}: scatter_triggers (required by force_freegame)",
                self.criteria
            )));
        }
        Ok(())
    }
}

/// A purchasable way to play the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetMode {
    pub name: String,
    /// Price in base bets
    pub cost: f64,
    /// Target return to player
    pub rtp: f64,
    /// Win cap in bet multiples
    pub max_win: f64,
    #[serde(default)]
    pub is_feature: bool,
    #[serde(default)]
    pub is_buybonus: bool,
    #[serde(default)]
    pub auto_close_disabled: bool,
    pub distributions: Vec<Distribution>,
}

impl BetMode {
    pub fn new(name: impl Into<String>, cost: f64, rtp: f64, max_win: f64) -> Self {
        Self {
            name: name.into(),
            cost,
            rtp,
            max_win,
            is_feature: false,
            is_buybonus: false,
            auto_close_disabled: false,
            distributions: Vec::new(),
        }
    }

    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distributions.push(distribution);
        self
    }

    pub fn with_buybonus(mut self) -> Self {
        self.is_buybonus = true;
        self.is_feature = true;
        self
    }

    /// Look up a criteria bucket by name
    pub fn distribution(&self, criteria: &str) -> ReelResult<&Distribution> {
        self.distributions
            .iter()
            .find(|d| d.criteria == criteria)
            .ok_or_else(|| ReelError::UnknownCriteria {
                mode: self.name.clone(),
                criteria: criteria.to_string(),
            })
    }

    /// Total trials pinned by fixed-amount buckets
    pub fn fixed_total(&self) -> u64 {
        self.distributions.iter().filter_map(|d| d.fixed_amount).sum()
    }

    pub fn has_fixed_amounts(&self) -> bool {
        self.distributions.iter().any(|d| d.fixed_amount.is_some())
    }

    pub fn validate(&self) -> ReelResult<()> {
        if !(self.rtp > 0.0 && self.rtp < 1.0) {
            return Err(ReelError::InvalidConfig(format!(
                "bet mode '{}': rtp must be in (0, 1), got {}",
                self.name, self.rtp
            )));
        }
        if self.cost <= 0.0 || self.max_win <= 0.0 {
            return Err(ReelError::InvalidConfig(format!(
                "bet mode '{}': cost and max_win must be positive",
                self.name
            )));
        }
        if self.distributions.is_empty() {
            return Err(ReelError::InvalidConfig(format!(
                "bet mode '{}' has no distributions",
                self.name
            )));
        }
        for (i, d) in self.distributions.iter().enumerate() {
            if self.distributions[..i].iter().any(|o| o.criteria == d.criteria) {
                return Err(ReelError::InvalidConfig(format!(
                    "bet mode '{}': duplicate criteria '{}'",
                    self.name, d.criteria
                )));
            }
            d.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_conditions() -> DistributionConditions {
        DistributionConditions::with_reels("BR0", Some("FR0"))
    }

    #[test]
    fn test_quota_xor_fixed() {
        let mut d = Distribution::with_quota("basegame", 0.5, base_conditions());
        assert!(d.validate().is_ok());

        d.fixed_amount = Some(10);
        assert!(d.validate().is_err());

        d.quota = None;
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_zero_quota_rejected() {
        let d = Distribution::with_quota("basegame", 0.0, base_conditions());
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_force_freegame_needs_triggers() {
        let mut conditions = base_conditions();
        conditions.force_freegame = true;
        let d = Distribution::with_quota("freegame", 0.1, conditions);
        assert!(matches!(d.validate(), Err(ReelError::MissingCondition(_))));
    }

    #[test]
    fn test_rtp_bounds() {
        let mode = BetMode::new("base", 1.0, 1.0, 5000.0)
            .with_distribution(Distribution::with_quota("0", 1.0, base_conditions()));
        assert!(mode.validate().is_err());
    }

    #[test]
    fn test_conditions_deserialize_defaults() {
        let json = r#"{"reel_weights": {"basegame": {"BR0": 1}}}"#;
        let c: DistributionConditions = serde_json::from_str(json).unwrap();
        assert!(!c.force_freegame);
        assert!(!c.force_wincap);
        assert_eq!(c.reel_weights_for(GameType::Base).unwrap()["BR0"], 1.0);
        assert!(c.reel_weights_for(GameType::Free).is_err());
    }

    #[test]
    fn test_lookup_unknown_criteria() {
        let mode = BetMode::new("base", 1.0, 0.97, 5000.0)
            .with_distribution(Distribution::with_quota("0", 1.0, base_conditions()));
        assert!(mode.distribution("0").is_ok());
        assert!(matches!(
            mode.distribution("wincap"),
            Err(ReelError::UnknownCriteria { .. })
        ));
    }
}
