//! Criteria assignment and deterministic seeds
//!
//! Every trial index gets a criteria name and a seed before any worker
//! starts. The split uses an RNG seeded with 0, so the same mode and trial
//! count always produce the same plan.

use std::collections::{BTreeMap, HashMap};

use rand::seq::SliceRandom;
use sha2::{Digest, Sha256};

use rf_reel_math::BetMode;
use rf_reel_math::random::{TrialRng, trial_rng, weighted_index};

use crate::error::{SimError, SimResult};

/// One trial to play
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialPlan {
    /// 1-based book id
    pub id: u64,
    pub criteria: String,
    pub seed: u64,
}

/// Stable seed base of a criteria name: the first 12 hex digits of its SHA-256
pub fn criteria_seed(criteria: &str) -> u64 {
    let digest = Sha256::digest(criteria.as_bytes());
    hex::encode(&digest[..6])
        .chars()
        .fold(0u64, |acc, c| (acc << 4) | u64::from(c.to_digit(16).unwrap_or(0)))
}

/// Trial count per criteria for a quota-only mode, in distribution order
///
/// Each bucket starts at `max(floor(n × quota), 1)`; buckets picked by quota
/// weight are then adjusted one at a time until the sum equals `n`.
pub fn quota_splits(mode: &BetMode, num_trials: usize) -> SimResult<Vec<(String, usize)>> {
    let mut rng = trial_rng(0);
    quota_splits_with(mode, num_trials, &mut rng)
}

fn quota_splits_with(
    mode: &BetMode,
    num_trials: usize,
    rng: &mut TrialRng,
) -> SimResult<Vec<(String, usize)>> {
    let buckets: Vec<(&str, f64)> = mode
        .distributions
        .iter()
        .filter_map(|d| d.quota.map(|q| (d.criteria.as_str(), q)))
        .collect();
    if buckets.is_empty() {
        return Err(SimError::InvalidRun(format!(
            "bet mode '{}' has no quota distributions",
            mode.name
        )));
    }
    if num_trials < buckets.len() {
        return Err(SimError::InvalidRun(format!(
            "bet mode '{}' needs at least {} trials, one per criteria",
            mode.name,
            buckets.len()
        )));
    }

    let mut counts: Vec<usize> = buckets
        .iter()
        .map(|(_, q)| ((num_trials as f64 * q).floor() as usize).max(1))
        .collect();
    let weights: Vec<f64> = buckets.iter().map(|(_, q)| *q).collect();
    let reduce = counts.iter().sum::<usize>() > num_trials;

    while counts.iter().sum::<usize>() != num_trials {
        let pick = weighted_index(rng, &weights)?;
        if reduce {
            if counts[pick] > 1 {
                counts[pick] -= 1;
            }
        } else {
            counts[pick] += 1;
        }
    }

    Ok(buckets
        .iter()
        .zip(counts)
        .map(|((criteria, _), count)| (criteria.to_string(), count))
        .collect())
}

/// Unshuffled assignment for a mode with fixed-amount buckets
///
/// Fixed buckets come first, then each quota bucket gets its proportional
/// share of the remainder, then weighted picks fill what rounding left.
fn fixed_assignment(
    mode: &BetMode,
    num_trials: usize,
    rng: &mut TrialRng,
) -> SimResult<Vec<String>> {
    let mut assignment = Vec::with_capacity(num_trials);
    for d in &mode.distributions {
        if let Some(amount) = d.fixed_amount {
            assignment.extend(std::iter::repeat_n(d.criteria.clone(), amount as usize));
        }
    }

    let quota: Vec<(&str, f64)> = mode
        .distributions
        .iter()
        .filter_map(|d| d.quota.map(|q| (d.criteria.as_str(), q)))
        .collect();
    let total_quota: f64 = quota.iter().map(|(_, q)| q).sum();
    if quota.is_empty() || assignment.len() >= num_trials {
        return Ok(assignment);
    }

    let remaining = (num_trials - assignment.len()) as f64;
    for (criteria, q) in &quota {
        let share = ((q / total_quota) * remaining).max(1.0).floor() as usize;
        let room = num_trials - assignment.len();
        assignment.extend(std::iter::repeat_n(criteria.to_string(), share.min(room)));
    }

    let weights: Vec<f64> = quota.iter().map(|(_, q)| *q).collect();
    while assignment.len() < num_trials {
        let pick = weighted_index(rng, &weights)?;
        assignment.push(quota[pick].0.to_string());
    }
    Ok(assignment)
}

/// Trial count actually run for a mode: fixed buckets raise the request
pub fn effective_trials(mode: &BetMode, requested: usize) -> usize {
    requested.max(mode.fixed_total() as usize)
}

/// Full plan for `requested` trials of one mode
pub fn allocate(mode: &BetMode, requested: usize) -> SimResult<Vec<TrialPlan>> {
    let num_trials = effective_trials(mode, requested);
    let mut rng = trial_rng(0);

    let mut assignment = if mode.has_fixed_amounts() {
        fixed_assignment(mode, num_trials, &mut rng)?
    } else {
        quota_splits_with(mode, num_trials, &mut rng)?
            .into_iter()
            .flat_map(|(criteria, count)| std::iter::repeat_n(criteria, count))
            .collect()
    };
    assignment.shuffle(&mut rng);

    let mut counters: HashMap<String, u64> = HashMap::new();
    let plans = assignment
        .into_iter()
        .enumerate()
        .map(|(index, criteria)| {
            let counter = counters.entry(criteria.clone()).or_insert(0);
            let seed = criteria_seed(&criteria).wrapping_add(*counter);
            *counter += 1;
            TrialPlan {
                id: index as u64 + 1,
                criteria,
                seed,
            }
        })
        .collect::<Vec<_>>();

    log::debug!(
        "Allocated {} trials for mode '{}': {:?}",
        plans.len(),
        mode.name,
        realized_counts(&plans)
    );
    Ok(plans)
}

/// Trials per criteria in a plan
pub fn realized_counts(plans: &[TrialPlan]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for plan in plans {
        *counts.entry(plan.criteria.clone()).or_insert(0) += 1;
    }
    counts
}
