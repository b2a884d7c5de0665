//! Seeded randomness helpers

use std::collections::BTreeMap;

use rand::Rng;
use rand::SeedableRng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand_chacha::ChaCha8Rng;

use crate::error::{ReelError, ReelResult};

/// RNG driving one trial
pub type TrialRng = ChaCha8Rng;

/// Deterministic RNG for a trial seed
pub fn trial_rng(seed: u64) -> TrialRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Index drawn proportionally to `weights`
pub fn weighted_index<R: Rng + ?Sized>(rng: &mut R, weights: &[f64]) -> ReelResult<usize> {
    let dist = WeightedIndex::<f64>::new(weights.iter().copied())
        .map_err(|e| ReelError::InvalidWeights(format!("{:?}: {}", weights, e)))?;
    Ok(dist.sample(rng))
}

/// Key drawn proportionally to its weight; iteration order is the map's key order
pub fn weighted_pick<'a, K, R: Rng + ?Sized>(
    rng: &mut R,
    table: &'a BTreeMap<K, f64>,
) -> ReelResult<&'a K> {
    let weights: Vec<f64> = table.values().copied().collect();
    let index = weighted_index(rng, &weights)?;
    table
        .keys()
        .nth(index)
        .ok_or_else(|| ReelError::InvalidWeights("empty weight table".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_entry_always_wins() {
        let mut rng = trial_rng(1);
        let table = BTreeMap::from([("BR0".to_string(), 3.0)]);
        for _ in 0..10 {
            assert_eq!(weighted_pick(&mut rng, &table).unwrap(), "BR0");
        }
    }

    #[test]
    fn test_zero_weight_never_drawn() {
        let mut rng = trial_rng(2);
        let table = BTreeMap::from([(1u32, 0.0), (2u32, 1.0)]);
        for _ in 0..100 {
            assert_eq!(*weighted_pick(&mut rng, &table).unwrap(), 2);
        }
    }

    #[test]
    fn test_invalid_tables() {
        let mut rng = trial_rng(3);
        let empty: BTreeMap<u32, f64> = BTreeMap::new();
        assert!(weighted_pick(&mut rng, &empty).is_err());
        assert!(weighted_index(&mut rng, &[0.0, 0.0]).is_err());
        assert!(weighted_index(&mut rng, &[-1.0, 2.0]).is_err());
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let weights = [1.0, 2.0, 3.0, 4.0];
        let mut a = trial_rng(42);
        let mut b = trial_rng(42);
        let xs: Vec<usize> = (0..50).map(|_| weighted_index(&mut a, &weights).unwrap()).collect();
        let ys: Vec<usize> = (0..50).map(|_| weighted_index(&mut b, &weights).unwrap()).collect();
        assert_eq!(xs, ys);
    }
}
