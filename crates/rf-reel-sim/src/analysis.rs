//! Run statistics from lookup tables

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use crate::error::{SimError, SimResult};
use crate::lookup::{LookupRow, SegmentedRow};

/// Trials and mean payout of one criteria bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CriteriaStats {
    pub count: usize,
    /// Mean payout in bet multiples
    pub mean_payout: f64,
}

/// Weighted payout statistics of one bet mode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub trials: usize,
    pub total_weight: u64,
    pub cost: f64,
    pub rtp: f64,
    pub hit_rate: f64,
    pub base_rtp: Option<f64>,
    pub free_rtp: Option<f64>,
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub max_payout: f64,
    pub criteria: BTreeMap<String, CriteriaStats>,
}

/// Summarize a lookup table; the segmented table adds the phase split and
/// per-criteria figures
pub fn summarize(
    lookup: &[LookupRow],
    segmented: Option<&[SegmentedRow]>,
    cost: f64,
) -> SimResult<RunSummary> {
    if cost.is_nan() || cost <= 0.0 {
        return Err(SimError::InvalidRun(format!("cost must be positive, got {}", cost)));
    }
    let total_weight: u64 = lookup.iter().map(|r| r.weight).sum();
    if total_weight == 0 {
        return Err(SimError::InvalidRun("lookup table has no weight".into()));
    }
    let w = total_weight as f64;
    let payout = |r: &LookupRow| r.payout as f64 / 100.0;

    let mean = lookup.iter().map(|r| r.weight as f64 * payout(r)).sum::<f64>() / w;
    let variance = lookup
        .iter()
        .map(|r| r.weight as f64 * (payout(r) - mean).powi(2))
        .sum::<f64>()
        / w;
    let hits: u64 = lookup.iter().filter(|r| r.payout > 0).map(|r| r.weight).sum();

    let mut sorted: Vec<&LookupRow> = lookup.iter().collect();
    sorted.sort_by_key(|r| r.payout);
    let half = total_weight.div_ceil(2);
    let mut running = 0;
    let mut median = 0.0;
    for row in &sorted {
        running += row.weight;
        if running >= half {
            median = payout(row);
            break;
        }
    }
    let max_payout = sorted.last().map(|r| payout(r)).unwrap_or(0.0);

    let mut base_rtp = None;
    let mut free_rtp = None;
    let mut criteria = BTreeMap::new();
    if let Some(rows) = segmented {
        let weights: HashMap<u64, u64> = lookup.iter().map(|r| (r.id, r.weight)).collect();
        let (mut base, mut free) = (0.0, 0.0);
        let mut sums: BTreeMap<String, (usize, f64)> = BTreeMap::new();
        for row in rows {
            let weight = *weights.get(&row.id).ok_or_else(|| SimError::Lookup {
                line: 0,
                message: format!("segmented id {} missing from lookup table", row.id),
            })? as f64;
            base += weight * row.base as f64 / 100.0;
            free += weight * row.free as f64 / 100.0;
            let entry = sums.entry(row.criteria.clone()).or_default();
            entry.0 += 1;
            entry.1 += (row.base + row.free) as f64 / 100.0;
        }
        base_rtp = Some(base / (w * cost));
        free_rtp = Some(free / (w * cost));
        criteria = sums
            .into_iter()
            .map(|(name, (count, sum))| {
                (
                    name,
                    CriteriaStats {
                        count,
                        mean_payout: sum / count as f64,
                    },
                )
            })
            .collect();
    }

    Ok(RunSummary {
        trials: lookup.len(),
        total_weight,
        cost,
        rtp: mean / cost,
        hit_rate: hits as f64 / w,
        base_rtp,
        free_rtp,
        mean,
        std_dev: variance.sqrt(),
        median,
        max_payout,
        criteria,
    })
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trials:      {} (weight {})", self.trials, self.total_weight)?;
        writeln!(f, "RTP:         {:.4}", self.rtp)?;
        if let (Some(base), Some(free)) = (self.base_rtp, self.free_rtp) {
            writeln!(f, "  base:      {:.4}", base)?;
            writeln!(f, "  feature:   {:.4}", free)?;
        }
        writeln!(f, "Hit rate:    {:.4}", self.hit_rate)?;
        writeln!(f, "Mean:        {:.4}", self.mean)?;
        writeln!(f, "Std dev:     {:.4}", self.std_dev)?;
        writeln!(f, "Median:      {:.2}", self.median)?;
        write!(f, "Max payout:  {:.2}", self.max_payout)?;
        for (name, stats) in &self.criteria {
            write!(
                f,
                "\n  [{}] {} trials, mean payout {:.4}",
                name, stats.count, stats.mean_payout
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table() -> Vec<LookupRow> {
        vec![
            LookupRow { id: 1, weight: 1, payout: 0 },
            LookupRow { id: 2, weight: 1, payout: 0 },
            LookupRow { id: 3, weight: 1, payout: 100 },
            LookupRow { id: 4, weight: 1, payout: 300 },
        ]
    }

    #[test]
    fn test_unit_weights() {
        let s = summarize(&table(), None, 1.0).unwrap();
        assert_relative_eq!(s.rtp, 1.0);
        assert_relative_eq!(s.hit_rate, 0.5);
        assert_relative_eq!(s.mean, 1.0);
        assert_relative_eq!(s.std_dev, (1.5f64).sqrt());
        assert_relative_eq!(s.median, 0.0);
        assert_relative_eq!(s.max_payout, 3.0);
        assert!(s.base_rtp.is_none());
    }

    #[test]
    fn test_weights_and_cost() {
        let mut rows = table();
        rows[3].weight = 5;
        let s = summarize(&rows, None, 2.0).unwrap();
        assert_relative_eq!(s.mean, 16.0 / 8.0);
        assert_relative_eq!(s.rtp, 1.0);
        assert_relative_eq!(s.median, 3.0);
    }

    #[test]
    fn test_segmented_split() {
        let seg = vec![
            SegmentedRow { id: 1, criteria: "0".into(), base: 0, free: 0 },
            SegmentedRow { id: 2, criteria: "0".into(), base: 0, free: 0 },
            SegmentedRow { id: 3, criteria: "basegame".into(), base: 100, free: 0 },
            SegmentedRow { id: 4, criteria: "freegame".into(), base: 50, free: 250 },
        ];
        let s = summarize(&table(), Some(&seg), 1.0).unwrap();
        assert_relative_eq!(s.base_rtp.unwrap(), 0.375);
        assert_relative_eq!(s.free_rtp.unwrap(), 0.625);
        assert_eq!(s.criteria["0"].count, 2);
        assert_relative_eq!(s.criteria["freegame"].mean_payout, 3.0);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(summarize(&table(), None, 0.0).is_err());
        assert!(summarize(&[], None, 1.0).is_err());
    }
}
