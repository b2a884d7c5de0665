//! Rejection bookkeeping

use std::fmt;

/// Why an attempt was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Final payout differs from the distribution's fixed target
    WinCriteria,
    /// The distribution forces the feature but it never started
    FeatureMissing,
    /// The distribution forces the win cap but the trial stopped short of it
    WincapMissing,
    /// The board triggered a feature the distribution does not allow
    FeatureNotExpected,
    /// Nothing paid outside the zero-win bucket
    ZeroPayout,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::WinCriteria => "win criteria not met",
            RejectReason::FeatureMissing => "forced feature not triggered",
            RejectReason::WincapMissing => "forced win cap not reached",
            RejectReason::FeatureNotExpected => "unexpected feature trigger",
            RejectReason::ZeroPayout => "zero payout",
        };
        f.write_str(s)
    }
}

/// Counts discarded attempts of one trial and warns at a fixed interval
#[derive(Debug, Clone)]
pub struct RepeatMonitor {
    warn_every: u64,
    count: u64,
}

impl Default for RepeatMonitor {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl RepeatMonitor {
    pub fn new(warn_every: u64) -> Self {
        Self {
            warn_every: warn_every.max(1),
            count: 0,
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Count one rejection; returns true when this one was reported
    pub fn record(&mut self, trial_id: u64, criteria: &str, reason: RejectReason) -> bool {
        self.count += 1;
        log::trace!("trial {} [{}] rejected: {}", trial_id, criteria, reason);
        if self.count % self.warn_every == 0 {
            log::warn!(
                "High repeat count: trial {} criteria '{}' has {} rejections (last: {})",
                trial_id,
                criteria,
                self.count,
                reason
            );
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warns_on_interval_only() {
        let mut monitor = RepeatMonitor::new(3);
        let reported: Vec<bool> = (0..7)
            .map(|_| monitor.record(1, "wincap", RejectReason::WinCriteria))
            .collect();
        assert_eq!(reported, vec![false, false, true, false, false, true, false]);
        assert_eq!(monitor.count(), 7);
        monitor.reset();
        assert_eq!(monitor.count(), 0);
    }
}
