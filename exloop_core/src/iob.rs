//! Insulin-on-board estimate from six cumulative look-back sums.
//!
//! Each look-back bucket is 30 minutes wide. Insulin delivered in older
//! buckets is weighted down linearly, approximating a left Riemann sum over a
//! decaying insulin activity curve.

use crate::util::hours;
use exloop_traits::BoxError;
use std::time::Duration;

/// Number of look-back horizons queried per cycle.
pub const HORIZON_COUNT: usize = 6;

/// Look-back horizons in hours, shortest first.
pub const HORIZONS_H: [f64; HORIZON_COUNT] = [0.5, 1.0, 1.5, 2.0, 2.5, 3.0];

/// Weight applied to the insulin delivered within each 30-minute bucket.
pub const BUCKET_WEIGHTS: [f64; HORIZON_COUNT] =
    [1.0, 5.0 / 6.0, 2.0 / 3.0, 1.0 / 2.0, 1.0 / 3.0, 1.0 / 6.0];

/// Look-back duration for horizon `idx`.
#[inline]
pub fn horizon(idx: usize) -> Duration {
    hours(HORIZONS_H[idx])
}

/// Cumulative insulin sums ordered like `HORIZONS_H`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InsulinSums(pub [f64; HORIZON_COUNT]);

impl InsulinSums {
    /// Build from per-horizon fetch results, substituting `0.0` for every
    /// failed, missing or non-finite value.
    pub fn from_fetches(fetches: [Option<Result<f64, BoxError>>; HORIZON_COUNT]) -> Self {
        let mut sums = [0.0; HORIZON_COUNT];
        for (idx, fetch) in fetches.into_iter().enumerate() {
            let hours = HORIZONS_H[idx];
            sums[idx] = match fetch {
                Some(Ok(v)) if v.is_finite() => v,
                Some(Ok(v)) => {
                    tracing::warn!(hours, value = v, "non-finite insulin sum; using 0.0");
                    0.0
                }
                Some(Err(e)) => {
                    tracing::warn!(hours, error = %e, "insulin sum fetch failed; using 0.0");
                    0.0
                }
                None => {
                    tracing::warn!(hours, "insulin sum never arrived; using 0.0");
                    0.0
                }
            };
        }
        Self(sums)
    }

    pub fn get(&self, idx: usize) -> f64 {
        self.0[idx]
    }
}

/// Weighted insulin-on-board in units.
///
/// `s(0.5) + 5/6 (s(1) - s(0.5)) + ... + 1/6 (s(3) - s(2.5))`
pub fn estimate_iob(sums: &InsulinSums) -> f64 {
    let mut prev = 0.0;
    let mut iob = 0.0;
    for (s, w) in sums.0.iter().zip(BUCKET_WEIGHTS) {
        iob += w * (s - prev);
        prev = *s;
    }
    iob
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_three_and_a_half() {
        let total: f64 = BUCKET_WEIGHTS.iter().sum();
        assert!((total - 3.5).abs() < 1e-12);
    }

    #[test]
    fn horizons_are_half_hour_steps() {
        assert_eq!(horizon(0), Duration::from_secs(1800));
        assert_eq!(horizon(5), Duration::from_secs(3 * 3600));
    }
}
