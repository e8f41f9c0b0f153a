//! Bias-corrected frequency estimation
//!
//! Both oracles turn a raw per-value tally into an unbiased count with the
//! same affine map `a·raw − b`, then expose two views of the result.
//!
//! # Unbiasedness
//!
//! If a user holding value `v` supports `v` with probability `p` and a user
//! holding any other value supports `v` with probability `q`, the expected
//! raw tally for `v` with true count `c` among `n` users is
//!
//! ```text
//! E[raw] = c·p + (n − c)·q = c·(p − q) + n·q
//! ```
//!
//! so `(raw − n·q) / (p − q)` has expectation `c`. OUE plugs in its own
//! `(p, q)`; OLH uses `q = 1/g`, the chance that a random hash collides.

use serde::{Deserialize, Serialize};

/// Affine bias correction `estimate = a·raw − b`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasCorrection {
    pub a: f64,
    pub b: f64,
}

impl BiasCorrection {
    /// Correction for support probabilities `p` (own value) and `q` (other values)
    pub fn from_support(p: f64, q: f64, group_user_num: usize) -> Self {
        let denom = p - q;
        BiasCorrection {
            a: 1.0 / denom,
            b: group_user_num as f64 * q / denom,
        }
    }

    /// OUE correction: `a = 1/(p−q)`, `b = n·q/(p−q)`
    pub fn for_oue(p: f64, q: f64, group_user_num: usize) -> Self {
        Self::from_support(p, q, group_user_num)
    }

    /// OLH correction: `a = g/(p·g−1)`, `b = n/(p·g−1)`
    pub fn for_olh(p: f64, g: usize, group_user_num: usize) -> Self {
        let g = g as f64;
        let denom = p * g - 1.0;
        BiasCorrection {
            a: g / denom,
            b: group_user_num as f64 / denom,
        }
    }

    #[inline]
    pub fn apply(&self, raw: f64) -> f64 {
        self.a * raw - self.b
    }
}

/// Theoretical variance of one estimated count over `group_user_num` reports
///
/// `n·q(1−q)/(p−q)²`, the variance contributed by users not holding the value.
pub fn count_variance(p: f64, q: f64, group_user_num: usize) -> f64 {
    group_user_num as f64 * q * (1.0 - q) / ((p - q) * (p - q))
}

/// Aggregation output of one oracle instance
///
/// Entries may be negative or exceed the population; that is sampling noise,
/// not corruption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEstimate {
    /// Estimated counts rescaled to `user_num`
    pub counts: Vec<f64>,
    /// Estimated probabilities (count / group_user_num)
    pub probs: Vec<f64>,
}

impl FrequencyEstimate {
    /// Zero-filled placeholder, not a valid result
    pub fn zeroed(domain_size: usize) -> Self {
        FrequencyEstimate {
            counts: vec![0.0; domain_size],
            probs: vec![0.0; domain_size],
        }
    }

    /// De-bias raw tallies and derive both output views.
    ///
    /// An empty group (`group_user_num == 0`) yields all zeros.
    pub fn from_raw(
        raw: &[f64],
        correction: BiasCorrection,
        group_user_num: usize,
        user_num: usize,
    ) -> Self {
        if group_user_num == 0 {
            return Self::zeroed(raw.len());
        }

        let n = group_user_num as f64;
        let scale = user_num as f64;

        let probs: Vec<f64> = raw.iter().map(|&r| correction.apply(r) / n).collect();
        let counts = probs.iter().map(|p| p * scale).collect();

        FrequencyEstimate { counts, probs }
    }

    pub fn domain_size(&self) -> usize {
        self.counts.len()
    }

    /// Sum of estimated counts
    pub fn total_count(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Probabilities projected onto the simplex for display.
    ///
    /// Negative entries are clamped to zero and the rest renormalised to sum
    /// to one. An all-non-positive estimate stays all zero.
    pub fn clamped_probs(&self) -> Vec<f64> {
        let clamped: Vec<f64> = self.probs.iter().map(|p| p.max(0.0)).collect();
        let total: f64 = clamped.iter().sum();
        if total <= 0.0 {
            return vec![0.0; clamped.len()];
        }
        clamped.into_iter().map(|p| p / total).collect()
    }
}
