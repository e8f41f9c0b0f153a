//! Oracle runtime configuration
//!
//! Controls randomness seeding and the parallel matching pass. Parameters
//! that affect the privacy guarantee live in [`crate::OracleParams`]; nothing
//! here changes the estimator's expectation.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Default work threshold (domain_size × group_user_num) for going parallel
pub const DEFAULT_MIN_PARALLEL_WORK: usize = 1 << 14;

/// Configuration for an oracle instance
#[derive(Clone, Debug, PartialEq)]
pub struct OracleConfig {
    /// Enable the parallel matching pass (requires the `parallel` feature)
    pub parallel: bool,
    /// Fixed RNG seed; `None` draws from OS entropy
    pub seed: Option<u64>,
    /// Below this many hash evaluations the matching pass stays sequential
    pub min_parallel_work: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig {
            parallel: true,
            seed: None,
            min_parallel_work: DEFAULT_MIN_PARALLEL_WORK,
        }
    }
}

impl OracleConfig {
    /// Enable/disable parallel processing
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Seed the oracle RNG for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the parallel work threshold
    pub fn with_min_parallel_work(mut self, work: usize) -> Self {
        self.min_parallel_work = work;
        self
    }

    /// Load config overrides from environment (best-effort).
    ///
    /// Supported:
    /// - LDP_PARALLEL=true|false|1|0
    /// - LDP_SEED=<u64>
    /// - LDP_MIN_PARALLEL_WORK=<usize>
    pub fn from_env_or_default() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("LDP_PARALLEL") {
            match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => cfg.parallel = true,
                "0" | "false" => cfg.parallel = false,
                other => tracing::warn!("Ignoring malformed LDP_PARALLEL={other}"),
            }
        }

        if let Ok(v) = std::env::var("LDP_SEED") {
            match v.trim().parse::<u64>() {
                Ok(seed) => cfg.seed = Some(seed),
                Err(_) => tracing::warn!("Ignoring malformed LDP_SEED={v}"),
            }
        }

        if let Ok(v) = std::env::var("LDP_MIN_PARALLEL_WORK") {
            match v.trim().parse::<usize>() {
                Ok(work) => cfg.min_parallel_work = work,
                Err(_) => tracing::warn!("Ignoring malformed LDP_MIN_PARALLEL_WORK={v}"),
            }
        }

        cfg
    }

    /// Build the oracle RNG
    pub(crate) fn rng(&self) -> ChaCha20Rng {
        match self.seed {
            Some(s) => ChaCha20Rng::seed_from_u64(s),
            None => ChaCha20Rng::from_entropy(),
        }
    }

    /// Whether a matching pass of `work` hash evaluations should use rayon
    pub(crate) fn use_parallel(&self, work: usize) -> bool {
        cfg!(feature = "parallel") && self.parallel && work >= self.min_parallel_work
    }
}
