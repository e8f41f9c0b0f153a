//! Optimized Local Hashing (OLH)
//!
//! Each user hashes their value into `{0, …, g−1}` with a private random
//! seed, then applies randomized response over that small domain:
//!
//! ```text
//! g = round(e^ε) + 1
//! p = e^ε / (e^ε + g − 1)     report the true hash
//! q = 1 / g                   a foreign value hashes onto the report
//! ```
//!
//! The aggregator re-hashes every candidate value under every user's seed
//! and counts matches against the reports. That matching pass costs
//! `O(domain_size × group_user_num)` hash evaluations; it is split across
//! candidate values with rayon when the `parallel` feature is enabled.

use rand::Rng;
use rand_chacha::ChaCha20Rng;

use crate::estimator::{BiasCorrection, FrequencyEstimate};
use crate::hash::{domain_hash, draw_seeds};
use crate::oracle::{FrequencyOracle, Protocol, ReportLedger};
use crate::{LdpError, OracleConfig, OracleParams, Result};

/// Largest accepted hash domain
pub const MAX_HASH_DOMAIN: usize = u32::MAX as usize;

/// Hash domain size `g = round(e^ε) + 1`
pub fn hash_domain_size(epsilon: f64) -> Result<usize> {
    let rounded = epsilon.exp().round();
    if !rounded.is_finite() || rounded >= MAX_HASH_DOMAIN as f64 {
        return Err(LdpError::Parameter(format!(
            "epsilon {} gives a hash domain above {}",
            epsilon, MAX_HASH_DOMAIN
        )));
    }
    let g = rounded as usize + 1;
    if g <= 1 {
        return Err(LdpError::Parameter(format!(
            "degenerate hash domain g = {} for epsilon {}",
            g, epsilon
        )));
    }
    Ok(g)
}

/// OLH frequency oracle for one reporting group
pub struct OlhOracle {
    params: OracleParams,
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    config: OracleConfig,
    g: usize,
    p: f64,
    q: f64,
    /// Occurrences of each true value, bookkeeping only
    real_counts: Vec<u64>,
    /// True value of each user, in report order
    user_values: Vec<usize>,
    /// Perturbed hash reports, filled by aggregation
    reported: Vec<usize>,
    ledger: ReportLedger,
    rng: ChaCha20Rng,
}

impl OlhOracle {
    /// Create an oracle with configuration from the environment
    pub fn new(params: OracleParams) -> Result<Self> {
        Self::with_config(params, OracleConfig::from_env_or_default())
    }

    /// Create an oracle with a custom configuration
    pub fn with_config(params: OracleParams, config: OracleConfig) -> Result<Self> {
        params.validate()?;

        let ee = params.epsilon.exp();
        let g = hash_domain_size(params.epsilon)?;
        let p = ee / (ee + g as f64 - 1.0);
        let q = 1.0 / g as f64;

        tracing::debug!(
            protocol = "olh",
            domain_size = params.domain_size,
            epsilon = params.epsilon,
            g,
            p,
            q,
            "constructed frequency oracle"
        );

        let rng = config.rng();
        Ok(OlhOracle {
            params,
            config,
            g,
            p,
            q,
            real_counts: vec![0; params.domain_size],
            user_values: Vec::new(),
            reported: Vec::new(),
            ledger: ReportLedger::new(params.domain_size),
            rng,
        })
    }

    /// Hash domain size
    pub fn g(&self) -> usize {
        self.g
    }

    /// Per-value tally of the true values received
    pub fn real_counts(&self) -> &[u64] {
        &self.real_counts
    }

    /// Each user's perturbed hash report; empty before aggregation
    pub fn reported_values(&self) -> &[usize] {
        &self.reported
    }

    /// Randomized response over `{0, …, g−1}` around `hashed`
    fn randomize(&mut self, hashed: usize) -> usize {
        if self.rng.gen::<f64>() < self.p {
            return hashed;
        }
        // Uniform over the g−1 values other than `hashed`
        let other = self.rng.gen_range(0..self.g - 1);
        if other >= hashed {
            other + 1
        } else {
            other
        }
    }

    /// Count, for each candidate value, the users whose report it hashes onto
    fn match_counts(&self, seeds: &[u64]) -> Vec<f64> {
        let g = self.g;
        let reported = &self.reported;
        let count_for = |candidate: usize| -> f64 {
            seeds
                .iter()
                .zip(reported.iter())
                .filter(|&(&seed, &report)| domain_hash(candidate, seed, g) == report)
                .count() as f64
        };

        #[cfg(feature = "parallel")]
        {
            let work = self.params.domain_size.saturating_mul(seeds.len());
            if self.config.use_parallel(work) {
                use rayon::prelude::*;

                return (0..self.params.domain_size)
                    .into_par_iter()
                    .map(count_for)
                    .collect();
            }
        }

        (0..self.params.domain_size).map(count_for).collect()
    }
}

impl FrequencyOracle for OlhOracle {
    fn protocol(&self) -> Protocol {
        Protocol::Olh
    }

    fn params(&self) -> &OracleParams {
        &self.params
    }

    fn p(&self) -> f64 {
        self.p
    }

    fn q(&self) -> f64 {
        self.q
    }

    fn set_group_user_num(&mut self, group_user_num: usize) -> Result<()> {
        self.ledger.set_group_user_num(group_user_num)
    }

    fn group_user_num(&self) -> Option<usize> {
        self.ledger.group_user_num()
    }

    fn reports_received(&self) -> usize {
        self.ledger.received()
    }

    fn perturb(&mut self, real_value: usize) -> Result<()> {
        self.ledger.admit(real_value, self.params.domain_size)?;
        self.real_counts[real_value] += 1;
        self.user_values.push(real_value);
        Ok(())
    }

    fn aggregate(&mut self) -> Result<&FrequencyEstimate> {
        let n = self.ledger.ready(Protocol::Olh)?;
        let start = std::time::Instant::now();

        // Seeds live only for this call: perturbation and matching share them
        let seeds = draw_seeds(&mut self.rng, n);

        let mut reported = Vec::with_capacity(n);
        for i in 0..n {
            let hashed = domain_hash(self.user_values[i], seeds[i], self.g);
            reported.push(self.randomize(hashed));
        }
        self.reported = reported;

        let raw = self.match_counts(&seeds);

        let correction = BiasCorrection::for_olh(self.p, self.g, n);
        let estimate = FrequencyEstimate::from_raw(&raw, correction, n, self.params.user_num);

        tracing::debug!(
            protocol = "olh",
            group_user_num = n,
            g = self.g,
            elapsed_us = start.elapsed().as_micros() as u64,
            "aggregated reports"
        );

        Ok(self.ledger.finish(estimate))
    }

    fn estimate(&self) -> &FrequencyEstimate {
        self.ledger.estimate()
    }

    fn is_aggregated(&self) -> bool {
        self.ledger.is_aggregated()
    }
}
