//! Optimized Unary Encoding (OUE)
//!
//! Each user's value is one-hot encoded; the 1-bit is kept with probability
//! `p = 1/2` and every 0-bit turns into a 1 with probability
//! `q = 1/(e^ε + 1)`. This choice minimises estimator variance for a given ε.
//!
//! # Aggregate perturbation
//!
//! For value `v` with true count `c_v` among `n` users, the perturbed column
//! sum is a sum of `c_v` Bernoulli(p) and `n − c_v` Bernoulli(q) independent
//! flips, i.e. `Binomial(c_v, p) + Binomial(n − c_v, q)`. Aggregation draws
//! those two Binomials directly instead of flipping `n · domain_size` bits.

use rand_chacha::ChaCha20Rng;
use rand_distr::{Binomial, Distribution};

use crate::estimator::{BiasCorrection, FrequencyEstimate};
use crate::oracle::{FrequencyOracle, Protocol, ReportLedger};
use crate::{LdpError, OracleConfig, OracleParams, Result};

/// Keep-probability of the true bit
pub const OUE_P: f64 = 0.5;

/// OUE frequency oracle for one reporting group
pub struct OueOracle {
    params: OracleParams,
    p: f64,
    q: f64,
    /// Occurrences of each true value fed in so far
    real_counts: Vec<u64>,
    ledger: ReportLedger,
    rng: ChaCha20Rng,
}

impl OueOracle {
    /// Create an oracle with configuration from the environment
    pub fn new(params: OracleParams) -> Result<Self> {
        Self::with_config(params, OracleConfig::from_env_or_default())
    }

    /// Create an oracle with a custom configuration
    pub fn with_config(params: OracleParams, config: OracleConfig) -> Result<Self> {
        params.validate()?;

        let ee = params.epsilon.exp();
        if !ee.is_finite() {
            return Err(LdpError::Parameter(format!(
                "epsilon {} overflows e^epsilon",
                params.epsilon
            )));
        }

        let p = OUE_P;
        let q = 1.0 / (ee + 1.0);

        tracing::debug!(
            protocol = "oue",
            domain_size = params.domain_size,
            epsilon = params.epsilon,
            p,
            q,
            "constructed frequency oracle"
        );

        Ok(OueOracle {
            params,
            p,
            q,
            real_counts: vec![0; params.domain_size],
            ledger: ReportLedger::new(params.domain_size),
            rng: config.rng(),
        })
    }

    /// Per-value tally of the true values received
    pub fn real_counts(&self) -> &[u64] {
        &self.real_counts
    }

    fn binomial(&mut self, trials: u64, prob: f64) -> Result<u64> {
        let dist = Binomial::new(trials, prob)
            .map_err(|e| LdpError::Parameter(format!("binomial({}, {}): {}", trials, prob, e)))?;
        Ok(dist.sample(&mut self.rng))
    }
}

impl FrequencyOracle for OueOracle {
    fn protocol(&self) -> Protocol {
        Protocol::Oue
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
        Ok(())
    }

    fn aggregate(&mut self) -> Result<&FrequencyEstimate> {
        let n = self.ledger.ready(Protocol::Oue)?;
        let start = std::time::Instant::now();

        let mut raw = Vec::with_capacity(self.params.domain_size);
        for v in 0..self.params.domain_size {
            let ones = self.real_counts[v];
            let zeros = n as u64 - ones;
            let est_true = self.binomial(ones, self.p)?;
            let est_false = self.binomial(zeros, self.q)?;
            raw.push((est_true + est_false) as f64);
        }

        let correction = BiasCorrection::for_oue(self.p, self.q, n);
        let estimate = FrequencyEstimate::from_raw(&raw, correction, n, self.params.user_num);

        tracing::debug!(
            protocol = "oue",
            group_user_num = n,
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
