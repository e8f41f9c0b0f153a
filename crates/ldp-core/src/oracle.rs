//! Frequency oracle contract
//!
//! Every protocol follows the same single-use lifecycle:
//! `set_group_user_num` → `perturb` × n → `aggregate` once.
//! The bookkeeping that enforces it lives in [`ReportLedger`] so both
//! oracles reject misuse identically.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::estimator::{count_variance, FrequencyEstimate};
use crate::{LdpError, OlhOracle, OracleConfig, OracleParams, OueOracle, Result};

/// Supported LDP frequency oracle protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Optimized Unary Encoding
    Oue,
    /// Optimized Local Hashing
    Olh,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Oue => write!(f, "oue"),
            Protocol::Olh => write!(f, "olh"),
        }
    }
}

impl FromStr for Protocol {
    type Err = LdpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oue" => Ok(Protocol::Oue),
            "olh" => Ok(Protocol::Olh),
            other => Err(LdpError::Parameter(format!("unknown protocol '{}'", other))),
        }
    }
}

/// A local differential privacy frequency oracle for one reporting group
pub trait FrequencyOracle: Send {
    fn protocol(&self) -> Protocol;

    fn params(&self) -> &OracleParams;

    fn domain_size(&self) -> usize {
        self.params().domain_size
    }

    fn epsilon(&self) -> f64 {
        self.params().epsilon
    }

    fn user_num(&self) -> usize {
        self.params().user_num
    }

    /// Probability that a report supports the user's true value
    fn p(&self) -> f64;

    /// Probability that a report supports any one other value
    fn q(&self) -> f64;

    /// Declare how many users report into this instance (once)
    fn set_group_user_num(&mut self, group_user_num: usize) -> Result<()>;

    fn group_user_num(&self) -> Option<usize>;

    fn reports_received(&self) -> usize;

    /// Accept one user's true value
    fn perturb(&mut self, real_value: usize) -> Result<()>;

    /// Accept a batch of users' values, stopping at the first rejected one
    fn perturb_all(&mut self, real_values: &[usize]) -> Result<()> {
        for &value in real_values {
            self.perturb(value)?;
        }
        Ok(())
    }

    /// Perturb and de-bias the whole group. Valid exactly once, after all
    /// declared reports arrived.
    fn aggregate(&mut self) -> Result<&FrequencyEstimate>;

    /// Current estimate; zero-filled until `aggregate` succeeds
    fn estimate(&self) -> &FrequencyEstimate;

    fn is_aggregated(&self) -> bool;

    fn aggregated_count(&self) -> &[f64] {
        &self.estimate().counts
    }

    fn aggregated_prob(&self) -> &[f64] {
        &self.estimate().probs
    }

    /// Theoretical variance of each estimated count (before rescaling)
    fn variance(&self) -> f64 {
        count_variance(self.p(), self.q(), self.group_user_num().unwrap_or(0))
    }
}

/// Build a boxed oracle for `protocol`
pub fn build_oracle(
    protocol: Protocol,
    params: OracleParams,
    config: OracleConfig,
) -> Result<Box<dyn FrequencyOracle>> {
    Ok(match protocol {
        Protocol::Oue => Box::new(OueOracle::with_config(params, config)?),
        Protocol::Olh => Box::new(OlhOracle::with_config(params, config)?),
    })
}

/// Lifecycle bookkeeping shared by all oracles
#[derive(Debug, Clone)]
pub(crate) struct ReportLedger {
    group_user_num: Option<usize>,
    received: usize,
    aggregated: bool,
    estimate: FrequencyEstimate,
}

impl ReportLedger {
    pub(crate) fn new(domain_size: usize) -> Self {
        ReportLedger {
            group_user_num: None,
            received: 0,
            aggregated: false,
            estimate: FrequencyEstimate::zeroed(domain_size),
        }
    }

    pub(crate) fn group_user_num(&self) -> Option<usize> {
        self.group_user_num
    }

    pub(crate) fn received(&self) -> usize {
        self.received
    }

    pub(crate) fn is_aggregated(&self) -> bool {
        self.aggregated
    }

    pub(crate) fn estimate(&self) -> &FrequencyEstimate {
        &self.estimate
    }

    pub(crate) fn set_group_user_num(&mut self, group_user_num: usize) -> Result<()> {
        if self.aggregated {
            return Err(LdpError::State(
                "group size cannot change after aggregation".to_string(),
            ));
        }
        if let Some(existing) = self.group_user_num {
            return Err(LdpError::State(format!(
                "group size already set to {}",
                existing
            )));
        }
        if self.received > group_user_num {
            return Err(LdpError::State(format!(
                "{} reports already received, more than group size {}",
                self.received, group_user_num
            )));
        }
        self.group_user_num = Some(group_user_num);
        Ok(())
    }

    /// Validate and count one incoming report
    pub(crate) fn admit(&mut self, value: usize, domain_size: usize) -> Result<()> {
        if value >= domain_size {
            return Err(LdpError::Domain { value, domain_size });
        }
        if self.aggregated {
            return Err(LdpError::State(
                "perturb called after aggregation".to_string(),
            ));
        }
        if let Some(n) = self.group_user_num {
            if self.received >= n {
                return Err(LdpError::State(format!(
                    "group of {} users already complete",
                    n
                )));
            }
        }
        self.received += 1;
        Ok(())
    }

    /// Check aggregation preconditions and return the group size
    pub(crate) fn ready(&self, protocol: Protocol) -> Result<usize> {
        if self.aggregated {
            return Err(LdpError::State(format!(
                "{} oracle already aggregated",
                protocol
            )));
        }
        let n = match self.group_user_num {
            Some(n) => n,
            None => {
                tracing::error!(%protocol, "aggregate called before group size was set");
                return Err(LdpError::State("group size was never set".to_string()));
            }
        };
        if self.received != n {
            tracing::error!(
                %protocol,
                expected = n,
                received = self.received,
                "aggregate called with wrong report count"
            );
            return Err(LdpError::State(format!(
                "expected {} reports, received {}",
                n, self.received
            )));
        }
        Ok(n)
    }

    pub(crate) fn finish(&mut self, estimate: FrequencyEstimate) -> &FrequencyEstimate {
        self.aggregated = true;
        self.estimate = estimate;
        &self.estimate
    }
}
