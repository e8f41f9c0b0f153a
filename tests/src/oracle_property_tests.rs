//! Property-Based Tests for LDP Frequency Oracles
//!
//! These tests verify the mathematical properties of the oracles:
//! - Probability parameters are well-formed for every ε
//! - Bias correction maps expected tallies back to true counts
//! - Report-count and domain checks hold for arbitrary inputs
//! - Estimated counts have the predicted mean and variance
//!
//! Uses proptest for randomized property testing with shrinking.

use ldp_core::{
    build_oracle, FrequencyOracle, OracleConfig, OracleParams, Protocol,
};

/// Compute sample mean
pub fn compute_mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Compute sample variance
pub fn compute_variance(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let mean = compute_mean(samples);
    let sum_sq: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum();
    sum_sq / (samples.len() - 1) as f64
}

/// Build a seeded oracle, feed `values` and aggregate
pub fn estimate_counts(
    protocol: Protocol,
    domain_size: usize,
    epsilon: f64,
    values: &[usize],
    seed: u64,
) -> Vec<f64> {
    let params = OracleParams::new(domain_size, epsilon, values.len().max(1))
        .expect("valid params");
    let mut oracle = build_oracle(protocol, params, OracleConfig::default().with_seed(seed))
        .expect("oracle");
    oracle.set_group_user_num(values.len()).expect("group size");
    oracle.perturb_all(values).expect("values in domain");
    oracle.aggregate().expect("aggregate").counts.clone()
}

#[cfg(test)]
mod parameter_tests {
    use super::*;
    use ldp_core::olh::hash_domain_size;
    use ldp_core::{OlhOracle, OueOracle};
    use proptest::prelude::*;

    proptest! {
        /// OUE: 0 < q < p ≤ 1 for every ε
        #[test]
        fn oue_probabilities_ordered(epsilon in 0.001..20.0f64) {
            let params = OracleParams::new(4, epsilon, 10).unwrap();
            let oracle = OueOracle::with_config(params, OracleConfig::default()).unwrap();
            prop_assert!(oracle.q() > 0.0);
            prop_assert!(oracle.q() < oracle.p());
            prop_assert!(oracle.p() <= 1.0);
        }

        /// OLH: g ≥ 2 and 0 < q < p < 1 for every ε
        #[test]
        fn olh_probabilities_ordered(epsilon in 0.001..20.0f64) {
            let params = OracleParams::new(4, epsilon, 10).unwrap();
            let oracle = OlhOracle::with_config(params, OracleConfig::default()).unwrap();
            prop_assert!(oracle.g() >= 2);
            prop_assert!(oracle.q() > 0.0);
            prop_assert!(oracle.q() < oracle.p());
            prop_assert!(oracle.p() < 1.0);
            prop_assert_eq!(oracle.g(), hash_domain_size(epsilon).unwrap());
        }

        /// Noise never grows as ε grows
        #[test]
        fn variance_monotone_in_epsilon(
            eps_low in 0.05..5.0f64,
            delta in 0.01..3.0f64,
            n in 1usize..10_000
        ) {
            let eps_high = eps_low + delta;
            let variance = |eps: f64| {
                let params = OracleParams::new(4, eps, n).unwrap();
                let mut oracle = OueOracle::with_config(params, OracleConfig::default()).unwrap();
                oracle.set_group_user_num(n).unwrap();
                oracle.variance()
            };
            prop_assert!(variance(eps_high) < variance(eps_low));
        }
    }
}

#[cfg(test)]
mod estimator_tests {
    use ldp_core::estimator::count_variance;
    use ldp_core::BiasCorrection;
    use proptest::prelude::*;

    proptest! {
        /// a·E[raw] − b recovers the true count
        #[test]
        fn correction_inverts_expectation(
            q in 0.01..0.45f64,
            gap in 0.05..0.5f64,
            n in 1usize..100_000,
            frac in 0.0..1.0f64
        ) {
            let p = (q + gap).min(0.99);
            let c = (n as f64 * frac).floor();
            let expected_raw = c * p + (n as f64 - c) * q;
            let corr = BiasCorrection::from_support(p, q, n);
            prop_assert!((corr.apply(expected_raw) - c).abs() < 1e-6 * n as f64);
        }

        /// OLH's a = g/(pg−1) form equals the support form with q = 1/g
        #[test]
        fn olh_correction_is_support_form(epsilon in 0.05..8.0f64, n in 0usize..50_000) {
            let ee = epsilon.exp();
            let g = ee.round() as usize + 1;
            let p = ee / (ee + g as f64 - 1.0);
            let olh = BiasCorrection::for_olh(p, g, n);
            let support = BiasCorrection::from_support(p, 1.0 / g as f64, n);
            prop_assert!((olh.a - support.a).abs() < 1e-9 * support.a.abs().max(1.0));
            prop_assert!((olh.b - support.b).abs() < 1e-9 * support.b.abs().max(1.0));
        }

        /// Variance is non-negative and linear in n
        #[test]
        fn variance_linear_in_group(q in 0.01..0.45f64, n in 1usize..10_000) {
            let v1 = count_variance(0.5, q, n);
            let v2 = count_variance(0.5, q, 2 * n);
            prop_assert!(v1 >= 0.0);
            prop_assert!((v2 - 2.0 * v1).abs() < 1e-9 * v2.max(1.0));
        }
    }
}

#[cfg(test)]
mod lifecycle_tests {
    use super::*;
    use ldp_core::LdpError;
    use proptest::prelude::*;

    fn protocol_strategy() -> impl Strategy<Value = Protocol> {
        prop_oneof![Just(Protocol::Oue), Just(Protocol::Olh)]
    }

    proptest! {
        /// Out-of-domain values are always rejected and never counted
        #[test]
        fn out_of_domain_rejected(
            protocol in protocol_strategy(),
            domain_size in 1usize..50,
            excess in 0usize..1000
        ) {
            let params = OracleParams::new(domain_size, 1.0, 10).unwrap();
            let mut oracle = build_oracle(protocol, params, OracleConfig::default()).unwrap();
            oracle.set_group_user_num(1).unwrap();
            let value = domain_size + excess;
            prop_assert_eq!(
                oracle.perturb(value),
                Err(LdpError::Domain { value, domain_size })
            );
            prop_assert_eq!(oracle.reports_received(), 0);
        }

        /// Aggregation succeeds iff every declared report arrived
        #[test]
        fn aggregate_requires_exact_count(
            protocol in protocol_strategy(),
            declared in 0usize..40,
            sent in 0usize..40
        ) {
            let params = OracleParams::new(5, 1.0, 100).unwrap();
            let mut oracle = build_oracle(
                protocol,
                params,
                OracleConfig::default().with_seed(declared as u64),
            ).unwrap();
            oracle.set_group_user_num(declared).unwrap();

            let mut accepted = 0;
            for i in 0..sent {
                if oracle.perturb(i % 5).is_ok() {
                    accepted += 1;
                }
            }
            prop_assert_eq!(accepted, sent.min(declared));

            let result = oracle.aggregate().map(|e| e.counts.len());
            if sent >= declared {
                prop_assert_eq!(result, Ok(5));
            } else {
                prop_assert!(matches!(result, Err(LdpError::State(_))));
            }
        }

        /// Counts are probabilities rescaled by the population size
        #[test]
        fn counts_are_scaled_probs(
            protocol in protocol_strategy(),
            values in proptest::collection::vec(0usize..6, 0..80),
            user_num in 1usize..1_000_000,
            seed in any::<u64>()
        ) {
            let params = OracleParams::new(6, 1.0, user_num).unwrap();
            let mut oracle = build_oracle(
                protocol,
                params,
                OracleConfig::default().with_seed(seed),
            ).unwrap();
            oracle.set_group_user_num(values.len()).unwrap();
            oracle.perturb_all(&values).unwrap();
            let estimate = oracle.aggregate().unwrap();

            for (count, prob) in estimate.counts.iter().zip(&estimate.probs) {
                prop_assert!(count.is_finite());
                prop_assert!((count - prob * user_num as f64).abs() < 1e-6 * user_num as f64);
            }
            if values.is_empty() {
                prop_assert!(estimate.counts.iter().all(|&c| c == 0.0));
            }
        }
    }
}

#[cfg(test)]
mod distribution_tests {
    use super::*;

    fn skewed_population(n: usize) -> Vec<usize> {
        // 60% value 0, 30% value 1, 10% value 2
        (0..n)
            .map(|i| match i % 10 {
                0..=5 => 0,
                6..=8 => 1,
                _ => 2,
            })
            .collect()
    }

    #[test]
    fn test_mean_tracks_skewed_histogram() {
        let values = skewed_population(2_000);
        let truth = [1_200.0, 600.0, 200.0];

        for protocol in [Protocol::Oue, Protocol::Olh] {
            let runs: Vec<Vec<f64>> = (0..100)
                .map(|seed| estimate_counts(protocol, 3, 1.0, &values, seed))
                .collect();

            for (v, &t) in truth.iter().enumerate() {
                let samples: Vec<f64> = runs.iter().map(|r| r[v]).collect();
                let mean = compute_mean(&samples);
                let se = (compute_variance(&samples) / samples.len() as f64).sqrt();

                // Within 5 standard errors
                assert!(
                    (mean - t).abs() < 5.0 * se,
                    "{}: value {} mean {} vs truth {} (SE = {})",
                    protocol,
                    v,
                    mean,
                    t,
                    se
                );
            }
        }
    }

    #[test]
    fn test_empty_values_stay_near_zero() {
        // A value nobody holds should average out to zero
        let values = vec![0usize; 1_000];
        let samples: Vec<f64> = (0..200)
            .map(|seed| estimate_counts(Protocol::Oue, 4, 2.0, &values, seed)[3])
            .collect();
        let mean = compute_mean(&samples);
        let se = (compute_variance(&samples) / samples.len() as f64).sqrt();
        assert!(mean.abs() < 5.0 * se, "mean {} (SE = {})", mean, se);
    }

    #[test]
    fn test_noise_can_go_negative() {
        // Negative estimates are expected noise, not errors
        let values = vec![0usize; 50];
        let any_negative = (0..200)
            .map(|seed| estimate_counts(Protocol::Oue, 4, 0.5, &values, seed))
            .any(|counts| counts[1..].iter().any(|&c| c < 0.0));
        assert!(any_negative);
    }
}
