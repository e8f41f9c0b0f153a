//! LDP Estimate CLI Tool
//!
//! Runs one reporting group through an LDP frequency oracle and prints the
//! bias-corrected histogram estimate as JSON.
//!
//! Usage:
//!   ldp-estimate --protocol oue --epsilon 1.0 --domain-size 10 [values-file]
//!   echo "0 1 1 2" | ldp-estimate --protocol olh --epsilon 2.0 --domain-size 3

use anyhow::{bail, Context, Result};
use clap::Parser;
use ldp_core::{build_oracle, FrequencyEstimate, OracleConfig, OracleParams, Protocol};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ldp-estimate")]
#[command(version = "0.1.0")]
#[command(about = "Estimate a value histogram under local differential privacy", long_about = None)]
struct Cli {
    /// Frequency oracle protocol: oue or olh
    #[arg(short, long, default_value = "oue")]
    protocol: Protocol,

    /// Privacy budget per report
    #[arg(short, long)]
    epsilon: f64,

    /// Number of distinct values in the domain
    #[arg(short, long)]
    domain_size: usize,

    /// Population size for rescaling (defaults to the number of values read)
    #[arg(short, long)]
    user_num: Option<usize>,

    /// Random seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Disable the parallel matching pass
    #[arg(long)]
    no_parallel: bool,

    /// Also print probabilities clamped onto the simplex
    #[arg(long)]
    clamp: bool,

    /// Whitespace-separated values, or '-' / absent for stdin
    input: Option<PathBuf>,
}

/// Output structure for one estimation run
#[derive(serde::Serialize)]
struct EstimateReport {
    protocol: Protocol,
    epsilon: f64,
    domain_size: usize,
    group_user_num: usize,
    user_num: usize,
    p: f64,
    q: f64,
    variance: f64,
    #[serde(flatten)]
    estimate: FrequencyEstimate,
    #[serde(skip_serializing_if = "Option::is_none")]
    clamped_probs: Option<Vec<f64>>,
}

fn read_values(input: Option<&PathBuf>) -> Result<Vec<usize>> {
    let text = match input {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    text.split_whitespace()
        .enumerate()
        .map(|(i, tok)| {
            tok.parse::<usize>()
                .with_context(|| format!("value #{} ('{}') is not a non-negative integer", i, tok))
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let values = read_values(cli.input.as_ref())?;
    let user_num = cli.user_num.unwrap_or(values.len());
    if user_num == 0 {
        bail!("no values read and no --user-num given");
    }

    let params = OracleParams::new(cli.domain_size, cli.epsilon, user_num)?;

    let mut config = OracleConfig::from_env_or_default().with_parallel(!cli.no_parallel);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let mut oracle = build_oracle(cli.protocol, params, config)?;
    oracle.set_group_user_num(values.len())?;
    oracle.perturb_all(&values)?;
    let variance = oracle.variance();
    let estimate = oracle.aggregate()?.clone();

    tracing::info!(
        protocol = %cli.protocol,
        users = values.len(),
        "estimated histogram"
    );

    let report = EstimateReport {
        protocol: cli.protocol,
        epsilon: cli.epsilon,
        domain_size: cli.domain_size,
        group_user_num: values.len(),
        user_num,
        p: oracle.p(),
        q: oracle.q(),
        variance,
        clamped_probs: cli.clamp.then(|| estimate.clamped_probs()),
        estimate,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
