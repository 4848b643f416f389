//! Five-Algorithm Comparison Report
//!
//! Builds a synthetic five-algorithm result table, runs the full comparison
//! (per-scale averages, rankings, LSCBO-Fixed vs CBO improvement, dispersion)
//! and prints the report as JSON.
//!
//! Run with: cargo run --example five_algorithm_report
//! Set `RUST_LOG=metaheur_results=debug` to see aggregation traces.

use metaheur_results::aggregate::ResultAggregator;
use metaheur_results::config::AggregatorConfig;
use metaheur_results::experiment::{Dataset, ExperimentRecord};
use metaheur_results::report::{ComparisonReport, ReportRequest};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

const SEEDS: [u64; 5] = [42, 123, 456, 789, 1024];
const SCALES: [i64; 4] = [100, 500, 1000, 2000];

/// Relative makespan factor per algorithm (lower is better).
const ALGORITHMS: [(&str, f64); 5] = [
    ("CBO", 1.00),
    ("LSCBO-Fixed", 0.62),
    ("HHO", 0.80),
    ("AOA", 1.10),
    ("GTO", 0.90),
];

fn synthetic_results() -> anyhow::Result<Dataset> {
    let mut rng = StdRng::seed_from_u64(2025);
    let mut records = Vec::new();

    for scale in SCALES {
        for (algorithm, factor) in ALGORITHMS {
            for seed in SEEDS {
                let noise = rng.gen_range(0.9..1.1);
                records.push(
                    ExperimentRecord::builder(algorithm, scale, seed)
                        .metric("Makespan", scale as f64 * 1.5e3 * factor * noise)
                        .metric("LoadBalanceRatio", rng.gen_range(0.6..0.9))
                        .metric("ExecutionTime_ms", scale as f64 * rng.gen_range(3.0..5.0))
                        .build()?,
                );
            }
        }
    }

    Ok(Dataset::new(records)?)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let dataset = synthetic_results()?;
    let aggregator = ResultAggregator::with_config(AggregatorConfig::default());

    let request = ReportRequest::new("Makespan")
        .secondary("LoadBalanceRatio")
        .secondary("ExecutionTime_ms")
        .compare("CBO", "LSCBO-Fixed");
    let report = ComparisonReport::build(&aggregator, &dataset, &request)?;

    println!("{}", report.to_json_pretty()?);
    Ok(())
}
