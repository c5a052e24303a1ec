use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use monte_carlo_pi::{
    measure, RemainderPolicy, SequentialEstimator, SimulationReport, Strategy, DEFAULT_TOTAL_SAMPLES,
};
use monte_carlo_pi_async::{measure_async, AsyncParallelEstimator};

/// Monte Carlo Pi estimation with workers on the tokio blocking pool
#[derive(Parser, Debug)]
#[command(name = "monte_carlo_pi_async")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Which strategy to run
    #[arg(short, long, value_enum, default_value_t = StrategyArg::Both)]
    strategy: StrategyArg,

    /// Number of points to sample
    #[arg(short = 'n', long, env = "PI_SAMPLES", default_value_t = DEFAULT_TOTAL_SAMPLES)]
    samples: u64,

    /// Blocking tasks to split the samples across (defaults to the number of logical cores)
    #[arg(short, long, env = "PI_WORKERS")]
    workers: Option<u32>,

    /// Master seed for reproducible runs
    #[arg(long, env = "PI_SEED")]
    seed: Option<u64>,

    /// Spread leftover samples over the tasks instead of dropping them
    #[arg(long)]
    distribute_remainder: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Sequential,
    Parallel,
    Both,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let mut parallel = match cli.workers {
        Some(workers) => AsyncParallelEstimator::new(workers),
        None => AsyncParallelEstimator::with_host_parallelism(),
    };
    if let Some(seed) = cli.seed {
        parallel = parallel.with_seed(seed);
    }
    if cli.distribute_remainder {
        parallel = parallel.with_remainder_policy(RemainderPolicy::Distribute);
    }
    let workers = parallel.workers();
    tracing::debug!(samples = cli.samples, workers, seed = ?cli.seed, "starting simulation");

    let mut sequential = None;

    if cli.strategy != StrategyArg::Parallel {
        let mut estimator = SequentialEstimator::new();
        if let Some(seed) = cli.seed {
            estimator = estimator.with_seed(seed);
        }
        let samples = cli.samples;
        // The sequential loop is CPU-bound; keep it off the async workers
        let (estimate, metrics) = tokio::task::spawn_blocking(move || measure(|| estimator.estimate(samples)))
            .await
            .context("sequential task did not complete")?
            .context("sequential run failed")?;

        let report = SimulationReport {
            strategy: Strategy::Sequential,
            requested: cli.samples,
            estimate,
            metrics,
        };
        println!("Monte Carlo Simulation to Estimate Pi (sequential)");
        println!("{}", report);
        println!();
        tracing::info!(
            strategy = "sequential",
            pi = estimate.value(),
            elapsed_ms = metrics.elapsed_ms,
            cpu_ms = metrics.cpu_ms,
            "run complete"
        );
        sequential = Some(report);
    }

    if cli.strategy != StrategyArg::Sequential {
        let (estimate, metrics) = measure_async(parallel.estimate(cli.samples))
            .await
            .context("parallel run failed")?;

        let report = SimulationReport {
            strategy: Strategy::Parallel,
            requested: cli.samples,
            estimate,
            metrics,
        };
        println!("Monte Carlo Simulation to Estimate Pi (parallel, async)");
        println!("{}", report);
        println!();
        tracing::info!(
            strategy = "parallel",
            pi = estimate.value(),
            elapsed_ms = metrics.elapsed_ms,
            cpu_ms = metrics.cpu_ms,
            utilization = metrics.cpu_utilization(),
            "run complete"
        );

        if let Some(baseline) = &sequential {
            tracing::info!(speedup = report.speedup_over(baseline), workers, "parallel vs sequential");
        }
    }

    Ok(())
}
