use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use monte_carlo_pi::{
    host_parallelism, Aggregation, RemainderPolicy, Simulation, SimulationConfig, SimulationReport,
    Strategy, DEFAULT_TOTAL_SAMPLES,
};

/// Monte Carlo Pi estimation, sequential vs. multi-threaded
#[derive(Parser, Debug)]
#[command(name = "monte_carlo_pi")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Which strategy to run
    #[arg(short, long, value_enum, default_value_t = StrategyArg::Both)]
    strategy: StrategyArg,

    /// Number of points to sample
    #[arg(short = 'n', long, env = "PI_SAMPLES", default_value_t = DEFAULT_TOTAL_SAMPLES)]
    samples: u64,

    /// Parallel worker threads (defaults to the number of logical cores)
    #[arg(short, long, env = "PI_WORKERS")]
    workers: Option<u32>,

    /// Master seed for reproducible runs
    #[arg(long, env = "PI_SEED")]
    seed: Option<u64>,

    /// Spread leftover samples over the workers instead of dropping them
    #[arg(long)]
    distribute_remainder: bool,

    /// How worker counts are combined
    #[arg(long, value_enum, default_value_t = AggregationArg::Fold)]
    aggregation: AggregationArg,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Sequential,
    Parallel,
    Both,
}

impl StrategyArg {
    fn strategies(self) -> &'static [Strategy] {
        match self {
            StrategyArg::Sequential => &[Strategy::Sequential],
            StrategyArg::Parallel => &[Strategy::Parallel],
            StrategyArg::Both => &[Strategy::Sequential, Strategy::Parallel],
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AggregationArg {
    Fold,
    Atomic,
}

impl From<AggregationArg> for Aggregation {
    fn from(arg: AggregationArg) -> Self {
        match arg {
            AggregationArg::Fold => Aggregation::Fold,
            AggregationArg::Atomic => Aggregation::Atomic,
        }
    }
}

impl Cli {
    fn config(&self) -> SimulationConfig {
        let mut config = SimulationConfig::new(self.samples)
            .with_workers(self.workers.unwrap_or_else(host_parallelism))
            .with_aggregation(self.aggregation.into());
        if self.distribute_remainder {
            config = config.with_remainder_policy(RemainderPolicy::Distribute);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let simulation = Simulation::new(cli.config());
    tracing::debug!(config = ?simulation.config(), "starting simulation");

    let mut reports: Vec<SimulationReport> = Vec::new();
    for &strategy in cli.strategy.strategies() {
        println!("Monte Carlo Simulation to Estimate Pi ({})", strategy);
        let report = simulation
            .run(strategy)
            .with_context(|| format!("{} run failed", strategy))?;
        println!("{}", report);
        println!();

        tracing::info!(
            strategy = %strategy,
            pi = report.estimate.value(),
            error = report.estimate.error(),
            elapsed_ms = report.metrics.elapsed_ms,
            cpu_ms = report.metrics.cpu_ms,
            utilization = report.metrics.cpu_utilization(),
            "run complete"
        );
        reports.push(report);
    }

    if let [sequential, parallel] = reports.as_slice() {
        tracing::info!(
            speedup = parallel.speedup_over(sequential),
            workers = simulation.config().workers,
            "parallel vs sequential"
        );
    }

    Ok(())
}
