use std::fmt;

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::estimate::PiEstimate;
use crate::metrics::{measure, RunMetrics};
use crate::parallel::ParallelEstimator;
use crate::sequential::SequentialEstimator;

/// Execution strategy for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sequential,
    Parallel,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::Parallel => "parallel",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one measured run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationReport {
    pub strategy: Strategy,
    pub requested: u64,
    pub estimate: PiEstimate,
    pub metrics: RunMetrics,
}

impl SimulationReport {
    /// How many times faster this run was than `baseline`, by wall-clock time.
    pub fn speedup_over(&self, baseline: &SimulationReport) -> f64 {
        if self.metrics.elapsed_ms > 0.0 {
            baseline.metrics.elapsed_ms / self.metrics.elapsed_ms
        } else {
            f64::INFINITY
        }
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Estimated Pi after {} points: {}",
            self.estimate.drawn,
            self.estimate.value()
        )?;
        if self.estimate.drawn != self.requested {
            writeln!(
                f,
                "Samples Dropped: {}",
                self.requested - self.estimate.drawn
            )?;
        }
        writeln!(f, "Elapsed Time: {:.0} ms", self.metrics.elapsed_ms)?;
        writeln!(f, "CPU Time: {:.3} ms", self.metrics.cpu_ms)?;
        write!(f, "CPU Cores Used: {}", self.metrics.parallelism)
    }
}

/// Runs either strategy under the same configuration and metrics.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Simulation { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn run(&self, strategy: Strategy) -> Result<SimulationReport> {
        self.config.validate()?;

        let total = self.config.total_samples;
        let (estimate, metrics) = match strategy {
            Strategy::Sequential => {
                let estimator = self.sequential();
                measure(|| estimator.estimate(total))?
            }
            Strategy::Parallel => {
                let estimator = self.parallel();
                measure(|| estimator.estimate(total))?
            }
        };

        Ok(SimulationReport {
            strategy,
            requested: total,
            estimate,
            metrics,
        })
    }

    fn sequential(&self) -> SequentialEstimator {
        let estimator = SequentialEstimator::new();
        match self.config.seed {
            Some(seed) => estimator.with_seed(seed),
            None => estimator,
        }
    }

    fn parallel(&self) -> ParallelEstimator {
        let estimator = ParallelEstimator::new(self.config.workers)
            .with_remainder_policy(self.config.remainder)
            .with_aggregation(self.config.aggregation);
        match self.config.seed {
            Some(seed) => estimator.with_seed(seed),
            None => estimator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_run_both_strategies() {
        let sim = Simulation::new(SimulationConfig::new(30_000).with_workers(4).with_seed(3));

        for strategy in [Strategy::Sequential, Strategy::Parallel] {
            let report = sim.run(strategy).unwrap();
            assert_eq!(report.strategy, strategy);
            assert_eq!(report.estimate.drawn, 30_000);
            assert!((0.0..=4.0).contains(&report.estimate.value()));
            assert!(report.metrics.elapsed_ms >= 0.0);
            assert!(report.metrics.parallelism >= 1);
        }
    }

    #[test]
    fn test_invalid_config_rejected_before_run() {
        let sim = Simulation::new(SimulationConfig::new(0));
        let err = sim.run(Strategy::Sequential).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_report_lines() {
        let sim = Simulation::new(SimulationConfig::new(1_000).with_workers(3).with_seed(1));
        let text = sim.run(Strategy::Parallel).unwrap().to_string();

        assert!(text.starts_with("Estimated Pi after 999 points: "));
        assert!(text.contains("Samples Dropped: 1\n"));
        assert!(text.contains("Elapsed Time: "));
        assert!(text.contains("CPU Time: "));
        assert!(text.contains("CPU Cores Used: "));
    }

    #[test]
    fn test_speedup() {
        let metrics = |elapsed_ms| RunMetrics {
            elapsed_ms,
            cpu_ms: 0.0,
            parallelism: 1,
        };
        let estimate = PiEstimate { inside: 3, drawn: 4 };
        let baseline = SimulationReport {
            strategy: Strategy::Sequential,
            requested: 4,
            estimate,
            metrics: metrics(400.0),
        };
        let fast = SimulationReport {
            strategy: Strategy::Parallel,
            requested: 4,
            estimate,
            metrics: metrics(100.0),
        };
        assert_eq!(fast.speedup_over(&baseline), 4.0);
    }
}
