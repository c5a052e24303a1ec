//! Simulation configuration types

use crate::error::{Error, Result};
use crate::metrics::host_parallelism;
use crate::parallel::{Aggregation, RemainderPolicy};

/// Sample budget used when none is given.
pub const DEFAULT_TOTAL_SAMPLES: u64 = 1_000_000_000;

/// Simulation configuration
///
/// Shared by both strategies so their runs are comparable. The parallel-only
/// fields are ignored by the sequential strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Number of points to sample
    pub total_samples: u64,

    /// Parallel worker count, one per logical core by default
    pub workers: u32,

    /// Master seed; entropy-seeded when `None`
    pub seed: Option<u64>,

    /// What to do with samples that don't fill a worker chunk
    pub remainder: RemainderPolicy,

    /// How worker counts are combined
    pub aggregation: Aggregation,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            total_samples: DEFAULT_TOTAL_SAMPLES,
            workers: host_parallelism(),
            seed: None,
            remainder: RemainderPolicy::default(),
            aggregation: Aggregation::default(),
        }
    }
}

impl SimulationConfig {
    /// Create a new config with the given sample budget
    pub fn new(total_samples: u64) -> Self {
        Self {
            total_samples,
            ..Default::default()
        }
    }

    pub fn with_workers(mut self, workers: u32) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_remainder_policy(mut self, policy: RemainderPolicy) -> Self {
        self.remainder = policy;
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.total_samples == 0 {
            return Err(Error::InvalidArgument(
                "total samples must be at least 1".into(),
            ));
        }

        if self.workers == 0 {
            return Err(Error::InvalidArgument(
                "worker count must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
