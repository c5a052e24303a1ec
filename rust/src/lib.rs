//! Monte Carlo estimation of Pi
//!
//! Two strategies over the same quarter-circle sampler:
//! - [`SequentialEstimator`]: one thread, one random source
//! - [`ParallelEstimator`]: one OS thread per worker, each with its own
//!   seeded source, partial counts combined after every worker has joined
//!
//! [`measure`] wraps either one and records wall-clock time, process CPU time
//! and the host's parallelism so the two strategies can be compared.

mod config;
mod error;
mod estimate;
mod metrics;
mod parallel;
mod sampler;
mod sequential;
mod simulation;

pub use config::{SimulationConfig, DEFAULT_TOTAL_SAMPLES};
pub use error::{Error, Result};
pub use estimate::PiEstimate;
pub use metrics::{host_parallelism, measure, process_cpu_time, with_metrics, RunMetrics};
pub use parallel::{worker_seeds, Aggregation, ParallelEstimator, Partition, RemainderPolicy};
pub use sampler::{count_inside, QuarterCircleSampler, SamplePoint, Sampler};
pub use sequential::{estimate_with, SequentialEstimator};
pub use simulation::{Simulation, SimulationReport, Strategy};

/// Estimate Pi from `total_samples` points on the calling thread.
pub fn estimate_pi_sequential(total_samples: u64) -> Result<f64> {
    SequentialEstimator::new()
        .estimate(total_samples)
        .map(|est| est.value())
}

/// Estimate Pi from `total_samples` points split across `worker_count`
/// threads. The `total_samples % worker_count` leftover points are not drawn.
pub fn estimate_pi_parallel(total_samples: u64, worker_count: u32) -> Result<f64> {
    ParallelEstimator::new(worker_count)
        .estimate(total_samples)
        .map(|est| est.value())
}
