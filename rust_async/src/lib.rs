//! Tokio-hosted variant of the multi-core Pi estimator.
//!
//! Partitioning, seeding and sampling come from `monte_carlo_pi`; only the
//! worker dispatch differs, going through `tokio::task::spawn_blocking`.

mod metrics;
mod monte_carlo;

pub use metrics::measure_async;
pub use monte_carlo::{estimate_pi_parallel_async, AsyncParallelEstimator};
