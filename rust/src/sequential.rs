use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{Error, Result};
use crate::estimate::PiEstimate;
use crate::sampler::{count_inside, QuarterCircleSampler, Sampler};

/// Single-threaded baseline: one sampler, one random source, one loop.
#[derive(Debug, Clone, Default)]
pub struct SequentialEstimator {
    seed: Option<u64>,
}

impl SequentialEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the random source so runs are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn estimate(&self, total_samples: u64) -> Result<PiEstimate> {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        estimate_with(&mut QuarterCircleSampler::new(rng), total_samples)
    }
}

/// Draw `total_samples` outcomes from `sampler` and turn them into an estimate.
pub fn estimate_with<S: Sampler + ?Sized>(sampler: &mut S, total_samples: u64) -> Result<PiEstimate> {
    if total_samples == 0 {
        return Err(Error::InvalidArgument(
            "total samples must be at least 1".into(),
        ));
    }

    let inside = count_inside(sampler, total_samples);
    Ok(PiEstimate::new(inside, total_samples))
}
