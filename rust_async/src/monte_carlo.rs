use monte_carlo_pi::{
    count_inside, host_parallelism, worker_seeds, Error, Partition, PiEstimate, QuarterCircleSampler,
    RemainderPolicy, Result, Sampler,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task;

/// Parallel estimator whose workers run on tokio's blocking pool.
///
/// The sampling loop never yields, so each worker gets a dedicated
/// `spawn_blocking` thread rather than an async task.
#[derive(Debug, Clone)]
pub struct AsyncParallelEstimator {
    workers: u32,
    seed: Option<u64>,
    remainder: RemainderPolicy,
}

impl AsyncParallelEstimator {
    pub fn new(workers: u32) -> Self {
        AsyncParallelEstimator {
            workers,
            seed: None,
            remainder: RemainderPolicy::default(),
        }
    }

    pub fn with_host_parallelism() -> Self {
        Self::new(host_parallelism())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_remainder_policy(mut self, policy: RemainderPolicy) -> Self {
        self.remainder = policy;
        self
    }

    pub fn workers(&self) -> u32 {
        self.workers
    }

    pub async fn estimate(&self, total_samples: u64) -> Result<PiEstimate> {
        let partition = Partition::new(total_samples, self.workers, self.remainder)?;
        let samplers = worker_seeds(self.seed, self.workers)
            .into_iter()
            .map(|seed| QuarterCircleSampler::new(StdRng::seed_from_u64(seed)))
            .collect();
        run_tasks(&partition, samplers).await
    }

    /// Run with caller-built samplers, one per worker.
    pub async fn estimate_with<S>(&self, total_samples: u64, samplers: Vec<S>) -> Result<PiEstimate>
    where
        S: Sampler + Send + 'static,
    {
        let partition = Partition::new(total_samples, self.workers, self.remainder)?;
        if samplers.len() != self.workers as usize {
            return Err(Error::InvalidArgument(format!(
                "expected {} samplers, got {}",
                self.workers,
                samplers.len()
            )));
        }
        run_tasks(&partition, samplers).await
    }
}

/// Async counterpart of `estimate_pi_parallel`.
pub async fn estimate_pi_parallel_async(total_samples: u64, worker_count: u32) -> Result<f64> {
    AsyncParallelEstimator::new(worker_count)
        .estimate(total_samples)
        .await
        .map(|est| est.value())
}

async fn run_tasks<S>(partition: &Partition, samplers: Vec<S>) -> Result<PiEstimate>
where
    S: Sampler + Send + 'static,
{
    let mut handles = Vec::with_capacity(samplers.len());

    for (task_id, mut sampler) in (0u32..).zip(samplers) {
        let samples = partition.samples_for(task_id);
        let handle = task::spawn_blocking(move || count_inside(&mut sampler, samples));
        handles.push((task_id, handle));
    }

    // Await every task before reporting, even after a failure
    let mut total_inside = 0;
    let mut failure = None;
    for (task_id, handle) in handles {
        match handle.await {
            Ok(inside) => total_inside += inside,
            Err(e) => {
                if failure.is_none() {
                    failure = Some(join_failure(task_id, e));
                }
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(PiEstimate {
            inside: total_inside,
            drawn: partition.drawn(),
        }),
    }
}

fn join_failure(task_id: u32, err: task::JoinError) -> Error {
    if err.is_panic() {
        Error::worker_panic(task_id, err.into_panic())
    } else {
        Error::WorkerFailure {
            worker: task_id,
            reason: err.to_string(),
        }
    }
}
