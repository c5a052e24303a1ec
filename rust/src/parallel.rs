//! Multi-core estimator
//!
//! The sample budget is split into one chunk per worker. Each worker is an OS
//! thread that owns its sampler and random source outright and counts locally;
//! counts only cross threads once, after the worker loop has finished.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crate::error::{Error, Result};
use crate::estimate::PiEstimate;
use crate::metrics::host_parallelism;
use crate::sampler::{count_inside, QuarterCircleSampler, Sampler};

/// What happens to the `total % workers` samples that don't fill a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemainderPolicy {
    /// Drop them; the estimate is over `chunk_size * workers` samples.
    #[default]
    Truncate,
    /// Give one extra sample to each of the first `remainder` workers.
    Distribute,
}

/// How partial counts are combined into the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
    /// Workers return their count through the join handle and the
    /// coordinator sums them after the barrier.
    #[default]
    Fold,
    /// Workers add their count into one shared atomic, once each.
    Atomic,
}

/// Split of a sample budget across workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    total: u64,
    chunk_size: u64,
    remainder: u64,
    policy: RemainderPolicy,
}

impl Partition {
    pub fn new(total: u64, workers: u32, policy: RemainderPolicy) -> Result<Self> {
        if total == 0 {
            return Err(Error::InvalidArgument(
                "total samples must be at least 1".into(),
            ));
        }
        if workers == 0 {
            return Err(Error::InvalidArgument(
                "worker count must be at least 1".into(),
            ));
        }

        let chunk_size = total / workers as u64;
        let remainder = total % workers as u64;

        if chunk_size == 0 && policy == RemainderPolicy::Truncate {
            return Err(Error::InvalidArgument(format!(
                "{} samples cannot be split across {} workers without dropping all of them",
                total, workers
            )));
        }

        Ok(Partition {
            total,
            chunk_size,
            remainder,
            policy,
        })
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Samples requested but never drawn.
    pub fn dropped(&self) -> u64 {
        match self.policy {
            RemainderPolicy::Truncate => self.remainder,
            RemainderPolicy::Distribute => 0,
        }
    }

    /// Samples actually drawn across all workers.
    pub fn drawn(&self) -> u64 {
        self.total - self.dropped()
    }

    /// Samples drawn by one worker.
    pub fn samples_for(&self, worker: u32) -> u64 {
        match self.policy {
            RemainderPolicy::Distribute if (worker as u64) < self.remainder => self.chunk_size + 1,
            _ => self.chunk_size,
        }
    }
}

/// One seed per worker, drawn up front from a generator only the caller touches.
pub fn worker_seeds(master_seed: Option<u64>, workers: u32) -> Vec<u64> {
    let mut master = match master_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    (0..workers).map(|_| master.gen()).collect()
}

/// Fork-join estimator over a fixed set of OS threads.
#[derive(Debug, Clone)]
pub struct ParallelEstimator {
    workers: u32,
    seed: Option<u64>,
    remainder: RemainderPolicy,
    aggregation: Aggregation,
}

impl ParallelEstimator {
    pub fn new(workers: u32) -> Self {
        ParallelEstimator {
            workers,
            seed: None,
            remainder: RemainderPolicy::default(),
            aggregation: Aggregation::default(),
        }
    }

    /// One worker per logical core reported by the host.
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

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn estimate(&self, total_samples: u64) -> Result<PiEstimate> {
        let partition = Partition::new(total_samples, self.workers, self.remainder)?;
        let samplers = worker_seeds(self.seed, self.workers)
            .into_iter()
            .map(|seed| QuarterCircleSampler::new(StdRng::seed_from_u64(seed)))
            .collect();
        self.run(&partition, samplers)
    }

    /// Run with caller-built samplers, one per worker.
    pub fn estimate_with<S>(&self, total_samples: u64, samplers: Vec<S>) -> Result<PiEstimate>
    where
        S: Sampler + Send,
    {
        let partition = Partition::new(total_samples, self.workers, self.remainder)?;
        if samplers.len() != self.workers as usize {
            return Err(Error::InvalidArgument(format!(
                "expected {} samplers, got {}",
                self.workers,
                samplers.len()
            )));
        }
        self.run(&partition, samplers)
    }

    fn run<S>(&self, partition: &Partition, samplers: Vec<S>) -> Result<PiEstimate>
    where
        S: Sampler + Send,
    {
        let inside: u64 = match self.aggregation {
            Aggregation::Fold => run_workers(partition, samplers, |mut sampler, samples| {
                count_inside(&mut sampler, samples)
            })?
            .into_iter()
            .sum(),
            Aggregation::Atomic => {
                let aggregate = AtomicU64::new(0);
                run_workers(partition, samplers, |mut sampler, samples| {
                    let inside = count_inside(&mut sampler, samples);
                    // Joining the worker orders this before the final read
                    aggregate.fetch_add(inside, Ordering::Relaxed);
                })?;
                aggregate.into_inner()
            }
        };

        Ok(PiEstimate::new(inside, partition.drawn()))
    }
}

/// Spawn one scoped thread per sampler, join all of them, and collect their
/// results in worker order. Any spawn failure or panic fails the whole run.
fn run_workers<S, T, F>(partition: &Partition, samplers: Vec<S>, work: F) -> Result<Vec<T>>
where
    S: Sampler + Send,
    T: Send,
    F: Fn(S, u64) -> T + Sync,
{
    let work = &work;

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(samplers.len());
        let mut spawn_failure = None;

        for (worker_id, sampler) in (0u32..).zip(samplers) {
            let samples = partition.samples_for(worker_id);
            let spawned = thread::Builder::new()
                .name(format!("pi-worker-{}", worker_id))
                .spawn_scoped(scope, move || work(sampler, samples));

            match spawned {
                Ok(handle) => handles.push((worker_id, handle)),
                Err(e) => {
                    spawn_failure = Some(Error::WorkerFailure {
                        worker: worker_id,
                        reason: format!("failed to spawn: {}", e),
                    });
                    break;
                }
            }
        }

        // Every spawned worker is joined before any result is used
        let joined = handles
            .into_iter()
            .map(|(worker_id, handle)| (worker_id, handle.join()))
            .collect();
        collect_results(spawn_failure, joined)
    })
}

/// Fold joined worker outcomes into one result. A spawn failure takes
/// precedence, then the first panic in worker order.
fn collect_results<T>(spawn_failure: Option<Error>, joined: Vec<(u32, thread::Result<T>)>) -> Result<Vec<T>> {
    let mut failure = spawn_failure;
    let mut results = Vec::with_capacity(joined.len());

    for (worker_id, outcome) in joined {
        match outcome {
            Ok(result) => results.push(result),
            Err(payload) => {
                if failure.is_none() {
                    failure = Some(Error::worker_panic(worker_id, payload));
                }
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(results),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequential::SequentialEstimator;

    #[derive(Clone)]
    enum Scripted {
        Inside,
        Outside,
        Explode,
    }

    impl Sampler for Scripted {
        fn sample(&mut self) -> bool {
            match self {
                Scripted::Inside => true,
                Scripted::Outside => false,
                Scripted::Explode => panic!("sampler exploded"),
            }
        }
    }

    #[test]
    fn test_zero_samples_rejected() {
        let err = ParallelEstimator::new(4).estimate(0).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = ParallelEstimator::new(0).estimate(1000).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_fewer_samples_than_workers_truncated_away() {
        let err = ParallelEstimator::new(8).estimate(5).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let est = ParallelEstimator::new(8)
            .with_remainder_policy(RemainderPolicy::Distribute)
            .estimate(5)
            .unwrap();
        assert_eq!(est.drawn, 5);
    }

    #[test]
    fn test_partition_truncates_remainder() {
        let p = Partition::new(1000, 3, RemainderPolicy::Truncate).unwrap();
        assert_eq!(p.chunk_size(), 333);
        assert_eq!(p.dropped(), 1);
        assert_eq!(p.drawn(), 999);
        assert!((0..3).all(|w| p.samples_for(w) == 333));
    }

    #[test]
    fn test_partition_distributes_remainder() {
        let p = Partition::new(1001, 4, RemainderPolicy::Distribute).unwrap();
        let per_worker: Vec<u64> = (0..4).map(|w| p.samples_for(w)).collect();
        assert_eq!(per_worker, vec![251, 250, 250, 250]);
        assert_eq!(per_worker.iter().sum::<u64>(), 1001);
        assert_eq!(p.drawn(), 1001);
    }

    #[test]
    fn test_truncated_run_draws_exactly_999() {
        let est = ParallelEstimator::new(3)
            .estimate_with(1000, vec![Scripted::Inside; 3])
            .unwrap();
        assert_eq!(est.drawn, 999);
        assert_eq!(est.inside, 999);
        assert_eq!(est.value(), 4.0);
    }

    #[test]
    fn test_no_lost_updates() {
        for aggregation in [Aggregation::Fold, Aggregation::Atomic] {
            for workers in [1u32, 2, 8, 64] {
                for _ in 0..5 {
                    let est = ParallelEstimator::new(workers)
                        .with_aggregation(aggregation)
                        .estimate_with(100_003, vec![Scripted::Inside; workers as usize])
                        .unwrap();
                    let chunk = 100_003 / workers as u64;
                    assert_eq!(est.inside, chunk * workers as u64, "{:?} x{}", aggregation, workers);
                    assert_eq!(est.drawn, chunk * workers as u64);
                }
            }
        }
    }

    #[test]
    fn test_mixed_worker_outcomes() {
        let samplers = vec![Scripted::Inside, Scripted::Outside, Scripted::Inside, Scripted::Outside];
        let est = ParallelEstimator::new(4).estimate_with(400, samplers).unwrap();
        assert_eq!(est.inside, 200);
        assert_eq!(est.value(), 2.0);
    }

    #[test]
    fn test_worker_panic_fails_run() {
        for aggregation in [Aggregation::Fold, Aggregation::Atomic] {
            let samplers = vec![Scripted::Inside, Scripted::Explode, Scripted::Inside];
            let err = ParallelEstimator::new(3)
                .with_aggregation(aggregation)
                .estimate_with(300, samplers)
                .unwrap_err();
            match err {
                Error::WorkerFailure { worker, reason } => {
                    assert_eq!(worker, 1);
                    assert!(reason.contains("sampler exploded"));
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    fn panicked(msg: &'static str) -> thread::Result<u64> {
        Err(Box::new(msg) as Box<dyn std::any::Any + Send>)
    }

    #[test]
    fn test_spawn_failure_fails_run() {
        let spawn_failure = Error::WorkerFailure {
            worker: 2,
            reason: "failed to spawn: out of memory".into(),
        };
        let joined: Vec<(u32, thread::Result<u64>)> = vec![(0, Ok(10)), (1, Ok(12))];

        match collect_results(Some(spawn_failure), joined).unwrap_err() {
            Error::WorkerFailure { worker, reason } => {
                assert_eq!(worker, 2);
                assert!(reason.starts_with("failed to spawn"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_spawn_failure_reported_before_panic() {
        let spawn_failure = Error::WorkerFailure {
            worker: 1,
            reason: "failed to spawn: resource temporarily unavailable".into(),
        };
        let joined: Vec<(u32, thread::Result<u64>)> = vec![(0, panicked("boom"))];

        let err = collect_results(Some(spawn_failure), joined).unwrap_err();
        assert!(matches!(err, Error::WorkerFailure { worker: 1, .. }));
    }

    #[test]
    fn test_first_panic_wins() {
        let joined: Vec<(u32, thread::Result<u64>)> = vec![
            (0, Ok(5)),
            (1, panicked("first")),
            (2, panicked("second")),
        ];

        match collect_results(None, joined).unwrap_err() {
            Error::WorkerFailure { worker, reason } => {
                assert_eq!(worker, 1);
                assert_eq!(reason, "panicked: first");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_sampler_count_mismatch() {
        let err = ParallelEstimator::new(4)
            .estimate_with(100, vec![Scripted::Inside; 3])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_seeded_runs_reproducible() {
        let a = ParallelEstimator::new(4).with_seed(5).estimate(40_000).unwrap();
        let b = ParallelEstimator::new(4).with_seed(5).estimate(40_000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_worker_seeds_distinct() {
        let seeds = worker_seeds(Some(11), 16);
        let mut unique = seeds.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), seeds.len());
    }

    #[test]
    fn test_single_worker_matches_sequential() {
        let n = 100_000;
        let trials = 10;

        let seq: f64 = (0..trials)
            .map(|t| SequentialEstimator::new().with_seed(t).estimate(n).unwrap().value())
            .sum::<f64>()
            / trials as f64;
        let par: f64 = (0..trials)
            .map(|t| ParallelEstimator::new(1).with_seed(t).estimate(n).unwrap().value())
            .sum::<f64>()
            / trials as f64;

        assert!((seq - par).abs() < 0.02, "sequential {} vs parallel {}", seq, par);
        assert!((seq - std::f64::consts::PI).abs() < 0.02);
        assert!((par - std::f64::consts::PI).abs() < 0.02);
    }

    #[test]
    fn test_estimate_in_range() {
        let est = ParallelEstimator::with_host_parallelism()
            .estimate(200_000)
            .unwrap();
        assert!((0.0..=4.0).contains(&est.value()));
        assert!(est.drawn <= 200_000);
    }
}
