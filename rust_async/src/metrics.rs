use std::future::Future;
use std::time::Instant;

use monte_carlo_pi::{host_parallelism, process_cpu_time, Result, RunMetrics};

/// Async form of `monte_carlo_pi::measure`: times the future from first poll
/// to completion. Errors from the future pass through untouched. The future
/// is awaited even when the CPU clock cannot be read; the clock error is
/// returned after it completes.
pub async fn measure_async<T, F>(run: F) -> Result<(T, RunMetrics)>
where
    F: Future<Output = Result<T>>,
{
    let parallelism = host_parallelism();
    let cpu_start = process_cpu_time();
    let start = Instant::now();

    let value = run.await?;

    let elapsed = start.elapsed();
    let cpu_end = process_cpu_time();

    let metrics = RunMetrics {
        elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        cpu_ms: cpu_end?.saturating_sub(cpu_start?).as_secs_f64() * 1000.0,
        parallelism,
    };
    Ok((value, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use monte_carlo_pi::Error;
    use std::time::Duration;

    #[tokio::test]
    async fn test_elapsed_covers_sleep() {
        let (value, metrics) = measure_async(async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(1u8)
        })
        .await
        .unwrap();

        assert_eq!(value, 1);
        assert!(metrics.elapsed_ms >= 20.0);
        assert!(metrics.parallelism >= 1);
    }

    #[tokio::test]
    async fn test_error_propagates_unchanged() {
        let result = measure_async(async {
            Err::<f64, _>(Error::WorkerFailure {
                worker: 2,
                reason: "boom".into(),
            })
        })
        .await;

        match result {
            Err(Error::WorkerFailure { worker, reason }) => {
                assert_eq!(worker, 2);
                assert_eq!(reason, "boom");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
