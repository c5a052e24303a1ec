//! Run Metrics
//!
//! Wall-clock time from `std::time::Instant`, process CPU time (user + system,
//! summed over every thread) from `getrusage(RUSAGE_SELF)` on unix and
//! `GetProcessTimes` on Windows.

use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Timing record for one estimation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunMetrics {
    /// Wall-clock time spent in the run, milliseconds
    pub elapsed_ms: f64,
    /// Process CPU time consumed during the run, milliseconds.
    /// Exceeds `elapsed_ms` when several cores were busy.
    pub cpu_ms: f64,
    /// Logical cores available when the run started
    pub parallelism: u32,
}

impl RunMetrics {
    /// Average number of cores kept busy, `cpu_ms / elapsed_ms`.
    pub fn cpu_utilization(&self) -> f64 {
        if self.elapsed_ms > 0.0 {
            self.cpu_ms / self.elapsed_ms
        } else {
            0.0
        }
    }
}

/// Logical cores the host reports as runnable, at least 1.
pub fn host_parallelism() -> u32 {
    std::thread::available_parallelism()
        .map(|n| u32::try_from(n.get()).unwrap_or(u32::MAX))
        .unwrap_or(1)
}

/// CPU time consumed so far by every thread of this process.
#[cfg(unix)]
pub fn process_cpu_time() -> Result<Duration> {
    use std::mem::MaybeUninit;

    let mut usage = MaybeUninit::<libc::rusage>::zeroed();
    // SAFETY: getrusage only writes into the provided struct.
    let result = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if result != 0 {
        return Err(Error::CpuClock(std::io::Error::last_os_error()));
    }
    // SAFETY: getrusage succeeded and filled the struct.
    let usage = unsafe { usage.assume_init() };

    Ok(timeval_to_duration(usage.ru_utime) + timeval_to_duration(usage.ru_stime))
}

#[cfg(windows)]
pub fn process_cpu_time() -> Result<Duration> {
    use winapi::shared::minwindef::FILETIME;
    use winapi::um::processthreadsapi::{GetCurrentProcess, GetProcessTimes};

    let zero = FILETIME {
        dwLowDateTime: 0,
        dwHighDateTime: 0,
    };
    let (mut creation, mut exit, mut kernel, mut user) = (zero, zero, zero, zero);
    // SAFETY: the pseudo-handle needs no closing and every out-pointer is a
    // live FILETIME.
    let ok = unsafe {
        GetProcessTimes(
            GetCurrentProcess(),
            &mut creation,
            &mut exit,
            &mut kernel,
            &mut user,
        )
    };
    if ok == 0 {
        return Err(Error::CpuClock(std::io::Error::last_os_error()));
    }

    Ok(filetime_to_duration(kernel) + filetime_to_duration(user))
}

#[cfg(not(any(unix, windows)))]
pub fn process_cpu_time() -> Result<Duration> {
    Err(Error::CpuClock(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "process CPU time is not available on this platform",
    )))
}

#[cfg(unix)]
fn timeval_to_duration(tv: libc::timeval) -> Duration {
    Duration::from_secs(tv.tv_sec.max(0) as u64) + Duration::from_micros(tv.tv_usec.max(0) as u64)
}

/// FILETIME counts 100 ns ticks.
#[cfg(windows)]
fn filetime_to_duration(ft: winapi::shared::minwindef::FILETIME) -> Duration {
    let ticks = ((ft.dwHighDateTime as u64) << 32) | ft.dwLowDateTime as u64;
    Duration::from_nanos(ticks.saturating_mul(100))
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Run `run` once and time it.
///
/// Errors from `run` are returned as-is; a failed run produces no metrics.
/// `run` is always invoked, even when the CPU clock cannot be read; a clock
/// failure is reported as [`Error::CpuClock`] once the run has finished.
pub fn measure<T, F>(run: F) -> Result<(T, RunMetrics)>
where
    F: FnOnce() -> Result<T>,
{
    measure_with_clock(run, process_cpu_time)
}

fn measure_with_clock<T, F, C>(run: F, cpu_clock: C) -> Result<(T, RunMetrics)>
where
    F: FnOnce() -> Result<T>,
    C: Fn() -> Result<Duration>,
{
    let parallelism = host_parallelism();
    let cpu_start = cpu_clock();
    let start = Instant::now();

    let value = run()?;

    let elapsed = start.elapsed();
    let cpu_end = cpu_clock();

    let metrics = RunMetrics {
        elapsed_ms: millis(elapsed),
        cpu_ms: millis(cpu_end?.saturating_sub(cpu_start?)),
        parallelism,
    };
    Ok((value, metrics))
}

/// [`measure`] for a run that yields a bare Pi value.
pub fn with_metrics<F>(run: F) -> Result<(f64, RunMetrics)>
where
    F: FnOnce() -> Result<f64>,
{
    measure(run)
}
