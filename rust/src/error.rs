//! Error types for the Pi estimators

use thiserror::Error;

/// Estimation error
#[derive(Error, Debug)]
pub enum Error {
    /// Zero sample count or worker count, rejected before any sampling
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A worker could not be spawned or terminated abnormally
    #[error("worker {worker} failed: {reason}")]
    WorkerFailure { worker: u32, reason: String },

    /// The process CPU clock could not be read
    #[error("failed to read process CPU time: {0}")]
    CpuClock(#[source] std::io::Error),
}

impl Error {
    /// Build a `WorkerFailure` from the payload of a panicked worker.
    pub fn worker_panic(worker: u32, payload: Box<dyn std::any::Any + Send>) -> Self {
        let reason = if let Some(s) = payload.downcast_ref::<&str>() {
            format!("panicked: {}", s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("panicked: {}", s)
        } else {
            "panicked".to_string()
        };
        Error::WorkerFailure { worker, reason }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
