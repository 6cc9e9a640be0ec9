//! Runner-level error type.

use thiserror::Error;

/// Transport-level errors returned by executor and sensor implementations.
///
/// These describe a failure to *talk to* the backend, not a failure of the
/// work itself — work failures travel through [`crate::PollStatus::Failed`].
/// The engine contains both the same way: as one failed attempt (compute
/// tasks) or one false poke (sensors).
#[derive(Debug, Error, Clone)]
pub enum RunnerError {
    /// The backend rejected or lost the submission.
    #[error("submit failed: {0}")]
    Submit(String),

    /// The backend could not report status for an in-flight handle.
    #[error("poll failed: {0}")]
    Poll(String),

    /// A sensor could not evaluate its precondition.
    #[error("sensor check failed: {0}")]
    Check(String),
}
