//! `runners` crate — the external-collaborator contracts of the orchestration
//! engine: task executors (submit/poll/cancel) and sensors (readiness polls).
//!
//! The engine never interprets task payloads; it hands them to a
//! `TaskExecutor` or `Sensor` implementation and routes the resulting state
//! transitions. Concrete backends (Spark, dbt, shell, ...) live behind these
//! traits, outside this workspace.

pub mod error;
pub mod traits;
pub mod mock;
pub mod builtin;

pub use error::RunnerError;
pub use traits::{PollStatus, Sensor, TaskContext, TaskExecutor, TaskHandle};
pub use builtin::{FileSensor, InlineRunner};
