//! The `TaskExecutor` and `Sensor` traits — the contracts every backend
//! must fulfil.

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::RunnerError;

/// Shared context passed to every executor and sensor call.
///
/// Defined here (in the runners crate) so both the engine and individual
/// backend implementations can import it without a circular dependency.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// ID of the current run.
    pub run_id: Uuid,
    /// ID of the parent workflow.
    pub workflow_id: String,
    /// ID of the task being executed.
    pub task_id: String,
    /// Run parameters supplied when the run was started.
    pub params: Value,
}

/// Opaque reference to a submitted unit of work.
///
/// The engine stores handles only to poll and cancel them; backends may
/// encode whatever they need in `token`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    pub id: Uuid,
    /// Task ID this handle belongs to, echoed back for observability.
    pub task_id: String,
    /// Backend-specific correlation token (job id, pod name, ...).
    pub token: String,
}

impl TaskHandle {
    pub fn new(task_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id: task_id.into(),
            token: token.into(),
        }
    }
}

/// Status of a submitted unit of work, as reported by [`TaskExecutor::poll`].
#[derive(Debug, Clone)]
pub enum PollStatus {
    /// Still in progress; poll again later.
    Running,
    /// Completed; carries the task's named output fields.
    Success(Map<String, Value>),
    /// Completed unsuccessfully; carries a human-readable reason.
    Failed(String),
}

/// The core executor trait.
///
/// The engine submits the task's opaque payload, polls the returned handle on
/// its status-check interval, and cancels the handle on timeout or run
/// cancellation. Implementations must be safe to call concurrently.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Start a unit of work described by `payload`.
    async fn submit(&self, payload: &Value, ctx: &TaskContext) -> Result<TaskHandle, RunnerError>;

    /// Report the current status of a previously submitted handle.
    async fn poll(&self, handle: &TaskHandle) -> Result<PollStatus, RunnerError>;

    /// Best-effort cancellation of an in-flight handle. Never fails; a
    /// handle that already completed is ignored.
    async fn cancel(&self, handle: &TaskHandle);
}

/// The sensor trait — a single readiness probe of an external precondition.
///
/// The engine calls `check` on the node's poke interval until it returns
/// `true` or the node's timeout elapses. Sensors carry no retry budget;
/// they are idempotent polls, not discrete attempts.
#[async_trait]
pub trait Sensor: Send + Sync {
    async fn check(&self, payload: &Value, ctx: &TaskContext) -> Result<bool, RunnerError>;
}
