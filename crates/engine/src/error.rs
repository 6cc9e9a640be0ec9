//! Engine-level error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised while compiling a workflow definition. A definition that
/// produces any of these never starts a run; no partial graph is returned.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// Two or more tasks share the same ID.
    #[error("duplicate task ID: '{0}'")]
    DuplicateTaskId(String),

    /// An edge references a task ID that doesn't exist in the workflow.
    #[error("edge references unknown task '{task_id}' ({side} side)")]
    UnknownTaskReference {
        task_id: String,
        side: &'static str,
    },

    /// An edge condition names an output field its upstream task never
    /// declares.
    #[error("edge '{from}' -> '{to}' conditions on field '{field}', which '{from}' does not declare as an output")]
    UnknownOutputField {
        from: String,
        to: String,
        field: String,
    },

    /// Topological sort detected a cycle.
    #[error("workflow graph contains a cycle")]
    CycleDetected,
}

/// Errors returned by the run controller's public API.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// No workflow registered under the given ID.
    #[error("unknown workflow '{0}'")]
    UnknownWorkflow(String),

    /// No run known under the given ID.
    #[error("unknown run {0}")]
    RunNotFound(Uuid),

    /// The workflow already has a non-terminal run (`max_active_runs = 1`).
    #[error("workflow '{0}' already has an active run")]
    RunAlreadyActive(String),

    /// The definition failed to compile during registration.
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}
