//! `engine` crate — domain models, graph compilation, run state, the
//! scheduling core, and the run controller.

pub mod controller;
pub mod error;
pub mod graph;
pub mod models;
pub mod notify;
pub mod scheduler;
pub mod state;

pub use controller::RunController;
pub use error::{ControllerError, DefinitionError};
pub use graph::{compile, CompiledGraph};
pub use models::{
    Edge, EdgeCondition, RunInstance, RunState, TaskGroup, TaskKind, TaskNode, TaskPolicy,
    TriggerRule, WorkflowDefinition,
};
pub use notify::{LogNotifier, Notifier, RunSummary, TaskSummary};
pub use scheduler::{Scheduler, SchedulerConfig};
pub use state::{RunStateStore, TaskRunState, TaskState};
