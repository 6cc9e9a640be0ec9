//! Run-terminal notification contract.
//!
//! The controller invokes the notifier exactly once per run, after the run
//! reaches a terminal state. Invocation is fire-and-forget: a notifier
//! failure is logged and can never alter the run's outcome.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::graph::CompiledGraph;
use crate::models::RunState;
use crate::state::{TaskRunState, TaskState};

/// One task's terminal record, as handed to notification channels.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    pub task_id: String,
    /// Reporting group the task belongs to, if any.
    pub group: Option<String>,
    pub state: TaskState,
    pub attempts: u32,
    pub failure_reason: Option<String>,
}

/// The terminal report for a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub workflow_id: String,
    pub final_state: RunState,
    pub tasks: Vec<TaskSummary>,
}

impl RunSummary {
    /// Assemble a summary from a terminal run's state snapshot, tasks in
    /// topological order.
    pub fn build(
        run_id: Uuid,
        final_state: RunState,
        graph: &CompiledGraph,
        snapshot: &HashMap<String, TaskRunState>,
    ) -> Self {
        let tasks = graph
            .task_ids()
            .map(|task_id| {
                let record = snapshot.get(task_id).cloned().unwrap_or_default();
                TaskSummary {
                    task_id: task_id.clone(),
                    group: graph.group_of(task_id).map(str::to_string),
                    state: record.state,
                    attempts: record.attempts,
                    failure_reason: record.failure_reason,
                }
            })
            .collect();

        Self {
            run_id,
            workflow_id: graph.workflow_id.clone(),
            final_state,
            tasks,
        }
    }
}

/// Notification channel contract (chat, email, ...). Implementations live
/// outside the core.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &RunSummary) -> anyhow::Result<()>;
}

/// Notifier that writes the summary to the log. The default channel for the
/// CLI and for deployments without an external one.
#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, summary: &RunSummary) -> anyhow::Result<()> {
        info!(
            run_id = %summary.run_id,
            workflow = %summary.workflow_id,
            state = ?summary.final_state,
            "run finished"
        );
        for task in &summary.tasks {
            info!(
                task_id = %task.task_id,
                state = ?task.state,
                attempts = task.attempts,
                reason = task.failure_reason.as_deref().unwrap_or(""),
                "task summary"
            );
        }
        Ok(())
    }
}

/// Test double that records every summary it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    notified: Mutex<Vec<RunSummary>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.notified.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<RunSummary> {
        self.notified.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, summary: &RunSummary) -> anyhow::Result<()> {
        self.notified.lock().unwrap().push(summary.clone());
        Ok(())
    }
}
