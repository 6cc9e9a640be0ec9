//! Per-run task state, guarded by compare-and-set.
//!
//! Every mutation goes through [`RunStateStore::compare_and_set`] keyed on
//! the previous state, so the scheduler and its workers detect and reject
//! stale transitions under concurrent dispatch. Terminal states are frozen:
//! no CAS ever moves a task out of one.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-task state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Queued,
    Running,
    Retrying,
    Success,
    Failed,
    Skipped,
    UpstreamFailed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Success | TaskState::Failed | TaskState::Skipped | TaskState::UpstreamFailed
        )
    }
}

/// Full record of one task within one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRunState {
    pub state: TaskState,
    /// Number of attempts started so far.
    pub attempts: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Output value map; set only on `Success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Map<String, Value>>,
    /// Set only on `Failed` / `UpstreamFailed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl Default for TaskRunState {
    fn default() -> Self {
        Self {
            state: TaskState::Pending,
            attempts: 0,
            started_at: None,
            finished_at: None,
            outputs: None,
            failure_reason: None,
        }
    }
}

/// Holds the task states of a single run. A run owns its store exclusively;
/// no other run observes or mutates it.
#[derive(Debug)]
pub struct RunStateStore {
    tasks: Mutex<HashMap<String, TaskRunState>>,
}

impl RunStateStore {
    /// Create a store with every task in `Pending`.
    pub fn new(task_ids: impl IntoIterator<Item = String>) -> Self {
        let tasks = task_ids
            .into_iter()
            .map(|id| (id, TaskRunState::default()))
            .collect();
        Self {
            tasks: Mutex::new(tasks),
        }
    }

    pub fn get(&self, task_id: &str) -> Option<TaskRunState> {
        self.tasks.lock().expect("state store lock poisoned").get(task_id).cloned()
    }

    /// Atomically replace the task's record iff its current state equals
    /// `expected` and is not terminal. Returns whether the transition was
    /// applied.
    pub fn compare_and_set(&self, task_id: &str, expected: TaskState, next: TaskRunState) -> bool {
        let mut tasks = self.tasks.lock().expect("state store lock poisoned");
        match tasks.get_mut(task_id) {
            Some(current) if current.state == expected && !current.state.is_terminal() => {
                *current = next;
                true
            }
            _ => false,
        }
    }

    /// Clone of the full state map.
    pub fn snapshot(&self) -> HashMap<String, TaskRunState> {
        self.tasks.lock().expect("state store lock poisoned").clone()
    }
}
