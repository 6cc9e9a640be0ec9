//! Scripted test doubles for `TaskExecutor` and `Sensor`.
//!
//! Useful in unit and integration tests where a real backend is either
//! unavailable or irrelevant. Outcomes are scripted per task ID and consumed
//! in order; every submission, poll, and cancellation is recorded so tests
//! can assert attempt counts and cancellation behaviour.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{PollStatus, RunnerError, Sensor, TaskContext, TaskExecutor, TaskHandle};

/// What a [`MockExecutor`] does with one submission of a given task.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Report `Success` with the given outputs on the first poll.
    Succeed(Map<String, Value>),
    /// Report `Failed` with the given reason on the first poll.
    Fail(String),
    /// Report `Running` forever (used for timeout and cancellation tests).
    Hang,
}

/// A mock executor with per-task outcome scripts.
///
/// Tasks with no script entry left succeed immediately with empty outputs,
/// so tests only script the tasks they care about.
#[derive(Default)]
pub struct MockExecutor {
    script: Mutex<HashMap<String, VecDeque<MockOutcome>>>,
    inflight: Mutex<HashMap<uuid::Uuid, MockOutcome>>,
    submissions: Mutex<Vec<String>>,
    cancelled: Mutex<Vec<String>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an outcome to the given task's script.
    pub fn push(&self, task_id: impl Into<String>, outcome: MockOutcome) {
        self.script
            .lock()
            .unwrap()
            .entry(task_id.into())
            .or_default()
            .push_back(outcome);
    }

    /// Script a failure followed by further outcomes in one call.
    pub fn push_failures(&self, task_id: &str, count: usize, reason: &str) {
        for _ in 0..count {
            self.push(task_id, MockOutcome::Fail(reason.to_string()));
        }
    }

    /// Number of times the given task was submitted.
    pub fn submission_count(&self, task_id: &str) -> usize {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == task_id)
            .count()
    }

    /// Task IDs whose handles were cancelled, in call order.
    pub fn cancelled_tasks(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskExecutor for MockExecutor {
    async fn submit(&self, _payload: &Value, ctx: &TaskContext) -> Result<TaskHandle, RunnerError> {
        self.submissions.lock().unwrap().push(ctx.task_id.clone());

        let outcome = self
            .script
            .lock()
            .unwrap()
            .get_mut(&ctx.task_id)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| MockOutcome::Succeed(Map::new()));

        let handle = TaskHandle::new(&ctx.task_id, "mock");
        self.inflight.lock().unwrap().insert(handle.id, outcome);
        Ok(handle)
    }

    async fn poll(&self, handle: &TaskHandle) -> Result<PollStatus, RunnerError> {
        let inflight = self.inflight.lock().unwrap();
        match inflight.get(&handle.id) {
            Some(MockOutcome::Succeed(outputs)) => Ok(PollStatus::Success(outputs.clone())),
            Some(MockOutcome::Fail(reason)) => Ok(PollStatus::Failed(reason.clone())),
            Some(MockOutcome::Hang) => Ok(PollStatus::Running),
            None => Err(RunnerError::Poll(format!(
                "unknown handle for task '{}'",
                handle.task_id
            ))),
        }
    }

    async fn cancel(&self, handle: &TaskHandle) {
        self.cancelled.lock().unwrap().push(handle.task_id.clone());
        self.inflight.lock().unwrap().remove(&handle.id);
    }
}

/// A mock sensor with per-task poke scripts.
///
/// Each `check` consumes the next scripted result; an exhausted (or absent)
/// script yields `Ok(false)`, so "never ready" needs no scripting at all.
#[derive(Default)]
pub struct MockSensor {
    script: Mutex<HashMap<String, VecDeque<Result<bool, String>>>>,
    pokes: Mutex<Vec<String>>,
}

impl MockSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next results for a task: `Ok(ready)` or `Err(reason)`.
    pub fn push(&self, task_id: impl Into<String>, result: Result<bool, String>) {
        self.script
            .lock()
            .unwrap()
            .entry(task_id.into())
            .or_default()
            .push_back(result);
    }

    /// Convenience: become ready after `n` false pokes.
    pub fn ready_after(&self, task_id: &str, n: usize) {
        for _ in 0..n {
            self.push(task_id, Ok(false));
        }
        self.push(task_id, Ok(true));
    }

    /// Number of times the given task was poked.
    pub fn poke_count(&self, task_id: &str) -> usize {
        self.pokes
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == task_id)
            .count()
    }
}

#[async_trait]
impl Sensor for MockSensor {
    async fn check(&self, _payload: &Value, ctx: &TaskContext) -> Result<bool, RunnerError> {
        self.pokes.lock().unwrap().push(ctx.task_id.clone());

        let next = self
            .script
            .lock()
            .unwrap()
            .get_mut(&ctx.task_id)
            .and_then(|q| q.pop_front());

        match next {
            Some(Ok(ready)) => Ok(ready),
            Some(Err(reason)) => Err(RunnerError::Check(reason)),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn ctx(task_id: &str) -> TaskContext {
        TaskContext {
            run_id: Uuid::new_v4(),
            workflow_id: "wf".into(),
            task_id: task_id.into(),
            params: json!({}),
        }
    }

    #[tokio::test]
    async fn scripted_outcomes_are_consumed_in_order() {
        let exec = MockExecutor::new();
        exec.push("t", MockOutcome::Fail("boom".into()));
        exec.push("t", MockOutcome::Succeed(Map::new()));

        let h1 = exec.submit(&json!({}), &ctx("t")).await.unwrap();
        assert!(matches!(exec.poll(&h1).await.unwrap(), PollStatus::Failed(_)));

        let h2 = exec.submit(&json!({}), &ctx("t")).await.unwrap();
        assert!(matches!(exec.poll(&h2).await.unwrap(), PollStatus::Success(_)));

        assert_eq!(exec.submission_count("t"), 2);
    }

    #[tokio::test]
    async fn unscripted_task_succeeds_immediately() {
        let exec = MockExecutor::new();
        let h = exec.submit(&json!({}), &ctx("anything")).await.unwrap();
        assert!(matches!(exec.poll(&h).await.unwrap(), PollStatus::Success(_)));
    }

    #[tokio::test]
    async fn cancel_records_the_task_id() {
        let exec = MockExecutor::new();
        exec.push("slow", MockOutcome::Hang);
        let h = exec.submit(&json!({}), &ctx("slow")).await.unwrap();
        assert!(matches!(exec.poll(&h).await.unwrap(), PollStatus::Running));

        exec.cancel(&h).await;
        assert_eq!(exec.cancelled_tasks(), vec!["slow"]);
    }

    #[tokio::test]
    async fn sensor_defaults_to_not_ready() {
        let sensor = MockSensor::new();
        assert!(!sensor.check(&json!({}), &ctx("s")).await.unwrap());
        assert_eq!(sensor.poke_count("s"), 1);
    }

    #[tokio::test]
    async fn sensor_ready_after_scripted_pokes() {
        let sensor = MockSensor::new();
        sensor.ready_after("s", 2);

        assert!(!sensor.check(&json!({}), &ctx("s")).await.unwrap());
        assert!(!sensor.check(&json!({}), &ctx("s")).await.unwrap());
        assert!(sensor.check(&json!({}), &ctx("s")).await.unwrap());
    }
}
