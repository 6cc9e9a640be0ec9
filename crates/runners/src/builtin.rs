//! Built-in runners: an inline payload-interpreting executor and a
//! filesystem sensor.
//!
//! These exist so the CLI and API layer are runnable end-to-end without an
//! external compute backend. `InlineRunner` stands in for trivial operators
//! (no-ops, canned demos); `FileSensor` is the local analogue of an object
//! store key sensor.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::debug;

use crate::{PollStatus, RunnerError, Sensor, TaskContext, TaskExecutor, TaskHandle};

/// In-process executor that interprets its payload directly.
///
/// Payload contract:
/// ```json
/// { "delay_ms": 250, "outputs": { "rows": 10 }, "fail": "optional reason" }
/// ```
/// The task reports `Running` until `delay_ms` has elapsed, then `Success`
/// with the `outputs` object (or `Failed` when `fail` is present). All
/// fields are optional; an empty payload completes immediately.
#[derive(Default)]
pub struct InlineRunner {
    jobs: Mutex<HashMap<uuid::Uuid, InlineJob>>,
}

struct InlineJob {
    done_at: Instant,
    result: PollStatus,
}

impl InlineRunner {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskExecutor for InlineRunner {
    async fn submit(&self, payload: &Value, ctx: &TaskContext) -> Result<TaskHandle, RunnerError> {
        let delay = payload
            .get("delay_ms")
            .and_then(Value::as_u64)
            .unwrap_or(0);

        let result = match payload.get("fail").and_then(Value::as_str) {
            Some(reason) => PollStatus::Failed(reason.to_string()),
            None => {
                let outputs = payload
                    .get("outputs")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_else(Map::new);
                PollStatus::Success(outputs)
            }
        };

        let handle = TaskHandle::new(&ctx.task_id, "inline");
        debug!(task_id = %ctx.task_id, delay_ms = delay, "inline job submitted");

        self.jobs.lock().unwrap().insert(
            handle.id,
            InlineJob {
                done_at: Instant::now() + Duration::from_millis(delay),
                result,
            },
        );
        Ok(handle)
    }

    async fn poll(&self, handle: &TaskHandle) -> Result<PollStatus, RunnerError> {
        let jobs = self.jobs.lock().unwrap();
        let job = jobs.get(&handle.id).ok_or_else(|| {
            RunnerError::Poll(format!("unknown handle for task '{}'", handle.task_id))
        })?;

        if Instant::now() < job.done_at {
            Ok(PollStatus::Running)
        } else {
            Ok(job.result.clone())
        }
    }

    async fn cancel(&self, handle: &TaskHandle) {
        self.jobs.lock().unwrap().remove(&handle.id);
    }
}

/// Sensor that reports ready once a filesystem path exists.
///
/// Payload contract: `{ "path": "/data/incoming/orders.parquet" }`.
#[derive(Default)]
pub struct FileSensor;

impl FileSensor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Sensor for FileSensor {
    async fn check(&self, payload: &Value, ctx: &TaskContext) -> Result<bool, RunnerError> {
        let path = payload.get("path").and_then(Value::as_str).ok_or_else(|| {
            RunnerError::Check(format!(
                "sensor '{}' payload is missing a 'path' field",
                ctx.task_id
            ))
        })?;
        Ok(Path::new(path).exists())
    }
}
