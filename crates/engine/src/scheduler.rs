//! The scheduling core: drives one run from `Pending` everywhere to a
//! terminal run state.
//!
//! One logical scheduling loop per run. Each pass evaluates readiness for
//! every `Pending` task against its trigger rule, dispatches ready tasks
//! onto their own tokio task (submit/poll cycle), and propagates skips and
//! upstream failures. The loop re-evaluates whenever a worker reports a
//! state change, with a coarse fallback tick bounding staleness. All state
//! transitions go through the store's compare-and-set, so stale workers
//! (e.g. racing a cancellation) simply lose and exit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use runners::{PollStatus, Sensor, TaskContext, TaskExecutor, TaskHandle};

use crate::graph::CompiledGraph;
use crate::models::{RunState, TaskKind, TaskNode, TaskPolicy, TriggerRule};
use crate::state::{RunStateStore, TaskRunState, TaskState};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the scheduling loop.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between executor status checks for a running task.
    pub status_check_interval: Duration,
    /// Fallback readiness re-evaluation interval when no task event
    /// arrives.
    pub fallback_tick: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            status_check_interval: Duration::from_millis(500),
            fallback_tick: Duration::from_secs(2),
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Shared dependencies handed to every worker task.
struct Inner {
    run_id: Uuid,
    graph: Arc<CompiledGraph>,
    store: Arc<RunStateStore>,
    executor: Arc<dyn TaskExecutor>,
    sensor: Arc<dyn Sensor>,
    config: SchedulerConfig,
    params: Value,
    /// Handles of currently submitted work, for cancellation.
    inflight: Mutex<HashMap<String, TaskHandle>>,
    /// Workers signal here after every terminal transition.
    events: mpsc::UnboundedSender<()>,
    cancel: watch::Receiver<bool>,
}

impl Inner {
    fn task_ctx(&self, task_id: &str) -> TaskContext {
        TaskContext {
            run_id: self.run_id,
            workflow_id: self.graph.workflow_id.clone(),
            task_id: task_id.to_string(),
            params: self.params.clone(),
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

/// Drives a single run to completion. Construct one per run and call
/// [`Scheduler::run`].
pub struct Scheduler {
    inner: Arc<Inner>,
    events_rx: mpsc::UnboundedReceiver<()>,
    cancel: watch::Receiver<bool>,
}

impl Scheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        run_id: Uuid,
        graph: Arc<CompiledGraph>,
        store: Arc<RunStateStore>,
        executor: Arc<dyn TaskExecutor>,
        sensor: Arc<dyn Sensor>,
        config: SchedulerConfig,
        params: Value,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        let (events, events_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                run_id,
                graph,
                store,
                executor,
                sensor,
                config,
                params,
                inflight: Mutex::new(HashMap::new()),
                events,
                cancel: cancel.clone(),
            }),
            events_rx,
            cancel,
        }
    }

    /// Run the scheduling loop until the run reaches a terminal state.
    #[instrument(
        skip(self),
        fields(run_id = %self.inner.run_id, workflow = %self.inner.graph.workflow_id)
    )]
    pub async fn run(mut self) -> RunState {
        info!("run started with {} tasks", self.inner.graph.task_count());

        let mut tick = tokio::time::interval(self.inner.config.fallback_tick);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *self.cancel.borrow() {
                return self.cancel_run().await;
            }

            // Re-evaluate until a fixpoint so transitive skips and upstream
            // failures propagate within one wakeup, leaving no orphaned
            // Pending tasks behind.
            while self.schedule_pass() {}

            if let Some(final_state) = self.try_finish() {
                info!(state = ?final_state, "run finished");
                return final_state;
            }

            tokio::select! {
                changed = self.cancel.changed() => {
                    if changed.is_ok() && *self.cancel.borrow() {
                        return self.cancel_run().await;
                    }
                }
                Some(()) = self.events_rx.recv() => {}
                _ = tick.tick() => {}
            }
        }
    }

    /// One readiness pass over every `Pending` task. Returns whether any
    /// transition was applied.
    fn schedule_pass(&self) -> bool {
        let snapshot = self.inner.store.snapshot();
        let mut changed = false;

        for task_id in self.inner.graph.task_ids() {
            let Some(record) = snapshot.get(task_id) else {
                continue;
            };
            if record.state != TaskState::Pending {
                continue;
            }
            let Some(node) = self.inner.graph.node(task_id) else {
                continue;
            };

            match evaluate_readiness(node, self.inner.graph.upstream_edges(task_id), &snapshot) {
                Readiness::Wait => {}
                Readiness::Ready => {
                    let queued = TaskRunState {
                        state: TaskState::Queued,
                        ..record.clone()
                    };
                    if self
                        .inner
                        .store
                        .compare_and_set(task_id, TaskState::Pending, queued)
                    {
                        debug!(task_id = %task_id, "task queued");
                        self.spawn_worker(task_id.clone());
                        changed = true;
                    }
                }
                Readiness::Skip => {
                    let skipped = TaskRunState {
                        state: TaskState::Skipped,
                        finished_at: Some(Utc::now()),
                        ..record.clone()
                    };
                    if self
                        .inner
                        .store
                        .compare_and_set(task_id, TaskState::Pending, skipped)
                    {
                        debug!(task_id = %task_id, "task skipped");
                        changed = true;
                    }
                }
                Readiness::UpstreamFailed(reason) => {
                    let failed = TaskRunState {
                        state: TaskState::UpstreamFailed,
                        finished_at: Some(Utc::now()),
                        failure_reason: Some(reason),
                        ..record.clone()
                    };
                    if self
                        .inner
                        .store
                        .compare_and_set(task_id, TaskState::Pending, failed)
                    {
                        debug!(task_id = %task_id, "task marked upstream-failed");
                        changed = true;
                    }
                }
            }
        }

        changed
    }

    fn spawn_worker(&self, task_id: String) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Some(node) = inner.graph.node(&task_id).cloned() {
                match node.kind {
                    TaskKind::Gate => run_gate(&inner, &node).await,
                    TaskKind::Sensor { poke_interval_ms } => {
                        run_sensor(&inner, &node, Duration::from_millis(poke_interval_ms)).await
                    }
                    TaskKind::Compute => run_compute(&inner, &node).await,
                }
            }
            let _ = inner.events.send(());
        });
    }

    /// When every task is terminal, derive the run's verdict from the leaf
    /// tasks: a failure consumed by a downstream recovery path (all_done /
    /// one_success) does not fail the run.
    fn try_finish(&self) -> Option<RunState> {
        let snapshot = self.inner.store.snapshot();
        if snapshot.values().any(|t| !t.state.is_terminal()) {
            return None;
        }

        let any_leaf_failed = self.inner.graph.leaves().iter().any(|id| {
            matches!(
                snapshot.get(id).map(|t| t.state),
                Some(TaskState::Failed) | Some(TaskState::UpstreamFailed)
            )
        });

        Some(if any_leaf_failed {
            RunState::Failed
        } else {
            RunState::Success
        })
    }

    /// Cancel every in-flight handle best-effort, then mark every
    /// non-terminal task `UpstreamFailed`. Already-terminal tasks are
    /// untouched.
    async fn cancel_run(&self) -> RunState {
        info!("cancelling run");

        let handles: Vec<TaskHandle> = {
            let mut inflight = self.inner.inflight.lock().expect("inflight lock poisoned");
            inflight.drain().map(|(_, h)| h).collect()
        };
        for handle in &handles {
            self.inner.executor.cancel(handle).await;
        }

        for task_id in self.inner.graph.task_ids() {
            // A worker may race us into a terminal state; retry the CAS
            // against whatever state we observe until the task is terminal.
            loop {
                let Some(current) = self.inner.store.get(task_id) else {
                    break;
                };
                if current.state.is_terminal() {
                    break;
                }
                let next = TaskRunState {
                    state: TaskState::UpstreamFailed,
                    finished_at: Some(Utc::now()),
                    failure_reason: Some("run cancelled".to_string()),
                    outputs: None,
                    ..current.clone()
                };
                if self
                    .inner
                    .store
                    .compare_and_set(task_id, current.state, next)
                {
                    break;
                }
            }
        }

        RunState::Cancelled
    }
}

// ---------------------------------------------------------------------------
// Readiness evaluation
// ---------------------------------------------------------------------------

enum Readiness {
    Wait,
    Ready,
    Skip,
    UpstreamFailed(String),
}

/// Evaluate a pending node's trigger rule over the *effective* states of its
/// upstream edges. An upstream that succeeded but whose edge condition
/// evaluates false contributes `Skipped` instead of `Success` — this is how
/// a false gate collapses its downstream subgraph.
fn evaluate_readiness(
    node: &TaskNode,
    upstream_edges: &[crate::models::Edge],
    snapshot: &HashMap<String, TaskRunState>,
) -> Readiness {
    if upstream_edges.is_empty() {
        return Readiness::Ready;
    }

    let mut failed_upstream: Option<&str> = None;
    let mut any_skipped = false;
    let mut any_success = false;
    let mut all_terminal = true;
    let mut all_success = true;

    for edge in upstream_edges {
        let Some(up) = snapshot.get(&edge.from) else {
            all_terminal = false;
            all_success = false;
            continue;
        };

        let effective = match up.state {
            TaskState::Success => match &edge.condition {
                Some(condition) if !condition.is_met(up.outputs.as_ref()) => TaskState::Skipped,
                _ => TaskState::Success,
            },
            other => other,
        };

        match effective {
            TaskState::Success => any_success = true,
            TaskState::Skipped => {
                any_skipped = true;
                all_success = false;
            }
            TaskState::Failed | TaskState::UpstreamFailed => {
                failed_upstream.get_or_insert(edge.from.as_str());
                all_success = false;
            }
            _ => {
                all_terminal = false;
                all_success = false;
            }
        }
    }

    let upstream_failure = |id: &str| format!("upstream task '{id}' did not succeed");

    match node.trigger_rule {
        TriggerRule::AllSuccess => {
            if let Some(id) = failed_upstream {
                Readiness::UpstreamFailed(upstream_failure(id))
            } else if any_skipped {
                Readiness::Skip
            } else if all_terminal && all_success {
                Readiness::Ready
            } else {
                Readiness::Wait
            }
        }
        TriggerRule::AllDone => {
            if all_terminal {
                Readiness::Ready
            } else {
                Readiness::Wait
            }
        }
        TriggerRule::NoneFailed => {
            if let Some(id) = failed_upstream {
                Readiness::UpstreamFailed(upstream_failure(id))
            } else if all_terminal {
                Readiness::Ready
            } else {
                Readiness::Wait
            }
        }
        TriggerRule::OneSuccess => {
            if !all_terminal {
                Readiness::Wait
            } else if any_success {
                Readiness::Ready
            } else {
                Readiness::Skip
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

/// Gates complete immediately: they are join/branch points with no external
/// work.
async fn run_gate(inner: &Inner, node: &TaskNode) {
    let started = Utc::now();
    let running = TaskRunState {
        state: TaskState::Running,
        attempts: 1,
        started_at: Some(started),
        finished_at: None,
        outputs: None,
        failure_reason: None,
    };
    if !inner
        .store
        .compare_and_set(&node.id, TaskState::Queued, running)
    {
        return;
    }

    let success = TaskRunState {
        state: TaskState::Success,
        attempts: 1,
        started_at: Some(started),
        finished_at: Some(Utc::now()),
        outputs: Some(Map::new()),
        failure_reason: None,
    };
    inner
        .store
        .compare_and_set(&node.id, TaskState::Running, success);
}

/// Submit/poll cycle for one compute task, with linear-backoff retries and
/// per-attempt timeout.
async fn run_compute(inner: &Inner, node: &TaskNode) {
    let policy = inner.graph.policy_for(node);
    let ctx = inner.task_ctx(&node.id);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let started = Utc::now();
        let running = TaskRunState {
            state: TaskState::Running,
            attempts: attempt,
            started_at: Some(started),
            finished_at: None,
            outputs: None,
            failure_reason: None,
        };
        if !inner
            .store
            .compare_and_set(&node.id, TaskState::Queued, running)
        {
            return; // stale: the run was cancelled under us
        }

        match attempt_once(inner, node, &policy, &ctx).await {
            Ok(outputs) => {
                let success = TaskRunState {
                    state: TaskState::Success,
                    attempts: attempt,
                    started_at: Some(started),
                    finished_at: Some(Utc::now()),
                    outputs: Some(outputs),
                    failure_reason: None,
                };
                inner
                    .store
                    .compare_and_set(&node.id, TaskState::Running, success);
                info!(task_id = %node.id, attempt, "task succeeded");
                return;
            }
            Err(reason) => {
                if attempt <= policy.max_retries {
                    let retrying = TaskRunState {
                        state: TaskState::Retrying,
                        attempts: attempt,
                        started_at: Some(started),
                        finished_at: None,
                        outputs: None,
                        failure_reason: None,
                    };
                    if !inner
                        .store
                        .compare_and_set(&node.id, TaskState::Running, retrying)
                    {
                        return;
                    }

                    // Linear backoff: base delay times the attempt count.
                    let delay = Duration::from_millis(policy.retry_delay_ms) * attempt;
                    warn!(
                        task_id = %node.id,
                        attempt,
                        max_retries = policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "task attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;

                    if inner.is_cancelled() {
                        return;
                    }
                    let queued = TaskRunState {
                        state: TaskState::Queued,
                        attempts: attempt,
                        started_at: Some(started),
                        finished_at: None,
                        outputs: None,
                        failure_reason: None,
                    };
                    if !inner
                        .store
                        .compare_and_set(&node.id, TaskState::Retrying, queued)
                    {
                        return;
                    }
                } else {
                    let failed = TaskRunState {
                        state: TaskState::Failed,
                        attempts: attempt,
                        started_at: Some(started),
                        finished_at: Some(Utc::now()),
                        outputs: None,
                        failure_reason: Some(reason.clone()),
                    };
                    inner
                        .store
                        .compare_and_set(&node.id, TaskState::Running, failed);
                    error!(task_id = %node.id, attempt, reason = %reason, "task failed permanently");
                    return;
                }
            }
        }
    }
}

/// One attempt: submit, then poll on the status-check interval until the
/// executor reports a result or the attempt times out. A timed-out attempt
/// is cancelled best-effort and counted as a failure.
async fn attempt_once(
    inner: &Inner,
    node: &TaskNode,
    policy: &TaskPolicy,
    ctx: &TaskContext,
) -> Result<Map<String, Value>, String> {
    let handle = inner
        .executor
        .submit(&node.payload, ctx)
        .await
        .map_err(|e| e.to_string())?;

    inner
        .inflight
        .lock()
        .expect("inflight lock poisoned")
        .insert(node.id.clone(), handle.clone());

    let result = tokio::time::timeout(
        Duration::from_millis(policy.timeout_ms),
        poll_until_done(inner, &handle),
    )
    .await;

    inner
        .inflight
        .lock()
        .expect("inflight lock poisoned")
        .remove(&node.id);

    match result {
        Ok(outcome) => outcome,
        Err(_elapsed) => {
            inner.executor.cancel(&handle).await;
            Err(format!("execution timed out after {}ms", policy.timeout_ms))
        }
    }
}

async fn poll_until_done(inner: &Inner, handle: &TaskHandle) -> Result<Map<String, Value>, String> {
    loop {
        match inner.executor.poll(handle).await {
            Ok(PollStatus::Success(outputs)) => return Ok(outputs),
            Ok(PollStatus::Failed(reason)) => return Err(reason),
            Ok(PollStatus::Running) => {}
            Err(e) => return Err(e.to_string()),
        }
        if inner.is_cancelled() {
            return Err("run cancelled".to_string());
        }
        tokio::time::sleep(inner.config.status_check_interval).await;
    }
}

/// Poll the sensor until ready or timeout. Sensors carry no retry budget:
/// exhausting the timeout is terminal failure. A transport error from
/// `check` counts as one false poke.
async fn run_sensor(inner: &Inner, node: &TaskNode, poke_interval: Duration) {
    let policy = inner.graph.policy_for(node);
    let ctx = inner.task_ctx(&node.id);
    let started = Utc::now();

    let running = TaskRunState {
        state: TaskState::Running,
        attempts: 1,
        started_at: Some(started),
        finished_at: None,
        outputs: None,
        failure_reason: None,
    };
    if !inner
        .store
        .compare_and_set(&node.id, TaskState::Queued, running)
    {
        return;
    }

    let timeout = Duration::from_millis(policy.timeout_ms);
    let begin = tokio::time::Instant::now();
    let mut pokes = 0u32;

    loop {
        if begin.elapsed() >= timeout {
            let failed = TaskRunState {
                state: TaskState::Failed,
                attempts: 1,
                started_at: Some(started),
                finished_at: Some(Utc::now()),
                outputs: None,
                failure_reason: Some(format!(
                    "sensor timed out after {}ms ({pokes} pokes)",
                    policy.timeout_ms
                )),
            };
            inner
                .store
                .compare_and_set(&node.id, TaskState::Running, failed);
            error!(task_id = %node.id, pokes, "sensor timed out");
            return;
        }

        match inner.sensor.check(&node.payload, &ctx).await {
            Ok(true) => {
                let success = TaskRunState {
                    state: TaskState::Success,
                    attempts: 1,
                    started_at: Some(started),
                    finished_at: Some(Utc::now()),
                    outputs: Some(Map::new()),
                    failure_reason: None,
                };
                inner
                    .store
                    .compare_and_set(&node.id, TaskState::Running, success);
                info!(task_id = %node.id, pokes, "sensor condition met");
                return;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(task_id = %node.id, error = %e, "sensor check failed, treating as not ready");
            }
        }
        pokes += 1;

        if inner.is_cancelled() {
            return;
        }
        tokio::time::sleep(poke_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Edge, EdgeCondition};
    use serde_json::json;

    fn record(state: TaskState) -> TaskRunState {
        TaskRunState {
            state,
            ..TaskRunState::default()
        }
    }

    fn success_with(field: &str, value: Value) -> TaskRunState {
        let mut outputs = Map::new();
        outputs.insert(field.to_string(), value);
        TaskRunState {
            state: TaskState::Success,
            outputs: Some(outputs),
            ..TaskRunState::default()
        }
    }

    fn edge(from: &str, to: &str) -> Edge {
        Edge {
            from: from.into(),
            to: to.into(),
            condition: None,
        }
    }

    fn edge_if(from: &str, to: &str, field: &str, value: Value) -> Edge {
        Edge {
            from: from.into(),
            to: to.into(),
            condition: Some(EdgeCondition {
                field: field.into(),
                equals: value,
            }),
        }
    }

    fn eval(rule: TriggerRule, edges: &[Edge], snapshot: &HashMap<String, TaskRunState>) -> Readiness {
        let node = TaskNode::compute("under_test").trigger_rule(rule);
        evaluate_readiness(&node, edges, snapshot)
    }

    #[test]
    fn no_upstreams_is_immediately_ready() {
        assert!(matches!(
            eval(TriggerRule::AllSuccess, &[], &HashMap::new()),
            Readiness::Ready
        ));
    }

    #[test]
    fn all_success_waits_for_pending_upstreams() {
        let snapshot = HashMap::from([
            ("a".to_string(), record(TaskState::Success)),
            ("b".to_string(), record(TaskState::Running)),
        ]);
        let edges = [edge("a", "t"), edge("b", "t")];
        assert!(matches!(
            eval(TriggerRule::AllSuccess, &edges, &snapshot),
            Readiness::Wait
        ));
    }

    #[test]
    fn all_success_fails_fast_on_failed_upstream() {
        let snapshot = HashMap::from([
            ("a".to_string(), record(TaskState::Failed)),
            ("b".to_string(), record(TaskState::Pending)),
        ]);
        let edges = [edge("a", "t"), edge("b", "t")];
        assert!(matches!(
            eval(TriggerRule::AllSuccess, &edges, &snapshot),
            Readiness::UpstreamFailed(_)
        ));
    }

    #[test]
    fn all_success_propagates_skip() {
        let snapshot = HashMap::from([
            ("a".to_string(), record(TaskState::Skipped)),
            ("b".to_string(), record(TaskState::Success)),
        ]);
        let edges = [edge("a", "t"), edge("b", "t")];
        assert!(matches!(
            eval(TriggerRule::AllSuccess, &edges, &snapshot),
            Readiness::Skip
        ));
    }

    #[test]
    fn false_condition_counts_as_skipped_upstream() {
        let snapshot = HashMap::from([(
            "check".to_string(),
            success_with("is_valid", json!(false)),
        )]);
        let edges = [edge_if("check", "t", "is_valid", json!(true))];
        assert!(matches!(
            eval(TriggerRule::AllSuccess, &edges, &snapshot),
            Readiness::Skip
        ));
    }

    #[test]
    fn true_condition_counts_as_success() {
        let snapshot =
            HashMap::from([("check".to_string(), success_with("is_valid", json!(true)))]);
        let edges = [edge_if("check", "t", "is_valid", json!(true))];
        assert!(matches!(
            eval(TriggerRule::AllSuccess, &edges, &snapshot),
            Readiness::Ready
        ));
    }

    #[test]
    fn none_failed_tolerates_skipped_but_not_failed() {
        let edges = [edge("a", "t"), edge("b", "t")];

        let tolerated = HashMap::from([
            ("a".to_string(), record(TaskState::Skipped)),
            ("b".to_string(), record(TaskState::Success)),
        ]);
        assert!(matches!(
            eval(TriggerRule::NoneFailed, &edges, &tolerated),
            Readiness::Ready
        ));

        let failed = HashMap::from([
            ("a".to_string(), record(TaskState::Failed)),
            ("b".to_string(), record(TaskState::Success)),
        ]);
        assert!(matches!(
            eval(TriggerRule::NoneFailed, &edges, &failed),
            Readiness::UpstreamFailed(_)
        ));
    }

    #[test]
    fn none_failed_waits_while_upstream_is_still_pending() {
        let snapshot = HashMap::from([
            ("a".to_string(), record(TaskState::Skipped)),
            ("b".to_string(), record(TaskState::Running)),
        ]);
        let edges = [edge("a", "t"), edge("b", "t")];
        assert!(matches!(
            eval(TriggerRule::NoneFailed, &edges, &snapshot),
            Readiness::Wait
        ));
    }

    #[test]
    fn all_done_counts_any_terminal_state() {
        let snapshot = HashMap::from([
            ("a".to_string(), record(TaskState::Failed)),
            ("b".to_string(), record(TaskState::Skipped)),
            ("c".to_string(), record(TaskState::Success)),
        ]);
        let edges = [edge("a", "t"), edge("b", "t"), edge("c", "t")];
        assert!(matches!(
            eval(TriggerRule::AllDone, &edges, &snapshot),
            Readiness::Ready
        ));
    }

    #[test]
    fn one_success_requires_all_terminal_and_one_success() {
        let edges = [edge("a", "t"), edge("b", "t")];

        let waiting = HashMap::from([
            ("a".to_string(), record(TaskState::Success)),
            ("b".to_string(), record(TaskState::Running)),
        ]);
        assert!(matches!(
            eval(TriggerRule::OneSuccess, &edges, &waiting),
            Readiness::Wait
        ));

        let ready = HashMap::from([
            ("a".to_string(), record(TaskState::Success)),
            ("b".to_string(), record(TaskState::Failed)),
        ]);
        assert!(matches!(
            eval(TriggerRule::OneSuccess, &edges, &ready),
            Readiness::Ready
        ));

        let none = HashMap::from([
            ("a".to_string(), record(TaskState::Skipped)),
            ("b".to_string(), record(TaskState::Failed)),
        ]);
        assert!(matches!(
            eval(TriggerRule::OneSuccess, &edges, &none),
            Readiness::Skip
        ));
    }
}
