//! The public entry point: register workflows, start runs, query status,
//! cancel.
//!
//! The controller caches one compiled graph per registered workflow version
//! and enforces `max_active_runs = 1`: while a run of a workflow is
//! non-terminal, further starts of that workflow are rejected. Run state is
//! retained after completion so `status()` stays answerable until the
//! process exits.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use runners::{Sensor, TaskExecutor};

use crate::error::{ControllerError, DefinitionError};
use crate::graph::{compile, CompiledGraph};
use crate::models::{RunInstance, RunState, WorkflowDefinition};
use crate::notify::{Notifier, RunSummary};
use crate::scheduler::{Scheduler, SchedulerConfig};
use crate::state::RunStateStore;

#[derive(Clone)]
struct Registered {
    definition: Arc<WorkflowDefinition>,
    graph: Arc<CompiledGraph>,
}

struct RunEntry {
    workflow_id: String,
    version: u32,
    created_at: DateTime<Utc>,
    store: Arc<RunStateStore>,
    state: Mutex<RunState>,
    cancel: watch::Sender<bool>,
}

/// Orchestrates runs across registered workflows. Cheap to share via `Arc`;
/// all methods take `&self`.
pub struct RunController {
    executor: Arc<dyn TaskExecutor>,
    sensor: Arc<dyn Sensor>,
    notifier: Arc<dyn Notifier>,
    config: SchedulerConfig,
    workflows: Mutex<HashMap<String, Registered>>,
    runs: Mutex<HashMap<Uuid, Arc<RunEntry>>>,
    /// Workflow IDs with a non-terminal run — the per-workflow advisory
    /// lock behind `max_active_runs = 1`.
    active: Arc<Mutex<HashSet<String>>>,
}

impl RunController {
    pub fn new(
        executor: Arc<dyn TaskExecutor>,
        sensor: Arc<dyn Sensor>,
        notifier: Arc<dyn Notifier>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            executor,
            sensor,
            notifier,
            config,
            workflows: Mutex::new(HashMap::new()),
            runs: Mutex::new(HashMap::new()),
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Compile and cache a workflow definition. Re-registering an ID
    /// replaces the previous version; runs already in flight keep the graph
    /// they started with.
    pub fn register(&self, definition: WorkflowDefinition) -> Result<(), DefinitionError> {
        let graph = Arc::new(compile(&definition)?);
        info!(
            workflow = %definition.id,
            version = definition.version,
            tasks = graph.task_count(),
            "workflow registered"
        );
        self.workflows.lock().expect("workflows lock poisoned").insert(
            definition.id.clone(),
            Registered {
                definition: Arc::new(definition),
                graph,
            },
        );
        Ok(())
    }

    pub fn workflow(&self, workflow_id: &str) -> Option<Arc<WorkflowDefinition>> {
        self.workflows
            .lock()
            .expect("workflows lock poisoned")
            .get(workflow_id)
            .map(|r| Arc::clone(&r.definition))
    }

    pub fn workflows(&self) -> Vec<Arc<WorkflowDefinition>> {
        self.workflows
            .lock()
            .expect("workflows lock poisoned")
            .values()
            .map(|r| Arc::clone(&r.definition))
            .collect()
    }

    /// Start a run of a registered workflow. Must be called within a tokio
    /// runtime: the scheduling loop is spawned onto it.
    ///
    /// # Errors
    /// - [`ControllerError::UnknownWorkflow`] for an unregistered ID.
    /// - [`ControllerError::RunAlreadyActive`] while a previous run of the
    ///   same workflow is non-terminal.
    pub fn start(&self, workflow_id: &str, params: Value) -> Result<Uuid, ControllerError> {
        let registered = self
            .workflows
            .lock()
            .expect("workflows lock poisoned")
            .get(workflow_id)
            .cloned()
            .ok_or_else(|| ControllerError::UnknownWorkflow(workflow_id.to_string()))?;

        {
            let mut active = self.active.lock().expect("active lock poisoned");
            if !active.insert(workflow_id.to_string()) {
                return Err(ControllerError::RunAlreadyActive(workflow_id.to_string()));
            }
        }

        let run_id = Uuid::new_v4();
        let store = Arc::new(RunStateStore::new(
            registered.graph.task_ids().cloned().collect::<Vec<_>>(),
        ));
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let entry = Arc::new(RunEntry {
            workflow_id: workflow_id.to_string(),
            version: registered.graph.version,
            created_at: Utc::now(),
            store: Arc::clone(&store),
            state: Mutex::new(RunState::Running),
            cancel: cancel_tx,
        });
        self.runs
            .lock()
            .expect("runs lock poisoned")
            .insert(run_id, Arc::clone(&entry));

        let scheduler = Scheduler::new(
            run_id,
            Arc::clone(&registered.graph),
            store,
            Arc::clone(&self.executor),
            Arc::clone(&self.sensor),
            self.config.clone(),
            params,
            cancel_rx,
        );

        info!(run_id = %run_id, workflow = %workflow_id, "run starting");

        let notifier = Arc::clone(&self.notifier);
        let active = Arc::clone(&self.active);
        let graph = Arc::clone(&registered.graph);
        let driver_entry = Arc::clone(&entry);
        tokio::spawn(async move {
            let final_state = scheduler.run().await;

            *driver_entry.state.lock().expect("run state lock poisoned") = final_state;
            active
                .lock()
                .expect("active lock poisoned")
                .remove(&driver_entry.workflow_id);

            let summary = RunSummary::build(
                run_id,
                final_state,
                &graph,
                &driver_entry.store.snapshot(),
            );
            if let Err(e) = notifier.notify(&summary).await {
                warn!(run_id = %run_id, error = %e, "notification dispatch failed");
            }
        });

        Ok(run_id)
    }

    /// Snapshot of a run. After the run completes, repeated calls return
    /// identical snapshots.
    pub fn status(&self, run_id: Uuid) -> Result<RunInstance, ControllerError> {
        let entry = self
            .runs
            .lock()
            .expect("runs lock poisoned")
            .get(&run_id)
            .cloned()
            .ok_or(ControllerError::RunNotFound(run_id))?;

        let state = *entry.state.lock().expect("run state lock poisoned");
        Ok(RunInstance {
            id: run_id,
            workflow_id: entry.workflow_id.clone(),
            version: entry.version,
            created_at: entry.created_at,
            state,
            tasks: entry.store.snapshot(),
        })
    }

    /// Request cancellation of a run. Idempotent; cancelling an
    /// already-terminal run is a no-op.
    pub fn cancel(&self, run_id: Uuid) -> Result<(), ControllerError> {
        let entry = self
            .runs
            .lock()
            .expect("runs lock poisoned")
            .get(&run_id)
            .cloned()
            .ok_or(ControllerError::RunNotFound(run_id))?;

        info!(run_id = %run_id, "cancellation requested");
        entry.cancel.send_replace(true);
        Ok(())
    }
}
