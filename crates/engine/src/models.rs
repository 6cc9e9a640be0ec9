//! Core domain models for the orchestration engine.
//!
//! These types are the source of truth for what a workflow looks like in
//! memory. Definitions serialise to/from plain JSON documents; durations are
//! integer milliseconds to keep that surface flat.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::DefinitionError;
use crate::state::TaskRunState;

// ---------------------------------------------------------------------------
// TaskPolicy
// ---------------------------------------------------------------------------

/// Retry and timeout policy for a task. Set on the workflow as the default
/// and optionally overridden per node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPolicy {
    /// Maximum number of times a failed attempt is retried. A task with
    /// `max_retries = N` fails permanently after `N + 1` attempts.
    #[serde(default)]
    pub max_retries: u32,
    /// Base delay between attempts; the actual backoff is linear,
    /// `retry_delay_ms * attempt_count`.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Upper bound on a single attempt (compute) or on the whole poll
    /// window (sensor).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

fn default_timeout_ms() -> u64 {
    3_600_000 // one hour
}

impl Default for TaskPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_delay_ms: default_retry_delay_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// TaskKind
// ---------------------------------------------------------------------------

/// What a task node does when dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    /// A unit of work handed to the `TaskExecutor` (submit/poll/cancel).
    Compute,
    /// A readiness poll of an external precondition. No retries: exceeding
    /// the timeout without a positive check is terminal failure.
    Sensor {
        #[serde(default = "default_poke_interval_ms")]
        poke_interval_ms: u64,
    },
    /// A join/branch point that completes immediately without dispatch.
    Gate,
}

fn default_poke_interval_ms() -> u64 {
    60_000
}

impl Default for TaskKind {
    fn default() -> Self {
        TaskKind::Compute
    }
}

// ---------------------------------------------------------------------------
// TriggerRule
// ---------------------------------------------------------------------------

/// Function of upstream task states that decides a node's readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerRule {
    /// Ready once every upstream succeeded. Skips propagate; failures
    /// become `UpstreamFailed`.
    AllSuccess,
    /// Ready once every upstream is terminal, whatever the outcome.
    AllDone,
    /// Ready once every upstream is terminal and none failed; skipped
    /// upstreams are tolerated.
    NoneFailed,
    /// Ready once every upstream is terminal and at least one succeeded;
    /// skipped otherwise.
    OneSuccess,
}

impl Default for TriggerRule {
    fn default() -> Self {
        TriggerRule::AllSuccess
    }
}

// ---------------------------------------------------------------------------
// TaskNode
// ---------------------------------------------------------------------------

/// A single node in the workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskNode {
    /// Unique identifier within the workflow (referenced by edges).
    pub id: String,
    #[serde(default)]
    pub kind: TaskKind,
    /// Opaque configuration passed through to the executor/sensor.
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub trigger_rule: TriggerRule,
    /// Per-node policy; falls back to the workflow default when absent.
    #[serde(default)]
    pub policy: Option<TaskPolicy>,
    /// Named output fields this task produces for downstream consumption.
    /// Edge conditions may only reference fields declared here.
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl TaskNode {
    pub fn compute(id: impl Into<String>) -> Self {
        Self::new(id, TaskKind::Compute)
    }

    pub fn sensor(id: impl Into<String>, poke_interval_ms: u64) -> Self {
        Self::new(id, TaskKind::Sensor { poke_interval_ms })
    }

    pub fn gate(id: impl Into<String>) -> Self {
        Self::new(id, TaskKind::Gate)
    }

    fn new(id: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            id: id.into(),
            kind,
            payload: Value::Null,
            trigger_rule: TriggerRule::default(),
            policy: None,
            outputs: Vec::new(),
        }
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn trigger_rule(mut self, rule: TriggerRule) -> Self {
        self.trigger_rule = rule;
        self
    }

    pub fn policy(mut self, policy: TaskPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn outputs(mut self, fields: &[&str]) -> Self {
        self.outputs = fields.iter().map(|f| f.to_string()).collect();
        self
    }
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// Directed dependency from one task to another, optionally gated by a
/// condition over the upstream's outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<EdgeCondition>,
}

/// Equality predicate over a named upstream output field. Richer boolean
/// expressions are deliberately out of scope; comparisons are computed
/// upstream and published as output fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeCondition {
    pub field: String,
    pub equals: Value,
}

impl EdgeCondition {
    /// True when the upstream produced the field with exactly the expected
    /// value. A missing field (declared but never produced) evaluates false.
    pub fn is_met(&self, outputs: Option<&Map<String, Value>>) -> bool {
        outputs.and_then(|o| o.get(&self.field)) == Some(&self.equals)
    }
}

// ---------------------------------------------------------------------------
// TaskGroup
// ---------------------------------------------------------------------------

/// Named subset of nodes, for reporting only. Groups never affect
/// scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskGroup {
    pub name: String,
    pub members: Vec<String>,
}

// ---------------------------------------------------------------------------
// WorkflowDefinition
// ---------------------------------------------------------------------------

/// A complete, immutable workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: String,
    #[serde(default = "default_version")]
    pub version: u32,
    /// Opaque schedule descriptor (cron expression or similar); never
    /// interpreted by the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default)]
    pub default_policy: TaskPolicy,
    pub nodes: Vec<TaskNode>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub groups: Vec<TaskGroup>,
}

fn default_version() -> u32 {
    1
}

impl WorkflowDefinition {
    /// Start assembling a workflow through the explicit builder.
    pub fn builder(id: impl Into<String>) -> WorkflowBuilder {
        WorkflowBuilder::new(id)
    }
}

// ---------------------------------------------------------------------------
// WorkflowBuilder
// ---------------------------------------------------------------------------

/// Explicit graph assembly: add nodes, edges, and groups, then `build()`,
/// which validates the whole definition and refuses to hand back anything
/// invalid.
#[derive(Debug)]
pub struct WorkflowBuilder {
    pub(crate) definition: WorkflowDefinition,
}

impl WorkflowBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            definition: WorkflowDefinition {
                id: id.into(),
                version: default_version(),
                schedule: None,
                default_policy: TaskPolicy::default(),
                nodes: Vec::new(),
                edges: Vec::new(),
                groups: Vec::new(),
            },
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.definition.version = version;
        self
    }

    pub fn schedule(mut self, descriptor: impl Into<String>) -> Self {
        self.definition.schedule = Some(descriptor.into());
        self
    }

    pub fn default_policy(mut self, policy: TaskPolicy) -> Self {
        self.definition.default_policy = policy;
        self
    }

    pub fn node(mut self, node: TaskNode) -> Self {
        self.definition.nodes.push(node);
        self
    }

    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.definition.edges.push(Edge {
            from: from.into(),
            to: to.into(),
            condition: None,
        });
        self
    }

    /// Add an edge gated on `from`'s output `field` equalling `value`.
    pub fn edge_if(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        field: impl Into<String>,
        value: Value,
    ) -> Self {
        self.definition.edges.push(Edge {
            from: from.into(),
            to: to.into(),
            condition: Some(EdgeCondition {
                field: field.into(),
                equals: value,
            }),
        });
        self
    }

    pub fn group(mut self, name: impl Into<String>, members: &[&str]) -> Self {
        self.definition.groups.push(TaskGroup {
            name: name.into(),
            members: members.iter().map(|m| m.to_string()).collect(),
        });
        self
    }

    /// Validate and return the definition.
    pub fn build(self) -> Result<WorkflowDefinition, DefinitionError> {
        crate::graph::compile(&self.definition)?;
        Ok(self.definition)
    }
}

// ---------------------------------------------------------------------------
// RunInstance
// ---------------------------------------------------------------------------

/// Overall state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Success,
    Failed,
    Cancelled,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunState::Running)
    }
}

/// Point-in-time snapshot of a run: its identity plus every task's state.
/// Retained after completion so `status()` stays queryable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInstance {
    pub id: Uuid,
    pub workflow_id: String,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub state: RunState,
    pub tasks: HashMap<String, TaskRunState>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn definition_round_trips_through_json() {
        let def = WorkflowDefinition::builder("etl")
            .schedule("0 2 * * *")
            .node(TaskNode::sensor("wait_orders", 60_000))
            .node(TaskNode::compute("ingest").outputs(&["rows"]))
            .node(TaskNode::gate("done").trigger_rule(TriggerRule::NoneFailed))
            .edge("wait_orders", "ingest")
            .edge("ingest", "done")
            .group("bronze", &["ingest"])
            .build()
            .expect("valid definition");

        let text = serde_json::to_string(&def).unwrap();
        let back: WorkflowDefinition = serde_json::from_str(&text).unwrap();

        assert_eq!(back.id, "etl");
        assert_eq!(back.version, 1);
        assert_eq!(back.nodes.len(), 3);
        assert_eq!(back.edges.len(), 2);
        assert_eq!(back.groups[0].name, "bronze");
    }

    #[test]
    fn minimal_json_fills_defaults() {
        let def: WorkflowDefinition = serde_json::from_value(json!({
            "id": "tiny",
            "nodes": [ { "id": "only" } ]
        }))
        .unwrap();

        assert_eq!(def.version, 1);
        assert_eq!(def.nodes[0].kind, TaskKind::Compute);
        assert_eq!(def.nodes[0].trigger_rule, TriggerRule::AllSuccess);
        assert_eq!(def.default_policy.max_retries, 0);
    }

    #[test]
    fn builder_rejects_invalid_graphs() {
        let err = WorkflowDefinition::builder("bad")
            .node(TaskNode::compute("a"))
            .edge("a", "ghost")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::UnknownTaskReference { task_id, .. } if task_id == "ghost"
        ));
    }

    #[test]
    fn condition_is_plain_equality() {
        let cond = EdgeCondition {
            field: "is_valid".into(),
            equals: json!(true),
        };

        let mut outputs = Map::new();
        outputs.insert("is_valid".into(), json!(true));
        assert!(cond.is_met(Some(&outputs)));

        outputs.insert("is_valid".into(), json!(false));
        assert!(!cond.is_met(Some(&outputs)));

        // declared but never produced -> false
        assert!(!cond.is_met(Some(&Map::new())));
        assert!(!cond.is_met(None));
    }
}
