//! Graph compilation — run this before any run is created.
//!
//! Rules enforced:
//! 1. Task IDs must be unique within the workflow.
//! 2. Every edge must reference valid task IDs (both `from` and `to`).
//! 3. Every edge condition must name an output field its upstream declares.
//! 4. The directed graph must be acyclic (topological sort must succeed).
//!
//! Returns an immutable [`CompiledGraph`] on success, safely shared
//! (read-only) across concurrent runs of the same workflow.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::DefinitionError;
use crate::models::{Edge, TaskGroup, TaskNode, TaskPolicy, WorkflowDefinition};

/// Validated, immutable form of a workflow definition, indexed for the
/// scheduler: node lookup, per-node upstream edges, downstream adjacency,
/// leaf set, and a topological order.
#[derive(Debug)]
pub struct CompiledGraph {
    pub workflow_id: String,
    pub version: u32,
    nodes: HashMap<String, TaskNode>,
    upstream: HashMap<String, Vec<Edge>>,
    downstream: HashMap<String, Vec<String>>,
    topo_order: Vec<String>,
    leaves: Vec<String>,
    groups: Vec<TaskGroup>,
    default_policy: TaskPolicy,
}

impl CompiledGraph {
    pub fn node(&self, task_id: &str) -> Option<&TaskNode> {
        self.nodes.get(task_id)
    }

    /// Task IDs in topological order.
    pub fn task_ids(&self) -> impl Iterator<Item = &String> {
        self.topo_order.iter()
    }

    pub fn task_count(&self) -> usize {
        self.topo_order.len()
    }

    /// Incoming edges of a task.
    pub fn upstream_edges(&self, task_id: &str) -> &[Edge] {
        self.upstream.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct downstream task IDs.
    pub fn downstream_of(&self, task_id: &str) -> &[String] {
        self.downstream
            .get(task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Tasks with no outgoing edges; the run's verdict is read off these.
    pub fn leaves(&self) -> &[String] {
        &self.leaves
    }

    /// Effective policy for a node: its own override or the workflow
    /// default.
    pub fn policy_for(&self, node: &TaskNode) -> TaskPolicy {
        node.policy.clone().unwrap_or_else(|| self.default_policy.clone())
    }

    /// First group (declaration order) containing the task, if any.
    pub fn group_of(&self, task_id: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.members.iter().any(|m| m == task_id))
            .map(|g| g.name.as_str())
    }
}

/// Compile the workflow's graph, validating it in the process.
///
/// # Errors
/// - [`DefinitionError::DuplicateTaskId`] if two tasks share an ID.
/// - [`DefinitionError::UnknownTaskReference`] if an edge references a
///   missing task.
/// - [`DefinitionError::UnknownOutputField`] if a condition names an
///   undeclared upstream output.
/// - [`DefinitionError::CycleDetected`] if the graph is not acyclic.
pub fn compile(definition: &WorkflowDefinition) -> Result<CompiledGraph, DefinitionError> {
    // -----------------------------------------------------------------------
    // 1. Ensure task IDs are unique
    // -----------------------------------------------------------------------
    let mut seen_ids: HashSet<&str> = HashSet::new();
    for node in &definition.nodes {
        if !seen_ids.insert(node.id.as_str()) {
            return Err(DefinitionError::DuplicateTaskId(node.id.clone()));
        }
    }

    let node_map: HashMap<&str, &TaskNode> = definition
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n))
        .collect();

    // -----------------------------------------------------------------------
    // 2. Validate edge endpoints and condition fields
    // -----------------------------------------------------------------------
    for edge in &definition.edges {
        let Some(from_node) = node_map.get(edge.from.as_str()) else {
            return Err(DefinitionError::UnknownTaskReference {
                task_id: edge.from.clone(),
                side: "from",
            });
        };
        if !node_map.contains_key(edge.to.as_str()) {
            return Err(DefinitionError::UnknownTaskReference {
                task_id: edge.to.clone(),
                side: "to",
            });
        }
        if let Some(condition) = &edge.condition {
            if !from_node.outputs.iter().any(|f| f == &condition.field) {
                return Err(DefinitionError::UnknownOutputField {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    field: condition.field.clone(),
                });
            }
        }
    }

    // -----------------------------------------------------------------------
    // 3. Topological sort (Kahn's algorithm)
    // -----------------------------------------------------------------------
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut in_degree: HashMap<&str, usize> = HashMap::new();

    for node in &definition.nodes {
        adjacency.entry(node.id.as_str()).or_default();
        in_degree.entry(node.id.as_str()).or_insert(0);
    }

    for edge in &definition.edges {
        adjacency
            .entry(edge.from.as_str())
            .or_default()
            .push(edge.to.as_str());
        *in_degree.entry(edge.to.as_str()).or_insert(0) += 1;
    }

    // Seed the queue with tasks that have no incoming edges.
    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut sorted: Vec<String> = Vec::with_capacity(definition.nodes.len());

    while let Some(task_id) = queue.pop_front() {
        sorted.push(task_id.to_owned());

        if let Some(neighbours) = adjacency.get(task_id) {
            for &neighbour in neighbours {
                let deg = in_degree.entry(neighbour).or_insert(0);
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(neighbour);
                }
            }
        }
    }

    // If we didn't visit every task the graph contains a cycle.
    if sorted.len() != definition.nodes.len() {
        return Err(DefinitionError::CycleDetected);
    }

    // -----------------------------------------------------------------------
    // 4. Index the validated graph
    // -----------------------------------------------------------------------
    let mut upstream: HashMap<String, Vec<Edge>> = HashMap::new();
    let mut downstream: HashMap<String, Vec<String>> = HashMap::new();
    for edge in &definition.edges {
        upstream
            .entry(edge.to.clone())
            .or_default()
            .push(edge.clone());
        downstream
            .entry(edge.from.clone())
            .or_default()
            .push(edge.to.clone());
    }

    let leaves: Vec<String> = sorted
        .iter()
        .filter(|id| !downstream.contains_key(*id))
        .cloned()
        .collect();

    Ok(CompiledGraph {
        workflow_id: definition.id.clone(),
        version: definition.version,
        nodes: definition
            .nodes
            .iter()
            .map(|n| (n.id.clone(), n.clone()))
            .collect(),
        upstream,
        downstream,
        topo_order: sorted,
        leaves,
        groups: definition.groups.clone(),
        default_policy: definition.default_policy.clone(),
    })
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskNode, WorkflowDefinition};
    use serde_json::json;

    fn make_workflow(nodes: Vec<TaskNode>, edges: Vec<(&str, &str)>) -> WorkflowDefinition {
        let mut builder = WorkflowDefinition::builder("test");
        for node in nodes {
            builder = builder.node(node);
        }
        for (from, to) in edges {
            builder = builder.edge(from, to);
        }
        // Bypass build() here; compile() is the unit under test.
        builder.definition
    }

    #[test]
    fn valid_linear_dag_returns_sorted_order() {
        // ingest → validate → export
        let wf = make_workflow(
            vec![
                TaskNode::compute("ingest"),
                TaskNode::compute("validate"),
                TaskNode::compute("export"),
            ],
            vec![("ingest", "validate"), ("validate", "export")],
        );

        let graph = compile(&wf).expect("should be valid");
        let order: Vec<&String> = graph.task_ids().collect();
        assert_eq!(order, ["ingest", "validate", "export"]);
        assert_eq!(graph.leaves(), ["export"]);
    }

    #[test]
    fn valid_diamond_dag() {
        //   a
        //  / \
        // b   c
        //  \ /
        //   d
        let wf = make_workflow(
            vec![
                TaskNode::compute("a"),
                TaskNode::compute("b"),
                TaskNode::compute("c"),
                TaskNode::compute("d"),
            ],
            vec![("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );

        let graph = compile(&wf).expect("should be valid");
        let order: Vec<&String> = graph.task_ids().collect();
        assert_eq!(order.first().unwrap().as_str(), "a");
        assert_eq!(order.last().unwrap().as_str(), "d");
        assert_eq!(graph.task_count(), 4);
        assert_eq!(graph.upstream_edges("d").len(), 2);
        assert_eq!(graph.downstream_of("a"), ["b", "c"]);
    }

    #[test]
    fn duplicate_task_id_is_rejected() {
        let wf = make_workflow(
            vec![TaskNode::compute("a"), TaskNode::compute("a")], // duplicate!
            vec![],
        );
        assert!(matches!(
            compile(&wf),
            Err(DefinitionError::DuplicateTaskId(id)) if id == "a"
        ));
    }

    #[test]
    fn edge_referencing_missing_task_is_rejected() {
        let wf = make_workflow(
            vec![TaskNode::compute("a")],
            vec![("a", "ghost")], // ghost doesn't exist
        );
        assert!(matches!(
            compile(&wf),
            Err(DefinitionError::UnknownTaskReference { task_id, .. }) if task_id == "ghost"
        ));
    }

    #[test]
    fn cycle_is_detected() {
        // a → b → c → a  (cycle!)
        let wf = make_workflow(
            vec![
                TaskNode::compute("a"),
                TaskNode::compute("b"),
                TaskNode::compute("c"),
            ],
            vec![("a", "b"), ("b", "c"), ("c", "a")],
        );
        assert!(matches!(compile(&wf), Err(DefinitionError::CycleDetected)));
    }

    #[test]
    fn condition_on_undeclared_output_is_rejected() {
        let wf = WorkflowDefinition::builder("gated")
            .node(TaskNode::compute("check").outputs(&["is_valid"]))
            .node(TaskNode::compute("train"))
            .edge_if("check", "train", "accuracy_ok", json!(true)) // not declared
            .definition;

        assert!(matches!(
            compile(&wf),
            Err(DefinitionError::UnknownOutputField { field, .. }) if field == "accuracy_ok"
        ));
    }

    #[test]
    fn condition_on_declared_output_compiles() {
        let wf = WorkflowDefinition::builder("gated")
            .node(TaskNode::compute("check").outputs(&["is_valid"]))
            .node(TaskNode::compute("train"))
            .edge_if("check", "train", "is_valid", json!(true))
            .definition;

        assert!(compile(&wf).is_ok());
    }

    #[test]
    fn single_task_no_edges_is_valid() {
        let wf = make_workflow(vec![TaskNode::compute("solo")], vec![]);
        let graph = compile(&wf).expect("single task should be valid");
        assert_eq!(graph.leaves(), ["solo"]);
        assert!(graph.upstream_edges("solo").is_empty());
    }

    #[test]
    fn groups_are_indexed_for_reporting() {
        let wf = WorkflowDefinition::builder("grouped")
            .node(TaskNode::compute("a"))
            .node(TaskNode::compute("b"))
            .group("bronze", &["a"])
            .definition;

        let graph = compile(&wf).unwrap();
        assert_eq!(graph.group_of("a"), Some("bronze"));
        assert_eq!(graph.group_of("b"), None);
    }
}
