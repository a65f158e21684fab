//! Graph-level structural validation rules (S001–S003).

use std::collections::{BTreeMap, HashSet};

use petgraph::algo::tarjan_scc;

use crate::error::Diagnostic;
use crate::parse::{DependencyGraph, WorkflowGraph};
use crate::registry::NodeRegistry;

/// Structural findings plus the nodes they take out of the pass.
#[derive(Debug, Default)]
pub struct StructuralReport {
    pub diagnostics: Vec<Diagnostic>,
    /// Nodes that are not resolved or checked; edges leaving them are skipped.
    pub blocked: HashSet<String>,
}

/// Run all structural rules. Diagnostics come back sorted by node id.
pub fn validate_structural(
    workflow: &WorkflowGraph,
    deps: &DependencyGraph,
    registry: &NodeRegistry,
) -> StructuralReport {
    let mut report = StructuralReport::default();

    s001_bindings_reference_existing_nodes(workflow, deps, &mut report);
    s002_no_dependency_cycles(deps, &mut report);
    s003_node_types_are_registered(workflow, registry, &mut report);

    report.diagnostics.sort_by(|a, b| a.node_id.cmp(&b.node_id));
    report
}

fn s001_bindings_reference_existing_nodes(
    workflow: &WorkflowGraph,
    deps: &DependencyGraph,
    report: &mut StructuralReport,
) {
    // One finding per consuming node, whatever the number of bad bindings.
    let mut by_consumer: BTreeMap<&str, Vec<(usize, &str)>> = BTreeMap::new();
    for (consumer, binding_idx, source) in &deps.dangling {
        by_consumer
            .entry(consumer.as_str())
            .or_default()
            .push((*binding_idx, source.as_str()));
    }

    for (consumer, dangling) in by_consumer {
        let Some(node) = workflow.node(consumer) else {
            continue;
        };
        let field = node.bindings[dangling[0].0].field.clone();
        let mut sources: Vec<&str> = dangling.iter().map(|(_, s)| *s).collect();
        sources.sort_unstable();
        sources.dedup();
        report.diagnostics.push(Diagnostic::structural(
            "S001",
            consumer,
            field,
            format!("Bindings reference unknown node(s) {}", quoted(&sources)),
        ));
        report.blocked.insert(consumer.to_string());
    }
}

fn s002_no_dependency_cycles(deps: &DependencyGraph, report: &mut StructuralReport) {
    for component in tarjan_scc(&deps.graph) {
        let cyclic = component.len() > 1
            || deps.graph.find_edge(component[0], component[0]).is_some();
        if !cyclic {
            continue;
        }

        let mut ids: Vec<&str> = component.iter().map(|&idx| deps.id(idx)).collect();
        ids.sort_unstable();
        let message = if ids.len() == 1 {
            format!("Node '{}' depends on its own output", ids[0])
        } else {
            format!("Dependency cycle between nodes {}", quoted(&ids))
        };
        report.diagnostics.push(Diagnostic::structural(
            "S002",
            ids[0],
            Default::default(),
            message,
        ));
        report.blocked.extend(ids.iter().map(|id| id.to_string()));
    }
}

fn s003_node_types_are_registered(
    workflow: &WorkflowGraph,
    registry: &NodeRegistry,
    report: &mut StructuralReport,
) {
    for (id, node) in &workflow.nodes {
        if registry.lookup(&node.node_type).is_none() {
            report.diagnostics.push(Diagnostic::structural(
                "S003",
                id,
                Default::default(),
                format!("Unknown node type '{}'", node.node_type),
            ));
            report.blocked.insert(id.clone());
        }
    }
}

fn quoted(ids: &[&str]) -> String {
    ids.iter()
        .map(|id| format!("'{}'", id))
        .collect::<Vec<_>>()
        .join(", ")
}
