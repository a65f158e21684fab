//! petgraph-based dependency graph over a workflow's bindings.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use super::types::WorkflowGraph;

/// Edge weight: index of the binding in the consumer's binding list.
pub type BindingIndex = usize;

/// Directed graph with an edge `source → consumer` per binding whose source
/// exists. Bindings to unknown nodes are kept aside as dangling.
pub struct DependencyGraph {
    pub graph: DiGraph<String, BindingIndex>,
    pub node_indices: HashMap<String, NodeIndex>,
    /// `(consumer, binding index, missing source id)`.
    pub dangling: Vec<(String, BindingIndex, String)>,
}

impl DependencyGraph {
    pub fn build(workflow: &WorkflowGraph) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut dangling = Vec::new();

        // Nodes in id order so petgraph traversals are deterministic.
        for id in workflow.nodes.keys() {
            let idx = graph.add_node(id.clone());
            node_indices.insert(id.clone(), idx);
        }

        for (consumer, node) in &workflow.nodes {
            let target = node_indices[consumer];
            for (i, binding) in node.bindings.iter().enumerate() {
                match node_indices.get(&binding.source) {
                    Some(&source) => {
                        graph.add_edge(source, target, i);
                    }
                    None => dangling.push((consumer.clone(), i, binding.source.clone())),
                }
            }
        }

        DependencyGraph {
            graph,
            node_indices,
            dangling,
        }
    }

    pub fn id(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::parse::NodeInstance;

    #[test]
    fn builds_edges_and_collects_dangling_bindings() {
        let workflow = WorkflowGraph::new()
            .with_node("a", NodeInstance::new("dataSource", json!({ "sourceId": "orders" })))
            .with_node(
                "b",
                NodeInstance::new("render", json!({}))
                    .bind("title", "a", "count")
                    .bind("rows", "a", "items")
                    .bind("value", "ghost", "x"),
            );
        let deps = DependencyGraph::build(&workflow);
        assert_eq!(deps.graph.edge_count(), 2);
        let (a, b) = (deps.node_indices["a"], deps.node_indices["b"]);
        assert_eq!(deps.graph.edges_connecting(a, b).count(), 2);
        assert_eq!(deps.id(b), "b");
        assert_eq!(deps.dangling, vec![("b".to_string(), 2, "ghost".to_string())]);
    }
}
