//! Topological layering of the dependency graph.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::toposort;

use crate::parse::DependencyGraph;

/// Group the nodes outside `blocked` into layers: a node sits one layer below
/// its deepest upstream dependency. Layers are sorted by node id.
pub fn layers(deps: &DependencyGraph, blocked: &HashSet<String>) -> Vec<Vec<String>> {
    let graph = deps.graph.filter_map(
        |_, id| (!blocked.contains(id)).then(|| id.clone()),
        |_, &binding| Some(binding),
    );

    let Ok(order) = toposort(&graph, None) else {
        // Cyclic regions are blocked before ordering; keep every node visible anyway.
        let mut ids: Vec<String> = graph.node_weights().cloned().collect();
        ids.sort_unstable();
        return if ids.is_empty() { vec![] } else { vec![ids] };
    };

    let mut depth = HashMap::new();
    let mut grouped: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for idx in order {
        let level = graph
            .neighbors_directed(idx, Direction::Incoming)
            .filter_map(|pred| depth.get(&pred))
            .map(|d| d + 1)
            .max()
            .unwrap_or(0);
        depth.insert(idx, level);
        grouped.entry(level).or_default().push(graph[idx].clone());
    }

    grouped
        .into_values()
        .map(|mut layer| {
            layer.sort_unstable();
            layer
        })
        .collect()
}
