//! Parse phase: builder JSON → workflow graph + dependency graph.

pub mod graph;
pub mod types;

pub use graph::DependencyGraph;
pub use types::*;

use crate::error::ParseError;

/// Deserialize a workflow graph JSON string.
pub fn parse_graph(json: &str) -> Result<WorkflowGraph, ParseError> {
    serde_json::from_str::<WorkflowGraph>(json).map_err(ParseError::Graph)
}
