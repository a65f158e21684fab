//! Rust types mirroring the builder's workflow JSON.
//!
//! A graph is built fresh from builder state for every validation request
//! and is never persisted by this crate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::FieldPath;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    /// Nodes keyed by id. Ordered so every pass visits them identically.
    pub nodes: BTreeMap<String, NodeInstance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInstance {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

/// A data dependency: `field` in this node's config is fed from
/// `source_path` in the output of node `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub field: FieldPath,
    pub source: String,
    #[serde(default)]
    pub source_path: FieldPath,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, mostly for tests and embedding code.
    pub fn with_node(mut self, id: impl Into<String>, node: NodeInstance) -> Self {
        self.nodes.insert(id.into(), node);
        self
    }

    pub fn node(&self, id: &str) -> Option<&NodeInstance> {
        self.nodes.get(id)
    }
}

impl NodeInstance {
    pub fn new(node_type: impl Into<String>, config: serde_json::Value) -> Self {
        NodeInstance {
            node_type: node_type.into(),
            config,
            bindings: Vec::new(),
        }
    }

    pub fn bind(mut self, field: &str, source: &str, source_path: &str) -> Self {
        self.bindings.push(Binding {
            field: FieldPath::parse(field),
            source: source.to_string(),
            source_path: FieldPath::parse(source_path),
        });
        self
    }

    /// Config paths supplied by bindings rather than literal values.
    pub fn bound_fields(&self) -> Vec<FieldPath> {
        self.bindings.iter().map(|b| b.field.clone()).collect()
    }
}
