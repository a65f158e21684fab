//! The per-node-type descriptor contract.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::schema::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeCategory {
    Data,
    Logic,
    Output,
}

/// How a node type refines its config schema at validation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DynamicConfig {
    /// Adds a `filters` record built from the catalog's filter descriptors
    /// for the configured `sourceId`.
    SourceFilters,
}

/// How a node type refines its output schema at validation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DynamicOutput {
    /// `{ items: {fields}[], count: number }` from the source's output shape.
    SourceRows,
    /// `{ groups: { key, count }[], total: number }`, keyed by the source
    /// field named in `groupBy`.
    GroupedBySourceField,
}

impl DynamicConfig {
    /// Config fields that must hold valid literals before resolution can run.
    pub fn base_fields(&self) -> &'static [&'static str] {
        match self {
            DynamicConfig::SourceFilters => &["sourceId"],
        }
    }
}

impl DynamicOutput {
    pub fn base_fields(&self) -> &'static [&'static str] {
        match self {
            DynamicOutput::SourceRows => &["sourceId"],
            DynamicOutput::GroupedBySourceField => &["sourceId", "groupBy"],
        }
    }
}

/// Static description of a node type. Registered once, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    pub category: NodeCategory,
    pub config: Schema,
    pub output: Schema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_config: Option<DynamicConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_output: Option<DynamicOutput>,
}

impl NodeDescriptor {
    /// A descriptor with static schemas only.
    pub fn fixed(category: NodeCategory, config: Schema, output: Schema) -> Self {
        NodeDescriptor {
            category,
            config,
            output,
            dynamic_config: None,
            dynamic_output: None,
        }
    }

    pub fn with_dynamic_config(mut self, dynamic: DynamicConfig) -> Self {
        self.dynamic_config = Some(dynamic);
        self
    }

    pub fn with_dynamic_output(mut self, dynamic: DynamicOutput) -> Self {
        self.dynamic_output = Some(dynamic);
        self
    }

    pub fn has_dynamic_config(&self) -> bool {
        self.dynamic_config.is_some()
    }

    pub fn has_dynamic_output(&self) -> bool {
        self.dynamic_output.is_some()
    }

    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        serde_json::from_str(json).map_err(ParseError::Descriptor)
    }
}
