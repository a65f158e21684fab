//! The data-source catalog capability consumed by dynamic resolution.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{LiteralValue, PrimitiveKind};

/// A filter a data source accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDescriptor {
    pub name: String,
    pub kind: PrimitiveKind,
    #[serde(default)]
    pub required: bool,
    /// Closed set of accepted values, if the source restricts them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<LiteralValue>>,
}

/// A field of the records a data source produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: PrimitiveKind,
    #[serde(default = "present_by_default")]
    pub required: bool,
}

fn present_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("unknown data source '{0}'")]
    UnknownSource(String),

    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Read-only lookups against the data-source catalog. Implementations are
/// usually network-backed and may fail or stall; callers apply their own
/// deadline.
#[async_trait]
pub trait DataSourceCatalog: Send + Sync {
    async fn describe_filters(&self, source_id: &str) -> Result<Vec<FilterDescriptor>, CatalogError>;

    async fn describe_output_shape(&self, source_id: &str) -> Result<Vec<FieldDescriptor>, CatalogError>;
}

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    sources: HashMap<String, SourceDescription>,
}

#[derive(Debug, Clone, Default)]
struct SourceDescription {
    filters: Vec<FilterDescriptor>,
    fields: Vec<FieldDescriptor>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(
        mut self,
        source_id: impl Into<String>,
        filters: Vec<FilterDescriptor>,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        self.sources
            .insert(source_id.into(), SourceDescription { filters, fields });
        self
    }

    fn source(&self, source_id: &str) -> Result<&SourceDescription, CatalogError> {
        self.sources
            .get(source_id)
            .ok_or_else(|| CatalogError::UnknownSource(source_id.to_string()))
    }
}

#[async_trait]
impl DataSourceCatalog for StaticCatalog {
    async fn describe_filters(&self, source_id: &str) -> Result<Vec<FilterDescriptor>, CatalogError> {
        Ok(self.source(source_id)?.filters.clone())
    }

    async fn describe_output_shape(&self, source_id: &str) -> Result<Vec<FieldDescriptor>, CatalogError> {
        Ok(self.source(source_id)?.fields.clone())
    }
}
