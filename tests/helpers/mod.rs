#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;

use flowcheck::Diagnostic;
use flowcheck::parse::NodeInstance;
use flowcheck::registry::{NodeCategory, NodeDescriptor, NodeRegistry};
use flowcheck::resolve::{CatalogError, DataSourceCatalog, FieldDescriptor, FilterDescriptor, StaticCatalog};
use flowcheck::schema::{Field, PrimitiveKind, Schema};

// =============================================================================
// Registry
// =============================================================================

/// Emits constants: `{ category: "shoes"; source: "orders"; name: string; price: number }`.
pub const PRODUCT: &str = "product";

/// Built-in node types plus `product`.
pub fn registry() -> NodeRegistry {
    let mut registry = NodeRegistry::builtin();
    registry
        .register(
            PRODUCT,
            NodeDescriptor::fixed(
                NodeCategory::Data,
                Schema::empty_record(),
                Schema::record([
                    ("category", Field::required(Schema::literal("shoes"))),
                    ("source", Field::required(Schema::literal("orders"))),
                    ("name", Field::required(Schema::string())),
                    ("price", Field::required(Schema::number())),
                ]),
            ),
        )
        .expect("product registers");
    registry
}

// =============================================================================
// Catalogs
// =============================================================================

/// One source, `orders`: a required `status` filter limited to open/closed,
/// an optional `region` filter, and rows of `{ category; total; region? }`.
pub fn catalog() -> StaticCatalog {
    StaticCatalog::new().with_source(
        "orders",
        vec![
            FilterDescriptor {
                name: "status".into(),
                kind: PrimitiveKind::String,
                required: true,
                options: Some(vec!["open".into(), "closed".into()]),
            },
            FilterDescriptor {
                name: "region".into(),
                kind: PrimitiveKind::String,
                required: false,
                options: None,
            },
        ],
        vec![
            field("category", PrimitiveKind::String, true),
            field("total", PrimitiveKind::Number, true),
            field("region", PrimitiveKind::String, false),
        ],
    )
}

fn field(name: &str, kind: PrimitiveKind, required: bool) -> FieldDescriptor {
    FieldDescriptor {
        name: name.into(),
        kind,
        required,
    }
}

/// Every lookup fails.
pub struct FailingCatalog;

#[async_trait]
impl DataSourceCatalog for FailingCatalog {
    async fn describe_filters(&self, _: &str) -> Result<Vec<FilterDescriptor>, CatalogError> {
        Err(CatalogError::Unavailable("maintenance".into()))
    }

    async fn describe_output_shape(&self, _: &str) -> Result<Vec<FieldDescriptor>, CatalogError> {
        Err(CatalogError::Unavailable("maintenance".into()))
    }
}

/// Every lookup hangs until the caller gives up.
pub struct StalledCatalog;

#[async_trait]
impl DataSourceCatalog for StalledCatalog {
    async fn describe_filters(&self, _: &str) -> Result<Vec<FilterDescriptor>, CatalogError> {
        std::future::pending().await
    }

    async fn describe_output_shape(&self, _: &str) -> Result<Vec<FieldDescriptor>, CatalogError> {
        std::future::pending().await
    }
}

// =============================================================================
// Node builders
// =============================================================================

pub fn product() -> NodeInstance {
    NodeInstance::new(PRODUCT, json!({}))
}

/// `orders` data source with a valid filter selection.
pub fn orders() -> NodeInstance {
    NodeInstance::new("dataSource", json!({ "sourceId": "orders", "filters": { "status": "open" } }))
}

pub fn render(title: &str) -> NodeInstance {
    NodeInstance::new("render", json!({ "title": title }))
}

/// Branch comparing its bound `value` for equality with `compare_to`.
pub fn branch(compare_to: serde_json::Value) -> NodeInstance {
    NodeInstance::new("branch", json!({ "operator": "eq", "compareTo": compare_to }))
}

pub fn aggregate(group_by: &str) -> NodeInstance {
    NodeInstance::new("aggregate", json!({ "sourceId": "orders", "groupBy": group_by }))
}

// =============================================================================
// Assertions
// =============================================================================

pub fn codes(diagnostics: &[Diagnostic]) -> Vec<&str> {
    diagnostics.iter().map(|d| d.code.as_str()).collect()
}

/// One rendered diagnostic per line.
pub fn rendered(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
