//! Dynamic refinement of a node's config and output schemas.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::catalog::{CatalogError, DataSourceCatalog, FieldDescriptor, FilterDescriptor};
use crate::error::ResolveError;
use crate::registry::{DynamicConfig, DynamicOutput, NodeDescriptor};
use crate::schema::{Field, FieldPath, Schema};

const SOURCE_ID: &str = "sourceId";
const GROUP_BY: &str = "groupBy";

/// Schemas of one node for one validation pass.
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    pub config: Schema,
    pub output: Schema,
    /// The config schema is the static fallback of a failed resolution.
    pub config_degraded: bool,
    /// The output schema is the static fallback of a failed resolution.
    pub output_degraded: bool,
    pub failures: Vec<ResolveFailure>,
}

/// A resolution that fell back, attributed to the config field at fault.
#[derive(Debug, Clone)]
pub struct ResolveFailure {
    pub field: FieldPath,
    pub error: ResolveError,
}

impl ResolvedNode {
    /// Static schemas only; used for nodes without dynamic capabilities.
    pub fn fixed(descriptor: &NodeDescriptor) -> Self {
        ResolvedNode {
            config: descriptor.config.clone(),
            output: descriptor.output.clone(),
            config_degraded: false,
            output_degraded: false,
            failures: Vec::new(),
        }
    }
}

/// Why a dynamic side fell back to its static schema.
enum Fallback {
    /// Reported to the caller as a resolution failure.
    Failed(ResolveFailure),
    /// A base field is bound to an upstream node that was never resolved.
    /// That node already carries its own diagnostic.
    Unresolved(FieldPath),
}

impl From<ResolveFailure> for Fallback {
    fn from(failure: ResolveFailure) -> Self {
        Fallback::Failed(failure)
    }
}

/// Per-node memo of catalog answers, so each description is fetched at
/// most once while resolving a node.
#[derive(Default)]
struct Lookups {
    filters: Option<Result<Vec<FilterDescriptor>, ResolveError>>,
    fields: Option<Result<Vec<FieldDescriptor>, ResolveError>>,
}

pub struct SchemaResolver<'a> {
    catalog: &'a dyn DataSourceCatalog,
    timeout: Duration,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(catalog: &'a dyn DataSourceCatalog, timeout: Duration) -> Self {
        SchemaResolver { catalog, timeout }
    }

    /// Resolve both schemas of a node from its effective configuration.
    /// `bound` lists config paths fed by upstream nodes; `unresolved` is the
    /// subset whose upstream node was left out of the pass.
    ///
    /// Never fails: each dynamic side that cannot be resolved falls back to
    /// the descriptor's static schema and records why. A side whose base
    /// field comes from an unresolved upstream falls back without a record.
    ///
    /// Catalog deadlines use Tokio's timer, so a node with dynamic schemas
    /// must be resolved inside a Tokio runtime.
    pub async fn resolve(
        &self,
        node_id: &str,
        descriptor: &NodeDescriptor,
        config: &Value,
        bound: &[FieldPath],
        unresolved: &[FieldPath],
    ) -> ResolvedNode {
        let mut resolved = ResolvedNode::fixed(descriptor);
        if !descriptor.has_dynamic_config() && !descriptor.has_dynamic_output() {
            return resolved;
        }

        let mut lookups = Lookups::default();
        let mut failures = Vec::new();

        if let Some(dynamic) = descriptor.dynamic_config {
            let inputs = Inputs { config, bound, unresolved };
            match self.refine_config(dynamic, &descriptor.config, &inputs, &mut lookups).await {
                Ok(schema) => resolved.config = schema,
                Err(fallback) => {
                    resolved.config_degraded = true;
                    failures.push(fallback);
                }
            }
        }

        if let Some(dynamic) = descriptor.dynamic_output {
            let inputs = Inputs { config, bound, unresolved };
            match self.refine_output(dynamic, &descriptor.output, &inputs, &mut lookups).await {
                Ok(schema) => resolved.output = schema,
                Err(fallback) => {
                    resolved.output_degraded = true;
                    failures.push(fallback);
                }
            }
        }

        // Config and output usually fail for the same reason; report it once.
        for fallback in failures {
            let failure = match fallback {
                Fallback::Failed(failure) => failure,
                Fallback::Unresolved(field) => {
                    debug!(node = node_id, field = %field, "upstream not resolved; using static schema");
                    continue;
                }
            };
            let duplicate = resolved.failures.iter().any(|seen| {
                seen.field == failure.field && seen.error.to_string() == failure.error.to_string()
            });
            if !duplicate {
                warn!(node = node_id, field = %failure.field, error = %failure.error, "dynamic resolution fell back to static schema");
                resolved.failures.push(failure);
            }
        }

        resolved
    }

    async fn refine_config(
        &self,
        dynamic: DynamicConfig,
        fallback: &Schema,
        inputs: &Inputs<'_>,
        lookups: &mut Lookups,
    ) -> Result<Schema, Fallback> {
        match dynamic {
            DynamicConfig::SourceFilters => {
                let source_id = inputs.base_string(SOURCE_ID)?;
                let filters = self.filters(source_id, lookups).await.map_err(at(SOURCE_ID))?;

                let any_required = filters.iter().any(|f| f.required);
                let filter_fields = filters.iter().map(|f| (f.name.clone(), filter_field(f)));
                let filters_field = Field {
                    schema: Schema::record(filter_fields),
                    required: any_required,
                };
                Ok(extend_record(fallback, [("filters".to_string(), filters_field)]))
            }
        }
    }

    async fn refine_output(
        &self,
        dynamic: DynamicOutput,
        fallback: &Schema,
        inputs: &Inputs<'_>,
        lookups: &mut Lookups,
    ) -> Result<Schema, Fallback> {
        let source_id = inputs.base_string(SOURCE_ID)?;
        match dynamic {
            DynamicOutput::SourceRows => {
                let fields = self.fields(source_id, lookups).await.map_err(at(SOURCE_ID))?;
                let row = Schema::record(fields.iter().map(|f| {
                    let field = Field {
                        schema: Schema::primitive(f.kind),
                        required: f.required,
                    };
                    (f.name.clone(), field)
                }));
                Ok(extend_record(
                    fallback,
                    [("items".to_string(), Field::required(Schema::array(row)))],
                ))
            }
            DynamicOutput::GroupedBySourceField => {
                let group_by = inputs.base_string(GROUP_BY)?;
                let fields = self.fields(source_id, lookups).await.map_err(at(SOURCE_ID))?;
                let Some(key) = fields.iter().find(|f| f.name == group_by) else {
                    return Err(Fallback::Failed(ResolveFailure {
                        field: FieldPath::parse(GROUP_BY),
                        error: ResolveError::InvalidBaseField {
                            field: GROUP_BY.to_string(),
                            reason: format!("'{}' is not a field of source '{}'", group_by, source_id),
                        },
                    }));
                };
                let group = Schema::record([
                    ("key", Field::required(Schema::primitive(key.kind))),
                    ("count", Field::required(Schema::number())),
                ]);
                Ok(extend_record(
                    fallback,
                    [("groups".to_string(), Field::required(Schema::array(group)))],
                ))
            }
        }
    }

    async fn filters(&self, source_id: &str, lookups: &mut Lookups) -> Result<Vec<FilterDescriptor>, ResolveError> {
        if let Some(cached) = &lookups.filters {
            return cached.clone();
        }
        let result = self.with_deadline(self.catalog.describe_filters(source_id)).await;
        lookups.filters = Some(result.clone());
        result
    }

    async fn fields(&self, source_id: &str, lookups: &mut Lookups) -> Result<Vec<FieldDescriptor>, ResolveError> {
        if let Some(cached) = &lookups.fields {
            return cached.clone();
        }
        let result = self.with_deadline(self.catalog.describe_output_shape(source_id)).await;
        lookups.fields = Some(result.clone());
        result
    }

    async fn with_deadline<T>(
        &self,
        call: impl Future<Output = Result<T, CatalogError>>,
    ) -> Result<T, ResolveError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(ResolveError::from),
            Err(_) => Err(ResolveError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}

fn at(field: &'static str) -> impl Fn(ResolveError) -> ResolveFailure {
    move |error| ResolveFailure {
        field: FieldPath::parse(field),
        error,
    }
}

/// What a resolution reads from the node.
struct Inputs<'v> {
    config: &'v Value,
    bound: &'v [FieldPath],
    unresolved: &'v [FieldPath],
}

impl<'v> Inputs<'v> {
    /// A base config field that must be a non-empty string literal.
    fn base_string(&self, field: &str) -> Result<&'v str, Fallback> {
        let path = FieldPath::parse(field);
        let fail = |error| {
            Fallback::Failed(ResolveFailure {
                field: path.clone(),
                error,
            })
        };
        match self.config.get(field) {
            None | Some(Value::Null) if self.unresolved.contains(&path) => {
                Err(Fallback::Unresolved(path.clone()))
            }
            None | Some(Value::Null) if self.bound.contains(&path) => {
                Err(fail(ResolveError::UnresolvedBinding {
                    field: field.to_string(),
                }))
            }
            None | Some(Value::Null) => Err(fail(ResolveError::MissingBaseField {
                field: field.to_string(),
            })),
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.as_str()),
            Some(_) => Err(fail(ResolveError::InvalidBaseField {
                field: field.to_string(),
                reason: "expected a non-empty string".to_string(),
            })),
        }
    }
}

fn filter_field(filter: &FilterDescriptor) -> Field {
    let schema = filter
        .options
        .as_ref()
        .and_then(|options| Schema::union(options.iter().cloned().map(Schema::literal)).ok())
        .unwrap_or_else(|| Schema::primitive(filter.kind));
    Field {
        schema,
        required: filter.required,
    }
}

/// `base` with `extra` fields added (or replaced). A non-record base is
/// replaced by a record of just the extra fields.
fn extend_record(base: &Schema, extra: impl IntoIterator<Item = (String, Field)>) -> Schema {
    let mut fields = base.fields().cloned().unwrap_or_default();
    fields.extend(extra);
    Schema::Record { fields }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::registry::{NodeRegistry, builtin};
    use crate::resolve::StaticCatalog;
    use crate::schema::{PrimitiveKind, resolve_path};

    fn orders() -> StaticCatalog {
        StaticCatalog::new().with_source(
            "orders",
            vec![FilterDescriptor {
                name: "status".into(),
                kind: PrimitiveKind::String,
                required: true,
                options: Some(vec!["open".into(), "closed".into()]),
            }],
            vec![
                FieldDescriptor {
                    name: "category".into(),
                    kind: PrimitiveKind::String,
                    required: true,
                },
                FieldDescriptor {
                    name: "total".into(),
                    kind: PrimitiveKind::Number,
                    required: false,
                },
            ],
        )
    }

    #[tokio::test]
    async fn refines_data_source_config_and_output() {
        let registry = NodeRegistry::builtin();
        let descriptor = registry.lookup(builtin::DATA_SOURCE).unwrap();
        let catalog = orders();
        let resolver = SchemaResolver::new(&catalog, Duration::from_secs(1));

        let resolved = resolver
            .resolve("n", descriptor, &json!({ "sourceId": "orders" }), &[], &[])
            .await;
        assert!(resolved.failures.is_empty());
        assert_eq!(
            resolve_path(&resolved.config, &"filters.status".into()),
            Ok(Schema::one_of_strings(["open", "closed"]).unwrap())
        );
        assert_eq!(
            resolved.output.to_string(),
            "{ count: number; items: { category: string; total?: number }[] }"
        );
    }

    #[tokio::test]
    async fn missing_source_falls_back_once() {
        let registry = NodeRegistry::builtin();
        let descriptor = registry.lookup(builtin::DATA_SOURCE).unwrap();
        let catalog = orders();
        let resolver = SchemaResolver::new(&catalog, Duration::from_secs(1));

        let resolved = resolver.resolve("n", descriptor, &json!({}), &[], &[]).await;
        assert!(resolved.config_degraded && resolved.output_degraded);
        assert_eq!(resolved.config, descriptor.config);
        assert_eq!(resolved.output, descriptor.output);
        assert_eq!(resolved.failures.len(), 1);
        assert!(matches!(
            resolved.failures[0].error,
            ResolveError::MissingBaseField { .. }
        ));

        let bound = [FieldPath::parse("sourceId")];
        let resolved = resolver.resolve("n", descriptor, &json!({}), &bound, &[]).await;
        assert!(matches!(
            resolved.failures[0].error,
            ResolveError::UnresolvedBinding { .. }
        ));
    }

    #[tokio::test]
    async fn source_from_unresolved_upstream_falls_back_silently() {
        let registry = NodeRegistry::builtin();
        let descriptor = registry.lookup(builtin::DATA_SOURCE).unwrap();
        let catalog = orders();
        let resolver = SchemaResolver::new(&catalog, Duration::from_secs(1));

        let bound = [FieldPath::parse("sourceId")];
        let resolved = resolver.resolve("n", descriptor, &json!({}), &bound, &bound).await;
        assert!(resolved.config_degraded && resolved.output_degraded);
        assert!(resolved.failures.is_empty());
        assert_eq!(resolved.output, descriptor.output);
    }

    #[tokio::test]
    async fn unknown_group_by_field_is_invalid() {
        let registry = NodeRegistry::builtin();
        let descriptor = registry.lookup(builtin::AGGREGATE).unwrap();
        let catalog = orders();
        let resolver = SchemaResolver::new(&catalog, Duration::from_secs(1));

        let ok = resolver
            .resolve("n", descriptor, &json!({ "sourceId": "orders", "groupBy": "category" }), &[], &[])
            .await;
        assert_eq!(
            resolve_path(&ok.output, &"groups".into()).unwrap().to_string(),
            "{ key: string; count: number }[]"
        );

        let bad = resolver
            .resolve("n", descriptor, &json!({ "sourceId": "orders", "groupBy": "colour" }), &[], &[])
            .await;
        assert!(bad.output_degraded);
        assert_eq!(bad.failures[0].field, FieldPath::parse("groupBy"));
    }

    struct CountingCatalog {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DataSourceCatalog for CountingCatalog {
        async fn describe_filters(&self, _source_id: &str) -> Result<Vec<FilterDescriptor>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CatalogError::Unavailable("maintenance".into()))
        }

        async fn describe_output_shape(&self, _source_id: &str) -> Result<Vec<FieldDescriptor>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CatalogError::Unavailable("maintenance".into()))
        }
    }

    #[tokio::test]
    async fn catalog_errors_are_recorded_per_call() {
        let registry = NodeRegistry::builtin();
        let descriptor = registry.lookup(builtin::DATA_SOURCE).unwrap();
        let catalog = CountingCatalog {
            calls: AtomicUsize::new(0),
        };
        let resolver = SchemaResolver::new(&catalog, Duration::from_secs(1));

        let resolved = resolver
            .resolve("n", descriptor, &json!({ "sourceId": "orders" }), &[], &[])
            .await;
        // One call per description; both fail identically and are reported once.
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolved.failures.len(), 1);
        assert_eq!(resolved.failures[0].error.code(), "R002");
    }

    struct StalledCatalog;

    #[async_trait]
    impl DataSourceCatalog for StalledCatalog {
        async fn describe_filters(&self, _source_id: &str) -> Result<Vec<FilterDescriptor>, CatalogError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }

        async fn describe_output_shape(&self, _source_id: &str) -> Result<Vec<FieldDescriptor>, CatalogError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_catalog_times_out() {
        let registry = NodeRegistry::builtin();
        let descriptor = registry.lookup(builtin::AGGREGATE).unwrap();
        let resolver = SchemaResolver::new(&StalledCatalog, Duration::from_millis(250));

        let resolved = resolver
            .resolve("n", descriptor, &json!({ "sourceId": "orders", "groupBy": "category" }), &[], &[])
            .await;
        assert!(resolved.output_degraded);
        assert!(matches!(resolved.failures[0].error, ResolveError::Timeout(250)));
    }
}
