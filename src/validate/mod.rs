//! Workflow validation pass.
//!
//! Structural checks first, then per topological layer: dynamic resolution,
//! config checks and edge checks. Diagnostics are values; the pass itself
//! never fails.

pub mod edges;
pub mod node_rules;
pub mod structural;
pub mod topo;

use std::collections::HashMap;

use futures::StreamExt;
use futures::stream;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::config::ValidatorOptions;
use crate::error::Diagnostic;
use crate::parse::{DependencyGraph, NodeInstance, WorkflowGraph};
use crate::registry::NodeRegistry;
use crate::resolve::{DataSourceCatalog, ResolvedNode, SchemaResolver};
use crate::schema::{FieldPath, Schema, resolve_path};

pub struct Validator<'a> {
    registry: &'a NodeRegistry,
    catalog: &'a dyn DataSourceCatalog,
    options: ValidatorOptions,
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a NodeRegistry, catalog: &'a dyn DataSourceCatalog) -> Self {
        Validator {
            registry,
            catalog,
            options: ValidatorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate one snapshot of a workflow graph.
    ///
    /// The workflow is valid iff the returned list is empty. Re-running the
    /// pass on an unchanged graph against the same catalog answers yields the
    /// same list in the same order.
    ///
    /// Must be polled inside a Tokio runtime when the graph has dynamic
    /// nodes: catalog deadlines use Tokio's timer.
    #[instrument(name = "validate_workflow", skip_all, fields(nodes = graph.nodes.len()))]
    pub async fn validate(&self, graph: &WorkflowGraph) -> Vec<Diagnostic> {
        let deps = DependencyGraph::build(graph);
        let structural = structural::validate_structural(graph, &deps, self.registry);
        let mut diagnostics = structural.diagnostics;

        let resolver = SchemaResolver::new(self.catalog, self.options.resolution_timeout());
        // Schemas resolved during this pass; each node is resolved once.
        let mut resolved: HashMap<String, ResolvedNode> = HashMap::new();

        for (depth, layer) in topo::layers(&deps, &structural.blocked).into_iter().enumerate() {
            let jobs: Vec<_> = layer
                .iter()
                .filter_map(|id| {
                    let node = graph.node(id)?;
                    let descriptor = self.registry.lookup(&node.node_type)?;
                    Some((id, node, descriptor))
                })
                .map(|(id, node, descriptor)| {
                    let config = effective_config(node, &resolved);
                    let bound = node.bound_fields();
                    let unresolved = unresolved_fields(node, &resolved);
                    let resolver = &resolver;
                    async move {
                        let schemas = resolver
                            .resolve(id, descriptor, &config, &bound, &unresolved)
                            .await;
                        (id, node, bound, schemas)
                    }
                })
                .collect();

            let results: Vec<_> = stream::iter(jobs)
                .buffered(self.options.concurrency())
                .collect()
                .await;
            debug!(layer = depth, nodes = results.len(), "resolved layer");

            for (id, node, bound, schemas) in results {
                diagnostics.extend(self.check_node(id, node, &bound, &schemas, &resolved));
                resolved.insert(id.clone(), schemas);
            }
        }

        info!(
            diagnostics = diagnostics.len(),
            blocked = structural.blocked.len(),
            "validation finished"
        );
        diagnostics
    }

    /// Findings for one resolved node: resolution failures, then config
    /// findings, then edge findings.
    fn check_node(
        &self,
        node_id: &str,
        node: &NodeInstance,
        bound: &[FieldPath],
        schemas: &ResolvedNode,
        resolved: &HashMap<String, ResolvedNode>,
    ) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = schemas
            .failures
            .iter()
            .map(|failure| {
                Diagnostic::resolution_failure(
                    failure.error.code(),
                    node_id,
                    failure.field.clone(),
                    format!("Dynamic schema resolution failed: {}", failure.error),
                )
            })
            .collect();

        if self.options.check_config_values {
            let failed: Vec<FieldPath> = schemas.failures.iter().map(|f| f.field.clone()).collect();
            diagnostics.extend(node_rules::validate_node_config(
                node_id,
                &node.config,
                &schemas.config,
                bound,
                &failed,
            ));
        }

        diagnostics.extend(edges::validate_bindings(node_id, node, schemas, resolved));
        diagnostics
    }
}

/// Validate `graph` with default options.
pub async fn validate(
    graph: &WorkflowGraph,
    registry: &NodeRegistry,
    catalog: &dyn DataSourceCatalog,
) -> Vec<Diagnostic> {
    Validator::new(registry, catalog).validate(graph).await
}

/// The node's config with upstream constants filled in: a binding whose
/// source resolves to a literal supplies that value at its field path.
fn effective_config(node: &NodeInstance, resolved: &HashMap<String, ResolvedNode>) -> Value {
    let mut config = node.config.clone();
    for binding in &node.bindings {
        let Some(upstream) = resolved.get(&binding.source) else {
            continue;
        };
        if let Ok(Schema::Literal { value }) = resolve_path(&upstream.output, &binding.source_path) {
            set_path(&mut config, binding.field.segments(), value.to_json());
        }
    }
    config
}

/// Bound config paths whose source node was left out of the pass (blocked
/// by a structural finding). Upstream layers are always resolved first, so
/// an absent entry means the source was blocked.
fn unresolved_fields(node: &NodeInstance, resolved: &HashMap<String, ResolvedNode>) -> Vec<FieldPath> {
    node.bindings
        .iter()
        .filter(|binding| !resolved.contains_key(&binding.source))
        .map(|binding| binding.field.clone())
        .collect()
}

fn set_path(target: &mut Value, segments: &[String], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut cursor = target;
    for segment in parents {
        if !cursor.is_object() {
            *cursor = Value::Object(Default::default());
        }
        cursor = &mut cursor[segment.as_str()];
    }
    if !cursor.is_object() {
        *cursor = Value::Object(Default::default());
    }
    cursor[last.as_str()] = value;
}
