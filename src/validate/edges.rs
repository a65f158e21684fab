//! Per-binding edge checks (M001, M002, C002).

use std::collections::HashMap;

use crate::error::Diagnostic;
use crate::parse::{Binding, NodeInstance};
use crate::resolve::ResolvedNode;
use crate::schema::{FieldPath, is_compatible, resolve_path};

/// Check every binding of `node` against the resolved schemas, in binding
/// declaration order. Bindings whose source was not resolved (blocked or
/// absent) are skipped.
pub fn validate_bindings(
    node_id: &str,
    node: &NodeInstance,
    consumer: &ResolvedNode,
    resolved: &HashMap<String, ResolvedNode>,
) -> Vec<Diagnostic> {
    node.bindings
        .iter()
        .filter_map(|binding| {
            let upstream = resolved.get(&binding.source)?;
            check_binding(node_id, binding, consumer, upstream)
        })
        .collect()
}

fn check_binding(
    node_id: &str,
    binding: &Binding,
    consumer: &ResolvedNode,
    upstream: &ResolvedNode,
) -> Option<Diagnostic> {
    let expected = match resolve_path(&consumer.config, &binding.field) {
        Ok(schema) => schema,
        // A fallback schema is missing whatever the failed resolution would
        // have added; that failure is already reported.
        Err(_) if consumer.config_degraded => return None,
        Err(not_found) => {
            return Some(Diagnostic::missing_field(
                "M002",
                node_id,
                binding.field.clone(),
                format!(
                    "Config has no field '{}'",
                    not_found.segment(&binding.field).unwrap_or_default()
                ),
            ));
        }
    };

    let found = match resolve_path(&upstream.output, &binding.source_path) {
        Ok(schema) => schema,
        Err(_) if upstream.output_degraded => return None,
        Err(not_found) => {
            return Some(Diagnostic::missing_field(
                "M001",
                node_id,
                binding.field.clone(),
                format!(
                    "Output of node '{}' has no field '{}' (bound from {})",
                    binding.source,
                    not_found.segment(&binding.source_path).unwrap_or_default(),
                    source_ref(&binding.source, &binding.source_path)
                ),
            ));
        }
    };

    if is_compatible(&expected, &found) {
        return None;
    }
    Some(Diagnostic::compatibility(
        "C002",
        node_id,
        binding.field.clone(),
        format!(
            "{} from {} is not assignable to {}",
            found,
            source_ref(&binding.source, &binding.source_path),
            expected
        ),
        expected,
        Some(found),
    ))
}

fn source_ref(source: &str, path: &FieldPath) -> String {
    if path.is_root() {
        format!("'{}'", source)
    } else {
        format!("'{}.{}'", source, path)
    }
}
