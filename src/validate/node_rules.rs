//! Per-node configuration checks (M003, C001).
//! SYNC NOTE: Codes here must track the diagnostic table the builder uses
//! to group findings.

use serde_json::Value;

use crate::error::Diagnostic;
use crate::schema::{FieldPath, Schema, ValueIssue, check_value};

/// Check a node's literal config against its resolved config schema.
///
/// `bound` paths are fed by upstream nodes and checked as edges instead.
/// Findings under a path in `skip` are dropped; those fields already carry a
/// resolution failure.
pub fn validate_node_config(
    node_id: &str,
    config: &Value,
    schema: &Schema,
    bound: &[FieldPath],
    skip: &[FieldPath],
) -> Vec<Diagnostic> {
    check_value(schema, config, bound)
        .into_iter()
        .filter(|issue| !skip.iter().any(|s| issue.path().starts_with(s)))
        .map(|issue| match issue {
            ValueIssue::Missing { path, expected } => Diagnostic::missing_field(
                "M003",
                node_id,
                path,
                format!("Required config value of type {} is missing", expected),
            ),
            ValueIssue::Mismatch {
                path,
                expected,
                found,
            } => {
                let message = match &found {
                    Some(found) => format!("Config value {} is not assignable to {}", found, expected),
                    None => format!("Config value is not assignable to {}", expected),
                };
                Diagnostic::compatibility("C001", node_id, path, message, expected, found)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::DiagnosticKind;
    use crate::schema::Field;

    fn schema() -> Schema {
        Schema::record([
            ("title", Field::required(Schema::string())),
            ("limit", Field::optional(Schema::number())),
        ])
    }

    #[test]
    fn missing_and_mismatched_values() {
        let diagnostics = validate_node_config("n", &json!({ "limit": "ten" }), &schema(), &[], &[]);
        assert_eq!(diagnostics.len(), 2);

        assert_eq!(diagnostics[0].code, "M003");
        assert_eq!(diagnostics[0].kind, DiagnosticKind::MissingField);
        assert_eq!(diagnostics[0].field_path, FieldPath::parse("title"));

        assert_eq!(diagnostics[1].code, "C001");
        assert_eq!(diagnostics[1].message, "Config value \"ten\" is not assignable to number");
        assert_eq!(diagnostics[1].expected, Some(Schema::number()));
    }

    #[test]
    fn bound_and_skipped_fields_are_not_reported() {
        let title = [FieldPath::parse("title")];
        assert!(validate_node_config("n", &json!({}), &schema(), &title, &[]).is_empty());
        assert!(validate_node_config("n", &json!({}), &schema(), &[], &title).is_empty());
    }
}
