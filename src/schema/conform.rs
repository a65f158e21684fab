//! Checking a literal JSON configuration value against a schema.

use serde_json::Value;

use super::path::FieldPath;
use super::types::{LiteralValue, PrimitiveKind, Schema};

#[derive(Debug, Clone, PartialEq)]
pub enum ValueIssue {
    /// A required record field has no value.
    Missing { path: FieldPath, expected: Schema },
    /// A value is present but has the wrong shape.
    Mismatch {
        path: FieldPath,
        expected: Schema,
        found: Option<Schema>,
    },
}

impl ValueIssue {
    pub fn path(&self) -> &FieldPath {
        match self {
            ValueIssue::Missing { path, .. } | ValueIssue::Mismatch { path, .. } => path,
        }
    }
}

/// Check `value` against `schema`. Paths in `bound` (and anything below
/// them) are supplied by upstream nodes and are not checked; a required
/// field is also not reported missing while any path below it is bound.
///
/// A null root is treated as an empty object.
pub fn check_value(schema: &Schema, value: &Value, bound: &[FieldPath]) -> Vec<ValueIssue> {
    let empty = Value::Object(serde_json::Map::new());
    let value = if value.is_null() { &empty } else { value };
    let mut issues = Vec::new();
    check(schema, value, &FieldPath::root(), bound, &mut issues);
    issues
}

fn check(schema: &Schema, value: &Value, path: &FieldPath, bound: &[FieldPath], issues: &mut Vec<ValueIssue>) {
    if bound.iter().any(|b| path.starts_with(b)) {
        return;
    }

    match schema {
        Schema::Union { variants } => {
            let accepted = variants.iter().any(|variant| {
                let mut scratch = Vec::new();
                check(variant, value, path, bound, &mut scratch);
                scratch.is_empty()
            });
            if !accepted {
                issues.push(mismatch(schema, value, path));
            }
        }
        Schema::Record { fields } => {
            let Value::Object(map) = value else {
                issues.push(mismatch(schema, value, path));
                return;
            };
            for (name, field) in fields {
                let child = path.child(name);
                match map.get(name) {
                    None | Some(Value::Null) => {
                        let supplied_below = bound.iter().any(|b| b.starts_with(&child));
                        if field.required && !supplied_below {
                            issues.push(ValueIssue::Missing {
                                path: child,
                                expected: field.schema.clone(),
                            });
                        }
                    }
                    Some(v) => check(&field.schema, v, &child, bound, issues),
                }
            }
        }
        Schema::Array { element } => {
            let Value::Array(items) = value else {
                issues.push(mismatch(schema, value, path));
                return;
            };
            // First offending element is enough.
            for item in items {
                let before = issues.len();
                check(element, item, path, bound, issues);
                if issues.len() > before {
                    break;
                }
            }
        }
        Schema::Primitive { kind } => {
            let ok = matches!(
                (kind, value),
                (PrimitiveKind::String, Value::String(_))
                    | (PrimitiveKind::Number, Value::Number(_))
                    | (PrimitiveKind::Boolean, Value::Bool(_))
            );
            if !ok {
                issues.push(mismatch(schema, value, path));
            }
        }
        Schema::Literal { value: literal } => {
            if LiteralValue::from_json(value).as_ref() != Some(literal) {
                issues.push(mismatch(schema, value, path));
            }
        }
    }
}

fn mismatch(expected: &Schema, value: &Value, path: &FieldPath) -> ValueIssue {
    ValueIssue::Mismatch {
        path: path.clone(),
        expected: expected.clone(),
        found: describe_value(value),
    }
}

/// The narrowest schema describing a JSON value: scalars become literals,
/// objects become records of required fields. Null and empty arrays have no
/// description.
pub fn describe_value(value: &Value) -> Option<Schema> {
    match value {
        Value::Null => None,
        Value::String(_) | Value::Number(_) | Value::Bool(_) => {
            LiteralValue::from_json(value).map(Schema::literal)
        }
        Value::Array(items) => {
            let elements = items.iter().map(describe_value).collect::<Option<Vec<_>>>()?;
            Schema::union(elements).ok().map(Schema::array)
        }
        Value::Object(map) => {
            let mut fields = Vec::with_capacity(map.len());
            for (name, v) in map {
                fields.push((name.clone(), super::Field::required(describe_value(v)?)));
            }
            Some(Schema::record(fields))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::{Field, is_compatible};

    fn config_schema() -> Schema {
        Schema::record([
            ("title", Field::required(Schema::string())),
            ("mode", Field::required(Schema::one_of_strings(["table", "chart"]).unwrap())),
            ("limit", Field::optional(Schema::number())),
            (
                "filters",
                Field::required(Schema::record([("category", Field::required(Schema::string()))])),
            ),
        ])
    }

    #[test]
    fn float_spelling_matches_integer_literal() {
        let page_size = Schema::record([("pageSize", Field::required(Schema::literal(1i64)))]);
        assert!(check_value(&page_size, &json!({ "pageSize": 1.0 }), &[]).is_empty());
        assert_eq!(check_value(&page_size, &json!({ "pageSize": 2 }), &[]).len(), 1);
    }

    #[test]
    fn well_formed_value_has_no_issues() {
        let value = json!({
            "title": "Orders",
            "mode": "chart",
            "filters": { "category": "shoes" },
            "unknown": true
        });
        assert!(check_value(&config_schema(), &value, &[]).is_empty());
    }

    #[test]
    fn reports_missing_and_mismatched_fields() {
        let value = json!({ "mode": "pie", "limit": "ten", "filters": {} });
        let issues = check_value(&config_schema(), &value, &[]);
        let paths: Vec<String> = issues.iter().map(|i| i.path().to_string()).collect();
        assert_eq!(paths, ["title", "mode", "limit", "filters.category"]);
        assert!(matches!(issues[0], ValueIssue::Missing { .. }));
        assert!(matches!(
            &issues[1],
            ValueIssue::Mismatch { found: Some(found), .. } if *found == Schema::literal("pie")
        ));
    }

    #[test]
    fn bound_paths_are_skipped() {
        let value = json!({ "mode": "table" });
        let bound = [FieldPath::parse("title"), FieldPath::parse("filters.category")];
        assert!(check_value(&config_schema(), &value, &bound).is_empty());
    }

    #[test]
    fn null_root_counts_as_empty_object() {
        let schema = Schema::record([("limit", Field::optional(Schema::number()))]);
        assert!(check_value(&schema, &Value::Null, &[]).is_empty());
    }

    #[test]
    fn arrays_report_first_bad_element() {
        let schema = Schema::record([("tags", Field::required(Schema::array(Schema::string())))]);
        let issues = check_value(&schema, &json!({ "tags": ["a", 1, 2] }), &[]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path().to_string(), "tags");
    }

    #[test]
    fn described_values_are_accepted_by_matching_schemas() {
        let value = json!({ "title": "x", "mode": "table", "filters": { "category": "c" } });
        let described = describe_value(&value).unwrap();
        assert!(is_compatible(&config_schema(), &described));
        assert_eq!(describe_value(&json!([])), None);
    }
}
