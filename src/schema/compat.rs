//! One-way structural compatibility between an expected and a found schema.

use super::path::{FieldPath, reachable_paths, resolve_path};
use super::types::Schema;

/// Whether every value described by `found` is accepted by `expected`.
///
/// A union on the found side means the upstream value may take any of its
/// shapes, so each of them must be accepted. A union on the expected side
/// accepts a value if any of its members does. The found side is distributed
/// first; with the opposite order `A | B` would not accept `A | B`.
///
/// Records use width subtyping: extra found fields are ignored, and only
/// fields the expected record marks required are checked. Such a field
/// must be required on the found side too.
pub fn is_compatible(expected: &Schema, found: &Schema) -> bool {
    match (expected, found) {
        (_, Schema::Union { variants }) => variants.iter().all(|f| is_compatible(expected, f)),
        (Schema::Union { variants }, _) => variants.iter().any(|e| is_compatible(e, found)),

        (Schema::Primitive { kind }, Schema::Primitive { kind: found_kind }) => kind == found_kind,
        (Schema::Primitive { kind }, Schema::Literal { value }) => *kind == value.kind(),
        (Schema::Literal { value }, Schema::Literal { value: found_value }) => value == found_value,

        (Schema::Array { element }, Schema::Array { element: found_element }) => {
            is_compatible(element, found_element)
        }

        (Schema::Record { fields }, Schema::Record { fields: found_fields }) => fields
            .iter()
            .filter(|(_, field)| field.required)
            .all(|(name, field)| {
                found_fields.get(name).is_some_and(|found_field| {
                    found_field.required && is_compatible(&field.schema, &found_field.schema)
                })
            }),

        (Schema::Primitive { .. }, _)
        | (Schema::Literal { .. }, _)
        | (Schema::Array { .. }, _)
        | (Schema::Record { .. }, _) => false,
    }
}

/// Paths into `source` whose value `expected` would accept.
///
/// Used by a builder to offer only the upstream fields that can be wired
/// into a given config field.
pub fn assignable_paths(expected: &Schema, source: &Schema) -> Vec<FieldPath> {
    reachable_paths(source)
        .into_iter()
        .filter(|path| {
            resolve_path(source, path).is_ok_and(|found| is_compatible(expected, &found))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;

    fn u(variants: impl IntoIterator<Item = Schema>) -> Schema {
        Schema::union(variants).unwrap()
    }

    fn samples() -> Vec<Schema> {
        vec![
            Schema::string(),
            Schema::number(),
            Schema::boolean(),
            Schema::literal("x"),
            Schema::literal("y"),
            Schema::literal(7i64),
            Schema::literal(false),
            Schema::array(Schema::string()),
            Schema::array(u([Schema::string(), Schema::number()])),
            Schema::empty_record(),
            Schema::record([("a", Field::required(Schema::string()))]),
            Schema::record([
                ("a", Field::required(Schema::literal("x"))),
                ("b", Field::optional(Schema::number())),
            ]),
            u([Schema::string(), Schema::number()]),
            u([
                Schema::literal("x"),
                Schema::record([("a", Field::required(Schema::boolean()))]),
            ]),
        ]
    }

    #[test]
    fn reflexive() {
        for s in samples() {
            assert!(is_compatible(&s, &s), "{} should accept itself", s);
        }
    }

    #[test]
    fn expected_union_is_existential() {
        let samples = samples();
        for a in &samples {
            for b in &samples {
                for c in &samples {
                    let union = u([a.clone(), b.clone()]);
                    if c.is_union() {
                        continue;
                    }
                    assert_eq!(
                        is_compatible(&union, c),
                        is_compatible(a, c) || is_compatible(b, c),
                        "({}) vs {}",
                        union,
                        c
                    );
                }
            }
        }
    }

    #[test]
    fn found_union_is_universal() {
        let samples = samples();
        for a in &samples {
            for b in &samples {
                for c in &samples {
                    let union = u([b.clone(), c.clone()]);
                    assert_eq!(
                        is_compatible(a, &union),
                        is_compatible(a, b) && is_compatible(a, c),
                        "{} vs ({})",
                        a,
                        union
                    );
                }
            }
        }
    }

    #[test]
    fn literals_narrow_primitives_but_not_the_reverse() {
        assert!(!is_compatible(&Schema::literal("x"), &Schema::string()));
        assert!(is_compatible(&Schema::string(), &Schema::literal("x")));
        assert!(is_compatible(&Schema::number(), &Schema::literal(3i64)));
        assert!(is_compatible(&Schema::boolean(), &Schema::literal(true)));
        assert!(!is_compatible(&Schema::number(), &Schema::literal("3")));
        assert!(!is_compatible(&Schema::literal("x"), &Schema::literal("y")));
    }

    #[test]
    fn arrays_are_covariant() {
        let strings = Schema::array(Schema::string());
        let literals = Schema::array(Schema::literal("x"));
        assert!(is_compatible(&strings, &literals));
        assert!(!is_compatible(&literals, &strings));
        assert!(!is_compatible(&strings, &Schema::string()));
    }

    #[test]
    fn records_use_width_subtyping() {
        let expected = Schema::record([
            ("id", Field::required(Schema::string())),
            ("note", Field::optional(Schema::number())),
        ]);
        let wider = Schema::record([
            ("id", Field::required(Schema::literal("abc"))),
            ("extra", Field::required(Schema::boolean())),
        ]);
        let missing = Schema::record([("note", Field::required(Schema::number()))]);
        let wrong = Schema::record([("id", Field::required(Schema::number()))]);
        let maybe = Schema::record([("id", Field::optional(Schema::string()))]);

        assert!(is_compatible(&expected, &wider));
        assert!(!is_compatible(&expected, &missing));
        assert!(!is_compatible(&expected, &wrong));
        assert!(!is_compatible(&expected, &maybe));
        assert!(is_compatible(&Schema::empty_record(), &wider));
    }

    #[test]
    fn union_against_union() {
        let expected = u([Schema::string(), Schema::number(), Schema::boolean()]);
        let found = u([Schema::literal("x"), Schema::number()]);
        assert!(is_compatible(&expected, &found));
        assert!(!is_compatible(&found, &expected));
    }

    #[test]
    fn assignable_paths_filters_by_type() {
        let source = Schema::record([
            ("name", Field::required(Schema::string())),
            ("size", Field::required(Schema::number())),
            (
                "brand",
                Field::required(Schema::record([("label", Field::required(Schema::literal("acme")))])),
            ),
        ]);
        let paths: Vec<String> = assignable_paths(&Schema::string(), &source)
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(paths, ["name", "brand.label"]);

        let whole = assignable_paths(&Schema::empty_record(), &source);
        assert_eq!(whole, vec![FieldPath::root(), FieldPath::parse("brand")]);
    }
}
