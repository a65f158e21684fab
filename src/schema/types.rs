//! Structural schema values.
//!
//! A `Schema` describes every shape a value may take. Schemas are plain
//! immutable data: equality is structural, record field order and union
//! variant order are not significant.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

// =============================================================================
// PRIMITIVES AND LITERALS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimitiveKind::String => write!(f, "string"),
            PrimitiveKind::Number => write!(f, "number"),
            PrimitiveKind::Boolean => write!(f, "boolean"),
        }
    }
}

/// A constant of one of the primitive kinds.
///
/// Numbers compare by value, so `1` and `1.0` are the same literal. Integers
/// compare exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    String(String),
    Number(serde_json::Number),
    Boolean(bool),
}

impl LiteralValue {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            LiteralValue::String(_) => PrimitiveKind::String,
            LiteralValue::Number(_) => PrimitiveKind::Number,
            LiteralValue::Boolean(_) => PrimitiveKind::Boolean,
        }
    }

    /// Literal for a JSON scalar. Returns `None` for null, arrays and objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(LiteralValue::String(s.clone())),
            serde_json::Value::Number(n) => Some(LiteralValue::Number(n.clone())),
            serde_json::Value::Bool(b) => Some(LiteralValue::Boolean(*b)),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            LiteralValue::String(s) => serde_json::Value::String(s.clone()),
            LiteralValue::Number(n) => serde_json::Value::Number(n.clone()),
            LiteralValue::Boolean(b) => serde_json::Value::Bool(*b),
        }
    }
}

impl PartialEq for LiteralValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LiteralValue::String(a), LiteralValue::String(b)) => a == b,
            (LiteralValue::Boolean(a), LiteralValue::Boolean(b)) => a == b,
            (LiteralValue::Number(a), LiteralValue::Number(b)) => same_number(a, b),
            _ => false,
        }
    }
}

// JSON numbers are never NaN.
impl Eq for LiteralValue {}

fn same_number(a: &serde_json::Number, b: &serde_json::Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    a.as_f64() == b.as_f64()
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        LiteralValue::String(s.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(s: String) -> Self {
        LiteralValue::String(s)
    }
}

impl From<i64> for LiteralValue {
    fn from(n: i64) -> Self {
        LiteralValue::Number(n.into())
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self {
        LiteralValue::Boolean(b)
    }
}

// =============================================================================
// SCHEMA
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Schema {
    Primitive { kind: PrimitiveKind },
    Literal { value: LiteralValue },
    Array { element: Box<Schema> },
    Record { fields: IndexMap<String, Field> },
    Union { variants: Variants },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub schema: Schema,
    #[serde(default = "required_by_default")]
    pub required: bool,
}

fn required_by_default() -> bool {
    true
}

impl Field {
    pub fn required(schema: Schema) -> Self {
        Field {
            schema,
            required: true,
        }
    }

    pub fn optional(schema: Schema) -> Self {
        Field {
            schema,
            required: false,
        }
    }
}

/// Union members: at least two, pairwise distinct, no nested unions.
///
/// Only constructed through [`Schema::union`] (or deserialization, which goes
/// through the same path), so the invariants always hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Schema>", into = "Vec<Schema>")]
pub struct Variants(Vec<Schema>);

impl Variants {
    pub fn iter(&self) -> std::slice::Iter<'_, Schema> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Variants {
    fn eq(&self, other: &Self) -> bool {
        // Members are deduplicated, so equal length plus inclusion is set equality.
        self.0.len() == other.0.len() && self.0.iter().all(|v| other.0.contains(v))
    }
}

impl Eq for Variants {}

impl<'a> IntoIterator for &'a Variants {
    type Item = &'a Schema;
    type IntoIter = std::slice::Iter<'a, Schema>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl TryFrom<Vec<Schema>> for Variants {
    type Error = SchemaError;

    fn try_from(variants: Vec<Schema>) -> Result<Self, Self::Error> {
        match Schema::union(variants)? {
            Schema::Union { variants } => Ok(variants),
            single => Err(SchemaError::SingleVariantUnion(single.to_string())),
        }
    }
}

impl From<Variants> for Vec<Schema> {
    fn from(variants: Variants) -> Self {
        variants.0
    }
}

impl Schema {
    pub fn string() -> Self {
        Schema::Primitive {
            kind: PrimitiveKind::String,
        }
    }

    pub fn number() -> Self {
        Schema::Primitive {
            kind: PrimitiveKind::Number,
        }
    }

    pub fn boolean() -> Self {
        Schema::Primitive {
            kind: PrimitiveKind::Boolean,
        }
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        Schema::Primitive { kind }
    }

    pub fn literal(value: impl Into<LiteralValue>) -> Self {
        Schema::Literal {
            value: value.into(),
        }
    }

    pub fn array(element: Schema) -> Self {
        Schema::Array {
            element: Box::new(element),
        }
    }

    /// Record from `(name, field)` pairs. A repeated name keeps the last field.
    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, Field)>) -> Self {
        Schema::Record {
            fields: fields.into_iter().map(|(k, f)| (k.into(), f)).collect(),
        }
    }

    /// The record with no fields; accepts any record.
    pub fn empty_record() -> Self {
        Schema::Record {
            fields: IndexMap::new(),
        }
    }

    /// Union of `variants`, normalized.
    ///
    /// Nested unions are flattened and duplicates dropped (first occurrence
    /// wins). A single surviving member is returned as itself.
    pub fn union(variants: impl IntoIterator<Item = Schema>) -> Result<Schema, SchemaError> {
        let mut members = Vec::new();
        for variant in variants {
            push_member(&mut members, variant);
        }
        match members.len() {
            0 => Err(SchemaError::EmptyUnion),
            1 => Ok(members.swap_remove(0)),
            _ => Ok(Schema::Union {
                variants: Variants(members),
            }),
        }
    }

    /// Like [`Schema::union`], for a list that is non-empty by construction.
    pub fn either(first: Schema, rest: impl IntoIterator<Item = Schema>) -> Schema {
        let mut members = Vec::new();
        push_member(&mut members, first);
        for variant in rest {
            push_member(&mut members, variant);
        }
        if members.len() == 1 {
            members.swap_remove(0)
        } else {
            Schema::Union {
                variants: Variants(members),
            }
        }
    }

    /// Union of string literals, one per option.
    pub fn one_of_strings<S: AsRef<str>>(
        options: impl IntoIterator<Item = S>,
    ) -> Result<Schema, SchemaError> {
        Schema::union(options.into_iter().map(|s| Schema::literal(s.as_ref())))
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Schema::Union { .. })
    }

    /// Field map of a record schema.
    pub fn fields(&self) -> Option<&IndexMap<String, Field>> {
        match self {
            Schema::Record { fields } => Some(fields),
            _ => None,
        }
    }
}

fn push_member(members: &mut Vec<Schema>, variant: Schema) {
    match variant {
        Schema::Union { variants } => {
            for inner in variants.0 {
                if !members.contains(&inner) {
                    members.push(inner);
                }
            }
        }
        other => {
            if !members.contains(&other) {
                members.push(other);
            }
        }
    }
}
