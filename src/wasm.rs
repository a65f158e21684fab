//! WASM entry points for the interactive builder.
//!
//! Every function takes JSON strings and returns a plain JS value, so the
//! builder can probe schemas while the user wires nodes together.

use wasm_bindgen::prelude::*;

use crate::error::ParseError;
use crate::schema::{self, FieldPath, Schema};

/// Whether a value described by `found_json` may flow into a field typed
/// `expected_json`. Returns `{ compatible }` or `{ error }`.
#[wasm_bindgen]
pub fn is_compatible(expected_json: &str, found_json: &str) -> JsValue {
    let result = is_compatible_inner(expected_json, found_json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn is_compatible_inner(expected_json: &str, found_json: &str) -> CompatibilityResult {
    let parsed = schema::parse_schema(expected_json)
        .and_then(|expected| Ok((expected, schema::parse_schema(found_json)?)));
    match parsed {
        Ok((expected, found)) => CompatibilityResult::Checked {
            compatible: schema::is_compatible(&expected, &found),
            expected: expected.to_string(),
            found: found.to_string(),
        },
        Err(e) => CompatibilityResult::Error(ErrorDto::from(e)),
    }
}

/// Navigate `schema_json` along `path_json` (dotted string or segment array).
/// Returns `{ status: "found", schema }`, `{ status: "notFound", segment }`
/// or `{ status: "error", ... }`.
#[wasm_bindgen]
pub fn resolve_path(schema_json: &str, path_json: &str) -> JsValue {
    let result = resolve_path_inner(schema_json, path_json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn resolve_path_inner(schema_json: &str, path_json: &str) -> PathResult {
    let schema = match schema::parse_schema(schema_json) {
        Ok(s) => s,
        Err(e) => return PathResult::Error(ErrorDto::from(e)),
    };
    let path = match parse_path(path_json) {
        Ok(p) => p,
        Err(e) => return PathResult::Error(ErrorDto::from(e)),
    };

    match schema::resolve_path(&schema, &path) {
        Ok(found) => PathResult::Found {
            rendered: found.to_string(),
            schema: found,
        },
        Err(not_found) => PathResult::NotFound {
            depth: not_found.depth,
            segment: not_found.segment(&path).unwrap_or_default().to_string(),
        },
    }
}

/// Upstream paths of `source_json` that could be bound to a field typed
/// `expected_json`, as dotted strings (`""` for the whole value).
#[wasm_bindgen]
pub fn assignable_paths(expected_json: &str, source_json: &str) -> JsValue {
    let result = assignable_paths_inner(expected_json, source_json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn assignable_paths_inner(expected_json: &str, source_json: &str) -> PathsResult {
    let parsed = schema::parse_schema(expected_json)
        .and_then(|expected| Ok((expected, schema::parse_schema(source_json)?)));
    match parsed {
        Ok((expected, source)) => PathsResult::Paths(
            schema::assignable_paths(&expected, &source)
                .into_iter()
                .map(|path| path.segments().join("."))
                .collect(),
        ),
        Err(e) => PathsResult::Error(ErrorDto::from(e)),
    }
}

/// A path is either a JSON string / array, or a bare dotted string.
fn parse_path(path_json: &str) -> Result<FieldPath, ParseError> {
    match serde_json::from_str::<FieldPath>(path_json) {
        Ok(path) => Ok(path),
        Err(_) if !path_json.trim_start().starts_with(['"', '[']) => Ok(FieldPath::parse(path_json)),
        Err(e) => Err(ParseError::Schema(e)),
    }
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct ErrorDto {
    code: String,
    message: String,
}

impl From<ParseError> for ErrorDto {
    fn from(e: ParseError) -> Self {
        ErrorDto {
            code: "P001".into(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status")]
enum CompatibilityResult {
    #[serde(rename = "checked")]
    Checked {
        compatible: bool,
        expected: String,
        found: String,
    },
    #[serde(rename = "error")]
    Error(ErrorDto),
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status")]
enum PathResult {
    #[serde(rename = "found")]
    Found { schema: Schema, rendered: String },
    #[serde(rename = "notFound")]
    NotFound { depth: usize, segment: String },
    #[serde(rename = "error")]
    Error(ErrorDto),
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", content = "value")]
enum PathsResult {
    #[serde(rename = "paths")]
    Paths(Vec<String>),
    #[serde(rename = "error")]
    Error(ErrorDto),
}
