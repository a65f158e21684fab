//! Structural schemas and the operations over them.
//!
//! `types` holds the value model; resolution (`path`), compatibility
//! (`compat`) and value checking (`conform`) are free functions so schema
//! values never change shape to grow behaviour.

pub mod compat;
pub mod conform;
pub mod display;
pub mod path;
pub mod types;

pub use compat::{assignable_paths, is_compatible};
pub use conform::{ValueIssue, check_value, describe_value};
pub use path::{FieldPath, NotFound, reachable_paths, resolve_path};
pub use types::*;

use crate::error::ParseError;

/// Deserialize a schema from its tagged JSON form.
pub fn parse_schema(json: &str) -> Result<Schema, ParseError> {
    serde_json::from_str(json).map_err(ParseError::Schema)
}
