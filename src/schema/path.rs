//! Field paths and property-path resolution over schemas.

use serde::{Deserialize, Serialize};

use super::types::Schema;

// =============================================================================
// FIELD PATH
// =============================================================================

/// A path of record field names. The empty path addresses the whole value.
///
/// JSON accepts a dotted string (`"address.city"`) or an array of segments
/// and always serializes as an array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "PathRepr", into = "Vec<String>")]
pub struct FieldPath(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum PathRepr {
    Dotted(String),
    Segments(Vec<String>),
}

impl From<PathRepr> for FieldPath {
    fn from(repr: PathRepr) -> Self {
        match repr {
            PathRepr::Dotted(s) => FieldPath::parse(&s),
            PathRepr::Segments(segments) => FieldPath(segments),
        }
    }
}

impl From<FieldPath> for Vec<String> {
    fn from(path: FieldPath) -> Self {
        path.0
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        FieldPath::parse(s)
    }
}

impl FieldPath {
    pub fn root() -> Self {
        FieldPath(Vec::new())
    }

    /// Parse a dotted path. Empty segments are dropped, so `""` is the root.
    pub fn parse(dotted: &str) -> Self {
        FieldPath(
            dotted
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, segment: &str) -> FieldPath {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        FieldPath(segments)
    }

    pub fn starts_with(&self, other: &FieldPath) -> bool {
        self.0.starts_with(&other.0)
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0.join("."))
        }
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// A path that leads nowhere in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotFound {
    /// Index of the segment that could not be resolved. Across union
    /// variants this is the deepest segment any variant reached.
    pub depth: usize,
}

impl NotFound {
    /// Name of the unresolved segment in `path`.
    pub fn segment<'a>(&self, path: &'a FieldPath) -> Option<&'a str> {
        path.segments().get(self.depth).map(String::as_str)
    }
}

/// Navigate `schema` along `path`, distributing through unions.
///
/// Only records have structure to descend into. Inside a union every variant
/// is tried; variants without the path are discarded and the survivors are
/// re-normalized into a union.
pub fn resolve_path(schema: &Schema, path: &FieldPath) -> Result<Schema, NotFound> {
    resolve_segments(schema, path.segments(), 0)
}

fn resolve_segments(schema: &Schema, segments: &[String], depth: usize) -> Result<Schema, NotFound> {
    let Some((head, rest)) = segments.split_first() else {
        return Ok(schema.clone());
    };

    match schema {
        Schema::Record { fields } => match fields.get(head) {
            Some(field) => resolve_segments(&field.schema, rest, depth + 1),
            None => Err(NotFound { depth }),
        },
        Schema::Union { variants } => {
            let mut survivors = Vec::new();
            let mut deepest = depth;
            for variant in variants {
                match resolve_segments(variant, segments, depth) {
                    Ok(resolved) => survivors.push(resolved),
                    Err(miss) => deepest = deepest.max(miss.depth),
                }
            }
            Schema::union(survivors).map_err(|_| NotFound { depth: deepest })
        }
        Schema::Array { .. } | Schema::Primitive { .. } | Schema::Literal { .. } => {
            Err(NotFound { depth })
        }
    }
}

/// Every path reachable through records (and through unions of records),
/// root first, then fields depth-first in declaration order. Paths shared by
/// several union variants appear once.
pub fn reachable_paths(schema: &Schema) -> Vec<FieldPath> {
    let mut out = vec![FieldPath::root()];
    let mut prefix = Vec::new();
    collect_paths(schema, &mut prefix, &mut out);
    out
}

fn collect_paths(schema: &Schema, prefix: &mut Vec<String>, out: &mut Vec<FieldPath>) {
    match schema {
        Schema::Record { fields } => {
            for (name, field) in fields {
                prefix.push(name.clone());
                let path = FieldPath(prefix.clone());
                if !out.contains(&path) {
                    out.push(path);
                }
                collect_paths(&field.schema, prefix, out);
                prefix.pop();
            }
        }
        Schema::Union { variants } => {
            for variant in variants {
                collect_paths(variant, prefix, out);
            }
        }
        Schema::Array { .. } | Schema::Primitive { .. } | Schema::Literal { .. } => {}
    }
}
