//! Diagnostics reported by a validation pass, plus the library error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{FieldPath, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    Structural,
    Compatibility,
    MissingField,
    ResolutionFailure,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::Structural => write!(f, "Structural"),
            DiagnosticKind::Compatibility => write!(f, "Compatibility"),
            DiagnosticKind::MissingField => write!(f, "MissingField"),
            DiagnosticKind::ResolutionFailure => write!(f, "ResolutionFailure"),
        }
    }
}

/// A single validation finding, scoped to a node and a field path in that
/// node's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: String,
    pub kind: DiagnosticKind,
    pub node_id: String,
    pub field_path: FieldPath,
    pub message: String,
    /// Expected side of a failed compatibility check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Schema>,
    /// Found side of a failed compatibility check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<Schema>,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field_path.is_root() {
            write!(
                f,
                "[{}:{}] {} (node '{}')",
                self.kind, self.code, self.message, self.node_id
            )
        } else {
            write!(
                f,
                "[{}:{}] {} (node '{}', field '{}')",
                self.kind, self.code, self.message, self.node_id, self.field_path
            )
        }
    }
}

impl Diagnostic {
    fn new(
        kind: DiagnosticKind,
        code: &str,
        node_id: &str,
        field_path: FieldPath,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            code: code.into(),
            kind,
            node_id: node_id.into(),
            field_path,
            message: message.into(),
            expected: None,
            found: None,
        }
    }

    pub fn structural(
        code: &str,
        node_id: &str,
        field_path: FieldPath,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic::new(DiagnosticKind::Structural, code, node_id, field_path, message)
    }

    pub fn missing_field(
        code: &str,
        node_id: &str,
        field_path: FieldPath,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic::new(DiagnosticKind::MissingField, code, node_id, field_path, message)
    }

    pub fn resolution_failure(
        code: &str,
        node_id: &str,
        field_path: FieldPath,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic::new(
            DiagnosticKind::ResolutionFailure,
            code,
            node_id,
            field_path,
            message,
        )
    }

    /// A compatibility finding. Carries the schemas involved so callers can
    /// build their own rendering. `found` is absent when the offending value
    /// has no schema of its own (null, empty array).
    pub fn compatibility(
        code: &str,
        node_id: &str,
        field_path: FieldPath,
        message: impl Into<String>,
        expected: Schema,
        found: Option<Schema>,
    ) -> Self {
        Diagnostic {
            expected: Some(expected),
            found,
            ..Diagnostic::new(DiagnosticKind::Compatibility, code, node_id, field_path, message)
        }
    }
}

// =============================================================================
// LIBRARY ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("union must have at least one variant")]
    EmptyUnion,

    #[error("union variants collapse to the single schema `{0}`")]
    SingleVariantUnion(String),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse workflow graph JSON: {0}")]
    Graph(#[source] serde_json::Error),

    #[error("failed to parse schema JSON: {0}")]
    Schema(#[source] serde_json::Error),

    #[error("failed to parse node descriptor JSON: {0}")]
    Descriptor(#[source] serde_json::Error),

    #[error("failed to parse validator options JSON: {0}")]
    Options(#[source] serde_json::Error),
}

/// A malformed registry. These are programmer errors in the surrounding
/// application and are refused at registration time.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("node type '{0}' is already registered")]
    DuplicateNodeType(String),

    #[error("node type '{node_type}' resolves dynamically from '{field}' but its static config has no such field")]
    MissingBaseField { node_type: String, field: String },

    #[error("node type '{node_type}' has a static config schema that is not a record")]
    ConfigNotRecord { node_type: String },
}

/// Why a dynamic resolution fell back to the static schema.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("required field '{field}' is missing from the configuration")]
    MissingBaseField { field: String },

    #[error("field '{field}' is invalid: {reason}")]
    InvalidBaseField { field: String, reason: String },

    #[error("field '{field}' is bound to an upstream value that is only known at run time")]
    UnresolvedBinding { field: String },

    #[error("catalog lookup failed: {0}")]
    Catalog(#[from] crate::resolve::CatalogError),

    #[error("catalog lookup timed out after {0} ms")]
    Timeout(u64),
}

impl ResolveError {
    /// Stable diagnostic code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::MissingBaseField { .. }
            | ResolveError::InvalidBaseField { .. }
            | ResolveError::UnresolvedBinding { .. } => "R001",
            ResolveError::Catalog(_) => "R002",
            ResolveError::Timeout(_) => "R003",
        }
    }
}
