pub mod config;
pub mod error;
pub mod parse;
pub mod registry;
pub mod resolve;
pub mod schema;
pub mod validate;
pub mod wasm;

pub use config::ValidatorOptions;
pub use error::{Diagnostic, DiagnosticKind};
pub use parse::{WorkflowGraph, parse_graph};
pub use registry::{NodeRegistry, builtin_registry};
pub use resolve::{DataSourceCatalog, StaticCatalog};
pub use schema::{FieldPath, Schema, is_compatible, resolve_path};
pub use validate::{Validator, validate};
