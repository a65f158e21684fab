//! Dynamic schema resolution against the data-source catalog.

pub mod catalog;
pub mod dynamic;

pub use catalog::{CatalogError, DataSourceCatalog, FieldDescriptor, FilterDescriptor, StaticCatalog};
pub use dynamic::{ResolveFailure, ResolvedNode, SchemaResolver};
