//! Node type registry: node-type id → descriptor.
//!
//! Populated by application code before validation and read-only during a
//! pass. Malformed registrations are refused here so a validation pass never
//! has to deal with them.

pub mod builtin;
pub mod descriptor;

use std::collections::HashMap;
use std::sync::LazyLock;

pub use descriptor::{DynamicConfig, DynamicOutput, NodeCategory, NodeDescriptor};

use crate::error::RegistryError;

#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    descriptors: HashMap<String, NodeDescriptor>,
}

impl NodeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in node types.
    pub fn builtin() -> Self {
        let descriptors = builtin::descriptors()
            .into_iter()
            .map(|(id, d)| (id.to_string(), d))
            .collect();
        NodeRegistry { descriptors }
    }

    pub fn register(
        &mut self,
        node_type: impl Into<String>,
        descriptor: NodeDescriptor,
    ) -> Result<(), RegistryError> {
        let node_type = node_type.into();
        if self.descriptors.contains_key(&node_type) {
            return Err(RegistryError::DuplicateNodeType(node_type));
        }
        check_descriptor(&node_type, &descriptor)?;
        self.descriptors.insert(node_type, descriptor);
        Ok(())
    }

    pub fn lookup(&self, node_type: &str) -> Option<&NodeDescriptor> {
        self.descriptors.get(node_type)
    }

    /// Registered type ids, sorted.
    pub fn node_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

/// Process-wide registry of the built-in node types.
pub fn builtin_registry() -> &'static NodeRegistry {
    static BUILTIN: LazyLock<NodeRegistry> = LazyLock::new(NodeRegistry::builtin);
    &BUILTIN
}

fn check_descriptor(node_type: &str, descriptor: &NodeDescriptor) -> Result<(), RegistryError> {
    let Some(fields) = descriptor.config.fields() else {
        return Err(RegistryError::ConfigNotRecord {
            node_type: node_type.to_string(),
        });
    };

    let config_bases = descriptor.dynamic_config.iter().flat_map(|d| d.base_fields());
    let output_bases = descriptor.dynamic_output.iter().flat_map(|d| d.base_fields());
    for field in config_bases.chain(output_bases) {
        if !fields.contains_key(*field) {
            return Err(RegistryError::MissingBaseField {
                node_type: node_type.to_string(),
                field: field.to_string(),
            });
        }
    }
    Ok(())
}
