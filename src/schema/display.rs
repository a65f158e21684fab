//! TypeScript-flavoured rendering of schemas, used in diagnostic messages.

use std::fmt;

use super::types::{LiteralValue, Schema};

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // JSON rendering quotes and escapes strings.
        write!(f, "{}", self.to_json())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Primitive { kind } => write!(f, "{}", kind),
            Schema::Literal { value } => write!(f, "{}", value),
            Schema::Array { element } => {
                if element.is_union() {
                    write!(f, "({})[]", element)
                } else {
                    write!(f, "{}[]", element)
                }
            }
            Schema::Record { fields } => {
                if fields.is_empty() {
                    return write!(f, "{{}}");
                }
                write!(f, "{{ ")?;
                for (i, (name, field)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    let marker = if field.required { "" } else { "?" };
                    write!(f, "{}{}: {}", name, marker, field.schema)?;
                }
                write!(f, " }}")
            }
            Schema::Union { variants } => {
                for (i, variant) in variants.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", variant)?;
                }
                Ok(())
            }
        }
    }
}
