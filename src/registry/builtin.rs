//! Built-in node types.
//! SYNC NOTE: The builder's node palette lists these type ids; keep the
//! names and config field names aligned with it.

use super::descriptor::{DynamicConfig, DynamicOutput, NodeCategory, NodeDescriptor};
use crate::schema::{Field, Schema};

pub const DATA_SOURCE: &str = "dataSource";
pub const AGGREGATE: &str = "aggregate";
pub const BRANCH: &str = "branch";
pub const RENDER: &str = "render";

pub(crate) fn descriptors() -> Vec<(&'static str, NodeDescriptor)> {
    vec![
        (DATA_SOURCE, data_source()),
        (AGGREGATE, aggregate()),
        (BRANCH, branch()),
        (RENDER, render()),
    ]
}

fn scalar() -> Schema {
    Schema::either(Schema::string(), [Schema::number(), Schema::boolean()])
}

fn data_source() -> NodeDescriptor {
    NodeDescriptor::fixed(
        NodeCategory::Data,
        Schema::record([("sourceId", Field::required(Schema::string()))]),
        Schema::record([("count", Field::required(Schema::number()))]),
    )
    .with_dynamic_config(DynamicConfig::SourceFilters)
    .with_dynamic_output(DynamicOutput::SourceRows)
}

fn aggregate() -> NodeDescriptor {
    NodeDescriptor::fixed(
        NodeCategory::Data,
        Schema::record([
            ("sourceId", Field::required(Schema::string())),
            ("groupBy", Field::required(Schema::string())),
        ]),
        Schema::record([("total", Field::required(Schema::number()))]),
    )
    .with_dynamic_output(DynamicOutput::GroupedBySourceField)
}

fn branch() -> NodeDescriptor {
    let operator = Schema::either(
        Schema::literal("eq"),
        ["neq", "gt", "lt", "contains"].map(Schema::literal),
    );
    NodeDescriptor::fixed(
        NodeCategory::Logic,
        Schema::record([
            ("value", Field::required(scalar())),
            ("operator", Field::required(operator)),
            ("compareTo", Field::required(scalar())),
        ]),
        Schema::record([("matched", Field::required(Schema::boolean()))]),
    )
}

fn render() -> NodeDescriptor {
    NodeDescriptor::fixed(
        NodeCategory::Output,
        Schema::record([
            ("title", Field::required(Schema::string())),
            ("body", Field::optional(Schema::string())),
            ("rows", Field::optional(Schema::array(Schema::empty_record()))),
            ("value", Field::optional(scalar())),
        ]),
        Schema::empty_record(),
    )
}
