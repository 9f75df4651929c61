//! Privacy-aware restructuring of the property tree.
//!
//! Fields flagged private in the metadatum mapping are relocated into a
//! shadow group per section, keyed `"<section> - PRIVADO"`, so the
//! downstream importer can withhold them from public display. Only the
//! owning group changes; field names and values are untouched.
use crate::parser::{DimensionPair, Fields, LocationRecord, PropertyTree, SectionValue};
use crate::schema::Schema;
use indexmap::IndexMap;
use log::warn;

/// The value of one output group after the split.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupValue {
    /// A plain top-level value, such as the synthesized title.
    Scalar(String),
    /// Scalar fields that survived (or were moved by) the split.
    Fields(Fields),
    /// Measurement pairs, split like scalar fields.
    Dimensions(IndexMap<String, DimensionPair>),
    /// Location records; never field-split, they pass through as a unit.
    Records(Vec<LocationRecord>),
}

impl GroupValue {
    /// Groups with no content are dropped from the output row.
    pub fn is_empty(&self) -> bool {
        match self {
            GroupValue::Scalar(_) => false,
            GroupValue::Fields(fields) => fields.is_empty(),
            GroupValue::Dimensions(dimensions) => dimensions.is_empty(),
            GroupValue::Records(records) => records.is_empty(),
        }
    }
}

impl From<SectionValue> for GroupValue {
    fn from(value: SectionValue) -> Self {
        match value {
            SectionValue::Fields(fields) => GroupValue::Fields(fields),
            SectionValue::Dimensions(dimensions) => GroupValue::Dimensions(dimensions),
            SectionValue::Records(records) => GroupValue::Records(records),
        }
    }
}

/// Flat mapping from group key (section name, or its private shadow) to the
/// group's value, in first-appearance order.
pub type Groups = IndexMap<String, GroupValue>;

/// Split the tree's sections into public and private groups.
///
/// Sections absent from the mapping pass through unchanged, which also
/// makes the split idempotent: a `"- PRIVADO"` group produced by an earlier
/// pass has no mapping entry of its own and is never re-split.
pub fn split_private(tree: PropertyTree, schema: &Schema) -> Groups {
    let mut groups = Groups::new();

    for (section, value) in tree.into_sections() {
        match (schema.section_mapping(&section), value) {
            (Some(mapping), SectionValue::Fields(fields)) => {
                for (field, value) in fields {
                    let private = mapping.get(&field).is_some_and(|spec| spec.private);
                    let key = group_key(schema, &section, private);
                    let group = groups
                        .entry(key)
                        .or_insert_with(|| GroupValue::Fields(Fields::new()));
                    if let GroupValue::Fields(fields) = group {
                        fields.insert(field, value);
                    } else {
                        warn!("group '{section}' already holds a non-field value");
                    }
                }
            }
            (Some(mapping), SectionValue::Dimensions(dimensions)) => {
                for (name, pair) in dimensions {
                    let private = mapping.get(&name).is_some_and(|spec| spec.private);
                    let key = group_key(schema, &section, private);
                    let group = groups
                        .entry(key)
                        .or_insert_with(|| GroupValue::Dimensions(IndexMap::new()));
                    if let GroupValue::Dimensions(dimensions) = group {
                        dimensions.insert(name, pair);
                    } else {
                        warn!("group '{section}' already holds a non-dimension value");
                    }
                }
            }
            // record lists are never field-split; unmapped sections pass
            // through entirely unchanged
            (_, value) => {
                groups.insert(section, value.into());
            }
        }
    }

    groups
}

fn group_key(schema: &Schema, section: &str, private: bool) -> String {
    if private {
        schema.private_group(section)
    } else {
        section.to_owned()
    }
}
