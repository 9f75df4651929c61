//! Compound-field header grammar and value encoding.
//!
//! Each output group becomes one header token and one data cell. Scalars
//! are `name|type`; structured groups are
//! `name|compound(child|type,…)[|multiple][|display_yes|display_no]`, with
//! the matching data cell inner-encoded so a conformant downstream reader
//! can reconstruct the nested children.
use crate::converter::Options;
use crate::error::{Error, Result};
use crate::privacy::GroupValue;
use crate::schema::{DataType, Schema};
use crate::writer;

/// The flattened shape of one structured group: declared child names (in
/// first-appearance order) and the value rows to encode against them.
struct Shape<'v> {
    children: Vec<&'v str>,
    rows: Vec<Vec<&'v str>>,
    multiple: bool,
}

fn shape<'v>(value: &'v GroupValue, schema: &Schema) -> Option<Shape<'v>> {
    match value {
        GroupValue::Scalar(_) => None,
        GroupValue::Fields(fields) => Some(Shape {
            children: fields.keys().map(String::as_str).collect(),
            rows: vec![fields.values().map(String::as_str).collect()],
            multiple: false,
        }),
        GroupValue::Dimensions(dimensions) => {
            let [lesser_slot, greater_slot] = schema.dimension_slots;
            let mut children = Vec::new();
            let mut rows = Vec::with_capacity(dimensions.len());
            for pair in dimensions.values() {
                let mut row = Vec::with_capacity(2);
                if let Some(lesser) = &pair.lesser {
                    push_child(&mut children, lesser_slot);
                    row.push(lesser.as_str());
                }
                if let Some(greater) = &pair.greater {
                    push_child(&mut children, greater_slot);
                    row.push(greater.as_str());
                }
                rows.push(row);
            }
            Some(Shape {
                children,
                rows,
                multiple: true,
            })
        }
        GroupValue::Records(records) => {
            let mut children = Vec::new();
            let mut rows = Vec::with_capacity(records.len());
            for record in records {
                for slot in record.keys() {
                    push_child(&mut children, slot);
                }
                rows.push(record.values().map(String::as_str).collect());
            }
            Some(Shape {
                children,
                rows,
                multiple: true,
            })
        }
    }
}

fn push_child<'v>(children: &mut Vec<&'v str>, name: &'v str) {
    if !children.contains(&name) {
        children.push(name);
    }
}

/// Strip commas from a name; the comma is the grammar's own delimiter.
fn sanitize(name: &str) -> String {
    name.replace(',', "")
}

/// Build the header token for one group.
pub fn header(name: &str, value: &GroupValue, schema: &Schema) -> String {
    let Some(shape) = shape(value, schema) else {
        // top-level scalars sit outside any section mapping
        return format!("{name}|{}", DataType::Text.as_str());
    };

    // child types resolve against the un-suffixed section name
    let display = !schema.is_private_group(name);
    let base = schema.base_group(name);

    let children = shape
        .children
        .iter()
        .map(|child| {
            let data_type = schema.field_spec(base, child).data_type;
            format!("{}|{}", sanitize(child), data_type.as_str())
        })
        .collect::<Vec<_>>()
        .join(",");

    let mut header = format!("{}|compound({children})", sanitize(name));
    if shape.multiple {
        header.push_str("|multiple");
    }
    header.push_str(if display { "|display_yes" } else { "|display_no" });
    header
}

/// Encode the data cell for one group.
///
/// Structured groups are inner-encoded as delimited sub-records; the rows
/// of a multi-valued group are joined with the multivalued delimiter. A row
/// whose element count differs from the declared children is a hard error:
/// the downstream importer could not reconstruct it.
pub fn encode(name: &str, value: &GroupValue, schema: &Schema, options: &Options) -> Result<String> {
    if let GroupValue::Scalar(scalar) = value {
        return Ok(options.encode.apply(scalar).into_owned());
    }
    let Some(shape) = shape(value, schema) else {
        unreachable!("non-scalar groups always have a shape");
    };

    let mut rows = Vec::with_capacity(shape.rows.len());
    for row in &shape.rows {
        if row.len() != shape.children.len() {
            return Err(Error::FieldCountMismatch {
                field: name.to_owned(),
                expected: shape.children.len(),
                actual: row.len(),
            });
        }
        let values: Vec<String> = row
            .iter()
            .map(|value| options.encode.apply(value).into_owned())
            .collect();
        rows.push(writer::encode_record(&values, options)?);
    }

    Ok(if shape.multiple {
        rows.join(&options.multivalued_delimiter)
    } else {
        rows.into_iter().next().unwrap_or_default()
    })
}
