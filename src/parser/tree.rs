//! The nested property tree produced by one parse pass.
//!
//! Shapes are closed tagged variants rather than duck-typed maps: the state
//! machine decides once whether a section holds plain fields, measurement
//! pairs, or location records, and every later stage matches on that.
use indexmap::IndexMap;
use log::warn;
use serde::Serialize;

/// Scalar fields of one section, in insertion order.
pub type Fields = IndexMap<String, String>;

/// One repeating location record; at most the four fixed slots, possibly
/// fewer when the document ends mid-cycle.
pub type LocationRecord = IndexMap<String, String>;

/// A lesser/greater measurement pair. `lesser` is always filled first;
/// once both slots are set, further values for the dimension are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DimensionPair {
    #[serde(rename = "menor", skip_serializing_if = "Option::is_none")]
    pub lesser: Option<String>,
    #[serde(rename = "maior", skip_serializing_if = "Option::is_none")]
    pub greater: Option<String>,
}

impl DimensionPair {
    /// Whether both slots have been filled.
    pub fn is_complete(&self) -> bool {
        self.lesser.is_some() && self.greater.is_some()
    }
}

/// The value of one top-level section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SectionValue {
    /// Plain `key: value` fields.
    Fields(Fields),
    /// Measurement pairs keyed by dimension name.
    Dimensions(IndexMap<String, DimensionPair>),
    /// The repeating fixed-schema location records.
    Records(Vec<LocationRecord>),
}

/// Mapping from section name to its parsed value, in document order.
///
/// Built once per document in a single forward pass; consumed exactly once
/// by the privacy splitter and encoder.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PropertyTree {
    sections: IndexMap<String, SectionValue>,
}

impl PropertyTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, section: &str) -> Option<&SectionValue> {
        self.sections.get(section)
    }

    pub fn insert(&mut self, section: String, value: SectionValue) {
        self.sections.insert(section, value);
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SectionValue)> {
        self.sections.iter()
    }

    /// Consume the tree in section order.
    pub fn into_sections(self) -> IndexMap<String, SectionValue> {
        self.sections
    }

    /// Scalar fields of `section`, created on first use. `None` when the
    /// section already holds a different shape, which the parser treats as
    /// an undefined document layout and discards the line.
    pub(crate) fn fields_mut(&mut self, section: &str) -> Option<&mut Fields> {
        let value = self
            .sections
            .entry(section.to_owned())
            .or_insert_with(|| SectionValue::Fields(Fields::new()));
        match value {
            SectionValue::Fields(fields) => Some(fields),
            _ => {
                warn!("section '{section}' does not hold scalar fields");
                None
            }
        }
    }

    /// Measurement pairs of `section`, created on first use.
    pub(crate) fn dimensions_mut(
        &mut self,
        section: &str,
    ) -> Option<&mut IndexMap<String, DimensionPair>> {
        let value = self
            .sections
            .entry(section.to_owned())
            .or_insert_with(|| SectionValue::Dimensions(IndexMap::new()));
        match value {
            SectionValue::Dimensions(dimensions) => Some(dimensions),
            _ => {
                warn!("section '{section}' does not hold dimension pairs");
                None
            }
        }
    }

    /// Location records of `section`, created on first use.
    pub(crate) fn records_mut(&mut self, section: &str) -> Option<&mut Vec<LocationRecord>> {
        let value = self
            .sections
            .entry(section.to_owned())
            .or_insert_with(|| SectionValue::Records(Vec::new()));
        match value {
            SectionValue::Records(records) => Some(records),
            _ => {
                warn!("section '{section}' does not hold location records");
                None
            }
        }
    }
}

impl<'a> IntoIterator for &'a PropertyTree {
    type Item = (&'a String, &'a SectionValue);
    type IntoIter = indexmap::map::Iter<'a, String, SectionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}
