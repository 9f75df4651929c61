//! Stateful section/table/location parser.
//!
//! Turns the flat line stream extracted from a catalog document into a
//! nested [`PropertyTree`]. The parse is best effort over a semi-structured
//! human-authored document: a line that matches no rule in the current mode
//! is silently discarded rather than reported.
//!
//! # Examples
//!
//! ```
//! use acervo::parser::Parser;
//! use acervo::schema::Schema;
//!
//! let schema = Schema::la_salle();
//! let tree = Parser::new(&schema).parse("DADOS TÉCNICOS\nTítulo: Busto de Gesso\n");
//! assert_eq!(tree.len(), 1);
//! ```
mod tree;

use crate::schema::Schema;
use log::debug;
pub use tree::{DimensionPair, Fields, LocationRecord, PropertyTree, SectionValue};

/// What the classifier is currently reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Plain `key: value` property lines (initial).
    Properties,
    /// The dimensions measurement table.
    Table,
    /// The repeating 4-line location records.
    Locations,
}

/// Line classifier state, threaded through the per-line step.
#[derive(Debug)]
struct State {
    mode: Mode,
    /// Lines still to discard before classification resumes.
    skip: usize,
    /// Dimension currently receiving lesser/greater values, once one has
    /// ever been selected.
    dimension: Option<String>,
    /// Position 0..=3 inside the current location record cycle.
    location_slot: usize,
    /// The section receiving fields; never empty.
    section: String,
}

/// Parser for the line-oriented catalog text.
pub struct Parser<'a> {
    schema: &'a Schema,
}

impl<'a> Parser<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Parse the whole document text in one forward pass.
    ///
    /// Lines are separated by `\n`. Each line is split on its first colon
    /// into a header candidate and an optional remainder; both sides are
    /// trimmed before classification.
    pub fn parse(&self, text: &str) -> PropertyTree {
        let mut tree = PropertyTree::new();
        let mut state = State {
            mode: Mode::Properties,
            skip: 0,
            dimension: None,
            location_slot: 0,
            section: self.schema.initial_section(),
        };

        for line in text.split('\n') {
            self.step(&mut tree, &mut state, line);
        }

        tree
    }

    fn step(&self, tree: &mut PropertyTree, state: &mut State, line: &str) {
        let (head, rest) = match line.split_once(':') {
            Some((head, rest)) => (head.trim(), Some(rest)),
            None => (line.trim(), None),
        };

        if state.skip > 0 {
            state.skip -= 1;
            return;
        }

        if self.schema.is_section_header(head) {
            state.section = Schema::normalize_section(head);
        }

        match state.mode {
            Mode::Properties => self.read_property(tree, state, head, rest),
            Mode::Table => self.read_table(tree, state, head, line),
            Mode::Locations => self.read_location(tree, state, head, rest),
        }
    }

    fn read_property(
        &self,
        tree: &mut PropertyTree,
        state: &mut State,
        head: &str,
        rest: Option<&str>,
    ) {
        if let Some(rest) = rest {
            if let Some(fields) = tree.fields_mut(&state.section) {
                fields.insert(head.to_owned(), rest.trim().to_owned());
            }
            return;
        }

        if head == self.schema.dimensions_section {
            debug!("entering dimension table");
            state.mode = Mode::Table;
            return;
        }

        if head == self.schema.locations_section {
            debug!("entering location records");
            state.mode = Mode::Locations;
            tree.insert(state.section.clone(), SectionValue::Records(Vec::new()));
        }
    }

    fn read_table(&self, tree: &mut PropertyTree, state: &mut State, head: &str, line: &str) {
        if head == self.schema.table_end_section {
            debug!("leaving dimension table");
            state.mode = Mode::Properties;
            return;
        }

        if self.schema.table_ignore.contains(&head) {
            return;
        }

        if self.schema.dimension_names.contains(&head) {
            state.dimension = Some(head.to_owned());
            // unit and column-label rows follow each dimension name
            state.skip = 3;
            return;
        }

        let Some(dimension) = &state.dimension else {
            return;
        };
        let Some(dimensions) = tree.dimensions_mut(&state.section) else {
            return;
        };

        let pair = dimensions.entry(dimension.clone()).or_default();
        if pair.lesser.is_none() {
            pair.lesser = Some(line.trim().to_owned());
            state.skip = 1;
        } else if pair.greater.is_none() {
            pair.greater = Some(line.trim().to_owned());
        }
        // a third value for the same dimension is silently ignored
    }

    fn read_location(
        &self,
        tree: &mut PropertyTree,
        state: &mut State,
        head: &str,
        rest: Option<&str>,
    ) {
        if head == self.schema.location_sentinel {
            // the sentinel ends the block and reassigns the rest of the
            // document to the catch-all section
            debug!("leaving location records");
            state.section = self.schema.catch_all_section.to_owned();
            if let Some(fields) = tree.fields_mut(&state.section) {
                fields.insert(head.to_owned(), rest.unwrap_or("").trim().to_owned());
            }
            state.mode = Mode::Properties;
            return;
        }

        if self.schema.location_slots.contains(&head)
            || (state.location_slot == 0 && head.is_empty())
        {
            return;
        }

        let slot = self.schema.location_slots[state.location_slot];
        let Some(records) = tree.records_mut(&state.section) else {
            return;
        };

        if state.location_slot == 0 {
            let mut record = LocationRecord::new();
            record.insert(slot.to_owned(), head.to_owned());
            records.push(record);
        } else if let Some(record) = records.last_mut() {
            record.insert(slot.to_owned(), head.to_owned());
        }

        state.skip = 1;
        state.location_slot = (state.location_slot + 1) % self.schema.location_slots.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> PropertyTree {
        let schema = Schema::la_salle();
        Parser::new(&schema).parse(text)
    }

    fn fields<'t>(tree: &'t PropertyTree, section: &str) -> &'t Fields {
        match tree.get(section) {
            Some(SectionValue::Fields(fields)) => fields,
            other => panic!("expected scalar fields under '{section}', got {other:?}"),
        }
    }

    #[test]
    fn test_key_value_lines_under_section() {
        let tree = parse("PROCEDÊNCIA\nMunicípio: Niterói\nEstado: RJ\nRegião: Sudeste\n");
        let fields = fields(&tree, "Procedência");
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["Município"], "Niterói");
        assert_eq!(fields["Estado"], "RJ");
        assert_eq!(fields["Região"], "Sudeste");
    }

    #[test]
    fn test_lines_before_any_header_use_initial_section() {
        let tree = parse("Objeto: Busto\n");
        assert_eq!(fields(&tree, "Registro de acervo")["Objeto"], "Busto");
    }

    #[test]
    fn test_section_persists_until_next_header() {
        let tree = parse("DADOS TÉCNICOS\nTítulo: Busto\nlinha sem valor\nAutor/Autoridade: X\n");
        let fields = fields(&tree, "Dados técnicos");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["Autor/Autoridade"], "X");
    }

    #[test]
    fn test_value_keeps_colons_after_the_first() {
        let tree = parse("Objeto: Busto: de gesso\n");
        assert_eq!(fields(&tree, "Registro de acervo")["Objeto"], "Busto: de gesso");
    }

    #[test]
    fn test_unrecognized_lines_are_discarded() {
        let tree = parse("ruído\nmais ruído\n\n");
        assert!(tree.is_empty());
    }

    #[test]
    fn test_dimension_block() {
        // the dimension name is followed by three label rows (skipped),
        // then each value row is followed by one photograph-cell row
        let text = "DIMENSÕES\nAltura\nCm\nMenor\nMaior\n10 cm\nfoto\n12 cm\n";
        let tree = parse(text);
        match tree.get("Dimensões") {
            Some(SectionValue::Dimensions(dims)) => {
                assert_eq!(dims.len(), 1);
                assert_eq!(dims["Altura"].lesser.as_deref(), Some("10 cm"));
                assert_eq!(dims["Altura"].greater.as_deref(), Some("12 cm"));
            }
            other => panic!("expected dimensions, got {other:?}"),
        }
    }

    #[test]
    fn test_third_dimension_value_is_ignored() {
        let text = "DIMENSÕES\nAltura\na\nb\nc\n10 cm\nfoto\n12 cm\n15 cm\n";
        let tree = parse(text);
        match tree.get("Dimensões") {
            Some(SectionValue::Dimensions(dims)) => {
                assert_eq!(dims["Altura"].lesser.as_deref(), Some("10 cm"));
                assert_eq!(dims["Altura"].greater.as_deref(), Some("12 cm"));
            }
            other => panic!("expected dimensions, got {other:?}"),
        }
    }

    #[test]
    fn test_table_rows_before_any_dimension_are_discarded() {
        let tree = parse("DIMENSÕES\n10 cm\n12 cm\n");
        assert!(tree.get("Dimensões").is_none());
    }

    #[test]
    fn test_acquisition_header_ends_table_mode() {
        let text = "DIMENSÕES\nFORMA DE AQUISIÇÃO\nDoador: Fulano\n";
        let tree = parse(text);
        assert_eq!(fields(&tree, "Forma de aquisição")["Doador"], "Fulano");
    }

    #[test]
    fn test_location_block_complete_records() {
        // each consumed slot line is followed by one skipped filler line
        let text = "PARECER\n\
                    Sala 3\n-\n2001\n-\n2002\n-\nJoão\n-\n\
                    Depósito\n-\n2003\n-\n2004\n-\nMaria\n-\n\
                    Referências Bibliográficas/ Fontes: Livro X\n";
        let tree = parse(text);
        match tree.get("Parecer") {
            Some(SectionValue::Records(records)) => {
                assert_eq!(records.len(), 2);
                for record in records {
                    assert_eq!(record.len(), 4);
                }
                assert_eq!(records[0]["Localização"], "Sala 3");
                assert_eq!(records[0]["Saída"], "2001");
                assert_eq!(records[0]["Retornar"], "2002");
                assert_eq!(records[0]["Responsável"], "João");
                assert_eq!(records[1]["Localização"], "Depósito");
            }
            other => panic!("expected location records, got {other:?}"),
        }
        // the sentinel's value lands in the catch-all section
        assert_eq!(
            fields(&tree, "Outros")["Referências Bibliográficas/ Fontes"],
            "Livro X"
        );
    }

    #[test]
    fn test_location_column_labels_are_discarded() {
        let text = "PARECER\nLocalização\nSaída\nSala 3\n-\n\
                    Referências Bibliográficas/ Fontes: Livro X\n";
        let tree = parse(text);
        match tree.get("Parecer") {
            Some(SectionValue::Records(records)) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0]["Localização"], "Sala 3");
            }
            other => panic!("expected location records, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_location_block() {
        let tree = parse("PARECER\nReferências Bibliográficas/ Fontes: Livro X\n");
        assert_eq!(tree.get("Parecer"), Some(&SectionValue::Records(Vec::new())));
        assert_eq!(
            fields(&tree, "Outros")["Referências Bibliográficas/ Fontes"],
            "Livro X"
        );
    }

    #[test]
    fn test_properties_after_sentinel_stay_in_catch_all() {
        let text = "PARECER\nReferências Bibliográficas/ Fontes: Livro X\n\
                    Repetidos/ Duplos: 2\n";
        let tree = parse(text);
        let outros = fields(&tree, "Outros");
        assert_eq!(outros.len(), 2);
        assert_eq!(outros["Repetidos/ Duplos"], "2");
    }

    #[test]
    fn test_skip_counter_suppresses_section_headers() {
        // the three skipped label rows swallow a section literal too
        let text = "DIMENSÕES\nAltura\nPARECER\nb\nc\n10 cm\n";
        let tree = parse(text);
        assert!(tree.get("Parecer").is_none());
        match tree.get("Dimensões") {
            Some(SectionValue::Dimensions(dims)) => {
                assert_eq!(dims["Altura"].lesser.as_deref(), Some("10 cm"));
            }
            other => panic!("expected dimensions, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
    }
}
