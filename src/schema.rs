//! Static catalog schema: recognized section headers, dimension-table
//! literals, the location-record layout, and the per-section field mapping
//! that drives data types and privacy.
//!
//! The catalog sheets this crate understands are human-authored Word
//! documents from the LaSalle museum collection, so every literal here is
//! the exact (Portuguese) text that appears in those documents. The whole
//! schema is immutable and is passed into the parser explicitly; nothing
//! here is mutated at runtime.
use phf::phf_map;
use serde::{Deserialize, Serialize};

/// Data type of a catalog field, as understood by the downstream importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Textarea,
    Date,
}

impl DataType {
    /// The type token used in the compound header grammar.
    pub const fn as_str(self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Textarea => "textarea",
            DataType::Date => "date",
        }
    }
}

/// Per-field mapping entry: the field's data type and whether its value
/// must be withheld from public display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub data_type: DataType,
    pub private: bool,
}

impl FieldSpec {
    pub const fn new(data_type: DataType, private: bool) -> Self {
        Self { data_type, private }
    }

    /// Default for any `(section, field)` pair absent from the mapping.
    pub const fn unmapped() -> Self {
        Self::new(DataType::Text, false)
    }
}

/// Field mapping of one section.
pub type FieldMap = phf::Map<&'static str, FieldSpec>;

static REGISTRO_DE_ACERVO: FieldMap = phf_map! {
    "Nª do livro Tombo" => FieldSpec::new(DataType::Text, true),
    "Nª de Registro" => FieldSpec::new(DataType::Text, true),
    "Outros números" => FieldSpec::new(DataType::Text, true),
    "Localização no Museu" => FieldSpec::new(DataType::Text, true),
};

static DADOS_TECNICOS: FieldMap = phf_map! {
    "Data da confecção do material" => FieldSpec::new(DataType::Date, false),
    "Autor/Autoridade" => FieldSpec::new(DataType::Text, true),
    "Descrição intrínseca" => FieldSpec::new(DataType::Text, true),
    "Matéria Prima" => FieldSpec::new(DataType::Text, true),
    "Inscrição/ Marcas/ Títulos" => FieldSpec::new(DataType::Text, true),
    "Técnica de manufatura" => FieldSpec::new(DataType::Text, true),
    "Técnica decorativa" => FieldSpec::new(DataType::Text, true),
    "Representação/ Decoração" => FieldSpec::new(DataType::Text, true),
    "Observações/Outras Características" => FieldSpec::new(DataType::Textarea, true),
};

static PROCEDENCIA: FieldMap = phf_map! {
    "Município" => FieldSpec::new(DataType::Text, true),
    "Sítio" => FieldSpec::new(DataType::Text, true),
    "Localidade" => FieldSpec::new(DataType::Text, true),
    "Estado" => FieldSpec::new(DataType::Text, true),
    "Região" => FieldSpec::new(DataType::Text, true),
    "Proprietário" => FieldSpec::new(DataType::Text, true),
};

static FORMA_DE_AQUISICAO: FieldMap = phf_map! {
    "Data da Aquisição" => FieldSpec::new(DataType::Date, true),
    "Doador" => FieldSpec::new(DataType::Text, true),
    "Último Proprietário" => FieldSpec::new(DataType::Text, true),
    "Personalidade/ Pessoa" => FieldSpec::new(DataType::Text, true),
    "Outras Informações" => FieldSpec::new(DataType::Textarea, true),
};

static ESTADO_DE_CONSERVACAO: FieldMap = phf_map! {
    "Descrição" => FieldSpec::new(DataType::Textarea, true),
};

static DADOS_HISTORICOS: FieldMap = phf_map! {
    "Histórico" => FieldSpec::new(DataType::Textarea, false),
};

static PARECER: FieldMap = phf_map! {
    "Localização" => FieldSpec::new(DataType::Text, true),
    "Saída" => FieldSpec::new(DataType::Date, true),
    "Retornar" => FieldSpec::new(DataType::Date, true),
    "Responsável" => FieldSpec::new(DataType::Text, true),
};

static OUTROS: FieldMap = phf_map! {
    "Referências Bibliográficas/ Fontes" => FieldSpec::new(DataType::Text, true),
    "Repetidos/ Duplos" => FieldSpec::new(DataType::Text, true),
};

/// Section name (normalized casing) to its field mapping.
static METADATUM_MAPPING: phf::Map<&'static str, &'static FieldMap> = phf_map! {
    "Registro de acervo" => &REGISTRO_DE_ACERVO,
    "Dados técnicos" => &DADOS_TECNICOS,
    "Procedência" => &PROCEDENCIA,
    "Forma de aquisição" => &FORMA_DE_AQUISICAO,
    "Estado de conservação" => &ESTADO_DE_CONSERVACAO,
    "Dados históricos" => &DADOS_HISTORICOS,
    "Parecer" => &PARECER,
    "Outros" => &OUTROS,
};

/// Section header literals as they appear in the source documents
/// (upper-cased by the document authors).
static VALID_SECTION_HEADERS: &[&str] = &[
    "REGISTRO DE ACERVO",
    "DADOS TÉCNICOS",
    "PROCEDÊNCIA",
    "DIMENSÕES",
    "FORMA DE AQUISIÇÃO",
    "ESTADO DE CONSERVAÇÃO",
    "DADOS HISTÓRICOS",
    "PARECER",
];

/// Unit and column-label noise inside the dimensions table.
static IGNORE_TABLE_HEADERS: &[&str] = &["Cm", "Menor", "Maior", "Fotografia"];

/// Physical dimensions the measurement table may carry.
static VALID_TABLE_HEADERS: &[&str] = &[
    "Comprimento",
    "Espessura",
    "Diâmetro",
    "Altura",
    "Circunferência",
    "Profundidade",
    "Peso",
];

/// Immutable catalog schema handed to the parser and the encoder.
///
/// [`Schema::la_salle`] builds the layout of the LaSalle museum catalog
/// sheets; all lookups are read-only so one schema can be shared freely
/// across documents.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Recognized section header literals, in document order. The first
    /// entry doubles as the section that is current before any header
    /// has been seen.
    pub section_headers: &'static [&'static str],
    /// Literal that switches the parser into dimension-table mode.
    pub dimensions_section: &'static str,
    /// Literal that switches the parser into location-record mode.
    pub locations_section: &'static str,
    /// Literal that ends dimension-table mode.
    pub table_end_section: &'static str,
    /// Table rows to discard while reading dimensions.
    pub table_ignore: &'static [&'static str],
    /// Valid dimension names inside the measurement table.
    pub dimension_names: &'static [&'static str],
    /// Slot names of a lesser/greater measurement pair, in fill order.
    pub dimension_slots: [&'static str; 2],
    /// The fixed 4-field location record, in cycle order. These literals
    /// also label the table columns, so matching lines are discarded.
    pub location_slots: [&'static str; 4],
    /// Field literal that terminates the location block.
    pub location_sentinel: &'static str,
    /// Section that owns everything after the location sentinel.
    pub catch_all_section: &'static str,
    /// Section and field the synthesized item title is copied from.
    pub title_section: &'static str,
    pub title_field: &'static str,
    /// Suffix appended to a section name to form its shadow private group.
    pub private_suffix: &'static str,
    mapping: &'static phf::Map<&'static str, &'static FieldMap>,
}

impl Schema {
    /// The schema of the LaSalle museum catalog sheets.
    pub fn la_salle() -> Self {
        Self {
            section_headers: VALID_SECTION_HEADERS,
            dimensions_section: "DIMENSÕES",
            locations_section: "PARECER",
            table_end_section: "FORMA DE AQUISIÇÃO",
            table_ignore: IGNORE_TABLE_HEADERS,
            dimension_names: VALID_TABLE_HEADERS,
            dimension_slots: ["menor", "maior"],
            location_slots: ["Localização", "Saída", "Retornar", "Responsável"],
            location_sentinel: "Referências Bibliográficas/ Fontes",
            catch_all_section: "Outros",
            title_section: "Dados técnicos",
            title_field: "Título",
            private_suffix: " - PRIVADO",
            mapping: &METADATUM_MAPPING,
        }
    }

    /// Whether `candidate` is one of the recognized section header literals.
    pub fn is_section_header(&self, candidate: &str) -> bool {
        self.section_headers.contains(&candidate)
    }

    /// Normalize a section header: first letter capitalized, remainder
    /// lower-cased (`"DADOS TÉCNICOS"` becomes `"Dados técnicos"`).
    pub fn normalize_section(header: &str) -> String {
        let lower = header.to_lowercase();
        let mut chars = lower.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => lower,
        }
    }

    /// The section that is current before any header line has been seen.
    pub fn initial_section(&self) -> String {
        Self::normalize_section(self.section_headers[0])
    }

    /// Field mapping of a (normalized) section name, if the section is known.
    pub fn section_mapping(&self, section: &str) -> Option<&'static FieldMap> {
        self.mapping.get(section).copied()
    }

    /// Mapping entry for one field of one section. Unmapped pairs default
    /// to public text.
    pub fn field_spec(&self, section: &str, field: &str) -> FieldSpec {
        self.section_mapping(section)
            .and_then(|fields| fields.get(field))
            .copied()
            .unwrap_or(FieldSpec::unmapped())
    }

    /// Group key of the shadow private group of `section`.
    pub fn private_group(&self, section: &str) -> String {
        format!("{section}{}", self.private_suffix)
    }

    /// Whether `group` is a shadow private group.
    pub fn is_private_group(&self, group: &str) -> bool {
        group.ends_with(self.private_suffix)
    }

    /// Section name a group key resolves to in the mapping, with any
    /// privacy suffix removed.
    pub fn base_group<'a>(&self, group: &'a str) -> &'a str {
        group.strip_suffix(self.private_suffix).unwrap_or(group)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::la_salle()
    }
}
