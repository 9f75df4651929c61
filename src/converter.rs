//! The end-to-end document converter.
//!
//! [`Converter`] ties the pipeline together: read the `.docx` package,
//! parse the text into a property tree, split private fields into their
//! shadow groups, then encode one header row and one data row of compound
//! grammar tokens. The embedded photograph is persisted to a temporary
//! file and referenced from the final `special_document` column.
//!
//! # Examples
//!
//! ```no_run
//! use acervo::Converter;
//!
//! let converter = Converter::new();
//! converter.convert_file("BUSTO.docx", "BUSTO.csv")?;
//! # Ok::<(), acervo::Error>(())
//! ```
use crate::compound;
use crate::docx::{self, EmbeddedImage, ExtractedDocument};
use crate::error::{Error, Result};
use crate::parser::{Parser, PropertyTree, SectionValue};
use crate::privacy::{self, GroupValue};
use crate::schema::Schema;
use crate::writer::{self, SPECIAL_DOCUMENT};
use log::{debug, info, warn};
use serde::Deserialize;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::{Path, PathBuf};

/// Legacy character handling for the encoded values.
///
/// Catalog sheets predating the museum's UTF-8 migration carry ISO-8859-1
/// bytes that survive the lossy document read as U+0080..U+00FF code
/// points; `Iso88591` reinterprets those back into proper text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    #[default]
    Utf8,
    Iso88591,
}

impl TextEncoding {
    /// Apply the configured transcoding to one value.
    pub fn apply<'a>(&self, value: &'a str) -> Cow<'a, str> {
        match self {
            TextEncoding::Utf8 => Cow::Borrowed(value),
            TextEncoding::Iso88591 => encoding_rs::mem::decode_latin1(value.as_bytes()),
        }
    }
}

/// Output options of a conversion run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Column delimiter, also used by the inner sub-record encoding.
    pub delimiter: char,
    /// Quote character around fields that need escaping.
    pub enclosure: char,
    /// Separator between the rows of a multi-valued group.
    pub multivalued_delimiter: String,
    /// Legacy character handling applied to every encoded value.
    pub encode: TextEncoding,
    /// Upper bound on property columns; the attachment column is exempt.
    pub max_properties: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            delimiter: ',',
            enclosure: '"',
            multivalued_delimiter: "||".to_owned(),
            encode: TextEncoding::Utf8,
            max_properties: 20,
        }
    }
}

impl Options {
    pub(crate) fn delimiter_byte(&self) -> Result<u8> {
        single_byte(self.delimiter, "delimiter")
    }

    pub(crate) fn enclosure_byte(&self) -> Result<u8> {
        single_byte(self.enclosure, "enclosure")
    }
}

fn single_byte(c: char, option: &str) -> Result<u8> {
    u8::try_from(u32::from(c))
        .map_err(|_| Error::InvalidOption(format!("{option} must be a single-byte character, got '{c}'")))
}

/// Converts one catalog sheet into a two-row delimited record.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    schema: Schema,
    options: Options,
}

impl Converter {
    /// A converter with the LaSalle schema and default output options.
    pub fn new() -> Self {
        Self::default()
    }

    /// A converter with the LaSalle schema and the given output options.
    pub fn with_options(options: Options) -> Self {
        Self {
            schema: Schema::la_salle(),
            options,
        }
    }

    /// A converter over a custom schema.
    pub fn with_schema(schema: Schema, options: Options) -> Self {
        Self { schema, options }
    }

    /// Convert a `.docx` file into a delimited file.
    ///
    /// The output file is only created once the whole record has encoded
    /// cleanly, so a failed conversion leaves nothing behind.
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(&self, document: P, output: Q) -> Result<()> {
        info!("converting {}", document.as_ref().display());
        let reader = BufReader::new(File::open(document)?);
        let (headers, values) = self.encode_document(docx::read(reader)?)?;
        writer::write_row(&headers, &values, &self.options, File::create(output)?)
    }

    /// Convert a `.docx` package from any seekable reader, writing the
    /// two-row record to `output`.
    pub fn convert<R: Read + Seek, W: Write>(&self, reader: R, output: W) -> Result<()> {
        let (headers, values) = self.encode_document(docx::read(reader)?)?;
        writer::write_row(&headers, &values, &self.options, output)
    }

    fn encode_document(&self, document: ExtractedDocument) -> Result<(Vec<String>, Vec<String>)> {
        let image = document.image.ok_or(Error::NoEmbeddedImage)?;
        let attachment = create_image_file(&image)?;
        let tree = Parser::new(&self.schema).parse(&document.text);
        self.build_row(tree, &attachment.to_string_lossy())
    }

    /// Encode a parsed tree into the header and data rows.
    ///
    /// The item title is synthesized from the mapped title field before the
    /// privacy split, empty groups are dropped, and property columns beyond
    /// `max_properties` are discarded. The attachment column always comes
    /// last and is exempt from the cap.
    pub fn build_row(&self, tree: PropertyTree, attachment: &str) -> Result<(Vec<String>, Vec<String>)> {
        let title = match tree.get(self.schema.title_section) {
            Some(SectionValue::Fields(fields)) => fields
                .get(self.schema.title_field)
                .cloned()
                .unwrap_or_default(),
            _ => String::new(),
        };
        if title.is_empty() {
            warn!("document carries no '{}' field", self.schema.title_field);
        }

        let mut groups = privacy::split_private(tree, &self.schema);
        groups.insert(self.schema.title_field.to_owned(), GroupValue::Scalar(title));

        let mut headers = Vec::with_capacity(groups.len() + 1);
        let mut values = Vec::with_capacity(groups.len() + 1);
        for (name, value) in &groups {
            if headers.len() >= self.options.max_properties {
                warn!("column limit reached, dropping group '{name}' and the rest");
                break;
            }
            if value.is_empty() {
                debug!("dropping empty group '{name}'");
                continue;
            }
            headers.push(compound::header(name, value, &self.schema));
            values.push(compound::encode(name, value, &self.schema, &self.options)?);
        }

        headers.push(SPECIAL_DOCUMENT.to_owned());
        values.push(format!("file:{attachment}"));
        Ok((headers, values))
    }
}

/// Persist the embedded image next to the system temp files so the
/// attachment column can point at a real path.
fn create_image_file(image: &EmbeddedImage) -> Result<PathBuf> {
    let extension = Path::new(&image.name)
        .extension()
        .and_then(OsStr::to_str)
        .unwrap_or("img");
    let mut file = tempfile::Builder::new()
        .prefix("IMP")
        .suffix(&format!(".{extension}"))
        .tempfile()?;
    file.write_all(&image.data)?;
    let (_, path) = file.keep().map_err(|e| Error::Io(e.error))?;
    debug!("attachment persisted to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use zip::write::SimpleFileOptions;

    fn document(lines: &[&str], image: Option<(&str, &[u8])>) -> Cursor<Vec<u8>> {
        let mut xml = String::from("<w:document><w:body>");
        for line in lines {
            xml.push_str(&format!("<w:p><w:r><w:t>{line}</w:t></w:r></w:p>"));
        }
        xml.push_str("</w:body></w:document>");

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        if let Some((name, data)) = image {
            writer
                .start_file(name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap()
    }

    fn convert_to_lines(package: Cursor<Vec<u8>>) -> Vec<String> {
        let mut out = Vec::new();
        Converter::new().convert(package, &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn test_end_to_end_minimal_document() {
        let package = document(
            &["Objeto: Busto", "DADOS TÉCNICOS", "Título: Busto de Gesso"],
            Some(("word/media/image1.png", &[0x89, 0x50, 0x4e, 0x47])),
        );
        let lines = convert_to_lines(package);
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "Registro de acervo|compound(Objeto|text)|display_yes,\
             Dados técnicos|compound(Título|text)|display_yes,\
             Título|text,special_document"
        );
        assert!(lines[1].starts_with("Busto,Busto de Gesso,Busto de Gesso,file:"));
        assert!(lines[1].ends_with(".png"));
    }

    #[test]
    fn test_end_to_end_dimensions_table() {
        // the table arrives as one line per cell; the skip choreography
        // must land the two value cells in the lesser/greater slots
        let cells = ["Altura", "Cm", "Menor", "Maior", "10 cm", "foto", "12 cm"]
            .map(|cell| format!("<w:tc><w:p><w:r><w:t>{cell}</w:t></w:r></w:p></w:tc>"))
            .join("");
        let xml = format!(
            "<w:document><w:body>\
             <w:p><w:r><w:t>Objeto: Busto</w:t></w:r></w:p>\
             <w:p><w:r><w:t>DIMENSÕES</w:t></w:r></w:p>\
             <w:tbl><w:tr>{cells}</w:tr></w:tbl>\
             </w:body></w:document>"
        );

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer
            .start_file("word/media/image1.png", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(&[0x89, 0x50, 0x4e, 0x47]).unwrap();
        let package = writer.finish().unwrap();

        let lines = convert_to_lines(package);
        // the grammar token and the value both carry a comma, so both
        // arrive enclosed
        assert!(lines[0].contains(
            "\"Dimensões|compound(menor|text,maior|text)|multiple|display_yes\""
        ));
        assert!(lines[1].contains("\"10 cm,12 cm\""));
    }

    #[test]
    fn test_end_to_end_persists_attachment() {
        let image_bytes = [0xffu8, 0xd8, 0xff, 0xe0];
        let package = document(
            &["Objeto: Busto"],
            Some(("word/media/foto.jpg", &image_bytes)),
        );
        let lines = convert_to_lines(package);
        let path = lines[1]
            .rsplit_once("file:")
            .map(|(_, path)| path.to_owned())
            .unwrap();
        assert!(path.ends_with(".jpg"));
        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, image_bytes);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let package = document(&["Objeto: Busto"], None);
        let mut out = Vec::new();
        match Converter::new().convert(package, &mut out) {
            Err(Error::NoEmbeddedImage) => assert!(out.is_empty()),
            other => panic!("expected missing image, got {other:?}"),
        }
    }

    #[test]
    fn test_title_column_present_even_without_title_field() {
        let converter = Converter::new();
        let schema = Schema::la_salle();
        let tree = Parser::new(&schema).parse("Objeto: Busto\n");
        let (headers, values) = converter.build_row(tree, "/tmp/IMP1.png").unwrap();
        assert_eq!(
            headers,
            vec![
                "Registro de acervo|compound(Objeto|text)|display_yes".to_string(),
                "Título|text".to_string(),
                "special_document".to_string(),
            ]
        );
        assert_eq!(values[1], "");
        assert_eq!(values[2], "file:/tmp/IMP1.png");
    }

    #[test]
    fn test_column_cap_spares_the_attachment() {
        let options = Options {
            max_properties: 2,
            ..Options::default()
        };
        let converter = Converter::with_options(options);
        let schema = Schema::la_salle();
        let text = "Objeto: Busto\n\
                    PROCEDÊNCIA\nMunicípio: Niterói\n\
                    DADOS HISTÓRICOS\nHistórico: Doado em 1950\n\
                    DADOS TÉCNICOS\nTítulo: Busto de Gesso\n";
        let tree = Parser::new(&schema).parse(text);
        let (headers, values) = converter.build_row(tree, "/tmp/IMP1.png").unwrap();

        assert_eq!(headers.len(), 3);
        assert_eq!(values.len(), 3);
        assert_eq!(headers[2], "special_document");
        assert_eq!(values[2], "file:/tmp/IMP1.png");
    }

    #[test]
    fn test_empty_groups_are_dropped() {
        let converter = Converter::new();
        let schema = Schema::la_salle();
        // a PARECER header with no records leaves an empty group behind
        let tree = Parser::new(&schema).parse("Objeto: Busto\nPARECER\n");
        let (headers, _) = converter.build_row(tree, "/tmp/IMP1.png").unwrap();
        assert!(!headers.iter().any(|h| h.starts_with("Parecer")));
    }

    #[test]
    fn test_private_shadow_groups_in_output() {
        let converter = Converter::new();
        let schema = Schema::la_salle();
        let text = "Objeto: Busto\nNª de Registro: 17\n\
                    PROCEDÊNCIA\nMunicípio: Niterói\nEstado: RJ\n";
        let tree = Parser::new(&schema).parse(text);
        let (headers, values) = converter.build_row(tree, "/tmp/IMP1.png").unwrap();

        let index = headers
            .iter()
            .position(|h| h.starts_with("Procedência - PRIVADO|"))
            .unwrap();
        assert_eq!(
            headers[index],
            "Procedência - PRIVADO|compound(Município|text,Estado|text)|display_no"
        );
        assert_eq!(values[index], "Niterói,RJ");
        assert!(headers.iter().any(|h| {
            h == "Registro de acervo - PRIVADO|compound(Nª de Registro|text)|display_no"
        }));
    }

    #[test]
    fn test_hard_error_writes_nothing() {
        let converter = Converter::new();
        let schema = Schema::la_salle();
        // two locations, the second cut short by the sentinel mid-record
        let text = "PARECER\nSala 3\n-\n2001\n-\n2002\n-\nJoão\n-\nDepósito\n-\n\
                    Referências Bibliográficas/ Fontes: Livro X\n";
        let tree = Parser::new(&schema).parse(text);
        match converter.build_row(tree, "/tmp/IMP1.png") {
            Err(Error::FieldCountMismatch { field, .. }) => assert_eq!(field, "Parecer"),
            other => panic!("expected field count mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_non_default_options_round_trip() {
        let options: Options = serde_json::from_str(
            r#"{"delimiter": ";", "encode": "iso88591", "max_properties": 5}"#,
        )
        .unwrap();
        assert_eq!(options.delimiter, ';');
        assert_eq!(options.enclosure, '"');
        assert_eq!(options.encode, TextEncoding::Iso88591);
        assert_eq!(options.max_properties, 5);
        assert_eq!(options.multivalued_delimiter, "||");
    }
}
