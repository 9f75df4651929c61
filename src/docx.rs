//! Word document reader.
//!
//! A `.docx` file is a ZIP container; the catalog record lives in
//! `word/document.xml` and the item's photograph is embedded under
//! `word/media/`. This module extracts the raw text as a line stream, one
//! line per paragraph and per table cell, and picks the single largest
//! embedded image as the attachment candidate.
//!
//! This is deliberately not a general OOXML parser: it reads exactly what
//! the catalog converter needs and ignores everything else in the package.
//!
//! # Examples
//!
//! ```no_run
//! let document = acervo::docx::read_file("BUSTO.docx")?;
//! for line in document.text.lines() {
//!     println!("{line}");
//! }
//! # Ok::<(), acervo::Error>(())
//! ```
use crate::error::{Error, Result};
use aho_corasick::{AhoCorasick, MatchKind};
use log::debug;
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

// Use LeftmostLongest to ensure longer entities are matched first (e.g., &amp; instead of &lt;)
static XML_UNESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
        .expect("Failed to build XML unescaper")
});

/// Replace the five standard XML entities with their characters. Unknown or
/// malformed entities are left unchanged.
fn unescape_xml(s: &str) -> String {
    XML_UNESCAPER.replace_all(s, &["&", "<", ">", "\"", "'"])
}

/// The package part holding the main document content.
const DOCUMENT_PART: &str = "word/document.xml";

/// Extensions eligible as the attachment image, matched case-insensitively.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

/// An image embedded in the document package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Entry name inside the package, e.g. `word/media/image1.png`.
    pub name: String,
}

/// The reader's output: the document text as `\n`-separated logical lines,
/// plus the largest embedded image, when the package contains one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub text: String,
    pub image: Option<EmbeddedImage>,
}

/// Read a `.docx` file from disk.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<ExtractedDocument> {
    read(BufReader::new(File::open(path)?))
}

/// Read a `.docx` package from any seekable reader.
///
/// Fails with [`Error::MissingDocumentPart`] when the container holds no
/// `word/document.xml`.
pub fn read<R: Read + Seek>(reader: R) -> Result<ExtractedDocument> {
    let mut archive = ZipArchive::new(reader)?;

    let mut document_xml: Option<Vec<u8>> = None;
    let mut image: Option<EmbeddedImage> = None;
    let mut image_size = 0u64;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_owned();
        let size = entry.size();

        if is_image_entry(&name) {
            // keep only the largest image; first one wins on ties
            if size > image_size {
                let mut data = Vec::with_capacity(size as usize);
                entry.read_to_end(&mut data)?;
                debug!("attachment candidate: {name} ({size} bytes)");
                image = Some(EmbeddedImage { data, name });
                image_size = size;
            }
            continue;
        }

        if name == DOCUMENT_PART {
            let mut data = Vec::with_capacity(size as usize);
            entry.read_to_end(&mut data)?;
            document_xml = Some(data);
        }
    }

    let xml = document_xml.ok_or_else(|| Error::MissingDocumentPart(DOCUMENT_PART.to_owned()))?;
    Ok(ExtractedDocument {
        text: extract_text(&xml)?,
        image,
    })
}

fn is_image_entry(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
}

/// The element whose closing tag the reader saw last, when it matters for
/// a line break: `</w:r></w:p>` ends a line of text, `</w:rPr></w:pPr>`
/// separates a formatted paragraph from the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closed {
    Other,
    Run,
    RunProperties,
}

/// Strip the WordprocessingML markup down to a line stream: `w:t` content
/// is kept, a paragraph end that closes a run (`</w:r></w:p>`) becomes a
/// line break, and so does a run-properties block closing its paragraph
/// properties (`</w:rPr></w:pPr>`). A cell boundary adds nothing of its
/// own: the cell's last paragraph already broke the line, so each table
/// cell comes out as exactly one line. Runs inside one paragraph stay on
/// one line.
fn extract_text(xml: &[u8]) -> Result<String> {
    let mut reader = Reader::from_reader(xml);
    let mut text = String::with_capacity(xml.len() / 8);
    let mut in_text_element = false;
    let mut last_closed = Closed::Other;
    let mut buf = Vec::with_capacity(512);

    loop {
        let event = reader.read_event_into(&mut buf);
        // adjacency matters: any event in between voids the pair
        let previous = std::mem::replace(&mut last_closed, Closed::Other);
        match event {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_element = true;
                }
            }
            Ok(Event::Text(e)) if in_text_element => {
                let chunk = reader
                    .decoder()
                    .decode(e.as_ref())
                    .map_err(|e| Error::Xml(e.to_string()))?;
                text.push_str(&unescape_xml(&chunk));
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_element = false,
                b"r" => last_closed = Closed::Run,
                b"rPr" => last_closed = Closed::RunProperties,
                b"p" if previous == Closed::Run => text.push('\n'),
                b"pPr" if previous == Closed::RunProperties => text.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}
