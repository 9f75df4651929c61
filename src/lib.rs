//! Acervo - converter for the LaSalle museum catalog sheets
//!
//! Each `.docx` catalog sheet describes one collection item in a loose
//! section/field layout. This library turns a sheet into a two-row
//! delimited record the Tainacan importer understands: a header row of
//! compound-grammar tokens and a data row of encoded values, with the
//! item's photograph extracted as the final attachment column.
//!
//! # Features
//!
//! - **Document reader**: extract the text stream and the embedded
//!   photograph from the `.docx` package
//! - **Line parser**: sections, `key: value` fields, the measurement
//!   table, and cyclic location records
//! - **Privacy split**: mapped private fields move into `- PRIVADO`
//!   shadow groups
//! - **Compound encoding**: `name|compound(child|type,…)` headers with
//!   inner-encoded sub-records
//!
//! # Example - Converting a catalog sheet
//!
//! ```no_run
//! use acervo::Converter;
//!
//! # fn main() -> acervo::Result<()> {
//! let converter = Converter::new();
//! converter.convert_file("BUSTO.docx", "BUSTO.csv")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Inspecting the parsed tree
//!
//! ```no_run
//! use acervo::{Parser, Schema};
//!
//! # fn main() -> acervo::Result<()> {
//! let document = acervo::docx::read_file("BUSTO.docx")?;
//! let schema = Schema::la_salle();
//! let tree = Parser::new(&schema).parse(&document.text);
//!
//! for (section, _) in &tree {
//!     println!("section: {section}");
//! }
//! # Ok(())
//! # }
//! ```
pub mod compound;
pub mod converter;
pub mod docx;
pub mod error;
pub mod parser;
pub mod privacy;
pub mod schema;
pub mod writer;

pub use converter::{Converter, Options, TextEncoding};
pub use error::{Error, Result};
pub use parser::{Parser, PropertyTree};
pub use schema::Schema;
