//! Unified error types for the acervo converter.
//!
//! This module provides a single error type covering document extraction,
//! tree encoding, and CSV serialization, presenting a consistent API to users.
use thiserror::Error;

/// Main error type for acervo operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error while reading the .docx container
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required package part is missing from the container
    #[error("document part not found: {0}")]
    MissingDocumentPart(String),

    /// The document embeds no usable image to attach
    #[error("no embedded image found in document")]
    NoEmbeddedImage,

    /// A compound group's declared child headers do not match a value's
    /// element count. Not recoverable: the whole record is rejected.
    #[error("field '{field}' declares {expected} compound children but a value has {actual}")]
    FieldCountMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// A converter option holds an unusable value
    #[error("invalid option: {0}")]
    InvalidOption(String),
}

/// Result type for acervo operations.
pub type Result<T> = std::result::Result<T, Error>;
