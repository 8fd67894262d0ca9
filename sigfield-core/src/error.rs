use crate::parser::ParseError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid rectangle [{left} {bottom} {right} {top}]: width and height must be positive")]
    InvalidRectangle {
        left: f64,
        bottom: f64,
        right: f64,
        top: f64,
    },

    #[error("Invalid field name: {0:?}")]
    InvalidFieldName(String),

    #[error("Duplicate field name: {0}")]
    DuplicateFieldName(String),

    #[error("Malformed annotation list: {0}")]
    MalformedAnnotationList(String),

    #[error("Failed to write {}: {source}", path.display())]
    StorageFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid PDF structure: {0}")]
    InvalidStructure(String),

    #[error("Invalid object reference: {0}")]
    InvalidReference(String),

    #[error("Invalid page number: {0}")]
    InvalidPageNumber(usize),

    #[error("Compression error: {0}")]
    CompressionError(String),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, PdfError>;
