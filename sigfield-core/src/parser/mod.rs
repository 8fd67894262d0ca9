//! PDF Parser Module
//!
//! Reads documents with a classic cross-reference table back into [`Object`]
//! values. Used to load base documents and to re-read generated output.
//!
//! [`Object`]: crate::objects::Object

pub mod lexer;
pub mod objects;
pub mod reader;
pub mod xref;

pub use self::reader::{ParsedPage, PdfReader};

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// PDF Parser errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid PDF header")]
    InvalidHeader,

    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Invalid object reference: {0} {1} R")]
    InvalidReference(u32, u16),

    #[error("Missing required key: {0}")]
    MissingKey(String),

    #[error("Invalid xref table")]
    InvalidXRef,

    #[error("Invalid trailer")]
    InvalidTrailer,

    #[error("Cross-reference streams are not supported")]
    UnsupportedXRefStream,

    #[error("Circular reference detected")]
    CircularReference,
}

/// Decode a PDF text string: UTF-16BE when it starts with a byte order mark,
/// otherwise one character per byte.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks(2)
            .map(|pair| match pair {
                [hi, lo] => u16::from_be_bytes([*hi, *lo]),
                [hi] => u16::from_be_bytes([*hi, 0]),
                _ => 0,
            })
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}
