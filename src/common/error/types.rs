//! Unified error types for the import library.
//!
//! Only unrecoverable conditions surface as an [`Error`]: a picture whose
//! header cannot be read, a zone index with a bad signature, a root zone that
//! does not exist. Everything that goes wrong inside a single opcode or zone
//! is reported in-band and the parse continues.
use thiserror::Error;

use crate::common::stream::StreamError;

/// Main error type for import operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Low-level read failure on the input stream
    #[error("Stream error: {0}")]
    Stream(StreamError),

    /// Parse error occurred
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid file format (bad signature, unknown version)
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Corrupted or malformed file
    #[error("Corrupted file: {0}")]
    CorruptedFile(String),
}

/// Result type for import operations.
pub type Result<T> = std::result::Result<T, Error>;
