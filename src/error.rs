//! Error types for the ingestion pipeline.

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    #[error("Form error: {0}")]
    Form(#[from] FormError),

    #[error("Coordinate error: {0}")]
    Coordinate(#[from] CoordinateError),
}

/// Configuration-related errors.
///
/// These are the only fatal conditions in the system — they are raised
/// before any record is processed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unknown message type in filter: {0}")]
    UnknownMessageType(String),
}

/// Errors reading exported message files.
///
/// A per-file failure is logged and the file skipped; only a missing or
/// unreadable input directory surfaces to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Unparseable envelope in {file}: {reason}")]
    Malformed { file: String, reason: String },
}

/// Errors building a structured view of a form attachment.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("Malformed form XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Form attachment is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Empty form document")]
    Empty,
}

/// Errors parsing a raw coordinate string.
#[derive(Debug, thiserror::Error)]
pub enum CoordinateError {
    #[error("Empty coordinate string")]
    Empty,

    #[error("Unrecognized coordinate notation: {0:?}")]
    Malformed(String),

    #[error("Coordinate is not a finite number: {0:?}")]
    NonFinite(String),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
