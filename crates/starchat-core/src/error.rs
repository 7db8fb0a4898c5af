//! Error types for the StarChat core library
//!
//! Decision-table parsing, version handling and the HTTP client all report
//! failures through [`Error`]. Lookups that may legitimately find nothing
//! (such as [`crate::DecisionTable::get_state`]) return `Option` instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for StarChat operations
#[derive(Error, Debug)]
pub enum Error {
    /// The major version is not one of the supported schema dialects
    #[error("Unsupported version: {version} (supported major versions are 4 and 5)")]
    UnsupportedVersion { version: String },

    /// A required key is absent from a document for the active dialect
    #[error("Missing field '{field}' in document: {document}")]
    MissingField {
        field: String,
        document: serde_json::Value,
    },

    /// A key is present but holds a value of the wrong shape
    #[error("Invalid field '{field}': expected {expected}")]
    InvalidField { field: String, expected: String },

    /// Parsed states and raw hits are no longer index-aligned
    #[error("Internal consistency error at hit {index}: expected state '{expected}', found '{found}'")]
    InternalConsistency {
        index: usize,
        expected: String,
        found: String,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP/Network related errors
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn unsupported_version(version: impl Into<String>) -> Self {
        Error::UnsupportedVersion {
            version: version.into(),
        }
    }

    pub(crate) fn missing_field(field: impl Into<String>, document: &serde_json::Value) -> Self {
        Error::MissingField {
            field: field.into(),
            document: document.clone(),
        }
    }

    pub(crate) fn invalid_field(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Error::InvalidField {
            field: field.into(),
            expected: expected.into(),
        }
    }
}

/// How version problems are treated by table construction and translation
///
/// `Strict` surfaces an unsupported major version as
/// [`Error::UnsupportedVersion`]. `Warn` logs it at error level and carries
/// on, which is how the server's Python tooling historically behaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrictMode {
    /// Fail on an unsupported version
    #[default]
    Strict,
    /// Log and proceed
    Warn,
}

impl fmt::Display for StrictMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrictMode::Strict => write!(f, "Strict"),
            StrictMode::Warn => write!(f, "Warn"),
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}
