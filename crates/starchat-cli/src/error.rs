//! Error types and handling for the CLI

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from starchat-core
    #[error("{0}")]
    Core(#[from] starchat_core::Error),

    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Invalid file format for {}: expected {}", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("State '{}' not found in the decision table", name)]
    StateNotFound { name: String },

    #[error("StarChat is not reachable at {}", address)]
    ServiceUnavailable { address: String },

    #[error("Upload to index '{}' failed for: {}", index, failed.join(", "))]
    UploadFailed { index: String, failed: Vec<String> },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(_) => 2,
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::StateNotFound { .. } => 7,
            Self::ServiceUnavailable { .. } => 8,
            Self::UploadFailed { .. } => 9,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Toml(_) | Self::TomlSerialize(_) => 14,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    let label = match error {
        Error::Core(starchat_core::Error::UnsupportedVersion { .. }) => {
            "Unsupported version:"
        }
        Error::Core(starchat_core::Error::Http { .. }) | Error::ServiceUnavailable { .. } => {
            "StarChat error:"
        }
        _ => "Error:",
    };

    let mut message = if use_color {
        use colored::Colorize;
        format!("{} {}", label.red().bold(), error)
    } else {
        format!("{} {}", label, error)
    };

    if let Error::Core(starchat_core::Error::UnsupportedVersion { .. }) = error {
        message.push_str("\nUse --lenient to continue with empty states.");
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_for_core_and_io() {
        let io_error = Error::from(io::Error::new(io::ErrorKind::NotFound, "missing"));
        let core_error = Error::from(starchat_core::Error::Configuration {
            message: "bad".to_string(),
        });
        assert_eq!(io_error.exit_code(), 1);
        assert_eq!(core_error.exit_code(), 2);
    }

    #[test]
    fn test_format_error_without_color() {
        let error = Error::StateNotFound {
            name: "greeting".to_string(),
        };
        assert_eq!(
            format_error(&error, false),
            "Error: State 'greeting' not found in the decision table"
        );
    }

    #[test]
    fn test_unsupported_version_hint() {
        let core = starchat_core::DecisionTable::from_document(
            serde_json::json!({"hits": []}),
            "3.0",
            starchat_core::StrictMode::Strict,
        )
        .unwrap_err();
        let formatted = format_error(&Error::Core(core), false);
        assert!(formatted.starts_with("Unsupported version:"));
        assert!(formatted.contains("--lenient"));
    }

    #[test]
    fn test_upload_failure_lists_states() {
        let error = Error::UploadFailed {
            index: "index_0".to_string(),
            failed: vec!["greeting".to_string(), "goodbye".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Upload to index 'index_0' failed for: greeting, goodbye"
        );
        assert!(!error.should_show_help());
        assert!(Error::invalid_args("x").should_show_help());
    }
}
