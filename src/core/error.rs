//! Configuration error types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration error type
#[non_exhaustive]
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the configuration file
        path: PathBuf,
    },

    /// Configuration file read error
    #[error("Failed to read configuration file {path}: {message}")]
    FileReadError {
        /// Path to the configuration file
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Configuration parse error
    #[error("Failed to parse configuration {path}: {message}")]
    ParseError {
        /// Path (or pseudo-path) of the content that failed to parse
        path: PathBuf,
        /// Error message describing the parse failure
        message: String,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Error message describing the validation failure
        message: String,
        /// Optional field name that failed validation
        field: Option<String>,
    },

    /// Configuration source error
    #[error("Configuration source error: {message}")]
    SourceError {
        /// Error message describing the source error
        message: String,
        /// Origin of the configuration source
        origin: String,
    },

    /// Environment variable not found
    #[error("Environment variable not found: {name}")]
    EnvVarNotFound {
        /// Name of the environment variable
        name: String,
    },

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {value}")]
    EnvVarParseError {
        /// Name of the environment variable
        name: String,
        /// Value that failed to parse
        value: String,
    },

    /// Configuration reload error
    #[error("Failed to reload configuration: {message}")]
    ReloadError {
        /// Error message describing the reload failure
        message: String,
    },

    /// Configuration watch error
    #[error("Configuration watch error: {message}")]
    WatchError {
        /// Error message describing the watch failure
        message: String,
    },

    /// Configuration merge error
    #[error("Failed to merge configurations: {message}")]
    MergeError {
        /// Error message describing the merge failure
        message: String,
    },

    /// Configuration type error
    #[error("Configuration type error: {message}")]
    TypeError {
        /// Error message describing the type mismatch
        message: String,
        /// Expected type
        expected: String,
        /// Actual type encountered
        actual: String,
    },

    /// Configuration path error
    #[error("Configuration path error: {message}")]
    PathError {
        /// Error message describing the path issue
        message: String,
        /// Path that caused the error
        path: String,
    },

    /// Configuration format not supported
    #[error("Configuration format not supported: {format}")]
    FormatNotSupported {
        /// Format that is not supported
        format: String,
    },

    /// Invalid argument passed to a configuration operation
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message describing the invalid argument
        message: String,
    },
}

impl ConfigError {
    /// Create a file not found error
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a file read error
    pub fn file_read_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::FileReadError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation_error(message: impl Into<String>, field: Option<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field,
        }
    }

    /// Create a simple validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }

    /// Create a validation error with field
    pub fn validation_with_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a source error
    pub fn source_error(message: impl Into<String>, origin: impl Into<String>) -> Self {
        Self::SourceError {
            message: message.into(),
            origin: origin.into(),
        }
    }

    /// Create an environment variable not found error
    pub fn env_var_not_found(name: impl Into<String>) -> Self {
        Self::EnvVarNotFound { name: name.into() }
    }

    /// Create an environment variable parse error
    pub fn env_var_parse_error(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::EnvVarParseError {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a reload error
    pub fn reload_error(message: impl Into<String>) -> Self {
        Self::ReloadError {
            message: message.into(),
        }
    }

    /// Create a watch error
    pub fn watch_error(message: impl Into<String>) -> Self {
        Self::WatchError {
            message: message.into(),
        }
    }

    /// Create a merge error
    pub fn merge_error(message: impl Into<String>) -> Self {
        Self::MergeError {
            message: message.into(),
        }
    }

    /// Create a type error
    pub fn type_error(
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeError {
            message: message.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a path error
    pub fn path_error(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::PathError {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Create a format not supported error
    pub fn format_not_supported(format: impl Into<String>) -> Self {
        Self::FormatNotSupported {
            format: format.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConfigError::FileNotFound { .. }
                | ConfigError::EnvVarNotFound { .. }
                | ConfigError::ValidationError { .. }
        )
    }

    /// Check if error is due to missing source
    pub fn is_missing_source(&self) -> bool {
        matches!(
            self,
            ConfigError::FileNotFound { .. } | ConfigError::EnvVarNotFound { .. }
        )
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConfigError::FileNotFound { .. } | ConfigError::EnvVarNotFound { .. } => {
                ErrorCategory::NotFound
            }
            ConfigError::FileReadError { .. } | ConfigError::WatchError { .. } => ErrorCategory::Io,
            ConfigError::ParseError { .. }
            | ConfigError::EnvVarParseError { .. }
            | ConfigError::FormatNotSupported { .. } => ErrorCategory::Parse,
            ConfigError::ValidationError { .. }
            | ConfigError::TypeError { .. }
            | ConfigError::InvalidArgument { .. } => ErrorCategory::Validation,
            ConfigError::SourceError { .. }
            | ConfigError::ReloadError { .. }
            | ConfigError::MergeError { .. }
            | ConfigError::PathError { .. } => ErrorCategory::Operation,
        }
    }
}

/// Error category for grouping errors
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Resource not found
    NotFound,
    /// I/O error
    Io,
    /// Parse error
    Parse,
    /// Validation error
    Validation,
    /// Operation error
    Operation,
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => ConfigError::file_not_found(PathBuf::from("unknown")),
            ErrorKind::PermissionDenied => ConfigError::file_read_error(
                PathBuf::from("unknown"),
                format!("Permission denied: {err}"),
            ),
            _ => ConfigError::file_read_error(PathBuf::from("unknown"), err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::parse_error(PathBuf::from("json"), format!("JSON error: {err}"))
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::parse_error(PathBuf::from("toml"), format!("TOML error: {err}"))
    }
}

impl From<yaml_rust2::ScanError> for ConfigError {
    fn from(err: yaml_rust2::ScanError) -> Self {
        ConfigError::parse_error(PathBuf::from("yaml"), format!("YAML error: {err:?}"))
    }
}

impl From<notify::Error> for ConfigError {
    fn from(err: notify::Error) -> Self {
        ConfigError::watch_error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_cover_each_kind() {
        assert_eq!(
            ConfigError::file_not_found("app.toml").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            ConfigError::invalid_argument("interval must be non-zero").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            ConfigError::path_error("key missing", "server.port").category(),
            ErrorCategory::Operation
        );
    }

    #[test]
    fn missing_sources_are_recoverable() {
        assert!(ConfigError::env_var_not_found("APP_PORT").is_recoverable());
        assert!(ConfigError::file_not_found("x.yml").is_missing_source());
        assert!(!ConfigError::merge_error("conflict").is_missing_source());
    }
}
