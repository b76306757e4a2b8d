//! Unified error hierarchy for athlete-monitor
//!
//! The scorers themselves never fail; degenerate input produces degenerate
//! output. Errors only arise at the edges: importing rows, exporting
//! reports, loading configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all fallible athlete-monitor operations
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reading athlete rows from disk
#[derive(Debug, Error)]
pub enum ImportError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Unsupported format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// Missing required column or field
    #[error("Missing required data: {field}")]
    MissingData { field: String },
}

/// Errors writing reports
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Export failed to {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Result type alias for athlete-monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::Import(ImportError::ParseError {
            format: "JSON".to_string(),
            reason: err.to_string(),
        })
    }
}

impl From<csv::Error> for MonitorError {
    fn from(err: csv::Error) -> Self {
        MonitorError::Import(ImportError::ParseError {
            format: "CSV".to_string(),
            reason: err.to_string(),
        })
    }
}

impl MonitorError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MonitorError::Import(ImportError::FileNotFound { .. }) => ErrorSeverity::Warning,
            MonitorError::Validation(_) => ErrorSeverity::Warning,
            MonitorError::Config(ConfigError::InvalidValue { .. }) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            MonitorError::Import(ImportError::FileNotFound { path }) => {
                format!("Could not find data file: {}", path.display())
            }
            MonitorError::Import(ImportError::UnsupportedFormat { format }) => {
                format!("Files of type '{}' cannot be imported. Use JSON or CSV.", format)
            }
            MonitorError::Import(ImportError::MissingData { field }) => {
                format!("The data file is missing the required '{}' column.", field)
            }
            MonitorError::Validation(reason) => {
                format!("The data file contains an implausible value: {}", reason)
            }
            MonitorError::Config(ConfigError::Parse { path, .. }) => {
                format!(
                    "Configuration file {} is invalid. Fix it or delete it to use defaults.",
                    path.display()
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents the operation
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = MonitorError::Import(ImportError::FileNotFound {
            path: PathBuf::from("/data/records.csv"),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);

        let err = MonitorError::Validation("hrv on 2024-03-01 is negative".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(err.user_message().contains("implausible value"));

        let err = MonitorError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_json_errors_become_parse_errors() {
        let json_err = serde_json::from_str::<Vec<u32>>("[1, 2").unwrap_err();
        let err: MonitorError = json_err.into();
        assert!(matches!(
            err,
            MonitorError::Import(ImportError::ParseError { ref format, .. }) if format == "JSON"
        ));
    }

    #[test]
    fn test_user_messages() {
        let err = MonitorError::Import(ImportError::UnsupportedFormat {
            format: "xlsx".to_string(),
        });
        assert!(err.user_message().contains("JSON or CSV"));
    }
}
