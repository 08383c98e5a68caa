//! Import and export error types
//!
//! # Examples
//!
//! ```rust
//! use netgraph::errors::ImportExportError;
//!
//! let err = ImportExportError::InvalidFormat("expected an array of records".to_string());
//! assert!(err.is_client_error());
//! ```

use thiserror::Error;

/// Import and export operation errors
#[derive(Error, Debug)]
pub enum ImportExportError {
    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Invalid file format
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// CSV parsing/writing error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    YamlError(String),

    /// Template rendering failed
    #[error("Template rendering failed: {0}")]
    TemplateError(String),

    /// Export operation failed
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportExportError {
    /// Check if this is a client error (bad input file or configuration)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ImportExportError::UnsupportedFormat(_)
                | ImportExportError::InvalidFormat(_)
                | ImportExportError::YamlError(_)
                | ImportExportError::CsvError(_)
        )
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ImportExportError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            ImportExportError::InvalidFormat(_) => "INVALID_FORMAT",
            ImportExportError::SerializationError(_) => "SERIALIZATION_ERROR",
            ImportExportError::CsvError(_) => "CSV_ERROR",
            ImportExportError::YamlError(_) => "YAML_ERROR",
            ImportExportError::TemplateError(_) => "TEMPLATE_ERROR",
            ImportExportError::ExportFailed(_) => "EXPORT_FAILED",
            ImportExportError::Io(_) => "IO_ERROR",
        }
    }
}

// Implement conversion from serde_yaml::Error
impl From<serde_yaml::Error> for ImportExportError {
    fn from(err: serde_yaml::Error) -> Self {
        ImportExportError::YamlError(err.to_string())
    }
}

impl From<handlebars::RenderError> for ImportExportError {
    fn from(err: handlebars::RenderError) -> Self {
        ImportExportError::TemplateError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_format() {
        let err = ImportExportError::InvalidFormat("not a table".to_string());
        assert_eq!(err.to_string(), "Invalid file format: not a table");
        assert!(err.is_client_error());
        assert_eq!(err.error_code(), "INVALID_FORMAT");
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_err = serde_yaml::from_str::<Vec<String>>("{ not: [valid").unwrap_err();
        let err: ImportExportError = yaml_err.into();
        assert_eq!(err.error_code(), "YAML_ERROR");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_io_error_is_not_client_error() {
        let err = ImportExportError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        assert!(!err.is_client_error());
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
