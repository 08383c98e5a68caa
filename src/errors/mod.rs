//! Domain-specific error types for netgraph
//!
//! # Error Categories
//!
//! - **GraphError**: column mapping configuration, filter validation, state transitions
//!   and graph model consistency
//! - **ImportExportError**: ingestion of raw tables and export of the rendered model
//!
//! Records with a missing source/target and non-numeric style columns are
//! recovered conditions and never surface as errors; see [`crate::normalize::NormalizeStats`].
//!
//! # Examples
//!
//! ```rust
//! use netgraph::errors::GraphError;
//!
//! let err = GraphError::Configuration("source column is required".to_string());
//! assert!(err.is_client_error());
//! assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
//! ```

pub mod graph;
pub mod import_export;

pub use graph::GraphError;
pub use import_export::ImportExportError;

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for import/export operations
pub type ImportExportResult<T> = Result<T, ImportExportError>;
