//! Graph-related error types
//!
//! Covers the blocking configuration errors raised before an import, invalid
//! filter values, actions that do not apply to the current controller state,
//! and consistency faults between the node set and the degree table.

use thiserror::Error;

/// Graph-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Required column mapping missing (source/target)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Node set and degree table were built from inconsistent inputs
    #[error("Consistency fault: {0}")]
    ConsistencyFault(String),

    /// Validation failed
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Node not found by identifier
    #[error("Node '{0}' not found")]
    NodeNotFound(String),

    /// Invalid graph structure
    #[error("Invalid graph structure: {0}")]
    InvalidStructure(String),

    /// Action is not valid for the current controller state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl GraphError {
    /// Check if this is an error the user can fix by changing their input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GraphError::Configuration(_)
                | GraphError::Validation(_)
                | GraphError::InvalidState(_)
        )
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NodeNotFound(_))
    }

    /// Check if this indicates a programming invariant violation
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            GraphError::ConsistencyFault(_) | GraphError::InvalidStructure(_)
        )
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            GraphError::Configuration(_) => "CONFIGURATION_ERROR",
            GraphError::ConsistencyFault(_) => "CONSISTENCY_FAULT",
            GraphError::Validation(_) => "VALIDATION_FAILED",
            GraphError::NodeNotFound(_) => "NOT_FOUND",
            GraphError::InvalidStructure(_) => "INVALID_STRUCTURE",
            GraphError::InvalidState(_) => "INVALID_STATE",
        }
    }
}
