//! Error types for the observations crate.

use thiserror::Error;

/// Result type alias for observation operations.
pub type ObservationResult<T> = Result<T, ObservationError>;

/// Errors that can occur while filtering, reading or serializing observations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObservationError {
    /// A filter field is not a plain column identifier.
    #[error("Invalid filter field: {0}")]
    InvalidFilterField(String),

    /// A request parameter failed validation.
    #[error("Invalid parameter '{field}': {message}")]
    InvalidParameter { field: String, message: String },

    /// A row is missing a field the caller requires.
    #[error("Row is missing required field: {0}")]
    MissingField(String),

    /// A field holds a value of the wrong type.
    #[error("Field '{field}' is not {expected}")]
    TypeMismatch { field: String, expected: String },

    /// A row tuple does not match the column list.
    #[error("Row has {found} values but {expected} columns were declared")]
    RowShape { expected: usize, found: usize },

    /// Storage error.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// The precomputed snapshot could not be read or parsed.
    #[error("Snapshot error: {0}")]
    SnapshotError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ObservationError {
    /// Whether this error was caused by the caller's input rather than the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ObservationError::InvalidFilterField(_) | ObservationError::InvalidParameter { .. }
        )
    }
}

impl From<serde_json::Error> for ObservationError {
    fn from(err: serde_json::Error) -> Self {
        ObservationError::SerializationError(err.to_string())
    }
}
