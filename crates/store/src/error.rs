//! Store Error Types
//!
//! The knowledge store's failure taxonomy. The agent loop feeds most of
//! these back to the model as recoverable feedback, so the kinds must stay
//! distinguishable: a path escape is a security violation, never a generic
//! "not found".

use thiserror::Error;

/// Error type for all knowledge-store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Path escape or other containment violation, rejected before any I/O
    #[error("Security error: {0}")]
    Security(String),

    /// Missing file or document
    #[error("Not found: {0}")]
    NotFound(String),

    /// Compare-and-swap precondition failed; the file was left untouched
    #[error("Stale content: {0}")]
    StaleContent(String),

    /// Malformed input to a public operation
    #[error("Validation error: {0}")]
    Validation(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Version-control command failures
    #[error("Command error: {0}")]
    Command(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Create a security error
    pub fn security(msg: impl Into<String>) -> Self {
        Self::Security(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a stale content error
    pub fn stale_content(msg: impl Into<String>) -> Self {
        Self::StaleContent(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a command error
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// True for containment violations
    pub fn is_security(&self) -> bool {
        matches!(self, Self::Security(_))
    }

    /// True for missing files/documents
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True for failed compare-and-swap preconditions
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleContent(_))
    }
}

/// Convert StoreError to a string
impl From<StoreError> for String {
    fn from(err: StoreError) -> String {
        err.to_string()
    }
}
