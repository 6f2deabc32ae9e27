//! Script Error Types
//!
//! Every failure inside the sandbox, including errors propagated from the
//! capability object, converges here and is rendered into a failed
//! `ExecutionOutcome` at the engine boundary. Nothing escapes as a panic
//! and nothing leaks host internals.

use lorekeeper_store::StoreError;
use thiserror::Error;

/// Error type for sandbox validation, parsing, and execution.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// Malformed input to the engine (empty or oversized code)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Denylisted pattern or a containment violation from the capability
    #[error("Security violation: {0}")]
    Security(String),

    /// The code did not lex/parse
    #[error("Script parse error: {0}")]
    Parse(String),

    /// Evaluation failure (undefined name, type error, bad arity)
    #[error("Script runtime error: {0}")]
    Runtime(String),

    /// Capability call failure, already carrying its own kind prefix
    #[error("{0}")]
    Capability(String),

    /// Wall-clock or step budget exceeded
    #[error("Execution timed out: {0}")]
    Timeout(String),
}

/// Result type alias for sandbox operations
pub type ScriptResult<T> = Result<T, ScriptError>;

impl ScriptError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a security error
    pub fn security(msg: impl Into<String>) -> Self {
        Self::Security(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a runtime error
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// True for denylist hits and capability containment violations
    pub fn is_security(&self) -> bool {
        matches!(self, Self::Security(_))
    }

    /// True for budget exhaustion
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Capability failures keep their store-level kind visible to the model:
/// a path escape stays a security violation, everything else keeps the
/// store's own prefix ("Not found:", "Stale content:", ...).
impl From<StoreError> for ScriptError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Security(msg) => ScriptError::Security(msg),
            other => ScriptError::Capability(other.to_string()),
        }
    }
}
