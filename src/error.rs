//! Error taxonomy for lifecycle and orchestration operations.
//!
//! The split matters operationally: `Validation` is raised before any
//! external call, `TransientExternal` is the only variant a retry policy may
//! re-attempt, and `Store` failures are fatal with no rollback of writes that
//! already happened.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScribeError {
    /// Bad input (unknown strategy literal, malformed entity key, missing
    /// documentation mapping). Raised before any store or model call.
    #[error("validation: {0}")]
    Validation(String),

    /// An entity or aspect was absent where one is required.
    #[error("not found: {0}")]
    NotFound(String),

    /// A text-generation call failed in a way that may succeed on retry.
    #[error("transient text-generation failure: {0}")]
    TransientExternal(String),

    /// Catalog or warehouse unreachable or corrupt. Never retried.
    #[error("store: {0}")]
    Store(String),
}

impl ScribeError {
    pub fn validation(message: impl Into<String>) -> Self {
        ScribeError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ScribeError::NotFound(message.into())
    }

    pub fn transient(message: impl Into<String>) -> Self {
        ScribeError::TransientExternal(message.into())
    }

    pub fn store(message: impl Into<String>) -> Self {
        ScribeError::Store(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ScribeError>;
