//! Error types for Fiber Core
//!
//! Errors raised while validating or (de)serializing contact records.

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Fiber Core errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Contact failed schema validation
    #[error("Invalid contact: {0}")]
    InvalidContact(String),

    /// Contact could not be encoded
    #[error("Encode error: {0}")]
    Encode(String),

    /// Buffer is not a well-formed contact record
    #[error("Decode error: {0}")]
    Decode(String),
}

impl Error {
    /// Check if error is caused by caller input (vs corrupted data)
    pub fn is_user_error(&self) -> bool {
        matches!(self, Error::InvalidContact(_))
    }
}
