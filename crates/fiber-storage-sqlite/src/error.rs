//! Error types

use std::fmt;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Storage handle is closed
    #[error("Address book is not open")]
    NotOpen,

    /// Security configuration already written
    #[error("Address book is already initialized")]
    AlreadyInitialized,

    /// No security configuration written yet
    #[error("Address book is not initialized")]
    NotInitialized,

    /// Unknown security tier selector
    #[error("Invalid security tier: {0}")]
    InvalidSecurityTier(String),

    /// Contact operation attempted before authentication
    #[error("Address book is not authenticated")]
    NotAuthenticated,

    /// Password rejected. The message never says why.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Contact failed validation
    #[error("Invalid contact: {0}")]
    InvalidContact(String),

    /// `(value, coin)` pair already present in the book
    #[error("Address with value: {value} and coin type: {coin} already exists")]
    DuplicateAddress {
        /// Address value (lossy UTF-8)
        value: String,
        /// Coin type (lossy UTF-8)
        coin: String,
    },

    /// Contact name already present in the book
    #[error("Contact with name: {0} already exists")]
    DuplicateName(String),

    /// No record with this ID
    #[error("Not found: {0}")]
    NotFound(u64),

    /// Stored record is not a well-formed contact
    #[error("Decode failed: {0}")]
    DecodeFailed(String),

    /// Authenticated decryption failed (wrong key or tampered record)
    #[error("Decryption failed: record could not be authenticated")]
    DecryptionFailed,

    /// Encryption or key derivation error
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Storage error (generic)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<fiber_core::Error> for Error {
    fn from(err: fiber_core::Error) -> Self {
        match err {
            fiber_core::Error::InvalidContact(msg) => Error::InvalidContact(msg),
            fiber_core::Error::Decode(msg) => Error::DecodeFailed(msg),
            fiber_core::Error::Encode(msg) => Error::Storage(msg),
        }
    }
}

impl Error {
    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotOpen | Error::AlreadyInitialized | Error::NotInitialized => {
                ErrorCategory::State
            }
            Error::NotAuthenticated | Error::AuthenticationFailed => ErrorCategory::Auth,
            Error::InvalidSecurityTier(_)
            | Error::InvalidContact(_)
            | Error::DuplicateAddress { .. }
            | Error::DuplicateName(_)
            | Error::NotFound(_) => ErrorCategory::Validation,
            Error::DecodeFailed(_) | Error::DecryptionFailed | Error::Encryption(_) => {
                ErrorCategory::Integrity
            }
            Error::Database(_)
            | Error::Storage(_)
            | Error::Config(_)
            | Error::Io(_)
            | Error::Serialization(_) => ErrorCategory::Storage,
        }
    }

    /// Whether the error means a stored record could not be trusted
    pub fn is_integrity_failure(&self) -> bool {
        self.category() == ErrorCategory::Integrity
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Handle lifecycle errors
    State,
    /// Authentication errors
    Auth,
    /// Rejected input or missing record
    Validation,
    /// Record failed to decrypt or decode
    Integrity,
    /// Underlying storage or configuration failure
    Storage,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::State => write!(f, "State"),
            ErrorCategory::Auth => write!(f, "Auth"),
            ErrorCategory::Validation => write!(f, "Validation"),
            ErrorCategory::Integrity => write!(f, "Integrity"),
            ErrorCategory::Storage => write!(f, "Storage"),
        }
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
