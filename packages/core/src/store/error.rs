//! Persistence Adapter Errors
//!
//! Failures raised by the component store backends. The workspace service
//! wraps these with the failing operation's name before surfacing them.

use thiserror::Error;

/// Errors from the persistence adapters.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The remote API answered with a non-success status or envelope.
    #[error("Persistence API returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The HTTP request never completed (connect, timeout, body).
    #[error("Persistence transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Local storage I/O failure.
    #[error("Local storage I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// A payload could not be encoded or decoded.
    #[error("Persistence payload serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The adapter holds no record with the given id.
    #[error("No persisted component with id: {id}")]
    MissingRecord { id: String },

    /// The attachment shape cannot travel over this backend.
    #[error("Unsupported attachment: {reason}")]
    UnsupportedAttachment { reason: String },

    /// The adapter was constructed with unusable settings.
    #[error("Invalid store configuration: {message}")]
    InvalidConfig { message: String },
}

impl StoreError {
    /// Create an HTTP status error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        StoreError::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a missing-record error.
    pub fn missing_record(id: impl Into<String>) -> Self {
        StoreError::MissingRecord { id: id.into() }
    }

    /// Create an unsupported-attachment error.
    pub fn unsupported_attachment(reason: impl Into<String>) -> Self {
        StoreError::UnsupportedAttachment {
            reason: reason.into(),
        }
    }

    /// Create an invalid-configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        StoreError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether the failure is a missing record (useful for drift handling).
    pub fn is_missing_record(&self) -> bool {
        matches!(self, StoreError::MissingRecord { .. })
    }
}
