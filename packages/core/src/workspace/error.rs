//! Workspace Service Errors
//!
//! The caller-facing error taxonomy. Validation failures are raised before
//! any persistence call and leave both cache and backend untouched;
//! persistence failures leave the cache at its last-known-good state.

use thiserror::Error;

use crate::models::ValidationError;
use crate::store::StoreError;

/// Errors surfaced by [`WorkspaceService`](super::WorkspaceService).
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// A nesting-rule, immutable-field or field-shape violation. Detected
    /// before the adapter is contacted.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The operation referenced an id absent from the cache.
    #[error("Component not found: {id}")]
    NotFound { id: String },

    /// An adapter call failed. The cache keeps its previous state; there is
    /// no automatic retry.
    #[error("Persistence failure during {operation}: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// `load()` was called without the authentication capability.
    #[error("Workspace is not authenticated; sign in before loading")]
    NotAuthenticated,

    /// An import payload failed structural validation; nothing was written.
    #[error("Import rejected: {message}")]
    ImportRejected { message: String },
}

impl WorkspaceError {
    /// Create a not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        WorkspaceError::NotFound { id: id.into() }
    }

    /// Wrap an adapter failure with the failing operation's name.
    pub fn persistence(operation: &'static str, source: StoreError) -> Self {
        WorkspaceError::Persistence { operation, source }
    }

    /// Create an import-rejected error.
    pub fn import_rejected(message: impl Into<String>) -> Self {
        WorkspaceError::ImportRejected {
            message: message.into(),
        }
    }

    /// Whether this error is a pre-persistence validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, WorkspaceError::Validation(_))
    }
}
