//! Component Store Trait
//!
//! The persistence contract consumed by the workspace service. Two backends
//! ship with the crate:
//!
//! - [`ApiStore`](super::ApiStore): a networked REST API that performs the
//!   cascade delete server-side
//! - [`LocalStore`](super::LocalStore): a JSON document on local disk that
//!   performs the equivalent traversal client-side
//!
//! Adapters are the id authority: `create` returns the record with its
//! assigned id, and the caller must use that id from then on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::StoreError;
use crate::models::{Component, ComponentDraft, ComponentPatch};

/// Receipt from an adapter delete operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDeleteReceipt {
    /// The adapter removed the entire descendant subtree along with the
    /// target, not just the target record.
    pub cascaded: bool,

    /// Number of records the adapter removed.
    pub deleted_count: u64,
}

/// Durable CRUD over the component collection of one owner/session.
///
/// The workspace service treats implementations as transactional per call:
/// a returned error means the backend was left untouched by that call (the
/// remote backend delegates this guarantee to its server).
#[async_trait]
pub trait ComponentStore: Send + Sync {
    /// Fetch every component owned by the current session.
    ///
    /// Order is the backend's listing order; the workspace derives child
    /// ordering from it. Persisted `children` arrays may be stale and are
    /// ignored by the caller.
    async fn list(&self) -> Result<Vec<Component>, StoreError>;

    /// Persist a new component and return the full record.
    ///
    /// The adapter assigns the authoritative id and timestamps. If the
    /// draft names a parent, the adapter also appends the new id to that
    /// parent's persisted `children`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::MissingRecord`] if the named parent does not exist
    /// - [`StoreError::UnsupportedAttachment`] if the draft carries an
    ///   attachment shape this backend cannot persist
    async fn create(&self, draft: ComponentDraft) -> Result<Component, StoreError>;

    /// Apply a partial update and return the updated record.
    ///
    /// Only title, position and metadata travel; immutable fields are not
    /// part of the patch wire format.
    ///
    /// # Errors
    ///
    /// - [`StoreError::MissingRecord`] if the id does not exist
    async fn update(&self, id: &str, patch: ComponentPatch) -> Result<Component, StoreError>;

    /// Remove a component together with its entire descendant subtree.
    ///
    /// The cascade is the adapter's responsibility and must be complete on
    /// success: no record of the subtree may survive. The receipt reports
    /// how many records went away.
    ///
    /// # Errors
    ///
    /// - [`StoreError::MissingRecord`] if the id does not exist
    async fn delete(&self, id: &str) -> Result<StoreDeleteReceipt, StoreError>;

    /// Remove every component owned by the current session.
    async fn delete_all(&self) -> Result<StoreDeleteReceipt, StoreError>;
}
