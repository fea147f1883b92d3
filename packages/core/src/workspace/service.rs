//! Workspace Tree Service
//!
//! `WorkspaceService` owns the in-memory component collection and is its
//! sole mutator. Every write validates against the type registry first,
//! then goes to the persistence adapter, and only lands in the cache once
//! the adapter has accepted it. Reads never touch persistence.
//!
//! # Architecture
//!
//! - **Validation before persistence**: nesting-rule and field violations
//!   are raised before the adapter sees anything
//! - **Commit after persistence**: a failed adapter call leaves the cache
//!   at its last-known-good state
//! - **Children are derived**: `load()` rebuilds every `children` array
//!   from `parent_id` pointers in listed order and ignores whatever the
//!   backend stored
//! - **Cascade then reload**: after a cascade delete (and after `clear`),
//!   the service reloads the collection to reconcile with backend-side
//!   cascade logic the cache cannot simulate exactly
//!
//! # Concurrency
//!
//! One service instance per session. Mutations take `&mut self`, so the
//! borrow checker enforces that they never overlap; reads take `&self` and
//! reflect the last completed mutation. Dropping a mutation future
//! abandons the result but does not abort an in-flight adapter call.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::error::WorkspaceError;
use super::events::WorkspaceEvent;
use crate::auth::AuthGate;
use crate::config::{DEFAULT_MAX_INLINE_FILE_BYTES, WorkspaceConfig};
use crate::models::{
    validate_title, Component, ComponentDraft, ComponentPatch, ComponentType, DeleteReceipt,
    FileAttachment, Position, ValidationError,
};
use crate::store::ComponentStore;

/// Capacity of the workspace event broadcast channel. Observers that lag
/// behind drop old events; only the current state matters downstream.
const WORKSPACE_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Lifecycle state of a workspace service instance.
///
/// `Uninitialized -> Loading -> Ready`, then `Ready -> Mutating -> Ready`
/// around each write. A persistence failure returns to `Ready` (or back to
/// `Uninitialized` when the very first load fails); there is no error
/// state and no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Loading,
    Mutating,
    Ready,
}

/// Portable snapshot of a workspace, produced by
/// [`WorkspaceService::export_workspace`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceExport {
    /// When the snapshot was taken.
    pub export_date: DateTime<Utc>,

    /// Number of components in the snapshot.
    pub component_count: usize,

    /// The components, with inline attachments stripped.
    pub components: Vec<Component>,
}

/// Outcome of [`WorkspaceService::import_workspace`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Number of components created in the backend.
    pub imported_count: usize,

    /// Mapping from ids in the payload to adapter-assigned ids.
    pub id_map: HashMap<String, String>,
}

/// The stateful owner of one session's component tree.
pub struct WorkspaceService {
    store: Arc<dyn ComponentStore>,
    auth: Arc<dyn AuthGate>,

    /// Cache of the persisted collection, keyed by id in backend listing
    /// order. Only this service mutates it.
    components: IndexMap<String, Component>,

    state: StoreState,

    /// Broadcast channel for workspace events (128 subscriber capacity).
    event_tx: broadcast::Sender<WorkspaceEvent>,

    /// Cap on decoded inline attachment size, enforced before persistence.
    max_inline_file_bytes: usize,
}

impl WorkspaceService {
    /// Create a service over a persistence adapter and an auth capability.
    ///
    /// The cache starts empty and the state `Uninitialized`; call
    /// [`load`](Self::load) before reading.
    pub fn new(store: Arc<dyn ComponentStore>, auth: Arc<dyn AuthGate>) -> Self {
        let (event_tx, _) = broadcast::channel(WORKSPACE_EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            auth,
            components: IndexMap::new(),
            state: StoreState::Uninitialized,
            event_tx,
            max_inline_file_bytes: DEFAULT_MAX_INLINE_FILE_BYTES,
        }
    }

    /// Service with the limits a [`WorkspaceConfig`] carries, over an
    /// already-constructed adapter and auth capability.
    pub fn from_config(
        store: Arc<dyn ComponentStore>,
        auth: Arc<dyn AuthGate>,
        config: &WorkspaceConfig,
    ) -> Self {
        Self::new(store, auth).with_max_inline_file_bytes(config.max_inline_file_bytes)
    }

    /// Builder-style override of the inline attachment size cap.
    pub fn with_max_inline_file_bytes(mut self, max: usize) -> Self {
        self.max_inline_file_bytes = max;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StoreState {
        self.state
    }

    /// Subscribe to workspace events.
    ///
    /// Each receiver gets every event emitted after the call. Slow
    /// receivers lag and skip rather than block mutations.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.event_tx.subscribe()
    }

    /// Emit an event to all subscribers. Ignores errors if no subscribers.
    fn emit(&self, event: WorkspaceEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Fetch the full collection from the adapter and replace the cache.
    ///
    /// Requires the auth capability; fails with
    /// [`WorkspaceError::NotAuthenticated`] otherwise, cache untouched.
    /// `children` arrays are rebuilt from `parent_id` pointers in listed
    /// order. On adapter failure the previous snapshot survives whole;
    /// the cache is never partially overwritten.
    ///
    /// Returns the number of components loaded.
    pub async fn load(&mut self) -> Result<usize, WorkspaceError> {
        if !self.auth.is_authenticated() {
            return Err(WorkspaceError::NotAuthenticated);
        }

        let previous = self.state;
        self.state = StoreState::Loading;

        let listed = match self.store.list().await {
            Ok(listed) => listed,
            Err(source) => {
                error!(error = %source, "adapter list failed");
                self.state = if previous == StoreState::Uninitialized {
                    StoreState::Uninitialized
                } else {
                    StoreState::Ready
                };
                return Err(WorkspaceError::persistence("load", source));
            }
        };

        self.components = Self::normalize_collection(listed);
        self.state = StoreState::Ready;

        let component_count = self.components.len();
        info!(component_count, "workspace loaded");
        self.emit(WorkspaceEvent::WorkspaceLoaded { component_count });
        Ok(component_count)
    }

    /// Index the listed components and re-derive the `children` arrays.
    fn normalize_collection(listed: Vec<Component>) -> IndexMap<String, Component> {
        let mut components: IndexMap<String, Component> = IndexMap::with_capacity(listed.len());
        for mut component in listed {
            component.children.clear();
            components.insert(component.id.clone(), component);
        }

        let order: Vec<String> = components.keys().cloned().collect();
        for id in order {
            let parent_id = match components.get(&id).and_then(|c| c.parent_id.clone()) {
                Some(parent_id) => parent_id,
                None => continue,
            };
            if let Some(parent) = components.get_mut(&parent_id) {
                parent.children.push(id);
            } else {
                warn!(
                    component_id = %id,
                    parent_id = %parent_id,
                    "component references a parent missing from the collection"
                );
            }
        }
        components
    }

    /// Create a component of `component_type` under `parent_id` (or at the
    /// root) and return the committed record.
    ///
    /// The nesting matrix is checked against the cache before the adapter
    /// is contacted; a validation failure leaves cache and backend
    /// byte-for-byte unchanged. On success the adapter-assigned record is
    /// inserted into the cache and appended to its parent's `children`.
    pub async fn add_component(
        &mut self,
        component_type: ComponentType,
        parent_id: Option<&str>,
        position: Position,
    ) -> Result<Component, WorkspaceError> {
        match parent_id {
            None => {
                if !component_type.is_root_allowed() {
                    return Err(ValidationError::InvalidRoot {
                        child: component_type,
                    }
                    .into());
                }
            }
            Some(parent_id) => {
                let parent = self
                    .components
                    .get(parent_id)
                    .ok_or_else(|| WorkspaceError::not_found(parent_id))?;
                if !component_type.can_nest(Some(parent.component_type)) {
                    return Err(ValidationError::InvalidNesting {
                        child: component_type,
                        parent: parent.component_type,
                    }
                    .into());
                }
            }
        }

        let draft = ComponentDraft::new(component_type, parent_id.map(str::to_string))
            .with_position(position);

        self.state = StoreState::Mutating;
        let created = match self.store.create(draft).await {
            Ok(created) => created,
            Err(source) => {
                error!(error = %source, "adapter create failed");
                self.state = StoreState::Ready;
                return Err(WorkspaceError::persistence("create", source));
            }
        };

        // Commit only after the adapter accepted the write.
        let mut committed = created;
        committed.children.clear();
        self.components
            .insert(committed.id.clone(), committed.clone());
        if let Some(parent_id) = committed.parent_id.clone() {
            if let Some(parent) = self.components.get_mut(&parent_id) {
                parent.children.push(committed.id.clone());
            }
        }
        self.state = StoreState::Ready;

        debug!(
            component_id = %committed.id,
            component_type = %committed.component_type,
            "component added"
        );
        self.emit(WorkspaceEvent::ComponentCreated(committed.clone()));
        Ok(committed)
    }

    /// Apply a patch to `title`, `position` and/or `metadata`.
    ///
    /// A patch touching `type` or `parentId` is rejected with a
    /// [`ValidationError::ImmutableField`] before persistence, as are
    /// empty titles and oversized inline attachments. On adapter failure
    /// the cache keeps the previous record.
    pub async fn update_component(
        &mut self,
        id: &str,
        patch: ComponentPatch,
    ) -> Result<Component, WorkspaceError> {
        if let Some(field) = patch.immutable_field() {
            return Err(ValidationError::ImmutableField(field).into());
        }
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }
        if let Some(metadata) = &patch.metadata {
            self.validate_attachments(&metadata.files)?;
        }
        if !self.components.contains_key(id) {
            return Err(WorkspaceError::not_found(id));
        }

        self.state = StoreState::Mutating;
        let updated = match self.store.update(id, patch).await {
            Ok(updated) => updated,
            Err(source) => {
                error!(error = %source, component_id = %id, "adapter update failed");
                self.state = StoreState::Ready;
                return Err(WorkspaceError::persistence("update", source));
            }
        };

        // The adapter record is authoritative for the mutable fields;
        // structural pointers stay as the cache derived them.
        let committed = match self.components.entry(updated.id.clone()) {
            Entry::Occupied(mut slot) => {
                let cached = slot.get_mut();
                cached.title = updated.title.clone();
                cached.position = updated.position;
                cached.metadata = updated.metadata.clone();
                cached.modified_at = updated.modified_at;
                cached.clone()
            }
            Entry::Vacant(slot) => {
                let mut record = updated.clone();
                record.children.clear();
                slot.insert(record.clone());
                record
            }
        };
        self.state = StoreState::Ready;

        debug!(component_id = %committed.id, "component updated");
        self.emit(WorkspaceEvent::ComponentUpdated(committed.clone()));
        Ok(committed)
    }

    fn validate_attachments(&self, files: &[FileAttachment]) -> Result<(), ValidationError> {
        for file in files {
            if let FileAttachment::Inline(inline) = file {
                let len = inline.byte_len();
                if len > self.max_inline_file_bytes {
                    return Err(ValidationError::InlineTooLarge {
                        name: inline.name.clone(),
                        len,
                        max: self.max_inline_file_bytes,
                    });
                }
            }
        }
        Ok(())
    }

    /// Delete a component together with its entire descendant subtree.
    ///
    /// The full closure is computed from the cache by breadth-first
    /// traversal before any removal is issued; the adapter then performs
    /// the cascade on its side in one call. On success the closure leaves
    /// the cache, the id is detached from its former parent, and a full
    /// reload reconciles the cache with the backend. A failed reconcile is
    /// logged but does not undo the committed delete.
    pub async fn delete_component(&mut self, id: &str) -> Result<DeleteReceipt, WorkspaceError> {
        if !self.components.contains_key(id) {
            return Err(WorkspaceError::not_found(id));
        }

        let deleted_ids = self.descendant_closure(id);
        info!(
            component_id = %id,
            closure_size = deleted_ids.len(),
            "cascade delete"
        );

        self.state = StoreState::Mutating;
        if let Err(source) = self.store.delete(id).await {
            error!(error = %source, component_id = %id, "adapter delete failed");
            self.state = StoreState::Ready;
            return Err(WorkspaceError::persistence("delete", source));
        }

        let parent_id = self.components.get(id).and_then(|c| c.parent_id.clone());
        for removed in &deleted_ids {
            self.components.shift_remove(removed);
        }
        if let Some(parent_id) = parent_id {
            if let Some(parent) = self.components.get_mut(&parent_id) {
                parent.children.retain(|child| child != id);
            }
        }
        self.state = StoreState::Ready;
        self.emit(WorkspaceEvent::ComponentsDeleted {
            deleted_ids: deleted_ids.clone(),
        });

        // Reconcile with the backend's own cascade result.
        if let Err(reload) = self.load().await {
            warn!(error = %reload, "reconcile load after delete failed; keeping locally computed result");
        }

        Ok(DeleteReceipt { deleted_ids })
    }

    /// Breadth-first descendant closure over cached `children` pointers,
    /// starting at (and including) `root`, in traversal order.
    ///
    /// The visited set makes the walk terminate even if the graph is
    /// malformed and contains a cycle.
    fn descendant_closure(&self, root: &str) -> Vec<String> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut closure: Vec<String> = Vec::new();
        let mut queue: VecDeque<String> = VecDeque::new();

        visited.insert(root.to_string());
        queue.push_back(root.to_string());

        while let Some(current) = queue.pop_front() {
            if let Some(component) = self.components.get(&current) {
                for child in &component.children {
                    if visited.insert(child.clone()) {
                        queue.push_back(child.clone());
                    }
                }
            }
            closure.push(current);
        }
        closure
    }

    /// Delete every component owned by this session, then reconcile.
    ///
    /// Same contract as [`delete_component`](Self::delete_component)
    /// applied to the whole collection.
    pub async fn clear(&mut self) -> Result<DeleteReceipt, WorkspaceError> {
        let deleted_ids: Vec<String> = self.components.keys().cloned().collect();

        self.state = StoreState::Mutating;
        if let Err(source) = self.store.delete_all().await {
            error!(error = %source, "adapter clear failed");
            self.state = StoreState::Ready;
            return Err(WorkspaceError::persistence("clear", source));
        }

        self.components.clear();
        self.state = StoreState::Ready;
        info!(cleared = deleted_ids.len(), "workspace cleared");
        self.emit(WorkspaceEvent::WorkspaceCleared);

        if let Err(reload) = self.load().await {
            warn!(error = %reload, "reconcile load after clear failed");
        }

        Ok(DeleteReceipt { deleted_ids })
    }

    /// Cache read; never contacts persistence.
    pub fn get_component(&self, id: &str) -> Option<&Component> {
        self.components.get(id)
    }

    /// Direct children of `id` in recorded order. Ids missing from the
    /// cache are skipped; an unknown `id` yields an empty list.
    pub fn get_children(&self, id: &str) -> Vec<&Component> {
        match self.components.get(id) {
            Some(parent) => parent
                .children
                .iter()
                .filter_map(|child_id| self.components.get(child_id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Root-level components in listing order.
    pub fn roots(&self) -> Vec<&Component> {
        self.components
            .values()
            .filter(|component| component.parent_id.is_none())
            .collect()
    }

    /// All cached components in listing order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// Number of cached components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Snapshot the cached collection as a portable document.
    ///
    /// Inline attachments cannot travel between backends and are
    /// stripped; references are kept as-is.
    pub fn export_workspace(&self) -> WorkspaceExport {
        let components: Vec<Component> = self
            .components
            .values()
            .map(|component| {
                let mut exported = component.clone();
                exported
                    .metadata
                    .files
                    .retain(|file| !file.is_inline());
                exported
            })
            .collect();

        WorkspaceExport {
            export_date: Utc::now(),
            component_count: components.len(),
            components,
        }
    }

    /// Recreate an exported workspace through the persistence adapter.
    ///
    /// The payload must be a well-formed forest on its own: titles pass
    /// the field rules, every parent resolves within the payload, roots
    /// are courses, and the nesting matrix holds. Violations fail with
    /// [`WorkspaceError::ImportRejected`] before anything is written.
    ///
    /// Components are then created parents-first; the adapter assigns
    /// fresh ids and the returned report maps payload ids to them. Import
    /// is not atomic: a mid-stream adapter failure leaves the components
    /// created so far in the backend, and a reload keeps the cache
    /// truthful about them. A failed closing reload is logged; call
    /// [`load`](Self::load) again to pick the imported components up.
    pub async fn import_workspace(
        &mut self,
        export: WorkspaceExport,
    ) -> Result<ImportReport, WorkspaceError> {
        let mut by_id: HashMap<&str, &Component> =
            HashMap::with_capacity(export.components.len());
        for component in &export.components {
            if by_id.insert(component.id.as_str(), component).is_some() {
                return Err(WorkspaceError::import_rejected(format!(
                    "duplicate component id '{}'",
                    component.id
                )));
            }
        }

        for component in &export.components {
            // Same field rules the update path enforces.
            if let Err(violation) = component.validate() {
                return Err(WorkspaceError::import_rejected(format!(
                    "component '{}': {}",
                    component.id, violation
                )));
            }
            match &component.parent_id {
                None => {
                    if !component.component_type.is_root_allowed() {
                        return Err(WorkspaceError::import_rejected(format!(
                            "root component '{}' has type {}, only courses may sit at the root",
                            component.id, component.component_type
                        )));
                    }
                }
                Some(parent_id) => match by_id.get(parent_id.as_str()) {
                    None => {
                        return Err(WorkspaceError::import_rejected(format!(
                            "component '{}' references parent '{}' outside the payload",
                            component.id, parent_id
                        )));
                    }
                    Some(parent) => {
                        if !component
                            .component_type
                            .can_nest(Some(parent.component_type))
                        {
                            return Err(WorkspaceError::import_rejected(format!(
                                "component '{}' of type {} cannot nest under {}",
                                component.id, component.component_type, parent.component_type
                            )));
                        }
                    }
                },
            }
        }

        // Creation order: breadth-first from the payload roots, so every
        // parent is created (and has its new id) before its children.
        let mut children_of: HashMap<&str, Vec<&Component>> = HashMap::new();
        let mut queue: VecDeque<&Component> = VecDeque::new();
        for component in &export.components {
            match &component.parent_id {
                None => queue.push_back(component),
                Some(parent_id) => children_of
                    .entry(parent_id.as_str())
                    .or_default()
                    .push(component),
            }
        }
        let mut ordered: Vec<&Component> = Vec::with_capacity(export.components.len());
        while let Some(component) = queue.pop_front() {
            ordered.push(component);
            if let Some(children) = children_of.get(component.id.as_str()) {
                for child in children {
                    queue.push_back(*child);
                }
            }
        }
        if ordered.len() != export.components.len() {
            return Err(WorkspaceError::import_rejected(
                "payload contains components unreachable from any root",
            ));
        }

        self.state = StoreState::Mutating;
        let mut id_map: HashMap<String, String> = HashMap::with_capacity(ordered.len());
        let mut imported_count = 0usize;

        for component in ordered {
            let parent_id = match &component.parent_id {
                None => None,
                Some(old_parent) => match id_map.get(old_parent) {
                    Some(new_parent) => Some(new_parent.clone()),
                    None => {
                        if let Err(reload) = self.load().await {
                            warn!(error = %reload, "reconcile load after aborted import failed");
                        }
                        return Err(WorkspaceError::import_rejected(format!(
                            "parent '{}' was not created before its child",
                            old_parent
                        )));
                    }
                },
            };

            let mut metadata = component.metadata.clone();
            metadata.files.retain(|file| !file.is_inline());

            let draft = ComponentDraft {
                component_type: component.component_type,
                title: component.title.clone(),
                parent_id,
                position: component.position,
                metadata,
            };

            match self.store.create(draft).await {
                Ok(created) => {
                    id_map.insert(component.id.clone(), created.id);
                    imported_count += 1;
                }
                Err(source) => {
                    error!(error = %source, "adapter create failed mid-import");
                    // Components created so far stand; resync the cache.
                    if let Err(reload) = self.load().await {
                        warn!(error = %reload, "reconcile load after failed import");
                    }
                    return Err(WorkspaceError::persistence("import", source));
                }
            }
        }

        info!(imported_count, "workspace imported");
        if let Err(reload) = self.load().await {
            warn!(error = %reload, "load after import failed; cache does not show the imported components yet");
        }

        Ok(ImportReport {
            imported_count,
            id_map,
        })
    }
}
