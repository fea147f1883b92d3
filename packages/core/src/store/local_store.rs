//! Local Storage Backend
//!
//! Persists the whole component collection as one JSON document on disk,
//! the local-first counterpart of [`ApiStore`](super::ApiStore). This
//! backend assigns UUID v4 ids itself, performs the cascade delete
//! client-side, and stores inline file attachments verbatim.
//!
//! Writes go through a temp file followed by a rename, so a crashed write
//! leaves the previous document intact. A mutex serializes read-modify-write
//! cycles between concurrent callers sharing one store instance.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use super::component_store::{ComponentStore, StoreDeleteReceipt};
use super::error::StoreError;
use crate::config::WorkspaceConfig;
use crate::models::{Component, ComponentDraft, ComponentPatch};

/// JSON-document persistence for one workspace.
pub struct LocalStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStore {
    /// Create a store over the given document path. The file is created on
    /// first write; a missing file reads as an empty collection.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store at the configured storage path.
    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self::new(config.storage_path.clone())
    }

    /// Path of the backing document.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<Component>, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let components: Vec<Component> = serde_json::from_slice(&bytes)?;
        Ok(components)
    }

    async fn write_all(&self, components: &[Component]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(components)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Temp file plus rename keeps the previous document readable if
        // the process dies mid-write.
        let mut tmp_name = self.path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, &bytes).await?;
        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    /// Breadth-first descendant closure over the stored `children` arrays.
    fn closure_of(components: &[Component], root: &str) -> HashSet<String> {
        let by_id: HashMap<&str, &Component> =
            components.iter().map(|c| (c.id.as_str(), c)).collect();

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        visited.insert(root.to_string());
        queue.push_back(root.to_string());

        while let Some(current) = queue.pop_front() {
            if let Some(component) = by_id.get(current.as_str()) {
                for child in &component.children {
                    if visited.insert(child.clone()) {
                        queue.push_back(child.clone());
                    }
                }
            }
        }

        visited
    }
}

#[async_trait]
impl ComponentStore for LocalStore {
    async fn list(&self) -> Result<Vec<Component>, StoreError> {
        let components = self.read_all().await?;
        debug!(
            count = components.len(),
            path = %self.path.display(),
            "listed local components"
        );
        Ok(components)
    }

    async fn create(&self, draft: ComponentDraft) -> Result<Component, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut components = self.read_all().await?;

        if let Some(parent_id) = &draft.parent_id {
            if !components.iter().any(|c| &c.id == parent_id) {
                return Err(StoreError::missing_record(parent_id));
            }
        }

        let component = Component::new(draft.component_type, draft.title, draft.parent_id)
            .with_position(draft.position)
            .with_metadata(draft.metadata);

        if let Some(parent_id) = component.parent_id.clone() {
            if let Some(parent) = components.iter_mut().find(|c| c.id == parent_id) {
                parent.children.push(component.id.clone());
            }
        }

        components.push(component.clone());
        self.write_all(&components).await?;
        debug!(component_id = %component.id, "created local component");
        Ok(component)
    }

    async fn update(&self, id: &str, patch: ComponentPatch) -> Result<Component, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut components = self.read_all().await?;

        let component = components
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::missing_record(id))?;

        patch.apply_to(component);
        component.modified_at = Utc::now();
        let updated = component.clone();

        self.write_all(&components).await?;
        debug!(component_id = %id, "updated local component");
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<StoreDeleteReceipt, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut components = self.read_all().await?;

        let parent_id = components
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::missing_record(id))?
            .parent_id
            .clone();

        let closure = Self::closure_of(&components, id);
        let before = components.len();
        components.retain(|c| !closure.contains(&c.id));
        let deleted_count = (before - components.len()) as u64;

        if let Some(parent_id) = parent_id {
            if let Some(parent) = components.iter_mut().find(|c| c.id == parent_id) {
                parent.children.retain(|child| child != id);
            }
        }

        self.write_all(&components).await?;
        debug!(component_id = %id, deleted_count, "cascade deleted local subtree");
        Ok(StoreDeleteReceipt {
            cascaded: true,
            deleted_count,
        })
    }

    async fn delete_all(&self) -> Result<StoreDeleteReceipt, StoreError> {
        let _guard = self.write_lock.lock().await;
        let components = self.read_all().await?;
        let deleted_count = components.len() as u64;

        self.write_all(&[]).await?;
        debug!(deleted_count, "cleared local components");
        Ok(StoreDeleteReceipt {
            cascaded: true,
            deleted_count,
        })
    }
}
