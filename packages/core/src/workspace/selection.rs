//! Selection and navigation context tracking.
//!
//! The UI keeps two pieces of navigation state next to the tree: the set
//! of selected component ids and the id of the container currently being
//! viewed (`None` at the workspace root). Both hold ids only; after
//! deletes they must be pruned against the cache so they never point at
//! components that no longer exist.

use std::collections::HashSet;

use super::service::WorkspaceService;

/// Selected ids plus the current navigation container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: HashSet<String>,
    context: Option<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection with a single id.
    pub fn select(&mut self, id: impl Into<String>) {
        self.selected.clear();
        self.selected.insert(id.into());
    }

    /// Add an id to the selection, keeping what is already selected.
    pub fn toggle(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn selected(&self) -> &HashSet<String> {
        &self.selected
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Navigate into a container; its children become the visible layer.
    pub fn enter_context(&mut self, id: impl Into<String>) {
        self.context = Some(id.into());
        self.selected.clear();
    }

    /// Navigate back to the workspace root.
    pub fn exit_to_root(&mut self) {
        self.context = None;
        self.selected.clear();
    }

    /// Id of the container being viewed, `None` at the root.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Drop selection and context entirely.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.context = None;
    }

    /// Prune ids that no longer resolve in the workspace cache.
    ///
    /// Call after deletes and reloads. A vanished context falls back to
    /// the root rather than leaving the view inside a deleted container.
    pub fn retain_existing(&mut self, workspace: &WorkspaceService) {
        self.selected
            .retain(|id| workspace.get_component(id).is_some());
        if let Some(context) = &self.context {
            if workspace.get_component(context).is_none() {
                self.context = None;
            }
        }
    }
}
