//! Workspace Events
//!
//! Events emitted by the workspace service after a mutation has been
//! committed to both the persistence backend and the cache. Observers (a
//! UI layer, a sync indicator) subscribe via
//! [`WorkspaceService::subscribe`](super::WorkspaceService::subscribe)
//! without coupling to the service internals.
//!
//! Events are delivered over a tokio broadcast channel; a lagging observer
//! misses events rather than blocking the service.

use crate::models::Component;

/// Events emitted after committed workspace mutations.
#[derive(Debug, Clone)]
pub enum WorkspaceEvent {
    /// A component was created and inserted into the cache.
    ComponentCreated(Component),

    /// A component's mutable fields were updated.
    ComponentUpdated(Component),

    /// A cascade delete removed these ids, in traversal order.
    ComponentsDeleted { deleted_ids: Vec<String> },

    /// A load replaced the cache with this many components.
    WorkspaceLoaded { component_count: usize },

    /// The whole collection was cleared.
    WorkspaceCleared,
}

impl WorkspaceEvent {
    /// String tag of the event kind, for logging and filtering.
    pub fn event_type(&self) -> &str {
        match self {
            WorkspaceEvent::ComponentCreated(_) => "component:created",
            WorkspaceEvent::ComponentUpdated(_) => "component:updated",
            WorkspaceEvent::ComponentsDeleted { .. } => "component:deleted",
            WorkspaceEvent::WorkspaceLoaded { .. } => "workspace:loaded",
            WorkspaceEvent::WorkspaceCleared => "workspace:cleared",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ComponentType;

    #[test]
    fn test_event_type_tags() {
        let component = Component::new(ComponentType::Course, "C", None);
        assert_eq!(
            WorkspaceEvent::ComponentCreated(component.clone()).event_type(),
            "component:created"
        );
        assert_eq!(
            WorkspaceEvent::ComponentUpdated(component).event_type(),
            "component:updated"
        );
        assert_eq!(
            WorkspaceEvent::ComponentsDeleted {
                deleted_ids: vec!["a".to_string()]
            }
            .event_type(),
            "component:deleted"
        );
        assert_eq!(
            WorkspaceEvent::WorkspaceLoaded { component_count: 3 }.event_type(),
            "workspace:loaded"
        );
        assert_eq!(WorkspaceEvent::WorkspaceCleared.event_type(), "workspace:cleared");
    }
}
