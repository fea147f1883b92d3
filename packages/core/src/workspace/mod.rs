//! Workspace Layer
//!
//! This module contains the stateful workspace built on top of the
//! persistence adapters:
//!
//! - `WorkspaceService` - sole owner and mutator of the component tree
//! - `SelectionState` - selection and navigation context over the tree
//! - `WorkspaceEvent` - broadcast notifications emitted after commits
//! - `WorkspaceError` - the error taxonomy mutations surface
//!
//! The service coordinates between the cache and the adapter,
//! implementing the nesting rules and the commit-after-persistence
//! discipline.

pub mod error;
pub mod events;
pub mod selection;
pub mod service;

#[cfg(test)]
mod service_tree_test;

pub use error::WorkspaceError;
pub use events::WorkspaceEvent;
pub use selection::SelectionState;
pub use service::{ImportReport, StoreState, WorkspaceExport, WorkspaceService};
