//! StudySpace Core Business Logic Layer
//!
//! This crate provides the typed component tree, persistence adapters, and
//! workspace orchestration for the StudySpace learning workspace.
//!
//! # Architecture
//!
//! - **Typed containment tree**: seven component types with a fixed
//!   nesting matrix (course -> part -> subject -> leaves)
//! - **Single mutator**: `WorkspaceService` owns the in-memory cache;
//!   every write validates first, persists second, commits last
//! - **Pluggable persistence**: the `ComponentStore` trait backs the
//!   service with a remote HTTP API or a local JSON file
//! - **Adapter-assigned ids**: components get their identity from the
//!   backend, never from the cache
//!
//! # Modules
//!
//! - [`models`] - Data structures (Component, ComponentType, attachments)
//! - [`store`] - Persistence adapters (ApiStore, LocalStore)
//! - [`workspace`] - WorkspaceService, selection, events
//! - [`auth`] - Authentication capability gating workspace loads
//! - [`config`] - Runtime configuration

pub mod auth;
pub mod config;
pub mod models;
pub mod store;
pub mod workspace;

// Re-export commonly used types
pub use models::*;
pub use store::{ApiStore, ComponentStore, LocalStore, StoreError};
pub use workspace::{
    SelectionState, StoreState, WorkspaceError, WorkspaceEvent, WorkspaceService,
};
