//! Data Models
//!
//! This module contains the core data structures used throughout StudySpace:
//!
//! - `ComponentType` - the closed type enumeration and its nesting matrix
//! - `Component` - one typed node of the containment tree, plus the draft
//!   and patch shapes exchanged with persistence adapters
//! - `FileAttachment` - tagged file entries carried in component metadata
//!
//! The workspace service owns all structural invariants; these types only
//! validate their own fields.

mod attachment;
mod component;
mod component_type;

pub use attachment::{FileAttachment, FileRef, InlineFile, UNKNOWN_FILE_NAME, UNKNOWN_MIME};
pub use component::{
    validate_title, Component, ComponentDraft, ComponentMetadata, ComponentPatch, DeleteReceipt,
    Position, ValidationError, MAX_TITLE_LEN,
};
pub use component_type::ComponentType;

pub(crate) use component::default_color;
