//! Component Data Structures
//!
//! This module defines the `Component` struct and the supporting types for
//! StudySpace's typed containment tree: drafts and patches exchanged with
//! the persistence adapters, metadata, and the validation error taxonomy.
//!
//! # Architecture
//!
//! - **Component**: one typed node of the tree; `children` is denormalized
//!   from `parent_id` pointers and rebuilt by the workspace on load
//! - **ComponentDraft**: what a caller hands to an adapter's `create`; the
//!   adapter answers with a full record carrying the authoritative id
//! - **ComponentPatch**: partial update; only `title`, `position` and
//!   `metadata` are mutable, `type` and `parentId` are rejected
//!
//! # Examples
//!
//! ```rust
//! use studyspace_core::models::{Component, ComponentType};
//!
//! let course = Component::new(ComponentType::Course, "Linear Algebra", None);
//! assert!(course.is_root());
//! assert!(course.children.is_empty());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::attachment::FileAttachment;
use super::component_type::ComponentType;

/// Maximum length of a component title, in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Default color tag for component metadata.
pub(crate) fn default_color() -> String {
    "default".to_string()
}

/// Validation errors for component data
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Unknown component type: {0}")]
    UnknownType(String),

    #[error("Component title must not be empty")]
    EmptyTitle,

    #[error("Component title exceeds {MAX_TITLE_LEN} characters (got {0})")]
    TitleTooLong(usize),

    #[error("{child} components cannot be placed at the workspace root")]
    InvalidRoot { child: ComponentType },

    #[error("{child} components cannot be nested under {parent}")]
    InvalidNesting {
        child: ComponentType,
        parent: ComponentType,
    },

    #[error("Field '{0}' is immutable after creation")]
    ImmutableField(&'static str),

    #[error("Inline file '{name}' is {len} bytes, above the {max} byte limit")]
    InlineTooLarge {
        name: String,
        len: usize,
        max: usize,
    },
}

/// Check a title against the emptiness and length rules.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let len = title.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong(len));
    }
    Ok(())
}

/// 2D canvas coordinate. Display-only, carries no structural meaning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self { x: 100.0, y: 100.0 }
    }
}

/// Open metadata bag attached to every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMetadata {
    /// Free-form description.
    #[serde(default)]
    pub description: String,

    /// Color tag; `"default"` means the type's own accent color.
    #[serde(default = "default_color")]
    pub color: String,

    /// Optional due date; used by assignment and test components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    /// Ordered file attachments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileAttachment>,
}

impl Default for ComponentMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            color: default_color(),
            due_date: None,
            files: Vec::new(),
        }
    }
}

/// One typed node of the containment tree.
///
/// # Fields
///
/// - `id`: opaque unique identifier, assigned by the persistence adapter at
///   creation; never reused
/// - `component_type`: closed type enumeration; immutable after creation
/// - `title`: non-empty display title
/// - `parent_id`: `None` for root-level components (courses only)
/// - `children`: ordered ids of direct children, kept consistent with the
///   `parent_id` pointers by the workspace service
/// - `position`: canvas coordinate, display-only
/// - `metadata`: description/color/due date/file attachments
///
/// # Examples
///
/// ```rust
/// # use studyspace_core::models::{Component, ComponentType, Position};
/// let course = Component::new(ComponentType::Course, "Biology 101", None);
///
/// let part = Component::new(
///     ComponentType::Part,
///     "Module 1",
///     Some(course.id.clone()),
/// )
/// .with_position(Position::new(240.0, 80.0));
///
/// assert_eq!(part.parent_id.as_deref(), Some(course.id.as_str()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Unique identifier, adapter-assigned.
    pub id: String,

    /// Component kind; serialized as `type`.
    #[serde(rename = "type")]
    pub component_type: ComponentType,

    /// Display title.
    pub title: String,

    /// Parent component id; `None` means root-level.
    #[serde(default)]
    pub parent_id: Option<String>,

    /// Ordered ids of direct children, append order.
    #[serde(default)]
    pub children: Vec<String>,

    /// Canvas position.
    #[serde(default)]
    pub position: Position,

    /// Description, color tag, due date, file attachments.
    #[serde(default)]
    pub metadata: ComponentMetadata,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp.
    pub modified_at: DateTime<Utc>,
}

impl Component {
    /// Create a new component with a generated UUID and current timestamps.
    ///
    /// Used by adapters that assign ids themselves; the remote backend
    /// builds components from server records instead.
    pub fn new(
        component_type: ComponentType,
        title: impl Into<String>,
        parent_id: Option<String>,
    ) -> Self {
        Self::new_with_id(
            Uuid::new_v4().to_string(),
            component_type,
            title,
            parent_id,
        )
    }

    /// Create a component with an explicit id.
    pub fn new_with_id(
        id: impl Into<String>,
        component_type: ComponentType,
        title: impl Into<String>,
        parent_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            component_type,
            title: title.into(),
            parent_id,
            children: Vec::new(),
            position: Position::default(),
            metadata: ComponentMetadata::default(),
            created_at: now,
            modified_at: now,
        }
    }

    /// Builder-style position override.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Builder-style metadata override.
    pub fn with_metadata(mut self, metadata: ComponentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether this component sits at the workspace root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Validate the component's own fields (title rules).
    ///
    /// Structural rules (nesting, parent existence) need the surrounding
    /// collection and are checked by the workspace service.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)
    }
}

/// Input to an adapter's `create`: everything except the authoritative id
/// and timestamps, which the adapter supplies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDraft {
    /// Component kind; serialized as `type`.
    #[serde(rename = "type")]
    pub component_type: ComponentType,

    /// Display title; defaults to the type's standard title.
    pub title: String,

    /// Parent component id; `None` for root placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Canvas position.
    #[serde(default)]
    pub position: Position,

    /// Initial metadata.
    #[serde(default)]
    pub metadata: ComponentMetadata,
}

impl ComponentDraft {
    /// Draft with the type's default title, default position and empty
    /// metadata.
    pub fn new(component_type: ComponentType, parent_id: Option<String>) -> Self {
        Self {
            component_type,
            title: component_type.default_title(),
            parent_id,
            position: Position::default(),
            metadata: ComponentMetadata::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_metadata(mut self, metadata: ComponentMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Deserialize a double-optional field, distinguishing "absent" from
/// "present but null":
/// - absent        -> `None` (leave unchanged)
/// - present null  -> `Some(None)`
/// - present value -> `Some(Some(value))`
fn deserialize_optional_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Partial update for a component.
///
/// Only `title`, `position` and `metadata` are mutable. The `type` and
/// `parentId` fields are accepted on deserialization so that an incoming
/// payload trying to change them is detected and rejected with a
/// [`ValidationError::ImmutableField`]; they are never serialized back out,
/// so no adapter can be handed an immutable-field change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentPatch {
    /// New title, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// New canvas position, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    /// Replacement metadata, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ComponentMetadata>,

    /// Illegal after creation; present only so the attempt is detectable.
    #[serde(rename = "type", default, skip_serializing)]
    pub component_type: Option<ComponentType>,

    /// Illegal after creation; `Some(None)` captures an explicit null.
    #[serde(
        default,
        skip_serializing,
        deserialize_with = "deserialize_optional_field"
    )]
    pub parent_id: Option<Option<String>>,
}

impl ComponentPatch {
    /// Whether the patch carries no changes at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.position.is_none()
            && self.metadata.is_none()
            && self.component_type.is_none()
            && self.parent_id.is_none()
    }

    /// The first immutable field this patch tries to touch, if any.
    pub fn immutable_field(&self) -> Option<&'static str> {
        if self.component_type.is_some() {
            return Some("type");
        }
        if self.parent_id.is_some() {
            return Some("parentId");
        }
        None
    }

    /// Apply the mutable fields onto a component. Timestamps are the
    /// caller's concern.
    pub fn apply_to(&self, component: &mut Component) {
        if let Some(title) = &self.title {
            component.title = title.clone();
        }
        if let Some(position) = self.position {
            component.position = position;
        }
        if let Some(metadata) = &self.metadata {
            component.metadata = metadata.clone();
        }
    }
}

/// Result of a workspace cascade delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReceipt {
    /// Every removed id, in breadth-first traversal order starting at the
    /// requested root.
    pub deleted_ids: Vec<String>,
}

impl DeleteReceipt {
    /// Number of components removed.
    pub fn count(&self) -> usize {
        self.deleted_ids.len()
    }
}
