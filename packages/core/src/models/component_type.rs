//! Component Type Registry
//!
//! The closed set of component kinds a workspace tree may contain, together
//! with the static nesting matrix and display metadata for each kind.
//!
//! # Nesting matrix
//!
//! | Child                          | Allowed parent |
//! |--------------------------------|----------------|
//! | `course`                       | workspace root |
//! | `part`                         | `course`       |
//! | `subject`                      | `part`         |
//! | `notes`/`assignment`/`test`/`ai` | `subject`    |
//!
//! Every function here is total over the enum; lookups never fail and never
//! allocate. Parsing from an arbitrary string is the only fallible entry
//! point and returns [`ValidationError::UnknownType`].
//!
//! # Examples
//!
//! ```rust
//! use studyspace_core::models::ComponentType;
//!
//! assert!(ComponentType::Course.is_root_allowed());
//! assert!(ComponentType::Part.can_nest(Some(ComponentType::Course)));
//! assert!(!ComponentType::Notes.can_nest(Some(ComponentType::Course)));
//! assert_eq!(ComponentType::Ai.label(), "AI Assistant");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::component::ValidationError;

/// The closed enumeration of component kinds.
///
/// Serialized in lowercase (`"course"`, `"part"`, ..., `"ai"`), matching the
/// wire format of the persistence backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Course,
    Part,
    Subject,
    Notes,
    Assignment,
    Test,
    Ai,
}

impl ComponentType {
    /// All component types, in display order.
    pub const ALL: [ComponentType; 7] = [
        ComponentType::Course,
        ComponentType::Part,
        ComponentType::Subject,
        ComponentType::Notes,
        ComponentType::Assignment,
        ComponentType::Test,
        ComponentType::Ai,
    ];

    /// Lowercase wire name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Course => "course",
            ComponentType::Part => "part",
            ComponentType::Subject => "subject",
            ComponentType::Notes => "notes",
            ComponentType::Assignment => "assignment",
            ComponentType::Test => "test",
            ComponentType::Ai => "ai",
        }
    }

    /// Human-readable label for pickers and breadcrumbs.
    pub fn label(&self) -> &'static str {
        match self {
            ComponentType::Course => "Course",
            ComponentType::Part => "Part / Module",
            ComponentType::Subject => "Subject",
            ComponentType::Notes => "Notes",
            ComponentType::Assignment => "Assignment",
            ComponentType::Test => "Test",
            ComponentType::Ai => "AI Assistant",
        }
    }

    /// Accent color hex tag associated with this type.
    pub fn color(&self) -> &'static str {
        match self {
            ComponentType::Course => "#6366F1",
            ComponentType::Part => "#8B5CF6",
            ComponentType::Subject => "#EC4899",
            ComponentType::Notes => "#F59E0B",
            ComponentType::Assignment => "#22C55E",
            ComponentType::Test => "#EF4444",
            ComponentType::Ai => "#06B6D4",
        }
    }

    /// Icon name associated with this type.
    pub fn icon(&self) -> &'static str {
        match self {
            ComponentType::Course => "book-open",
            ComponentType::Part => "folder-open",
            ComponentType::Subject => "file-text",
            ComponentType::Notes => "sticky-note",
            ComponentType::Assignment => "clipboard",
            ComponentType::Test => "check-square",
            ComponentType::Ai => "sparkles",
        }
    }

    /// Whether this type may be placed directly at the workspace root.
    ///
    /// Only courses live at the root; everything else needs a parent.
    pub fn is_root_allowed(&self) -> bool {
        matches!(self, ComponentType::Course)
    }

    /// The set of types allowed as the immediate parent of this type.
    ///
    /// An empty slice means only root placement is allowed.
    pub fn allowed_parent_types(&self) -> &'static [ComponentType] {
        match self {
            ComponentType::Course => &[],
            ComponentType::Part => &[ComponentType::Course],
            ComponentType::Subject => &[ComponentType::Part],
            ComponentType::Notes
            | ComponentType::Assignment
            | ComponentType::Test
            | ComponentType::Ai => &[ComponentType::Subject],
        }
    }

    /// Whether a component of this type may be nested under `parent`.
    ///
    /// `None` stands for the workspace root.
    pub fn can_nest(&self, parent: Option<ComponentType>) -> bool {
        match parent {
            None => self.is_root_allowed(),
            Some(parent) => self.allowed_parent_types().contains(&parent),
        }
    }

    /// Default title for a freshly created component of this type.
    ///
    /// "New " followed by the capitalized wire name, so `Ai` yields
    /// "New Ai" rather than the display label.
    pub fn default_title(&self) -> String {
        let name = match self {
            ComponentType::Course => "Course",
            ComponentType::Part => "Part",
            ComponentType::Subject => "Subject",
            ComponentType::Notes => "Notes",
            ComponentType::Assignment => "Assignment",
            ComponentType::Test => "Test",
            ComponentType::Ai => "Ai",
        };
        format!("New {}", name)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "course" => Ok(ComponentType::Course),
            "part" => Ok(ComponentType::Part),
            "subject" => Ok(ComponentType::Subject),
            "notes" => Ok(ComponentType::Notes),
            "assignment" => Ok(ComponentType::Assignment),
            "test" => Ok(ComponentType::Test),
            "ai" => Ok(ComponentType::Ai),
            other => Err(ValidationError::UnknownType(other.to_string())),
        }
    }
}
