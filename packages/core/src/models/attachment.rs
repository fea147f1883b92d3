//! File Attachments
//!
//! Components carry an ordered list of file attachments in their metadata.
//! An attachment is always one of two explicit shapes:
//!
//! - [`FileAttachment::Reference`]: an id plus display fields, pointing at a
//!   file owned by the separate file service. This is the only shape the
//!   remote backend accepts; on the wire it collapses to the bare id.
//! - [`FileAttachment::Inline`]: the payload itself, base64-encoded. Only
//!   the local storage backend persists this shape.
//!
//! The two shapes are never mixed up inside the workspace: promotion of
//! legacy bare-id records into [`FileAttachment::Reference`] happens at the
//! persistence boundary, using [`FileAttachment::placeholder`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display name used when promoting a bare file id without metadata.
pub const UNKNOWN_FILE_NAME: &str = "Unknown File";

/// MIME tag used when promoting a bare file id without metadata.
pub const UNKNOWN_MIME: &str = "unknown";

/// A reference to a file stored by the file service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// File id, assigned by the file service.
    pub id: String,

    /// Original file name for display.
    pub name: String,

    /// Size in bytes as reported by the file service.
    pub size: u64,

    /// MIME/content type.
    pub mime: String,
}

/// A file embedded by value, base64-encoded.
///
/// Local-only: the remote backend refuses this shape, callers must upload
/// the bytes through the file service and attach the resulting reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineFile {
    /// Original file name for display.
    pub name: String,

    /// MIME/content type.
    pub mime: String,

    /// Base64-encoded payload (standard alphabet, padded).
    pub data: String,

    /// When the file was attached.
    pub uploaded_at: DateTime<Utc>,
}

impl InlineFile {
    /// Encode raw bytes into an inline attachment.
    pub fn from_bytes(name: impl Into<String>, mime: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data: STANDARD.encode(bytes),
            uploaded_at: Utc::now(),
        }
    }

    /// Decoded payload length in bytes, computed from the base64 length
    /// without decoding.
    pub fn byte_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|byte| *byte == b'=').count();
        (self.data.len() / 4 * 3).saturating_sub(padding)
    }

    /// Decode the payload.
    pub fn decode_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

/// A file entry in component metadata.
///
/// Serialized untagged: a reference is a flat `{id, name, size, mime}`
/// object, an inline file a flat `{name, mime, data, uploadedAt}` object.
/// The required fields of the two shapes are disjoint, so deserialization
/// is unambiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileAttachment {
    /// Id plus display fields; the persisted and remote form.
    Reference(FileRef),
    /// Embedded payload; local storage only.
    Inline(InlineFile),
}

impl FileAttachment {
    /// Build a reference attachment.
    pub fn reference(
        id: impl Into<String>,
        name: impl Into<String>,
        size: u64,
        mime: impl Into<String>,
    ) -> Self {
        FileAttachment::Reference(FileRef {
            id: id.into(),
            name: name.into(),
            size,
            mime: mime.into(),
        })
    }

    /// Promote a bare file id into a reference with placeholder display
    /// fields. Used when reading legacy records that stored ids only.
    pub fn placeholder(id: impl Into<String>) -> Self {
        FileAttachment::Reference(FileRef {
            id: id.into(),
            name: UNKNOWN_FILE_NAME.to_string(),
            size: 0,
            mime: UNKNOWN_MIME.to_string(),
        })
    }

    /// The reference form, if this attachment is one.
    pub fn as_reference(&self) -> Option<&FileRef> {
        match self {
            FileAttachment::Reference(file_ref) => Some(file_ref),
            FileAttachment::Inline(_) => None,
        }
    }

    /// The id sent on the wire for this attachment, if it has one.
    ///
    /// Inline attachments have no id until uploaded through the file
    /// service, so they return `None`.
    pub fn wire_id(&self) -> Option<&str> {
        self.as_reference().map(|file_ref| file_ref.id.as_str())
    }

    /// Whether the payload is embedded by value.
    pub fn is_inline(&self) -> bool {
        matches!(self, FileAttachment::Inline(_))
    }

    /// Display name of the attachment.
    pub fn display_name(&self) -> &str {
        match self {
            FileAttachment::Reference(file_ref) => &file_ref.name,
            FileAttachment::Inline(inline) => &inline.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Contract test: documents and enforces the exact JSON format for
    /// FileAttachment.
    ///
    /// Serde's `#[serde(untagged)]` produces FLAT objects with no variant
    /// wrapper key. Consumers distinguish the shapes by their fields: a
    /// reference always carries `id`, an inline file always carries `data`.
    #[test]
    fn test_attachment_serialization_contract() {
        let reference = FileAttachment::reference("file-123", "syllabus.pdf", 4096, "application/pdf");
        let json = serde_json::to_string(&reference).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.get("id").unwrap(), "file-123");
        assert_eq!(parsed.get("name").unwrap(), "syllabus.pdf");
        assert_eq!(parsed.get("size").unwrap(), 4096);
        assert_eq!(parsed.get("mime").unwrap(), "application/pdf");
        // Untagged: no wrapper key for the variant
        assert!(parsed.get("reference").is_none());
        assert!(parsed.get("data").is_none());

        let inline = InlineFile::from_bytes("notes.txt", "text/plain", b"hello");
        let json = serde_json::to_string(&FileAttachment::Inline(inline)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.get("name").unwrap(), "notes.txt");
        assert_eq!(parsed.get("mime").unwrap(), "text/plain");
        assert!(parsed.get("data").is_some());
        assert!(parsed.get("uploadedAt").is_some());
        assert!(parsed.get("inline").is_none());
        assert!(parsed.get("id").is_none());
    }

    #[test]
    fn test_attachment_round_trip() {
        let reference = FileAttachment::reference("file-1", "a.png", 10, "image/png");
        let json = serde_json::to_string(&reference).unwrap();
        let back: FileAttachment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reference);

        let inline = FileAttachment::Inline(InlineFile::from_bytes("b.bin", "application/octet-stream", &[1, 2, 3]));
        let json = serde_json::to_string(&inline).unwrap();
        let back: FileAttachment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, inline);
        assert!(back.is_inline());
    }

    #[test]
    fn test_placeholder_promotion() {
        let promoted = FileAttachment::placeholder("file-legacy");
        let file_ref = promoted.as_reference().unwrap();
        assert_eq!(file_ref.id, "file-legacy");
        assert_eq!(file_ref.name, UNKNOWN_FILE_NAME);
        assert_eq!(file_ref.size, 0);
        assert_eq!(file_ref.mime, UNKNOWN_MIME);
    }

    #[test]
    fn test_wire_id() {
        let reference = FileAttachment::reference("file-9", "x", 1, "text/plain");
        assert_eq!(reference.wire_id(), Some("file-9"));

        let inline = FileAttachment::Inline(InlineFile::from_bytes("x", "text/plain", b"x"));
        assert_eq!(inline.wire_id(), None);
    }

    #[test]
    fn test_inline_byte_len_matches_decoded_len() {
        for payload in [&b""[..], &b"a"[..], &b"ab"[..], &b"abc"[..], &b"abcd"[..]] {
            let inline = InlineFile::from_bytes("f", "text/plain", payload);
            assert_eq!(inline.byte_len(), payload.len());
            assert_eq!(inline.decode_bytes().unwrap(), payload);
        }
    }
}
