//! Remote API Backend
//!
//! Talks to the StudySpace REST backend over HTTP. The server owns id
//! assignment, timestamps, and the cascade delete; this adapter translates
//! between the crate's models and the server's wire format.
//!
//! # Wire format
//!
//! Responses arrive wrapped in a `{ success, message, data }` envelope.
//! Component records may use Mongo-style `_id`/`updatedAt` keys, and their
//! `metadata.files` entries are either bare file-id strings (legacy
//! records) or file objects. Both are normalized into
//! [`FileAttachment::Reference`]; bare ids get placeholder display fields.
//!
//! Outbound, file attachments collapse to their ids. Inline attachments
//! cannot travel this backend and fail with
//! [`StoreError::UnsupportedAttachment`] before any request is sent.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::component_store::{ComponentStore, StoreDeleteReceipt};
use super::error::StoreError;
use crate::config::WorkspaceConfig;
use crate::models::{
    Component, ComponentDraft, ComponentMetadata, ComponentPatch, ComponentType, FileAttachment,
    FileRef, Position, UNKNOWN_FILE_NAME, UNKNOWN_MIME,
};

/// REST-backed persistence for one authenticated session.
pub struct ApiStore {
    client: reqwest::Client,
    base_url: String,
}

impl ApiStore {
    /// Build a store against `base_url` (e.g. `http://localhost:5000/api`).
    ///
    /// The bearer token, when given, is attached to every request. The
    /// timeout applies per request.
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                StoreError::invalid_config("auth token contains characters invalid in a header")
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// Build a store from workspace configuration.
    pub fn from_config(config: &WorkspaceConfig) -> Result<Self, StoreError> {
        Self::new(
            &config.api_base_url,
            config.auth_token.as_deref(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// The normalized base URL this store talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ComponentStore for ApiStore {
    async fn list(&self) -> Result<Vec<Component>, StoreError> {
        let response = self.client.get(self.url("/components")).send().await?;
        let wire: Vec<WireComponent> = unwrap_envelope(response, "list components").await?;
        debug!(count = wire.len(), "listed remote components");
        Ok(wire.into_iter().map(Component::from).collect())
    }

    async fn create(&self, draft: ComponentDraft) -> Result<Component, StoreError> {
        let body = CreateBody {
            component_type: draft.component_type,
            title: &draft.title,
            parent_id: draft.parent_id.as_deref(),
            position: draft.position,
            metadata: wire_metadata(&draft.metadata)?,
        };

        let response = self
            .client
            .post(self.url("/components"))
            .json(&body)
            .send()
            .await?;
        let wire: WireComponent = unwrap_envelope(response, "create component").await?;
        debug!(component_id = %wire.id, "created remote component");
        Ok(wire.into())
    }

    async fn update(&self, id: &str, patch: ComponentPatch) -> Result<Component, StoreError> {
        let metadata = match &patch.metadata {
            Some(metadata) => Some(wire_metadata(metadata)?),
            None => None,
        };
        let body = UpdateBody {
            title: patch.title.as_deref(),
            position: patch.position,
            metadata,
        };

        let response = self
            .client
            .put(self.url(&format!("/components/{}", id)))
            .json(&body)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::missing_record(id));
        }
        let wire: WireComponent = unwrap_envelope(response, "update component").await?;
        Ok(wire.into())
    }

    async fn delete(&self, id: &str) -> Result<StoreDeleteReceipt, StoreError> {
        let response = self
            .client
            .delete(self.url(&format!("/components/{}", id)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::missing_record(id));
        }
        let payload: DeletePayload = unwrap_envelope(response, "delete component").await?;
        debug!(component_id = %id, deleted_count = payload.deleted_count, "server cascade delete");
        Ok(StoreDeleteReceipt {
            cascaded: true,
            deleted_count: payload.deleted_count,
        })
    }

    async fn delete_all(&self) -> Result<StoreDeleteReceipt, StoreError> {
        let response = self
            .client
            .delete(self.url("/workspace/clear"))
            .send()
            .await?;
        let payload: ClearPayload = unwrap_envelope(response, "clear workspace").await?;
        Ok(StoreDeleteReceipt {
            cascaded: true,
            deleted_count: payload.deleted_components,
        })
    }
}

/// Standard `{ success, message, data }` response wrapper.
///
/// Missing `message`/`data` keys deserialize as `None`; `data` must not
/// carry a `serde(default)` attribute, which would demand `T: Default`
/// from payload types that have none.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

/// Check status and envelope, extract `data`.
async fn unwrap_envelope<T>(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<T, StoreError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        // Error bodies usually carry the envelope too; fall back to raw text.
        let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
            .ok()
            .and_then(|envelope| envelope.message)
            .unwrap_or_else(|| body.trim().to_string());
        return Err(StoreError::http(
            status.as_u16(),
            format!("{}: {}", operation, message),
        ));
    }

    let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
    if !envelope.success {
        let message = envelope
            .message
            .unwrap_or_else(|| "request failed".to_string());
        return Err(StoreError::http(
            status.as_u16(),
            format!("{}: {}", operation, message),
        ));
    }
    envelope.data.ok_or_else(|| {
        StoreError::http(
            status.as_u16(),
            format!("{}: response envelope carried no data", operation),
        )
    })
}

/// Collapse metadata to the wire form: file attachments become bare ids.
fn wire_metadata(metadata: &ComponentMetadata) -> Result<WireMetadataOut, StoreError> {
    let mut files = Vec::with_capacity(metadata.files.len());
    for file in &metadata.files {
        match file {
            FileAttachment::Reference(file_ref) => files.push(file_ref.id.clone()),
            FileAttachment::Inline(inline) => {
                return Err(StoreError::unsupported_attachment(format!(
                    "inline file '{}' must go through the file service before it can be attached remotely",
                    inline.name
                )));
            }
        }
    }
    Ok(WireMetadataOut {
        description: &metadata.description,
        color: &metadata.color,
        due_date: metadata.due_date,
        files,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody<'a> {
    #[serde(rename = "type")]
    component_type: ComponentType,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<&'a str>,
    position: Position,
    metadata: WireMetadataOut<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<WireMetadataOut<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireMetadataOut<'a> {
    description: &'a str,
    color: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<DateTime<Utc>>,
    files: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeletePayload {
    #[serde(default)]
    deleted_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClearPayload {
    #[serde(default)]
    deleted_components: u64,
}

/// Server component record; tolerates Mongo-style key spellings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireComponent {
    #[serde(alias = "_id")]
    id: String,
    #[serde(rename = "type")]
    component_type: ComponentType,
    title: String,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    children: Vec<String>,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    metadata: WireMetadata,
    created_at: DateTime<Utc>,
    #[serde(alias = "updatedAt")]
    modified_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMetadata {
    #[serde(default)]
    description: String,
    #[serde(default = "crate::models::default_color")]
    color: String,
    #[serde(default)]
    due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    files: Vec<WireFileEntry>,
}

/// A metadata file entry as the server sends it: either a bare id string
/// (legacy records) or a populated file object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireFileEntry {
    Full(WireFileRef),
    Id(String),
}

#[derive(Debug, Deserialize)]
struct WireFileRef {
    #[serde(alias = "_id")]
    id: String,
    #[serde(default, alias = "originalName")]
    name: Option<String>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default, alias = "mimeType", alias = "type")]
    mime: Option<String>,
}

impl From<WireFileEntry> for FileAttachment {
    fn from(entry: WireFileEntry) -> Self {
        match entry {
            WireFileEntry::Id(id) => FileAttachment::placeholder(id),
            WireFileEntry::Full(file) => FileAttachment::Reference(FileRef {
                id: file.id,
                name: file.name.unwrap_or_else(|| UNKNOWN_FILE_NAME.to_string()),
                size: file.size.unwrap_or(0),
                mime: file.mime.unwrap_or_else(|| UNKNOWN_MIME.to_string()),
            }),
        }
    }
}

impl From<WireMetadata> for ComponentMetadata {
    fn from(metadata: WireMetadata) -> Self {
        ComponentMetadata {
            description: metadata.description,
            color: metadata.color,
            due_date: metadata.due_date,
            files: metadata.files.into_iter().map(FileAttachment::from).collect(),
        }
    }
}

impl From<WireComponent> for Component {
    fn from(wire: WireComponent) -> Self {
        Component {
            id: wire.id,
            component_type: wire.component_type,
            title: wire.title,
            parent_id: wire.parent_id,
            children: wire.children,
            position: wire.position,
            metadata: wire.metadata.into(),
            created_at: wire.created_at,
            modified_at: wire.modified_at,
        }
    }
}
