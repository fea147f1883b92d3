//! Workspace Configuration
//!
//! Settings shared by the persistence backends and the workspace service.
//! Construct with `Default` and override fields, then `validate()` before
//! wiring stores from it.

use std::path::PathBuf;

/// Default cap on inline attachment payloads: 10 MiB, the product's upload
/// limit.
pub const DEFAULT_MAX_INLINE_FILE_BYTES: usize = 10 * 1024 * 1024;

/// Default per-request timeout for the remote backend, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration for one workspace session.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    /// Base URL of the REST backend, e.g. `http://localhost:5000/api`.
    pub api_base_url: String,

    /// Bearer token for the REST backend; also drives the
    /// [`TokenGate`](crate::auth::TokenGate) capability.
    pub auth_token: Option<String>,

    /// Per-request timeout for the remote backend.
    pub request_timeout_secs: u64,

    /// Location of the local JSON document backend.
    pub storage_path: PathBuf,

    /// Cap on the decoded size of a single inline attachment.
    pub max_inline_file_bytes: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            auth_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            storage_path: PathBuf::from("studyspace_workspace.json"),
            max_inline_file_bytes: DEFAULT_MAX_INLINE_FILE_BYTES,
        }
    }
}

impl WorkspaceConfig {
    /// Check field sanity; returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_base_url.trim().is_empty() {
            return Err("api_base_url must not be empty".to_string());
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(format!(
                "api_base_url must be an http(s) URL, got '{}'",
                self.api_base_url
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than zero".to_string());
        }
        if self.storage_path.as_os_str().is_empty() {
            return Err("storage_path must not be empty".to_string());
        }
        if self.max_inline_file_bytes == 0 {
            return Err("max_inline_file_bytes must be greater than zero".to_string());
        }
        Ok(())
    }
}
