//! Authentication Capability
//!
//! The workspace consumes authentication as an opaque yes/no capability:
//! `load()` asks the gate before touching the persistence backend and
//! performs no credential handling of its own. Session management lives
//! entirely outside this crate.

use crate::config::WorkspaceConfig;

/// Reports whether the current session may load persisted workspaces.
pub trait AuthGate: Send + Sync {
    fn is_authenticated(&self) -> bool;
}

/// Always-allowed gate, for local-only workspaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

impl AuthGate for OpenGate {
    fn is_authenticated(&self) -> bool {
        true
    }
}

/// Gate backed by the presence of a non-blank bearer token.
#[derive(Debug, Clone, Default)]
pub struct TokenGate {
    token: Option<String>,
}

impl TokenGate {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self::new(config.auth_token.clone())
    }
}

impl AuthGate for TokenGate {
    fn is_authenticated(&self) -> bool {
        match &self.token {
            Some(token) => !token.trim().is_empty(),
            None => false,
        }
    }
}
