//! Authentication provider port

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::value_objects::Principal;

/// Receipt for a sent magic link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagicLinkTicket {
    /// Email the link was sent to
    pub email: String,
    /// Provider request id, for support correlation
    pub request_id: String,
}

/// Port: Authentication Provider
///
/// Wraps the external auth provider: magic-link issuance and verification,
/// TOTP second factor, and machine-to-machine credential exchange. Bearer
/// token validation resolves any accepted credential (session token, M2M
/// JWT, pre-provisioned API key) into a [`Principal`].
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Whether the provider is configured; when disabled, only API keys and
    /// dev mode authenticate callers
    fn is_enabled(&self) -> bool;

    /// Send a magic link to an email address
    async fn send_magic_link(&self, email: &str) -> Result<MagicLinkTicket>;

    /// Complete a magic-link flow, creating a session
    async fn complete_authentication(&self, token: &str) -> Result<Principal>;

    /// Verify a TOTP code for a user; returns whether verification passed
    async fn verify_totp(&self, user_id: &str, code: &str) -> Result<bool>;

    /// Exchange M2M credentials for a bearer token
    async fn issue_m2m_token(&self, client_id: &str, client_secret: &str) -> Result<String>;

    /// Resolve a bearer token into a principal
    async fn validate_token(&self, token: &str) -> Result<Principal>;
}
