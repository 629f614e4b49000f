//! Unified authentication service
//!
//! Resolves every accepted credential into a [`Principal`]:
//! 1. pre-provisioned API keys
//! 2. magic-link sessions (external auth provider)
//! 3. M2M JWT tokens
//!
//! Tier derivation on login: configured admin emails get `admin`, configured
//! developer domains get `developer`, everyone else `public`.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use mcs_domain::error::{Error, Result};
use mcs_domain::ports::{AuthProvider, MagicLinkTicket, SessionStore};
use mcs_domain::value_objects::{Principal, Session, SessionState, Tier};

use crate::config::AuthConfig;
use crate::logging::{audit_auth_failure, audit_auth_success};

use super::{ApiKeyRegistry, TokenService};

/// Default M2M token lifetime
const M2M_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Unified authentication handler for all transports
pub struct AuthService {
    config: AuthConfig,
    http: reqwest::Client,
    sessions: Arc<dyn SessionStore>,
    api_keys: ApiKeyRegistry,
    tokens: Option<TokenService>,
}

impl AuthService {
    /// Create the service from configuration
    pub fn new(config: AuthConfig, sessions: Arc<dyn SessionStore>) -> Self {
        let api_keys = ApiKeyRegistry::from_entries(&config.api_keys);
        let tokens = config
            .jwt_secret
            .as_deref()
            .map(|secret| TokenService::new(secret, M2M_TOKEN_LIFETIME_SECS));
        Self {
            config,
            http: reqwest::Client::new(),
            sessions,
            api_keys,
            tokens,
        }
    }

    /// Derive the tier a freshly authenticated email is entitled to
    pub fn tier_for_email(&self, email: &str) -> Tier {
        let email = email.to_lowercase();
        if self
            .config
            .admin_emails
            .iter()
            .any(|a| a.to_lowercase() == email)
        {
            return Tier::Admin;
        }
        if let Some(domain) = email.rsplit('@').next() {
            if self
                .config
                .developer_domains
                .iter()
                .any(|d| d.to_lowercase() == domain)
            {
                return Tier::Developer;
            }
        }
        Tier::Public
    }

    fn provider_endpoint(&self) -> Result<&str> {
        self.config
            .provider_endpoint
            .as_deref()
            .ok_or_else(|| Error::dependency("auth", "auth provider not configured"))
    }

    fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.config.session_duration_minutes * 60)
    }

    async fn provider_post(&self, path: &str, body: serde_json::Value) -> Result<serde_json::Value> {
        let endpoint = self.provider_endpoint()?;
        let secret = self.config.provider_secret.as_deref().unwrap_or_default();
        let response = self
            .http
            .post(format!("{endpoint}{path}"))
            .bearer_auth(secret)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::dependency_with_source("auth", "provider request failed", e))?;

        let status = response.status();
        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::dependency_with_source("auth", "invalid provider response", e))?;
        if !status.is_success() {
            return Err(Error::unauthorized(format!(
                "auth provider rejected the request ({status})"
            )));
        }
        Ok(value)
    }
}

#[async_trait]
impl AuthProvider for AuthService {
    fn is_enabled(&self) -> bool {
        self.config.provider_endpoint.is_some()
    }

    async fn send_magic_link(&self, email: &str) -> Result<MagicLinkTicket> {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(Error::validation_field("email", "a valid email is required"));
        }
        let value = self
            .provider_post(
                "/magic_links/email/send",
                serde_json::json!({ "email": email }),
            )
            .await?;
        Ok(MagicLinkTicket {
            email: email.to_string(),
            request_id: value
                .get("request_id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        })
    }

    async fn complete_authentication(&self, token: &str) -> Result<Principal> {
        let value = self
            .provider_post(
                "/magic_links/authenticate",
                serde_json::json!({ "token": token }),
            )
            .await?;

        let email = value
            .get("email")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::unauthorized("provider response missing email"))?;
        let user_id = value
            .get("user_id")
            .and_then(|v| v.as_str())
            .unwrap_or(email);

        let tier = self.tier_for_email(email);
        let session_id = Uuid::new_v4().to_string();
        let principal = Principal {
            user_id: user_id.to_string(),
            email: email.to_string(),
            tier,
            mfa_verified: false,
            expires_at: Some(
                Utc::now()
                    + chrono::Duration::minutes(self.config.session_duration_minutes as i64),
            ),
            session_id: Some(session_id.clone()),
        };

        let session = Session {
            id: session_id,
            principal: principal.clone(),
            state: SessionState::Authenticated,
            created_at: Utc::now(),
            expires_at: Utc::now(),
        };
        self.sessions.put(session, self.session_ttl()).await?;
        audit_auth_success(&principal.user_id, tier, "magic_link");
        Ok(principal)
    }

    async fn verify_totp(&self, user_id: &str, code: &str) -> Result<bool> {
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::validation_field("totp_code", "a 6-digit code is required"));
        }
        let value = self
            .provider_post(
                "/totps/authenticate",
                serde_json::json!({ "user_id": user_id, "totp_code": code }),
            )
            .await?;
        Ok(value
            .get("verified")
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn issue_m2m_token(&self, client_id: &str, client_secret: &str) -> Result<String> {
        let tokens = self
            .tokens
            .as_ref()
            .ok_or_else(|| Error::dependency("auth", "M2M tokens not configured"))?;
        match self.api_keys.resolve_m2m(client_id, client_secret) {
            Some(tier) => {
                audit_auth_success(client_id, tier, "m2m");
                tokens.issue(client_id, tier)
            }
            None => {
                audit_auth_failure("invalid M2M credentials");
                Err(Error::unauthorized("invalid client credentials"))
            }
        }
    }

    async fn validate_token(&self, token: &str) -> Result<Principal> {
        if token.is_empty() {
            audit_auth_failure("no token provided");
            return Err(Error::unauthorized("authentication required"));
        }

        if let Some(principal) = self.api_keys.resolve(token) {
            audit_auth_success(&principal.user_id, principal.tier, "api_key");
            return Ok(principal);
        }

        if let Some(session) = self.sessions.get(token).await? {
            debug!(session = %session.id, "resolved session token");
            return Ok(session.principal);
        }

        if let Some(tokens) = &self.tokens {
            if let Ok(principal) = tokens.validate(token) {
                return Ok(principal);
            }
        }

        audit_auth_failure("unrecognized token");
        Err(Error::unauthorized("invalid or expired credentials"))
    }
}
