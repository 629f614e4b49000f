//! Principal and session value objects
//!
//! Access control model: tiers form a total order
//! `public < developer < admin <= service`; higher tiers subsume lower ones.
//! Admin operations additionally require MFA when configured.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Ordered access tier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Read-only, no sensitive data
    Public,
    /// Read/write non-destructive
    Developer,
    /// Destructive operations
    Admin,
    /// M2M automation; subsumes admin
    Service,
}

impl Tier {
    /// Wire name of the tier
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Developer => "developer",
            Self::Admin => "admin",
            Self::Service => "service",
        }
    }

    /// Numeric hierarchy level; higher means more access
    pub fn level(self) -> u8 {
        match self {
            Self::Public => 0,
            Self::Developer => 1,
            Self::Admin => 2,
            Self::Service => 3,
        }
    }

    /// Whether this tier meets or exceeds `required`
    pub fn meets(self, required: Tier) -> bool {
        self.level() >= required.level()
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "developer" => Ok(Self::Developer),
            "admin" => Ok(Self::Admin),
            "service" => Ok(Self::Service),
            other => Err(Error::validation_field(
                "tier",
                format!("unknown tier '{other}'"),
            )),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value Object: Authenticated Principal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Principal {
    /// Stable user identifier
    pub user_id: String,
    /// User email (synthetic for service principals)
    pub email: String,
    /// Access tier
    pub tier: Tier,
    /// Whether a second factor was verified for this session
    pub mfa_verified: bool,
    /// Session expiry, when the principal came from a session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Backing session id, when any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Principal {
    /// The synthetic admin principal substituted in dev mode
    pub fn dev() -> Self {
        Self {
            user_id: "dev".to_string(),
            email: "dev@localhost".to_string(),
            tier: Tier::Admin,
            mfa_verified: true,
            expires_at: None,
            session_id: Some("dev-session".to_string()),
        }
    }

    /// An anonymous public principal (unauthenticated stdio use)
    pub fn anonymous() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            email: String::new(),
            tier: Tier::Public,
            mfa_verified: false,
            expires_at: None,
            session_id: None,
        }
    }

    /// Whether the principal has expired
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| t <= now)
    }
}

/// Session lifecycle state.
///
/// `NONE → PENDING_MAGIC_LINK → AUTHENTICATED → (MFA_VERIFIED) → EXPIRED`;
/// `EXPIRED` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session exists
    None,
    /// Magic link sent, not yet verified
    PendingMagicLink,
    /// Magic link verified
    Authenticated,
    /// Second factor verified
    MfaVerified,
    /// Session expired; terminal
    Expired,
}

impl SessionState {
    /// Whether a transition to `next` is allowed
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (None, PendingMagicLink)
                | (PendingMagicLink, Authenticated)
                | (PendingMagicLink, Expired)
                | (Authenticated, MfaVerified)
                | (Authenticated, Expired)
                | (MfaVerified, Expired)
        )
    }
}

/// A stored authentication session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session token / id
    pub id: String,
    /// The authenticated principal
    pub principal: Principal,
    /// Lifecycle state
    pub state: SessionState,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is past its expiry
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now || self.state == SessionState::Expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ordering_is_total() {
        assert!(Tier::Public < Tier::Developer);
        assert!(Tier::Developer < Tier::Admin);
        assert!(Tier::Admin < Tier::Service);
    }

    #[test]
    fn higher_tiers_subsume_lower() {
        assert!(Tier::Service.meets(Tier::Admin));
        assert!(Tier::Admin.meets(Tier::Developer));
        assert!(Tier::Admin.meets(Tier::Public));
        assert!(!Tier::Developer.meets(Tier::Admin));
        assert!(!Tier::Public.meets(Tier::Developer));
    }

    #[test]
    fn dev_principal_is_mfa_verified_admin() {
        let p = Principal::dev();
        assert_eq!(p.tier, Tier::Admin);
        assert!(p.mfa_verified);
    }

    #[test]
    fn expired_is_terminal() {
        for next in [
            SessionState::None,
            SessionState::PendingMagicLink,
            SessionState::Authenticated,
            SessionState::MfaVerified,
        ] {
            assert!(!SessionState::Expired.can_transition_to(next));
        }
    }

    #[test]
    fn session_flow_transitions() {
        assert!(SessionState::None.can_transition_to(SessionState::PendingMagicLink));
        assert!(SessionState::PendingMagicLink.can_transition_to(SessionState::Authenticated));
        assert!(SessionState::Authenticated.can_transition_to(SessionState::MfaVerified));
        assert!(SessionState::MfaVerified.can_transition_to(SessionState::Expired));
        assert!(!SessionState::None.can_transition_to(SessionState::Authenticated));
    }
}
