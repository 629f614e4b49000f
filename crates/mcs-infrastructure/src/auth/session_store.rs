//! In-memory session store
//!
//! Single-instance session storage. Expired sessions are removed lazily on
//! access; multi-instance deployments replace this with a shared key-value
//! store implementing the same port.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use mcs_domain::error::Result;
use mcs_domain::ports::SessionStore;
use mcs_domain::value_objects::{Session, SessionState};

/// In-memory TTL session map
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions (expired ones may still be counted until
    /// their next access)
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store holds no sessions
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: &str) -> Result<Option<Session>> {
        let expired = {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                Some(session) if session.is_expired(Utc::now()) => true,
                Some(session) => return Ok(Some(session.clone())),
                None => return Ok(None),
            }
        };
        if expired {
            self.sessions.write().await.remove(id);
        }
        Ok(None)
    }

    async fn put(&self, mut session: Session, ttl: Duration) -> Result<()> {
        session.expires_at = Utc::now()
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(8));
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn set_mfa_verified(&self, id: &str) -> Result<bool> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(session) if !session.is_expired(Utc::now()) => {
                session.principal.mfa_verified = true;
                session.state = SessionState::MfaVerified;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcs_domain::value_objects::Principal;

    fn session(id: &str) -> Session {
        Session {
            id: id.to_string(),
            principal: Principal::anonymous(),
            state: SessionState::Authenticated,
            created_at: Utc::now(),
            expires_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn put_get_round_trip() {
        let store = InMemorySessionStore::new();
        store
            .put(session("s1"), Duration::from_secs(60))
            .await
            .unwrap();
        let loaded = store.get("s1").await.unwrap().unwrap();
        assert_eq!(loaded.id, "s1");
    }

    #[tokio::test]
    async fn expired_sessions_vanish_on_access() {
        let store = InMemorySessionStore::new();
        store
            .put(session("s1"), Duration::from_secs(0))
            .await
            .unwrap();
        assert!(store.get("s1").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn mfa_upgrade_mutates_state() {
        let store = InMemorySessionStore::new();
        store
            .put(session("s1"), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(store.set_mfa_verified("s1").await.unwrap());
        let loaded = store.get("s1").await.unwrap().unwrap();
        assert!(loaded.principal.mfa_verified);
        assert_eq!(loaded.state, SessionState::MfaVerified);
    }

    #[tokio::test]
    async fn mfa_upgrade_of_missing_session_is_false() {
        let store = InMemorySessionStore::new();
        assert!(!store.set_mfa_verified("nope").await.unwrap());
    }
}
