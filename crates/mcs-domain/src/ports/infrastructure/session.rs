//! Session store port

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;
use crate::value_objects::Session;

/// Port: Session Store
///
/// Key-value storage for authentication sessions. Single-instance
/// deployments use the in-memory implementation; multi-instance deployments
/// plug in a shared key-value store with the same `get/set/delete/ttl`
/// surface.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a session by id; expired sessions resolve to `None`
    async fn get(&self, id: &str) -> Result<Option<Session>>;

    /// Store a session with a time-to-live
    async fn put(&self, session: Session, ttl: Duration) -> Result<()>;

    /// Remove a session
    async fn delete(&self, id: &str) -> Result<()>;

    /// Mark a session's second factor as verified; returns `false` when the
    /// session does not exist
    async fn set_mfa_verified(&self, id: &str) -> Result<bool>;
}
