//! Logging setup
//!
//! Tracing subscriber initialization plus the audit log helpers. Audit
//! events use the dedicated `audit` target so operational tooling can route
//! them separately from application logs.

use mcs_domain::value_objects::Tier;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level when set. Safe to call once per
/// process; later calls are no-ops.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Record a successful authentication
pub fn audit_auth_success(user_id: &str, tier: Tier, method: &str) {
    info!(target: "audit", user_id, tier = tier.as_str(), method, "auth_success");
}

/// Record a failed authentication
pub fn audit_auth_failure(reason: &str) {
    warn!(target: "audit", reason, "auth_failure");
}

/// Record an admin-tier tool invocation
pub fn audit_admin_tool(user_id: &str, tool: &str, correlation_id: &str, success: bool) {
    info!(
        target: "audit",
        user_id,
        tool,
        correlation_id,
        success,
        "admin_tool_invocation"
    );
}
