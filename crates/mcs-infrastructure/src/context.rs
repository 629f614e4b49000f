//! Request-scoped execution context
//!
//! Every tool invocation runs under a [`RequestContext`] carrying the
//! principal, a deadline, a cancellation token and a correlation id. Admin
//! mode is a field of this context, never a process-wide flag: elevating one
//! request cannot leak into another.

use std::time::{Duration, Instant};

use mcs_domain::value_objects::{Principal, Tier};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Per-request execution context
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The authenticated caller
    pub principal: Principal,
    /// Correlation id returned with errors and recorded in logs
    pub correlation_id: String,
    /// Absolute deadline for the request
    deadline: Instant,
    /// Cancellation signal, propagated to in-flight sub-queries
    cancel: CancellationToken,
    /// Whether admin-tier side effects are permitted for this request
    admin_mode: bool,
}

impl RequestContext {
    /// Create a context for a principal with a total request timeout
    pub fn new(principal: Principal, timeout: Duration) -> Self {
        let admin_mode = principal.tier.meets(Tier::Admin);
        Self {
            principal,
            correlation_id: Uuid::new_v4().to_string(),
            deadline: Instant::now() + timeout,
            cancel: CancellationToken::new(),
            admin_mode,
        }
    }

    /// Context for the synthetic dev-mode admin principal
    pub fn dev(timeout: Duration) -> Self {
        Self::new(Principal::dev(), timeout)
    }

    /// Remaining time before the deadline
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has passed
    pub fn deadline_exceeded(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Whether the request was cancelled (caller disconnect or deadline)
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel the request and all in-flight sub-operations
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token for sub-operations to await cancellation on
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Whether admin side effects are permitted for this request
    pub fn admin_mode(&self) -> bool {
        self.admin_mode
    }

    /// Explicitly drop admin rights for the remainder of this request
    pub fn without_admin(mut self) -> Self {
        self.admin_mode = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_mode_follows_tier() {
        let ctx = RequestContext::new(Principal::dev(), Duration::from_secs(30));
        assert!(ctx.admin_mode());

        let ctx = RequestContext::new(Principal::anonymous(), Duration::from_secs(30));
        assert!(!ctx.admin_mode());
    }

    #[test]
    fn admin_mode_is_per_context() {
        let a = RequestContext::new(Principal::dev(), Duration::from_secs(30));
        let b = RequestContext::new(Principal::anonymous(), Duration::from_secs(30));
        // Elevation of one request is invisible to another.
        assert!(a.admin_mode());
        assert!(!b.admin_mode());
    }

    #[test]
    fn cancellation_propagates_to_child_tokens() {
        let ctx = RequestContext::new(Principal::anonymous(), Duration::from_secs(30));
        let child = ctx.cancellation_token();
        assert!(!child.is_cancelled());
        ctx.cancel();
        assert!(child.is_cancelled());
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn deadline_counts_down() {
        let ctx = RequestContext::new(Principal::anonymous(), Duration::from_millis(0));
        assert!(ctx.deadline_exceeded());
        let ctx = RequestContext::new(Principal::anonymous(), Duration::from_secs(60));
        assert!(!ctx.deadline_exceeded());
    }

    #[test]
    fn correlation_ids_are_unique() {
        let a = RequestContext::new(Principal::anonymous(), Duration::from_secs(1));
        let b = RequestContext::new(Principal::anonymous(), Duration::from_secs(1));
        assert_ne!(a.correlation_id, b.correlation_id);
    }
}
