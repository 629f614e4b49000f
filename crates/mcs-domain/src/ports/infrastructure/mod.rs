//! Infrastructure ports
//!
//! Contracts for cross-cutting services: authentication, session storage and
//! feedback recording.

mod auth;
mod feedback;
mod session;

pub use auth::{AuthProvider, MagicLinkTicket};
pub use feedback::{FeedbackSink, WeightsSource};
pub use session::SessionStore;
