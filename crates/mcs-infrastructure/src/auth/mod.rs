//! Authentication services
//!
//! Principal derivation from bearer credentials: pre-provisioned API keys,
//! magic-link sessions against the external auth provider, and M2M JWT
//! tokens. The dispatcher owns the tier check; this module only resolves
//! credentials into principals.

mod api_keys;
mod service;
mod session_store;
mod tokens;

pub use api_keys::ApiKeyRegistry;
pub use service::AuthService;
pub use session_store::InMemorySessionStore;
pub use tokens::{TokenClaims, TokenService};
