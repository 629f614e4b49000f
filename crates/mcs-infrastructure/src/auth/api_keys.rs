//! Pre-provisioned API key registry

use std::collections::HashMap;

use mcs_domain::value_objects::{Principal, Tier};

use crate::config::ApiKeyEntry;

/// Lookup table mapping API key values to `(name, tier)`
#[derive(Debug, Clone, Default)]
pub struct ApiKeyRegistry {
    keys: HashMap<String, (String, Tier)>,
}

impl ApiKeyRegistry {
    /// Build the registry from configured entries
    pub fn from_entries(entries: &[ApiKeyEntry]) -> Self {
        let keys = entries
            .iter()
            .map(|e| (e.key.clone(), (e.name.clone(), e.tier)))
            .collect();
        Self { keys }
    }

    /// Resolve a bearer token to a principal, when it is a known key.
    ///
    /// API keys carry `mfa_verified` only at the service tier; human tiers
    /// still go through the TOTP flow for admin operations.
    pub fn resolve(&self, token: &str) -> Option<Principal> {
        let (name, tier) = self.keys.get(token)?;
        Some(Principal {
            user_id: format!("key:{name}"),
            email: format!("{name}@api-key"),
            tier: *tier,
            mfa_verified: *tier == Tier::Service,
            expires_at: None,
            session_id: None,
        })
    }

    /// Look up credentials for an M2M exchange: the client id must match an
    /// entry's name and the secret its key
    pub fn resolve_m2m(&self, client_id: &str, client_secret: &str) -> Option<Tier> {
        let (name, tier) = self.keys.get(client_secret)?;
        (name == client_id).then_some(*tier)
    }

    /// Number of registered keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no keys are registered
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ApiKeyRegistry {
        ApiKeyRegistry::from_entries(&[
            ApiKeyEntry {
                key: "sk-dev-1".to_string(),
                name: "ci".to_string(),
                tier: Tier::Developer,
            },
            ApiKeyEntry {
                key: "sk-svc-1".to_string(),
                name: "pipeline".to_string(),
                tier: Tier::Service,
            },
        ])
    }

    #[test]
    fn resolves_known_keys() {
        let reg = registry();
        let p = reg.resolve("sk-dev-1").unwrap();
        assert_eq!(p.tier, Tier::Developer);
        assert!(!p.mfa_verified);

        let svc = reg.resolve("sk-svc-1").unwrap();
        assert_eq!(svc.tier, Tier::Service);
        assert!(svc.mfa_verified);
    }

    #[test]
    fn unknown_key_resolves_to_none() {
        assert!(registry().resolve("sk-unknown").is_none());
    }

    #[test]
    fn m2m_requires_matching_name_and_secret() {
        let reg = registry();
        assert_eq!(reg.resolve_m2m("pipeline", "sk-svc-1"), Some(Tier::Service));
        assert_eq!(reg.resolve_m2m("pipeline", "sk-dev-1"), None);
        assert_eq!(reg.resolve_m2m("ci", "sk-svc-1"), None);
    }
}
