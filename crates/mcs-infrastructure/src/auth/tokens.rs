//! M2M token service
//!
//! Issues and validates the bearer JWTs handed out by the
//! `POST /auth/m2m/token` exchange.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use mcs_domain::error::{Error, Result};
use mcs_domain::value_objects::{Principal, Tier};

/// Claims carried by an M2M token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (client id)
    pub sub: String,
    /// Granted tier
    pub tier: String,
    /// Marks the token as machine-to-machine
    pub is_m2m: bool,
    /// Expiry as a Unix timestamp
    pub exp: i64,
    /// Issued-at as a Unix timestamp
    pub iat: i64,
}

/// JWT issue/validate service
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_lifetime_secs: i64,
}

impl TokenService {
    /// Create a token service from a shared secret
    pub fn new(secret: &str, token_lifetime_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            token_lifetime_secs,
        }
    }

    /// Issue a token for an M2M client
    pub fn issue(&self, client_id: &str, tier: Tier) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: client_id.to_string(),
            tier: tier.as_str().to_string(),
            is_m2m: true,
            exp: now + self.token_lifetime_secs,
            iat: now,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| Error::internal(format!("failed to sign token: {e}")))
    }

    /// Validate a token and resolve it to a principal
    pub fn validate(&self, token: &str) -> Result<Principal> {
        let data = decode::<TokenClaims>(token, &self.decoding, &Validation::default())
            .map_err(|e| Error::unauthorized(format!("invalid token: {e}")))?;
        let claims = data.claims;
        let tier: Tier = claims.tier.parse().unwrap_or(Tier::Public);
        Ok(Principal {
            user_id: claims.sub.clone(),
            email: format!("{}@m2m", claims.sub),
            tier,
            // M2M callers have no interactive second factor; the credential
            // exchange itself is the factor.
            mfa_verified: claims.is_m2m,
            expires_at: chrono::DateTime::from_timestamp(claims.exp, 0),
            session_id: None,
        })
    }
}
