//! Signed bearer-token issuance and validation.

use crate::error::AppError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Decoded bearer-token payload: account id, email, and the
/// issued-at/expiry pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: u64,
    pub exp: u64,
}

/// HS256 token issuer.
///
/// Holds the signing keys derived from the configured secret; constructed
/// once at startup and shared. Rotating the secret invalidates every
/// outstanding token.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: a token is invalid the second it expires
        validation.leeway = 0;

        TokenIssuer {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    /// Issue a signed token for an account. Expires `ttl_secs` after issuance.
    pub fn issue(&self, account_id: &str, email: &str) -> Result<String, AppError> {
        let iat = unix_now();
        let claims = Claims {
            sub: account_id.to_string(),
            email: email.to_string(),
            iat,
            exp: iat + self.ttl_secs,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
    }

    /// Validate signature and expiry, returning the claims on success.
    ///
    /// Any failure (malformed, tampered, expired, wrong key) collapses to
    /// `None` so callers cannot distinguish the cause.
    pub fn validate(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .ok()
    }
}

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}
