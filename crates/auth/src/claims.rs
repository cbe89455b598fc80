use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// The subset of access-token claims the client reads.
///
/// The backend owns signing; the client never verifies signatures and only
/// inspects the payload to schedule refreshes and prefill the identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,

    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,

    #[serde(default)]
    pub iat: Option<i64>,

    #[serde(default, alias = "authorities")]
    pub roles: Vec<String>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }
}

/// Decode the payload of a JWT without verifying its signature.
///
/// Returns `None` for opaque (non-JWT) tokens or malformed payloads.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    match jsonwebtoken::decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => Some(data.claims),
        Err(err) => {
            tracing::debug!("access token is not a decodable JWT: {err}");
            None
        }
    }
}

/// Expiry instant of a JWT access token, if it carries one.
pub fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    decode_claims(token).and_then(|c| c.expires_at())
}
