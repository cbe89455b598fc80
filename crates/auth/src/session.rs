use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use bizdesk_core::RecordId;

use crate::{Role, claims::decode_claims};

/// Refresh this long before the access token expires.
pub const DEFAULT_REFRESH_LEEWAY_SECS: i64 = 60;

/// The signed-in user as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl Identity {
    /// Name shown in the app bar: full name when known, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// Persisted authentication state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub identity: Option<Identity>,
}

impl Session {
    /// Build a session from freshly issued tokens, reading the expiry (and,
    /// when no identity is supplied, the subject and roles) from the JWT.
    pub fn from_tokens(
        access_token: String,
        refresh_token: Option<String>,
        identity: Option<Identity>,
    ) -> Self {
        let claims = decode_claims(&access_token);
        let expires_at = claims.as_ref().and_then(|c| c.expires_at());
        let identity = identity.or_else(|| {
            let claims = claims?;
            Some(Identity {
                id: None,
                username: claims.sub?,
                full_name: None,
                email: None,
                roles: claims.roles.into_iter().map(Role::new).collect(),
                avatar: None,
            })
        });

        Self {
            access_token,
            refresh_token,
            expires_at,
            identity,
        }
    }

    /// Tokens without an `exp` claim are treated as valid until the backend
    /// says otherwise (401).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    pub fn needs_refresh(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        self.refresh_token.is_some() && self.expires_at.is_some_and(|exp| now + leeway >= exp)
    }

    /// Replace the tokens after a refresh, keeping the identity.
    pub fn refreshed(&self, access_token: String, refresh_token: Option<String>) -> Self {
        let mut next = Session::from_tokens(
            access_token,
            refresh_token.or_else(|| self.refresh_token.clone()),
            self.identity.clone(),
        );
        if next.identity.is_none() {
            next.identity = self.identity.clone();
        }
        next
    }

    pub fn roles(&self) -> &[Role] {
        self.identity
            .as_ref()
            .map(|i| i.roles.as_slice())
            .unwrap_or(&[])
    }
}
