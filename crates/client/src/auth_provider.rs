//! Login, logout and session checks against `/api/auth/*`.

use std::collections::BTreeSet;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use bizdesk_auth::{Action, ErrorDisposition, Identity, LOGIN_ROUTE, Permission, RolePolicy, Session};

use crate::envelope::parse_one;
use crate::error::{ApiError, ApiResult};
use crate::http::HttpClient;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const LOGOUT_PATH: &str = "/api/auth/logout";
pub const ME_PATH: &str = "/api/auth/me";

/// Body of a successful login or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    #[serde(alias = "accessToken")]
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<Identity>,
}

#[derive(Debug, Clone)]
pub struct AuthProvider {
    http: HttpClient,
    policy: RolePolicy,
}

impl AuthProvider {
    pub fn new(http: HttpClient) -> Self {
        Self::with_policy(http, RolePolicy::default())
    }

    pub fn with_policy(http: HttpClient, policy: RolePolicy) -> Self {
        Self { http, policy }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub async fn login(&self, username: &str, password: &str) -> ApiResult<Session> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Invalid("username and password are required".to_string()));
        }
        let body = json!({ "username": username.trim(), "password": password });
        let response = self
            .http
            .send_json(Method::POST, LOGIN_PATH, &[], Some(&body), false)
            .await?;
        let tokens: TokenResponse = parse_one(response)?;

        let session = Session::from_tokens(tokens.token, tokens.refresh_token, tokens.user);
        self.http.save_session(&session)?;
        tracing::info!(
            username = session.identity.as_ref().map(|i| i.username.as_str()).unwrap_or(username),
            "logged in"
        );
        Ok(session)
    }

    /// Ends the session locally whatever the backend answers; returns the
    /// route to navigate to.
    pub async fn logout(&self) -> String {
        let has_session = matches!(self.http.session(), Ok(Some(_)));
        if has_session {
            if let Err(err) = self
                .http
                .send_json(Method::POST, LOGOUT_PATH, &[], None, true)
                .await
            {
                tracing::debug!(error = %err, "logout call failed, clearing session anyway");
            }
        }
        self.http.clear_session();
        LOGIN_ROUTE.to_string()
    }

    /// `Ok` when a usable session exists, refreshing it first when needed.
    pub async fn check_auth(&self) -> ApiResult<()> {
        self.http.bearer_token().await.map(|_| ())
    }

    /// Decide what to do about a failed call; a logout disposition ends the
    /// session.
    pub fn check_error(&self, err: &ApiError) -> ErrorDisposition {
        let disposition = err.disposition();
        if disposition.forces_logout() {
            self.http.clear_session();
        }
        disposition
    }

    pub async fn refresh(&self) -> ApiResult<Session> {
        self.http.refresh_session().await
    }

    pub async fn access_token(&self) -> ApiResult<String> {
        self.http.bearer_token().await
    }

    /// Stored identity, or the backend's `/api/auth/me` when the session
    /// carries none (the fetched identity is then stored).
    pub async fn get_identity(&self) -> ApiResult<Identity> {
        self.check_auth().await?;
        let Some(mut session) = self.http.session()? else {
            return Err(ApiError::Unauthenticated);
        };
        if let Some(identity) = &session.identity {
            return Ok(identity.clone());
        }
        let identity: Identity = parse_one(self.http.get_json(ME_PATH, &[]).await?)?;
        session.identity = Some(identity.clone());
        self.http.save_session(&session)?;
        Ok(identity)
    }

    pub async fn get_permissions(&self) -> ApiResult<BTreeSet<Permission>> {
        let identity = self.get_identity().await?;
        Ok(self.policy.permissions_for(&identity.roles))
    }

    /// Whether the stored session's roles allow `action` on `resource`.
    /// No session means no.
    pub fn can(&self, resource: &str, action: Action) -> bool {
        match self.http.session() {
            Ok(Some(session)) => self.policy.can(session.roles(), resource, action),
            _ => false,
        }
    }
}
