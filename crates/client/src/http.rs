//! Authenticated JSON transport shared by the data and auth providers.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use uuid::Uuid;

use bizdesk_auth::session::DEFAULT_REFRESH_LEEWAY_SECS;
use bizdesk_auth::{Session, TokenStore};

use crate::auth_provider::TokenResponse;
use crate::config::ClientConfig;
use crate::envelope::{error_message, parse_one};
use crate::error::{ApiError, ApiResult};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const REFRESH_PATH: &str = "/api/auth/refresh";

struct Inner {
    base_url: String,
    http: reqwest::Client,
    store: Arc<dyn TokenStore>,
    // Serializes refreshes so concurrent calls do not spend the refresh token twice.
    refresh_lock: Mutex<()>,
    leeway: chrono::Duration,
}

/// Cheap to clone; clones share the connection pool and token store.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(config: &ClientConfig, store: Arc<dyn TokenStore>) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(Inner {
                base_url: config.api_url.trim_end_matches('/').to_string(),
                http,
                store,
                refresh_lock: Mutex::new(()),
                leeway: chrono::Duration::seconds(DEFAULT_REFRESH_LEEWAY_SECS),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.inner.base_url, path)
        } else {
            format!("{}/{}", self.inner.base_url, path)
        }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.store
    }

    pub fn session(&self) -> ApiResult<Option<Session>> {
        Ok(self.inner.store.load()?)
    }

    pub fn save_session(&self, session: &Session) -> ApiResult<()> {
        Ok(self.inner.store.save(session)?)
    }

    pub fn clear_session(&self) {
        if let Err(err) = self.inner.store.clear() {
            tracing::warn!(error = %err, "failed to clear session store");
        }
    }

    /// Access token for the next request, refreshed first when close to expiry.
    pub async fn bearer_token(&self) -> ApiResult<String> {
        let Some(session) = self.session()? else {
            return Err(ApiError::Unauthenticated);
        };
        if session.needs_refresh(Utc::now(), self.inner.leeway) {
            let _guard = self.inner.refresh_lock.lock().await;
            // Another task may have refreshed while we waited for the lock.
            let Some(current) = self.session()? else {
                return Err(ApiError::Unauthenticated);
            };
            if !current.needs_refresh(Utc::now(), self.inner.leeway) {
                return Ok(current.access_token);
            }
            return Ok(self.refresh_locked(current).await?.access_token);
        }
        if session.is_expired(Utc::now()) {
            tracing::info!("access token expired and no refresh token is available");
            self.clear_session();
            return Err(ApiError::Unauthenticated);
        }
        Ok(session.access_token)
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// A rejected refresh (401/403) ends the session.
    pub async fn refresh_session(&self) -> ApiResult<Session> {
        let _guard = self.inner.refresh_lock.lock().await;
        let Some(session) = self.session()? else {
            return Err(ApiError::Unauthenticated);
        };
        self.refresh_locked(session).await
    }

    async fn refresh_locked(&self, session: Session) -> ApiResult<Session> {
        let Some(refresh_token) = session.refresh_token.clone() else {
            self.clear_session();
            return Err(ApiError::Unauthenticated);
        };

        let body = json!({ "refreshToken": refresh_token });
        let response = match self
            .execute(Method::POST, REFRESH_PATH, &[], Some(&body), None)
            .await
        {
            Ok(value) => value,
            Err(ApiError::Status { status: 401 | 403, .. }) => {
                tracing::info!("refresh token rejected, ending session");
                self.clear_session();
                return Err(ApiError::Unauthenticated);
            }
            Err(err) => return Err(err),
        };
        let tokens: TokenResponse = parse_one(response)?;

        let next = session.refreshed(tokens.token, tokens.refresh_token);
        self.save_session(&next)?;
        tracing::debug!(expires_at = ?next.expires_at, "session refreshed");
        Ok(next)
    }

    /// Issue a request and return the JSON body (`Null` for empty bodies).
    ///
    /// Non-2xx responses become [`ApiError::Status`]; a 401 on an
    /// authenticated call clears the token store before returning.
    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        auth: bool,
    ) -> ApiResult<Value> {
        let bearer = if auth {
            Some(self.bearer_token().await?)
        } else {
            None
        };
        self.execute(method, path, query, body, bearer).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        bearer: Option<String>,
    ) -> ApiResult<Value> {
        let url = self.url(path);
        let request_id = Uuid::now_v7();
        let auth = bearer.is_some();

        let mut request = self
            .inner
            .http
            .request(method.clone(), &url)
            .header(REQUEST_ID_HEADER, request_id.to_string());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let started = Instant::now();
        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, path, request_id = %request_id, error = %e, "request failed");
            ApiError::Network(e.to_string())
        })?;
        let status = response.status();
        tracing::debug!(
            %method,
            path,
            request_id = %request_id,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "api call"
        );

        let text = response.text().await.map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            let err = ApiError::from_status(status.as_u16(), failure_message(status, &text));
            if auth && err.disposition().forces_logout() {
                tracing::info!(path, "backend rejected the session, logging out");
                self.clear_session();
            } else {
                tracing::warn!(path, status = status.as_u16(), error = %err, "api error");
            }
            return Err(err);
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn get_json(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value> {
        self.send_json(Method::GET, path, query, None, true).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> ApiResult<Value> {
        self.send_json(Method::POST, path, &[], Some(body), true).await
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> ApiResult<Value> {
        self.send_json(Method::PUT, path, &[], Some(body), true).await
    }

    pub async fn delete_json(&self, path: &str) -> ApiResult<Value> {
        self.send_json(Method::DELETE, path, &[], None, true).await
    }
}

fn failure_message(status: StatusCode, body: &str) -> String {
    error_message(body)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizdesk_auth::MemoryTokenStore;

    fn client(url: &str) -> HttpClient {
        HttpClient::new(
            &ClientConfig::with_api_url(url),
            Arc::new(MemoryTokenStore::new()),
        )
        .unwrap()
    }

    #[test]
    fn url_joins_paths() {
        let c = client("http://erp.local:8080/");
        assert_eq!(c.url("/api/sales"), "http://erp.local:8080/api/sales");
        assert_eq!(c.url("api/sales"), "http://erp.local:8080/api/sales");
    }

    #[test]
    fn failure_message_falls_back_to_reason_phrase() {
        assert_eq!(failure_message(StatusCode::NOT_FOUND, ""), "Not Found");
        assert_eq!(
            failure_message(StatusCode::BAD_REQUEST, r#"{"message":"dateTo before dateFrom"}"#),
            "dateTo before dateFrom"
        );
    }

    #[tokio::test]
    async fn no_session_means_unauthenticated() {
        let c = client("http://127.0.0.1:9");
        assert_eq!(c.bearer_token().await, Err(ApiError::Unauthenticated));
    }
}
