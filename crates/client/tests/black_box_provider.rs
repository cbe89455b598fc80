use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

use bizdesk_auth::{ErrorDisposition, MemoryTokenStore, Session, TokenStore};
use bizdesk_client::{
    ApiError, AuthProvider, ClientConfig, DataProvider, HttpClient, ListParams, ResourceProvider,
    RestDataProvider, Sort,
};
use bizdesk_core::RecordId;
use bizdesk_resources::{Filter, Supplier};

#[derive(Debug, Clone)]
struct Seen {
    path: String,
    query: Vec<(String, String)>,
    auth: Option<String>,
}

#[derive(Clone, Default)]
struct Backend {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Backend {
    fn record(&self, path: String, query: Vec<(String, String)>, headers: &HeaderMap) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.seen.lock().unwrap().push(Seen { path, query, auth });
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

fn mint(sub: &str, ttl_secs: i64) -> String {
    let claims = json!({
        "sub": sub,
        "exp": Utc::now().timestamp() + ttl_secs,
        "roles": ["ADMIN"],
    });
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"stub-secret"),
    )
    .expect("failed to encode jwt")
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] == "secret" {
        Json(json!({
            "accessToken": mint("maria", 3600),
            "refreshToken": "r1",
            "user": {"id": 7, "username": body["username"], "fullName": "Maria Lopez", "roles": ["ADMIN"]},
        }))
        .into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"message": "Bad credentials"}))).into_response()
    }
}

async fn refresh(Json(body): Json<Value>) -> Response {
    if body["refreshToken"] == "r1" {
        Json(json!({"token": mint("fresh", 3600)})).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"message": "refresh token expired"}))).into_response()
    }
}

async fn suppliers(
    State(backend): State<Backend>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Json<Value> {
    backend.record("/api/suppliers".into(), query, &headers);
    Json(json!({
        "data": {"content": [{"id": 1, "name": "Acme"}], "totalElements": 42}
    }))
}

async fn suppliers_search(
    State(backend): State<Backend>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Json<Value> {
    backend.record("/api/suppliers/search".into(), query, &headers);
    Json(json!({"data": [{"id": 2, "name": "Acme Search"}], "total": 1}))
}

async fn employees() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"message": "token revoked"}))).into_response()
}

async fn users() -> Response {
    (StatusCode::FORBIDDEN, Json(json!({"error": "Forbidden"}))).into_response()
}

async fn create_expense(Json(mut body): Json<Value>) -> Json<Value> {
    body["id"] = json!(9);
    Json(json!({"data": body}))
}

async fn delete_order(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    backend.record(format!("/api/orders/{id}"), Vec::new(), &headers);
    StatusCode::NO_CONTENT
}

struct TestServer {
    base_url: String,
    backend: Backend,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let backend = Backend::default();
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/refresh", post(refresh))
            .route("/api/suppliers", get(suppliers))
            .route("/api/suppliers/search", get(suppliers_search))
            .route("/api/employees", get(employees))
            .route("/api/users", get(users))
            .route("/api/expenses", post(create_expense))
            .route("/api/orders/:id", delete(delete_order))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            backend,
            handle,
        }
    }

    fn client(&self, store: Arc<MemoryTokenStore>) -> HttpClient {
        HttpClient::new(&ClientConfig::with_api_url(&self.base_url), store).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn signed_in(ttl_secs: i64) -> Arc<MemoryTokenStore> {
    let session = Session::from_tokens(mint("maria", ttl_secs), Some("r1".to_string()), None);
    Arc::new(MemoryTokenStore::with_session(session))
}

#[tokio::test]
async fn list_sends_wire_params_and_unwraps_page() {
    let srv = TestServer::spawn().await;
    let store = signed_in(3600);
    let token = store.load().unwrap().unwrap().access_token;
    let provider = RestDataProvider::new(srv.client(store));

    let params = ListParams::new()
        .page(2, 10)
        .sort(Sort::asc("name"))
        .filter(Filter::new().with("active", "true"));
    let page = provider.list::<Supplier>(&params).await.unwrap();

    assert_eq!(page.total, 42);
    assert_eq!(page.data[0].name, "Acme");

    let seen = srv.backend.seen();
    assert_eq!(seen.len(), 1);
    let pairs: Vec<(&str, &str)> = seen[0]
        .query
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("page", "1"), ("size", "10"), ("sort", "name,asc"), ("active", "true")]
    );
    assert_eq!(seen[0].auth, Some(format!("Bearer {token}")));
}

#[tokio::test]
async fn search_text_hits_search_endpoint() {
    let srv = TestServer::spawn().await;
    let provider = RestDataProvider::new(srv.client(signed_in(3600)));

    let params = ListParams::new().filter(Filter::new().search("acme"));
    let page = provider.list::<Supplier>(&params).await.unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].name, "Acme Search");
    let seen = srv.backend.seen();
    assert_eq!(seen[0].path, "/api/suppliers/search");
    assert!(seen[0].query.contains(&("q".to_string(), "acme".to_string())));
}

#[tokio::test]
async fn unauthorized_response_ends_the_session() {
    let srv = TestServer::spawn().await;
    let store = signed_in(3600);
    let provider = RestDataProvider::new(srv.client(store.clone()));

    let err = provider
        .get_list("employees", &ListParams::new())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(
        err.disposition(),
        ErrorDisposition::Logout {
            redirect_to: "/login".to_string()
        }
    );
    assert!(store.load().unwrap().is_none());

    // Nothing left to authenticate with.
    let err = provider.get_list("suppliers", &ListParams::new()).await.unwrap_err();
    assert_eq!(err, ApiError::Unauthenticated);
}

#[tokio::test]
async fn forbidden_response_keeps_the_session() {
    let srv = TestServer::spawn().await;
    let store = signed_in(3600);
    let provider = RestDataProvider::new(srv.client(store.clone()));

    let err = provider.get_list("users", &ListParams::new()).await.unwrap_err();

    assert_eq!(err.disposition(), ErrorDisposition::PermissionDenied);
    assert!(matches!(&err, ApiError::Status { message, .. } if message == "Forbidden"));
    assert!(store.load().unwrap().is_some());
}

#[tokio::test]
async fn login_stores_tokens_and_identity() {
    let srv = TestServer::spawn().await;
    let store = Arc::new(MemoryTokenStore::new());
    let auth = AuthProvider::new(srv.client(store.clone()));

    let err = auth.login("maria", "wrong").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(matches!(&err, ApiError::Status { message, .. } if message == "Bad credentials"));

    let session = auth.login("maria", "secret").await.unwrap();
    assert!(session.expires_at.is_some());
    assert_eq!(session.refresh_token.as_deref(), Some("r1"));
    assert_eq!(store.load().unwrap(), Some(session));

    let identity = auth.get_identity().await.unwrap();
    assert_eq!(identity.display_name(), "Maria Lopez");
    assert!(auth.check_auth().await.is_ok());

    assert_eq!(auth.logout().await, "/login");
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn token_close_to_expiry_is_refreshed_before_the_call() {
    let srv = TestServer::spawn().await;
    let store = signed_in(30);
    let stale = store.load().unwrap().unwrap().access_token;
    let provider = RestDataProvider::new(srv.client(store.clone()));

    provider.get_list("suppliers", &ListParams::new()).await.unwrap();

    let current = store.load().unwrap().unwrap();
    assert_ne!(current.access_token, stale);
    assert_eq!(current.refresh_token.as_deref(), Some("r1"));
    assert_eq!(
        srv.backend.seen()[0].auth,
        Some(format!("Bearer {}", current.access_token))
    );
}

#[tokio::test]
async fn create_unwraps_data_and_delete_many_goes_one_by_one() {
    let srv = TestServer::spawn().await;
    let provider = RestDataProvider::new(srv.client(signed_in(3600)));

    let created = provider
        .create("expenses", &json!({"category": "Rent", "amount": 1200.0}))
        .await
        .unwrap();
    assert_eq!(created["id"], json!(9));
    assert_eq!(created["category"], json!("Rent"));

    let ids = vec![RecordId::from(1), RecordId::from(2)];
    let deleted = provider.delete_many("orders", &ids).await.unwrap();
    assert_eq!(deleted, ids);

    let paths: Vec<String> = srv.backend.seen().into_iter().map(|s| s.path).collect();
    assert_eq!(paths, vec!["/api/orders/1", "/api/orders/2"]);
}
