//! List query cache with loading/error/void flags and staleness.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use bizdesk_core::RecordId;

use crate::data_provider::{DataProvider, ListResult};
use crate::error::ApiResult;
use crate::query::ListParams;

/// `(resource, rendered query)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub resource: String,
    pub params: String,
}

impl QueryKey {
    pub fn new(resource: &str, params: &ListParams) -> Self {
        let rendered = params
            .query_pairs()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        Self {
            resource: resource.to_string(),
            params: format!("{}?{rendered}", params.list_path(resource)),
        }
    }
}

/// What a list screen renders from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum QueryState {
    #[default]
    Idle,
    Loading,
    Ready(ListResult<Value>),
    Failed(crate::error::ApiError),
}

impl QueryState {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryState::Failed(_))
    }

    /// Loaded, but nothing to show (the "empty list" screen).
    pub fn is_void(&self) -> bool {
        matches!(self, QueryState::Ready(page) if page.is_empty())
    }

    pub fn data(&self) -> Option<&ListResult<Value>> {
        match self {
            QueryState::Ready(page) => Some(page),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Entry {
    state: QueryState,
    updated_at: Instant,
}

#[derive(Debug)]
pub struct QueryCache {
    stale_after: Duration,
    entries: Mutex<HashMap<QueryKey, Entry>>,
}

impl QueryCache {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self, key: &QueryKey) -> QueryState {
        self.entries()
            .get(key)
            .map(|e| e.state.clone())
            .unwrap_or_default()
    }

    pub fn set(&self, key: QueryKey, state: QueryState) {
        self.set_at(key, state, Instant::now());
    }

    pub fn set_at(&self, key: QueryKey, state: QueryState, now: Instant) {
        self.entries().insert(
            key,
            Entry {
                state,
                updated_at: now,
            },
        );
    }

    /// Data that is still fresh at `now`.
    pub fn fresh(&self, key: &QueryKey, now: Instant) -> Option<ListResult<Value>> {
        let entries = self.entries();
        let entry = entries.get(key)?;
        match &entry.state {
            QueryState::Ready(page) if now.duration_since(entry.updated_at) < self.stale_after => {
                Some(page.clone())
            }
            _ => None,
        }
    }

    /// Missing entries count as stale.
    pub fn is_stale(&self, key: &QueryKey, now: Instant) -> bool {
        self.fresh(key, now).is_none()
    }

    /// Drop every cached query of `resource`.
    pub fn invalidate(&self, resource: &str) {
        self.entries().retain(|key, _| key.resource != resource);
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`DataProvider`] decorator that serves fresh list results from a
/// [`QueryCache`] and invalidates a resource on every mutation.
#[derive(Debug)]
pub struct CachedProvider<P> {
    inner: P,
    cache: QueryCache,
}

impl<P: DataProvider> CachedProvider<P> {
    pub fn new(inner: P, stale_after: Duration) -> Self {
        Self {
            inner,
            cache: QueryCache::new(stale_after),
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: DataProvider> DataProvider for CachedProvider<P> {
    async fn get_list(&self, resource: &str, params: &ListParams) -> ApiResult<ListResult<Value>> {
        let key = QueryKey::new(resource, params);
        if let Some(page) = self.cache.fresh(&key, Instant::now()) {
            tracing::trace!(resource, "list served from cache");
            return Ok(page);
        }
        self.cache.set(key.clone(), QueryState::Loading);
        match self.inner.get_list(resource, params).await {
            Ok(page) => {
                self.cache.set(key, QueryState::Ready(page.clone()));
                Ok(page)
            }
            Err(err) => {
                self.cache.set(key, QueryState::Failed(err.clone()));
                Err(err)
            }
        }
    }

    async fn get_one(&self, resource: &str, id: &RecordId) -> ApiResult<Value> {
        self.inner.get_one(resource, id).await
    }

    async fn get_many(&self, resource: &str, ids: &[RecordId]) -> ApiResult<Vec<Value>> {
        self.inner.get_many(resource, ids).await
    }

    async fn get_many_reference(
        &self,
        resource: &str,
        target: &str,
        id: &RecordId,
        params: &ListParams,
    ) -> ApiResult<ListResult<Value>> {
        let mut params = params.clone();
        params.filter.set(target, id);
        self.get_list(resource, &params).await
    }

    async fn create(&self, resource: &str, data: &Value) -> ApiResult<Value> {
        let created = self.inner.create(resource, data).await;
        self.cache.invalidate(resource);
        created
    }

    async fn update(&self, resource: &str, id: &RecordId, data: &Value) -> ApiResult<Value> {
        let updated = self.inner.update(resource, id, data).await;
        self.cache.invalidate(resource);
        updated
    }

    async fn update_many(
        &self,
        resource: &str,
        ids: &[RecordId],
        data: &Value,
    ) -> ApiResult<Vec<RecordId>> {
        let updated = self.inner.update_many(resource, ids, data).await;
        self.cache.invalidate(resource);
        updated
    }

    async fn delete(&self, resource: &str, id: &RecordId) -> ApiResult<Value> {
        let deleted = self.inner.delete(resource, id).await;
        self.cache.invalidate(resource);
        deleted
    }

    async fn delete_many(&self, resource: &str, ids: &[RecordId]) -> ApiResult<Vec<RecordId>> {
        let deleted = self.inner.delete_many(resource, ids).await;
        self.cache.invalidate(resource);
        deleted
    }

    async fn custom_get(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value> {
        self.inner.custom_get(path, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use bizdesk_resources::Filter;

    use crate::error::ApiError;

    #[derive(Default)]
    struct CountingProvider {
        lists: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl DataProvider for CountingProvider {
        async fn get_list(&self, _: &str, _: &ListParams) -> ApiResult<ListResult<Value>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::from_status(500, "boom"));
            }
            Ok(ListResult::new(vec![json!({"id": 1})], 1))
        }
        async fn get_one(&self, _: &str, _: &RecordId) -> ApiResult<Value> {
            Ok(Value::Null)
        }
        async fn get_many(&self, _: &str, _: &[RecordId]) -> ApiResult<Vec<Value>> {
            Ok(Vec::new())
        }
        async fn get_many_reference(
            &self,
            _: &str,
            _: &str,
            _: &RecordId,
            _: &ListParams,
        ) -> ApiResult<ListResult<Value>> {
            Ok(ListResult::empty())
        }
        async fn create(&self, _: &str, data: &Value) -> ApiResult<Value> {
            Ok(data.clone())
        }
        async fn update(&self, _: &str, _: &RecordId, data: &Value) -> ApiResult<Value> {
            Ok(data.clone())
        }
        async fn update_many(&self, _: &str, ids: &[RecordId], _: &Value) -> ApiResult<Vec<RecordId>> {
            Ok(ids.to_vec())
        }
        async fn delete(&self, _: &str, _: &RecordId) -> ApiResult<Value> {
            Ok(Value::Null)
        }
        async fn delete_many(&self, _: &str, ids: &[RecordId]) -> ApiResult<Vec<RecordId>> {
            Ok(ids.to_vec())
        }
        async fn custom_get(&self, _: &str, _: &[(String, String)]) -> ApiResult<Value> {
            Ok(Value::Null)
        }
    }

    #[tokio::test]
    async fn fresh_lists_are_served_from_cache() {
        let provider = CachedProvider::new(CountingProvider::default(), Duration::from_secs(60));
        let params = ListParams::new().page(1, 25);

        provider.get_list("sales", &params).await.unwrap();
        provider.get_list("sales", &params).await.unwrap();
        assert_eq!(provider.inner().lists.load(Ordering::SeqCst), 1);

        // Different params are a different query.
        provider.get_list("sales", &params.clone().page(2, 25)).await.unwrap();
        assert_eq!(provider.inner().lists.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn mutations_invalidate_the_resource() {
        let provider = CachedProvider::new(CountingProvider::default(), Duration::from_secs(60));
        let params = ListParams::new();

        provider.get_list("sales", &params).await.unwrap();
        provider.get_list("orders", &params).await.unwrap();
        provider.create("sales", &json!({"customerName": "Acme"})).await.unwrap();

        assert!(provider.cache().is_stale(&QueryKey::new("sales", &params), Instant::now()));
        assert!(!provider.cache().is_stale(&QueryKey::new("orders", &params), Instant::now()));
    }

    #[tokio::test]
    async fn failures_are_recorded_and_not_cached() {
        let provider = CachedProvider::new(
            CountingProvider {
                fail: true,
                ..Default::default()
            },
            Duration::from_secs(60),
        );
        let params = ListParams::new();
        assert!(provider.get_list("sales", &params).await.is_err());
        assert!(provider.cache().state(&QueryKey::new("sales", &params)).is_error());
        assert!(provider.get_list("sales", &params).await.is_err());
        assert_eq!(provider.inner().lists.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn entries_go_stale_after_the_window() {
        let cache = QueryCache::new(Duration::from_secs(30));
        let key = QueryKey::new("sales", &ListParams::new());
        let t0 = Instant::now();
        cache.set_at(key.clone(), QueryState::Ready(ListResult::empty()), t0);

        assert!(!cache.is_stale(&key, t0 + Duration::from_secs(29)));
        assert!(cache.is_stale(&key, t0 + Duration::from_secs(30)));
        assert!(cache.state(&key).is_void());
    }

    #[test]
    fn search_and_list_keys_differ() {
        let plain = QueryKey::new("suppliers", &ListParams::new());
        let search = QueryKey::new("suppliers", &ListParams::new().filter(Filter::new().search("acme")));
        assert_ne!(plain, search);
        assert_eq!(QueryState::default(), QueryState::Idle);
    }
}
