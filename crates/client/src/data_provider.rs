//! Generic CRUD protocol over the REST backend.
//!
//! [`DataProvider`] is object-safe and speaks `serde_json::Value`, so screens
//! and caches can hold a `dyn DataProvider`. [`ResourceProvider`] layers typed
//! access on top for any [`Resource`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use bizdesk_core::RecordId;
use bizdesk_resources::Resource;

use crate::envelope::{parse_list, parse_one, split_list, unwrap_one};
use crate::error::{ApiError, ApiResult};
use crate::http::HttpClient;
use crate::query::ListParams;

/// One page of a list call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    pub data: Vec<T>,
    pub total: u64,
    /// False when the backend sent no total and `total` is the page length.
    #[serde(default)]
    pub total_reported: bool,
}

impl<T> ListResult<T> {
    pub fn new(data: Vec<T>, total: u64) -> Self {
        Self {
            data,
            total,
            total_reported: true,
        }
    }

    /// A page whose response carried no total.
    pub fn unreported(data: Vec<T>) -> Self {
        let total = data.len() as u64;
        Self {
            data,
            total,
            total_reported: false,
        }
    }

    pub fn from_parts(data: Vec<T>, total: Option<u64>) -> Self {
        match total {
            Some(total) => Self::new(data, total),
            None => Self::unreported(data),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    /// Same paging metadata over different rows.
    pub fn map_rows<U>(self, data: Vec<U>) -> ListResult<U> {
        ListResult {
            data,
            total: self.total,
            total_reported: self.total_reported,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn get_list(&self, resource: &str, params: &ListParams) -> ApiResult<ListResult<Value>>;

    async fn get_one(&self, resource: &str, id: &RecordId) -> ApiResult<Value>;

    async fn get_many(&self, resource: &str, ids: &[RecordId]) -> ApiResult<Vec<Value>>;

    /// Records of `resource` whose `target` field references `id`.
    async fn get_many_reference(
        &self,
        resource: &str,
        target: &str,
        id: &RecordId,
        params: &ListParams,
    ) -> ApiResult<ListResult<Value>>;

    async fn create(&self, resource: &str, data: &Value) -> ApiResult<Value>;

    async fn update(&self, resource: &str, id: &RecordId, data: &Value) -> ApiResult<Value>;

    /// Returns the ids that were updated.
    async fn update_many(
        &self,
        resource: &str,
        ids: &[RecordId],
        data: &Value,
    ) -> ApiResult<Vec<RecordId>>;

    async fn delete(&self, resource: &str, id: &RecordId) -> ApiResult<Value>;

    /// Returns the ids that were deleted.
    async fn delete_many(&self, resource: &str, ids: &[RecordId]) -> ApiResult<Vec<RecordId>>;

    /// Non-CRUD read (dashboard and report endpoints).
    async fn custom_get(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value>;
}

/// [`DataProvider`] speaking to `/api/{resource}`.
#[derive(Debug, Clone)]
pub struct RestDataProvider {
    http: HttpClient,
}

impl RestDataProvider {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}

fn record_path(resource: &str, id: &RecordId) -> String {
    match id {
        RecordId::Number(n) => format!("/api/{resource}/{n}"),
        RecordId::Text(s) => format!("/api/{resource}/{}", urlencoding::encode(s)),
    }
}

fn ensure_resource(resource: &str) -> ApiResult<()> {
    if resource.is_empty() || resource.contains('/') {
        return Err(ApiError::Invalid(format!("bad resource name {resource:?}")));
    }
    Ok(())
}

fn join_ids(ids: &[RecordId]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

#[async_trait]
impl DataProvider for RestDataProvider {
    async fn get_list(&self, resource: &str, params: &ListParams) -> ApiResult<ListResult<Value>> {
        ensure_resource(resource)?;
        let body = self
            .http
            .get_json(&params.list_path(resource), &params.query_pairs())
            .await?;
        let (data, total) = split_list(body)?;
        tracing::debug!(resource, rows = data.len(), ?total, "list fetched");
        Ok(ListResult::from_parts(data, total))
    }

    async fn get_one(&self, resource: &str, id: &RecordId) -> ApiResult<Value> {
        ensure_resource(resource)?;
        let body = self.http.get_json(&record_path(resource, id), &[]).await?;
        Ok(unwrap_one(body))
    }

    async fn get_many(&self, resource: &str, ids: &[RecordId]) -> ApiResult<Vec<Value>> {
        ensure_resource(resource)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = vec![("ids".to_string(), join_ids(ids))];
        let body = self.http.get_json(&format!("/api/{resource}"), &query).await?;
        Ok(split_list(body)?.0)
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
        ensure_resource(resource)?;
        let body = self.http.post_json(&format!("/api/{resource}"), data).await?;
        tracing::info!(resource, "record created");
        Ok(unwrap_one(body))
    }

    async fn update(&self, resource: &str, id: &RecordId, data: &Value) -> ApiResult<Value> {
        ensure_resource(resource)?;
        let body = self.http.put_json(&record_path(resource, id), data).await?;
        tracing::info!(resource, %id, "record updated");
        Ok(unwrap_one(body))
    }

    async fn update_many(
        &self,
        resource: &str,
        ids: &[RecordId],
        data: &Value,
    ) -> ApiResult<Vec<RecordId>> {
        let mut done = Vec::with_capacity(ids.len());
        for id in ids {
            self.update(resource, id, data).await?;
            done.push(id.clone());
        }
        Ok(done)
    }

    async fn delete(&self, resource: &str, id: &RecordId) -> ApiResult<Value> {
        ensure_resource(resource)?;
        let body = self.http.delete_json(&record_path(resource, id)).await?;
        tracing::info!(resource, %id, "record deleted");
        Ok(unwrap_one(body))
    }

    async fn delete_many(&self, resource: &str, ids: &[RecordId]) -> ApiResult<Vec<RecordId>> {
        let mut done = Vec::with_capacity(ids.len());
        for id in ids {
            self.delete(resource, id).await?;
            done.push(id.clone());
        }
        Ok(done)
    }

    async fn custom_get(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value> {
        self.http.get_json(path, query).await
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

fn encode<T: Serialize>(record: &T) -> ApiResult<Value> {
    serde_json::to_value(record).map_err(|e| ApiError::Invalid(e.to_string()))
}

/// Typed access to a [`Resource`] through any [`DataProvider`].
#[async_trait]
pub trait ResourceProvider {
    async fn list<R: Resource>(&self, params: &ListParams) -> ApiResult<ListResult<R>>;
    /// Every matching record, paged through in export-sized pages.
    async fn list_all<R: Resource>(&self, params: &ListParams) -> ApiResult<Vec<R>>;
    async fn fetch<R: Resource>(&self, id: &RecordId) -> ApiResult<R>;
    async fn fetch_many<R: Resource>(&self, ids: &[RecordId]) -> ApiResult<Vec<R>>;
    async fn list_referencing<R: Resource>(
        &self,
        target: &str,
        id: &RecordId,
        params: &ListParams,
    ) -> ApiResult<ListResult<R>>;
    async fn insert<R: Resource>(&self, record: &R) -> ApiResult<R>;
    async fn save<R: Resource>(&self, id: &RecordId, record: &R) -> ApiResult<R>;
    async fn remove<R: Resource>(&self, id: &RecordId) -> ApiResult<()>;
}

#[async_trait]
impl<P: DataProvider + ?Sized> ResourceProvider for P {
    async fn list<R: Resource>(&self, params: &ListParams) -> ApiResult<ListResult<R>> {
        let mut page = self.get_list(R::NAME, params).await?;
        let rows = std::mem::take(&mut page.data);
        let (data, _) = parse_list::<R>(Value::Array(rows))?;
        Ok(page.map_rows(data))
    }

    async fn list_all<R: Resource>(&self, params: &ListParams) -> ApiResult<Vec<R>> {
        crate::export::fetch_all(self, R::NAME, params)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    async fn fetch<R: Resource>(&self, id: &RecordId) -> ApiResult<R> {
        parse_one(self.get_one(R::NAME, id).await?)
    }

    async fn fetch_many<R: Resource>(&self, ids: &[RecordId]) -> ApiResult<Vec<R>> {
        self.get_many(R::NAME, ids)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    async fn list_referencing<R: Resource>(
        &self,
        target: &str,
        id: &RecordId,
        params: &ListParams,
    ) -> ApiResult<ListResult<R>> {
        let mut page = self.get_many_reference(R::NAME, target, id, params).await?;
        let data = std::mem::take(&mut page.data)
            .into_iter()
            .map(decode)
            .collect::<ApiResult<Vec<R>>>()?;
        Ok(page.map_rows(data))
    }

    async fn insert<R: Resource>(&self, record: &R) -> ApiResult<R> {
        let body = encode(record)?;
        decode(self.create(R::NAME, &body).await?)
    }

    async fn save<R: Resource>(&self, id: &RecordId, record: &R) -> ApiResult<R> {
        let body = encode(record)?;
        decode(self.update(R::NAME, id, &body).await?)
    }

    async fn remove<R: Resource>(&self, id: &RecordId) -> ApiResult<()> {
        self.delete(R::NAME, id).await.map(|_| ())
    }
}
