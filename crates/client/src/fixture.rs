//! In-memory [`DataProvider`] for tests of code built on top of the client.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use bizdesk_core::RecordId;

use crate::data_provider::{DataProvider, ListResult};
use crate::error::{ApiError, ApiResult};
use crate::query::ListParams;

/// Serves canned collections (paged, filters ignored) and canned custom
/// endpoints; anything else is a 404. Every call is recorded.
#[derive(Debug, Default)]
pub struct FixtureProvider {
    collections: HashMap<String, Vec<Value>>,
    endpoints: HashMap<String, ApiResult<Value>>,
    calls: Mutex<Vec<String>>,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows<T: Serialize>(mut self, resource: &str, rows: &[T]) -> Self {
        let rows = rows
            .iter()
            .map(|r| serde_json::to_value(r).unwrap_or(Value::Null))
            .collect();
        self.collections.insert(resource.to_string(), rows);
        self
    }

    pub fn with_endpoint(mut self, path: &str, response: ApiResult<Value>) -> Self {
        self.endpoints.insert(path.to_string(), response);
        self
    }

    /// `"list sales"`, `"get /api/reports/aging?type=receivables"`, ... in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).push(call);
    }

    fn rows(&self, resource: &str) -> ApiResult<&Vec<Value>> {
        self.collections
            .get(resource)
            .ok_or_else(|| ApiError::from_status(404, format!("no such resource {resource}")))
    }
}

fn row_id(row: &Value) -> Option<RecordId> {
    serde_json::from_value(row.get("id")?.clone()).ok()
}

#[async_trait]
impl DataProvider for FixtureProvider {
    async fn get_list(&self, resource: &str, params: &ListParams) -> ApiResult<ListResult<Value>> {
        self.record(format!("list {resource}"));
        let rows = self.rows(resource)?;
        let data = match params.pagination {
            Some(p) => rows
                .iter()
                .skip((p.wire_page() as usize) * p.per_page as usize)
                .take(p.per_page as usize)
                .cloned()
                .collect(),
            None => rows.clone(),
        };
        Ok(ListResult::new(data, rows.len() as u64))
    }

    async fn get_one(&self, resource: &str, id: &RecordId) -> ApiResult<Value> {
        self.record(format!("get {resource}/{id}"));
        self.rows(resource)?
            .iter()
            .find(|row| row_id(row).as_ref() == Some(id))
            .cloned()
            .ok_or_else(|| ApiError::from_status(404, "Not Found"))
    }

    async fn get_many(&self, resource: &str, ids: &[RecordId]) -> ApiResult<Vec<Value>> {
        let mut found = Vec::new();
        for id in ids {
            found.push(self.get_one(resource, id).await?);
        }
        Ok(found)
    }

    async fn get_many_reference(
        &self,
        resource: &str,
        _target: &str,
        _id: &RecordId,
        params: &ListParams,
    ) -> ApiResult<ListResult<Value>> {
        self.get_list(resource, params).await
    }

    async fn create(&self, resource: &str, data: &Value) -> ApiResult<Value> {
        self.record(format!("create {resource}"));
        Ok(data.clone())
    }

    async fn update(&self, resource: &str, id: &RecordId, data: &Value) -> ApiResult<Value> {
        self.record(format!("update {resource}/{id}"));
        Ok(data.clone())
    }

    async fn update_many(
        &self,
        resource: &str,
        ids: &[RecordId],
        data: &Value,
    ) -> ApiResult<Vec<RecordId>> {
        for id in ids {
            self.update(resource, id, data).await?;
        }
        Ok(ids.to_vec())
    }

    async fn delete(&self, resource: &str, id: &RecordId) -> ApiResult<Value> {
        self.record(format!("delete {resource}/{id}"));
        Ok(Value::Null)
    }

    async fn delete_many(&self, resource: &str, ids: &[RecordId]) -> ApiResult<Vec<RecordId>> {
        for id in ids {
            self.delete(resource, id).await?;
        }
        Ok(ids.to_vec())
    }

    async fn custom_get(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value> {
        if query.is_empty() {
            self.record(format!("get {path}"));
        } else {
            let rendered: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
            self.record(format!("get {path}?{}", rendered.join("&")));
        }
        self.endpoints
            .get(path)
            .cloned()
            .unwrap_or_else(|| Err(ApiError::from_status(404, "Not Found")))
    }
}
