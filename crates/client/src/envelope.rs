//! Response envelope normalization.
//!
//! List endpoints answer in one of several shapes depending on the controller:
//!
//! - `{"data": [..], "total": n}`
//! - `{"data": {"content": [..], "totalElements": n}}` (Spring page inside `data`)
//! - `{"content": [..], "totalElements": n}` (bare Spring page)
//! - `[..]` (unpaged)
//!
//! Single-record endpoints return either `{"data": {..}}` or the bare record.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// Rows and total count of a list response, still as JSON.
///
/// The total is `None` when the backend did not report one; a bare array is
/// the whole result set and counts as reported.
pub fn split_list(body: Value) -> ApiResult<(Vec<Value>, Option<u64>)> {
    match body {
        Value::Array(rows) => {
            let total = rows.len() as u64;
            Ok((rows, Some(total)))
        }
        Value::Object(mut map) => {
            if let Some(data) = map.remove("data") {
                match data {
                    Value::Array(rows) => {
                        let total = total_field(map.get("total"));
                        Ok((rows, total))
                    }
                    Value::Object(_) => split_page(data),
                    Value::Null => Ok((Vec::new(), None)),
                    other => Err(shape_error(&other)),
                }
            } else if map.contains_key("content") {
                split_page(Value::Object(map))
            } else {
                Err(ApiError::Decode(
                    "list response has neither `data` nor `content`".to_string(),
                ))
            }
        }
        other => Err(shape_error(&other)),
    }
}

fn split_page(page: Value) -> ApiResult<(Vec<Value>, Option<u64>)> {
    let Value::Object(mut map) = page else {
        return Err(shape_error(&page));
    };
    let rows = match map.remove("content") {
        Some(Value::Array(rows)) => rows,
        Some(Value::Null) | None => Vec::new(),
        Some(other) => return Err(shape_error(&other)),
    };
    let total = total_field(map.get("totalElements"))
        .or_else(|| total_field(map.get("total")));
    Ok((rows, total))
}

fn total_field(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn shape_error(value: &Value) -> ApiError {
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    ApiError::Decode(format!("unexpected list payload: got {kind}"))
}

pub fn parse_list<T: DeserializeOwned>(body: Value) -> ApiResult<(Vec<T>, Option<u64>)> {
    let (rows, total) = split_list(body)?;
    let data = rows
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok((data, total))
}

/// Unwrap `{"data": {..}}` when present.
///
/// A record carrying its own `id` is never unwrapped, even when it has an
/// object-valued `data` field.
pub fn unwrap_one(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        Value::Object(mut map)
            if !map.contains_key("id") && matches!(map.get("data"), Some(Value::Object(_))) =>
        {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

pub fn parse_one<T: DeserializeOwned>(body: Value) -> ApiResult<T> {
    serde_json::from_value(unwrap_one(body)).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Backend error text from an error body (`message`, `error` or `detail`).
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error", "detail"].iter().find_map(|key| {
        let text = value.get(*key).and_then(Value::as_str)?.trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}
