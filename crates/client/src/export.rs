//! CSV export of list screens.

use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use bizdesk_core::{CurrencyFormat, Money, format_currency};

use crate::data_provider::DataProvider;
use crate::error::ApiError;
use crate::query::{ListParams, Pagination};

/// Page size used when pulling a whole list for export.
pub const EXPORT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("export io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record is not serializable: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnKind {
    #[default]
    Text,
    Money,
    Date,
}

/// One exported column: header text plus a dot path into the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub header: String,
    pub path: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn text(header: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            path: path.into(),
            kind: ColumnKind::Text,
        }
    }

    pub fn money(header: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: ColumnKind::Money,
            ..Self::text(header, path)
        }
    }

    pub fn date(header: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: ColumnKind::Date,
            ..Self::text(header, path)
        }
    }
}

/// Value at a dot path (`items.0.productName`); numeric segments index arrays.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn flatten_into(value: &Value, prefix: &str, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(child, &path, out);
            }
        }
        // Line items and other nested lists do not fit a flat row.
        Value::Array(_) => {}
        _ => {
            if !prefix.is_empty() && !out.iter().any(|p| p == prefix) {
                out.push(prefix.to_string());
            }
        }
    }
}

/// Columns for every scalar leaf seen across `rows`, in first-seen order.
pub fn default_columns(rows: &[Value]) -> Vec<Column> {
    let mut paths = Vec::new();
    for row in rows {
        flatten_into(row, "", &mut paths);
    }
    paths.into_iter().map(|p| Column::text(p.clone(), p)).collect()
}

fn render_cell(value: Option<&Value>, kind: ColumnKind, currency: &CurrencyFormat) -> String {
    let Some(value) = value else {
        return String::new();
    };
    match (kind, value) {
        (_, Value::Null) => String::new(),
        (ColumnKind::Money, Value::Number(n)) => n
            .as_f64()
            .map(|f| format_currency(Money::from_major_f64(f), currency))
            .unwrap_or_else(|| n.to_string()),
        (ColumnKind::Money, Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(f) => format_currency(Money::from_major_f64(f), currency),
            Err(_) => s.clone(),
        },
        (ColumnKind::Date, Value::String(s)) => {
            let day = s.get(..10).unwrap_or(s);
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|_| s.clone())
        }
        (_, Value::String(s)) => s.clone(),
        (_, Value::Bool(b)) => (if *b { "yes" } else { "no" }).to_string(),
        (_, other) => other.to_string(),
    }
}

/// Write a header row and one row per record. Returns the number of records.
pub fn export_csv<W: Write>(
    records: &[Value],
    columns: &[Column],
    writer: W,
) -> Result<usize, ExportError> {
    export_csv_with(records, columns, &CurrencyFormat::default(), writer)
}

pub fn export_csv_with<W: Write>(
    records: &[Value],
    columns: &[Column],
    currency: &CurrencyFormat,
    writer: W,
) -> Result<usize, ExportError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(columns.iter().map(|c| c.header.as_str()))?;
    for record in records {
        out.write_record(
            columns
                .iter()
                .map(|c| render_cell(lookup(record, &c.path), c.kind, currency)),
        )?;
    }
    out.flush()?;
    Ok(records.len())
}

/// Typed variant of [`export_csv`].
pub fn export_records<R: Serialize, W: Write>(
    records: &[R],
    columns: &[Column],
    writer: W,
) -> Result<usize, ExportError> {
    let rows = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    export_csv(&rows, columns, writer)
}

/// Every row of `resource` matching `params`, paging through the backend
/// `EXPORT_PAGE_SIZE` rows at a time. Sort and filter are kept; the
/// caller's pagination is ignored.
///
/// The walk ends on a short or empty page, or once a backend-reported total
/// is reached.
pub async fn fetch_all<P: DataProvider + ?Sized>(
    provider: &P,
    resource: &str,
    params: &ListParams,
) -> Result<Vec<Value>, ApiError> {
    let mut params = params.clone();
    let mut page = Pagination::new(1, EXPORT_PAGE_SIZE);
    let mut rows = Vec::new();
    loop {
        params.pagination = Some(page);
        let result = provider.get_list(resource, &params).await?;
        let fetched = result.data.len();
        rows.extend(result.data);
        let reached_total = result.total_reported && rows.len() as u64 >= result.total;
        if fetched == 0 || fetched < EXPORT_PAGE_SIZE as usize || reached_total {
            break;
        }
        page = page.next();
    }
    tracing::debug!(resource, rows = rows.len(), "export fetched");
    Ok(rows)
}

/// Fetch the whole list, then write it as CSV (default columns when `columns`
/// is `None`).
pub async fn export_all<P: DataProvider + ?Sized, W: Write>(
    provider: &P,
    resource: &str,
    params: &ListParams,
    columns: Option<&[Column]>,
    writer: W,
) -> Result<usize, ExportError> {
    let rows = fetch_all(provider, resource, params).await?;
    let written = match columns {
        Some(columns) => export_csv(&rows, columns, writer)?,
        None => export_csv(&rows, &default_columns(&rows), writer)?,
    };
    tracing::info!(resource, rows = written, "list exported");
    Ok(written)
}
