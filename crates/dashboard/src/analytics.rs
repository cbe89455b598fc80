//! Time series behind the dashboard charts.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use bizdesk_client::envelope::split_list;
use bizdesk_client::{ApiError, ApiResult, DataProvider};
use bizdesk_core::{DateRange, Money};

/// Longest window the analytics endpoint is asked for.
pub const MAX_ANALYTICS_WINDOW_DAYS: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Sales,
    Purchases,
    Expenses,
    Receipts,
    Payments,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Sales,
        Metric::Purchases,
        Metric::Expenses,
        Metric::Receipts,
        Metric::Payments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Sales => "sales",
            Metric::Purchases => "purchases",
            Metric::Expenses => "expenses",
            Metric::Receipts => "receipts",
            Metric::Payments => "payments",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown metric {s:?}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Month,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Month => "month",
        }
    }

    /// Period label of `day` at this granularity (`2024-05-17` / `2024-05`).
    pub fn label(&self, day: NaiveDate) -> String {
        match self {
            Granularity::Day => day.format("%Y-%m-%d").to_string(),
            Granularity::Month => day.format("%Y-%m").to_string(),
        }
    }

    /// Every period label touched by `range`, oldest first.
    pub fn periods(&self, range: DateRange) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for day in range.from.iter_days().take_while(|day| *day <= range.to) {
            let label = self.label(day);
            if labels.last() != Some(&label) {
                labels.push(label);
            }
        }
        labels
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Granularity::Day),
            "month" | "monthly" => Ok(Granularity::Month),
            other => Err(format!("unknown granularity {other:?}")),
        }
    }
}

/// One chart point. `period` is `YYYY-MM-DD` or `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub period: String,
    #[serde(default)]
    pub value: Money,
}

impl SeriesPoint {
    pub fn new(period: impl Into<String>, value: Money) -> Self {
        Self {
            period: period.into(),
            value,
        }
    }

    /// Days covered by the period, or `None` when the label is not a date.
    pub fn span(&self) -> Option<DateRange> {
        let label = self.period.trim();
        if let Ok(day) = NaiveDate::parse_from_str(label, "%Y-%m-%d") {
            return Some(DateRange::single_day(day));
        }
        let first = NaiveDate::parse_from_str(&format!("{label}-01"), "%Y-%m-%d").ok()?;
        let next = if first.month() == 12 {
            NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)?
        };
        Some(DateRange::new(first, next.pred_opt()?))
    }

    fn overlaps(&self, range: &DateRange) -> bool {
        self.span()
            .is_some_and(|span| span.from <= range.to && range.from <= span.to)
    }
}

/// A fetched series together with the window it was fetched for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSeries {
    pub metric: Metric,
    pub granularity: Granularity,
    pub range: DateRange,
    pub points: Vec<SeriesPoint>,
}

impl AnalyticsSeries {
    pub fn total(&self) -> Money {
        self.points.iter().map(|p| p.value).sum()
    }
}

/// Sum points into `granularity` buckets, sorted by period. Points whose
/// label is not a date are dropped.
pub fn group_by_period(points: &[SeriesPoint], granularity: Granularity) -> Vec<SeriesPoint> {
    let mut buckets: BTreeMap<String, Money> = BTreeMap::new();
    for point in points {
        let Some(span) = point.span() else {
            continue;
        };
        *buckets.entry(granularity.label(span.from)).or_default() += point.value;
    }
    buckets
        .into_iter()
        .map(|(period, value)| SeriesPoint { period, value })
        .collect()
}

/// Fetch one metric's series.
///
/// The window is clamped to [`MAX_ANALYTICS_WINDOW_DAYS`] ending no later
/// than `today`. Points outside the clamped window are dropped and the rest
/// sorted by period.
pub async fn load_analytics<P>(
    provider: &P,
    metric: Metric,
    range: DateRange,
    granularity: Granularity,
    today: NaiveDate,
) -> ApiResult<AnalyticsSeries>
where
    P: DataProvider + ?Sized,
{
    let clamped = range.clamp(MAX_ANALYTICS_WINDOW_DAYS, today);
    if clamped != range {
        tracing::debug!(%metric, from = %clamped.from, to = %clamped.to, "analytics window clamped");
    }
    let (from, to) = clamped.wire_bounds();
    let query = vec![
        ("from".to_string(), from),
        ("to".to_string(), to),
        ("granularity".to_string(), granularity.as_str().to_string()),
    ];
    let body = provider
        .custom_get(&format!("/api/dashboard/analytics/{metric}"), &query)
        .await?;

    let (rows, _) = split_list(body)?;
    let mut points = rows
        .into_iter()
        .map(serde_json::from_value::<SeriesPoint>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    points.retain(|p| p.overlaps(&clamped));
    points.sort_by(|a, b| a.period.cmp(&b.period));

    Ok(AnalyticsSeries {
        metric,
        granularity,
        range: clamped,
        points,
    })
}
