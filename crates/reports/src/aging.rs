//! Receivables / payables aging.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizdesk_client::envelope::parse_one;
use bizdesk_client::{ApiResult, DataProvider, ListParams, ResourceProvider};
use bizdesk_core::Money;
use bizdesk_resources::{Purchase, Sale};

pub const AGING_PATH: &str = "/api/reports/aging";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgingKind {
    /// Money customers owe us (open sales).
    Receivables,
    /// Money we owe suppliers (open purchases).
    Payables,
}

impl AgingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgingKind::Receivables => "receivables",
            AgingKind::Payables => "payables",
        }
    }
}

impl fmt::Display for AgingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "receivables" | "receivable" | "ar" => Ok(AgingKind::Receivables),
            "payables" | "payable" | "ap" => Ok(AgingKind::Payables),
            other => Err(format!("unknown aging kind {other:?}")),
        }
    }
}

/// Days-past-due bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgingBucket {
    Current,
    Days1To30,
    Days31To60,
    Days61To90,
    Over90,
}

impl AgingBucket {
    pub const ALL: [AgingBucket; 5] = [
        AgingBucket::Current,
        AgingBucket::Days1To30,
        AgingBucket::Days31To60,
        AgingBucket::Days61To90,
        AgingBucket::Over90,
    ];

    /// Bucket of an item due on `due` as seen on `as_of`. Not yet due and
    /// due today are both current.
    pub fn classify(due: NaiveDate, as_of: NaiveDate) -> Self {
        match (as_of - due).num_days() {
            i64::MIN..=0 => AgingBucket::Current,
            1..=30 => AgingBucket::Days1To30,
            31..=60 => AgingBucket::Days31To60,
            61..=90 => AgingBucket::Days61To90,
            _ => AgingBucket::Over90,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgingBucket::Current => "Current",
            AgingBucket::Days1To30 => "1-30 days",
            AgingBucket::Days31To60 => "31-60 days",
            AgingBucket::Days61To90 => "61-90 days",
            AgingBucket::Over90 => "90+ days",
        }
    }
}

/// Amounts per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BucketAmounts {
    pub current: Money,
    #[serde(rename = "days1To30")]
    pub days_1_to_30: Money,
    #[serde(rename = "days31To60")]
    pub days_31_to_60: Money,
    #[serde(rename = "days61To90")]
    pub days_61_to_90: Money,
    #[serde(rename = "over90")]
    pub over_90: Money,
}

impl BucketAmounts {
    pub fn get(&self, bucket: AgingBucket) -> Money {
        match bucket {
            AgingBucket::Current => self.current,
            AgingBucket::Days1To30 => self.days_1_to_30,
            AgingBucket::Days31To60 => self.days_31_to_60,
            AgingBucket::Days61To90 => self.days_61_to_90,
            AgingBucket::Over90 => self.over_90,
        }
    }

    pub fn add(&mut self, bucket: AgingBucket, amount: Money) {
        let slot = match bucket {
            AgingBucket::Current => &mut self.current,
            AgingBucket::Days1To30 => &mut self.days_1_to_30,
            AgingBucket::Days31To60 => &mut self.days_31_to_60,
            AgingBucket::Days61To90 => &mut self.days_61_to_90,
            AgingBucket::Over90 => &mut self.over_90,
        };
        *slot += amount;
    }

    pub fn total(&self) -> Money {
        AgingBucket::ALL.iter().map(|b| self.get(*b)).sum()
    }

    /// Everything past due.
    pub fn overdue(&self) -> Money {
        self.total() - self.current
    }
}

/// One unpaid (or partly paid) document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenItem {
    pub party: String,
    pub reference: String,
    pub due_date: NaiveDate,
    pub balance: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingRow {
    pub party: String,
    pub amounts: BucketAmounts,
    pub total: Money,
    #[serde(default)]
    pub open_items: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingReport {
    pub kind: AgingKind,
    pub as_of: NaiveDate,
    /// One row per party, ordered by name.
    pub rows: Vec<AgingRow>,
    pub totals: BucketAmounts,
    pub grand_total: Money,
}

impl AgingReport {
    pub fn build(kind: AgingKind, items: &[OpenItem], as_of: NaiveDate) -> Self {
        let mut by_party: BTreeMap<&str, AgingRow> = BTreeMap::new();
        let mut totals = BucketAmounts::default();

        for item in items.iter().filter(|i| i.balance.is_positive()) {
            let bucket = AgingBucket::classify(item.due_date, as_of);
            let row = by_party.entry(item.party.as_str()).or_insert_with(|| AgingRow {
                party: item.party.clone(),
                amounts: BucketAmounts::default(),
                total: Money::ZERO,
                open_items: 0,
            });
            row.amounts.add(bucket, item.balance);
            row.total += item.balance;
            row.open_items += 1;
            totals.add(bucket, item.balance);
        }

        Self {
            kind,
            as_of,
            rows: by_party.into_values().collect(),
            grand_total: totals.total(),
            totals,
        }
    }

    pub fn row(&self, party: &str) -> Option<&AgingRow> {
        self.rows.iter().find(|r| r.party == party)
    }
}

pub fn receivable_items(sales: &[Sale]) -> Vec<OpenItem> {
    sales
        .iter()
        .map(|s| OpenItem {
            party: s.customer_name.trim().to_string(),
            reference: s.invoice_number.clone(),
            due_date: s.due_on(),
            balance: s.balance(),
        })
        .collect()
}

pub fn payable_items(purchases: &[Purchase]) -> Vec<OpenItem> {
    purchases
        .iter()
        .map(|p| OpenItem {
            party: supplier_label(p),
            reference: p.invoice_number.clone(),
            due_date: p.due_on(),
            balance: p.balance(),
        })
        .collect()
}

fn supplier_label(purchase: &Purchase) -> String {
    match (purchase.supplier_name.as_deref().map(str::trim), &purchase.supplier_id) {
        (Some(name), _) if !name.is_empty() => name.to_string(),
        (_, Some(id)) => format!("Supplier #{id}"),
        _ => "Unknown supplier".to_string(),
    }
}

/// Aging report as of `as_of`: the backend report when available, otherwise
/// built from every sale or purchase.
pub async fn load_aging<P>(provider: &P, kind: AgingKind, as_of: NaiveDate) -> ApiResult<AgingReport>
where
    P: DataProvider + ?Sized,
{
    let query = vec![
        ("type".to_string(), kind.as_str().to_string()),
        ("asOf".to_string(), as_of.format("%Y-%m-%d").to_string()),
    ];
    match provider.custom_get(AGING_PATH, &query).await {
        Ok(body) => parse_one(body),
        Err(err) if err.is_not_found() => {
            tracing::info!(%kind, %as_of, "aging endpoint unavailable, computing locally");
            let everything = ListParams::new();
            let items = match kind {
                AgingKind::Receivables => receivable_items(&provider.list_all::<Sale>(&everything).await?),
                AgingKind::Payables => payable_items(&provider.list_all::<Purchase>(&everything).await?),
            };
            Ok(AgingReport::build(kind, &items, as_of))
        }
        Err(err) => Err(err),
    }
}
