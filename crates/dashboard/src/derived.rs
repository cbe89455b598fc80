//! Chart-ready data derived from the fetched series.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use bizdesk_client::{ApiResult, DataProvider, ListParams, ResourceProvider};
use bizdesk_core::{DateRange, Money, Percentage};
use bizdesk_resources::{Expense, Filter};

use crate::analytics::{
    AnalyticsSeries, Granularity, Metric, SeriesPoint, group_by_period, load_analytics,
};

/// Expense categories shown on the breakdown chart.
pub const TOP_EXPENSE_CATEGORIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    pub period: String,
    pub sales: Money,
    pub purchases: Money,
    pub expenses: Money,
    pub profit: Money,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub sales: Money,
    pub purchases: Money,
    pub expenses: Money,
    pub profit: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category: String,
    pub amount: Money,
    pub share: Option<Percentage>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedData {
    pub rows: Vec<ChartRow>,
    pub totals: Totals,
    /// Per-period averages over `rows`.
    pub averages: Totals,
    /// Period with the highest profit.
    pub best_period: Option<String>,
    /// Sales of the last period against the one before it.
    pub sales_growth: Option<Percentage>,
    pub profit_margin: Option<Percentage>,
    pub top_expense_categories: Vec<CategoryShare>,
}

impl DerivedData {
    /// Merge the three series into one row per period (missing periods count
    /// as zero) and reduce them.
    pub fn derive(
        sales: &[SeriesPoint],
        purchases: &[SeriesPoint],
        expenses: &[SeriesPoint],
        expense_records: &[Expense],
    ) -> Self {
        Self::derive_over(&[], sales, purchases, expenses, expense_records)
    }

    /// Like [`derive`](Self::derive), with a zero row for each of `periods`
    /// that no series covers.
    pub fn derive_over(
        periods: &[String],
        sales: &[SeriesPoint],
        purchases: &[SeriesPoint],
        expenses: &[SeriesPoint],
        expense_records: &[Expense],
    ) -> Self {
        let mut by_period: BTreeMap<&str, ChartRow> = periods
            .iter()
            .map(|period| (period.as_str(), empty_row(period)))
            .collect();
        for p in sales {
            by_period.entry(p.period.as_str()).or_insert_with(|| empty_row(&p.period)).sales += p.value;
        }
        for p in purchases {
            by_period.entry(p.period.as_str()).or_insert_with(|| empty_row(&p.period)).purchases += p.value;
        }
        for p in expenses {
            by_period.entry(p.period.as_str()).or_insert_with(|| empty_row(&p.period)).expenses += p.value;
        }

        let rows: Vec<ChartRow> = by_period
            .into_values()
            .map(|mut r| {
                r.profit = r.sales - r.purchases - r.expenses;
                r
            })
            .collect();

        let totals = Totals {
            sales: rows.iter().map(|r| r.sales).sum(),
            purchases: rows.iter().map(|r| r.purchases).sum(),
            expenses: rows.iter().map(|r| r.expenses).sum(),
            profit: rows.iter().map(|r| r.profit).sum(),
        };
        let averages = average(&totals, rows.len());

        let best_period = rows
            .iter()
            .max_by_key(|r| r.profit)
            .map(|r| r.period.clone());
        let sales_growth = match rows.as_slice() {
            [.., previous, last] => Percentage::change_money(previous.sales, last.sales),
            _ => None,
        };

        Self {
            profit_margin: Percentage::of(totals.profit, totals.sales),
            top_expense_categories: top_categories(expense_records, TOP_EXPENSE_CATEGORIES),
            rows,
            totals,
            averages,
            best_period,
            sales_growth,
        }
    }

    /// Regroup each series to `granularity` and derive one row for every
    /// period of the sales window.
    pub fn from_series(
        sales: &AnalyticsSeries,
        purchases: &AnalyticsSeries,
        expenses: &AnalyticsSeries,
        expense_records: &[Expense],
        granularity: Granularity,
    ) -> Self {
        Self::derive_over(
            &granularity.periods(sales.range),
            &group_by_period(&sales.points, granularity),
            &group_by_period(&purchases.points, granularity),
            &group_by_period(&expenses.points, granularity),
            expense_records,
        )
    }
}

/// Fetch the sales, purchases and expenses series plus the expense records
/// for `range`, then derive the chart data.
pub async fn load_derived<P>(
    provider: &P,
    range: DateRange,
    granularity: Granularity,
    today: NaiveDate,
) -> ApiResult<DerivedData>
where
    P: DataProvider + ?Sized,
{
    let clamped = range.clamp(crate::analytics::MAX_ANALYTICS_WINDOW_DAYS, today);
    let expense_params = ListParams::new().filter(Filter::new().with_range(clamped));
    let (sales, purchases, expenses, expense_records) = tokio::try_join!(
        load_analytics(provider, Metric::Sales, range, granularity, today),
        load_analytics(provider, Metric::Purchases, range, granularity, today),
        load_analytics(provider, Metric::Expenses, range, granularity, today),
        provider.list_all::<Expense>(&expense_params),
    )?;
    Ok(DerivedData::from_series(
        &sales,
        &purchases,
        &expenses,
        &expense_records,
        granularity,
    ))
}

fn empty_row(period: &str) -> ChartRow {
    ChartRow {
        period: period.to_string(),
        ..ChartRow::default()
    }
}

fn average(totals: &Totals, periods: usize) -> Totals {
    if periods == 0 {
        return Totals::default();
    }
    let n = periods as i64;
    let per = |m: Money| Money::from_minor(m.minor() / n);
    Totals {
        sales: per(totals.sales),
        purchases: per(totals.purchases),
        expenses: per(totals.expenses),
        profit: per(totals.profit),
    }
}

/// Largest expense categories, biggest first; ties broken by name.
pub fn top_categories(expenses: &[Expense], n: usize) -> Vec<CategoryShare> {
    let mut sums: HashMap<String, Money> = HashMap::new();
    for e in expenses {
        let category = match e.category.trim() {
            "" => "Uncategorized".to_string(),
            c => c.to_string(),
        };
        *sums.entry(category).or_default() += e.amount;
    }
    let total: Money = sums.values().copied().sum();

    let mut ranked: Vec<(String, Money)> = sums.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(n)
        .map(|(category, amount)| CategoryShare {
            share: Percentage::of(amount, total),
            category,
            amount,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizdesk_client::fixture::FixtureProvider;
    use serde_json::json;

    fn pts(values: &[(&str, i64)]) -> Vec<SeriesPoint> {
        values
            .iter()
            .map(|(p, v)| SeriesPoint::new(*p, Money::from_major(*v)))
            .collect()
    }

    fn expense(category: &str, amount: i64) -> Expense {
        Expense {
            id: None,
            category: category.to_string(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            amount: Money::from_major(amount),
            paid_to: None,
        }
    }

    #[test]
    fn merges_periods_and_fills_gaps() {
        let data = DerivedData::derive(
            &pts(&[("2024-01", 100), ("2024-03", 300)]),
            &pts(&[("2024-02", 50)]),
            &pts(&[("2024-01", 10), ("2024-03", 20)]),
            &[],
        );
        let periods: Vec<&str> = data.rows.iter().map(|r| r.period.as_str()).collect();
        assert_eq!(periods, ["2024-01", "2024-02", "2024-03"]);
        assert_eq!(data.rows[1].sales, Money::ZERO);
        assert_eq!(data.rows[1].profit, Money::from_major(-50));
        assert_eq!(data.totals.profit, Money::from_major(320));
        assert_eq!(data.best_period.as_deref(), Some("2024-03"));
    }

    #[test]
    fn periods_no_series_covers_still_get_a_row() {
        let periods: Vec<String> = ["2024-01", "2024-02", "2024-03"].map(String::from).to_vec();
        let data = DerivedData::derive_over(
            &periods,
            &pts(&[("2024-01", 100), ("2024-03", 300)]),
            &[],
            &[],
            &[],
        );
        let labels: Vec<&str> = data.rows.iter().map(|r| r.period.as_str()).collect();
        assert_eq!(labels, ["2024-01", "2024-02", "2024-03"]);
        assert_eq!(data.rows[1], empty_row("2024-02"));
        assert_eq!(data.averages.sales, Money::from_minor(13_333));
        // growth compares adjacent periods: February had no sales
        assert_eq!(data.sales_growth, None);
    }

    #[test]
    fn growth_and_averages() {
        let data = DerivedData::derive(&pts(&[("2024-01", 200), ("2024-02", 250)]), &[], &[], &[]);
        assert_eq!(data.sales_growth, Some(Percentage::new(25.0)));
        assert_eq!(data.averages.sales, Money::from_major(225));
        assert_eq!(data.profit_margin, Some(Percentage::new(100.0)));

        let single = DerivedData::derive(&pts(&[("2024-01", 200)]), &[], &[], &[]);
        assert_eq!(single.sales_growth, None);
    }

    #[test]
    fn empty_input_derives_nothing() {
        let data = DerivedData::derive(&[], &[], &[], &[]);
        assert!(data.rows.is_empty());
        assert_eq!(data.best_period, None);
        assert_eq!(data.profit_margin, None);
    }

    #[test]
    fn top_categories_rank_and_share() {
        let expenses = [
            expense("Rent", 500),
            expense("Travel", 100),
            expense("Rent", 100),
            expense(" ", 200),
            expense("Utilities", 100),
        ];
        let top = top_categories(&expenses, 3);
        let names: Vec<&str> = top.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, ["Rent", "Uncategorized", "Travel"]);
        assert_eq!(top[0].amount, Money::from_major(600));
        assert_eq!(top[0].share, Some(Percentage::new(60.0)));
    }

    #[tokio::test]
    async fn load_derived_combines_series_and_records() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let provider = FixtureProvider::new()
            .with_endpoint(
                "/api/dashboard/analytics/sales",
                Ok(json!([{"period": "2024-03-01", "value": 100}, {"period": "2024-03-02", "value": 50}])),
            )
            .with_endpoint(
                "/api/dashboard/analytics/purchases",
                Ok(json!([{"period": "2024-03-01", "value": 40}])),
            )
            .with_endpoint("/api/dashboard/analytics/expenses", Ok(json!([])))
            .with_rows("expenses", &[expense("Rent", 30)]);

        let data = load_derived(
            &provider,
            DateRange::month_to_date(today),
            Granularity::Month,
            today,
        )
        .await
        .unwrap();

        assert_eq!(data.rows.len(), 1);
        assert_eq!(data.rows[0].period, "2024-03");
        assert_eq!(data.totals.profit, Money::from_major(110));
        assert_eq!(data.top_expense_categories[0].category, "Rent");
    }

    #[tokio::test]
    async fn load_derived_fills_empty_months_of_the_window() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let provider = FixtureProvider::new()
            .with_endpoint(
                "/api/dashboard/analytics/sales",
                Ok(json!([{"period": "2024-01-10", "value": 100}, {"period": "2024-03-05", "value": 300}])),
            )
            .with_endpoint("/api/dashboard/analytics/purchases", Ok(json!([])))
            .with_endpoint("/api/dashboard/analytics/expenses", Ok(json!([])))
            .with_rows("expenses", &Vec::<Expense>::new());

        let range = DateRange::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), today);
        let data = load_derived(&provider, range, Granularity::Month, today)
            .await
            .unwrap();

        let labels: Vec<&str> = data.rows.iter().map(|r| r.period.as_str()).collect();
        assert_eq!(labels, ["2024-01", "2024-02", "2024-03"]);
        assert_eq!(data.rows[1].sales, Money::ZERO);
        assert_eq!(data.sales_growth, None);
        assert_eq!(data.best_period.as_deref(), Some("2024-03"));
    }
}
