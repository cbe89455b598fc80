//! Profit & loss statement for a period.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use bizdesk_client::envelope::parse_one;
use bizdesk_client::{ApiResult, DataProvider, ListParams, ResourceProvider};
use bizdesk_core::{DateRange, Money, Percentage};
use bizdesk_resources::{Expense, Filter, Purchase, Sale};

pub const PROFIT_LOSS_PATH: &str = "/api/reports/profit-loss";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseLine {
    pub category: String,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitAndLoss {
    pub range: DateRange,
    pub revenue: Money,
    pub cost_of_goods: Money,
    pub gross_profit: Money,
    #[serde(default)]
    pub gross_margin: Option<Percentage>,
    /// Largest category first.
    #[serde(default)]
    pub expenses: Vec<ExpenseLine>,
    pub total_expenses: Money,
    pub net_profit: Money,
    #[serde(default)]
    pub net_margin: Option<Percentage>,
}

impl ProfitAndLoss {
    /// Records dated outside `range` are ignored.
    pub fn compute(range: DateRange, sales: &[Sale], purchases: &[Purchase], expenses: &[Expense]) -> Self {
        let revenue: Money = sales
            .iter()
            .filter(|s| range.contains(s.date))
            .map(Sale::effective_total)
            .sum();
        let cost_of_goods: Money = purchases
            .iter()
            .filter(|p| range.contains(p.date))
            .map(Purchase::effective_total)
            .sum();

        let mut by_category: BTreeMap<String, Money> = BTreeMap::new();
        for e in expenses.iter().filter(|e| range.contains(e.date)) {
            let category = match e.category.trim() {
                "" => "Uncategorized",
                c => c,
            };
            *by_category.entry(category.to_string()).or_default() += e.amount;
        }
        let mut lines: Vec<ExpenseLine> = by_category
            .into_iter()
            .map(|(category, amount)| ExpenseLine { category, amount })
            .collect();
        // stable sort keeps names alphabetical within equal amounts
        lines.sort_by(|a, b| b.amount.cmp(&a.amount));

        let total_expenses: Money = lines.iter().map(|l| l.amount).sum();
        let gross_profit = revenue - cost_of_goods;
        let net_profit = gross_profit - total_expenses;

        Self {
            range,
            revenue,
            cost_of_goods,
            gross_profit,
            gross_margin: Percentage::of(gross_profit, revenue),
            expenses: lines,
            total_expenses,
            net_profit,
            net_margin: Percentage::of(net_profit, revenue),
        }
    }
}

/// P&L for `range`: the backend statement when available, otherwise
/// computed from the period's sales, purchases and expenses.
pub async fn load_profit_and_loss<P>(provider: &P, range: DateRange) -> ApiResult<ProfitAndLoss>
where
    P: DataProvider + ?Sized,
{
    let (from, to) = range.wire_bounds();
    let query = vec![("from".to_string(), from), ("to".to_string(), to)];
    match provider.custom_get(PROFIT_LOSS_PATH, &query).await {
        Ok(body) => parse_one(body),
        Err(err) if err.is_not_found() => {
            tracing::info!(from = %range.from, to = %range.to, "profit-loss endpoint unavailable, computing locally");
            let dated = ListParams::new().filter(Filter::new().with_range(range));
            let sales = provider.list_all::<Sale>(&dated).await?;
            let purchases = provider.list_all::<Purchase>(&dated).await?;
            let expenses = provider.list_all::<Expense>(&dated).await?;
            Ok(ProfitAndLoss::compute(range, &sales, &purchases, &expenses))
        }
        Err(err) => Err(err),
    }
}
