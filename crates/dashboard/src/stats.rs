//! Headline numbers for the dashboard cards.

use serde::Serialize;

use bizdesk_client::{ApiResult, DataProvider, ListParams, ResourceProvider};
use bizdesk_core::{DateRange, Money, Percentage};
use bizdesk_resources::{
    Employee, Expense, Filter, Order, OrderStatus, Payment, Purchase, Receipt, Resource, Sale,
    Supplier,
};

/// Records a stats computation reduces over.
#[derive(Debug, Clone, Default)]
pub struct StatsInput {
    pub sales: Vec<Sale>,
    pub purchases: Vec<Purchase>,
    pub expenses: Vec<Expense>,
    pub payments: Vec<Payment>,
    pub receipts: Vec<Receipt>,
    pub orders: Vec<Order>,
    pub suppliers: Vec<Supplier>,
    pub employee_count: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_sales: Money,
    pub total_purchases: Money,
    pub total_expenses: Money,
    pub total_receipts: Money,
    pub total_payments: Money,
    /// Outstanding customer balances.
    pub receivables: Money,
    /// Outstanding supplier balances.
    pub payables: Money,
    pub net_profit: Money,
    /// Net profit as a share of sales; `None` without sales.
    pub profit_margin: Option<Percentage>,
    pub sales_count: usize,
    pub purchase_count: usize,
    pub order_count: usize,
    pub pending_orders: usize,
    /// Mean value of non-cancelled orders.
    pub average_order_value: Money,
    pub active_suppliers: usize,
    pub employee_count: u64,
}

impl DashboardStats {
    pub fn compute(input: &StatsInput) -> Self {
        let total_sales: Money = input.sales.iter().map(Sale::effective_total).sum();
        let total_purchases: Money = input.purchases.iter().map(Purchase::effective_total).sum();
        let total_expenses: Money = input.expenses.iter().map(|e| e.amount).sum();
        let net_profit = total_sales - total_purchases - total_expenses;

        let billable: Vec<&Order> = input
            .orders
            .iter()
            .filter(|o| o.status != OrderStatus::Cancelled)
            .collect();
        let billable_total: Money = billable.iter().map(|o| o.effective_total()).sum();
        let average_order_value = if billable.is_empty() {
            Money::ZERO
        } else {
            Money::from_minor(billable_total.minor() / billable.len() as i64)
        };

        Self {
            total_sales,
            total_purchases,
            total_expenses,
            total_receipts: input.receipts.iter().map(|r| r.amount).sum(),
            total_payments: input.payments.iter().map(|p| p.amount).sum(),
            receivables: input.sales.iter().map(|s| s.balance().non_negative()).sum(),
            payables: input.purchases.iter().map(|p| p.balance().non_negative()).sum(),
            net_profit,
            profit_margin: Percentage::of(net_profit, total_sales),
            sales_count: input.sales.len(),
            purchase_count: input.purchases.len(),
            order_count: input.orders.len(),
            pending_orders: input.orders.iter().filter(|o| o.status.is_open()).count(),
            average_order_value,
            active_suppliers: input.suppliers.iter().filter(|s| s.active).count(),
            employee_count: input.employee_count,
        }
    }
}

/// Fetch everything the cards need for `range` and reduce it.
///
/// Dated collections are filtered by `dateFrom`/`dateTo`; suppliers and
/// employees are counted across the whole company.
pub async fn load_stats<P>(provider: &P, range: DateRange) -> ApiResult<DashboardStats>
where
    P: DataProvider + ?Sized,
{
    let dated = ListParams::new().filter(Filter::new().with_range(range));
    let everything = ListParams::new();
    let headcount = ListParams::new().page(1, 1);

    let (sales, purchases, expenses, payments, receipts, orders, suppliers, employees) = tokio::try_join!(
        provider.list_all::<Sale>(&dated),
        provider.list_all::<Purchase>(&dated),
        provider.list_all::<Expense>(&dated),
        provider.list_all::<Payment>(&dated),
        provider.list_all::<Receipt>(&dated),
        provider.list_all::<Order>(&dated),
        provider.list_all::<Supplier>(&everything),
        provider.get_list(Employee::NAME, &headcount),
    )?;

    // a page of one only tells the headcount when the backend reports a total
    let employee_count = if employees.total_reported {
        employees.total
    } else {
        provider.list_all::<Employee>(&everything).await?.len() as u64
    };

    let stats = DashboardStats::compute(&StatsInput {
        sales,
        purchases,
        expenses,
        payments,
        receipts,
        orders,
        suppliers,
        employee_count,
    });
    tracing::debug!(
        from = %range.from,
        to = %range.to,
        sales = stats.sales_count,
        purchases = stats.purchase_count,
        "dashboard stats loaded"
    );
    Ok(stats)
}
