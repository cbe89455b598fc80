use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizdesk_core::{DateRange, Money, RecordId, ValidationErrors};

use crate::filter::Filter;
use crate::line_item::{self, LineItem};
use crate::validation;
use crate::{Resource, Validate};

/// Fulfilment state of a customer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Orders still waiting on the business (shown on the dashboard card).
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }
}

/// Customer order, identified to customers by its order number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub order_number: String,
    #[serde(default)]
    pub customer_name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub status: OrderStatus,
    #[serde(default)]
    pub total_amount: Money,
}

impl Order {
    pub fn effective_total(&self) -> Money {
        if self.total_amount.is_zero() {
            line_item::lines_total(&self.items)
        } else {
            self.total_amount
        }
    }
}

impl Resource for Order {
    const NAME: &'static str = "orders";
    const LABEL: &'static str = "Orders";

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Validate for Order {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::required(&mut errors, "orderNumber", &self.order_number);
        validation::max_len(&mut errors, "orderNumber", &self.order_number, 40);
        line_item::validate_lines(&mut errors, &self.items);
        errors
    }
}

/// Order list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub q: Option<String>,
    pub order_number: Option<String>,
    pub status: Option<OrderStatus>,
    pub range: Option<DateRange>,
}

impl From<&OrderFilter> for Filter {
    fn from(f: &OrderFilter) -> Self {
        let mut filter = Filter::new();
        filter
            .set_opt("q", f.q.as_deref())
            .set_opt("orderNumber", f.order_number.as_deref())
            .set_opt("status", f.status.map(|s| s.as_str()))
            .set_range(f.range);
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_statuses() {
        assert!(OrderStatus::Pending.is_open());
        assert!(OrderStatus::Confirmed.is_open());
        assert!(!OrderStatus::Delivered.is_open());
        assert!(!OrderStatus::Cancelled.is_open());
    }

    #[test]
    fn order_number_required() {
        let order = Order {
            id: None,
            order_number: " ".into(),
            customer_name: "Globex".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            items: vec![LineItem::new("Widget", 1.0, Money::from_major(3))],
            status: OrderStatus::Pending,
            total_amount: Money::ZERO,
        };
        assert!(order.validate().has("orderNumber"));
        assert_eq!(order.effective_total(), Money::from_major(3));
    }

    #[test]
    fn unknown_status_fails_to_decode() {
        let err = serde_json::from_str::<Order>(
            r#"{"orderNumber":"O-1","date":"2024-01-01","status":"lost"}"#,
        );
        assert!(err.is_err());
    }
}
