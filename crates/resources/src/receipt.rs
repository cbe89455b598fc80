use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizdesk_core::{DateRange, Money, RecordId, ValidationErrors};

use crate::filter::Filter;
use crate::payment::PaymentMethod;
use crate::validation;
use crate::{Resource, Validate};

/// Incoming money from a customer against a sale or an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    pub date: NaiveDate,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<PaymentMethod>,
}

impl Resource for Receipt {
    const NAME: &'static str = "receipts";
    const LABEL: &'static str = "Receipts";

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Validate for Receipt {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::positive(&mut errors, "amount", self.amount);
        let has_order = self
            .order_number
            .as_deref()
            .is_some_and(|n| !validation::is_blank(n));
        errors.check(
            self.sale_id.is_none() && !has_order,
            "saleId",
            "a sale or an order number is required",
        );
        errors
    }
}

/// Receipt list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiptFilter {
    pub q: Option<String>,
    pub sale_id: Option<RecordId>,
    pub order_number: Option<String>,
    pub range: Option<DateRange>,
}

impl ReceiptFilter {
    pub fn for_order(order_number: impl Into<String>) -> Self {
        Self {
            order_number: Some(order_number.into()),
            ..Self::default()
        }
    }
}

impl From<&ReceiptFilter> for Filter {
    fn from(f: &ReceiptFilter) -> Self {
        let mut filter = Filter::new();
        filter
            .set_opt("q", f.q.as_deref())
            .set_opt("saleId", f.sale_id.as_ref())
            .set_opt("orderNumber", f.order_number.as_deref())
            .set_range(f.range);
        filter
    }
}
