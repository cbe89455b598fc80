use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizdesk_core::{DateRange, Money, RecordId, ValidationErrors};

use crate::filter::Filter;
use crate::line_item::{self, LineItem, PaymentStatus};
use crate::validation;
use crate::{Resource, Validate};

/// Supplier invoice (goods bought on account).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub supplier_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub invoice_number: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub total_amount: Money,
    #[serde(default)]
    pub paid_amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Purchase {
    /// Sum of the line totals.
    pub fn computed_total(&self) -> Money {
        line_item::lines_total(&self.items)
    }

    /// Total to use for balances: the stored total, or the line sum when the
    /// backend omitted it.
    pub fn effective_total(&self) -> Money {
        if self.total_amount.is_zero() {
            self.computed_total()
        } else {
            self.total_amount
        }
    }

    /// Outstanding amount owed to the supplier (never negative).
    pub fn balance(&self) -> Money {
        (self.effective_total() - self.paid_amount).non_negative()
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.status
            .unwrap_or_else(|| PaymentStatus::derive(self.effective_total(), self.paid_amount))
    }

    /// Due date, defaulting to the invoice date.
    pub fn due_on(&self) -> NaiveDate {
        self.due_date.unwrap_or(self.date)
    }
}

impl Resource for Purchase {
    const NAME: &'static str = "purchases";
    const LABEL: &'static str = "Purchases";

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Validate for Purchase {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::required_opt(&mut errors, "supplierId", &self.supplier_id);
        validation::max_len(&mut errors, "invoiceNumber", &self.invoice_number, 50);
        line_item::validate_lines(&mut errors, &self.items);
        validation::non_negative(&mut errors, "paidAmount", self.paid_amount);
        errors.check(
            self.paid_amount > self.effective_total(),
            "paidAmount",
            "cannot exceed the total amount",
        );
        errors.check(
            self.due_date.is_some_and(|due| due < self.date),
            "dueDate",
            "cannot be before the invoice date",
        );
        errors
    }
}

/// Purchase list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseFilter {
    pub q: Option<String>,
    pub supplier_id: Option<RecordId>,
    pub status: Option<PaymentStatus>,
    pub range: Option<DateRange>,
}

impl From<&PurchaseFilter> for Filter {
    fn from(f: &PurchaseFilter) -> Self {
        let mut filter = Filter::new();
        filter
            .set_opt("q", f.q.as_deref())
            .set_opt("supplierId", f.supplier_id.as_ref())
            .set_opt("status", f.status.map(|s| s.as_str()))
            .set_range(f.range);
        filter
    }
}
