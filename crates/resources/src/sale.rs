use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizdesk_core::{DateRange, Money, RecordId, ValidationErrors};

use crate::filter::Filter;
use crate::line_item::{self, LineItem, PaymentStatus};
use crate::validation;
use crate::{Resource, Validate};

/// Customer invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub customer_name: String,
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
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
}

impl Sale {
    pub fn computed_total(&self) -> Money {
        line_item::lines_total(&self.items)
    }

    pub fn effective_total(&self) -> Money {
        if self.total_amount.is_zero() {
            self.computed_total()
        } else {
            self.total_amount
        }
    }

    /// Amount still receivable from the customer (never negative).
    pub fn balance(&self) -> Money {
        (self.effective_total() - self.paid_amount).non_negative()
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.status
            .unwrap_or_else(|| PaymentStatus::derive(self.effective_total(), self.paid_amount))
    }

    pub fn due_on(&self) -> NaiveDate {
        self.due_date.unwrap_or(self.date)
    }
}

impl Resource for Sale {
    const NAME: &'static str = "sales";
    const LABEL: &'static str = "Sales";

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Validate for Sale {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::required(&mut errors, "customerName", &self.customer_name);
        validation::max_len(&mut errors, "customerName", &self.customer_name, 120);
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

/// Sale list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleFilter {
    pub q: Option<String>,
    pub customer_name: Option<String>,
    pub status: Option<PaymentStatus>,
    pub range: Option<DateRange>,
}

impl From<&SaleFilter> for Filter {
    fn from(f: &SaleFilter) -> Self {
        let mut filter = Filter::new();
        filter
            .set_opt("q", f.q.as_deref())
            .set_opt("customerName", f.customer_name.as_deref())
            .set_opt("status", f.status.map(|s| s.as_str()))
            .set_range(f.range);
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale() -> Sale {
        Sale {
            id: Some(RecordId::Number(1)),
            customer_name: "Globex".into(),
            invoice_number: "S-1".into(),
            order_number: None,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            due_date: None,
            items: vec![LineItem::new("Widget", 4.0, Money::from_major(25))],
            total_amount: Money::from_major(100),
            paid_amount: Money::from_major(100),
            status: None,
        }
    }

    #[test]
    fn fully_paid_sale_has_no_balance() {
        let s = sale();
        assert_eq!(s.balance(), Money::ZERO);
        assert_eq!(s.payment_status(), PaymentStatus::Paid);
        assert_eq!(s.due_on(), s.date);
    }

    #[test]
    fn explicit_status_wins_over_derivation() {
        let mut s = sale();
        s.status = Some(PaymentStatus::Partial);
        assert_eq!(s.payment_status(), PaymentStatus::Partial);
    }

    #[test]
    fn customer_and_items_required() {
        let mut s = sale();
        s.customer_name.clear();
        s.items.clear();
        let errors = s.validate();
        assert!(errors.has("customerName"));
        assert!(errors.has("items"));
    }

    #[test]
    fn decodes_status_and_amounts() {
        let s: Sale = serde_json::from_str(
            r#"{"customerName":"Initech","date":"2024-02-03","totalAmount":"99.90","paidAmount":10,"status":"partial"}"#,
        )
        .unwrap();
        assert_eq!(s.total_amount, Money::from_minor(9_990));
        assert_eq!(s.balance(), Money::from_minor(8_990));
        assert_eq!(s.status, Some(PaymentStatus::Partial));
    }
}
