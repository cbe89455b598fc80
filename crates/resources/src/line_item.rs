use serde::{Deserialize, Serialize};

use bizdesk_core::{Money, RecordId, ValidationErrors};

/// One line of a purchase, sale or order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<RecordId>,
    pub product_name: String,
    pub quantity: f64,
    pub unit_price: Money,
    /// Discount percentage (0..=100) applied to the line.
    #[serde(default)]
    pub discount: f64,
}

impl LineItem {
    pub fn new(product_name: impl Into<String>, quantity: f64, unit_price: Money) -> Self {
        Self {
            product_id: None,
            product_name: product_name.into(),
            quantity,
            unit_price,
            discount: 0.0,
        }
    }

    /// `quantity * unit_price`, less the line discount, rounded to the cent.
    pub fn total(&self) -> Money {
        let gross = self.unit_price.times(self.quantity);
        if self.discount > 0.0 {
            gross - gross.times(self.discount.min(100.0) / 100.0)
        } else {
            gross
        }
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.check(
            self.product_name.trim().is_empty() && self.product_id.is_none(),
            "productName",
            "is required",
        );
        errors.check(
            !(self.quantity.is_finite() && self.quantity > 0.0),
            "quantity",
            "must be greater than zero",
        );
        errors.check(self.unit_price.is_negative(), "unitPrice", "must not be negative");
        errors.check(
            !(0.0..=100.0).contains(&self.discount),
            "discount",
            "must be between 0 and 100",
        );
        errors
    }
}

/// Validate a list of lines (at least one required) into `errors` as
/// `items.{index}.{field}`.
pub fn validate_lines(errors: &mut ValidationErrors, items: &[LineItem]) {
    if items.is_empty() {
        errors.add("items", "at least one line item is required");
    }
    for (index, item) in items.iter().enumerate() {
        errors.merge_prefixed(&format!("items.{index}"), item.validate());
    }
}

pub fn lines_total(items: &[LineItem]) -> Money {
    items.iter().map(LineItem::total).sum()
}

/// Settlement state of an invoice-like record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn derive(total: Money, paid: Money) -> Self {
        if !paid.is_positive() {
            if total.is_positive() {
                PaymentStatus::Unpaid
            } else {
                PaymentStatus::Paid
            }
        } else if paid >= total {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }
}
