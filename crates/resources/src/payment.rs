use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizdesk_core::{DateRange, Money, RecordId, ValidationErrors};

use crate::filter::Filter;
use crate::validation;
use crate::{Resource, Validate};

/// How money changed hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Cheque,
    Card,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Card => "card",
            PaymentMethod::Other => "other",
        }
    }
}

/// Outgoing payment to a supplier, optionally settling a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub supplier_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_id: Option<RecordId>,
    pub date: NaiveDate,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Resource for Payment {
    const NAME: &'static str = "payments";
    const LABEL: &'static str = "Payments";

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Validate for Payment {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::required_opt(&mut errors, "supplierId", &self.supplier_id);
        validation::positive(&mut errors, "amount", self.amount);
        if let Some(reference) = &self.reference {
            validation::max_len(&mut errors, "reference", reference, 60);
        }
        errors
    }
}

/// Payment list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentFilter {
    pub supplier_id: Option<RecordId>,
    pub purchase_id: Option<RecordId>,
    pub method: Option<PaymentMethod>,
    pub range: Option<DateRange>,
}

impl From<&PaymentFilter> for Filter {
    fn from(f: &PaymentFilter) -> Self {
        let mut filter = Filter::new();
        filter
            .set_opt("supplierId", f.supplier_id.as_ref())
            .set_opt("purchaseId", f.purchase_id.as_ref())
            .set_opt("method", f.method.map(|m| m.as_str()))
            .set_range(f.range);
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_must_be_positive() {
        let payment = Payment {
            id: None,
            supplier_id: Some(RecordId::Number(4)),
            purchase_id: None,
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            amount: Money::ZERO,
            method: Some(PaymentMethod::BankTransfer),
            reference: None,
        };
        assert_eq!(payment.validate().messages("amount"), ["must be greater than zero"]);
    }

    #[test]
    fn method_uses_snake_case_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(),
            r#""bank_transfer""#
        );
    }
}
