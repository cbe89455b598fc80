use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizdesk_core::{DateRange, Money, RecordId, ValidationErrors};

use crate::filter::Filter;
use crate::validation;
use crate::{Resource, Validate};

/// Operating expense (rent, utilities, travel...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_to: Option<String>,
}

impl Resource for Expense {
    const NAME: &'static str = "expenses";
    const LABEL: &'static str = "Expenses";

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Validate for Expense {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::required(&mut errors, "category", &self.category);
        validation::max_len(&mut errors, "description", &self.description, 500);
        validation::positive(&mut errors, "amount", self.amount);
        errors
    }
}

/// Expense list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub q: Option<String>,
    pub category: Option<String>,
    pub range: Option<DateRange>,
}

impl From<&ExpenseFilter> for Filter {
    fn from(f: &ExpenseFilter) -> Self {
        let mut filter = Filter::new();
        filter
            .set_opt("q", f.q.as_deref())
            .set_opt("category", f.category.as_deref())
            .set_range(f.range);
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_and_amount_required() {
        let expense = Expense {
            id: None,
            category: "".into(),
            description: "Office rent".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            amount: Money::from_minor(-100),
            paid_to: None,
        };
        let errors = expense.validate();
        assert!(errors.has("category"));
        assert!(errors.has("amount"));
        assert_eq!(errors.len(), 2);
    }
}
