use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bizdesk_core::{Money, RecordId, ValidationErrors};

use crate::filter::Filter;
use crate::validation;
use crate::{Resource, Validate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    /// Monthly gross salary.
    #[serde(default)]
    pub salary: Money,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

impl Resource for Employee {
    const NAME: &'static str = "employees";
    const LABEL: &'static str = "Employees";

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Validate for Employee {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::required(&mut errors, "firstName", &self.first_name);
        validation::required(&mut errors, "lastName", &self.last_name);
        validation::email_opt(&mut errors, "email", self.email.as_deref());
        validation::phone_opt(&mut errors, "phone", self.phone.as_deref());
        validation::non_negative(&mut errors, "salary", self.salary);
        errors
    }
}

/// Employee list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    pub q: Option<String>,
    pub department: Option<String>,
    pub active: Option<bool>,
}

impl From<&EmployeeFilter> for Filter {
    fn from(f: &EmployeeFilter) -> Self {
        let mut filter = Filter::new();
        filter
            .set_opt("q", f.q.as_deref())
            .set_opt("department", f.department.as_deref())
            .set_opt("active", f.active);
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee() -> Employee {
        Employee {
            id: None,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: Some("ada@example.org".into()),
            phone: None,
            position: Some("Analyst".into()),
            department: Some("Finance".into()),
            hire_date: None,
            salary: Money::from_major(4_000),
            active: true,
        }
    }

    #[test]
    fn valid_employee() {
        assert!(employee().ensure_valid().is_ok());
        assert_eq!(employee().full_name(), "Ada Lovelace");
    }

    #[test]
    fn negative_salary_and_bad_email_rejected() {
        let mut e = employee();
        e.salary = Money::from_major(-1);
        e.email = Some("ada-at-example".into());
        let errors = e.validate();
        assert!(errors.has("salary"));
        assert!(errors.has("email"));
    }
}
