use serde::{Deserialize, Serialize};

use bizdesk_core::{RecordId, ValidationErrors};

use crate::filter::Filter;
use crate::validation;
use crate::{Resource, Validate};

/// Vendor the business purchases from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub tax_number: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Supplier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            contact_person: None,
            email: None,
            phone: None,
            address: None,
            tax_number: None,
            active: true,
        }
    }
}

impl Resource for Supplier {
    const NAME: &'static str = "suppliers";
    const LABEL: &'static str = "Suppliers";

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Validate for Supplier {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::required(&mut errors, "name", &self.name);
        validation::max_len(&mut errors, "name", &self.name, 120);
        validation::email_opt(&mut errors, "email", self.email.as_deref());
        validation::phone_opt(&mut errors, "phone", self.phone.as_deref());
        errors
    }
}

/// Supplier list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplierFilter {
    pub q: Option<String>,
    pub active: Option<bool>,
}

impl From<&SupplierFilter> for Filter {
    fn from(f: &SupplierFilter) -> Self {
        let mut filter = Filter::new();
        filter.set_opt("q", f.q.as_deref()).set_opt("active", f.active);
        filter
    }
}
