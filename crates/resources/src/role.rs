use serde::{Deserialize, Serialize};

use bizdesk_core::{RecordId, ValidationErrors};

use crate::filter::Filter;
use crate::validation;
use crate::{Resource, Validate};

/// Role definition managed from the administration screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Permission strings (`"{resource}.{action}"`, wildcards allowed).
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Resource for Role {
    const NAME: &'static str = "roles";
    const LABEL: &'static str = "Roles";

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Validate for Role {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::required(&mut errors, "name", &self.name);
        validation::max_len(&mut errors, "name", &self.name, 50);
        errors.check(
            self.permissions.iter().any(|p| validation::is_blank(p)),
            "permissions",
            "must not contain blank entries",
        );
        errors
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleFilter {
    pub q: Option<String>,
}

impl From<&RoleFilter> for Filter {
    fn from(f: &RoleFilter) -> Self {
        let mut filter = Filter::new();
        filter.set_opt("q", f.q.as_deref());
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_permissions_rejected() {
        let role = Role {
            id: None,
            name: "AUDITOR".into(),
            description: None,
            permissions: vec!["*.list".into(), "".into()],
        };
        assert!(role.validate().has("permissions"));
    }
}
