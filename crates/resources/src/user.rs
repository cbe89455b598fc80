use serde::{Deserialize, Serialize};

use bizdesk_core::{RecordId, ValidationErrors};

use crate::filter::Filter;
use crate::validation;
use crate::{Resource, Validate};

/// Back-office login account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Only sent on create / password reset; never returned by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

fn default_active() -> bool {
    true
}

impl Resource for User {
    const NAME: &'static str = "users";
    const LABEL: &'static str = "Users";

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Validate for User {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::len_between(&mut errors, "username", &self.username, 3, 50);
        validation::email_opt(&mut errors, "email", self.email.as_deref());
        errors.check(
            self.roles.iter().all(|r| validation::is_blank(r)),
            "roles",
            "at least one role is required",
        );
        if let Some(password) = &self.password {
            errors.check(
                password.chars().count() < 8,
                "password",
                "must be at least 8 characters",
            );
        }
        errors
    }
}

/// User list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub q: Option<String>,
    pub role: Option<String>,
    pub active: Option<bool>,
}

impl From<&UserFilter> for Filter {
    fn from(f: &UserFilter) -> Self {
        let mut filter = Filter::new();
        filter
            .set_opt("q", f.q.as_deref())
            .set_opt("role", f.role.as_deref())
            .set_opt("active", f.active);
        filter
    }
}
