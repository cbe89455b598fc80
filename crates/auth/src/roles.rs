use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles arrive from the backend as opaque strings, sometimes with the
/// `ROLE_` prefix. [`Role::canonical`] is the normalized form used for policy
/// lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: &'static str = "ADMIN";
    pub const MANAGER: &'static str = "MANAGER";
    pub const ACCOUNTANT: &'static str = "ACCOUNTANT";
    pub const CLERK: &'static str = "CLERK";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper-cased name without the `ROLE_` prefix.
    pub fn canonical(&self) -> String {
        let upper = self.0.trim().to_ascii_uppercase();
        match upper.strip_prefix("ROLE_") {
            Some(rest) => rest.to_string(),
            None => upper,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.canonical() == Self::ADMIN
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
