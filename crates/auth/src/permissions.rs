use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::Role;

/// Permission identifier.
///
/// Permissions are modeled as opaque strings of the form `"{resource}.{action}"`
/// (e.g. `"payments.create"`). Wildcards are accepted on either side
/// (`"payments.*"`, `"*.list"`) and `"*"` alone grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn for_action(resource: &str, action: Action) -> Self {
        Self(Cow::Owned(format!("{resource}.{}", action.as_str())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }

    /// Does this (possibly wildcard) grant cover `resource.action`?
    pub fn grants(&self, resource: &str, action: Action) -> bool {
        if self.is_wildcard() {
            return true;
        }
        let Some((res, act)) = self.as_str().split_once('.') else {
            return false;
        };
        (res == "*" || res == resource) && (act == "*" || act == action.as_str())
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// CRUD-level actions the back-office screens expose per resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    List,
    Show,
    Create,
    Edit,
    Delete,
    Export,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::List,
        Action::Show,
        Action::Create,
        Action::Edit,
        Action::Delete,
        Action::Export,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Show => "show",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Export => "export",
        }
    }
}

const BUSINESS_RESOURCES: [&str; 8] = [
    "suppliers",
    "purchases",
    "sales",
    "orders",
    "payments",
    "receipts",
    "expenses",
    "employees",
];

/// Role → permission mapping.
///
/// Role names are matched on their canonical form (see [`Role::canonical`]);
/// unknown roles grant nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    grants: HashMap<String, Vec<Permission>>,
}

impl RolePolicy {
    pub fn empty() -> Self {
        Self {
            grants: HashMap::new(),
        }
    }

    pub fn grant(&mut self, role: &str, permission: Permission) -> &mut Self {
        self.grants
            .entry(Role::new(role.to_string()).canonical())
            .or_default()
            .push(permission);
        self
    }

    /// Effective permission set for a list of roles (sorted, deduplicated).
    pub fn permissions_for(&self, roles: &[Role]) -> BTreeSet<Permission> {
        roles
            .iter()
            .filter_map(|r| self.grants.get(&r.canonical()))
            .flatten()
            .cloned()
            .collect()
    }

    pub fn can(&self, roles: &[Role], resource: &str, action: Action) -> bool {
        roles
            .iter()
            .filter_map(|r| self.grants.get(&r.canonical()))
            .flatten()
            .any(|p| p.grants(resource, action))
    }
}

impl Default for RolePolicy {
    fn default() -> Self {
        let mut policy = RolePolicy::empty();

        policy.grant(Role::ADMIN, Permission::new("*"));

        for resource in BUSINESS_RESOURCES {
            policy.grant(Role::MANAGER, Permission::new(format!("{resource}.*")));
        }
        for resource in ["users", "roles"] {
            for action in [Action::List, Action::Show, Action::Create, Action::Edit, Action::Export] {
                policy.grant(Role::MANAGER, Permission::for_action(resource, action));
            }
        }
        policy
            .grant(Role::MANAGER, Permission::new("reports.*"))
            .grant(Role::MANAGER, Permission::new("dashboard.*"));

        policy
            .grant(Role::ACCOUNTANT, Permission::new("*.list"))
            .grant(Role::ACCOUNTANT, Permission::new("*.show"))
            .grant(Role::ACCOUNTANT, Permission::new("*.export"));
        for resource in ["payments", "receipts", "expenses"] {
            policy
                .grant(Role::ACCOUNTANT, Permission::for_action(resource, Action::Create))
                .grant(Role::ACCOUNTANT, Permission::for_action(resource, Action::Edit));
        }

        for resource in ["purchases", "sales", "orders"] {
            for action in [Action::List, Action::Show, Action::Create] {
                policy.grant(Role::CLERK, Permission::for_action(resource, action));
            }
        }
        policy.grant(Role::CLERK, Permission::for_action("dashboard", Action::Show));

        policy
    }
}
