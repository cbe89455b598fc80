//! Back-office business records (backend-owned REST schemas).
//!
//! Each record mirrors the JSON the backend returns for its collection, carries
//! the form validation rules the create/edit screens enforce, and has a typed
//! list filter that renders to query-string pairs.

pub mod employee;
pub mod expense;
pub mod filter;
pub mod line_item;
pub mod order;
pub mod payment;
pub mod purchase;
pub mod receipt;
pub mod role;
pub mod sale;
pub mod supplier;
pub mod user;
pub mod validation;

use serde::Serialize;
use serde::de::DeserializeOwned;

use bizdesk_core::{DomainResult, RecordId, ValidationErrors};

pub use employee::{Employee, EmployeeFilter};
pub use expense::{Expense, ExpenseFilter};
pub use filter::Filter;
pub use line_item::{LineItem, PaymentStatus};
pub use order::{Order, OrderFilter, OrderStatus};
pub use payment::{Payment, PaymentFilter, PaymentMethod};
pub use purchase::{Purchase, PurchaseFilter};
pub use receipt::{Receipt, ReceiptFilter};
pub use role::{Role, RoleFilter};
pub use sale::{Sale, SaleFilter};
pub use supplier::{Supplier, SupplierFilter};
pub use user::{User, UserFilter};

/// A backend REST collection and its record type.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection path segment (`/api/{NAME}`).
    const NAME: &'static str;
    /// Human label used in logs and export file names.
    const LABEL: &'static str;

    fn id(&self) -> Option<&RecordId>;
}

/// Form validation for create/edit screens.
pub trait Validate {
    fn validate(&self) -> ValidationErrors;

    fn ensure_valid(&self) -> DomainResult<()> {
        self.validate().into_result()
    }
}

/// Names of every collection the client knows about, in menu order.
pub const RESOURCE_NAMES: [&str; 10] = [
    Supplier::NAME,
    Purchase::NAME,
    Sale::NAME,
    Order::NAME,
    Payment::NAME,
    Receipt::NAME,
    Expense::NAME,
    Employee::NAME,
    User::NAME,
    Role::NAME,
];

pub fn is_known_resource(name: &str) -> bool {
    RESOURCE_NAMES.contains(&name)
}
