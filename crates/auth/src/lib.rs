//! `bizdesk-auth` — session, token storage and role policy for the client.
//!
//! This crate is intentionally decoupled from HTTP: the client crate performs
//! the login/refresh calls and hands the results to the types defined here.

pub mod claims;
pub mod disposition;
pub mod permissions;
pub mod roles;
pub mod session;
pub mod store;

pub use claims::{TokenClaims, decode_claims, decode_expiry};
pub use disposition::{ErrorDisposition, LOGIN_ROUTE, classify_status};
pub use permissions::{Action, Permission, RolePolicy};
pub use roles::Role;
pub use session::{Identity, Session};
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore};
