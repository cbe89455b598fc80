//! `bizdesk-client` — REST adapters for the back-office.
//!
//! - [`RestDataProvider`]: generic CRUD calls translated to `/api/{resource}` requests
//! - [`AuthProvider`]: login/logout, session checks, 401/403 handling
//! - [`CachedProvider`]: query cache with staleness flags
//! - [`LatestRequest`]: last-request-wins fetches keyed to changing inputs
//! - [`export`]: CSV export of list screens
//!
//! The backend owns the protocol; this crate only consumes it.

pub mod auth_provider;
pub mod cache;
pub mod config;
pub mod data_provider;
pub mod envelope;
pub mod error;
pub mod export;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;
pub mod http;
pub mod latest;
pub mod query;

pub use auth_provider::{AuthProvider, TokenResponse};
pub use cache::{CachedProvider, QueryCache, QueryKey, QueryState};
pub use config::{ClientConfig, ConfigError};
pub use data_provider::{DataProvider, ListResult, ResourceProvider, RestDataProvider};
pub use error::{ApiError, ApiResult};
pub use http::HttpClient;
pub use latest::{LatestRequest, ReceiptLookup, RequestState};
pub use query::{ListParams, Pagination, Sort, SortOrder};
