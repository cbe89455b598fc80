//! `bizdesk-core` — shared building blocks for the back-office client.
//!
//! This crate contains **pure** primitives (no IO, no HTTP): identifiers,
//! money and percentage values, date ranges and display formatting.

pub mod date_range;
pub mod error;
pub mod format;
pub mod id;
pub mod value_object;

pub use date_range::DateRange;
pub use error::{DomainError, DomainResult, ValidationErrors};
pub use format::{CurrencyFormat, format_compact, format_currency, format_percentage, format_signed_percentage};
pub use id::RecordId;
pub use value_object::{Money, Percentage, ValueObject};
