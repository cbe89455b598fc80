//! Financial reports: receivables/payables aging and profit & loss.
//!
//! Both reports are served by the backend when it exposes them; against
//! older backends (404 on the report endpoint) they are computed here from
//! the raw collections.

pub mod aging;
pub mod profit_loss;

pub use aging::{
    AgingBucket, AgingKind, AgingReport, AgingRow, BucketAmounts, OpenItem, load_aging,
    payable_items, receivable_items,
};
pub use profit_loss::{ExpenseLine, ProfitAndLoss, load_profit_and_loss};
