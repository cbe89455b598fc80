//! Operator console: drives the data and auth providers from a terminal.

pub mod app;
pub mod cli;

pub use app::{App, describe_error};
pub use cli::{Cli, Command, DEFAULT_DAYS, MAX_DAYS};
