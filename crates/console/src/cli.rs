//! Argument parsing for the `bizdesk` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use bizdesk_dashboard::Metric;
use bizdesk_reports::AgingKind;
use bizdesk_resources::is_known_resource;

pub const DEFAULT_DAYS: u32 = 30;

/// Longest window a command accepts, about ten years.
pub const MAX_DAYS: u32 = 3_660;

#[derive(Debug, Parser)]
#[command(name = "bizdesk")]
#[command(about = "Back-office console for the bizdesk ERP backend", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Sign in and store the session.
    Login { username: String, password: String },
    /// Drop the stored session.
    Logout,
    /// Show the signed-in user and permissions.
    #[command(name = "whoami")]
    WhoAmI,
    /// One page of a collection.
    List {
        #[arg(value_parser = parse_resource)]
        resource: String,
        #[arg(default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },
    /// Headline stats and chart data.
    Dashboard {
        #[arg(default_value_t = DEFAULT_DAYS, value_parser = day_count())]
        days: u32,
    },
    /// One analytics series: sales, purchases or expenses.
    Analytics {
        metric: Metric,
        #[arg(default_value_t = DEFAULT_DAYS, value_parser = day_count())]
        days: u32,
    },
    /// Aging report as of today: receivables or payables.
    Aging { kind: AgingKind },
    /// Profit and loss.
    #[command(name = "pl", alias = "profit-loss")]
    ProfitLoss {
        #[arg(default_value_t = DEFAULT_DAYS, value_parser = day_count())]
        days: u32,
    },
    /// Write a whole collection as CSV.
    Export {
        #[arg(value_parser = parse_resource)]
        resource: String,
        file: PathBuf,
    },
}

fn day_count() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(MAX_DAYS))
}

/// Resource names are case-insensitive on the command line.
fn parse_resource(raw: &str) -> Result<String, String> {
    let name = raw.trim().to_ascii_lowercase();
    if is_known_resource(&name) {
        Ok(name)
    } else {
        Err(format!("unknown resource {name:?}"))
    }
}
