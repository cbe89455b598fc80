//! Dashboard data: headline stats, analytics series and the chart data
//! derived from them.

pub mod analytics;
pub mod derived;
pub mod memo;
pub mod stats;

pub use analytics::{
    AnalyticsSeries, Granularity, MAX_ANALYTICS_WINDOW_DAYS, Metric, SeriesPoint,
    group_by_period, load_analytics,
};
pub use derived::{
    CategoryShare, ChartRow, DerivedData, TOP_EXPENSE_CATEGORIES, Totals, load_derived,
    top_categories,
};
pub use memo::Memo;
pub use stats::{DashboardStats, StatsInput, load_stats};
