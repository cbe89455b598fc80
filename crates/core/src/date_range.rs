//! Inclusive calendar date ranges and window clamping.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// Inclusive `[from, to]` range of calendar days.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl ValueObject for DateRange {}

impl DateRange {
    /// Build a range, swapping the bounds when they are given in reverse.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self { from: day, to: day }
    }

    /// The `n` days ending at `today` (inclusive). `n == 0` yields today only.
    /// Windows reaching past the calendar's start begin at `NaiveDate::MIN`.
    pub fn last_days(n: u32, today: NaiveDate) -> Self {
        let span = Duration::days(i64::from(n.max(1)) - 1);
        Self {
            from: today.checked_sub_signed(span).unwrap_or(NaiveDate::MIN),
            to: today,
        }
    }

    pub fn month_to_date(today: NaiveDate) -> Self {
        Self {
            from: today.with_day(1).unwrap_or(today),
            to: today,
        }
    }

    pub fn year_to_date(today: NaiveDate) -> Self {
        Self {
            from: NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
            to: today,
        }
    }

    /// Number of calendar days covered (always at least 1).
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }

    /// The range of equal length immediately preceding this one.
    pub fn previous_period(&self) -> Self {
        let len = self.days();
        let to = self.from.pred_opt().unwrap_or(NaiveDate::MIN);
        Self {
            from: to
                .checked_sub_signed(Duration::days(len - 1))
                .unwrap_or(NaiveDate::MIN),
            to,
        }
    }

    /// Clamp to at most `max_days` days ending no later than `today`.
    ///
    /// The end is capped first, then the start is pulled forward so the
    /// window keeps its most recent days. `max_days == 0` is treated as 1.
    pub fn clamp(&self, max_days: u32, today: NaiveDate) -> Self {
        let max_days = i64::from(max_days.max(1));
        let to = self.to.min(today);
        let mut from = self.from.min(to);
        if (to - from).num_days() + 1 > max_days {
            from = to - Duration::days(max_days - 1);
        }
        Self { from, to }
    }

    /// `true` when [`clamp`](Self::clamp) would change this range.
    pub fn exceeds(&self, max_days: u32, today: NaiveDate) -> bool {
        self.clamp(max_days, today) != *self
    }

    /// Query-string form used by the backend (`YYYY-MM-DD`).
    pub fn wire_bounds(&self) -> (String, String) {
        (
            self.from.format("%Y-%m-%d").to_string(),
            self.to.format("%Y-%m-%d").to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn new_swaps_reversed_bounds() {
        let r = DateRange::new(d(2024, 3, 10), d(2024, 3, 1));
        assert_eq!(r.from, d(2024, 3, 1));
        assert_eq!(r.to, d(2024, 3, 10));
        assert_eq!(r.days(), 10);
    }

    #[test]
    fn clamp_keeps_range_within_window() {
        let today = d(2024, 12, 31);
        let r = DateRange::new(d(2022, 1, 1), d(2024, 12, 31)).clamp(365, today);
        assert_eq!(r.to, today);
        assert_eq!(r.days(), 365);
        assert_eq!(r.from, d(2024, 1, 2));
    }

    #[test]
    fn clamp_at_exact_boundary_is_noop() {
        let today = d(2024, 6, 30);
        let r = DateRange::new(d(2024, 6, 1), today);
        assert_eq!(r.clamp(30, today), r);
        assert!(!r.exceeds(30, today));
        assert!(r.exceeds(29, today));
    }

    #[test]
    fn clamp_caps_future_end_at_today() {
        let today = d(2024, 6, 15);
        let r = DateRange::new(d(2024, 6, 1), d(2024, 7, 31)).clamp(365, today);
        assert_eq!(r, DateRange::new(d(2024, 6, 1), today));
    }

    #[test]
    fn clamp_entirely_future_range_collapses_to_today() {
        let today = d(2024, 6, 15);
        let r = DateRange::new(d(2024, 8, 1), d(2024, 8, 31)).clamp(90, today);
        assert_eq!(r, DateRange::single_day(today));
    }

    #[test]
    fn clamp_zero_window_means_one_day() {
        let today = d(2024, 6, 15);
        let r = DateRange::last_days(10, today).clamp(0, today);
        assert_eq!(r, DateRange::single_day(today));
    }

    #[test]
    fn previous_period_has_same_length() {
        let r = DateRange::new(d(2024, 3, 1), d(2024, 3, 31));
        let prev = r.previous_period();
        assert_eq!(prev.to, d(2024, 2, 29));
        assert_eq!(prev.days(), 31);
    }

    #[test]
    fn calendar_helpers() {
        let today = d(2024, 5, 17);
        assert_eq!(DateRange::month_to_date(today).from, d(2024, 5, 1));
        assert_eq!(DateRange::year_to_date(today).from, d(2024, 1, 1));
        assert_eq!(DateRange::last_days(7, today).from, d(2024, 5, 11));
        assert_eq!(
            DateRange::last_days(7, today).wire_bounds(),
            ("2024-05-11".to_string(), "2024-05-17".to_string())
        );
    }

    #[test]
    fn huge_windows_stop_at_the_first_date() {
        let today = d(2024, 6, 30);
        let r = DateRange::last_days(4_000_000_000, today);
        assert_eq!(r.from, NaiveDate::MIN);
        assert_eq!(r.to, today);
        assert_eq!(r.previous_period().to, NaiveDate::MIN);
        assert_eq!(r.clamp(365, today).days(), 365);
    }

    proptest! {
        #[test]
        fn clamped_range_respects_bounds(
            a in 0i64..3000,
            b in 0i64..3000,
            t in 0i64..3000,
            max in 0u32..800,
        ) {
            let base = d(2018, 1, 1);
            let r = DateRange::new(base + Duration::days(a), base + Duration::days(b));
            let today = base + Duration::days(t);
            let c = r.clamp(max, today);
            prop_assert!(c.from <= c.to);
            prop_assert!(c.to <= today);
            prop_assert!(c.days() <= i64::from(max.max(1)));
            // Clamping is idempotent.
            prop_assert_eq!(c.clamp(max, today), c);
        }
    }
}
