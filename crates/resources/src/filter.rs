//! Generic list filter rendered into query-string pairs.

use bizdesk_core::DateRange;
use chrono::NaiveDate;

/// Full-text search key; its presence routes list calls to `/search`.
pub const SEARCH_KEY: &str = "q";
pub const DATE_FROM_KEY: &str = "dateFrom";
pub const DATE_TO_KEY: &str = "dateTo";

/// Ordered filter pairs.
///
/// Insertion order is preserved so the generated query string is stable;
/// setting a key again replaces its value in place. Blank values are never
/// stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pairs: Vec<(String, String)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl ToString) -> &mut Self {
        let value = value.to_string();
        let value = value.trim();
        if value.is_empty() {
            self.remove(key);
            return self;
        }
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.pairs.push((key.to_string(), value.to_string())),
        }
        self
    }

    pub fn set_opt<T: ToString>(&mut self, key: &str, value: Option<T>) -> &mut Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn search(self, q: &str) -> Self {
        self.with(SEARCH_KEY, q)
    }

    pub fn set_date(&mut self, key: &str, date: Option<NaiveDate>) -> &mut Self {
        self.set_opt(key, date.map(|d| d.format("%Y-%m-%d").to_string()))
    }

    pub fn set_range(&mut self, range: Option<DateRange>) -> &mut Self {
        if let Some(range) = range {
            let (from, to) = range.wire_bounds();
            self.set(DATE_FROM_KEY, from);
            self.set(DATE_TO_KEY, to);
        }
        self
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.set_range(Some(range));
        self
    }

    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Non-blank full-text query, if any.
    pub fn query_text(&self) -> Option<&str> {
        self.get(SEARCH_KEY)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Merge `other` on top of `self` (other wins on key clashes).
    pub fn merged(mut self, other: &Filter) -> Self {
        for (k, v) in &other.pairs {
            self.set(k, v);
        }
        self
    }
}

impl<K: AsRef<str>, V: ToString> FromIterator<(K, V)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filter = Filter::new();
        for (k, v) in iter {
            filter.set(k.as_ref(), v);
        }
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_dropped() {
        let mut f = Filter::new();
        f.set("status", "  ").set("q", "acme").set_opt::<String>("supplierId", None);
        assert_eq!(f.pairs(), &[("q".to_string(), "acme".to_string())]);
    }

    #[test]
    fn setting_again_replaces_in_place() {
        let mut f: Filter = [("a", "1"), ("b", "2")].into_iter().collect();
        f.set("a", "3");
        assert_eq!(f.get("a"), Some("3"));
        assert_eq!(f.pairs()[0].0, "a");

        f.set("a", "");
        assert_eq!(f.get("a"), None);
        assert_eq!(f.pairs().len(), 1);
    }

    #[test]
    fn range_renders_iso_dates() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        let f = Filter::new().with_range(range);
        assert_eq!(f.get(DATE_FROM_KEY), Some("2024-01-01"));
        assert_eq!(f.get(DATE_TO_KEY), Some("2024-01-31"));
    }

    #[test]
    fn merged_overrides_keys() {
        let base = Filter::new().with("status", "paid").with("q", "x");
        let merged = base.merged(&Filter::new().with("status", "partial"));
        assert_eq!(merged.get("status"), Some("partial"));
        assert_eq!(merged.query_text(), Some("x"));
    }
}
