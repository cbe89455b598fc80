//! List query parameters and their wire form.

use serde::{Deserialize, Serialize};

use bizdesk_resources::Filter;

/// One-based page request, as list screens count pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Zero-based page index the backend expects.
    pub fn wire_page(&self) -> u32 {
        self.page.saturating_sub(1)
    }

    pub fn next(&self) -> Self {
        Self::new(self.page.saturating_add(1), self.per_page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }

    /// `field,asc` / `field,desc`.
    pub fn wire_value(&self) -> String {
        format!("{},{}", self.field, self.order.as_str())
    }
}

/// Parameters of a `get_list` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub pagination: Option<Pagination>,
    pub sort: Option<Sort>,
    pub filter: Filter,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        self.pagination = Some(Pagination::new(page, per_page));
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Whether this list call goes to the collection's `/search` endpoint.
    pub fn is_search(&self) -> bool {
        self.filter.query_text().is_some()
    }

    /// `/api/{resource}` or `/api/{resource}/search`.
    pub fn list_path(&self, resource: &str) -> String {
        if self.is_search() {
            format!("/api/{resource}/search")
        } else {
            format!("/api/{resource}")
        }
    }

    /// Query pairs in wire order: `page`, `size`, `sort`, then filter pairs.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filter.pairs().len() + 3);
        if let Some(p) = &self.pagination {
            pairs.push(("page".to_string(), p.wire_page().to_string()));
            pairs.push(("size".to_string(), p.per_page.to_string()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_string(), sort.wire_value()));
        }
        pairs.extend(self.filter.pairs().iter().cloned());
        pairs
    }
}
