//! View state: free-text query, column filters, date range, sort and page.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::DEFAULT_VIEW_PAGE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

/// A column filter. An empty value means the filter is unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "value", rename_all = "camelCase")]
pub enum ColumnFilter {
    /// Case-sensitive equality.
    Exact(String),
    /// Case-insensitive equality.
    ExactIgnoreCase(String),
}

impl ColumnFilter {
    pub fn value(&self) -> &str {
        match self {
            ColumnFilter::Exact(v) | ColumnFilter::ExactIgnoreCase(v) => v,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.value().is_empty()
    }

    pub fn matches(&self, candidate: Option<&str>) -> bool {
        let candidate = candidate.unwrap_or("");
        match self {
            ColumnFilter::Exact(v) => candidate == v,
            ColumnFilter::ExactIgnoreCase(v) => candidate.to_lowercase() == v.to_lowercase(),
        }
    }
}

/// Inclusive day range over one date field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub field: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }
}

/// The query/filter/sort/page state driving one list view.
///
/// Pages are 1-based. Every mutator that changes which rows match, or their
/// order, sends the view back to page 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSpec {
    pub query: String,
    pub filters: BTreeMap<String, ColumnFilter>,
    pub date_range: Option<DateRange>,
    pub sort: Option<SortSpec>,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewSpec {
    fn default() -> Self {
        Self {
            query: String::new(),
            filters: BTreeMap::new(),
            date_range: None,
            sort: None,
            page: 1,
            page_size: DEFAULT_VIEW_PAGE_SIZE,
        }
    }
}

impl ViewSpec {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 1;
    }

    /// Set a column filter; an empty value clears it.
    pub fn set_filter(&mut self, column: impl Into<String>, filter: ColumnFilter) {
        let column = column.into();
        if filter.is_active() {
            self.filters.insert(column, filter);
        } else {
            self.filters.remove(&column);
        }
        self.page = 1;
    }

    pub fn clear_filter(&mut self, column: &str) {
        self.filters.remove(column);
        self.page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.date_range = None;
        self.page = 1;
    }

    pub fn set_date_range(&mut self, range: Option<DateRange>) {
        self.date_range = range;
        self.page = 1;
    }

    /// Column-header click: the active key flips direction, a new key starts
    /// ascending.
    pub fn toggle_sort(&mut self, key: &str) {
        self.sort = match self.sort.take() {
            Some(current) if current.key == key => Some(SortSpec {
                key: current.key,
                direction: current.direction.flipped(),
            }),
            _ => Some(SortSpec {
                key: key.to_string(),
                direction: SortDirection::Asc,
            }),
        };
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        self.sort = sort;
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// True when no query, filter or date range narrows the rows.
    pub fn is_unfiltered(&self) -> bool {
        self.query.trim().is_empty()
            && !self.filters.values().any(ColumnFilter::is_active)
            && !self.date_range.as_ref().is_some_and(DateRange::is_active)
    }
}
