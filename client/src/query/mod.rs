//! List query engine.
//!
//! Pure function from `(records, kind, ViewSpec)` to one visible page:
//!
//! ```text
//! records ─▶ search ─▶ column filters ─▶ date range ─▶ stable sort ─▶ page slice
//! ```
//!
//! The input collection is never mutated; identical inputs always give
//! identical output.

pub mod view_spec;

use chrono::NaiveDate;
use serde_json::Value;
use std::cmp::Ordering;

use crate::models::{scalar_text, EntityKind, Record};

pub use view_spec::{ColumnFilter, DateRange, SortDirection, SortSpec, ViewSpec};

/// One page of a filtered, sorted view.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub rows: Vec<Record>,
    /// Rows matching search and filters, before paging.
    pub total_count: usize,
    /// The page actually returned (clamped into range).
    pub page: usize,
    /// At least 1, even for an empty result.
    pub total_pages: usize,
}

/// Search, filter and sort without paging.
pub fn filter_and_sort(records: &[Record], kind: EntityKind, spec: &ViewSpec) -> Vec<Record> {
    let needle = spec.query.trim().to_lowercase();

    let mut rows: Vec<Record> = records
        .iter()
        .filter(|r| matches_search(r, kind, &needle))
        .filter(|r| matches_filters(r, kind, spec))
        .filter(|r| matches_date_range(r, kind, spec.date_range.as_ref()))
        .cloned()
        .collect();

    if let Some(sort) = &spec.sort {
        rows.sort_by(|a, b| {
            let ord = compare_values(
                kind.resolve_value(a, &sort.key),
                kind.resolve_value(b, &sort.key),
            );
            match sort.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }

    rows
}

/// Apply a view spec and return the requested page.
pub fn apply(records: &[Record], kind: EntityKind, spec: &ViewSpec) -> QueryResult {
    let rows = filter_and_sort(records, kind, spec);
    let total_count = rows.len();
    let page_size = spec.page_size.max(1);
    let total_pages = total_count.div_ceil(page_size).max(1);
    let page = spec.page.clamp(1, total_pages);

    let rows = rows
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    QueryResult {
        rows,
        total_count,
        page,
        total_pages,
    }
}

/// Case-insensitive substring match over the kind's searchable fields.
fn matches_search(record: &Record, kind: EntityKind, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    kind.schema().searchable.iter().any(|field| {
        kind.resolve(record, field)
            .is_some_and(|text| text.to_lowercase().contains(needle))
    })
}

fn matches_filters(record: &Record, kind: EntityKind, spec: &ViewSpec) -> bool {
    spec.filters
        .iter()
        .filter(|(_, filter)| filter.is_active())
        .all(|(column, filter)| filter.matches(kind.resolve(record, column).as_deref()))
}

fn matches_date_range(record: &Record, kind: EntityKind, range: Option<&DateRange>) -> bool {
    let Some(range) = range.filter(|r| r.is_active()) else {
        return true;
    };
    kind.resolve(record, &range.field)
        .and_then(|text| parse_day(&text))
        .is_some_and(|day| range.contains(day))
}

/// Accepts `YYYY-MM-DD` and anything starting with it (RFC 3339 timestamps).
pub fn parse_day(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let head = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Total order used for sorting: missing values first, numbers numerically,
/// everything else as case-insensitive text.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => {
                let x = scalar_text(a).unwrap_or_default().to_lowercase();
                let y = scalar_text(b).unwrap_or_default().to_lowercase();
                x.cmp(&y)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn students() -> Vec<Record> {
        [
            json!({ "id": 1, "name": "John Smith", "email": "john@x.org", "gender": "M", "grade": 7, "enrollmentDate": "2024-01-15" }),
            json!({ "id": 2, "name": "Ann Lee", "email": "ann@x.org", "gender": "F", "grade": 10, "enrollmentDate": "2024-02-01T08:00:00Z" }),
            json!({ "id": 3, "name": "Mary Smithers", "personalEmail": "mary@home.org", "gender": "F", "grade": 8 }),
            json!({ "id": 4, "name": "bob Jones", "email": "bob@x.org", "gender": "M", "grade": 9, "enrollmentDate": "2023-12-31" }),
        ]
        .into_iter()
        .filter_map(Record::from_value)
        .collect()
    }

    fn names(rows: &[Record]) -> Vec<String> {
        rows.iter().filter_map(|r| r.text("name")).collect()
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut spec = ViewSpec::default();
        spec.set_query("smith");

        let result = apply(&students(), EntityKind::Student, &spec);
        assert_eq!(names(&result.rows), vec!["John Smith", "Mary Smithers"]);
        assert_eq!(result.total_count, 2);
    }

    #[test]
    fn test_search_follows_email_aliases() {
        let mut spec = ViewSpec::default();
        spec.set_query("HOME.ORG");

        let result = apply(&students(), EntityKind::Student, &spec);
        assert_eq!(names(&result.rows), vec!["Mary Smithers"]);
    }

    #[test]
    fn test_apply_is_idempotent_and_pure() {
        let records = students();
        let before = records.clone();
        let mut spec = ViewSpec::default();
        spec.set_query("o");
        spec.toggle_sort("name");

        let first = apply(&records, EntityKind::Student, &spec);
        let second = apply(&records, EntityKind::Student, &spec);

        assert_eq!(first, second);
        assert_eq!(records, before);
    }

    #[test]
    fn test_descending_reverses_ascending() {
        let records = students();
        let mut spec = ViewSpec::default();
        spec.toggle_sort("name");
        let asc = filter_and_sort(&records, EntityKind::Student, &spec);

        spec.toggle_sort("name");
        let mut desc = filter_and_sort(&records, EntityKind::Student, &spec);
        desc.reverse();

        assert_eq!(names(&asc), names(&desc));
        assert_eq!(names(&asc)[0], "Ann Lee");
        assert_eq!(names(&asc)[1], "bob Jones");
    }

    #[test]
    fn test_numbers_sort_numerically() {
        let mut spec = ViewSpec::default();
        spec.toggle_sort("grade");
        let rows = filter_and_sort(&students(), EntityKind::Student, &spec);
        let grades: Vec<_> = rows.iter().filter_map(|r| r.text("grade")).collect();
        assert_eq!(grades, vec!["7", "8", "9", "10"]);
    }

    #[test]
    fn test_missing_values_sort_first() {
        let mut spec = ViewSpec::default();
        spec.toggle_sort("enrollmentDate");
        let rows = filter_and_sort(&students(), EntityKind::Student, &spec);
        assert_eq!(rows[0].text("name").as_deref(), Some("Mary Smithers"));
    }

    #[test]
    fn test_sort_is_stable() {
        let mut spec = ViewSpec::default();
        spec.toggle_sort("gender");
        let rows = filter_and_sort(&students(), EntityKind::Student, &spec);
        assert_eq!(
            names(&rows),
            vec!["Ann Lee", "Mary Smithers", "John Smith", "bob Jones"]
        );
    }

    #[test]
    fn test_unfiltered_spec_keeps_everything() {
        let records = students();
        let spec = ViewSpec::new(100);
        assert!(spec.is_unfiltered());

        let result = apply(&records, EntityKind::Student, &spec);
        assert_eq!(result.rows, records);
    }

    #[test]
    fn test_column_filter() {
        let mut spec = ViewSpec::default();
        spec.set_filter("gender", ColumnFilter::Exact("F".into()));
        let result = apply(&students(), EntityKind::Student, &spec);
        assert_eq!(names(&result.rows), vec!["Ann Lee", "Mary Smithers"]);

        spec.set_filter("gender", ColumnFilter::Exact("f".into()));
        assert_eq!(apply(&students(), EntityKind::Student, &spec).total_count, 0);

        spec.set_filter("gender", ColumnFilter::ExactIgnoreCase("f".into()));
        assert_eq!(apply(&students(), EntityKind::Student, &spec).total_count, 2);
    }

    #[test]
    fn test_date_range_filter() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
        let mut spec = ViewSpec::default();
        spec.set_date_range(Some(DateRange {
            field: "enrollmentDate".into(),
            from: d("2024-01-01"),
            to: d("2024-02-01"),
        }));

        let result = apply(&students(), EntityKind::Student, &spec);
        assert_eq!(names(&result.rows), vec!["John Smith", "Ann Lee"]);
    }

    #[test]
    fn test_paging_and_clamping() {
        let records = students();
        let mut spec = ViewSpec::new(3);

        let result = apply(&records, EntityKind::Student, &spec);
        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.total_pages, 2);

        spec.set_page(2);
        let result = apply(&records, EntityKind::Student, &spec);
        assert_eq!(result.rows.len(), 1);

        spec.set_page(9);
        let result = apply(&records, EntityKind::Student, &spec);
        assert_eq!(result.page, 2);
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        let result = apply(&[], EntityKind::School, &ViewSpec::default());
        assert!(result.rows.is_empty());
        assert_eq!(result.total_count, 0);
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.page, 1);
    }

    #[test]
    fn test_parse_day() {
        assert!(parse_day("2024-03-01").is_some());
        assert!(parse_day("2024-03-01T10:15:00Z").is_some());
        assert!(parse_day("01/03/2024").is_none());
        assert!(parse_day("").is_none());
    }
}
