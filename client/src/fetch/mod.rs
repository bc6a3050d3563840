//! Paginated fetch aggregator.
//!
//! Walks a listing page by page (strictly in sequence) and concatenates the
//! items into one collection.
//!
//! ```text
//! page 0 ──ok──▶ page 1 ──ok──▶ ... ──short/last──▶ Complete
//!   │                │
//!   │ fail           └─ fail ──▶ Partial (keep what we have)
//!   ▼
//! unpaginated GET ──ok──▶ Unpaginated
//!   │
//!   └─ fail ──▶ FetchError::Unavailable
//! ```
//!
//! No caching and no deduplication: every call starts again from page 0.

pub mod page;

use serde::Serialize;

use crate::api::{PageRequest, PageSource};
use crate::config::{DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};
use crate::error::{ApiError, FetchError, FetchResult};
use crate::logs::{log_success, log_warning};
use crate::models::Record;

pub use page::{ListingShape, Page};

/// Options for one aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub page_size: usize,
    pub max_pages: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl FetchOptions {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }
}

/// How an aggregation ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Completeness {
    /// Walked to the last page.
    Complete,
    /// First page failed; the unpaginated fallback supplied everything.
    Unpaginated,
    /// A later page failed; earlier pages are kept.
    Partial {
        failed_page: usize,
        #[serde(skip)]
        error: ApiError,
    },
    /// Stopped at the page ceiling.
    Truncated { max_pages: usize },
}

/// Collected records plus how they were obtained.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub records: Vec<Record>,
    /// Successful requests made.
    pub pages: usize,
    pub completeness: Completeness,
}

impl Aggregation {
    pub fn is_complete(&self) -> bool {
        matches!(
            self.completeness,
            Completeness::Complete | Completeness::Unpaginated
        )
    }
}

/// Fetch every page of `endpoint`.
///
/// Fails only when the first page and the unpaginated fallback both fail.
pub async fn fetch_all<S>(source: &S, endpoint: &str, options: FetchOptions) -> FetchResult<Aggregation>
where
    S: PageSource + ?Sized,
{
    let size = options.page_size.max(1);
    let max_pages = options.max_pages.max(1);
    let mut records: Vec<Record> = Vec::new();
    let mut page_index = 0;

    loop {
        if page_index == max_pages {
            log_warning(format!(
                "{}: stopped after {} pages ({} records)",
                endpoint,
                max_pages,
                records.len()
            ));
            return Ok(Aggregation {
                records,
                pages: page_index,
                completeness: Completeness::Truncated { max_pages },
            });
        }

        let request = PageRequest {
            page: page_index,
            size,
        };
        let body = match source.get_listing(endpoint, Some(request)).await {
            Ok(body) => body,
            Err(first) if page_index == 0 => {
                log_warning(format!(
                    "{}: paged request failed ({}), retrying without pagination",
                    endpoint, first
                ));
                return fetch_unpaginated(source, endpoint, first).await;
            }
            Err(error) => {
                log_warning(format!(
                    "{}: page {} failed ({}), keeping {} records",
                    endpoint,
                    page_index,
                    error,
                    records.len()
                ));
                return Ok(Aggregation {
                    records,
                    pages: page_index,
                    completeness: Completeness::Partial {
                        failed_page: page_index,
                        error,
                    },
                });
            }
        };

        let shape = ListingShape::sniff(body);
        log::debug!("{}: page {} is {}", endpoint, page_index, shape.name());
        let page = Page::from_shape(shape, size);
        if page.skipped > 0 {
            log_warning(format!(
                "{}: skipped {} non-object items on page {}",
                endpoint, page.skipped, page_index
            ));
        }

        let more = page.has_more();
        records.extend(page.items);
        page_index += 1;

        if !more {
            break;
        }
    }

    log_success(format!(
        "{}: {} records in {} page(s)",
        endpoint,
        records.len(),
        page_index
    ));

    Ok(Aggregation {
        records,
        pages: page_index,
        completeness: Completeness::Complete,
    })
}

/// Single request with no paging parameters; the response is the whole
/// collection whatever its shape.
async fn fetch_unpaginated<S>(source: &S, endpoint: &str, first: ApiError) -> FetchResult<Aggregation>
where
    S: PageSource + ?Sized,
{
    match source.get_listing(endpoint, None).await {
        Ok(body) => {
            let page = Page::from_response(body, usize::MAX);
            log_success(format!(
                "{}: {} records from unpaginated fallback",
                endpoint,
                page.items.len()
            ));
            Ok(Aggregation {
                records: page.items,
                pages: 1,
                completeness: Completeness::Unpaginated,
            })
        }
        Err(fallback) => Err(FetchError::Unavailable {
            endpoint: endpoint.to_string(),
            first,
            fallback,
        }),
    }
}

/// Same walk as [`fetch_all`] but an unavailable listing yields an empty
/// collection instead of an error.
pub async fn fetch_all_or_empty<S>(source: &S, endpoint: &str, options: FetchOptions) -> Vec<Record>
where
    S: PageSource + ?Sized,
{
    match fetch_all(source, endpoint, options).await {
        Ok(aggregation) => aggregation.records,
        Err(e) => {
            log::warn!("{}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeApi, Shape};
    use serde_json::json;

    fn ids(records: &[Record]) -> Vec<String> {
        records.iter().filter_map(|r| r.text("id")).collect()
    }

    #[tokio::test]
    async fn test_250_items_take_three_requests() {
        let api = FakeApi::with_items(250, Shape::Content);

        let result = fetch_all(&api, "students", FetchOptions::with_page_size(100))
            .await
            .unwrap();

        assert_eq!(result.records.len(), 250);
        assert_eq!(result.pages, 3);
        assert_eq!(result.completeness, Completeness::Complete);
        assert_eq!(
            api.requests(),
            vec![Some((0, 100)), Some((1, 100)), Some((2, 100))]
        );
    }

    #[tokio::test]
    async fn test_paged_equals_unpaginated_for_every_shape() {
        for shape in [Shape::Bare, Shape::Content, Shape::Data] {
            for total in [0, 1, 7, 10, 23, 30] {
                for size in [1, 3, 10, 50] {
                    let api = FakeApi::with_items(total, shape);
                    let paged = fetch_all(&api, "x", FetchOptions::with_page_size(size))
                        .await
                        .unwrap();

                    let all = api.all_ids();
                    assert_eq!(ids(&paged.records), all, "{:?} total={} size={}", shape, total, size);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_one_extra_request_for_bare_arrays() {
        let api = FakeApi::with_items(20, Shape::Bare);
        let result = fetch_all(&api, "x", FetchOptions::with_page_size(10)).await.unwrap();

        assert_eq!(result.records.len(), 20);
        assert_eq!(api.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_last_flag_stops_full_page() {
        let api = FakeApi::with_items(20, Shape::Content);
        let result = fetch_all(&api, "x", FetchOptions::with_page_size(10)).await.unwrap();

        assert_eq!(result.records.len(), 20);
        assert_eq!(api.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_first_page_failure_falls_back_to_unpaginated() {
        let api = FakeApi::with_items(12, Shape::Bare).fail_paged_status(500);

        let result = fetch_all(&api, "teachers", FetchOptions::default()).await.unwrap();

        assert_eq!(result.records.len(), 12);
        assert_eq!(result.completeness, Completeness::Unpaginated);
        assert_eq!(api.requests(), vec![Some((0, 100)), None]);
    }

    #[tokio::test]
    async fn test_first_page_and_fallback_failure() {
        let api = FakeApi::with_items(12, Shape::Bare).fail_everything();

        let err = fetch_all(&api, "teachers", FetchOptions::default()).await.unwrap_err();
        assert!(err.is_transport());

        let empty = fetch_all_or_empty(&api, "teachers", FetchOptions::default()).await;
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_later_page_failure_keeps_partial_results() {
        let api = FakeApi::with_items(250, Shape::Data).fail_page(2);

        let result = fetch_all(&api, "x", FetchOptions::with_page_size(100)).await.unwrap();

        assert_eq!(result.records.len(), 200);
        assert!(!result.is_complete());
        assert!(matches!(
            result.completeness,
            Completeness::Partial { failed_page: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_server_ignoring_page_parameter_is_bounded() {
        let api = FakeApi::with_items(5, Shape::Bare).ignore_paging();
        let options = FetchOptions {
            page_size: 5,
            max_pages: 4,
        };

        let result = fetch_all(&api, "x", options).await.unwrap();

        assert_eq!(result.completeness, Completeness::Truncated { max_pages: 4 });
        assert_eq!(api.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_unrecognized_shape_yields_empty() {
        let api = FakeApi::with_body(json!({ "rows": [{ "id": 1 }] }));
        let result = fetch_all(&api, "x", FetchOptions::default()).await.unwrap();
        assert!(result.records.is_empty());
        assert_eq!(result.completeness, Completeness::Complete);
    }

    #[tokio::test]
    async fn test_each_call_starts_from_page_zero() {
        let api = FakeApi::with_items(15, Shape::Content);
        fetch_all(&api, "x", FetchOptions::with_page_size(10)).await.unwrap();
        fetch_all(&api, "x", FetchOptions::with_page_size(10)).await.unwrap();

        let pages: Vec<_> = api.requests().into_iter().flatten().map(|(p, _)| p).collect();
        assert_eq!(pages, vec![0, 1, 0, 1]);
    }
}
