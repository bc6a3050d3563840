//! Remote record API collaborators.
//!
//! The data layer never talks HTTP directly; it consumes two seams:
//!
//! - [`PageSource`] - `GET {endpoint}` with optional `page`/`size`
//! - [`RecordSink`] - `POST {create_path}` with a JSON record
//!
//! [`HttpRecordApi`] implements both over `reqwest`. Tests substitute
//! in-memory implementations.

pub mod http;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ApiResult;
use crate::models::Record;

pub use http::HttpRecordApi;

/// Zero-based page index and page size for a listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

/// Source of listing responses.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the raw JSON body for `endpoint`. `None` means no pagination
    /// parameters at all.
    async fn get_listing(&self, endpoint: &str, page: Option<PageRequest>) -> ApiResult<Value>;
}

/// Target for record creation.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Create one record. Any 2xx is success; the body is returned as-is.
    async fn create(&self, path: &str, record: &Record) -> ApiResult<Value>;
}
