//! # CampusDesk - records console data layer
//!
//! Client-side data management for the CampusDesk multi-school records API:
//! aggregate paginated listings, search/filter/sort/page them in memory,
//! bulk-import delimited files and export the current view.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Records API │────▶│    Fetch    │────▶│    View     │────▶│    Query    │──▶ rows
//! │ (paginated) │     │ (aggregate) │     │ (cache/sel) │     │ (filter/pg) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!        ▲                                       │
//!        │ POST one row at a time                ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Import    │◀────│    Codec    │     │   Export    │──▶ {kind}_{date}.csv
//! │ (map/check) │     │ (CSV, auto) │────▶│  (quoted)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use campusdesk::{ClientConfig, EntityKind, FetchOptions, HttpRecordApi, ListView};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::from_env()?;
//!     let api = HttpRecordApi::new(&config)?;
//!
//!     let view = ListView::new(EntityKind::Student);
//!     view.refresh(&api, FetchOptions::default()).await;
//!     view.set_query("smith");
//!     println!("{} matches", view.rows().total_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Records, entity kinds and the field registry
//! - [`codec`] - Delimited text with encoding/delimiter detection
//! - [`api`] - Remote collaborator traits and the HTTP client
//! - [`fetch`] - Paginated fetch aggregation
//! - [`query`] - Search, filters, sort and paging
//! - [`validation`] - Import row checks
//! - [`import`] - Import pipeline
//! - [`export`] - Export pipeline
//! - [`debounce`] - Trailing-edge debounce
//! - [`view`] - List view state for a consuming screen
//! - [`config`] - Defaults and environment configuration
//! - [`logs`] - Broadcast progress logging

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Codec
pub mod codec;

// Remote API
pub mod api;
pub mod fetch;

// In-memory views
pub mod debounce;
pub mod query;
pub mod view;

// Bulk operations
pub mod export;
pub mod import;
pub mod validation;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ApiError, ClientError, CodecError, ConfigError, ExportError, FetchError, ImportError,
    ValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{ColumnSpec, EntityKind, EntitySchema, Record};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{ClientConfig, ImportLimits};

// =============================================================================
// Re-exports - Codec
// =============================================================================

pub use codec::{decode_table, encode_table, parse_bytes_auto, ParsedTable, Table};

// =============================================================================
// Re-exports - Remote API
// =============================================================================

pub use api::{HttpRecordApi, PageRequest, PageSource, RecordSink};

// =============================================================================
// Re-exports - Fetch & Query
// =============================================================================

pub use fetch::{fetch_all, fetch_all_or_empty, Aggregation, Completeness, FetchOptions};
pub use query::{apply, ColumnFilter, DateRange, QueryResult, SortDirection, SortSpec, ViewSpec};

// =============================================================================
// Re-exports - Import / Export
// =============================================================================

pub use export::{export_filename, render, write_export, ExportExtension};
pub use import::{import_bytes, import_file, ImportReport, ImportRow};

// =============================================================================
// Re-exports - Views
// =============================================================================

pub use debounce::{debounce, Debounced};
pub use view::{CacheState, ListView, SearchBox};
