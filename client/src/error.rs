//! Error types for the CampusDesk data layer.
//!
//! The hierarchy follows the shape of the data flow:
//!
//! - [`CodecError`] - delimited-text decoding/encoding errors
//! - [`ApiError`] - remote record API failures (transport, status, body)
//! - [`FetchError`] - a listing that could not be aggregated at all
//! - [`ValidationError`] - a single field failing an import check
//! - [`ImportError`] - outer failures that abort an import
//! - [`ExportError`] - export rendering and file writing errors
//! - [`ConfigError`] - missing or malformed configuration
//! - [`ClientError`] - top-level error for CLI orchestration
//!
//! Row-level and page-level problems are reported as values inside the
//! pipeline results; only whole-operation failures become `Err`.

use thiserror::Error;

// =============================================================================
// Codec Errors
// =============================================================================

/// Errors while decoding or encoding delimited text.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The underlying CSV reader/writer failed.
    #[error("Invalid delimited text: {0}")]
    Csv(#[from] csv::Error),

    /// Writing the encoded table to memory failed.
    #[error("Failed to write delimited text: {0}")]
    Write(String),

    /// No content at all.
    #[error("File is empty")]
    EmptyFile,

    /// Header row present but blank.
    #[error("No headers found")]
    NoHeaders,
}

// =============================================================================
// Remote API Errors
// =============================================================================

/// Errors from the remote record API.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// The request never produced a response (unreachable host, refused
    /// connection, CORS rejection, timeout).
    #[error("Network error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("request failed"))]
    Status {
        status: u16,
        message: Option<String>,
    },

    /// The response body was not the JSON we expected.
    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a status error, pulling `message` or `error` out of a JSON body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .or_else(|| v.get("error"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty() && trimmed.len() <= 200).then(|| trimmed.to_string())
            });
        ApiError::Status { status, message }
    }

    /// True for connectivity failures, so callers can show a network-specific
    /// message.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// Message suitable for an import error line.
    pub fn diagnostic(&self) -> String {
        match self {
            ApiError::Status {
                message: Some(m), ..
            } => m.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status {
                status: status.as_u16(),
                message: None,
            }
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

// =============================================================================
// Fetch Errors
// =============================================================================

/// A listing that produced nothing: the first page and the unpaginated
/// fallback both failed.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Listing '{endpoint}' unavailable: {first} (fallback: {fallback})")]
    Unavailable {
        endpoint: String,
        first: ApiError,
        fallback: ApiError,
    },
}

impl FetchError {
    /// True when both attempts failed at the transport level.
    pub fn is_transport(&self) -> bool {
        match self {
            FetchError::Unavailable {
                first, fallback, ..
            } => first.is_transport() && fallback.is_transport(),
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// A single field failing an import check.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// Required field absent or blank.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Value present but malformed.
    #[error("Invalid {field}: '{value}' {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },
}

// =============================================================================
// Import Errors
// =============================================================================

/// Outer failures that abort an import before any row is submitted.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Could not read the file.
    #[error("Failed to read file: {0}")]
    Unreadable(#[from] std::io::Error),

    /// Extension is not one of csv, xlsx, xls.
    #[error("Unsupported file type '{0}' (expected .csv, .xlsx or .xls)")]
    UnsupportedExtension(String),

    /// A genuine binary spreadsheet was supplied.
    #[error("'{0}' is a binary spreadsheet; save it as CSV and retry")]
    BinarySpreadsheet(String),

    /// File exceeds the configured size bound.
    #[error("File is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    /// Table exceeds the configured row bound.
    #[error("File has {rows} data rows, limit is {limit}")]
    TooManyRows { rows: usize, limit: usize },

    /// Delimited text could not be decoded.
    #[error("Parse error: {0}")]
    Codec(#[from] CodecError),

    /// Headers parsed but no data rows.
    #[error("No data rows found")]
    NoRows,
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while exporting the current view.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Encoding failed.
    #[error("Export encoding failed: {0}")]
    Codec(#[from] CodecError),

    /// Writing the export file failed.
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),

    /// Column spec was empty.
    #[error("No columns to export")]
    NoColumns,
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Missing or malformed configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

// =============================================================================
// Client Errors (top-level)
// =============================================================================

/// Top-level error used by the CLI.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Invalid argument: {0}")]
    BadArgument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Result type for remote API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type for listing aggregation.
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type for imports.
pub type ImportResult<T> = Result<T, ImportError>;

/// Result type for exports.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for CLI commands.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let codec_err = CodecError::EmptyFile;
        let import_err: ImportError = codec_err.into();
        assert!(import_err.to_string().contains("empty"));

        let client_err: ClientError = import_err.into();
        assert!(client_err.to_string().starts_with("Import error"));
    }

    #[test]
    fn test_status_message_from_json_body() {
        let err = ApiError::from_status(409, r#"{"message":"Email already exists"}"#);
        assert_eq!(
            err,
            ApiError::Status {
                status: 409,
                message: Some("Email already exists".into())
            }
        );
        assert_eq!(err.diagnostic(), "Email already exists");
        assert!(!err.is_transport());
    }

    #[test]
    fn test_status_message_from_error_key() {
        let err = ApiError::from_status(400, r#"{"error":"Bad school code"}"#);
        assert_eq!(err.diagnostic(), "Bad school code");
    }

    #[test]
    fn test_status_without_body() {
        let err = ApiError::from_status(500, "");
        assert_eq!(err.to_string(), "HTTP 500: request failed");
    }

    #[test]
    fn test_transport_is_distinguishable() {
        let err = ApiError::Transport("connection refused".into());
        assert!(err.is_transport());

        let fetch = FetchError::Unavailable {
            endpoint: "students".into(),
            first: err.clone(),
            fallback: err,
        };
        assert!(fetch.is_transport());
    }

    #[test]
    fn test_validation_error_format() {
        let err = ValidationError::InvalidValue {
            field: "email".into(),
            value: "nope".into(),
            message: "is not a valid email address".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("email"));
        assert!(msg.contains("nope"));
    }
}
