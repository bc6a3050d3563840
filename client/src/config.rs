//! Client configuration.
//!
//! Defaults live in constants; [`ClientConfig::from_env`] reads overrides from
//! the environment (and a `.env` file when present).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Records requested per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Upper bound on pages fetched by one aggregation.
pub const DEFAULT_MAX_PAGES: usize = 500;

/// Quiet period before a search box updates the query.
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// Rows shown per page in list views.
pub const DEFAULT_VIEW_PAGE_SIZE: usize = 10;

/// Maximum import file size (in bytes).
///
/// 10 MB limit.
pub const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;

/// Maximum data rows per import.
pub const MAX_IMPORT_ROWS: usize = 5_000;

/// Per-request timeout for the records API.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

const ENV_API_URL: &str = "CAMPUSDESK_API_URL";
const ENV_API_TOKEN: &str = "CAMPUSDESK_API_TOKEN";
const ENV_PAGE_SIZE: &str = "CAMPUSDESK_PAGE_SIZE";
const ENV_TIMEOUT: &str = "CAMPUSDESK_TIMEOUT_SECS";
const ENV_EXPORT_DIR: &str = "CAMPUSDESK_EXPORT_DIR";

/// Bounds applied before an import submits anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportLimits {
    pub max_bytes: usize,
    pub max_rows: usize,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_bytes: MAX_IMPORT_BYTES,
            max_rows: MAX_IMPORT_ROWS,
        }
    }
}

/// Runtime configuration for the records API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the records API, e.g. `https://api.campusdesk.io/api`.
    pub api_url: String,
    /// Bearer token sent with every request.
    pub api_token: Option<String>,
    pub page_size: usize,
    pub max_pages: usize,
    pub request_timeout: Duration,
    pub search_debounce: Duration,
    pub import_limits: ImportLimits,
    /// Where exports are written.
    pub export_dir: PathBuf,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            search_debounce: Duration::from_millis(SEARCH_DEBOUNCE_MS),
            import_limits: ImportLimits::default(),
            export_dir: PathBuf::from("."),
        }
    }

    /// Load from `CAMPUSDESK_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();

        let api_url = env::var(ENV_API_URL).map_err(|_| ConfigError::Missing(ENV_API_URL))?;
        let mut config = Self::new(api_url);

        config.api_token = env::var(ENV_API_TOKEN).ok().filter(|t| !t.trim().is_empty());

        if let Ok(raw) = env::var(ENV_PAGE_SIZE) {
            config.page_size = parse_positive(ENV_PAGE_SIZE, &raw)?;
        }
        if let Ok(raw) = env::var(ENV_TIMEOUT) {
            config.request_timeout = Duration::from_secs(parse_positive(ENV_TIMEOUT, &raw)? as u64);
        }
        if let Ok(dir) = env::var(ENV_EXPORT_DIR) {
            config.export_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

fn parse_positive(key: &'static str, raw: &str) -> ConfigResult<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(_) => Err(ConfigError::Invalid {
            key,
            message: "must be greater than zero".to_string(),
        }),
        Err(e) => Err(ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("http://localhost:8080/api");
        assert_eq!(config.page_size, 100);
        assert_eq!(config.search_debounce, Duration::from_millis(300));
        assert_eq!(config.import_limits.max_rows, MAX_IMPORT_ROWS);
        assert!(config.api_token.is_none());
    }

    #[test]
    fn test_page_size_never_zero() {
        let config = ClientConfig::new("http://x").with_page_size(0);
        assert_eq!(config.page_size, 1);
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive(ENV_PAGE_SIZE, " 50 ").unwrap(), 50);
        assert!(parse_positive(ENV_PAGE_SIZE, "0").is_err());
        assert!(parse_positive(ENV_PAGE_SIZE, "many").is_err());
    }
}
