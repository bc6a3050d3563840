//! `reqwest` implementation of the record API seams.

use async_trait::async_trait;
use serde_json::Value;

use super::{PageRequest, PageSource, RecordSink};
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::Record;

/// HTTP client for the records API.
#[derive(Clone)]
pub struct HttpRecordApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRecordApi {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join the base URL, the endpoint and optional paging parameters.
    pub fn url(&self, endpoint: &str, page: Option<PageRequest>) -> String {
        let mut url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        if let Some(p) = page {
            let sep = if url.contains('?') { '&' } else { '?' };
            url.push_str(&format!("{}page={}&size={}", sep, p.page, p.size));
        }
        url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> ApiResult<Value> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PageSource for HttpRecordApi {
    async fn get_listing(&self, endpoint: &str, page: Option<PageRequest>) -> ApiResult<Value> {
        let url = self.url(endpoint, page);
        log::debug!("GET {}", url);
        self.send(self.client.get(&url)).await
    }
}

#[async_trait]
impl RecordSink for HttpRecordApi {
    async fn create(&self, path: &str, record: &Record) -> ApiResult<Value> {
        let url = self.url(path, None);
        log::debug!("POST {}", url);
        self.send(self.client.post(&url).json(record)).await
    }
}
