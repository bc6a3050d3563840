//! In-memory record API used by unit tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;

use crate::api::{PageRequest, PageSource, RecordSink};
use crate::error::{ApiError, ApiResult};
use crate::models::Record;

#[derive(Debug, Clone, Copy)]
pub enum Shape {
    Bare,
    Content,
    Data,
}

pub struct FakeApi {
    items: Mutex<Vec<Value>>,
    shape: Shape,
    body: Option<Value>,
    fail_paged: Option<ApiError>,
    fail_unpaged: Option<ApiError>,
    fail_pages: Vec<usize>,
    ignore_paging: bool,
    delay: Option<Duration>,
    reject_emails: Vec<String>,
    requests: Mutex<Vec<Option<(usize, usize)>>>,
    created: Mutex<Vec<(String, Record)>>,
}

impl FakeApi {
    pub fn new(items: Vec<Value>, shape: Shape) -> Self {
        Self {
            items: Mutex::new(items),
            shape,
            body: None,
            fail_paged: None,
            fail_unpaged: None,
            fail_pages: Vec::new(),
            ignore_paging: false,
            delay: None,
            reject_emails: Vec::new(),
            requests: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn with_items(n: usize, shape: Shape) -> Self {
        let items = (0..n)
            .map(|i| json!({ "id": i, "name": format!("Record {}", i) }))
            .collect();
        Self::new(items, shape)
    }

    /// Answer every request with the same body.
    pub fn with_body(body: Value) -> Self {
        let mut api = Self::new(Vec::new(), Shape::Bare);
        api.body = Some(body);
        api
    }

    pub fn fail_paged_status(mut self, status: u16) -> Self {
        self.fail_paged = Some(ApiError::Status {
            status,
            message: Some("Internal Server Error".into()),
        });
        self
    }

    pub fn fail_everything(mut self) -> Self {
        let err = ApiError::Transport("connection refused".into());
        self.fail_paged = Some(err.clone());
        self.fail_unpaged = Some(err);
        self
    }

    pub fn fail_page(mut self, page: usize) -> Self {
        self.fail_pages.push(page);
        self
    }

    pub fn ignore_paging(mut self) -> Self {
        self.ignore_paging = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn reject_email(mut self, email: &str) -> Self {
        self.reject_emails.push(email.to_string());
        self
    }

    pub fn requests(&self) -> Vec<Option<(usize, usize)>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<(String, Record)> {
        self.created.lock().unwrap().clone()
    }

    pub fn all_ids(&self) -> Vec<String> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .filter_map(|v| v.get("id").map(|id| id.to_string().trim_matches('"').to_string()))
            .collect()
    }

    fn wrap(&self, items: Vec<Value>, last: bool, total: usize) -> Value {
        match self.shape {
            Shape::Bare => Value::Array(items),
            Shape::Content => json!({ "content": items, "last": last, "totalElements": total }),
            Shape::Data => json!({ "data": items, "last": last, "totalElements": total }),
        }
    }
}

#[async_trait]
impl PageSource for FakeApi {
    async fn get_listing(&self, _endpoint: &str, page: Option<PageRequest>) -> ApiResult<Value> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.requests.lock().unwrap().push(page.map(|p| (p.page, p.size)));

        if let Some(body) = &self.body {
            return Ok(body.clone());
        }

        let items = self.items.lock().unwrap().clone();
        match page {
            Some(p) => {
                if let Some(err) = &self.fail_paged {
                    return Err(err.clone());
                }
                if self.fail_pages.contains(&p.page) {
                    return Err(ApiError::Transport("connection reset".into()));
                }
                let start = if self.ignore_paging { 0 } else { (p.page * p.size).min(items.len()) };
                let end = (start + p.size).min(items.len());
                let last = end >= items.len();
                Ok(self.wrap(items[start..end].to_vec(), last, items.len()))
            }
            None => {
                if let Some(err) = &self.fail_unpaged {
                    return Err(err.clone());
                }
                let total = items.len();
                Ok(self.wrap(items, true, total))
            }
        }
    }
}

#[async_trait]
impl RecordSink for FakeApi {
    async fn create(&self, path: &str, record: &Record) -> ApiResult<Value> {
        self.created.lock().unwrap().push((path.to_string(), record.clone()));

        if let Some(email) = record.text("email") {
            if self.reject_emails.contains(&email) {
                return Err(ApiError::Status {
                    status: 409,
                    message: Some("Email already exists".into()),
                });
            }
        }

        let mut items = self.items.lock().unwrap();
        let mut stored = record.clone();
        stored.insert("id", items.len());
        items.push(stored.clone().into_value());
        Ok(stored.into_value())
    }
}
