//! Listing response shapes and the normalized page descriptor.

use serde_json::Value;

use crate::models::Record;

/// The response shapes the records API is known to produce.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingShape {
    /// `[ ... ]`
    Bare(Vec<Value>),
    /// `{ "content": [...], "last": bool, ... }`
    Content { items: Vec<Value>, last: Option<bool> },
    /// `{ "data": [...], "last": bool, ... }`
    Data { items: Vec<Value>, last: Option<bool> },
    /// Anything else.
    Unrecognized,
}

impl ListingShape {
    /// Classify a response body. `content` is checked before `data`.
    pub fn sniff(body: Value) -> Self {
        match body {
            Value::Array(items) => ListingShape::Bare(items),
            Value::Object(mut map) => {
                let last = map.get("last").and_then(Value::as_bool);
                if let Some(Value::Array(items)) = map.remove("content") {
                    ListingShape::Content { items, last }
                } else if let Some(Value::Array(items)) = map.remove("data") {
                    ListingShape::Data { items, last }
                } else {
                    ListingShape::Unrecognized
                }
            }
            _ => ListingShape::Unrecognized,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ListingShape::Bare(_) => "array",
            ListingShape::Content { .. } => "content",
            ListingShape::Data { .. } => "data",
            ListingShape::Unrecognized => "unrecognized",
        }
    }
}

/// One page of a listing, independent of the wire shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Record>,
    /// Explicit last-page flag from the server. Bare arrays never set it.
    pub is_last: bool,
    pub page_size: usize,
    /// Items that were not JSON objects and were dropped.
    pub skipped: usize,
}

impl Page {
    pub fn from_shape(shape: ListingShape, page_size: usize) -> Self {
        let (raw, is_last) = match shape {
            ListingShape::Bare(items) => (items, false),
            ListingShape::Content { items, last } | ListingShape::Data { items, last } => {
                (items, last.unwrap_or(false))
            }
            ListingShape::Unrecognized => (Vec::new(), true),
        };

        let total = raw.len();
        let items: Vec<Record> = raw.into_iter().filter_map(Record::from_value).collect();
        let skipped = total - items.len();

        Self {
            items,
            is_last,
            page_size,
            skipped,
        }
    }

    pub fn from_response(body: Value, page_size: usize) -> Self {
        Self::from_shape(ListingShape::sniff(body), page_size)
    }

    /// Items as received, including dropped non-objects. Continuation is
    /// decided on this count so a malformed item cannot end a listing early.
    pub fn received(&self) -> usize {
        self.items.len() + self.skipped
    }

    /// Whether another page should be requested. A short page is always the
    /// last, whatever the server's flag says.
    pub fn has_more(&self) -> bool {
        !self.is_last && self.received() == self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items(n: usize) -> Vec<Value> {
        (0..n).map(|i| json!({ "id": i })).collect()
    }

    #[test]
    fn test_sniff_shapes() {
        assert_eq!(ListingShape::sniff(json!([])).name(), "array");
        assert_eq!(ListingShape::sniff(json!({ "content": [], "last": true })).name(), "content");
        assert_eq!(ListingShape::sniff(json!({ "data": [] })).name(), "data");
        assert_eq!(ListingShape::sniff(json!({ "items": [] })).name(), "unrecognized");
        assert_eq!(ListingShape::sniff(json!({ "content": "nope" })).name(), "unrecognized");
        assert_eq!(ListingShape::sniff(json!("text")).name(), "unrecognized");
    }

    #[test]
    fn test_bare_array_continues_on_full_page() {
        let page = Page::from_response(Value::Array(items(10)), 10);
        assert!(!page.is_last);
        assert!(page.has_more());

        let page = Page::from_response(Value::Array(items(9)), 10);
        assert!(!page.has_more());
    }

    #[test]
    fn test_content_respects_last_flag() {
        let page = Page::from_response(json!({ "content": items(10), "last": true }), 10);
        assert!(!page.has_more());

        let page = Page::from_response(json!({ "content": items(10), "last": false }), 10);
        assert!(page.has_more());
    }

    #[test]
    fn test_short_page_is_last_even_without_flag() {
        let page = Page::from_response(json!({ "data": items(3), "last": false }), 10);
        assert!(!page.is_last);
        assert!(!page.has_more());
    }

    #[test]
    fn test_missing_last_flag_defaults_to_continue() {
        let page = Page::from_response(json!({ "data": items(5), "totalElements": 12 }), 5);
        assert!(page.has_more());
    }

    #[test]
    fn test_unrecognized_is_empty_and_last() {
        let page = Page::from_response(json!({ "rows": items(5) }), 5);
        assert!(page.items.is_empty());
        assert!(page.is_last);
        assert!(!page.has_more());
    }

    #[test]
    fn test_non_object_items_are_dropped() {
        let page = Page::from_response(json!([{ "id": 1 }, 2, "x", { "id": 3 }]), 4);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.skipped, 2);
        assert!(page.has_more());
    }
}
