// PayloadClient: the query execution layer the adapter talks to.
//
// Shaped after Payload's local API (`payload.find`, `payload.findByID`,
// `payload.create`, ...). Queries arrive already translated: `where` is a
// Payload where object, `sort` a Payload sort string, `select` a projection map.
// Implementations wrap a real Payload instance (over HTTP or an embedded
// runtime); `MemoryPayload` is the in-process one.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::PayloadResult;

/// Arguments of a `find` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindArgs {
    pub collection: String,
    #[serde(rename = "where")]
    pub where_: Value,
    /// Page size. `None` disables pagination and returns every match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// 1-based page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Map<String, Value>>,
    /// Relationship population depth. The adapter always asks for 0.
    #[serde(default)]
    pub depth: u32,
}

impl FindArgs {
    /// Find everything in `collection`.
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            where_: json!({}),
            limit: None,
            page: None,
            sort: None,
            select: None,
            depth: 0,
        }
    }

    pub fn with_where(mut self, where_: Value) -> Self {
        self.where_ = where_;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_sort(mut self, sort: Option<String>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_select(mut self, select: Option<Map<String, Value>>) -> Self {
        self.select = select;
        self
    }
}

/// A page of `find` results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedDocs {
    pub docs: Vec<Value>,
    pub total_docs: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    pub page: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
}

/// Operations the adapter needs from Payload.
///
/// Documents use storage field names; the adapter does all name translation.
#[async_trait]
pub trait PayloadClient: Send + Sync + fmt::Debug {
    async fn find(&self, args: FindArgs) -> PayloadResult<PaginatedDocs>;

    /// Fetch a document by id. `Ok(None)` when it does not exist.
    async fn find_by_id(&self, collection: &str, id: &Value, depth: u32)
        -> PayloadResult<Option<Value>>;

    /// Create a document and return it as stored.
    async fn create(&self, collection: &str, data: Value) -> PayloadResult<Value>;

    /// Update every document matching `where_`. Returns the updated documents.
    async fn update(&self, collection: &str, where_: &Value, data: Value)
        -> PayloadResult<Vec<Value>>;

    async fn update_by_id(&self, collection: &str, id: &Value, data: Value)
        -> PayloadResult<Option<Value>>;

    /// Delete every document matching `where_`. Returns the deleted documents.
    async fn delete(&self, collection: &str, where_: &Value) -> PayloadResult<Vec<Value>>;

    async fn delete_by_id(&self, collection: &str, id: &Value) -> PayloadResult<Option<Value>>;

    async fn count(&self, collection: &str, where_: &Value) -> PayloadResult<i64>;
}
