// In-memory Payload client: HashMap-based store speaking Payload's query dialect.
//
// Stores documents in `HashMap<String, Vec<serde_json::Value>>` keyed by
// collection slug. Thread-safe via `tokio::sync::RwLock`. Evaluates translated
// `where` objects (and/or groups, equals, not_equals, greater_than(_equal),
// less_than(_equal), in, not_in, contains, like, exists), sort strings, select
// maps and page/limit pagination.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use better_auth_core::utils::generate_id;

use crate::client::{FindArgs, PaginatedDocs, PayloadClient};
use crate::collection::CollectionConfig;
use crate::config::IdType;
use crate::error::{PayloadAdapterError, PayloadResult};

/// Type alias for the in-memory store.
type Store = HashMap<String, Vec<Value>>;

/// In-memory Payload client.
///
/// Cloning shares the store. Data is lost when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct MemoryPayload {
    store: Arc<RwLock<Store>>,
    /// Known slugs. `None` accepts any collection.
    collections: Option<Arc<HashSet<String>>>,
    id_type: IdType,
    next_id: Arc<AtomicI64>,
}

impl Default for MemoryPayload {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPayload {
    /// An empty store accepting any collection slug, with text ids.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            collections: None,
            id_type: IdType::Text,
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    /// A store that only knows the given collections. Operations on any
    /// other slug fail with `CollectionNotFound`, as Payload does.
    pub fn from_collections(collections: &[CollectionConfig]) -> Self {
        let slugs: HashSet<String> = collections.iter().map(|c| c.slug.clone()).collect();
        Self {
            collections: Some(Arc::new(slugs)),
            ..Self::new()
        }
    }

    /// Generate serial numeric ids instead of text ids.
    pub fn with_id_type(mut self, id_type: IdType) -> Self {
        self.id_type = id_type;
        self
    }

    /// Store a document exactly as given, bypassing id and timestamp generation.
    pub async fn insert_raw(&self, collection: &str, doc: Value) {
        self.store
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }

    /// Get a snapshot of all data (for debugging/testing).
    pub async fn snapshot(&self) -> Store {
        self.store.read().await.clone()
    }

    /// Number of documents stored in `collection`.
    pub async fn collection_len(&self, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn check_collection(&self, collection: &str) -> PayloadResult<()> {
        match &self.collections {
            Some(known) if !known.contains(collection) => {
                Err(PayloadAdapterError::CollectionNotFound(collection.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn new_id(&self) -> Value {
        match self.id_type {
            IdType::Text => Value::String(generate_id()),
            IdType::Number => Value::from(self.next_id.fetch_add(1, AtomicOrdering::SeqCst)),
        }
    }
}

fn now() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

// ─── Where Evaluation ────────────────────────────────────────────

/// Check if a document matches a Payload where object. `{}` matches everything.
fn matches_where(doc: &Value, where_: &Value) -> bool {
    let Some(conditions) = where_.as_object() else {
        return true;
    };
    conditions.iter().all(|(key, condition)| match key.as_str() {
        "and" => condition
            .as_array()
            .map_or(true, |all| all.iter().all(|c| matches_where(doc, c))),
        "or" => condition
            .as_array()
            .map_or(true, |any| any.is_empty() || any.iter().any(|c| matches_where(doc, c))),
        field => {
            let value = doc.get(field).unwrap_or(&Value::Null);
            match condition.as_object() {
                Some(ops) => ops
                    .iter()
                    .all(|(op, operand)| match_operator(value, op, operand)),
                None => loosely_equal(value, condition),
            }
        }
    })
}

/// Match a single Payload operator.
fn match_operator(value: &Value, op: &str, operand: &Value) -> bool {
    match op {
        "equals" => loosely_equal(value, operand),
        "not_equals" => !loosely_equal(value, operand),
        "greater_than" => compare_json(value, operand) == Some(Ordering::Greater),
        "greater_than_equal" => matches!(
            compare_json(value, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        "less_than" => compare_json(value, operand) == Some(Ordering::Less),
        "less_than_equal" => matches!(
            compare_json(value, operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        "in" => operand
            .as_array()
            .is_some_and(|items| items.iter().any(|item| loosely_equal(value, item))),
        "not_in" => !operand
            .as_array()
            .is_some_and(|items| items.iter().any(|item| loosely_equal(value, item))),
        "contains" => match (value, operand) {
            (Value::String(s), Value::String(needle)) => {
                s.to_lowercase().contains(&needle.to_lowercase())
            }
            (Value::Array(items), needle) => items.iter().any(|item| loosely_equal(item, needle)),
            _ => false,
        },
        "like" => match (value.as_str(), operand.as_str()) {
            (Some(s), Some(pattern)) => like_match(s, pattern),
            _ => false,
        },
        "exists" => operand.as_bool() == Some(!value.is_null()),
        _ => false,
    }
}

/// Equality that treats `1` and `1.0` as equal and lets a has-many
/// relationship array match any of its ids.
fn loosely_equal(value: &Value, operand: &Value) -> bool {
    match (value, operand) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(items), operand) if !operand.is_array() => {
            items.iter().any(|item| loosely_equal(item, operand))
        }
        _ => value == operand,
    }
}

/// Compare two JSON values numerically/lexicographically.
fn compare_json(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Case-insensitive SQL `LIKE` with `%` wildcards.
fn like_match(value: &str, pattern: &str) -> bool {
    let body: Vec<String> = pattern.split('%').map(regex::escape).collect();
    Regex::new(&format!("(?is)^{}$", body.join(".*")))
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

// ─── Sort / Select / Merge ───────────────────────────────────────

/// Apply a Payload sort string (`field`, `-field`, comma-separated).
fn sort_docs(docs: &mut [Value], sort: &str) {
    let keys: Vec<(&str, bool)> = sort
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| match k.strip_prefix('-') {
            Some(field) => (field, true),
            None => (k, false),
        })
        .collect();

    docs.sort_by(|a, b| {
        for (field, descending) in &keys {
            let ordering = match (a.get(*field), b.get(*field)) {
                (Some(av), Some(bv)) => compare_json(av, bv).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            };
            let ordering = if *descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// Apply a select map. `id` is always kept.
fn select_fields(doc: &Value, select: &Map<String, Value>) -> Value {
    let Some(fields) = doc.as_object() else {
        return doc.clone();
    };
    let projected: Map<String, Value> = fields
        .iter()
        .filter(|(k, _)| k.as_str() == "id" || select.get(*k).and_then(Value::as_bool) == Some(true))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Value::Object(projected)
}

/// Merge update data into an existing document and bump `updatedAt`.
fn merge_update(doc: &mut Value, data: &Value) {
    if let (Some(target), Some(changes)) = (doc.as_object_mut(), data.as_object()) {
        for (k, v) in changes {
            if k != "id" {
                target.insert(k.clone(), v.clone());
            }
        }
        if !changes.contains_key("updatedAt") {
            target.insert("updatedAt".to_string(), now());
        }
    }
}

fn has_id(doc: &Value, id: &Value) -> bool {
    doc.get("id").is_some_and(|doc_id| loosely_equal(doc_id, id))
}

// ─── PayloadClient ───────────────────────────────────────────────

#[async_trait]
impl PayloadClient for MemoryPayload {
    async fn find(&self, args: FindArgs) -> PayloadResult<PaginatedDocs> {
        self.check_collection(&args.collection)?;
        let store = self.store.read().await;
        let mut docs: Vec<Value> = store
            .get(&args.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| matches_where(d, &args.where_))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(store);

        if let Some(sort) = args.sort.as_deref() {
            sort_docs(&mut docs, sort);
        }

        let total_docs = docs.len() as i64;
        let page = args.page.unwrap_or(1).max(1);
        let (docs, total_pages, limit) = match args.limit.filter(|l| *l > 0) {
            Some(limit) => {
                let start = (page - 1).checked_mul(limit).unwrap_or(i64::MAX);
                let window: Vec<Value> = docs
                    .into_iter()
                    .skip(usize::try_from(start).unwrap_or(usize::MAX))
                    .take(usize::try_from(limit).unwrap_or(usize::MAX))
                    .collect();
                let total_pages = total_docs / limit + i64::from(total_docs % limit != 0);
                (window, total_pages, Some(limit))
            }
            None => (docs, i64::from(total_docs > 0), None),
        };

        let docs = match &args.select {
            Some(select) => docs.iter().map(|d| select_fields(d, select)).collect(),
            None => docs,
        };

        Ok(PaginatedDocs {
            docs,
            total_docs,
            limit,
            page,
            total_pages,
            has_next_page: page < total_pages,
        })
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &Value,
        _depth: u32,
    ) -> PayloadResult<Option<Value>> {
        self.check_collection(collection)?;
        let store = self.store.read().await;
        Ok(store
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| has_id(d, id)))
            .cloned())
    }

    async fn create(&self, collection: &str, data: Value) -> PayloadResult<Value> {
        self.check_collection(collection)?;
        let Value::Object(mut doc) = data else {
            return Err(PayloadAdapterError::Client(format!(
                "Cannot create a document in '{collection}' from a non-object value"
            )));
        };
        if doc.get("id").map_or(true, Value::is_null) {
            doc.insert("id".to_string(), self.new_id());
        }
        let timestamp = now();
        doc.entry("createdAt").or_insert_with(|| timestamp.clone());
        doc.entry("updatedAt").or_insert(timestamp);

        let doc = Value::Object(doc);
        self.store
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        where_: &Value,
        data: Value,
    ) -> PayloadResult<Vec<Value>> {
        self.check_collection(collection)?;
        let mut store = self.store.write().await;
        let mut updated = Vec::new();
        if let Some(docs) = store.get_mut(collection) {
            for doc in docs.iter_mut().filter(|d| matches_where(d, where_)) {
                merge_update(doc, &data);
                updated.push(doc.clone());
            }
        }
        Ok(updated)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &Value,
        data: Value,
    ) -> PayloadResult<Option<Value>> {
        self.check_collection(collection)?;
        let mut store = self.store.write().await;
        let Some(doc) = store
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| has_id(d, id)))
        else {
            return Ok(None);
        };
        merge_update(doc, &data);
        Ok(Some(doc.clone()))
    }

    async fn delete(&self, collection: &str, where_: &Value) -> PayloadResult<Vec<Value>> {
        self.check_collection(collection)?;
        let mut store = self.store.write().await;
        let Some(docs) = store.get_mut(collection) else {
            return Ok(Vec::new());
        };
        let (deleted, kept): (Vec<Value>, Vec<Value>) =
            docs.drain(..).partition(|d| matches_where(d, where_));
        *docs = kept;
        Ok(deleted)
    }

    async fn delete_by_id(&self, collection: &str, id: &Value) -> PayloadResult<Option<Value>> {
        self.check_collection(collection)?;
        let mut store = self.store.write().await;
        let Some(docs) = store.get_mut(collection) else {
            return Ok(None);
        };
        let position = docs.iter().position(|d| has_id(d, id));
        Ok(position.map(|pos| docs.remove(pos)))
    }

    async fn count(&self, collection: &str, where_: &Value) -> PayloadResult<i64> {
        self.check_collection(collection)?;
        let store = self.store.read().await;
        Ok(store
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches_where(d, where_)).count() as i64)
            .unwrap_or(0))
    }
}
