// PayloadAdapter: implementation of the core Adapter trait on top of Payload CMS.
//
// Every call resolves the model's collection slug, translates where/select/sort
// into Payload's query language, renames input keys to storage names, runs the
// operation through a `PayloadClient` and maps stored documents back to the
// logical shape.
//
// Key behaviors:
// - a single `id = x` condition goes through the by-id endpoints
// - offset/limit become Payload page/limit
// - reads always use `depth: 0` so relationships arrive as ids
// - `debugLogs`: one tracing line per operation

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use better_auth_core::db::adapter::{
    Adapter, AdapterResult, FindManyQuery, Operator, WhereClause,
};
use better_auth_core::db::schema::AuthSchema;

use crate::client::{FindArgs, PayloadClient};
use crate::collection::CollectionConfig;
use crate::config::{IdType, PayloadAdapterConfig};
use crate::query::{convert_select, convert_sort, convert_where_clause, normalize_operand};
use crate::resolver::{is_id_field, FieldResolver};
use crate::sync::{ResolvedSchema, SchemaSync};
use crate::transform::{transform_input, transform_output};

/// Payload CMS database adapter.
///
/// Cloning shares the client and the resolved schema.
#[derive(Debug, Clone)]
pub struct PayloadAdapter {
    client: Arc<dyn PayloadClient>,
    schema: ResolvedSchema,
    config: PayloadAdapterConfig,
}

impl PayloadAdapter {
    /// Create an adapter over an already resolved schema.
    pub fn new(
        client: Arc<dyn PayloadClient>,
        schema: ResolvedSchema,
        config: PayloadAdapterConfig,
    ) -> Self {
        Self {
            client,
            schema,
            config,
        }
    }

    /// Reconcile `schema` with the built `collections` and create the adapter.
    ///
    /// Call once, after Payload has finished building its collections.
    pub fn init(
        schema: AuthSchema,
        collections: &[CollectionConfig],
        client: Arc<dyn PayloadClient>,
        config: PayloadAdapterConfig,
    ) -> Self {
        let schema = SchemaSync::new(schema)
            .with_logger(&config.logger)
            .run(collections);
        if config.log_tables {
            let logger = config.logger.scoped("payload-adapter");
            for model in schema.model_keys() {
                if let Some(table) = schema.get(&model) {
                    logger.info(format!("Model '{}' -> collection '{}'", model, table.model_name));
                }
            }
        }
        Self::new(client, schema, config)
    }

    pub fn adapter_id(&self) -> &'static str {
        "payload"
    }

    pub fn adapter_name(&self) -> &'static str {
        "Payload Adapter"
    }

    pub fn schema(&self) -> &ResolvedSchema {
        &self.schema
    }

    pub fn config(&self) -> &PayloadAdapterConfig {
        &self.config
    }

    /// Get a reference to the underlying client.
    pub fn client(&self) -> &Arc<dyn PayloadClient> {
        &self.client
    }

    fn resolver(&self) -> FieldResolver<'_> {
        FieldResolver::new(&self.schema, &self.config.logger)
    }

    fn log(&self, op: &str, model: &str, collection: &str) {
        if self.config.debug_logs {
            tracing::debug!(
                "[Payload Adapter] {} on '{}' (collection: '{}')",
                op,
                model,
                collection
            );
        }
    }

    /// Should `model`.`field` carry ids of the store's id type?
    fn holds_ids(&self, resolver: &FieldResolver<'_>, model: &str, field: &str) -> bool {
        is_id_field(field) || resolver.is_relationship(model, field)
    }

    /// Convert id operands to the store's id type.
    fn coerce_where(
        &self,
        resolver: &FieldResolver<'_>,
        model: &str,
        clauses: &[WhereClause],
    ) -> Vec<WhereClause> {
        let id_type = self.config.id_type;
        clauses
            .iter()
            .map(|clause| {
                let mut clause = clause.clone();
                if id_type == IdType::Number && self.holds_ids(resolver, model, &clause.field) {
                    clause.value = coerce_id_value(id_type, &clause.value);
                }
                clause
            })
            .collect()
    }

    /// Convert ids in write data to the store's id type. Serial stores assign
    /// their own ids, so a non-numeric `id` is dropped.
    fn coerce_data(&self, resolver: &FieldResolver<'_>, model: &str, data: Value) -> Value {
        let id_type = self.config.id_type;
        let fields = match data {
            Value::Object(fields) if id_type == IdType::Number => fields,
            other => return other,
        };
        let coerced: Map<String, Value> = fields
            .into_iter()
            .filter_map(|(key, value)| {
                if !self.holds_ids(resolver, model, &key) {
                    return Some((key, value));
                }
                let value = coerce_id_value(id_type, &value);
                if is_id_field(&key) && value.is_string() {
                    return None;
                }
                Some((key, value))
            })
            .collect();
        Value::Object(coerced)
    }

    /// The id of a single `id = x` lookup, if that is what `clauses` is.
    fn id_lookup(clauses: &[WhereClause]) -> Option<Value> {
        match clauses {
            [clause] if is_id_field(&clause.field) && clause.operator == Operator::Eq => {
                normalize_operand(&clause.field, &clause.value)
                    .ok()
                    .filter(|id| !id.is_null() && !id.is_array())
            }
            _ => None,
        }
    }

    /// Id of the first document in `collection` matching `where_`.
    async fn first_match_id(&self, collection: &str, where_: Value) -> AdapterResult<Option<Value>> {
        let page = self
            .client
            .find(FindArgs::new(collection).with_where(where_).with_limit(1))
            .await?;
        Ok(page
            .docs
            .into_iter()
            .next()
            .and_then(|doc| doc.get("id").cloned()))
    }

    /// Id of the document a single-record update/delete targets.
    async fn target_id(
        &self,
        resolver: &FieldResolver<'_>,
        model: &str,
        collection: &str,
        clauses: &[WhereClause],
    ) -> AdapterResult<Option<Value>> {
        if let Some(id) = Self::id_lookup(clauses) {
            return Ok(Some(id));
        }
        let where_ = convert_where_clause(resolver, model, clauses)?;
        self.first_match_id(collection, where_).await
    }
}

/// Coerce a bare id, an array of ids or the `id` of a populated relation.
fn coerce_id_value(id_type: IdType, value: &Value) -> Value {
    match value {
        Value::Object(obj) if obj.contains_key("id") => {
            let mut obj = obj.clone();
            if let Some(id) = obj.get_mut("id") {
                *id = id_type.coerce(id);
            }
            Value::Object(obj)
        }
        other => id_type.coerce(other),
    }
}

/// Keep only the selected logical keys (and `id`) of an output document.
fn project(doc: Value, select: Option<&[String]>) -> Value {
    let Some(fields) = select.filter(|s| !s.is_empty()) else {
        return doc;
    };
    match doc {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(k, _)| is_id_field(k) || fields.iter().any(|f| f == k))
                .collect(),
        ),
        other => other,
    }
}

#[async_trait]
impl Adapter for PayloadAdapter {
    async fn create(
        &self,
        model: &str,
        data: Value,
        select: Option<&[String]>,
    ) -> AdapterResult<Value> {
        let resolver = self.resolver();
        let collection = resolver.resolve_collection_slug(model);
        self.log("CREATE", model, &collection);

        let data = self.coerce_data(&resolver, model, data);
        let stored = transform_input(&resolver, model, &data);
        let doc = self.client.create(&collection, stored).await?;
        Ok(project(transform_output(&resolver, model, doc), select))
    }

    async fn find_one(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
    ) -> AdapterResult<Option<Value>> {
        let resolver = self.resolver();
        let collection = resolver.resolve_collection_slug(model);
        self.log("FIND_ONE", model, &collection);

        let clauses = self.coerce_where(&resolver, model, where_clauses);
        let doc = match Self::id_lookup(&clauses) {
            Some(id) => self.client.find_by_id(&collection, &id, 0).await?,
            None => {
                let where_ = convert_where_clause(&resolver, model, &clauses)?;
                let page = self
                    .client
                    .find(FindArgs::new(&collection).with_where(where_).with_limit(1))
                    .await?;
                page.docs.into_iter().next()
            }
        };
        Ok(doc.map(|doc| transform_output(&resolver, model, doc)))
    }

    async fn find_many(&self, model: &str, query: FindManyQuery) -> AdapterResult<Vec<Value>> {
        let resolver = self.resolver();
        let collection = resolver.resolve_collection_slug(model);
        self.log("FIND_MANY", model, &collection);

        let clauses = self.coerce_where(&resolver, model, &query.where_clauses);
        let where_ = convert_where_clause(&resolver, model, &clauses)?;
        let offset = query.offset.unwrap_or(0).max(0);

        let mut args = FindArgs::new(&collection)
            .with_where(where_)
            .with_sort(convert_sort(&resolver, model, query.sort_by.as_ref()))
            .with_select(convert_select(&resolver, model, query.select.as_deref()));

        // Payload pages by page number. Offsets that are not a page boundary
        // fetch from the start and skip.
        let skip = match query.limit.filter(|l| *l > 0) {
            Some(limit) if offset % limit == 0 => {
                args = args.with_limit(limit).with_page((offset / limit).saturating_add(1));
                0
            }
            Some(limit) => {
                args = args.with_limit(offset.saturating_add(limit)).with_page(1);
                offset
            }
            None => offset,
        };

        let page = self.client.find(args).await?;
        Ok(page
            .docs
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .map(|doc| transform_output(&resolver, model, doc))
            .collect())
    }

    async fn count(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64> {
        let resolver = self.resolver();
        let collection = resolver.resolve_collection_slug(model);
        self.log("COUNT", model, &collection);

        let clauses = self.coerce_where(&resolver, model, where_clauses);
        let where_ = convert_where_clause(&resolver, model, &clauses)?;
        Ok(self.client.count(&collection, &where_).await?)
    }

    async fn update(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: Value,
    ) -> AdapterResult<Option<Value>> {
        let resolver = self.resolver();
        let collection = resolver.resolve_collection_slug(model);
        self.log("UPDATE", model, &collection);

        let clauses = self.coerce_where(&resolver, model, where_clauses);
        let Some(id) = self.target_id(&resolver, model, &collection, &clauses).await? else {
            return Ok(None);
        };
        let data = self.coerce_data(&resolver, model, data);
        let stored = transform_input(&resolver, model, &data);
        let doc = self.client.update_by_id(&collection, &id, stored).await?;
        Ok(doc.map(|doc| transform_output(&resolver, model, doc)))
    }

    async fn update_many(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: Value,
    ) -> AdapterResult<i64> {
        let resolver = self.resolver();
        let collection = resolver.resolve_collection_slug(model);
        self.log("UPDATE_MANY", model, &collection);

        let clauses = self.coerce_where(&resolver, model, where_clauses);
        let where_ = convert_where_clause(&resolver, model, &clauses)?;
        let data = self.coerce_data(&resolver, model, data);
        let stored = transform_input(&resolver, model, &data);
        let updated = self.client.update(&collection, &where_, stored).await?;
        Ok(updated.len() as i64)
    }

    async fn delete(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<()> {
        let resolver = self.resolver();
        let collection = resolver.resolve_collection_slug(model);
        self.log("DELETE", model, &collection);

        let clauses = self.coerce_where(&resolver, model, where_clauses);
        if let Some(id) = self.target_id(&resolver, model, &collection, &clauses).await? {
            self.client.delete_by_id(&collection, &id).await?;
        }
        Ok(())
    }

    async fn delete_many(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64> {
        let resolver = self.resolver();
        let collection = resolver.resolve_collection_slug(model);
        self.log("DELETE_MANY", model, &collection);

        let clauses = self.coerce_where(&resolver, model, where_clauses);
        let where_ = convert_where_clause(&resolver, model, &clauses)?;
        let deleted = self.client.delete(&collection, &where_).await?;
        Ok(deleted.len() as i64)
    }
}
