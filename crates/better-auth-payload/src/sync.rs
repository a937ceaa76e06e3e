// Schema/collection synchronization.
//
// The generated schema names collections and fields after better-auth's
// defaults; the built Payload collections may use other slugs and field names.
// `SchemaSync` reconciles the two once, after collections are final, and
// freezes the result into a `ResolvedSchema` that every query is resolved
// against. Mismatches are logged and skipped; lookups for anything left
// unreconciled fall back to the logical name.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use better_auth_core::db::schema::AuthSchema;
use better_auth_core::logger::AuthLogger;

use crate::collection::{find_by_model_key, CollectionConfig};

/// An immutable schema descriptor. Cloning shares the underlying schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema(Arc<AuthSchema>);

impl ResolvedSchema {
    /// Freeze a schema as-is, without reconciling it against collections.
    pub fn unsynced(schema: AuthSchema) -> Self {
        Self(Arc::new(schema))
    }

    pub fn schema(&self) -> &AuthSchema {
        &self.0
    }
}

impl Deref for ResolvedSchema {
    type Target = AuthSchema;

    fn deref(&self) -> &AuthSchema {
        &self.0
    }
}

/// One-shot reconciliation of a generated schema against built collections.
#[derive(Debug)]
pub struct SchemaSync {
    schema: AuthSchema,
    logger: AuthLogger,
}

/// A pending field rename: model key, field key, new storage name.
type FieldRename = (String, String, String);

impl SchemaSync {
    pub fn new(schema: AuthSchema) -> Self {
        Self {
            schema,
            logger: AuthLogger::default().scoped("schema-sync"),
        }
    }

    pub fn with_logger(mut self, logger: &AuthLogger) -> Self {
        self.logger = logger.scoped("schema-sync");
        self
    }

    /// Reconcile slugs and field names with `collections` and freeze the result.
    ///
    /// Slug renames are collected first and every `references.model` pointing
    /// at an old slug is rewritten before any `model_name` changes, so chained
    /// or swapped renames resolve against the original slugs.
    pub fn run(mut self, collections: &[CollectionConfig]) -> ResolvedSchema {
        let mut slug_renames: HashMap<String, String> = HashMap::new();
        let mut model_renames: Vec<(String, String)> = Vec::new();
        let mut field_renames: Vec<FieldRename> = Vec::new();

        for model_key in self.schema.model_keys() {
            let Some(table) = self.schema.get(&model_key) else {
                continue;
            };
            let Some(collection) = find_by_model_key(collections, &model_key) else {
                self.logger.error(format!(
                    "No collection found for model '{}' (expected custom.betterAuthModelKey = \"{}\")",
                    model_key, model_key
                ));
                continue;
            };

            if collection.slug != table.model_name {
                self.logger.debug(format!(
                    "Model '{}' is stored in '{}' (was '{}')",
                    model_key, collection.slug, table.model_name
                ));
                slug_renames.insert(table.model_name.clone(), collection.slug.clone());
                model_renames.push((model_key.clone(), collection.slug.clone()));
            }

            let mut field_keys: Vec<&String> = table.fields.keys().collect();
            field_keys.sort();
            for field_key in field_keys {
                let field = &table.fields[field_key];
                let Some(target) = collection.field_by_key(field_key) else {
                    self.logger.error(format!(
                        "No field found in collection '{}' for '{}.{}'",
                        collection.slug, model_key, field_key
                    ));
                    continue;
                };
                let current = field.field_name.as_deref().unwrap_or(field_key);
                if target.name != current {
                    self.logger.debug(format!(
                        "Field '{}.{}' is stored as '{}'",
                        model_key, field_key, target.name
                    ));
                    field_renames.push((model_key.clone(), field_key.clone(), target.name.clone()));
                }
            }
        }

        rewrite_references(&mut self.schema, &slug_renames);

        for (model_key, slug) in model_renames {
            if let Some(table) = self.schema.get_mut(&model_key) {
                table.model_name = slug;
            }
        }
        for (model_key, field_key, name) in field_renames {
            if let Some(field) = self
                .schema
                .get_mut(&model_key)
                .and_then(|t| t.fields.get_mut(&field_key))
            {
                field.field_name = Some(name);
            }
        }

        ResolvedSchema(Arc::new(self.schema))
    }
}

/// Point every reference at an old slug to its new slug.
pub(crate) fn rewrite_references(schema: &mut AuthSchema, renames: &HashMap<String, String>) {
    if renames.is_empty() {
        return;
    }
    for table in schema.tables.values_mut() {
        for field in table.fields.values_mut() {
            if let Some(reference) = field.references.as_mut() {
                if let Some(new_slug) = renames.get(&reference.model) {
                    reference.model = new_slug.clone();
                }
            }
        }
    }
}
