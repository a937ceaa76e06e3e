// Model/field name resolution against the resolved schema.
//
// Identity fields ("id", "_id") are never renamed. Unknown models and fields
// resolve to themselves.

use better_auth_core::db::schema::SchemaField;
use better_auth_core::logger::AuthLogger;

use crate::sync::ResolvedSchema;

/// Is `field` one of the document identity fields?
pub fn is_id_field(field: &str) -> bool {
    field == "id" || field == "_id"
}

/// Borrowing view used by the translators for one operation.
#[derive(Debug, Clone)]
pub struct FieldResolver<'a> {
    schema: &'a ResolvedSchema,
    logger: AuthLogger,
}

impl<'a> FieldResolver<'a> {
    pub fn new(schema: &'a ResolvedSchema, logger: &AuthLogger) -> Self {
        Self {
            schema,
            logger: logger.scoped("resolver"),
        }
    }

    /// Storage field name for `model`.`field`.
    pub fn resolve_field_name(&self, model: &str, field: &str) -> String {
        if is_id_field(field) {
            return field.to_string();
        }
        match self.schema.field(model, field) {
            Some(SchemaField {
                field_name: Some(name),
                ..
            }) => {
                self.logger
                    .debug(format!("{}.{} -> {}", model, field, name));
                name.clone()
            }
            Some(_) => {
                self.logger
                    .debug(format!("{}.{} keeps its name", model, field));
                field.to_string()
            }
            None => {
                self.logger.debug(format!(
                    "No schema field for {}.{}, using '{}'",
                    model, field, field
                ));
                field.to_string()
            }
        }
    }

    /// Collection slug for `model`.
    pub fn resolve_collection_slug(&self, model: &str) -> String {
        match self.schema.get(model) {
            Some(table) => {
                self.logger
                    .debug(format!("{} -> collection '{}'", model, table.model_name));
                table.model_name.clone()
            }
            None => {
                self.logger
                    .debug(format!("No schema model '{}', using it as the slug", model));
                model.to_string()
            }
        }
    }

    pub fn field(&self, model: &str, field: &str) -> Option<&'a SchemaField> {
        let schema: &'a ResolvedSchema = self.schema;
        schema.field(model, field)
    }

    pub fn is_relationship(&self, model: &str, field: &str) -> bool {
        self.field(model, field).is_some_and(SchemaField::is_relationship)
    }

    /// Declared fields of `model`, sorted by key. Empty for unknown models.
    pub fn fields(&self, model: &str) -> Vec<(&'a str, &'a SchemaField)> {
        let schema: &'a ResolvedSchema = self.schema;
        let mut fields: Vec<(&'a str, &'a SchemaField)> = schema
            .get(model)
            .map(|t| t.fields.iter().map(|(k, f)| (k.as_str(), f)).collect())
            .unwrap_or_default();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        fields
    }
}
