// Built Payload collection definitions, as seen by the adapter.
//
// Only the parts the adapter needs are modelled: the slug, the fields and the
// `custom` annotations the plugin stamps on everything it generates. A
// collection generated for a better-auth model carries
// `custom.betterAuthModelKey`; each generated field carries
// `custom.betterAuthFieldKey`. Users may rename slugs and field names freely,
// the annotations survive and let the schema synchronizer find them again.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Annotation on a collection naming the model key it was generated from.
pub const MODEL_KEY_ANNOTATION: &str = "betterAuthModelKey";
/// Annotation on a field naming the schema field key it was generated from.
pub const FIELD_KEY_ANNOTATION: &str = "betterAuthFieldKey";

/// Field types whose children live at the parent's level in stored documents.
const PRESENTATIONAL_TYPES: &[&str] = &["row", "collapsible", "tabs", "tab", "ui"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionField {
    /// Stored field name. Empty for presentational containers.
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_to: Option<String>,
    #[serde(default)]
    pub has_many: bool,
    /// Children of `row` / `collapsible` / `tab` containers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<CollectionField>,
    /// Tabs of a `tabs` container.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tabs: Vec<CollectionField>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom: Map<String, Value>,
}

impl CollectionField {
    pub fn new(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            ..Default::default()
        }
    }

    /// A relationship field pointing at `relation_to`.
    pub fn relationship(name: &str, relation_to: &str) -> Self {
        Self {
            relation_to: Some(relation_to.to_string()),
            ..Self::new(name, "relationship")
        }
    }

    /// A presentational container (`row`, `collapsible`, ...) holding `fields`.
    pub fn container(field_type: &str, fields: Vec<CollectionField>) -> Self {
        Self {
            fields,
            ..Self::new("", field_type)
        }
    }

    /// Tag the field with the schema field key it was generated from.
    pub fn with_field_key(mut self, key: &str) -> Self {
        self.custom
            .insert(FIELD_KEY_ANNOTATION.to_string(), Value::String(key.to_string()));
        self
    }

    pub fn field_key(&self) -> Option<&str> {
        self.custom.get(FIELD_KEY_ANNOTATION).and_then(Value::as_str)
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self.field_type.as_str(), "relationship" | "upload")
    }

    fn is_presentational(&self) -> bool {
        PRESENTATIONAL_TYPES.contains(&self.field_type.as_str())
    }

    fn collect_data_fields<'a>(&'a self, out: &mut Vec<&'a CollectionField>) {
        if self.is_presentational() {
            for child in self.fields.iter().chain(self.tabs.iter()) {
                child.collect_data_fields(out);
            }
        } else {
            out.push(self);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    pub slug: String,
    #[serde(default)]
    pub fields: Vec<CollectionField>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom: Map<String, Value>,
}

impl CollectionConfig {
    pub fn new(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            ..Default::default()
        }
    }

    /// Tag the collection with the model key it was generated from.
    pub fn with_model_key(mut self, key: &str) -> Self {
        self.custom
            .insert(MODEL_KEY_ANNOTATION.to_string(), Value::String(key.to_string()));
        self
    }

    pub fn field(mut self, field: CollectionField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn model_key(&self) -> Option<&str> {
        self.custom.get(MODEL_KEY_ANNOTATION).and_then(Value::as_str)
    }

    /// Fields that hold data at the top level of a stored document,
    /// looking through presentational containers.
    pub fn data_fields(&self) -> Vec<&CollectionField> {
        let mut out = Vec::new();
        for field in &self.fields {
            field.collect_data_fields(&mut out);
        }
        out
    }

    /// The data field generated from schema field `key`.
    pub fn field_by_key(&self, key: &str) -> Option<&CollectionField> {
        self.data_fields()
            .into_iter()
            .find(|f| f.field_key() == Some(key))
    }
}

/// The collection generated for model `key`.
pub fn find_by_model_key<'a>(
    collections: &'a [CollectionConfig],
    key: &str,
) -> Option<&'a CollectionConfig> {
    collections.iter().find(|c| c.model_key() == Some(key))
}
