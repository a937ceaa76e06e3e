// Schema descriptor: the generated description of every auth model.
//
// Each model key ("user", "session", ...) maps to an `AuthTable` carrying the
// storage name (`model_name`) and its fields. A field may override its
// storage column through `field_name` and may reference another model.
// Adapters resolve logical names against this structure.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Field types supported by the schema system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "string[]")]
    StringArray,
    #[serde(rename = "number[]")]
    NumberArray,
}

/// A single field definition within a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    /// Reference to another model (foreign key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<FieldReference>,
    /// Whether the field is included in API output.
    #[serde(default = "default_true")]
    pub returned: bool,
    /// Whether the field accepts user input.
    #[serde(default = "default_true")]
    pub input: bool,
    /// Storage column name, when it differs from the field key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

fn default_true() -> bool {
    true
}

impl SchemaField {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            unique: false,
            default_value: None,
            references: None,
            returned: true,
            input: true,
            field_name: None,
        }
    }

    pub fn required_string() -> Self {
        Self::new(FieldType::String).required()
    }

    pub fn optional_string() -> Self {
        Self::new(FieldType::String)
    }

    pub fn boolean(default: bool) -> Self {
        Self {
            default_value: Some(serde_json::Value::Bool(default)),
            ..Self::new(FieldType::Boolean)
        }
    }

    pub fn date() -> Self {
        Self::new(FieldType::Date)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark the field as a relationship to `model`.`field`.
    pub fn with_reference(mut self, model: &str, field: &str) -> Self {
        self.references = Some(FieldReference {
            model: model.to_string(),
            field: field.to_string(),
            on_delete: None,
        });
        self
    }

    pub fn with_field_name(mut self, name: &str) -> Self {
        self.field_name = Some(name.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.returned = false;
        self
    }

    pub fn is_relationship(&self) -> bool {
        self.references.is_some()
    }
}

/// Foreign key reference. `model` holds the storage name of the target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub model: String,
    /// Field in the referenced model (usually "id").
    #[serde(default = "default_reference_field")]
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
}

fn default_reference_field() -> String {
    "id".to_string()
}

/// One model of the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTable {
    /// Storage name (collection slug / table name).
    pub model_name: String,
    /// Field key → field definition.
    #[serde(default)]
    pub fields: HashMap<String, SchemaField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

impl AuthTable {
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            fields: HashMap::new(),
            order: None,
        }
    }

    pub fn field(mut self, key: &str, schema_field: SchemaField) -> Self {
        self.fields.insert(key.to_string(), schema_field);
        self
    }

    pub fn get_field(&self, key: &str) -> Option<&SchemaField> {
        self.fields.get(key)
    }
}

/// The complete schema descriptor, keyed by model key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthSchema {
    pub tables: HashMap<String, AuthTable>,
}

impl AuthSchema {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Add (or replace) the model stored under `key`.
    pub fn table(mut self, key: &str, table: AuthTable) -> Self {
        self.tables.insert(key.to_string(), table);
        self
    }

    pub fn get(&self, model: &str) -> Option<&AuthTable> {
        self.tables.get(model)
    }

    pub fn get_mut(&mut self, model: &str) -> Option<&mut AuthTable> {
        self.tables.get_mut(model)
    }

    pub fn field(&self, model: &str, key: &str) -> Option<&SchemaField> {
        self.get(model).and_then(|t| t.get_field(key))
    }

    /// Model keys in a stable (sorted) order.
    pub fn model_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.tables.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// The default schema: user, session, account, verification.
    pub fn core_schema() -> Self {
        let user = AuthTable::new("user")
            .field("name", SchemaField::required_string())
            .field("email", SchemaField::required_string().with_unique())
            .field("emailVerified", SchemaField::boolean(false).required())
            .field("image", SchemaField::optional_string())
            .field("createdAt", SchemaField::date().required())
            .field("updatedAt", SchemaField::date().required());

        let session = AuthTable::new("session")
            .field("expiresAt", SchemaField::date().required())
            .field("token", SchemaField::required_string().with_unique())
            .field("ipAddress", SchemaField::optional_string())
            .field("userAgent", SchemaField::optional_string())
            .field(
                "userId",
                SchemaField::required_string().with_reference("user", "id"),
            )
            .field("createdAt", SchemaField::date().required())
            .field("updatedAt", SchemaField::date().required());

        let account = AuthTable::new("account")
            .field("accountId", SchemaField::required_string())
            .field("providerId", SchemaField::required_string())
            .field(
                "userId",
                SchemaField::required_string().with_reference("user", "id"),
            )
            .field("accessToken", SchemaField::optional_string())
            .field("refreshToken", SchemaField::optional_string())
            .field("idToken", SchemaField::optional_string())
            .field("accessTokenExpiresAt", SchemaField::date())
            .field("refreshTokenExpiresAt", SchemaField::date())
            .field("scope", SchemaField::optional_string())
            .field("password", SchemaField::optional_string().hidden())
            .field("createdAt", SchemaField::date().required())
            .field("updatedAt", SchemaField::date().required());

        let verification = AuthTable::new("verification")
            .field("identifier", SchemaField::required_string())
            .field("value", SchemaField::required_string())
            .field("expiresAt", SchemaField::date().required())
            .field("createdAt", SchemaField::date())
            .field("updatedAt", SchemaField::date());

        Self::new()
            .table("user", user)
            .table("session", session)
            .table("account", account)
            .table("verification", verification)
    }
}
