// Plugin options and their assembly from flat fragments.
//
// Plugins and integrations contribute options as `(path, value)` pairs such
// as `("sessions.slug", "auth-sessions")` or `("betterAuthOptions.plugins[]",
// {...})`. `OptionFragments` collects them in order and folds them into one
// nested JSON object with the deep-path setter.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use better_auth_core::db::schema::AuthSchema;
use better_auth_core::error::BetterAuthError;
use better_auth_core::utils::Path;

use crate::config::{IdType, PayloadAdapterConfig};
use crate::sync::rewrite_references;

// ─── Fragments ───────────────────────────────────────────────────

/// Ordered `(path, value)` option fragments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionFragments {
    fragments: Vec<(Path, Value)>,
}

impl OptionFragments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`OptionFragments::push`].
    pub fn set(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.push(path, value);
        self
    }

    pub fn push(&mut self, path: &str, value: impl Into<Value>) {
        self.fragments.push((Path::parse(path), value.into()));
    }

    /// Add every entry of a flat map, each key placed under `prefix`.
    pub fn extend_from(&mut self, prefix: &str, entries: &Map<String, Value>) {
        for (key, value) in entries {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            self.push(&path, value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Apply every fragment, in order, to an empty object.
    pub fn build(&self) -> Value {
        let mut target = json!({});
        for (path, value) in &self.fragments {
            path.apply(&mut target, value.clone());
        }
        target
    }

    /// Build and deserialize into `T`.
    pub fn build_into<T: DeserializeOwned>(&self) -> Result<T, BetterAuthError> {
        serde_json::from_value(self.build())
            .map_err(|e| BetterAuthError::Config(format!("Invalid plugin options: {e}")))
    }
}

// ─── Plugin Options ──────────────────────────────────────────────

/// Per-collection overrides.
///
/// Only `slug` affects the adapter. `hidden` and `admin_roles` are carried for
/// the collection builder that renders the admin UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionOptions {
    /// Slug of the generated collection. Defaults to the model's name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Hide the collection from the admin navigation.
    pub hidden: bool,
    /// Roles allowed to manage the collection in the admin panel.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub admin_roles: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DebugOptions {
    /// Log every adapter operation.
    pub enable_debug_logs: bool,
    /// Log the model-to-collection mapping at startup.
    pub log_tables: bool,
}

/// Options of the Payload auth plugin.
///
/// The adapter reads the collection slugs, `id_type` and `debug`. The
/// remaining fields are deserialized so a full plugin config round-trips; they
/// are consumed by the collection builder and by better-auth itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PayloadAuthOptions {
    /// Replace Payload's built-in auth with better-auth entirely.
    pub disable_default_payload_auth: bool,
    /// Hide the generated collections (other than users) from the admin UI.
    pub hide_plugin_collections: bool,
    pub users: CollectionOptions,
    pub accounts: CollectionOptions,
    pub sessions: CollectionOptions,
    pub verifications: CollectionOptions,
    /// Options passed through to better-auth untouched.
    pub better_auth_options: Value,
    pub id_type: IdType,
    pub debug: DebugOptions,
}

impl PayloadAuthOptions {
    /// Assemble options from fragments.
    pub fn from_fragments(fragments: &OptionFragments) -> Result<Self, BetterAuthError> {
        fragments.build_into()
    }

    /// Adapter configuration implied by these options.
    pub fn adapter_config(&self) -> PayloadAdapterConfig {
        PayloadAdapterConfig {
            debug_logs: self.debug.enable_debug_logs,
            log_tables: self.debug.log_tables,
            id_type: self.id_type,
            ..Default::default()
        }
    }

    fn collection_options(&self) -> [(&'static str, &CollectionOptions); 4] {
        [
            ("user", &self.users),
            ("account", &self.accounts),
            ("session", &self.sessions),
            ("verification", &self.verifications),
        ]
    }

    /// Apply configured slugs to the generated schema, keeping references
    /// pointed at the renamed collections.
    pub fn apply_slug_overrides(&self, mut schema: AuthSchema) -> AuthSchema {
        let mut renames: HashMap<String, String> = HashMap::new();
        for (model, options) in self.collection_options() {
            let (Some(slug), Some(table)) = (options.slug.as_ref(), schema.get(model)) else {
                continue;
            };
            if *slug != table.model_name {
                renames.insert(table.model_name.clone(), slug.clone());
            }
        }

        rewrite_references(&mut schema, &renames);
        for (model, options) in self.collection_options() {
            if let (Some(slug), Some(table)) = (options.slug.as_ref(), schema.get_mut(model)) {
                table.model_name = slug.clone();
            }
        }
        schema
    }
}
