// Adapter configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use better_auth_core::logger::AuthLogger;

/// Type of document ids used by the Payload database adapter.
///
/// SQL-backed Payload installs default to serial (numeric) ids, Mongo to text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdType {
    #[default]
    Text,
    Number,
}

impl IdType {
    /// Convert an id (or an array of ids) to the store's id representation.
    ///
    /// Only numeric strings are converted; anything else is returned as is.
    pub fn coerce(&self, value: &Value) -> Value {
        match (self, value) {
            (IdType::Number, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| value.clone()),
            (IdType::Number, Value::Array(items)) => {
                Value::Array(items.iter().map(|v| self.coerce(v)).collect())
            }
            _ => value.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PayloadAdapterConfig {
    /// Emit a `tracing` debug line for every adapter operation.
    ///
    /// Default: false
    pub debug_logs: bool,

    /// Log the model-to-collection mapping once the schema is resolved.
    ///
    /// Default: false
    pub log_tables: bool,

    /// Id representation of the underlying store.
    ///
    /// Default: `IdType::Text`
    pub id_type: IdType,

    /// Logger handed to the resolver and the schema synchronizer.
    pub logger: AuthLogger,
}

impl Default for PayloadAdapterConfig {
    fn default() -> Self {
        Self {
            debug_logs: false,
            log_tables: false,
            id_type: IdType::Text,
            logger: AuthLogger::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = PayloadAdapterConfig::default();
        assert!(!config.debug_logs);
        assert!(!config.log_tables);
        assert_eq!(config.id_type, IdType::Text);
    }

    #[test]
    fn test_coerce_number_ids() {
        assert_eq!(IdType::Number.coerce(&json!("42")), json!(42));
        assert_eq!(IdType::Number.coerce(&json!(["1", "x", 3])), json!([1, "x", 3]));
        assert_eq!(IdType::Number.coerce(&json!("abc")), json!("abc"));
        assert_eq!(IdType::Text.coerce(&json!("42")), json!("42"));
    }

    #[test]
    fn test_id_type_serde() {
        let id_type: IdType = serde_json::from_value(json!("number")).unwrap();
        assert_eq!(id_type, IdType::Number);
    }
}
