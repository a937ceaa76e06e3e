// Payload adapter errors.

use better_auth_core::error::BetterAuthError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadAdapterError {
    /// A where value was an object that could not be reduced to a scalar.
    #[error("Invalid where value for field '{field}': expected a scalar or an object with an `id`, got {value}")]
    InvalidOperand { field: String, value: String },

    /// The Payload client failed to execute an operation.
    #[error("Payload client error: {0}")]
    Client(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
}

impl PayloadAdapterError {
    pub fn invalid_operand(field: &str, value: &serde_json::Value) -> Self {
        Self::InvalidOperand {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

impl From<PayloadAdapterError> for BetterAuthError {
    fn from(err: PayloadAdapterError) -> Self {
        match err {
            PayloadAdapterError::InvalidOperand { .. } => BetterAuthError::Query(err.to_string()),
            PayloadAdapterError::Client(_) | PayloadAdapterError::CollectionNotFound(_) => {
                BetterAuthError::Database(err.to_string())
            }
        }
    }
}

pub type PayloadResult<T> = std::result::Result<T, PayloadAdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_operand_names_field_and_value() {
        let err = PayloadAdapterError::invalid_operand("org", &serde_json::json!({ "foo": 1 }));
        let msg = err.to_string();
        assert!(msg.contains("'org'"));
        assert!(msg.contains(r#"{"foo":1}"#));
    }

    #[test]
    fn test_into_better_auth_error() {
        let err: BetterAuthError =
            PayloadAdapterError::invalid_operand("org", &serde_json::json!({})).into();
        assert!(err.is_query_error());

        let err: BetterAuthError = PayloadAdapterError::Client("timeout".into()).into();
        assert!(matches!(err, BetterAuthError::Database(_)));
        assert_eq!(err.to_string(), "Database error: Payload client error: timeout");
    }
}
