// Internal error type shared by all adapters.

/// Internal (non-HTTP) error used for configuration problems and database
/// failures surfaced by an adapter.
#[derive(Debug, thiserror::Error)]
pub enum BetterAuthError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid query: {0}")]
    Query(String),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl BetterAuthError {
    /// Whether the error was caused by a malformed query rather than the store.
    pub fn is_query_error(&self) -> bool {
        matches!(self, Self::Query(_))
    }
}

/// Unified result type for better-auth operations.
pub type Result<T> = std::result::Result<T, BetterAuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = BetterAuthError::Database("connection refused".into());
        assert_eq!(err.to_string(), "Database error: connection refused");

        let err = BetterAuthError::Query("bad operand".into());
        assert_eq!(err.to_string(), "Invalid query: bad operand");
        assert!(err.is_query_error());
    }

    #[test]
    fn test_from_anyhow() {
        let err: BetterAuthError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, BetterAuthError::Anyhow(_)));
        assert_eq!(err.to_string(), "boom");
        assert!(!err.is_query_error());
    }
}
