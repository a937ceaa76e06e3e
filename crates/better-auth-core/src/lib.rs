// better-auth-core: shared vocabulary for better-auth database adapters.
//
// Holds the schema descriptor every adapter resolves names against, the
// abstract query model (where clauses, sort, select, pagination), the async
// `Adapter` trait, the injectable logger and small utilities.

pub mod db;
pub mod error;
pub mod logger;
pub mod utils;

// Re-exports for convenience
pub use db::adapter::{Adapter, AdapterResult};
pub use db::models::{Account, Session, User, Verification};
pub use db::schema::{AuthSchema, AuthTable, FieldReference, FieldType, SchemaField};
pub use error::BetterAuthError;
pub use logger::{AuthLogger, LogHandler, LogLevel, LogRecord, LoggerConfig, MemoryLogHandler};
