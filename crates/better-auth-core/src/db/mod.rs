pub mod adapter;
pub mod models;
pub mod schema;

pub use adapter::Adapter;
pub use models::{Account, Session, User, Verification};
pub use schema::{AuthSchema, AuthTable, FieldReference, FieldType, SchemaField};
