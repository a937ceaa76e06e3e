// better-auth-payload: Payload CMS database adapter for better-auth.
//
// Runs better-auth on top of Payload's collection-based document store.
// Better-auth's generated schema is reconciled once against the built
// collections (users may rename slugs and fields), then every adapter call is
// translated into Payload's query language and executed through a
// `PayloadClient`.

pub mod adapter;
pub mod client;
pub mod collection;
pub mod config;
pub mod error;
pub mod memory;
pub mod options;
pub mod query;
pub mod resolver;
pub mod sync;
pub mod transform;

pub use adapter::PayloadAdapter;
pub use client::{FindArgs, PaginatedDocs, PayloadClient};
pub use collection::{CollectionConfig, CollectionField};
pub use config::{IdType, PayloadAdapterConfig};
pub use error::{PayloadAdapterError, PayloadResult};
pub use memory::MemoryPayload;
pub use options::{OptionFragments, PayloadAuthOptions};
pub use resolver::FieldResolver;
pub use sync::{ResolvedSchema, SchemaSync};
