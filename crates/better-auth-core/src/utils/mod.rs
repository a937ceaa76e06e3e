// Utility functions: ID generation, deep-path object assembly.

pub mod deep_set;
pub mod id;

pub use deep_set::{set, Path, PathSegment};
pub use id::generate_id;
