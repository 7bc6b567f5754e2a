//! Report domain layer
//!
//! - Entities: metadata, index tables, paths, operations, issues
//! - Value objects: HTTP methods, statuses, severities, OWASP categories

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use value_objects::*;
