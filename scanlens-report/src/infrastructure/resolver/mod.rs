//! Index resolution and description mapping
//!
//! Reports may replace repeated strings with positions into side tables.
//! The resolver undoes that encoding, fills description templates and
//! derives the classification fields of issues and happy paths.

pub mod description;
pub mod index_resolver;
pub mod owasp;
pub mod wire;

use thiserror::Error;

use crate::domain::DomainError;

pub use description::substitute;
pub use index_resolver::{HYPHENATED_KEYS_SINCE, IndexResolver, KeyFormat};
pub use owasp::resolve_owasp;

/// Failure to map a single raw entry
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Malformed {what}: {message}")]
    Malformed { what: &'static str, message: String },

    #[error("Criticality {0} is outside 0-5")]
    InvalidCriticality(u64),
}
