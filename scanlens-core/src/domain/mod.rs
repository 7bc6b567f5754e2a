//! Domain primitives shared across scanlens crates

pub mod version;

pub use version::{Precision, Version, VersionError};
