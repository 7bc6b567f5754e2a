//! Common test utilities for scanlens-report

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
