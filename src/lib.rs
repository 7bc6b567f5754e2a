//! Scanlens - command line front end for the scan report engine
//!
//! Wires configuration, logging and the configured report store together and
//! exposes the `ingest`, `issues` and `stats` commands.

pub mod app;
pub mod cli;

pub use app::{AppHandle, create_app};
pub use scanlens_core::{Config, init_tracing};

// Re-export for convenience
pub use scanlens_core;
pub use scanlens_report;
