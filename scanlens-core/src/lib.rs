//! Scanlens Core - Foundation crate for the scanlens report engine
//!
//! This crate provides functionality shared by the engine and the CLI:
//!
//! # Modules
//!
//! - [`config`]: Strongly-typed configuration with TOML and environment variable support
//! - [`domain`]: Version triples used to select report decoding rules
//! - [`logging`]: Structured logging with tracing
//!
//! # Configuration
//!
//! Load configuration from files and environment:
//!
//! ```rust,ignore
//! use scanlens_core::Config;
//!
//! let config = Config::load()?;
//! ```
//!
//! Environment variables use the `SCANLENS__` prefix with double underscore separators:
//!
//! ```bash
//! SCANLENS__STORE__BACKEND=memory
//! SCANLENS__QUERY__MAX_PER_PAGE=200
//! ```

pub mod config;
pub mod domain;
pub mod logging;

pub use config::Config;
pub use logging::init_tracing;
