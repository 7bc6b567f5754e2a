//! CLI Commands Module
//!
//! This module contains all CLI subcommand implementations.

pub mod ingest;
pub mod issues;
pub mod stats;
