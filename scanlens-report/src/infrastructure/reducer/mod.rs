//! Tree reducer
//!
//! Consumes tokenizer events with an explicit frame stack and rebuilds report
//! records incrementally.

pub mod frame;
pub mod keys;
pub mod report_reducer;
pub mod value_builder;

pub use frame::{Frame, Link, ValueFrame};
pub use report_reducer::{Flush, ReduceError, ReportReducer};
pub use value_builder::{ValueBuilder, parse_document};
