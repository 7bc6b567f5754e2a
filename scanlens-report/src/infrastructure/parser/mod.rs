//! Streaming JSON tokenizer

pub mod error;
pub mod events;
pub mod tokenizer;

pub use error::ParseError;
pub use events::{JsonEvent, JsonEventSink, Scalar};
pub use tokenizer::Tokenizer;
