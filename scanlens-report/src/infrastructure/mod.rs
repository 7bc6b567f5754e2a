//! Infrastructure layer: tokenizer, reducer, resolver and storage backends

pub mod parser;
pub mod reducer;
pub mod resolver;
pub mod store;
