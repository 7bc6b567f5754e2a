//! Tokenizer errors

use thiserror::Error;

/// Lexical or structural error with its position in the document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line}, column {column}{})", character_suffix(.character))]
pub struct ParseError {
    pub message: String,
    /// 1-based line number
    pub line: u64,
    /// 0-based column within the line
    pub column: u64,
    /// Absolute byte offset into the document
    pub offset: u64,
    /// The offending character, when there is one
    pub character: Option<char>,
}

fn character_suffix(character: &Option<char>) -> String {
    match character {
        Some(c) => format!(", char {:?}", c),
        None => String::new(),
    }
}
