//! Structural events emitted by the tokenizer

use serde_json::{Number, Value};

use super::error::ParseError;

/// A scalar JSON value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    /// Numbers are carried as floating point, parsed when the token closes
    Number(f64),
    Bool(bool),
    Null,
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::String(s) => Value::String(s),
            Scalar::Number(n) => number_value(n),
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Null => Value::Null,
        }
    }
}

/// Integral floats become integer JSON numbers so that counters deserialize as integers.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.is_finite() {
        if n >= 0.0 && n <= u64::MAX as f64 {
            return Value::Number(Number::from(n as u64));
        }
        if n < 0.0 && n >= i64::MIN as f64 {
            return Value::Number(Number::from(n as i64));
        }
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// Event emitted while tokenizing a document
#[derive(Debug, Clone, PartialEq)]
pub enum JsonEvent {
    /// An object key was read
    Key(String),
    OpenObject,
    CloseObject,
    OpenArray,
    CloseArray,
    Value(Scalar),
    /// The root value closed with a balanced stack
    End,
    /// Malformed input; nothing follows this event
    Error(ParseError),
}

/// Receiver of tokenizer events
pub trait JsonEventSink {
    fn on_event(&mut self, event: JsonEvent);

    /// Checked after each character by [`Tokenizer::write_partial`]; `true`
    /// makes the tokenizer return so the caller can drain the sink.
    ///
    /// [`Tokenizer::write_partial`]: super::Tokenizer::write_partial
    fn wants_pause(&self) -> bool {
        false
    }
}

impl JsonEventSink for Vec<JsonEvent> {
    fn on_event(&mut self, event: JsonEvent) {
        self.push(event);
    }
}
