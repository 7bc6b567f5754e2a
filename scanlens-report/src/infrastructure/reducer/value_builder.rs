//! Event sink that rebuilds a complete JSON value
//!
//! Small callers that want the whole document rather than store-backed
//! records can drive a [`Tokenizer`] into a [`ValueBuilder`].

use serde_json::Value;

use super::frame::{Link, ValueFrame};
use crate::infrastructure::parser::{JsonEvent, JsonEventSink, ParseError, Tokenizer};

#[derive(Debug, Default)]
pub struct ValueBuilder {
    stack: Vec<ValueFrame>,
    key: Option<String>,
    result: Option<Value>,
}

impl ValueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The completed root value, once the document has ended
    pub fn take(&mut self) -> Option<Value> {
        self.result.take()
    }

    fn link(&mut self) -> Option<Link> {
        let key = self.key.take();
        self.stack.last().map(|parent| parent.child_link(key))
    }

    fn attach(&mut self, link: Option<Link>, value: Value) {
        match (self.stack.last_mut(), link) {
            (Some(parent), Some(link)) => parent.insert(link, value),
            _ => self.result = Some(value),
        }
    }
}

impl JsonEventSink for ValueBuilder {
    fn on_event(&mut self, event: JsonEvent) {
        match event {
            JsonEvent::Key(key) => self.key = Some(key),
            JsonEvent::OpenObject => {
                let link = self.link();
                self.stack.push(ValueFrame::object(link));
            }
            JsonEvent::OpenArray => {
                let link = self.link();
                self.stack.push(ValueFrame::array(link));
            }
            JsonEvent::CloseObject | JsonEvent::CloseArray => {
                if let Some(frame) = self.stack.pop() {
                    let link = frame.link.clone();
                    self.attach(link, frame.into_value());
                }
            }
            JsonEvent::Value(scalar) => {
                let link = self.link();
                self.attach(link, scalar.into());
            }
            JsonEvent::End => {}
            JsonEvent::Error(_) => {
                self.stack.clear();
                self.result = None;
            }
        }
    }
}

/// Parse a whole document held in memory
pub fn parse_document(text: &str) -> Result<Value, ParseError> {
    let mut tokenizer = Tokenizer::new();
    let mut builder = ValueBuilder::new();
    tokenizer.write(text, &mut builder)?;
    tokenizer.close(&mut builder)?;
    Ok(builder.take().unwrap_or(Value::Null))
}
