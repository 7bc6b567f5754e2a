//! Incremental JSON tokenizer
//!
//! A character-level state machine that accepts a document as a sequence of
//! chunks and emits [`JsonEvent`]s as soon as each token is complete. Only the
//! scalar token currently being read is buffered, so memory use is bounded by
//! the longest string or number in the document, never by its size.
//!
//! Chunks may be split anywhere. String escape state, `\u` digits, literal
//! spelling and number text all survive a chunk boundary, so the event
//! sequence does not depend on how the input was cut.

use scanlens_core::config::ParserConfig;

use super::error::ParseError;
use super::events::{JsonEvent, JsonEventSink, Scalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the root value
    Begin,
    /// After `{`, expecting a key or `}`
    OpenObject,
    /// After `,` inside an object, expecting a key
    OpenKey,
    /// After a key, expecting `:`
    CloseKey,
    /// After a value inside an object, expecting `,` or `}`
    CloseObject,
    /// After `[`, expecting a value or `]`
    OpenArray,
    /// After a value inside an array, expecting `,` or `]`
    CloseArray,
    /// Expecting any value
    Value,
    String,
    TrueR,
    TrueU,
    TrueE,
    FalseA,
    FalseL,
    FalseS,
    FalseE,
    NullU,
    NullL,
    NullL2,
    NumberDigit,
    NumberDecimalPoint,
    /// The root value closed; only whitespace may follow
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

#[derive(Debug, Clone, Copy)]
struct Position {
    line: u64,
    column: u64,
    offset: u64,
}

impl Position {
    const START: Position = Position {
        line: 1,
        column: 0,
        offset: 0,
    };

    fn advance(&mut self, c: char) {
        self.offset += c.len_utf8() as u64;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }
}

/// Escape handling inside a string token
#[derive(Debug, Clone, Copy, Default)]
struct StringState {
    is_key: bool,
    escape: bool,
    /// Accumulated value and digit count of a `\uXXXX` escape
    unicode: Option<(u32, u8)>,
    /// High surrogate waiting for its low half
    high_surrogate: Option<u32>,
}

enum Step {
    Consumed,
    Reprocess,
}

/// Incremental JSON tokenizer
#[derive(Debug)]
pub struct Tokenizer {
    state: State,
    stack: Vec<Container>,
    buffer: String,
    string: StringState,
    max_buffer_length: usize,
    position: Position,
    pending_utf8: Vec<u8>,
    error: Option<ParseError>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::with_config(&ParserConfig::default())
    }

    pub fn with_config(config: &ParserConfig) -> Self {
        Self::with_max_buffer_length(config.max_buffer_length)
    }

    pub fn with_max_buffer_length(max_buffer_length: usize) -> Self {
        Self {
            state: State::Begin,
            stack: Vec::new(),
            buffer: String::new(),
            string: StringState::default(),
            max_buffer_length,
            position: Position::START,
            pending_utf8: Vec::new(),
            error: None,
        }
    }

    /// Return to the initial state, dropping any partial document or error.
    pub fn reset(&mut self) {
        self.state = State::Begin;
        self.stack.clear();
        self.buffer.clear();
        self.string = StringState::default();
        self.position = Position::START;
        self.pending_utf8.clear();
        self.error = None;
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Feed a text chunk.
    pub fn write<S: JsonEventSink + ?Sized>(
        &mut self,
        chunk: &str,
        sink: &mut S,
    ) -> Result<(), ParseError> {
        self.feed_text(chunk, sink, false).map(|_| ())
    }

    /// Feed a text chunk until the sink asks to pause.
    ///
    /// Returns the number of bytes of `chunk` consumed, always on a char
    /// boundary. The caller feeds the remainder after draining the sink.
    pub fn write_partial<S: JsonEventSink + ?Sized>(
        &mut self,
        chunk: &str,
        sink: &mut S,
    ) -> Result<usize, ParseError> {
        self.feed_text(chunk, sink, true)
    }

    /// Feed a byte chunk. UTF-8 sequences may be split across chunks.
    pub fn write_bytes<S: JsonEventSink + ?Sized>(
        &mut self,
        chunk: &[u8],
        sink: &mut S,
    ) -> Result<(), ParseError> {
        self.feed_bytes(chunk, sink, false).map(|_| ())
    }

    /// Byte counterpart of [`Tokenizer::write_partial`]. A partial UTF-8
    /// sequence at the end of `chunk` counts as consumed.
    pub fn write_bytes_partial<S: JsonEventSink + ?Sized>(
        &mut self,
        chunk: &[u8],
        sink: &mut S,
    ) -> Result<usize, ParseError> {
        self.feed_bytes(chunk, sink, true)
    }

    /// Signal end of input. With no open structures the tokenizer resets and
    /// can be reused for another document.
    pub fn close<S: JsonEventSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), ParseError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        if !self.pending_utf8.is_empty() {
            return Err(self.fail("Incomplete UTF-8 sequence at end of input", None, sink));
        }

        match self.state {
            State::Begin | State::Done => {
                self.reset();
                Ok(())
            }
            State::String => Err(self.fail("Unterminated string", None, sink)),
            _ => Err(self.fail("Unexpected end of input", None, sink)),
        }
    }

    fn feed_text<S: JsonEventSink + ?Sized>(
        &mut self,
        chunk: &str,
        sink: &mut S,
        pausable: bool,
    ) -> Result<usize, ParseError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        if !self.pending_utf8.is_empty() {
            let c = self.pending_utf8[0] as char;
            return Err(self.fail("Incomplete UTF-8 sequence before text chunk", Some(c), sink));
        }
        self.feed_str(chunk, sink, pausable)
    }

    fn feed_bytes<S: JsonEventSink + ?Sized>(
        &mut self,
        chunk: &[u8],
        sink: &mut S,
        pausable: bool,
    ) -> Result<usize, ParseError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }

        let carried = self.pending_utf8.len();
        let joined;
        let bytes = if carried == 0 {
            chunk
        } else {
            let mut buf = std::mem::take(&mut self.pending_utf8);
            buf.extend_from_slice(chunk);
            joined = buf;
            joined.as_slice()
        };

        let (text, invalid) = match std::str::from_utf8(bytes) {
            Ok(text) => (text, None),
            Err(e) => {
                let text = std::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default();
                (text, Some(e))
            }
        };

        let fed = self.feed_str(text, sink, pausable)?;
        if fed < text.len() {
            // Carried bytes belong to the first char, which was fed.
            return Ok(fed.saturating_sub(carried));
        }

        if let Some(e) = invalid {
            match e.error_len() {
                Some(_) => return Err(self.fail("Invalid UTF-8 byte", None, sink)),
                // Incomplete trailing sequence, completed by the next chunk
                None => self.pending_utf8 = bytes[text.len()..].to_vec(),
            }
        }
        Ok(chunk.len())
    }

    fn feed_str<S: JsonEventSink + ?Sized>(
        &mut self,
        text: &str,
        sink: &mut S,
        pausable: bool,
    ) -> Result<usize, ParseError> {
        for (offset, c) in text.char_indices() {
            loop {
                match self.step(c, sink)? {
                    Step::Consumed => break,
                    Step::Reprocess => continue,
                }
            }
            self.position.advance(c);
            if pausable && sink.wants_pause() {
                return Ok(offset + c.len_utf8());
            }
        }
        Ok(text.len())
    }

    fn step<S: JsonEventSink + ?Sized>(
        &mut self,
        c: char,
        sink: &mut S,
    ) -> Result<Step, ParseError> {
        match self.state {
            State::Begin => match c {
                c if is_whitespace(c) || c == '\u{feff}' => {}
                '{' => self.open(Container::Object, sink),
                '[' => self.open(Container::Array, sink),
                _ => return Err(self.fail("Non-whitespace before {[.", Some(c), sink)),
            },
            State::Done => {
                if !is_whitespace(c) {
                    return Err(self.fail("Unexpected data after the root value", Some(c), sink));
                }
            }
            State::OpenObject => match c {
                c if is_whitespace(c) => {}
                '}' => self.close_container(Container::Object, sink),
                '"' => self.begin_string(true),
                _ => {
                    return Err(self.fail(
                        "Malformed object key should start with \"",
                        Some(c),
                        sink,
                    ));
                }
            },
            State::OpenKey => match c {
                c if is_whitespace(c) => {}
                '"' => self.begin_string(true),
                _ => {
                    return Err(self.fail(
                        "Malformed object key should start with \"",
                        Some(c),
                        sink,
                    ));
                }
            },
            State::CloseKey => match c {
                c if is_whitespace(c) => {}
                ':' => self.state = State::Value,
                _ => return Err(self.fail("Expected ':' after object key", Some(c), sink)),
            },
            State::CloseObject => match c {
                c if is_whitespace(c) => {}
                ',' => self.state = State::OpenKey,
                '}' => self.close_container(Container::Object, sink),
                _ => return Err(self.fail("Bad object", Some(c), sink)),
            },
            State::OpenArray => match c {
                c if is_whitespace(c) => {}
                ']' => self.close_container(Container::Array, sink),
                _ => {
                    self.state = State::Value;
                    return Ok(Step::Reprocess);
                }
            },
            State::CloseArray => match c {
                c if is_whitespace(c) => {}
                ',' => self.state = State::Value,
                ']' => self.close_container(Container::Array, sink),
                _ => return Err(self.fail("Bad array", Some(c), sink)),
            },
            State::Value => match c {
                c if is_whitespace(c) => {}
                '"' => self.begin_string(false),
                '{' => self.open(Container::Object, sink),
                '[' => self.open(Container::Array, sink),
                't' => self.state = State::TrueR,
                'f' => self.state = State::FalseA,
                'n' => self.state = State::NullU,
                '-' | '0'..='9' => {
                    self.buffer.clear();
                    self.buffer.push(c);
                    self.state = State::NumberDigit;
                }
                _ => return Err(self.fail("Bad value", Some(c), sink)),
            },
            State::String => self.string_char(c, sink)?,
            State::TrueR => self.literal_char(c, 'r', State::TrueU, "true", sink)?,
            State::TrueU => self.literal_char(c, 'u', State::TrueE, "true", sink)?,
            State::TrueE => {
                self.expect_literal(c, 'e', "true", sink)?;
                self.emit_value(Scalar::Bool(true), sink);
            }
            State::FalseA => self.literal_char(c, 'a', State::FalseL, "false", sink)?,
            State::FalseL => self.literal_char(c, 'l', State::FalseS, "false", sink)?,
            State::FalseS => self.literal_char(c, 's', State::FalseE, "false", sink)?,
            State::FalseE => {
                self.expect_literal(c, 'e', "false", sink)?;
                self.emit_value(Scalar::Bool(false), sink);
            }
            State::NullU => self.literal_char(c, 'u', State::NullL, "null", sink)?,
            State::NullL => self.literal_char(c, 'l', State::NullL2, "null", sink)?,
            State::NullL2 => {
                self.expect_literal(c, 'l', "null", sink)?;
                self.emit_value(Scalar::Null, sink);
            }
            State::NumberDigit | State::NumberDecimalPoint => {
                return self.number_char(c, sink);
            }
        }
        Ok(Step::Consumed)
    }

    fn open<S: JsonEventSink + ?Sized>(&mut self, container: Container, sink: &mut S) {
        self.stack.push(container);
        match container {
            Container::Object => {
                sink.on_event(JsonEvent::OpenObject);
                self.state = State::OpenObject;
            }
            Container::Array => {
                sink.on_event(JsonEvent::OpenArray);
                self.state = State::OpenArray;
            }
        }
    }

    fn close_container<S: JsonEventSink + ?Sized>(&mut self, container: Container, sink: &mut S) {
        debug_assert_eq!(self.stack.last(), Some(&container));
        self.stack.pop();
        sink.on_event(match container {
            Container::Object => JsonEvent::CloseObject,
            Container::Array => JsonEvent::CloseArray,
        });
        self.after_value(sink);
    }

    fn after_value<S: JsonEventSink + ?Sized>(&mut self, sink: &mut S) {
        self.state = match self.stack.last() {
            Some(Container::Object) => State::CloseObject,
            Some(Container::Array) => State::CloseArray,
            None => {
                sink.on_event(JsonEvent::End);
                State::Done
            }
        };
    }

    fn emit_value<S: JsonEventSink + ?Sized>(&mut self, scalar: Scalar, sink: &mut S) {
        sink.on_event(JsonEvent::Value(scalar));
        self.after_value(sink);
    }

    fn begin_string(&mut self, is_key: bool) {
        self.buffer.clear();
        self.string = StringState {
            is_key,
            ..StringState::default()
        };
        self.state = State::String;
    }

    fn string_char<S: JsonEventSink + ?Sized>(
        &mut self,
        c: char,
        sink: &mut S,
    ) -> Result<(), ParseError> {
        if let Some((value, digits)) = self.string.unicode {
            let Some(digit) = c.to_digit(16) else {
                return Err(self.fail("Invalid unicode escape", Some(c), sink));
            };
            let value = (value << 4) | digit;
            if digits + 1 < 4 {
                self.string.unicode = Some((value, digits + 1));
            } else {
                self.string.unicode = None;
                self.push_code_unit(value);
            }
            return self.check_buffer(sink);
        }

        if self.string.escape {
            self.string.escape = false;
            let unescaped = match c {
                '"' => '"',
                '\\' => '\\',
                '/' => '/',
                'b' => '\u{8}',
                'f' => '\u{c}',
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                'u' => {
                    self.string.unicode = Some((0, 0));
                    return Ok(());
                }
                _ => return Err(self.fail("Invalid escape character", Some(c), sink)),
            };
            self.flush_surrogate();
            self.buffer.push(unescaped);
            return self.check_buffer(sink);
        }

        match c {
            '\\' => self.string.escape = true,
            '"' => {
                self.flush_surrogate();
                let text = std::mem::take(&mut self.buffer);
                if self.string.is_key {
                    sink.on_event(JsonEvent::Key(text));
                    self.state = State::CloseKey;
                } else {
                    self.emit_value(Scalar::String(text), sink);
                }
            }
            _ => {
                self.flush_surrogate();
                self.buffer.push(c);
                return self.check_buffer(sink);
            }
        }
        Ok(())
    }

    /// Append a decoded `\u` code unit, pairing surrogates.
    fn push_code_unit(&mut self, unit: u32) {
        match unit {
            0xD800..=0xDBFF => {
                self.flush_surrogate();
                self.string.high_surrogate = Some(unit);
            }
            0xDC00..=0xDFFF => match self.string.high_surrogate.take() {
                Some(high) => {
                    let combined = 0x10000 + ((high - 0xD800) << 10) + (unit - 0xDC00);
                    self.buffer
                        .push(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                None => self.buffer.push(char::REPLACEMENT_CHARACTER),
            },
            _ => {
                self.flush_surrogate();
                self.buffer
                    .push(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
        }
    }

    /// A high surrogate not followed by a low one decodes to U+FFFD.
    fn flush_surrogate(&mut self) {
        if self.string.high_surrogate.take().is_some() {
            self.buffer.push(char::REPLACEMENT_CHARACTER);
        }
    }

    fn number_char<S: JsonEventSink + ?Sized>(
        &mut self,
        c: char,
        sink: &mut S,
    ) -> Result<Step, ParseError> {
        match c {
            '0'..='9' => self.buffer.push(c),
            '.' => {
                if self.buffer.contains('.') {
                    return Err(self.fail("Invalid number has two dots", Some(c), sink));
                }
                if self.buffer.contains(['e', 'E']) {
                    return Err(self.fail("Invalid number has dot after exponent", Some(c), sink));
                }
                self.buffer.push(c);
                self.state = State::NumberDecimalPoint;
            }
            'e' | 'E' => {
                if self.buffer.contains(['e', 'E']) {
                    return Err(self.fail("Invalid number has two exponential", Some(c), sink));
                }
                self.buffer.push(c);
                self.state = State::NumberDigit;
            }
            '+' | '-' => {
                if !self.buffer.ends_with(['e', 'E']) {
                    return Err(self.fail("Invalid symbol in number", Some(c), sink));
                }
                self.buffer.push(c);
            }
            _ => {
                let text = std::mem::take(&mut self.buffer);
                match text.parse::<f64>() {
                    Ok(n) if n.is_finite() => {
                        self.emit_value(Scalar::Number(n), sink);
                        return Ok(Step::Reprocess);
                    }
                    _ => {
                        return Err(self.fail(
                            &format!("Invalid number '{}'", text),
                            Some(c),
                            sink,
                        ));
                    }
                }
            }
        }
        self.check_buffer(sink)?;
        Ok(Step::Consumed)
    }

    fn literal_char<S: JsonEventSink + ?Sized>(
        &mut self,
        c: char,
        expected: char,
        next: State,
        literal: &str,
        sink: &mut S,
    ) -> Result<(), ParseError> {
        self.expect_literal(c, expected, literal, sink)?;
        self.state = next;
        Ok(())
    }

    fn expect_literal<S: JsonEventSink + ?Sized>(
        &mut self,
        c: char,
        expected: char,
        literal: &str,
        sink: &mut S,
    ) -> Result<(), ParseError> {
        if c == expected {
            Ok(())
        } else {
            Err(self.fail(&format!("Invalid literal, expected {}", literal), Some(c), sink))
        }
    }

    fn check_buffer<S: JsonEventSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), ParseError> {
        if self.buffer.len() > self.max_buffer_length {
            return Err(self.fail(
                &format!(
                    "Max buffer length exceeded: token longer than {} bytes",
                    self.max_buffer_length
                ),
                None,
                sink,
            ));
        }
        Ok(())
    }

    /// Record the error, emit it once and poison the tokenizer.
    fn fail<S: JsonEventSink + ?Sized>(
        &mut self,
        message: &str,
        character: Option<char>,
        sink: &mut S,
    ) -> ParseError {
        let error = ParseError {
            message: message.to_string(),
            line: self.position.line,
            column: self.position.column,
            offset: self.position.offset,
            character,
        };
        tracing::debug!(error = %error, "Tokenizer error");
        sink.on_event(JsonEvent::Error(error.clone()));
        self.error = Some(error.clone());
        error
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<JsonEvent> {
        let mut tokenizer = Tokenizer::new();
        let mut events = Vec::new();
        let _ = tokenizer
            .write(input, &mut events)
            .and_then(|_| tokenizer.close(&mut events));
        events
    }

    fn value(s: &str) -> JsonEvent {
        JsonEvent::Value(Scalar::String(s.to_string()))
    }

    #[test]
    fn test_simple_object() {
        let events = tokenize(r#"{"a": 1, "b": [true, false, null], "c": "x"}"#);
        assert_eq!(
            events,
            vec![
                JsonEvent::OpenObject,
                JsonEvent::Key("a".into()),
                JsonEvent::Value(Scalar::Number(1.0)),
                JsonEvent::Key("b".into()),
                JsonEvent::OpenArray,
                JsonEvent::Value(Scalar::Bool(true)),
                JsonEvent::Value(Scalar::Bool(false)),
                JsonEvent::Value(Scalar::Null),
                JsonEvent::CloseArray,
                JsonEvent::Key("c".into()),
                value("x"),
                JsonEvent::CloseObject,
                JsonEvent::End,
            ]
        );
    }

    #[test]
    fn test_empty_containers() {
        let events = tokenize(r#"{"a": {}, "b": []}"#);
        assert_eq!(
            events,
            vec![
                JsonEvent::OpenObject,
                JsonEvent::Key("a".into()),
                JsonEvent::OpenObject,
                JsonEvent::CloseObject,
                JsonEvent::Key("b".into()),
                JsonEvent::OpenArray,
                JsonEvent::CloseArray,
                JsonEvent::CloseObject,
                JsonEvent::End,
            ]
        );
    }

    #[test]
    fn test_escapes_and_unicode() {
        let events = tokenize(r#"["a\"b\\c\/d\n\t", "é中", "😀", "\ud800x"]"#);
        assert_eq!(events[1], value("a\"b\\c/d\n\t"));
        assert_eq!(events[2], value("é中"));
        assert_eq!(events[3], value("😀"));
        assert_eq!(events[4], value("\u{fffd}x"));
    }

    #[test]
    fn test_numbers() {
        let events = tokenize("[-1.5e3, 0, 2E-2, 10]");
        assert_eq!(
            &events[1..5],
            &[
                JsonEvent::Value(Scalar::Number(-1500.0)),
                JsonEvent::Value(Scalar::Number(0.0)),
                JsonEvent::Value(Scalar::Number(0.02)),
                JsonEvent::Value(Scalar::Number(10.0)),
            ]
        );
    }

    #[test]
    fn test_split_inside_tokens() {
        let mut tokenizer = Tokenizer::new();
        let mut events = Vec::new();
        for chunk in ["{\"ke", "y\": \"\\u00", "e9\\", "n\", \"n\": 12", ".5, \"t\": tr", "ue}"] {
            tokenizer.write(chunk, &mut events).unwrap();
        }
        tokenizer.close(&mut events).unwrap();
        assert_eq!(
            events,
            vec![
                JsonEvent::OpenObject,
                JsonEvent::Key("key".into()),
                value("é\n"),
                JsonEvent::Key("n".into()),
                JsonEvent::Value(Scalar::Number(12.5)),
                JsonEvent::Key("t".into()),
                JsonEvent::Value(Scalar::Bool(true)),
                JsonEvent::CloseObject,
                JsonEvent::End,
            ]
        );
    }

    #[test]
    fn test_split_utf8_bytes() {
        let doc = "[\"héllo\"]".as_bytes();
        let mut tokenizer = Tokenizer::new();
        let mut events = Vec::new();
        // Split in the middle of the two-byte 'é'
        tokenizer.write_bytes(&doc[..4], &mut events).unwrap();
        tokenizer.write_bytes(&doc[4..], &mut events).unwrap();
        tokenizer.close(&mut events).unwrap();
        assert_eq!(events[1], value("héllo"));
    }

    #[test]
    fn test_non_whitespace_before_root() {
        let events = tokenize("x{}");
        assert_eq!(events.len(), 1);
        match &events[0] {
            JsonEvent::Error(e) => {
                assert_eq!(e.line, 1);
                assert_eq!(e.column, 0);
                assert_eq!(e.character, Some('x'));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_bad_literal_emits_single_error() {
        let events = tokenize(r#"{"a": trux}"#);
        let errors = events
            .iter()
            .filter(|e| matches!(e, JsonEvent::Error(_)))
            .count();
        assert_eq!(errors, 1);
        assert!(matches!(events.last(), Some(JsonEvent::Error(_))));
    }

    #[test]
    fn test_two_dots_and_two_exponents() {
        assert!(matches!(tokenize("[1.2.3]").last(), Some(JsonEvent::Error(e)) if e.message.contains("two dots")));
        assert!(matches!(tokenize("[1e2e3]").last(), Some(JsonEvent::Error(e)) if e.message.contains("two exponential")));
    }

    #[test]
    fn test_unterminated_string() {
        let events = tokenize(r#"{"a": "abc"#);
        assert!(matches!(events.last(), Some(JsonEvent::Error(e)) if e.message == "Unterminated string"));
    }

    #[test]
    fn test_max_buffer_length() {
        let mut tokenizer = Tokenizer::with_max_buffer_length(4);
        let mut events = Vec::new();
        let result = tokenizer.write(r#"["abcdef"]"#, &mut events);
        assert!(result.is_err());
        assert!(result.unwrap_err().message.contains("Max buffer length"));
    }

    #[test]
    fn test_poisoned_after_error() {
        let mut tokenizer = Tokenizer::new();
        let mut events = Vec::new();
        assert!(tokenizer.write("[}", &mut events).is_err());
        let count = events.len();
        assert!(tokenizer.write("]", &mut events).is_err());
        assert!(tokenizer.close(&mut events).is_err());
        assert_eq!(events.len(), count);
    }

    #[test]
    fn test_reusable_after_close() {
        let mut tokenizer = Tokenizer::new();
        let mut events = Vec::new();
        tokenizer.write("[1]", &mut events).unwrap();
        tokenizer.close(&mut events).unwrap();
        tokenizer.write("{\"a\":2}", &mut events).unwrap();
        tokenizer.close(&mut events).unwrap();
        let ends = events.iter().filter(|e| **e == JsonEvent::End).count();
        assert_eq!(ends, 2);
    }

    #[test]
    fn test_line_and_column_tracking() {
        let events = tokenize("{\n  \"a\": 1,\n  \"b\": ?\n}");
        match events.last() {
            Some(JsonEvent::Error(e)) => {
                assert_eq!(e.line, 3);
                assert_eq!(e.column, 7);
                assert_eq!(e.character, Some('?'));
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    /// Pauses whenever a scalar value is waiting to be drained
    #[derive(Default)]
    struct PausingSink {
        events: Vec<JsonEvent>,
        undrained_values: usize,
    }

    impl JsonEventSink for PausingSink {
        fn on_event(&mut self, event: JsonEvent) {
            if matches!(event, JsonEvent::Value(_)) {
                self.undrained_values += 1;
            }
            self.events.push(event);
        }

        fn wants_pause(&self) -> bool {
            self.undrained_values > 0
        }
    }

    #[test]
    fn test_write_partial_pauses_per_value() {
        let doc = r#"{"a": 1, "b": ["é", true], "c": null}"#;
        let mut tokenizer = Tokenizer::new();
        let mut sink = PausingSink::default();
        let mut rest = doc;
        let mut calls = 0;
        while !rest.is_empty() {
            let consumed = tokenizer.write_partial(rest, &mut sink).unwrap();
            assert!(sink.undrained_values <= 1);
            sink.undrained_values = 0;
            rest = &rest[consumed..];
            calls += 1;
        }
        tokenizer.close(&mut sink).unwrap();

        assert_eq!(calls, 5);
        assert_eq!(sink.events, tokenize(doc));
    }

    #[test]
    fn test_write_bytes_partial_with_split_sequence() {
        let doc = "[\"é\", 2]".as_bytes();
        // Split inside the two-byte `é`
        let (head, tail) = doc.split_at(3);
        let mut tokenizer = Tokenizer::new();
        let mut sink = PausingSink::default();

        assert_eq!(tokenizer.write_bytes_partial(head, &mut sink).unwrap(), head.len());
        let mut rest = tail;
        while !rest.is_empty() {
            let consumed = tokenizer.write_bytes_partial(rest, &mut sink).unwrap();
            sink.undrained_values = 0;
            rest = &rest[consumed..];
        }
        tokenizer.close(&mut sink).unwrap();

        assert_eq!(sink.events, tokenize("[\"é\", 2]"));
    }
}
