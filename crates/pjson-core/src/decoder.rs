//! Progressive PJSON decoder
//!
//! Bytes are appended with [`Decoder::feed`] in arrival order. The decoder
//! consumes every complete token and keeps an explicit stack of open
//! containers, so any prefix of a valid stream yields the partial tree built
//! so far. A token cut off by the end of the buffer is not consumed: the
//! cursor stays at its first byte and parsing resumes there on the next feed.

use crate::date::Date;
use crate::dictionary::DictionaryTable;
use crate::lexer::{Halt, Lexer, Stall, Token};
use crate::refs::{RefTable, Unresolved};
use crate::types::Value;
use crate::{Error, PjConfig, Result};
use std::sync::Arc;

/// Consumed bytes are dropped from the buffer once there are at least this
/// many and they make up half of it
const COMPACT_THRESHOLD: usize = 4096;

/// Upper bound on capacity reserved from a declared container length
const MAX_PREALLOC: usize = 1024;

/// Result of one [`Decoder::feed`]
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Complete value, or the partial tree decoded so far (`None` before the
    /// first token)
    pub value: Option<Value>,
    /// True once the top-level value is complete
    pub complete: bool,
}

/// Where the decoder is paused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// At a token boundary with no open container
    AwaitingToken,
    /// Inside a string payload; `missing` more bytes are needed
    AwaitingStringPayload { missing: usize },
    /// Inside a varint
    AwaitingVarintTerminator,
    /// At a token boundary inside `depth` open containers
    AwaitingChild { depth: usize },
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy)]
enum Container {
    Array,
    Object,
}

#[derive(Debug)]
enum Frame {
    Array {
        id: u32,
        items: Vec<Value>,
        remaining: usize,
    },
    Object {
        id: u32,
        entries: Vec<(String, Value)>,
        remaining: usize,
        pending_key: Option<String>,
    },
}

impl Frame {
    /// Copy of the frame as a value, with `child` appended if given
    fn partial(&self, child: Option<Value>) -> Value {
        match self {
            Frame::Array { items, .. } => {
                let mut items = items.clone();
                items.extend(child);
                Value::array(items)
            }
            Frame::Object {
                entries,
                pending_key,
                ..
            } => {
                let mut entries = entries.clone();
                if let (Some(key), Some(child)) = (pending_key, child) {
                    entries.push((key.clone(), child));
                }
                Value::Object(Arc::new(entries))
            }
        }
    }
}

/// Streaming decoder for one message
///
/// # Example
///
/// ```rust,ignore
/// let mut decoder = Decoder::new();
/// for chunk in chunks {
///     let progress = decoder.feed(chunk)?;
///     render(progress.value);
/// }
/// ```
pub struct Decoder {
    config: PjConfig,
    buf: Vec<u8>,
    /// Start of the next unconsumed token in `buf`
    pos: usize,
    /// Bytes dropped from the front of `buf` so far
    drained: u64,
    stall: Stall,
    dict: DictionaryTable,
    refs: RefTable,
    stack: Vec<Frame>,
    root: Option<Value>,
    failure: Option<Error>,
    tokens: u64,
}

impl Decoder {
    pub fn new() -> Self {
        Self::with_config(PjConfig::default())
    }

    pub fn with_config(config: PjConfig) -> Self {
        Self {
            config,
            buf: Vec::new(),
            pos: 0,
            drained: 0,
            stall: Stall::Token,
            dict: DictionaryTable::new(),
            refs: RefTable::new(),
            stack: Vec::new(),
            root: None,
            failure: None,
            tokens: 0,
        }
    }

    pub fn config(&self) -> &PjConfig {
        &self.config
    }

    /// Append a chunk and return the value decoded so far
    ///
    /// Every call copies the open containers into a fresh snapshot, so a
    /// long container arriving in many small chunks costs quadratic time in
    /// snapshots alone. Loops that do not need every intermediate tree should
    /// call [`Decoder::push`] and take a [`Decoder::snapshot`] when rendering.
    pub fn feed(&mut self, chunk: impl AsRef<[u8]>) -> Result<Progress> {
        let complete = self.push(chunk)?;
        Ok(Progress {
            value: self.snapshot(),
            complete,
        })
    }

    /// Append a chunk without building a snapshot
    ///
    /// Returns true once the top-level value is complete.
    pub fn push(&mut self, chunk: impl AsRef<[u8]>) -> Result<bool> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.buf.extend_from_slice(chunk.as_ref());

        if let Err(err) = self.run() {
            tracing::debug!(error = %err, consumed = self.bytes_consumed(), "pj decoder rejected stream");
            self.failure = Some(err.clone());
            return Err(err);
        }
        Ok(self.root.is_some())
    }

    /// The complete value, or the deepest partial tree
    pub fn snapshot(&self) -> Option<Value> {
        if let Some(root) = &self.root {
            return Some(root.clone());
        }
        self.stack
            .iter()
            .rev()
            .fold(None, |child, frame| Some(frame.partial(child)))
    }

    pub fn state(&self) -> ParseState {
        if self.failure.is_some() {
            return ParseState::Failed;
        }
        if self.root.is_some() {
            return ParseState::Done;
        }
        match self.stall {
            Stall::Payload { end } => ParseState::AwaitingStringPayload {
                missing: end.saturating_sub(self.buf.len()),
            },
            Stall::Varint => ParseState::AwaitingVarintTerminator,
            Stall::Token if self.stack.is_empty() => ParseState::AwaitingToken,
            Stall::Token => ParseState::AwaitingChild {
                depth: self.stack.len(),
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        self.root.is_some()
    }

    /// The complete top-level value, if decoded
    pub fn value(&self) -> Option<&Value> {
        self.root.as_ref()
    }

    /// Consume the decoder, requiring a complete value
    pub fn finish(self) -> Result<Value> {
        if let Some(err) = self.failure {
            return Err(err);
        }
        self.root.ok_or(Error::Incomplete {
            offset: self.drained + self.buf.len() as u64,
        })
    }

    /// Discard all state and start a new message
    ///
    /// Buffer and table allocations are kept for reuse.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.pos = 0;
        self.drained = 0;
        self.stall = Stall::Token;
        self.dict.clear();
        self.refs.clear();
        self.stack.clear();
        self.root = None;
        self.failure = None;
        self.tokens = 0;
    }

    /// Stream offset just past the last complete token
    pub fn bytes_consumed(&self) -> u64 {
        self.drained + self.pos as u64
    }

    fn run(&mut self) -> Result<()> {
        if let Stall::Payload { end } = self.stall {
            if end > self.buf.len() {
                return Ok(());
            }
        }

        loop {
            let lexed = {
                let mut lexer = Lexer::new(&self.buf, self.pos, self.drained);
                lexer.next_token().map(|token| (token, lexer.position()))
            };

            match lexed {
                Ok((token, next)) => {
                    let at = self.bytes_consumed();
                    self.pos = next;
                    self.tokens += 1;
                    self.apply(token, at)?;
                }
                Err(Halt::Pending(stall)) => {
                    if self.root.is_some() && self.pos < self.buf.len() {
                        return Err(Error::malformed(
                            self.bytes_consumed(),
                            "trailing data after complete value",
                        ));
                    }
                    self.stall = stall;
                    break;
                }
                Err(Halt::Failed(err)) => return Err(err),
            }
        }

        if self.root.is_none() {
            tracing::trace!(
                state = ?self.state(),
                consumed = self.bytes_consumed(),
                buffered = self.buf.len() - self.pos,
                "pj decoder waiting for input"
            );
        }
        self.compact();
        Ok(())
    }

    fn apply(&mut self, token: Token, at: u64) -> Result<()> {
        if self.root.is_some() {
            return match token {
                Token::Pad => Ok(()),
                _ => Err(Error::malformed(at, "trailing data after complete value")),
            };
        }

        match token {
            Token::Pad => Ok(()),
            Token::Null => self.attach(Value::Null, at),
            Token::Boolean(b) => self.attach(Value::Boolean(b), at),
            Token::Integer(i) => self.attach(Value::Integer(i), at),
            Token::Float(f) => self.attach(Value::Float(f), at),
            Token::Date(ms) => self.attach(Value::Date(Date::from_millis(ms)), at),
            Token::String(s) => self.attach(Value::String(s), at),
            Token::StringDef(s) => {
                self.dict.define(s.clone());
                self.attach(Value::String(s), at)
            }
            Token::StringRef(id) => {
                let s = self.lookup(id, at)?;
                self.attach(Value::String(s), at)
            }
            Token::Key(key) => self.set_key(key, at),
            Token::KeyDef(key) => {
                self.dict.define(key.clone());
                self.set_key(key, at)
            }
            Token::KeyRef(id) => {
                let key = self.lookup(id, at)?;
                self.set_key(key, at)
            }
            Token::Array(len) => self.open(Container::Array, len, at),
            Token::Object(len) => self.open(Container::Object, len, at),
            Token::StructRef(id) => match self.refs.resolve(id) {
                Ok(value) => self.attach(value, at),
                Err(Unresolved::Unknown) => Err(Error::malformed(
                    at,
                    format!("unknown structural id {}", id),
                )),
                Err(Unresolved::Open) => Err(Error::malformed(
                    at,
                    format!("structural id {} refers to an unfinished container", id),
                )),
            },
        }
    }

    fn lookup(&self, id: u64, at: u64) -> Result<String> {
        self.dict
            .get(id)
            .map(str::to_string)
            .ok_or_else(|| Error::malformed(at, format!("unknown dictionary id {}", id)))
    }

    fn set_key(&mut self, key: String, at: u64) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Object { pending_key, .. }) => {
                if pending_key.is_some() {
                    return Err(Error::malformed(at, "key where a value was expected"));
                }
                *pending_key = Some(key);
                Ok(())
            }
            _ => Err(Error::malformed(at, "key outside an object")),
        }
    }

    fn check_value_slot(&self, at: u64) -> Result<()> {
        match self.stack.last() {
            Some(Frame::Object {
                pending_key: None, ..
            }) => Err(Error::malformed(at, "object value without a pending key")),
            _ => Ok(()),
        }
    }

    fn open(&mut self, kind: Container, len: usize, at: u64) -> Result<()> {
        self.check_value_slot(at)?;
        if self.stack.len() + 1 > self.config.max_depth {
            return Err(Error::DepthExceeded(self.config.max_depth));
        }

        let id = self.refs.reserve();
        let capacity = len.min(MAX_PREALLOC);
        let frame = match kind {
            Container::Array => Frame::Array {
                id,
                items: Vec::with_capacity(capacity),
                remaining: len,
            },
            Container::Object => Frame::Object {
                id,
                entries: Vec::with_capacity(capacity),
                remaining: len,
                pending_key: None,
            },
        };

        if len == 0 {
            let value = self.close(frame);
            return self.attach(value, at);
        }
        self.stack.push(frame);
        Ok(())
    }

    /// Place a finished value into the innermost open container, closing
    /// every container this fills up
    fn attach(&mut self, mut value: Value, at: u64) -> Result<()> {
        loop {
            let filled = match self.stack.last_mut() {
                None => {
                    self.complete(value);
                    return Ok(());
                }
                Some(Frame::Array {
                    items, remaining, ..
                }) => {
                    items.push(value);
                    *remaining -= 1;
                    *remaining == 0
                }
                Some(Frame::Object {
                    entries,
                    remaining,
                    pending_key,
                    ..
                }) => {
                    let key = pending_key.take().ok_or_else(|| {
                        Error::malformed(at, "object value without a pending key")
                    })?;
                    entries.push((key, value));
                    *remaining -= 1;
                    *remaining == 0
                }
            };

            if !filled {
                return Ok(());
            }
            match self.stack.pop() {
                Some(frame) => value = self.close(frame),
                None => return Ok(()),
            }
        }
    }

    fn close(&mut self, frame: Frame) -> Value {
        let (id, value) = match frame {
            Frame::Array { id, items, .. } => (id, Value::Array(Arc::new(items))),
            Frame::Object { id, entries, .. } => (id, Value::Object(Arc::new(entries))),
        };
        self.refs.fill(id, value.clone());
        value
    }

    fn complete(&mut self, value: Value) {
        tracing::debug!(
            bytes = self.bytes_consumed(),
            tokens = self.tokens,
            dict_entries = self.dict.len(),
            containers = self.refs.len(),
            "pj decode complete"
        );
        self.root = Some(value);
    }

    fn compact(&mut self) {
        if self.pos < COMPACT_THRESHOLD || self.pos * 2 < self.buf.len() {
            return;
        }
        let consumed = self.pos;
        self.buf.drain(..consumed);
        self.drained += consumed as u64;
        self.pos = 0;
        if let Stall::Payload { end } = &mut self.stall {
            *end -= consumed;
        }
        tracing::trace!(
            drained = self.drained,
            retained = self.buf.len(),
            "pj decoder compacted buffer"
        );
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
