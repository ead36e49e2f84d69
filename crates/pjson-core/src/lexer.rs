//! Token reader shared by the decoder and the inspector
//!
//! A `Lexer` reads from a borrowed buffer and reports how far it got. When a
//! token runs past the end of the buffer it halts with [`Halt::Pending`]; the
//! caller keeps its own cursor at the token start and retries once more
//! bytes arrived.

use crate::encoding::{classify, decode_varint, float_from_bits, Lead, Varint};
use crate::types::tag;
use crate::Error;

/// One complete token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Pad,
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Date(i64),
    String(String),
    StringDef(String),
    StringRef(u64),
    Key(String),
    KeyDef(String),
    KeyRef(u64),
    Array(usize),
    Object(usize),
    StructRef(u64),
}

/// What the lexer was waiting for when the buffer ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stall {
    /// No bytes at the token boundary
    Token,
    /// Inside a varint (no digit yet, or no terminator yet)
    Varint,
    /// Inside a string payload that ends at buffer offset `end`
    Payload { end: usize },
}

/// Why a token could not be produced
#[derive(Debug, Clone, PartialEq)]
pub enum Halt {
    Pending(Stall),
    Failed(Error),
}

impl From<Error> for Halt {
    fn from(err: Error) -> Self {
        Halt::Failed(err)
    }
}

type Lex<T> = std::result::Result<T, Halt>;

pub struct Lexer<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Stream offset of `buf[0]`, for error reporting
    base: u64,
}

impl<'a> Lexer<'a> {
    pub fn new(buf: &'a [u8], pos: usize, base: u64) -> Self {
        Self { buf, pos, base }
    }

    /// Offset just past the last complete token
    pub fn position(&self) -> usize {
        self.pos
    }

    fn fail(&self, at: usize, reason: impl Into<String>) -> Halt {
        Halt::Failed(Error::malformed(self.base + at as u64, reason))
    }

    /// Read the next token, advancing only if it is complete
    pub fn next_token(&mut self) -> Lex<Token> {
        let start = self.pos;
        let mut cursor = Lexer::new(self.buf, start, self.base);
        let token = cursor.read_token()?;
        self.pos = cursor.pos;
        Ok(token)
    }

    fn read_token(&mut self) -> Lex<Token> {
        let start = self.pos;
        let Some(&symbol) = self.buf.get(start) else {
            return Err(Halt::Pending(Stall::Token));
        };
        self.pos += 1;

        match classify(symbol) {
            Lead::SmallInt(n) => Ok(Token::Integer(n as i64)),
            Lead::ShortArray(n) => Ok(Token::Array(n as usize)),
            Lead::ShortObject(n) => Ok(Token::Object(n as usize)),
            Lead::Tag => match symbol {
                tag::PAD => Ok(Token::Pad),
                tag::NULL => Ok(Token::Null),
                tag::TRUE => Ok(Token::Boolean(true)),
                tag::FALSE => Ok(Token::Boolean(false)),
                tag::INT => Ok(Token::Integer(self.signed()?)),
                tag::FLOAT => Ok(Token::Float(float_from_bits(self.unsigned()?))),
                tag::DATE => Ok(Token::Date(self.signed()?)),
                tag::STRING => Ok(Token::String(self.payload()?)),
                tag::STRING_DEF => Ok(Token::StringDef(self.payload()?)),
                tag::STRING_REF => Ok(Token::StringRef(self.unsigned()?)),
                tag::KEY => Ok(Token::Key(self.payload()?)),
                tag::KEY_DEF => Ok(Token::KeyDef(self.payload()?)),
                tag::KEY_REF => Ok(Token::KeyRef(self.unsigned()?)),
                tag::ARRAY => Ok(Token::Array(self.length()?)),
                tag::OBJECT => Ok(Token::Object(self.length()?)),
                tag::STRUCT_REF => Ok(Token::StructRef(self.unsigned()?)),
                _ => Err(self.unknown(start, symbol)),
            },
            Lead::Invalid => Err(self.unknown(start, symbol)),
        }
    }

    fn unknown(&self, at: usize, symbol: u8) -> Halt {
        if symbol.is_ascii_graphic() {
            self.fail(at, format!("unknown type tag {:?}", symbol as char))
        } else {
            self.fail(at, format!("unknown type tag 0x{:02x}", symbol))
        }
    }

    fn varint(&mut self) -> Lex<Varint> {
        let at = self.pos;
        match decode_varint(&self.buf[at..]) {
            Ok(Some((varint, len))) => {
                self.pos += len;
                Ok(varint)
            }
            Ok(None) => Err(Halt::Pending(Stall::Varint)),
            Err(err) => Err(self.fail(at, reason(err))),
        }
    }

    fn unsigned(&mut self) -> Lex<u64> {
        let at = self.pos;
        let varint = self.varint()?;
        varint.to_u64().map_err(|err| self.fail(at, reason(err)))
    }

    fn signed(&mut self) -> Lex<i64> {
        let at = self.pos;
        let varint = self.varint()?;
        varint.to_i64().map_err(|err| self.fail(at, reason(err)))
    }

    fn length(&mut self) -> Lex<usize> {
        let at = self.pos;
        let len = self.unsigned()?;
        usize::try_from(len).map_err(|_| self.fail(at, format!("length {} too large", len)))
    }

    fn payload(&mut self) -> Lex<String> {
        let len = self.length()?;
        let start = self.pos;
        let end = start
            .checked_add(len)
            .ok_or_else(|| self.fail(start, format!("string length {} too large", len)))?;
        if end > self.buf.len() {
            return Err(Halt::Pending(Stall::Payload { end }));
        }

        let bytes = &self.buf[start..end];
        let s = std::str::from_utf8(bytes)
            .map_err(|e| self.fail(start, format!("invalid UTF-8 in string payload: {}", e)))?;
        self.pos = end;
        Ok(s.to_string())
    }
}

fn reason(err: Error) -> String {
    match err {
        Error::InvalidEncoding(reason) => reason,
        other => other.to_string(),
    }
}
