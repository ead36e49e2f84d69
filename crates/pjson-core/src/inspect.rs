//! Human-readable token listing
//!
//! Renders a wire string one token per line, indented by nesting depth, with
//! the dictionary and structural ids each token defines or refers to. Useful
//! for eyeballing captured streams; truncated input lists what is complete.

use crate::date::Date;
use crate::lexer::{Halt, Lexer, Stall, Token};
use crate::Result;

const INDENT: &str = "  ";

/// An open container and how many more tokens it holds (two per object entry)
struct Open {
    remaining: usize,
    closer: &'static str,
}

#[derive(Default)]
struct Listing {
    lines: Vec<String>,
    open: Vec<Open>,
    next_string: u64,
    next_container: u64,
}

impl Listing {
    fn line(&mut self, text: String) {
        self.lines
            .push(format!("{}{}", INDENT.repeat(self.open.len()), text));
    }

    fn container(
        &mut self,
        kind: &str,
        len: usize,
        brackets: (&'static str, &'static str),
    ) -> (String, Option<Open>) {
        let id = self.next_container;
        self.next_container += 1;
        let (opener, closer) = brackets;
        if len == 0 {
            return (format!("{}#{} {}{}", kind, id, opener, closer), None);
        }
        let remaining = if closer == "}" { len.saturating_mul(2) } else { len };
        (
            format!("{}#{}({}) {}", kind, id, len, opener),
            Some(Open { remaining, closer }),
        )
    }

    fn define(&mut self) -> u64 {
        let id = self.next_string;
        self.next_string += 1;
        id
    }

    fn token(&mut self, token: Token) {
        let (text, opens) = match token {
            Token::Pad => {
                self.line("PAD".to_string());
                return;
            }
            Token::Null => ("NULL".to_string(), None),
            Token::Boolean(true) => ("TRUE".to_string(), None),
            Token::Boolean(false) => ("FALSE".to_string(), None),
            Token::Integer(i) => (format!("INT {}", i), None),
            Token::Float(f) => (format!("FLOAT {:?}", f), None),
            Token::Date(ms) => (format!("DATE {}", Date::from_millis(ms)), None),
            Token::String(s) => (format!("STRING {:?}", s), None),
            Token::StringDef(s) => (format!("STRING#{} {:?}", self.define(), s), None),
            Token::StringRef(id) => (format!("REF#{}", id), None),
            Token::Key(k) => (format!("KEY {:?}", k), None),
            Token::KeyDef(k) => (format!("KEY#{} {:?}", self.define(), k), None),
            Token::KeyRef(id) => (format!("KEY REF#{}", id), None),
            Token::Array(len) => self.container("ARRAY", len, ("[", "]")),
            Token::Object(len) => self.container("OBJECT", len, ("{", "}")),
            Token::StructRef(id) => (format!("STRUCT REF#{}", id), None),
        };

        self.line(text);
        if let Some(parent) = self.open.last_mut() {
            parent.remaining = parent.remaining.saturating_sub(1);
        }
        self.open.extend(opens);
        self.purge_closed();
    }

    fn purge_closed(&mut self) {
        while let Some(top) = self.open.last() {
            if top.remaining > 0 {
                break;
            }
            let closer = top.closer;
            self.open.pop();
            self.line(closer.to_string());
        }
    }
}

/// List the tokens of a wire string
///
/// Input that stops inside a token or an open container ends with an
/// `… incomplete` line. Unreadable tokens are an error.
pub fn inspect(wire: &str) -> Result<String> {
    let mut listing = Listing::default();
    let mut lexer = Lexer::new(wire.as_bytes(), 0, 0);

    let complete = loop {
        match lexer.next_token() {
            Ok(token) => listing.token(token),
            Err(Halt::Pending(Stall::Token)) => break listing.open.is_empty(),
            Err(Halt::Pending(_)) => break false,
            Err(Halt::Failed(err)) => return Err(err),
        }
    };

    if !complete {
        listing.lines.push("… incomplete".to_string());
    }
    Ok(listing.lines.join("\n"))
}
