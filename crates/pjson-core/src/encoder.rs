//! Depth-first PJSON encoder

use crate::dictionary::{Dictionary, Interned};
use crate::encoding::{
    encode_container_start, encode_date, encode_float, encode_int, encode_unsigned,
};
use crate::refs::{RefTracker, Visit};
use crate::types::{tag, Value};
use crate::{Error, PjConfig, Result};
use std::sync::Arc;

/// Encoder for single messages
///
/// The dictionary and structural table are rebuilt for every call to
/// [`Encoder::encode`]; only the configuration carries over.
pub struct Encoder {
    config: PjConfig,
    out: String,
    dict: Dictionary,
    refs: RefTracker,
    depth: usize,
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_config(PjConfig::default())
    }

    pub fn with_config(config: PjConfig) -> Self {
        Self {
            dict: Dictionary::new(config.max_dict_entries, config.min_dict_len),
            config,
            out: String::new(),
            refs: RefTracker::new(),
            depth: 0,
        }
    }

    pub fn config(&self) -> &PjConfig {
        &self.config
    }

    /// Encode one value into a wire string
    pub fn encode(&mut self, value: &Value) -> Result<String> {
        self.dict = Dictionary::new(self.config.max_dict_entries, self.config.min_dict_len);
        self.refs = RefTracker::new();
        self.depth = 0;
        self.out = String::new();

        self.write_value(value)?;

        tracing::debug!(
            bytes = self.out.len(),
            dict_entries = self.dict.len(),
            containers = self.refs.len(),
            structural_refs = self.refs.hits(),
            "pj encode"
        );
        Ok(std::mem::take(&mut self.out))
    }

    fn write_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.out.push(tag::NULL as char),
            Value::Boolean(true) => self.out.push(tag::TRUE as char),
            Value::Boolean(false) => self.out.push(tag::FALSE as char),
            Value::Integer(i) => encode_int(*i, &mut self.out),
            Value::Float(f) => {
                self.out.push(tag::FLOAT as char);
                encode_float(*f, &mut self.out);
            }
            Value::Date(d) => {
                self.out.push(tag::DATE as char);
                encode_date(d.millis(), &mut self.out);
            }
            Value::String(s) => self.write_string(s),
            Value::Array(items) => {
                if let Some(id) = self.seen(items) {
                    return self.write_struct_ref(id);
                }
                encode_container_start(tag::SHORT_ARRAY, tag::ARRAY, items.len(), &mut self.out);
                self.enter()?;
                for item in items.iter() {
                    self.write_value(item)?;
                }
                self.depth -= 1;
            }
            Value::Object(entries) => {
                if let Some(id) = self.seen(entries) {
                    return self.write_struct_ref(id);
                }
                encode_container_start(tag::SHORT_OBJECT, tag::OBJECT, entries.len(), &mut self.out);
                self.enter()?;
                for (key, item) in entries.iter() {
                    self.write_key(key);
                    self.write_value(item)?;
                }
                self.depth -= 1;
            }
        }
        Ok(())
    }

    /// Registers the container (before its children) and returns the id of
    /// an earlier occurrence, if any
    fn seen<T>(&mut self, container: &Arc<T>) -> Option<u32> {
        if !self.config.structural_refs {
            self.refs.allocate();
            return None;
        }
        match self.refs.visit(container) {
            Visit::Seen(id) => Some(id),
            Visit::New(_) => None,
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(Error::DepthExceeded(self.config.max_depth));
        }
        Ok(())
    }

    fn write_struct_ref(&mut self, id: u32) -> Result<()> {
        self.out.push(tag::STRUCT_REF as char);
        encode_unsigned(id as u64, &mut self.out);
        Ok(())
    }

    fn write_string(&mut self, s: &str) {
        match self.dict.intern_value(s) {
            Interned::Reference(id) => self.write_id(tag::STRING_REF, id),
            Interned::Definition(_) => self.write_payload(tag::STRING_DEF, s),
            Interned::Literal => self.write_payload(tag::STRING, s),
        }
    }

    fn write_key(&mut self, key: &str) {
        match self.dict.intern_key(key) {
            Interned::Reference(id) => self.write_id(tag::KEY_REF, id),
            Interned::Definition(_) => self.write_payload(tag::KEY_DEF, key),
            Interned::Literal => self.write_payload(tag::KEY, key),
        }
    }

    fn write_id(&mut self, tag: u8, id: u32) {
        self.out.push(tag as char);
        encode_unsigned(id as u64, &mut self.out);
    }

    fn write_payload(&mut self, tag: u8, s: &str) {
        self.out.push(tag as char);
        encode_unsigned(s.len() as u64, &mut self.out);
        self.out.push_str(s);
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
