//! String/key back-reference dictionary
//!
//! Value strings and object keys share one id counter. Ids are never sent
//! with a definition: both sides number entries in the order definitions
//! appear in the stream, so the writer and reader must see definitions in
//! exactly the same order.

use std::collections::HashMap;

/// Outcome of interning a string on the encode side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interned {
    /// Seen before: emit a reference carrying this id
    Reference(u32),
    /// New entry assigned this id: emit a definition
    Definition(u32),
    /// Not eligible or dictionary full: emit the raw string
    Literal,
}

/// Encode-side dictionary
pub struct Dictionary {
    index: HashMap<String, u32>,
    max_entries: usize,
    min_len: usize,
}

impl Dictionary {
    pub fn new(max_entries: usize, min_len: usize) -> Self {
        Self {
            index: HashMap::new(),
            max_entries,
            min_len,
        }
    }

    /// Intern a value string; strings shorter than `min_len` bytes stay literal
    pub fn intern_value(&mut self, s: &str) -> Interned {
        let eligible = s.len() >= self.min_len;
        self.intern(s, eligible)
    }

    /// Intern an object key; keys of any length are eligible
    pub fn intern_key(&mut self, s: &str) -> Interned {
        self.intern(s, true)
    }

    fn intern(&mut self, s: &str, eligible: bool) -> Interned {
        if let Some(&id) = self.index.get(s) {
            return Interned::Reference(id);
        }

        if !eligible || self.is_full() {
            return Interned::Literal;
        }

        let id = self.index.len() as u32;
        self.index.insert(s.to_string(), id);
        Interned::Definition(id)
    }

    pub fn is_full(&self) -> bool {
        self.index.len() >= self.max_entries
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Decode-side dictionary: id -> string
#[derive(Debug, Default, Clone)]
pub struct DictionaryTable {
    entries: Vec<String>,
}

impl DictionaryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a definition under the next sequential id
    pub fn define(&mut self, s: String) -> u32 {
        let id = self.entries.len() as u32;
        self.entries.push(s);
        id
    }

    pub fn get(&self, id: u64) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.entries.get(i))
            .map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
