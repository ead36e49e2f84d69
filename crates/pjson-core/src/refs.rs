//! Structural (identity) references for arrays and objects
//!
//! Every container start token allocates the next id on both sides, before
//! any child is read or written. The encoder matches containers by
//! allocation address, not by content.

use crate::types::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Result of visiting a container while encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Already written under this id
    Seen(u32),
    /// First occurrence, registered under this id
    New(u32),
}

/// Encode-side table: container address -> id
///
/// Addresses stay valid because the whole input value is borrowed for the
/// duration of one encode call.
#[derive(Debug, Default)]
pub struct RefTracker {
    ids: HashMap<usize, u32>,
    next_id: u32,
    hits: u64,
}

impl RefTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a container, registering it if unseen
    pub fn visit<T>(&mut self, container: &Arc<T>) -> Visit {
        let addr = Arc::as_ptr(container) as *const () as usize;
        if let Some(&id) = self.ids.get(&addr) {
            self.hits += 1;
            return Visit::Seen(id);
        }
        let id = self.allocate();
        self.ids.insert(addr, id);
        Visit::New(id)
    }

    /// Consume an id without remembering the container
    pub fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Number of ids handed out
    pub fn len(&self) -> usize {
        self.next_id as usize
    }

    pub fn is_empty(&self) -> bool {
        self.next_id == 0
    }

    /// Number of back-references emitted
    pub fn hits(&self) -> u64 {
        self.hits
    }
}

/// Why a structural reference could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    Unknown,
    /// The id belongs to a container that is still open (a cycle)
    Open,
}

/// Decode-side table: id -> finished container
///
/// A slot is reserved when a container starts and filled when it closes.
#[derive(Debug, Default, Clone)]
pub struct RefTable {
    slots: Vec<Option<Value>>,
}

impl RefTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self) -> u32 {
        let id = self.slots.len() as u32;
        self.slots.push(None);
        id
    }

    pub fn fill(&mut self, id: u32, value: Value) {
        if let Some(slot) = self.slots.get_mut(id as usize) {
            *slot = Some(value);
        }
    }

    /// Resolve an id to the shared container
    pub fn resolve(&self, id: u64) -> Result<Value, Unresolved> {
        let slot = usize::try_from(id)
            .ok()
            .and_then(|i| self.slots.get(i))
            .ok_or(Unresolved::Unknown)?;
        slot.clone().ok_or(Unresolved::Open)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_matches_identity_not_content() {
        let mut tracker = RefTracker::new();
        let a = Arc::new(vec![Value::Integer(1)]);
        let b = Arc::new(vec![Value::Integer(1)]);

        assert_eq!(tracker.visit(&a), Visit::New(0));
        assert_eq!(tracker.visit(&b), Visit::New(1));
        assert_eq!(tracker.visit(&a.clone()), Visit::Seen(0));
        assert_eq!(tracker.hits(), 1);
    }

    #[test]
    fn test_allocate_keeps_ids_in_step() {
        let mut tracker = RefTracker::new();
        let a = Arc::new(Vec::<(String, Value)>::new());

        assert_eq!(tracker.allocate(), 0);
        assert_eq!(tracker.visit(&a), Visit::New(1));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_table_resolves_only_closed_slots() {
        let mut table = RefTable::new();
        let outer = table.reserve();
        let inner = table.reserve();
        let value = Value::array(vec![Value::Null]);
        table.fill(inner, value.clone());

        assert!(table.resolve(inner as u64).unwrap().ptr_eq(&value));
        assert_eq!(table.resolve(outer as u64), Err(Unresolved::Open));
        assert_eq!(table.resolve(7), Err(Unresolved::Unknown));
    }
}
