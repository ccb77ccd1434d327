//! Arena storage for the reference-typed collections.
//!
//! Tables and arrays live here; a [`crate::Value`] of either kind carries
//! only the [`HeapId`], so copying a value copies the shared handle and
//! writes through any copy are visible through every other. There is no
//! collector: entries live until the owning runner is dropped, which means
//! cyclic tables leak for the duration of the run. That is acceptable for
//! short-lived embedded scripts; revisit if a long-running embedding ever
//! needs reclamation.

use indexmap::IndexMap;

use crate::value::Value;

/// Unique identifier for a collection stored in the heap arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapId(usize);

impl HeapId {
    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A heap-allocated collection.
///
/// Tables keep insertion order so rendering and host reads are
/// deterministic; the language itself promises nothing about member order.
#[derive(Debug)]
pub enum HeapData {
    Table(IndexMap<String, Value>),
    Array(Vec<Value>),
}

/// The collection arena. Allocation only; see the module docs for the
/// reclamation story.
#[derive(Debug, Default)]
pub struct Heap {
    entries: Vec<HeapData>,
}

impl Heap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_table(&mut self) -> HeapId {
        let id = HeapId(self.entries.len());
        self.entries.push(HeapData::Table(IndexMap::new()));
        id
    }

    pub fn alloc_array(&mut self) -> HeapId {
        let id = HeapId(self.entries.len());
        self.entries.push(HeapData::Array(Vec::new()));
        id
    }

    #[must_use]
    pub fn get(&self, id: HeapId) -> Option<&HeapData> {
        self.entries.get(id.index())
    }

    pub fn get_mut(&mut self, id: HeapId) -> Option<&mut HeapData> {
        self.entries.get_mut(id.index())
    }

    /// The table behind `id`, if the id names a table.
    #[must_use]
    pub fn table(&self, id: HeapId) -> Option<&IndexMap<String, Value>> {
        match self.entries.get(id.index()) {
            Some(HeapData::Table(table)) => Some(table),
            _ => None,
        }
    }

    pub fn table_mut(&mut self, id: HeapId) -> Option<&mut IndexMap<String, Value>> {
        match self.entries.get_mut(id.index()) {
            Some(HeapData::Table(table)) => Some(table),
            _ => None,
        }
    }

    /// The array behind `id`, if the id names an array.
    #[must_use]
    pub fn array(&self, id: HeapId) -> Option<&Vec<Value>> {
        match self.entries.get(id.index()) {
            Some(HeapData::Array(elements)) => Some(elements),
            _ => None,
        }
    }

    pub fn array_mut(&mut self, id: HeapId) -> Option<&mut Vec<Value>> {
        match self.entries.get_mut(id.index()) {
            Some(HeapData::Array(elements)) => Some(elements),
            _ => None,
        }
    }

    /// Number of live entries; handy for leak-shaped assertions in tests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
