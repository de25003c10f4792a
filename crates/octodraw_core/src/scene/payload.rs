//! # Entity Payloads
//!
//! Links drawn entities to game-side data without the drawer knowing the
//! data type. The payload is bound once, before any entity exists.

use std::any::Any;

/// Side-table of per-entity data, kept in step with the entity pool.
pub trait EntityPayload: Send + 'static {
    /// Called when an entity is created at `index`.
    fn add_payload(&mut self, index: u32);

    /// Called when the entity at `index` is freed.
    fn free_payload(&mut self, index: u32);

    /// Downcasting support for [`EntityDrawer::with_payload`](crate::EntityDrawer::with_payload).
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A payload that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpPayload;

impl EntityPayload for NoOpPayload {
    fn add_payload(&mut self, _index: u32) {}

    fn free_payload(&mut self, _index: u32) {}

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A typed side-table holding one `T` per live entity index.
#[derive(Debug, Clone)]
pub struct TablePayload<T> {
    entries: Vec<Option<T>>,
}

impl<T> Default for TablePayload<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> TablePayload<T> {
    /// Payload of the entity at `index`, if alive.
    #[must_use]
    pub fn get_payload(&self, index: u32) -> Option<&T> {
        self.entries.get(index as usize)?.as_ref()
    }

    /// Mutable payload of the entity at `index`, if alive.
    pub fn get_payload_mut(&mut self, index: u32) -> Option<&mut T> {
        self.entries.get_mut(index as usize)?.as_mut()
    }

    /// Number of live payloads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    /// Returns `true` if no payload is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }
}

impl<T: Default + Send + 'static> EntityPayload for TablePayload<T> {
    fn add_payload(&mut self, index: u32) {
        let index = index as usize;
        if index >= self.entries.len() {
            self.entries.resize_with(index + 1, || None);
        }
        self.entries[index] = Some(T::default());
    }

    fn free_payload(&mut self, index: u32) {
        if let Some(entry) = self.entries.get_mut(index as usize) {
            *entry = None;
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
