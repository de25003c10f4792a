//! # Slot Pool
//!
//! Generational arena for component records that are created and released
//! every frame.

use std::collections::VecDeque;

use crate::error::{DrawerError, DrawerResult};

/// Handle to a slot in a [`SlotPool`].
///
/// The handle is only valid while the pool's generation at `index` matches
/// and the slot is alive. Freeing a slot bumps its generation, so handles
/// obtained before the free are rejected even after the index is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotHandle {
    index: u32,
    generation: u32,
}

impl SlotHandle {
    /// Creates a handle from raw parts.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Index into the pool storage.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation the slot had when this handle was issued.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Whether this is the first occupant ever stored at its index.
    #[inline]
    #[must_use]
    pub const fn is_first_use(self) -> bool {
        self.generation == 0
    }

    pub(crate) const fn invalid_error(self) -> DrawerError {
        DrawerError::InvalidHandle {
            index: self.index,
            generation: self.generation,
        }
    }
}

/// What a [`SlotPool::for_each`] visitor wants done with the current slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visit {
    /// Leave the slot alive.
    Keep,
    /// Free the slot once the visitor returns.
    Free,
}

struct Slot<T> {
    value: T,
    generation: u32,
    alive: bool,
}

/// A growable generational pool.
///
/// Freed indices go to a FIFO free list and are reused before the storage
/// grows. Values of freed slots are kept in place so that
/// [`recycle_instance`](Self::recycle_instance) callers can reuse resources
/// cached inside them.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. Owners wrap it in a mutex.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool: SlotPool<u32> = SlotPool::with_capacity(1024);
///
/// let handle = pool.new_instance(42);
/// pool.free_instance(handle);
///
/// // Stale even though the index is handed out again
/// let other = pool.new_instance(7);
/// assert!(!pool.is_valid(handle));
/// ```
pub struct SlotPool<T> {
    /// Slot storage, alive or not.
    slots: Vec<Slot<T>>,
    /// Indices of free slots, oldest first.
    free_list: VecDeque<u32>,
    /// Number of alive slots.
    alive_count: usize,
}

impl<T> Default for SlotPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SlotPool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty pool with room for `capacity` slots before growing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: VecDeque::with_capacity(capacity),
            alive_count: 0,
        }
    }

    /// Returns the number of alive slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.alive_count
    }

    /// Returns `true` when no slot is alive.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.alive_count == 0
    }

    /// Returns the number of slots ever created (alive or free).
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Stores `value` in a free slot, growing the storage if needed.
    ///
    /// The generation of a reused slot is the one set when it was freed.
    pub fn new_instance(&mut self, value: T) -> SlotHandle {
        if let Some(index) = self.free_list.pop_front() {
            let slot = &mut self.slots[index as usize];
            slot.value = value;
            slot.alive = true;
            self.alive_count += 1;
            return SlotHandle::new(index, slot.generation);
        }

        let index = self.next_index();
        self.slots.push(Slot {
            value,
            generation: 0,
            alive: true,
        });
        self.alive_count += 1;
        SlotHandle::new(index, 0)
    }

    /// Marks a slot alive without replacing the previous occupant's value.
    ///
    /// The caller overwrites the fields it needs through
    /// [`get_mut`](Self::get_mut). A returned generation of `0` means the
    /// index has never been used, so the value is a fresh `T::default()`.
    pub fn recycle_instance(&mut self) -> SlotHandle
    where
        T: Default,
    {
        if let Some(index) = self.free_list.pop_front() {
            let slot = &mut self.slots[index as usize];
            slot.alive = true;
            self.alive_count += 1;
            return SlotHandle::new(index, slot.generation);
        }
        self.new_instance(T::default())
    }

    /// Frees a slot.
    ///
    /// Freeing a stale or already-freed handle is a silent no-op, so
    /// cascading teardown may visit the same handle twice.
    ///
    /// # Returns
    ///
    /// `true` if the slot was alive and has been freed.
    pub fn free_instance(&mut self, handle: SlotHandle) -> bool {
        if !self.is_valid(handle) {
            return false;
        }
        let slot = &mut self.slots[handle.index as usize];
        slot.alive = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push_back(handle.index);
        self.alive_count -= 1;
        true
    }

    /// Checks whether `handle` designates an alive slot of this generation.
    #[inline]
    #[must_use]
    pub fn is_valid(&self, handle: SlotHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .is_some_and(|slot| slot.alive && slot.generation == handle.generation)
    }

    /// Gets a reference to an alive value.
    ///
    /// # Errors
    ///
    /// [`DrawerError::InvalidHandle`] if the handle is stale or out of range.
    #[inline]
    pub fn get(&self, handle: SlotHandle) -> DrawerResult<&T> {
        match self.slots.get(handle.index as usize) {
            Some(slot) if slot.alive && slot.generation == handle.generation => Ok(&slot.value),
            _ => Err(handle.invalid_error()),
        }
    }

    /// Gets a mutable reference to an alive value.
    ///
    /// # Errors
    ///
    /// [`DrawerError::InvalidHandle`] if the handle is stale or out of range.
    #[inline]
    pub fn get_mut(&mut self, handle: SlotHandle) -> DrawerResult<&mut T> {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.alive && slot.generation == handle.generation => {
                Ok(&mut slot.value)
            }
            _ => Err(handle.invalid_error()),
        }
    }

    /// Visits every alive slot in index order.
    ///
    /// Returning [`Visit::Free`] frees the slot just visited.
    pub fn for_each<F>(&mut self, mut visitor: F)
    where
        F: FnMut(SlotHandle, &mut T) -> Visit,
    {
        for index in 0..self.slots.len() {
            let slot = &mut self.slots[index];
            if !slot.alive {
                continue;
            }
            #[allow(clippy::cast_possible_truncation)]
            let handle = SlotHandle::new(index as u32, slot.generation);
            if visitor(handle, &mut slot.value) == Visit::Free {
                self.free_instance(handle);
            }
        }
    }

    /// Visits every alive slot in index order without mutation.
    pub fn for_each_const<F>(&self, mut visitor: F)
    where
        F: FnMut(SlotHandle, &T),
    {
        for (handle, value) in self.iter() {
            visitor(handle, value);
        }
    }

    /// Iterates over alive slots.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = (SlotHandle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.alive
                .then(|| (SlotHandle::new(index as u32, slot.generation), &slot.value))
        })
    }

    /// Iterates over the handles of alive slots.
    pub fn handles(&self) -> impl Iterator<Item = SlotHandle> + '_ {
        self.iter().map(|(handle, _)| handle)
    }

    /// Iterates mutably over every stored value, free slots included.
    ///
    /// Used at teardown to release external resources cached in values.
    pub fn storage_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().map(|slot| &mut slot.value)
    }

    fn next_index(&self) -> u32 {
        u32::try_from(self.slots.len()).unwrap_or_else(|_| {
            panic!("slot pool exhausted: more than {} slots", u32::MAX)
        })
    }
}
