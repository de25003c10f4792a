//! # Entity Records
//!
//! Entities are lightweight records of component handles:
//! - An index into the entity pool
//! - A generation counter for safe reuse
//! - Non-owning links to their main instance and attachments

use crate::memory::SlotHandle;

/// Opaque identifier of a drawable entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Index into the entity pool
/// - Upper 32 bits: Generation counter for detecting stale references
///
/// It crosses the boundary to scripting layers as a plain `u64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EntityHandle(u64);

impl EntityHandle {
    /// Null/invalid entity handle.
    pub const NULL: Self = Self(u64::MAX);

    /// Creates an entity handle from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the handle.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Checks if this handle is the null sentinel.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }

    /// Packs the handle into an opaque integer.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Restores a handle from [`to_bits`](Self::to_bits).
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    #[inline]
    pub(crate) const fn slot(self) -> SlotHandle {
        SlotHandle::new(self.index(), self.generation())
    }
}

impl Default for EntityHandle {
    fn default() -> Self {
        Self::NULL
    }
}

impl From<SlotHandle> for EntityHandle {
    fn from(handle: SlotHandle) -> Self {
        Self::new(handle.index(), handle.generation())
    }
}

/// One drawable: a main instance or an attachment of one.
///
/// Every field is a non-owning handle into a drawer pool. The drawer
/// releases them explicitly when the entity is freed.
#[derive(Clone, Debug, Default)]
pub struct EntityRecord {
    /// Shared position slot (owned by the main instance).
    pub pos_idx: Option<SlotHandle>,
    /// Animation state, always present for a live entity.
    pub animation: Option<SlotHandle>,
    /// Facing state machine (owned by the main instance).
    pub dir_handler: Option<SlotHandle>,
    /// Directed names derived from the current animation.
    pub dir_animation: Option<SlotHandle>,
    /// Idle/moving animation pair.
    pub dyn_animation: Option<SlotHandle>,
    /// Alternate picking surface.
    pub alt_info: Option<SlotHandle>,
    /// Attachments, freed with this entity.
    pub sub_instances: Vec<EntityHandle>,
    /// Back-reference used only to unlink from the main instance.
    pub main_instance: Option<EntityHandle>,
}

impl EntityRecord {
    /// Whether this entity is an attachment of another one.
    #[inline]
    #[must_use]
    pub fn is_sub_instance(&self) -> bool {
        self.main_instance.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_handle_roundtrip() {
        let id = EntityHandle::new(12345, 67890);
        assert_eq!(id.index(), 12345);
        assert_eq!(id.generation(), 67890);
        assert_eq!(EntityHandle::from_bits(id.to_bits()), id);
    }

    #[test]
    fn test_null_handle() {
        assert!(EntityHandle::default().is_null());
        assert!(!EntityHandle::new(0, 0).is_null());
    }

    #[test]
    fn test_slot_conversion() {
        let slot = SlotHandle::new(7, 3);
        assert_eq!(EntityHandle::from(slot).slot(), slot);
    }
}
