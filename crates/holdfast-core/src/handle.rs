//! Generational guard handles.
//!
//! A [`GuardHandle`] names one guard slot within a registry. It is
//! generation-scoped: the `generation` field allows O(1) staleness checks
//! without a lookup table, so operating on a handle after its guard was
//! reclaimed is a detectable no-op rather than a use-after-free.

use std::fmt;

/// Identifies one guard within a [`Registry`](https://docs.rs/holdfast).
///
/// Handles are plain `Copy` data: cloning a handle does **not** touch the
/// reference count. Call `retain` to take an additional reference.
///
/// A handle is valid only for the registry that issued it and only while
/// the slot generation it carries is current. Every operation rejects
/// stale handles safely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GuardHandle {
    /// Index of the guard slot within the registry.
    pub(crate) slot: u32,
    /// Slot generation when this handle was issued.
    pub(crate) generation: u32,
}

impl GuardHandle {
    /// Create a handle for the given slot and generation.
    pub fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    /// Index of the guard slot within the registry.
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Slot generation when this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for GuardHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GuardHandle(slot={}, gen={})", self.slot, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_round_trip() {
        let h = GuardHandle::new(7, 42);
        assert_eq!(h.slot(), 7);
        assert_eq!(h.generation(), 42);
    }

    #[test]
    fn handles_compare_by_slot_and_generation() {
        assert_eq!(GuardHandle::new(1, 0), GuardHandle::new(1, 0));
        assert_ne!(GuardHandle::new(1, 0), GuardHandle::new(1, 1));
        assert_ne!(GuardHandle::new(1, 0), GuardHandle::new(2, 0));
    }

    #[test]
    fn display_names_slot_and_generation() {
        let h = GuardHandle::new(3, 9);
        assert_eq!(h.to_string(), "GuardHandle(slot=3, gen=9)");
    }
}
