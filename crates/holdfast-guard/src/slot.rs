//! Per-guard slot metadata.

use holdfast_arena::BlockRange;
use holdfast_core::Destructor;

/// Where a guard's payload lives.
pub(crate) enum Storage<T> {
    /// A block carved from (or recycled into) the registry's segment pool.
    Pooled(BlockRange),
    /// A caller-supplied buffer whose lifecycle the registry tracks but
    /// whose origin it does not own. Bypasses the recycle pool.
    Adopted(Vec<T>),
}

impl<T> Storage<T> {
    /// Payload length in elements.
    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Pooled(range) => range.len as usize,
            Self::Adopted(buf) => buf.len(),
        }
    }
}

/// Mutable metadata for one guard slot.
///
/// The slot's refcount and generation live outside the registry lock (in
/// the registry's preallocated atomic planes); everything here is only
/// touched under exclusive access.
pub(crate) struct SlotMeta<T> {
    pub(crate) storage: Option<Storage<T>>,
    pub(crate) destructor: Option<Destructor<T>>,
    /// Index of this guard's tracker node. Registry-internal, never
    /// exposed through the public API.
    pub(crate) tracker: u32,
    /// Set from creation until reclamation.
    pub(crate) live: bool,
}

impl<T> SlotMeta<T> {
    /// An unclaimed slot.
    pub(crate) fn vacant() -> Self {
        Self {
            storage: None,
            destructor: None,
            tracker: 0,
            live: false,
        }
    }
}
