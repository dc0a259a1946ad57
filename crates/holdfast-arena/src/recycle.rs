//! Exact-size recycling of released payload blocks.
//!
//! Reclaimed blocks are never handed back to the system allocator. They
//! are pushed onto a [`RecyclePool`] — a LIFO free list per block length —
//! and consulted before any new carving from the segment pool. Reuse is
//! exact-size: a request of length `n` is only satisfied by a range whose
//! length is exactly `n`, which rules out fragmentation inside reused
//! ranges by construction.

use indexmap::IndexMap;
use smallvec::SmallVec;

/// Location of one payload block within a [`SegmentPool`](crate::SegmentPool).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRange {
    /// Index of the segment holding this block.
    pub segment: u16,
    /// Offset within the segment, in elements.
    pub offset: u32,
    /// Length of the block, in elements.
    pub len: u32,
}

impl BlockRange {
    /// Create a new block range.
    pub fn new(segment: u16, offset: u32, len: u32) -> Self {
        Self {
            segment,
            offset,
            len,
        }
    }
}

/// Free lists of released blocks, bucketed by exact length.
///
/// Each bucket is a LIFO stack, so the most recently released block of a
/// given size is reused first — it is the one most likely still warm in
/// cache.
#[derive(Default)]
pub struct RecyclePool {
    buckets: IndexMap<u32, SmallVec<[BlockRange; 4]>>,
    /// Total ranges currently held, across all buckets.
    held: usize,
}

impl RecyclePool {
    /// Create an empty recycle pool.
    pub fn new() -> Self {
        Self {
            buckets: IndexMap::new(),
            held: 0,
        }
    }

    /// Push a released block onto its length bucket.
    pub fn push(&mut self, range: BlockRange) {
        self.buckets.entry(range.len).or_default().push(range);
        self.held += 1;
    }

    /// Pop a block of exactly `len` elements, if one is available.
    pub fn pop(&mut self, len: u32) -> Option<BlockRange> {
        let bucket = self.buckets.get_mut(&len)?;
        let range = bucket.pop()?;
        self.held -= 1;
        Some(range)
    }

    /// Total ranges currently held, across all buckets.
    pub fn held(&self) -> usize {
        self.held
    }

    /// Number of distinct block lengths with at least one held range.
    pub fn bucket_count(&self) -> usize {
        self.buckets.values().filter(|b| !b.is_empty()).count()
    }

    /// Drop all held ranges.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.held = 0;
    }
}
