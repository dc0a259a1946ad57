//! Contiguous payload segments and bounded segment pools.
//!
//! A [`Segment`] is a pre-allocated contiguous `Vec<T>` with bump
//! allocation. A [`SegmentPool`] is a bounded collection of segments that
//! overflows into new segments until `max_segments` is reached.

use crate::error::PoolError;

/// A single contiguous storage segment with bump allocation.
///
/// Segments are the fundamental storage unit behind guard payloads. Each
/// segment is allocated to full capacity at creation and a cursor advances
/// on each carve. Segments are never freed at runtime — only reset or
/// dropped when the owning registry is finalized.
pub struct Segment<T> {
    /// Backing storage. Allocated to full capacity at creation.
    data: Vec<T>,
    /// Bump pointer: next free position (in elements).
    cursor: usize,
}

impl<T: Clone + Default> Segment<T> {
    /// Create a new segment with the given capacity (in elements).
    ///
    /// The segment is default-initialised.
    pub fn new(capacity: u32) -> Self {
        Self {
            data: vec![T::default(); capacity as usize],
            cursor: 0,
        }
    }

    /// Bump-carve `len` elements from this segment.
    ///
    /// Returns `Some(offset)` where `offset` is the starting position
    /// within this segment, or `None` if there is insufficient remaining
    /// capacity. The carved region is reset to `T::default()`.
    pub fn carve(&mut self, len: u32) -> Option<u32> {
        let len = len as usize;
        let new_cursor = self.cursor.checked_add(len)?;
        if new_cursor > self.data.len() {
            return None;
        }
        let offset = self.cursor as u32;
        self.data[self.cursor..new_cursor].fill(T::default());
        self.cursor = new_cursor;
        Some(offset)
    }
}

impl<T> Segment<T> {
    /// Get a shared slice at the given offset and length.
    ///
    /// # Panics
    ///
    /// Panics if `offset + len` exceeds the segment's allocated region.
    pub fn slice(&self, offset: u32, len: u32) -> &[T] {
        let start = offset as usize;
        let end = start + len as usize;
        &self.data[start..end]
    }

    /// Get a mutable slice at the given offset and length.
    ///
    /// # Panics
    ///
    /// Panics if `offset + len` exceeds the segment's allocated region.
    pub fn slice_mut(&mut self, offset: u32, len: u32) -> &mut [T] {
        let start = offset as usize;
        let end = start + len as usize;
        &mut self.data[start..end]
    }

    /// Reset the bump pointer to zero without deallocating.
    ///
    /// All previous carves become invalid. The backing memory is NOT
    /// cleared — the next `carve()` resets its region.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Number of elements currently carved.
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Total capacity in elements.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Remaining free capacity in elements.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }
}

/// A bounded list of [`Segment`]s with overflow-based bump allocation.
///
/// When the current segment is full, a new segment is appended (up to
/// `max_segments`). Blocks never span segment boundaries — a carve that
/// does not fit the current segment is placed entirely in the next one.
pub struct SegmentPool<T> {
    segments: Vec<Segment<T>>,
    segment_len: u32,
    max_segments: u16,
    /// Index of the segment currently being filled.
    current: usize,
}

impl<T: Clone + Default> SegmentPool<T> {
    /// Create a new pool with one pre-allocated segment.
    pub fn new(segment_len: u32, max_segments: u16) -> Self {
        let mut segments = Vec::with_capacity(max_segments as usize);
        segments.push(Segment::new(segment_len));
        Self {
            segments,
            segment_len,
            max_segments,
            current: 0,
        }
    }

    /// Carve `len` elements, growing into a new segment if needed.
    ///
    /// Returns `Ok((segment_index, offset))` on success, or
    /// `Err(PoolError::CapacityExceeded)` if `max_segments` would be
    /// exceeded or `len` can never fit in a single segment.
    pub fn carve(&mut self, len: u32) -> Result<(u16, u32), PoolError> {
        // Reject blocks that can never fit in a single segment.
        if len > self.segment_len {
            return Err(PoolError::CapacityExceeded {
                requested: len as usize,
                capacity: self.segment_len as usize,
            });
        }

        // Try the current segment first.
        if let Some(offset) = self.segments[self.current].carve(len) {
            return Ok((self.current as u16, offset));
        }

        // Current segment full — advance to the next existing segment or
        // create one.
        let next = self.current + 1;
        if next < self.segments.len() {
            if let Some(offset) = self.segments[next].carve(len) {
                self.current = next;
                return Ok((next as u16, offset));
            }
        }

        if self.segments.len() >= self.max_segments as usize {
            return Err(PoolError::CapacityExceeded {
                requested: len as usize,
                capacity: self.total_capacity(),
            });
        }

        let mut seg = Segment::new(self.segment_len);
        // len <= segment_len is guaranteed by the check above, so a fresh
        // segment always fits the carve.
        let offset = match seg.carve(len) {
            Some(offset) => offset,
            None => {
                return Err(PoolError::CapacityExceeded {
                    requested: len as usize,
                    capacity: self.total_capacity(),
                })
            }
        };
        self.segments.push(seg);
        self.current = self.segments.len() - 1;
        Ok((self.current as u16, offset))
    }

    /// Copy `len` elements from one block to another.
    ///
    /// Used by resize to move a payload to a larger block. Source and
    /// destination may live in the same segment but must not overlap.
    ///
    /// # Panics
    ///
    /// Panics if either range exceeds its segment's allocated region,
    /// or if the ranges overlap within one segment.
    pub fn copy_within(
        &mut self,
        src: (u16, u32),
        dst: (u16, u32),
        len: u32,
    ) -> &mut [T] {
        let (src_seg, src_off) = src;
        let (dst_seg, dst_off) = dst;
        if src_seg == dst_seg {
            let seg = &mut self.segments[src_seg as usize];
            let (a, b) = (src_off as usize, dst_off as usize);
            let n = len as usize;
            assert!(
                a + n <= b || b + n <= a,
                "copy_within ranges must not overlap"
            );
            // Split the segment so both ranges can be borrowed at once.
            if a < b {
                let (lo, hi) = seg.data.split_at_mut(b);
                hi[..n].clone_from_slice(&lo[a..a + n]);
                &mut seg.data[b..b + n]
            } else {
                let (lo, hi) = seg.data.split_at_mut(a);
                let src_slice = &hi[..n];
                lo[b..b + n].clone_from_slice(src_slice);
                &mut seg.data[b..b + n]
            }
        } else {
            let (src_slice, dst_idx) = {
                let src_vec = self.segments[src_seg as usize]
                    .slice(src_off, len)
                    .to_vec();
                (src_vec, dst_seg as usize)
            };
            let dst = self.segments[dst_idx].slice_mut(dst_off, len);
            dst.clone_from_slice(&src_slice);
            dst
        }
    }
}

impl<T> SegmentPool<T> {
    /// Get a shared slice from the given segment.
    pub fn slice(&self, segment_index: u16, offset: u32, len: u32) -> &[T] {
        self.segments[segment_index as usize].slice(offset, len)
    }

    /// Get a mutable slice from the given segment.
    pub fn slice_mut(&mut self, segment_index: u16, offset: u32, len: u32) -> &mut [T] {
        self.segments[segment_index as usize].slice_mut(offset, len)
    }

    /// Reset all segments' bump pointers without deallocating.
    pub fn reset(&mut self) {
        for seg in &mut self.segments {
            seg.reset();
        }
        self.current = 0;
    }

    /// Total number of segments currently allocated.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Total carved elements across all segments.
    pub fn total_used(&self) -> usize {
        self.segments.iter().map(|s| s.used()).sum()
    }

    /// Total capacity across currently allocated segments, in elements.
    pub fn total_capacity(&self) -> usize {
        self.segments.len() * self.segment_len as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_carve_returns_defaulted_region() {
        let mut seg: Segment<u8> = Segment::new(1024);
        let offset = seg.carve(10).unwrap();
        assert_eq!(offset, 0);
        assert!(seg.slice(offset, 10).iter().all(|&v| v == 0));
    }

    #[test]
    fn segment_sequential_carves() {
        let mut seg: Segment<u8> = Segment::new(1024);
        assert_eq!(seg.carve(100), Some(0));
        assert_eq!(seg.carve(200), Some(100));
        assert_eq!(seg.used(), 300);
    }

    #[test]
    fn segment_carve_fails_when_full() {
        let mut seg: Segment<u8> = Segment::new(100);
        assert!(seg.carve(100).is_some());
        assert!(seg.carve(1).is_none());
    }

    #[test]
    fn segment_reset_allows_recarve() {
        let mut seg: Segment<u8> = Segment::new(100);
        seg.carve(100).unwrap();
        seg.reset();
        assert_eq!(seg.used(), 0);
        assert!(seg.carve(50).is_some());
    }

    #[test]
    fn segment_reuse_after_reset_is_cleared() {
        let mut seg: Segment<u8> = Segment::new(100);
        let off = seg.carve(10).unwrap();
        seg.slice_mut(off, 10).fill(0xAB);
        seg.reset();
        let off = seg.carve(10).unwrap();
        assert!(seg.slice(off, 10).iter().all(|&v| v == 0));
    }

    #[test]
    fn pool_carve_within_first_segment() {
        let mut pool: SegmentPool<u8> = SegmentPool::new(1024, 4);
        assert_eq!(pool.carve(10).unwrap(), (0, 0));
    }

    #[test]
    fn pool_grows_on_overflow() {
        let mut pool: SegmentPool<u8> = SegmentPool::new(100, 4);
        pool.carve(100).unwrap();
        let (seg_idx, _) = pool.carve(50).unwrap();
        assert_eq!(seg_idx, 1);
        assert_eq!(pool.segment_count(), 2);
    }

    #[test]
    fn pool_capacity_exceeded() {
        let mut pool: SegmentPool<u8> = SegmentPool::new(100, 2);
        pool.carve(100).unwrap();
        pool.carve(100).unwrap();
        let result = pool.carve(1);
        assert!(matches!(result, Err(PoolError::CapacityExceeded { .. })));
    }

    #[test]
    fn oversized_carve_returns_error_not_panic() {
        let mut pool: SegmentPool<u8> = SegmentPool::new(100, 4);
        let result = pool.carve(101);
        assert!(matches!(result, Err(PoolError::CapacityExceeded { .. })));
    }

    #[test]
    fn exactly_segment_len_carve_succeeds() {
        let mut pool: SegmentPool<u8> = SegmentPool::new(100, 4);
        assert!(pool.carve(100).is_ok());
    }

    #[test]
    fn pool_slice_round_trip() {
        let mut pool: SegmentPool<u32> = SegmentPool::new(1024, 4);
        let (seg, off) = pool.carve(5).unwrap();
        pool.slice_mut(seg, off, 5)[0] = 42;
        assert_eq!(pool.slice(seg, off, 5)[0], 42);
    }

    #[test]
    fn pool_reset_restarts_from_first_segment() {
        let mut pool: SegmentPool<u8> = SegmentPool::new(100, 4);
        pool.carve(80).unwrap();
        pool.carve(80).unwrap();
        assert_eq!(pool.segment_count(), 2);
        pool.reset();
        assert_eq!(pool.total_used(), 0);
        assert_eq!(pool.carve(10).unwrap(), (0, 0));
    }

    #[test]
    fn copy_within_same_segment_forward() {
        let mut pool: SegmentPool<u8> = SegmentPool::new(1024, 4);
        let (seg, src) = pool.carve(4).unwrap();
        let (_, dst) = pool.carve(8).unwrap();
        pool.slice_mut(seg, src, 4).copy_from_slice(&[1, 2, 3, 4]);
        pool.copy_within((seg, src), (seg, dst), 4);
        assert_eq!(pool.slice(seg, dst, 4), &[1, 2, 3, 4]);
    }

    #[test]
    fn copy_within_across_segments() {
        let mut pool: SegmentPool<u8> = SegmentPool::new(8, 4);
        let (seg_a, src) = pool.carve(6).unwrap();
        let (seg_b, dst) = pool.carve(6).unwrap();
        assert_ne!(seg_a, seg_b);
        pool.slice_mut(seg_a, src, 6)
            .copy_from_slice(&[9, 8, 7, 6, 5, 4]);
        pool.copy_within((seg_a, src), (seg_b, dst), 6);
        assert_eq!(pool.slice(seg_b, dst, 6), &[9, 8, 7, 6, 5, 4]);
    }
}
