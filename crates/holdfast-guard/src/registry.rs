//! The guard registry: allocation, retain/release, resize, teardown.
//!
//! A [`Registry`] is an explicit context object — there are no process-wide
//! statics, so independent registries coexist and tests get full isolation.
//! It owns two planes of state:
//!
//! - a **lock-free plane**, preallocated at construction and never resized:
//!   one [`RefCount`] cell and one atomic generation per guard slot. This is
//!   what lets [`retain`](Registry::retain) and a non-final
//!   [`release_shared`](Registry::release_shared) run without ever touching
//!   the registry lock;
//! - a **locked plane** (`Mutex`): slot metadata, the tracker list, the
//!   payload segment pool and the recycle free lists. Only allocation and
//!   reclamation touch it.
//!
//! Whether registry mutation needs the mutex is decided per call by which
//! method is used: the `&mut self` methods (`allocate`, `release`, …) reach
//! the locked plane through `Mutex::get_mut`, which takes no lock because
//! exclusivity is proven by the borrow checker; their `_shared` counterparts
//! take `&self` and lock. A guard's payload is *not* synchronised by the
//! registry — only the ownership bookkeeping is. Callers coordinating
//! concurrent payload access do so themselves (the closure accessors
//! serialise on the registry lock, which is incidental, not a guarantee).

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use smallvec::SmallVec;

use holdfast_arena::{BlockRange, PoolConfig, RecyclePool, SegmentPool};
use holdfast_core::{CountMode, Destructor, DropReason, GuardHandle, RefCount};

use crate::error::GuardError;
use crate::metrics::RegistryMetrics;
use crate::slot::{SlotMeta, Storage};
use crate::tracker::TrackerList;

/// State behind the registry lock.
struct State<T> {
    /// Pools are created lazily on first allocation and dropped wholesale
    /// by `finalize_all`, returning the registry to its uninitialised
    /// state.
    pools: Option<Pools<T>>,
    metrics: RegistryMetrics,
}

/// Everything that exists only while the registry has been used.
struct Pools<T> {
    /// Slot metadata. Grows up to `max_guards`, never shrinks.
    slots: Vec<SlotMeta<T>>,
    /// Vacated slot indices, reused LIFO.
    free_slots: Vec<u32>,
    /// Payload storage.
    payload: SegmentPool<T>,
    /// Released payload blocks awaiting reuse.
    recycle: RecyclePool,
    /// One linked node per live guard, walked at teardown.
    trackers: TrackerList,
}

impl<T: Clone + Default> Pools<T> {
    fn new(config: &PoolConfig) -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
            payload: SegmentPool::new(config.segment_len, config.max_segments),
            recycle: RecyclePool::new(),
            trackers: TrackerList::new(config.max_guards),
        }
    }
}

/// Where a new guard's payload comes from.
enum PayloadSource<T> {
    /// Carve (or recycle) `len` elements from the registry's pools.
    Pooled(u32),
    /// Track a caller-supplied buffer.
    Adopted(Vec<T>),
}

/// Reference-counted allocation guards over payloads of `T`.
///
/// See the [module documentation](self) for the locking model. Handles
/// issued by one registry are meaningless to another; stale handles (from
/// guards already reclaimed) are rejected safely by every operation.
pub struct Registry<T> {
    /// Lock-free plane: one refcount per slot, fixed at `max_guards`.
    counts: Box<[RefCount]>,
    /// Lock-free plane: slot generations, bumped on every reclamation.
    generations: Box<[AtomicU32]>,
    state: Mutex<State<T>>,
    config: PoolConfig,
}

// Compile-time assertion: Registry must be Send + Sync for payloads that
// can move between threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Registry<u8>>();
};

impl<T> Registry<T> {
    /// Create a registry with the given pool configuration.
    ///
    /// The lock-free plane (`max_guards` refcount and generation cells) is
    /// allocated here; the payload pools are created lazily on first
    /// allocation.
    pub fn new(config: PoolConfig) -> Self {
        let counts = (0..config.max_guards).map(|_| RefCount::default()).collect();
        let generations = (0..config.max_guards).map(|_| AtomicU32::new(0)).collect();
        Self {
            counts,
            generations,
            state: Mutex::new(State {
                pools: None,
                metrics: RegistryMetrics::default(),
            }),
            config,
        }
    }

    /// Create a registry with default pool sizing.
    pub fn with_default_config() -> Self {
        Self::new(PoolConfig::default())
    }

    /// Configured maximum number of simultaneously live guards.
    pub fn capacity(&self) -> u32 {
        self.config.max_guards
    }

    /// Whether `handle` refers to a currently live guard of this registry.
    pub fn contains(&self, handle: GuardHandle) -> bool {
        self.handle_current(handle) && self.counts[handle.slot() as usize].load() > 0
    }

    /// Take an additional reference on the guard.
    ///
    /// Lock-free: this never touches the registry lock, in either counting
    /// discipline. Returns `false` (a no-op) for stale or foreign handles.
    pub fn retain(&self, handle: GuardHandle) -> bool {
        let slot = handle.slot() as usize;
        let (Some(count), Some(generation)) =
            (self.counts.get(slot), self.generations.get(slot))
        else {
            return false;
        };
        if generation.load(Ordering::Acquire) != handle.generation() {
            return false;
        }
        if count.load() == 0 {
            return false;
        }
        count.retain();
        true
    }

    /// Drop one reference; reclaim the guard if the count reaches zero.
    ///
    /// Exclusive-access path: reaches the locked plane through
    /// `Mutex::get_mut`, so no lock is taken. Returns `true` iff this call
    /// reclaimed the guard. Stale handles and already-exhausted counts are
    /// safe no-ops.
    pub fn release(&mut self, handle: GuardHandle) -> bool {
        if !self.handle_current(handle) {
            return false;
        }
        let prior = self.counts[handle.slot() as usize].release();
        if prior != 1 {
            return false;
        }
        let Self {
            generations, state, ..
        } = self;
        let state = state.get_mut().unwrap();
        let reclaimed = reclaim(state, generations, handle.slot(), DropReason::Release);
        if reclaimed {
            state.metrics.reclaimed += 1;
        }
        reclaimed
    }

    /// Drop one reference through a shared registry reference.
    ///
    /// The decrement itself is lock-free; the registry lock is acquired
    /// only by the single release that reaches zero, to unlink and recycle.
    /// With [`CountMode::Atomic`] guards, "reached zero" is decided from
    /// the prior value of one atomic decrement, so exactly one caller
    /// performs reclamation under any interleaving.
    pub fn release_shared(&self, handle: GuardHandle) -> bool {
        if !self.handle_current(handle) {
            return false;
        }
        let prior = self.counts[handle.slot() as usize].release();
        if prior != 1 {
            return false;
        }
        let mut state = self.state.lock().unwrap();
        let reclaimed = reclaim(&mut state, &self.generations, handle.slot(), DropReason::Release);
        if reclaimed {
            state.metrics.reclaimed += 1;
        }
        reclaimed
    }

    /// Reclaim the guard immediately, regardless of its reference count.
    ///
    /// Outstanding handles become stale. Returns `true` iff the guard was
    /// live.
    pub fn discard(&mut self, handle: GuardHandle) -> bool {
        if !self.handle_current(handle) {
            return false;
        }
        let slot = handle.slot() as usize;
        let mode = self.counts[slot].mode();
        self.counts[slot].init(0, mode);
        let Self {
            generations, state, ..
        } = self;
        let state = state.get_mut().unwrap();
        let reclaimed = reclaim(state, generations, handle.slot(), DropReason::Release);
        if reclaimed {
            state.metrics.discards += 1;
        }
        reclaimed
    }

    /// Current reference count, or `None` for a stale handle.
    pub fn ref_count(&self, handle: GuardHandle) -> Option<usize> {
        if !self.handle_current(handle) {
            return None;
        }
        Some(self.counts[handle.slot() as usize].load())
    }

    /// The guard's counting discipline, or `None` for a stale handle.
    pub fn count_mode(&self, handle: GuardHandle) -> Option<CountMode> {
        if !self.handle_current(handle) {
            return None;
        }
        Some(self.counts[handle.slot() as usize].mode())
    }

    /// Payload length in elements, or `None` for a stale handle.
    pub fn len(&self, handle: GuardHandle) -> Option<usize> {
        if !self.handle_current(handle) {
            return None;
        }
        let state = self.state.lock().unwrap();
        let pools = state.pools.as_ref()?;
        let meta = pools.slots.get(handle.slot() as usize)?;
        meta.storage.as_ref().map(Storage::len)
    }

    /// Number of guards currently live.
    pub fn live_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.pools.as_ref().map_or(0, |p| p.trackers.len())
    }

    /// Whether no guards are currently live.
    pub fn is_empty(&self) -> bool {
        self.live_count() == 0
    }

    /// Snapshot of the registry's counters.
    pub fn metrics(&self) -> RegistryMetrics {
        self.state.lock().unwrap().metrics.clone()
    }

    /// Borrow the guard's payload. Exclusive-access path, no locking.
    pub fn payload(&mut self, handle: GuardHandle) -> Option<&[T]> {
        if !self.handle_current(handle) {
            return None;
        }
        let state = self.state.get_mut().unwrap();
        let pools = state.pools.as_ref()?;
        let meta = pools.slots.get(handle.slot() as usize)?;
        match meta.storage.as_ref()? {
            Storage::Pooled(range) => {
                Some(pools.payload.slice(range.segment, range.offset, range.len))
            }
            Storage::Adopted(buf) => Some(buf.as_slice()),
        }
    }

    /// Mutably borrow the guard's payload. Exclusive-access path, no
    /// locking.
    pub fn payload_mut(&mut self, handle: GuardHandle) -> Option<&mut [T]> {
        if !self.handle_current(handle) {
            return None;
        }
        let state = self.state.get_mut().unwrap();
        let pools = state.pools.as_mut()?;
        match pools.slots.get_mut(handle.slot() as usize)?.storage.as_mut()? {
            Storage::Pooled(range) => {
                let range = *range;
                Some(pools.payload.slice_mut(range.segment, range.offset, range.len))
            }
            Storage::Adopted(buf) => Some(buf.as_mut_slice()),
        }
    }

    /// Run `f` over the guard's payload through a shared reference.
    ///
    /// Serialises on the registry lock for the duration of `f`. This
    /// protects the pool structure, not payload semantics — coordinating
    /// logically concurrent payload writers remains the caller's concern.
    pub fn read_payload<R>(&self, handle: GuardHandle, f: impl FnOnce(&[T]) -> R) -> Option<R> {
        if !self.handle_current(handle) {
            return None;
        }
        let state = self.state.lock().unwrap();
        let pools = state.pools.as_ref()?;
        let meta = pools.slots.get(handle.slot() as usize)?;
        let slice = match meta.storage.as_ref()? {
            Storage::Pooled(range) => pools.payload.slice(range.segment, range.offset, range.len),
            Storage::Adopted(buf) => buf.as_slice(),
        };
        Some(f(slice))
    }

    /// Run `f` over the guard's mutable payload through a shared
    /// reference. Same locking caveats as [`read_payload`](Self::read_payload).
    pub fn with_payload_mut<R>(
        &self,
        handle: GuardHandle,
        f: impl FnOnce(&mut [T]) -> R,
    ) -> Option<R> {
        if !self.handle_current(handle) {
            return None;
        }
        let mut state = self.state.lock().unwrap();
        let pools = state.pools.as_mut()?;
        let slice = match pools
            .slots
            .get_mut(handle.slot() as usize)?
            .storage
            .as_mut()?
        {
            Storage::Pooled(range) => {
                let range = *range;
                pools.payload.slice_mut(range.segment, range.offset, range.len)
            }
            Storage::Adopted(buf) => buf.as_mut_slice(),
        };
        Some(f(slice))
    }

    /// Tear down every live guard and reset the registry.
    ///
    /// Walks the tracker list once in insertion order, invoking each
    /// guard's destructor with [`DropReason::Shutdown`], then drops the
    /// pools wholesale — no per-block recycling happens on this path.
    /// Afterwards the registry is back in its uninitialised state and can
    /// be used again. A registry that never allocated is a no-op, and so
    /// is a second call. Returns the number of guards torn down.
    ///
    /// Also runs on `Drop`, so teardown is deterministic without any
    /// process-exit hook.
    pub fn finalize_all(&mut self) -> usize {
        let Self {
            generations, state, ..
        } = self;
        let state = state.get_mut().unwrap();
        let State { pools, metrics } = state;
        let Some(mut pools) = pools.take() else {
            return 0;
        };

        let order: SmallVec<[u32; 16]> = pools.trackers.iter_slots().collect();
        let mut torn_down = 0usize;
        for slot in order {
            let (mut destructor, storage) = {
                let Some(meta) = pools.slots.get_mut(slot as usize) else {
                    continue;
                };
                if !meta.live {
                    continue;
                }
                meta.live = false;
                (meta.destructor.take(), meta.storage.take())
            };
            if let Some(d) = destructor.as_mut() {
                match storage {
                    Some(Storage::Pooled(range)) => d(
                        pools.payload.slice_mut(range.segment, range.offset, range.len),
                        DropReason::Shutdown,
                    ),
                    Some(Storage::Adopted(mut buf)) => d(&mut buf, DropReason::Shutdown),
                    None => {}
                }
            }
            generations[slot as usize].fetch_add(1, Ordering::Release);
            torn_down += 1;
        }

        drop(pools);
        metrics.finalized += torn_down as u64;
        metrics.live = 0;
        torn_down
    }

    /// Whether the handle's generation matches its slot's current one.
    fn handle_current(&self, handle: GuardHandle) -> bool {
        match self.generations.get(handle.slot() as usize) {
            Some(g) => g.load(Ordering::Acquire) == handle.generation(),
            None => false,
        }
    }

    /// Build the stale-handle error for `handle`.
    fn stale_error(&self, handle: GuardHandle) -> GuardError {
        let current_generation = self
            .generations
            .get(handle.slot() as usize)
            .map_or(0, |g| g.load(Ordering::Acquire));
        GuardError::StaleHandle {
            handle,
            current_generation,
        }
    }
}

impl<T: Clone + Default> Registry<T> {
    /// Create a guard around `len` pooled elements.
    ///
    /// `mode` fixes the counting discipline for this guard's lifetime.
    /// The guard starts with a reference count of 1 and is linked into
    /// the registry until that count reaches zero. The payload is
    /// default-initialised, whether carved fresh or recycled.
    pub fn allocate(
        &mut self,
        len: u32,
        mode: CountMode,
        destructor: Option<Destructor<T>>,
    ) -> Result<GuardHandle, GuardError> {
        let Self {
            counts,
            generations,
            state,
            config,
        } = self;
        let state = state.get_mut().unwrap();
        alloc_inner(
            state,
            counts,
            generations,
            config,
            PayloadSource::Pooled(len),
            mode,
            destructor,
        )
    }

    /// Create a guard around `len` pooled elements through a shared
    /// reference, serialising registry mutation on the lock.
    pub fn allocate_shared(
        &self,
        len: u32,
        mode: CountMode,
        destructor: Option<Destructor<T>>,
    ) -> Result<GuardHandle, GuardError> {
        let mut state = self.state.lock().unwrap();
        alloc_inner(
            &mut state,
            &self.counts,
            &self.generations,
            &self.config,
            PayloadSource::Pooled(len),
            mode,
            destructor,
        )
    }

    /// Create a guard that tracks the lifecycle of a caller-supplied
    /// buffer instead of carving pooled storage.
    ///
    /// The buffer bypasses the recycle pool: on reclamation it is dropped
    /// (after the destructor runs). If guard creation itself fails the
    /// buffer is dropped as well.
    pub fn adopt(
        &mut self,
        buf: Vec<T>,
        mode: CountMode,
        destructor: Option<Destructor<T>>,
    ) -> Result<GuardHandle, GuardError> {
        let Self {
            counts,
            generations,
            state,
            config,
        } = self;
        let state = state.get_mut().unwrap();
        alloc_inner(
            state,
            counts,
            generations,
            config,
            PayloadSource::Adopted(buf),
            mode,
            destructor,
        )
    }

    /// [`adopt`](Self::adopt) through a shared reference.
    pub fn adopt_shared(
        &self,
        buf: Vec<T>,
        mode: CountMode,
        destructor: Option<Destructor<T>>,
    ) -> Result<GuardHandle, GuardError> {
        let mut state = self.state.lock().unwrap();
        alloc_inner(
            &mut state,
            &self.counts,
            &self.generations,
            &self.config,
            PayloadSource::Adopted(buf),
            mode,
            destructor,
        )
    }

    /// Reallocate the guard's payload to an absolute new length.
    ///
    /// Standard reallocation semantics: on success the payload moves to a
    /// block of the new length, existing elements preserved at their
    /// offsets and any grown tail default-initialised, and the old block
    /// is recycled. On failure the guard's existing block and length are
    /// left untouched and remain valid.
    pub fn resize(&mut self, handle: GuardHandle, new_len: u32) -> Result<(), GuardError> {
        if !self.handle_current(handle) {
            return Err(self.stale_error(handle));
        }
        let stale = self.stale_error(handle);
        let state = self.state.get_mut().unwrap();
        let State { pools, metrics } = state;
        let Some(pools) = pools.as_mut() else {
            return Err(stale);
        };
        let slot = handle.slot() as usize;

        // Adopted buffers resize in place and cannot fail.
        if let Some(Storage::Adopted(buf)) = pools
            .slots
            .get_mut(slot)
            .and_then(|m| m.storage.as_mut())
        {
            buf.resize(new_len as usize, T::default());
            metrics.resizes += 1;
            return Ok(());
        }

        let old = match pools.slots.get(slot).and_then(|m| m.storage.as_ref()) {
            Some(&Storage::Pooled(range)) => range,
            _ => return Err(stale),
        };
        if old.len == new_len {
            metrics.resizes += 1;
            return Ok(());
        }

        // Obtain the new block before giving anything up, so a failure
        // leaves the old block untouched.
        let new_range = if let Some(range) = pools.recycle.pop(new_len) {
            metrics.recycle_hits += 1;
            range
        } else {
            match pools.payload.carve(new_len) {
                Ok((segment, offset)) => {
                    metrics.recycle_misses += 1;
                    BlockRange::new(segment, offset, new_len)
                }
                Err(e) => {
                    metrics.resize_failures += 1;
                    return Err(e.into());
                }
            }
        };

        let copy_len = old.len.min(new_len);
        if copy_len > 0 {
            pools.payload.copy_within(
                (old.segment, old.offset),
                (new_range.segment, new_range.offset),
                copy_len,
            );
        }
        // A recycled block is dirty past the preserved prefix.
        if new_len > copy_len {
            pools
                .payload
                .slice_mut(new_range.segment, new_range.offset + copy_len, new_len - copy_len)
                .fill(T::default());
        }

        pools.recycle.push(old);
        if let Some(meta) = pools.slots.get_mut(slot) {
            meta.storage = Some(Storage::Pooled(new_range));
        }
        metrics.resizes += 1;
        Ok(())
    }

    /// Grow the guard's payload by `delta` elements.
    ///
    /// Equivalent to [`resize`](Self::resize) to the current length plus
    /// `delta`; the same failure guarantees apply. A target length that
    /// does not fit in `u32` can never be satisfied by the pools and is
    /// reported as exhaustion, leaving the guard untouched.
    pub fn grow(&mut self, handle: GuardHandle, delta: u32) -> Result<(), GuardError> {
        let Some(current) = self.len(handle) else {
            return Err(self.stale_error(handle));
        };
        let new_len = u32::try_from(current)
            .ok()
            .and_then(|len| len.checked_add(delta));
        let Some(new_len) = new_len else {
            return Err(GuardError::PayloadExhausted {
                requested: current.saturating_add(delta as usize),
                capacity: self.config.total_payload_capacity(),
            });
        };
        self.resize(handle, new_len)
    }
}

impl<T> Drop for Registry<T> {
    fn drop(&mut self) {
        self.finalize_all();
    }
}

/// Shared allocation path for the exclusive and locked entry points.
fn alloc_inner<T: Clone + Default>(
    state: &mut State<T>,
    counts: &[RefCount],
    generations: &[AtomicU32],
    config: &PoolConfig,
    source: PayloadSource<T>,
    mode: CountMode,
    destructor: Option<Destructor<T>>,
) -> Result<GuardHandle, GuardError> {
    let State { pools, metrics } = state;
    let pools = pools.get_or_insert_with(|| Pools::new(config));

    // Claim a guard slot: free list first, then a fresh slot up to the
    // configured capacity.
    let slot = match pools.free_slots.pop() {
        Some(slot) => slot,
        None => {
            if pools.slots.len() >= config.max_guards as usize {
                return Err(GuardError::SlotsExhausted {
                    capacity: config.max_guards,
                });
            }
            let slot = pools.slots.len() as u32;
            pools.slots.push(SlotMeta::vacant());
            slot
        }
    };

    // Obtain payload storage: recycle hit, fresh carve, or adopted buffer.
    // Counters are bumped only once the whole call has succeeded, so a
    // failed allocation never inflates them.
    let adopted = matches!(source, PayloadSource::Adopted(_));
    let mut recycle_hit = false;
    let storage = match source {
        PayloadSource::Adopted(buf) => Storage::Adopted(buf),
        PayloadSource::Pooled(len) => {
            if let Some(range) = pools.recycle.pop(len) {
                recycle_hit = true;
                // Recycled blocks are dirty.
                pools
                    .payload
                    .slice_mut(range.segment, range.offset, range.len)
                    .fill(T::default());
                Storage::Pooled(range)
            } else {
                match pools.payload.carve(len) {
                    Ok((segment, offset)) => {
                        Storage::Pooled(BlockRange::new(segment, offset, len))
                    }
                    Err(e) => {
                        pools.free_slots.push(slot);
                        return Err(e.into());
                    }
                }
            }
        }
    };

    // Link the tracker node at the tail. On exhaustion, roll the slot and
    // payload back to their free lists and fail the call.
    let tracker = match pools.trackers.append(slot) {
        Some(node) => node,
        None => {
            if let Storage::Pooled(range) = storage {
                pools.recycle.push(range);
            }
            pools.free_slots.push(slot);
            return Err(GuardError::SlotsExhausted {
                capacity: config.max_guards,
            });
        }
    };

    let meta = &mut pools.slots[slot as usize];
    meta.storage = Some(storage);
    meta.destructor = destructor;
    meta.tracker = tracker;
    meta.live = true;

    counts[slot as usize].init(1, mode);
    if adopted {
        metrics.adoptions += 1;
    } else {
        metrics.allocations += 1;
        if recycle_hit {
            metrics.recycle_hits += 1;
        } else {
            metrics.recycle_misses += 1;
        }
    }
    metrics.note_created();

    let generation = generations[slot as usize].load(Ordering::Relaxed);
    Ok(GuardHandle::new(slot, generation))
}

/// Reclaim one guard: unlink its tracker, run the destructor, recycle the
/// payload block and the slot, and bump the slot generation so that all
/// outstanding handles go stale.
fn reclaim<T>(
    state: &mut State<T>,
    generations: &[AtomicU32],
    slot: u32,
    reason: DropReason,
) -> bool {
    let State { pools, metrics } = state;
    let Some(pools) = pools.as_mut() else {
        return false;
    };

    let (tracker, mut destructor, storage) = {
        let Some(meta) = pools.slots.get_mut(slot as usize) else {
            return false;
        };
        if !meta.live {
            return false;
        }
        meta.live = false;
        (meta.tracker, meta.destructor.take(), meta.storage.take())
    };

    pools.trackers.unlink(tracker);

    match storage {
        Some(Storage::Pooled(range)) => {
            if let Some(d) = destructor.as_mut() {
                d(
                    pools.payload.slice_mut(range.segment, range.offset, range.len),
                    reason,
                );
            }
            // Recycled, not returned to the system allocator.
            pools.recycle.push(range);
        }
        Some(Storage::Adopted(mut buf)) => {
            if let Some(d) = destructor.as_mut() {
                d(&mut buf, reason);
            }
        }
        None => {}
    }

    pools.free_slots.push(slot);
    generations[slot as usize].fetch_add(1, Ordering::Release);
    metrics.note_reclaimed();
    true
}
