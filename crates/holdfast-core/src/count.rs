//! Dual-discipline reference counting.
//!
//! A [`RefCount`] stores its value in an `AtomicUsize` regardless of mode,
//! which keeps registries `Sync` without per-guard type parameters. The
//! *discipline* — how the value is mutated — is fixed when the counter is
//! (re)initialised for a guard:
//!
//! - [`CountMode::Plain`]: separate load/store pairs with relaxed ordering.
//!   No read-modify-write, so concurrent mutation can lose updates. Only
//!   valid while a single thread owns all references.
//! - [`CountMode::Atomic`]: single `fetch_add`/`fetch_sub` transactions.
//!   "Reached zero" is decided from the prior value returned by the one
//!   decrement, so the reclaim trigger fires exactly once under any
//!   interleaving.

use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Reference-count discipline, fixed for a guard's whole lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CountMode {
    /// Non-synchronising counting for single-threaded ownership.
    #[default]
    Plain,
    /// Atomic read-modify-write counting for cross-thread ownership.
    Atomic,
}

impl CountMode {
    fn to_tag(self) -> u8 {
        match self {
            Self::Plain => 0,
            Self::Atomic => 1,
        }
    }

    fn from_tag(tag: u8) -> Self {
        if tag == 0 {
            Self::Plain
        } else {
            Self::Atomic
        }
    }
}

impl fmt::Display for CountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Atomic => write!(f, "atomic"),
        }
    }
}

/// A reference counter with a per-guard discipline.
///
/// Counter cells live in a registry's preallocated slot table and are
/// reinitialised via [`RefCount::init`] each time their slot is claimed
/// for a new guard. The discipline tag is stored atomically so that
/// initialisation can happen through a shared reference, but it is only
/// ever written while the slot is unclaimed.
///
/// All mutating methods return the *prior* value, so a `release` that
/// observes a prior value of 1 is the unique release that drops the
/// count to zero.
#[derive(Debug)]
pub struct RefCount {
    value: AtomicUsize,
    mode: AtomicU8,
}

impl RefCount {
    /// Create a counter with the given initial value and discipline.
    pub fn new(initial: usize, mode: CountMode) -> Self {
        Self {
            value: AtomicUsize::new(initial),
            mode: AtomicU8::new(mode.to_tag()),
        }
    }

    /// Reinitialise the counter for a newly claimed slot.
    ///
    /// Must only be called while no handle to the slot is live.
    pub fn init(&self, value: usize, mode: CountMode) {
        self.mode.store(mode.to_tag(), Ordering::Relaxed);
        self.value.store(value, Ordering::Release);
    }

    /// The discipline this counter currently operates under.
    pub fn mode(&self) -> CountMode {
        CountMode::from_tag(self.mode.load(Ordering::Relaxed))
    }

    /// Current count. `Acquire` in atomic mode so a zero observed here
    /// happens-after the release that produced it.
    pub fn load(&self) -> usize {
        match self.mode() {
            CountMode::Plain => self.value.load(Ordering::Relaxed),
            CountMode::Atomic => self.value.load(Ordering::Acquire),
        }
    }

    /// Increment the count, returning the prior value.
    pub fn retain(&self) -> usize {
        match self.mode() {
            CountMode::Plain => {
                let prior = self.value.load(Ordering::Relaxed);
                self.value.store(prior + 1, Ordering::Relaxed);
                prior
            }
            CountMode::Atomic => self.value.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Decrement the count, returning the prior value.
    ///
    /// A prior value of 1 means this call dropped the count to zero and
    /// the caller must reclaim. A prior value of 0 means the counter was
    /// already exhausted; the count saturates and the caller must treat
    /// the operation as a no-op.
    ///
    /// Atomic mode uses `AcqRel`: the final decrement synchronises with
    /// every earlier release, so the reclaiming thread observes all
    /// writes made by previous owners.
    pub fn release(&self) -> usize {
        match self.mode() {
            CountMode::Plain => {
                let prior = self.value.load(Ordering::Relaxed);
                if prior > 0 {
                    self.value.store(prior - 1, Ordering::Relaxed);
                }
                prior
            }
            CountMode::Atomic => {
                let prior = self.value.fetch_sub(1, Ordering::AcqRel);
                if prior == 0 {
                    // Undo the underflow; release on an exhausted counter
                    // is a contract violation handled as a no-op.
                    self.value.fetch_add(1, Ordering::Relaxed);
                }
                prior
            }
        }
    }
}

impl Default for RefCount {
    fn default() -> Self {
        Self::new(0, CountMode::Plain)
    }
}
