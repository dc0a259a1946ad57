//! Guard registry and allocation protocol for Holdfast.
//!
//! This crate ties the workspace together: it owns the [`Registry`],
//! which wraps pooled payload blocks in reference-counted guards, links
//! every live guard into a tracker list for bulk teardown, and recycles
//! reclaimed slots and blocks instead of returning them to the system
//! allocator.
//!
//! # Architecture
//!
//! ```text
//! Registry<T>
//! ├── RefCount[] + AtomicU32[] (lock-free plane: counts, generations)
//! └── Mutex<State<T>>
//!     ├── SlotMeta[] + slot free list
//!     ├── TrackerList (insertion-ordered, O(1) append/unlink)
//!     ├── SegmentPool<T> (payload storage)
//!     └── RecyclePool (released blocks, exact-size reuse)
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod metrics;
pub mod registry;
mod slot;
mod tracker;

pub use error::GuardError;
pub use metrics::RegistryMetrics;
pub use registry::Registry;
