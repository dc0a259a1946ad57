//! Fixed-capacity segment pools and block recycling for Holdfast.
//!
//! Payload storage for guards is carved from pre-sized [`Segment`]s with
//! bump allocation — the system allocator is touched only when a segment
//! is created, never per guard. Released blocks are not returned to the
//! system either: they go into a [`RecyclePool`] of exact-size free lists
//! and are handed out again before any new carving happens.
//!
//! # Architecture
//!
//! ```text
//! SegmentPool<T> (bounded list of segments)
//! └── Segment<T>[] (contiguous Vec<T>, bump cursor)
//! RecyclePool (len → [BlockRange] free lists, consulted first)
//! ```
//!
//! Pools never grow past their configured bounds: exhaustion is surfaced
//! as [`PoolError::CapacityExceeded`], never an abort.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod recycle;
pub mod segment;

pub use config::PoolConfig;
pub use error::PoolError;
pub use recycle::{BlockRange, RecyclePool};
pub use segment::{Segment, SegmentPool};
