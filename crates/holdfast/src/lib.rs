//! Holdfast: reference-counted allocation guards over pooled storage.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Holdfast sub-crates. For most users, adding `holdfast` as a single
//! dependency is sufficient.
//!
//! A [`prelude::Registry`] wraps payload buffers in *guards*: each guard
//! carries a reference count, a slot in a segment pool, and an optional
//! destructor. Retaining and releasing drive the count; the release that
//! reaches zero runs the destructor and recycles the block for the next
//! allocation. Tearing the registry down (explicitly or on `Drop`) walks
//! every still-live guard in insertion order.
//!
//! # Quick start
//!
//! ```rust
//! use holdfast::prelude::*;
//!
//! let mut reg: Registry<u8> = Registry::with_default_config();
//!
//! // One guard around 64 pooled bytes, with a cleanup callback.
//! let guard = reg
//!     .allocate(
//!         64,
//!         CountMode::Plain,
//!         Some(Box::new(|payload: &mut [u8], reason| {
//!             assert_eq!(reason, DropReason::Release);
//!             payload.fill(0);
//!         })),
//!     )
//!     .unwrap();
//!
//! reg.payload_mut(guard).unwrap().fill(0xAB);
//!
//! // A second owner appears and later lets go.
//! assert!(reg.retain(guard));
//! assert!(!reg.release(guard), "one reference still outstanding");
//!
//! // The final release runs the destructor and recycles the block.
//! assert!(reg.release(guard));
//! assert!(!reg.contains(guard));
//!
//! // Any guards still live when the registry drops are torn down with
//! // DropReason::Shutdown — no process-exit hooks involved.
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `holdfast-core` | Handles, counting disciplines, destructor contract |
//! | [`arena`] | `holdfast-arena` | Segment pools, block ranges, recycle free lists |
//! | [`guard`] | `holdfast-guard` | The registry, its errors and metrics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and contracts (`holdfast-core`).
///
/// Contains [`types::GuardHandle`], the [`types::CountMode`] counting
/// disciplines, and the [`types::Destructor`] contract.
pub use holdfast_core as types;

/// Segment pools and block recycling (`holdfast-arena`).
///
/// Most users configure storage through [`arena::PoolConfig`] and never
/// touch the pools directly; [`arena::SegmentPool`] and
/// [`arena::RecyclePool`] are exposed for embedders building their own
/// registries.
pub use holdfast_arena as arena;

/// The guard registry and allocation protocol (`holdfast-guard`).
///
/// [`guard::Registry`] is the main entry point of the library.
pub use holdfast_guard as guard;

/// Common imports for typical Holdfast usage.
///
/// ```rust
/// use holdfast::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use holdfast_core::{CountMode, Destructor, DropReason, GuardHandle};

    // Storage configuration
    pub use holdfast_arena::{PoolConfig, PoolError};

    // Registry
    pub use holdfast_guard::{GuardError, Registry, RegistryMetrics};
}
