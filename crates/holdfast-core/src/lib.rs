//! Core types for the Holdfast allocation-guard library.
//!
//! This is the leaf crate with zero dependencies. It defines the
//! fundamental abstractions shared across the Holdfast workspace:
//! generational guard handles, the dual-discipline reference counter,
//! and the destructor contract.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod count;
pub mod destructor;
pub mod handle;

pub use count::{CountMode, RefCount};
pub use destructor::{Destructor, DropReason};
pub use handle::GuardHandle;
