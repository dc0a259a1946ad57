//! Benchmark profiles and utilities for the Holdfast guard library.
//!
//! Provides pre-built [`PoolConfig`] profiles for benchmarking:
//!
//! - [`reference_profile`]: 1K guards over 64 KiB segments
//! - [`stress_profile`]: 16K guards over 1 MiB segments
//! - [`prefill`]: populate a registry with live guards of a fixed size

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use holdfast_arena::PoolConfig;
use holdfast_core::{CountMode, GuardHandle};
use holdfast_guard::Registry;

/// Reference benchmark profile: 1024 guards, 4 segments of 64 Ki elements.
pub fn reference_profile() -> PoolConfig {
    PoolConfig {
        max_guards: 1024,
        segment_len: 65_536,
        max_segments: 4,
    }
}

/// Stress benchmark profile: 16K guards, 16 segments of 1 Mi elements.
pub fn stress_profile() -> PoolConfig {
    PoolConfig {
        max_guards: 16_384,
        segment_len: 1 << 20,
        max_segments: 16,
    }
}

/// Allocate `n` guards of `len` elements each and return their handles.
///
/// Panics on exhaustion; profiles are sized so the benchmarks fit.
pub fn prefill(reg: &mut Registry<u8>, n: u32, len: u32) -> Vec<GuardHandle> {
    (0..n)
        .map(|_| {
            reg.allocate(len, CountMode::Plain, None)
                .unwrap_or_else(|e| panic!("prefill exhausted the pools: {e}"))
        })
        .collect()
}
