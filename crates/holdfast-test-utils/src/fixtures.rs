//! Reusable destructor fixtures.
//!
//! [`DropProbe`] builds destructors that record how often and why they
//! ran, which is what most registry tests need to assert: exactly-once
//! reclamation and the right [`DropReason`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use holdfast_core::{Destructor, DropReason};

/// Shared recorder for destructor invocations.
///
/// Clone the probe, hand [`DropProbe::destructor`] to the registry, and
/// assert on the original after the guard is gone. Thread-safe, so it
/// also works for the concurrent release tests.
#[derive(Clone, Default)]
pub struct DropProbe {
    calls: Arc<AtomicUsize>,
    reasons: Arc<Mutex<Vec<DropReason>>>,
}

impl DropProbe {
    /// Create a probe with zero recorded invocations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a destructor that records each invocation on this probe.
    pub fn destructor<T: Send + 'static>(&self) -> Destructor<T> {
        let calls = Arc::clone(&self.calls);
        let reasons = Arc::clone(&self.reasons);
        Box::new(move |_payload, reason| {
            calls.fetch_add(1, Ordering::SeqCst);
            reasons.lock().unwrap().push(reason);
        })
    }

    /// Number of times any destructor built from this probe has run.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Reasons recorded so far, in invocation order.
    pub fn reasons(&self) -> Vec<DropReason> {
        self.reasons.lock().unwrap().clone()
    }
}
