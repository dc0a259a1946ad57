//! Registry bookkeeping counters.
//!
//! [`RegistryMetrics`] captures allocation and reclamation activity for
//! one registry, enabling telemetry and leak diagnosis without a logging
//! layer. Counters are cumulative for the registry's lifetime except
//! `live`, which tracks the current population.

/// Counters collected by a registry.
///
/// Read a snapshot with [`Registry::metrics`](crate::Registry::metrics).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistryMetrics {
    /// Guards created from pooled storage.
    pub allocations: u64,
    /// Guards created around caller-supplied buffers.
    pub adoptions: u64,
    /// Payload requests satisfied from the recycle pool.
    pub recycle_hits: u64,
    /// Payload requests that fell through to segment carving.
    pub recycle_misses: u64,
    /// Guards reclaimed by a release that reached zero.
    pub reclaimed: u64,
    /// Guards reclaimed by `discard`, regardless of refcount.
    pub discards: u64,
    /// Successful resize operations.
    pub resizes: u64,
    /// Resize operations that failed, leaving the block untouched.
    pub resize_failures: u64,
    /// Guards torn down by `finalize_all`.
    pub finalized: u64,
    /// Guards currently live.
    pub live: u32,
    /// Highest number of guards live at once.
    pub live_peak: u32,
}

impl RegistryMetrics {
    /// Record one more live guard, tracking the peak.
    pub(crate) fn note_created(&mut self) {
        self.live += 1;
        self.live_peak = self.live_peak.max(self.live);
    }

    /// Record one fewer live guard.
    pub(crate) fn note_reclaimed(&mut self) {
        self.live = self.live.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = RegistryMetrics::default();
        assert_eq!(m.allocations, 0);
        assert_eq!(m.adoptions, 0);
        assert_eq!(m.recycle_hits, 0);
        assert_eq!(m.recycle_misses, 0);
        assert_eq!(m.reclaimed, 0);
        assert_eq!(m.discards, 0);
        assert_eq!(m.resizes, 0);
        assert_eq!(m.resize_failures, 0);
        assert_eq!(m.finalized, 0);
        assert_eq!(m.live, 0);
        assert_eq!(m.live_peak, 0);
    }

    #[test]
    fn live_peak_tracks_high_water_mark() {
        let mut m = RegistryMetrics::default();
        m.note_created();
        m.note_created();
        m.note_reclaimed();
        m.note_created();
        assert_eq!(m.live, 2);
        assert_eq!(m.live_peak, 2);
    }
}
