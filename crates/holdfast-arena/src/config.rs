//! Pool configuration parameters.

/// Configuration for a registry's storage pools.
///
/// Controls segment sizing and the hard capacity bounds. All values are
/// immutable after the pools are built; the pools never grow past them.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Maximum number of guards live at once.
    ///
    /// Bounds the slot table and the tracker-node arena. Default: 1024.
    pub max_guards: u32,

    /// Size of each payload segment in elements.
    ///
    /// Default: 65_536. A single block can never exceed this.
    pub segment_len: u32,

    /// Maximum number of payload segments.
    ///
    /// Default: 16. Total payload capacity is
    /// `segment_len * max_segments` elements.
    pub max_segments: u16,
}

impl PoolConfig {
    /// Default guard-slot capacity.
    pub const DEFAULT_MAX_GUARDS: u32 = 1024;

    /// Default segment length in elements.
    pub const DEFAULT_SEGMENT_LEN: u32 = 65_536;

    /// Default maximum segment count.
    pub const DEFAULT_MAX_SEGMENTS: u16 = 16;

    /// Create a config with the given guard capacity and default pool sizes.
    pub fn new(max_guards: u32) -> Self {
        Self {
            max_guards,
            segment_len: Self::DEFAULT_SEGMENT_LEN,
            max_segments: Self::DEFAULT_MAX_SEGMENTS,
        }
    }

    /// Total payload capacity across all segments, in elements.
    pub fn total_payload_capacity(&self) -> usize {
        self.segment_len as usize * self.max_segments as usize
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_GUARDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_bounded() {
        let config = PoolConfig::default();
        assert_eq!(config.max_guards, 1024);
        assert_eq!(config.total_payload_capacity(), 65_536 * 16);
    }

    #[test]
    fn max_guards_preserved() {
        let config = PoolConfig::new(4);
        assert_eq!(config.max_guards, 4);
    }
}
