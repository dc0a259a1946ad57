//! Pool-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during pool operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolError {
    /// The segment pool is full — no more blocks can be carved.
    CapacityExceeded {
        /// Number of elements requested.
        requested: usize,
        /// Total capacity available across all segments, in elements.
        capacity: usize,
    },
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "pool capacity exceeded: requested {requested} elements, capacity {capacity} elements"
                )
            }
        }
    }
}

impl Error for PoolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_exceeded_display() {
        let e = PoolError::CapacityExceeded {
            requested: 128,
            capacity: 64,
        };
        assert_eq!(
            e.to_string(),
            "pool capacity exceeded: requested 128 elements, capacity 64 elements"
        );
    }
}
