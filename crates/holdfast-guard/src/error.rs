//! Registry-specific error types.

use std::error::Error;
use std::fmt;

use holdfast_arena::PoolError;
use holdfast_core::GuardHandle;

/// Errors that can occur during registry operations.
///
/// Every failure is returned synchronously to the caller; the registry
/// never retries and never aborts. Failure of `resize` leaves the guard's
/// existing block and length untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardError {
    /// The guard-slot table is full — no more guards can be created.
    SlotsExhausted {
        /// Configured guard capacity.
        capacity: u32,
    },
    /// The payload pool could not produce a block.
    PayloadExhausted {
        /// Number of elements requested.
        requested: usize,
        /// Pool capacity in elements.
        capacity: usize,
    },
    /// The handle's guard has already been reclaimed.
    StaleHandle {
        /// The rejected handle.
        handle: GuardHandle,
        /// The slot's current generation.
        current_generation: u32,
    },
}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlotsExhausted { capacity } => {
                write!(f, "guard slots exhausted: capacity {capacity}")
            }
            Self::PayloadExhausted {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "payload pool exhausted: requested {requested} elements, capacity {capacity} elements"
                )
            }
            Self::StaleHandle {
                handle,
                current_generation,
            } => {
                write!(
                    f,
                    "stale handle: {handle}, slot is at generation {current_generation}"
                )
            }
        }
    }
}

impl Error for GuardError {}

impl From<PoolError> for GuardError {
    fn from(e: PoolError) -> Self {
        match e {
            PoolError::CapacityExceeded {
                requested,
                capacity,
            } => Self::PayloadExhausted {
                requested,
                capacity,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_error_converts_to_payload_exhausted() {
        let e: GuardError = PoolError::CapacityExceeded {
            requested: 100,
            capacity: 64,
        }
        .into();
        assert_eq!(
            e,
            GuardError::PayloadExhausted {
                requested: 100,
                capacity: 64
            }
        );
    }

    #[test]
    fn stale_handle_display_names_both_generations() {
        let e = GuardError::StaleHandle {
            handle: GuardHandle::new(3, 1),
            current_generation: 2,
        };
        assert_eq!(
            e.to_string(),
            "stale handle: GuardHandle(slot=3, gen=1), slot is at generation 2"
        );
    }
}
