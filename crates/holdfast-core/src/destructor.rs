//! The guard destructor contract.

use std::fmt;

/// Why a guard's destructor is being invoked.
///
/// Passed to every destructor so that shutdown-time teardown can be told
/// apart from an application-triggered release — e.g. a destructor may
/// flush state on [`DropReason::Release`] but skip the work when the
/// whole registry is going away anyway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// The guard's reference count reached zero (or it was discarded).
    Release,
    /// The registry is being finalized wholesale.
    Shutdown,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Release => write!(f, "release"),
            Self::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// Cleanup callback stored with a guard and invoked exactly once, just
/// before its payload is released.
///
/// The destructor receives the payload slice and the [`DropReason`]. It
/// runs while the registry is exclusively held, and it receives only the
/// payload — so calling back into the registry from a destructor is
/// structurally impossible, which enforces the no-re-entrancy contract
/// at the type level. Destructors are assumed non-failing.
pub type Destructor<T> = Box<dyn FnMut(&mut [T], DropReason) + Send>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_reason_display() {
        assert_eq!(DropReason::Release.to_string(), "release");
        assert_eq!(DropReason::Shutdown.to_string(), "shutdown");
    }

    #[test]
    fn destructor_observes_payload_and_reason() {
        let mut d: Destructor<u8> = Box::new(|payload, reason| {
            assert_eq!(reason, DropReason::Release);
            payload.fill(0);
        });
        let mut buf = [1u8, 2, 3];
        d(&mut buf, DropReason::Release);
        assert_eq!(buf, [0, 0, 0]);
    }
}
