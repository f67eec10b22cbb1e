//! Millisecond Clock
//!
//! Tracking events carry their own timestamps: the hand-pose collaborator
//! owns the cadence, and replayed traces carry recorded times. Every engine
//! operation therefore takes `now` explicitly and never reads a clock on
//! its own. [`Timestamp::now`] is a monotonic, process-relative clock for
//! embedders that do not already have one.

use std::sync::OnceLock;
use std::time::Instant;

/// Process start reference for [`Timestamp::now`]
static PROCESS_EPOCH: OnceLock<Instant> = OnceLock::new();

/// A point in time, in milliseconds on the caller's clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp from milliseconds.
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Capture the current process-relative time.
    ///
    /// The first call anchors the epoch, so the first reading is zero.
    pub fn now() -> Self {
        let epoch = PROCESS_EPOCH.get_or_init(Instant::now);
        Self(epoch.elapsed().as_millis() as u64)
    }

    /// Milliseconds since the clock's origin.
    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`.
    /// Returns 0 if `earlier` is actually later.
    #[inline]
    pub fn millis_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl serde::Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Timestamp(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_since() {
        let a = Timestamp::from_millis(1_000);
        let b = Timestamp::from_millis(1_250);
        assert_eq!(b.millis_since(a), 250);
    }

    #[test]
    fn test_millis_since_saturates() {
        let a = Timestamp::from_millis(1_000);
        let b = Timestamp::from_millis(400);
        assert_eq!(b.millis_since(a), 0);
    }

    #[test]
    fn test_now_is_monotonic() {
        let t1 = Timestamp::now();
        let t2 = Timestamp::now();
        assert!(t2 >= t1);
    }

    #[test]
    fn test_serde_as_plain_number() {
        let t = Timestamp::from_millis(4_242);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "4242");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
