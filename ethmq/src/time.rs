/*! Time structures.

The engine never reads a clock itself. The caller passes the current [`Instant`] into every poll
and the engine compares it against the deadlines it stored earlier.

[`Instant`]: struct.Instant.html
*/
use core::{fmt, ops};
pub use core::time::Duration;

/// An absolute point in time, in milliseconds since an arbitrary epoch such as board reset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Instant {
    /// Milliseconds since the epoch.
    pub millis: i64,
}

impl Instant {
    /// Create a new `Instant` from a number of milliseconds.
    pub fn from_millis<T: Into<i64>>(millis: T) -> Instant {
        Instant { millis: millis.into() }
    }

    /// Create a new `Instant` from a number of seconds.
    pub fn from_secs<T: Into<i64>>(secs: T) -> Instant {
        Instant { millis: secs.into() * 1000 }
    }

    /// The current time of the host, relative to the unix epoch.
    #[cfg(feature = "std")]
    pub fn now() -> Instant {
        let since = ::std::time::SystemTime::now()
            .duration_since(::std::time::UNIX_EPOCH)
            .unwrap_or_default();
        Instant::from_millis(since.as_millis() as i64)
    }

    /// The total number of milliseconds since the epoch.
    pub fn total_millis(&self) -> i64 {
        self.millis
    }

    /// Check whether `delay` has passed between `start` and this instant.
    pub fn has_elapsed(self, start: Instant, delay: Duration) -> bool {
        self >= start + delay
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{:03}s", self.millis / 1000, self.millis % 1000)
    }
}

impl ops::Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        Instant::from_millis(self.millis + rhs.as_millis() as i64)
    }
}

impl ops::Sub<Instant> for Instant {
    type Output = Duration;

    fn sub(self, rhs: Instant) -> Duration {
        Duration::from_millis((self.millis - rhs.millis).unsigned_abs())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn elapsed_delay() {
        let start = Instant::from_secs(2);
        assert!(!Instant::from_millis(2999).has_elapsed(start, Duration::from_secs(1)));
        assert!(Instant::from_millis(3000).has_elapsed(start, Duration::from_secs(1)));
        assert_eq!(Instant::from_millis(3500) - start, Duration::from_millis(1500));
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Instant::from_millis(12_034)), "12.034s");
    }
}
