//! Clock Module
//!
//! Time abstraction shared by the cache and the connection lifecycle policy.
//! Production code uses [`SystemClock`]; tests drive a [`FakeClock`] forward
//! by hand instead of sleeping.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

// == Clock Trait ==
/// Source of monotonic time.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> Instant;

    /// Returns the time elapsed since `earlier`, saturating at zero.
    fn since(&self, earlier: Instant) -> Duration {
        self.now().saturating_duration_since(earlier)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

// == System Clock ==
/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// == Fake Clock ==
/// Manually advanced clock for deterministic tests.
///
/// Clones share the same timeline, so a clone handed to a cache can be
/// advanced from the test body.
#[derive(Debug, Clone)]
pub struct FakeClock {
    now: Arc<RwLock<Instant>>,
}

impl FakeClock {
    /// Creates a fake clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            now: Arc::new(RwLock::new(Instant::now())),
        }
    }

    /// Moves the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.write();
        *now += duration;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.now.read()
    }
}
