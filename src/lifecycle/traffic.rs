//! Traffic Entry Module
//!
//! Per-remote-address bookkeeping used to decide when a connection has been
//! open long enough or served enough requests.

use std::time::{Duration, Instant};

// == Traffic Entry ==
/// Request count and first-seen time for one remote address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrafficEntry {
    /// Requests seen in the current window, including the current one
    pub request_count: u32,
    /// When the first request of the current window arrived
    pub active_since: Instant,
}

impl TrafficEntry {
    /// Creates the entry for the first request of a window.
    pub fn first_seen(now: Instant) -> Self {
        Self {
            request_count: 1,
            active_since: now,
        }
    }

    /// Counts one more request.
    pub fn record_request(&mut self) {
        self.request_count = self.request_count.saturating_add(1);
    }

    // == Should Close ==
    /// Checks the close condition at `now`.
    ///
    /// A zero `max_request_count` or `max_age` disables that dimension.
    pub fn should_close(&self, max_age: Duration, max_request_count: u32, now: Instant) -> bool {
        if max_request_count > 0 && self.request_count >= max_request_count {
            return true;
        }

        // A deadline past what Instant can represent is never reached.
        !max_age.is_zero()
            && self
                .active_since
                .checked_add(max_age)
                .is_some_and(|deadline| deadline < now)
    }
}
