//! Connection Lifecycle Advisor
//!
//! Tracks requests per remote address and recommends closing connections
//! that are too old or have served too many requests. Useful behind load
//! balancers that only rebalance on new connections.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use tracing::debug;

use crate::cache::{BoundedTtlCache, CacheStats};
use crate::clock::{Clock, SystemClock};
use crate::lifecycle::TrafficEntry;

/// Maximum number of remote addresses tracked at once
pub const TRACKER_MAX_SIZE: usize = 65_535;

/// Number of addresses dropped when the tracker overflows
pub const TRACKER_PRUNE_BATCH: usize = 1_000;

/// Tracker TTL used when connection age is not limited
pub const FALLBACK_TRACKER_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Tracker cache keyed by remote address.
pub type TrafficTracker = BoundedTtlCache<TrafficEntry, Arc<dyn Clock>>;

// == Settings ==
/// Thresholds for closing connections. A zero threshold disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionLifecycleSettings {
    /// When false, no connection is ever advised to close
    pub enabled: bool,
    /// Maximum time since the first request of a connection
    pub max_connection_age: Duration,
    /// Maximum number of requests served on a connection
    pub max_connection_request_count: u32,
}

impl Default for ConnectionLifecycleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_connection_age: Duration::from_secs(60),
            max_connection_request_count: 0,
        }
    }
}

impl ConnectionLifecycleSettings {
    /// TTL for tracked addresses: twice the maximum age, or a day when age
    /// is not limited.
    pub fn tracker_ttl(&self) -> Duration {
        if self.max_connection_age.is_zero() {
            FALLBACK_TRACKER_TTL
        } else {
            self.max_connection_age.saturating_mul(2)
        }
    }
}

// == Advisor Trait ==
/// Decides whether the connection a request arrived on should be closed
/// after the response.
pub trait ConnectionLifecycleAdvisor: Send + Sync {
    /// Returns true if the connection to `remote_addr` should be closed.
    ///
    /// `headers` are the request headers; they are not part of the current
    /// decision.
    fn should_close_connection(&self, remote_addr: &str, headers: &HeaderMap) -> bool;
}

// == Policy ==
/// Advisor backed by a bounded TTL cache of [`TrafficEntry`] values.
///
/// A disabled policy owns no tracker and never tracks anything.
pub struct ConnectionLifecyclePolicy {
    clock: Arc<dyn Clock>,
    settings: ConnectionLifecycleSettings,
    tracker: Option<Arc<TrafficTracker>>,
    close_recommendations: AtomicU64,
}

impl ConnectionLifecyclePolicy {
    /// Creates a policy using the system clock.
    pub fn new(settings: ConnectionLifecycleSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Creates a policy reading time from `clock`.
    pub fn with_clock(settings: ConnectionLifecycleSettings, clock: Arc<dyn Clock>) -> Self {
        let tracker = settings.enabled.then(|| {
            Arc::new(BoundedTtlCache::with_clock(
                TRACKER_MAX_SIZE,
                TRACKER_PRUNE_BATCH,
                settings.tracker_ttl(),
                Arc::clone(&clock),
            ))
        });

        Self {
            clock,
            settings,
            tracker,
            close_recommendations: AtomicU64::new(0),
        }
    }

    /// Returns the settings this policy was built with.
    pub fn settings(&self) -> &ConnectionLifecycleSettings {
        &self.settings
    }

    /// Returns the tracker cache, or `None` when the policy is disabled.
    pub fn tracker(&self) -> Option<&Arc<TrafficTracker>> {
        self.tracker.as_ref()
    }

    /// Returns the tracker statistics, or `None` when the policy is disabled.
    pub fn tracker_stats(&self) -> Option<CacheStats> {
        self.tracker.as_ref().map(|tracker| tracker.stats())
    }

    /// Returns how many times a close was recommended.
    pub fn close_recommendations(&self) -> u64 {
        self.close_recommendations.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for ConnectionLifecyclePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionLifecyclePolicy")
            .field("settings", &self.settings)
            .field("tracker", &self.tracker)
            .field("close_recommendations", &self.close_recommendations())
            .finish_non_exhaustive()
    }
}

impl ConnectionLifecycleAdvisor for ConnectionLifecyclePolicy {
    fn should_close_connection(&self, remote_addr: &str, _headers: &HeaderMap) -> bool {
        let Some(tracker) = &self.tracker else {
            return false;
        };
        if remote_addr.is_empty() {
            return false;
        }

        let max_age = self.settings.max_connection_age;
        let max_request_count = self.settings.max_connection_request_count;
        let mut should_close = false;

        // Count, evaluate and drop the entry in one transaction so the next
        // request from this address starts a fresh window.
        tracker.update(remote_addr, |current| {
            let now = self.clock.now();
            let entry = match current {
                Some(mut entry) => {
                    entry.record_request();
                    entry
                }
                None => TrafficEntry::first_seen(now),
            };

            should_close = entry.should_close(max_age, max_request_count, now);
            if should_close {
                None
            } else {
                Some(entry)
            }
        });

        if should_close {
            self.close_recommendations.fetch_add(1, Ordering::Relaxed);
            debug!(remote_addr, "advising to close connection");
        }

        should_close
    }
}
