//! Connection Lifecycle Module
//!
//! Decides when a long-lived HTTP connection should be closed so clients
//! reconnect and get rebalanced.

mod advisor;
mod traffic;

pub use advisor::{
    ConnectionLifecycleAdvisor, ConnectionLifecyclePolicy, ConnectionLifecycleSettings,
    TrafficTracker, FALLBACK_TRACKER_TTL, TRACKER_MAX_SIZE, TRACKER_PRUNE_BATCH,
};
pub use traffic::TrafficEntry;
