//! Response DTOs for the server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Whether the connection lifecycle policy is active
    pub enabled: bool,
    /// Remote addresses currently tracked
    pub tracked_connections: usize,
    /// Number of responses that asked the client to close the connection
    pub close_recommendations: u64,
    /// Tracker lookups that found a live entry
    pub hits: u64,
    /// Tracker lookups that found nothing
    pub misses: u64,
    /// Addresses dropped because the tracker was full
    pub evictions: u64,
    /// Addresses dropped because they went quiet
    pub expirations: u64,
    /// Hit rate of tracker lookups (0.0 to 1.0)
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from tracker statistics.
    ///
    /// `tracker` is `None` when the policy is disabled.
    pub fn new(tracker: Option<CacheStats>, close_recommendations: u64) -> Self {
        let enabled = tracker.is_some();
        let stats = tracker.unwrap_or_default();
        Self {
            enabled,
            tracked_connections: stats.total_entries,
            close_recommendations,
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
