//! API Handlers
//!
//! HTTP request handlers for the operational endpoints.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::config::Config;
use crate::lifecycle::ConnectionLifecyclePolicy;
use crate::models::{HealthResponse, StatsResponse};

/// Application state shared across all handlers and middleware.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Connection lifecycle policy consulted on every request
    pub policy: Arc<ConnectionLifecyclePolicy>,
}

impl AppState {
    /// Creates a new AppState around the given policy.
    pub fn new(policy: ConnectionLifecyclePolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(ConnectionLifecyclePolicy::new(config.connection_lifecycle))
    }
}

/// Handler for GET /stats
///
/// Reports traffic tracker statistics and how often a close was advised.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.policy.tracker_stats(),
        state.policy.close_recommendations(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{ConnectionLifecycleAdvisor, ConnectionLifecycleSettings};
    use axum::http::HeaderMap;
    use std::time::Duration;

    fn settings(enabled: bool, max_requests: u32) -> ConnectionLifecycleSettings {
        ConnectionLifecycleSettings {
            enabled,
            max_connection_age: Duration::ZERO,
            max_connection_request_count: max_requests,
        }
    }

    #[tokio::test]
    async fn test_stats_handler_fresh_state() {
        let state = AppState::new(ConnectionLifecyclePolicy::new(settings(true, 3)));

        let response = stats_handler(State(state)).await;
        assert!(response.enabled);
        assert_eq!(response.tracked_connections, 0);
        assert_eq!(response.close_recommendations, 0);
    }

    #[tokio::test]
    async fn test_stats_handler_counts_closes() {
        let state = AppState::new(ConnectionLifecyclePolicy::new(settings(true, 2)));
        let headers = HeaderMap::new();

        assert!(!state.policy.should_close_connection("10.0.0.1:80", &headers));
        assert!(state.policy.should_close_connection("10.0.0.1:80", &headers));
        assert!(!state.policy.should_close_connection("10.0.0.2:80", &headers));

        let response = stats_handler(State(state)).await;
        assert_eq!(response.tracked_connections, 1);
        assert_eq!(response.close_recommendations, 1);
    }

    #[tokio::test]
    async fn test_stats_handler_disabled() {
        let state = AppState::new(ConnectionLifecyclePolicy::new(settings(false, 2)));

        let response = stats_handler(State(state)).await;
        assert!(!response.enabled);
    }

    #[tokio::test]
    async fn test_from_config_uses_lifecycle_settings() {
        let state = AppState::from_config(&Config::default());
        assert_eq!(
            *state.policy.settings(),
            ConnectionLifecycleSettings::default()
        );
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
