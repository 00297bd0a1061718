//! API Routes
//!
//! Configures the Axum router with the operational endpoints and the
//! connection lifecycle middleware.

use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{health_handler, stats_handler, AppState};
use super::middleware::connection_lifecycle_layer;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /stats` - Get traffic tracker statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Connection lifecycle: adds `Connection: close` when advised
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
///
/// Serve the router with `into_make_service_with_connect_info::<SocketAddr>()`
/// so the lifecycle middleware can see peer addresses.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            connection_lifecycle_layer,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{ConnectionLifecyclePolicy, ConnectionLifecycleSettings};
    use axum::{
        body::Body,
        extract::ConnectInfo,
        http::{header, Request, StatusCode},
    };
    use std::net::SocketAddr;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn create_test_app(max_requests: u32) -> Router {
        let policy = ConnectionLifecyclePolicy::new(ConnectionLifecycleSettings {
            enabled: true,
            max_connection_age: Duration::ZERO,
            max_connection_request_count: max_requests,
        });
        create_router(AppState::new(policy))
    }

    fn request_from(uri: &str, addr: SocketAddr) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .extension(ConnectInfo(addr))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app(0);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONNECTION).is_none());
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app(0);

        let response = app
            .oneshot(request_from("/stats", "127.0.0.1:5000".parse().unwrap()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_close_header_after_request_limit() {
        let app = create_test_app(2);
        let addr: SocketAddr = "127.0.0.1:5001".parse().unwrap();

        let first = app
            .clone()
            .oneshot(request_from("/health", addr))
            .await
            .unwrap();
        assert!(first.headers().get(header::CONNECTION).is_none());

        let second = app.oneshot(request_from("/health", addr)).await.unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(second.headers().get(header::CONNECTION).unwrap(), "close");
    }

    #[tokio::test]
    async fn test_unknown_route_still_counted() {
        let app = create_test_app(1);

        let response = app
            .oneshot(request_from("/missing", "127.0.0.1:5002".parse().unwrap()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers().get(header::CONNECTION).unwrap(), "close");
    }
}
