//! Connection lifecycle middleware
//!
//! Consults the policy for every request and tells the client to drop the
//! connection once it has been used long enough.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};

use super::handlers::AppState;
use crate::lifecycle::ConnectionLifecycleAdvisor;

/// Sets `Connection: close` on the response when the policy advises it.
///
/// The peer address comes from [`ConnectInfo`]. Requests served without it
/// are never tracked.
pub async fn connection_lifecycle_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();

    let close = state
        .policy
        .should_close_connection(&remote_addr, request.headers());

    let mut response = next.run(request).await;
    if close {
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
    }
    response
}
