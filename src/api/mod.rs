//! API Module
//!
//! HTTP handlers, middleware and routing for the server.
//!
//! # Endpoints
//! - `GET /stats` - Get traffic tracker statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use middleware::connection_lifecycle_layer;
pub use routes::create_router;
