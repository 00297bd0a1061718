//! Connection Lifecycle - bounded TTL caching and connection recycling
//!
//! Provides a concurrent bounded cache with per-entry expiry and an HTTP
//! policy that advises closing connections after a maximum age or request
//! count.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::BoundedTtlCache;
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::Config;
pub use error::ConfigError;
pub use lifecycle::{
    ConnectionLifecycleAdvisor, ConnectionLifecyclePolicy, ConnectionLifecycleSettings,
};
pub use tasks::spawn_cleanup_task;
