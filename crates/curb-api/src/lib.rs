//! CurbWatch API server library.
//!
//! Exposes the commentary and analytics endpoints consumed by the dashboard
//! and the headless watcher.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::AnalyticsService;
pub use state::AppState;
