//! API services.

pub mod analytics;

pub use analytics::AnalyticsService;
