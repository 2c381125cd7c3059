//! API handlers.

pub mod analytics;
pub mod commentary;
pub mod health;

pub use health::{health, ready};
