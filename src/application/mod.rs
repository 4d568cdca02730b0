//! Application layer services implementing business logic.
//!
//! Services consume the store and cache traits and expose the operations
//! HTTP handlers call.
//!
//! # Available Services
//!
//! - [`services::shortening_service::ShorteningService`] - Short link creation and resolution
//! - [`services::rate_governor::RateGovernor`] - Per-client admission control

pub mod services;
