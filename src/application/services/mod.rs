//! Business logic services for the application layer.

pub mod rate_governor;
pub mod shortening_service;

pub use rate_governor::{GovernorSettings, RateGovernor};
pub use shortening_service::{ExpiryPolicy, ShortenerSettings, Shortened, ShorteningService};
