//! HTTP middleware for request processing and protection.
//!
//! Provides rate limiting, CORS, request metrics and tracing middleware.

pub mod cors;
pub mod rate_limit;
pub mod request_metrics;
pub mod tracing;
