//! Utility functions for code derivation, URL validation, and request handling.
//!
//! - [`code_generator`] - Deterministic short code derivation
//! - [`url_validator`] - Target URL validation
//! - [`client_ip`] - Client identity extraction from requests
//! - [`db_error`] - sqlx error classification

pub mod client_ip;
pub mod code_generator;
pub mod db_error;
pub mod url_validator;
