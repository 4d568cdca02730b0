//! URL store implementations.
//!
//! # Stores
//!
//! - [`PgUrlStore`] - PostgreSQL storage via SQLx
//! - [`MemoryUrlStore`] - Process-local map for development and tests

pub mod memory_url_store;
pub mod pg_url_store;

pub use memory_url_store::MemoryUrlStore;
pub use pg_url_store::PgUrlStore;
