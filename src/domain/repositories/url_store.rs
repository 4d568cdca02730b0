//! Store trait for short URL records.

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use async_trait::async_trait;

/// Failures reported by a [`UrlStore`].
///
/// `DuplicateKey` is kept distinct so the shortening service can resolve a lost
/// insert race by re-reading, instead of string-matching driver errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("short code '{0}' already exists")]
    DuplicateKey(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable mapping of short codes to target URLs.
///
/// # Contract
///
/// - `lookup` distinguishes absent (`Ok(None)`) from failure (`Err`)
/// - `insert` must reject an existing code with [`StoreError::DuplicateKey`];
///   this is what makes concurrent first-time shortens converge on one record
/// - Records are never updated through this trait
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlStore`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryUrlStore`] - In-process map
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlStore: Send + Sync {
    /// Finds a record by its short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(UrlRecord))` if found
    /// - `Ok(None)` if not found
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] on backend failures.
    async fn lookup(&self, short_code: &str) -> Result<Option<UrlRecord>, StoreError>;

    /// Inserts a new record, stamping creation time and expiry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if the code already exists.
    /// Returns [`StoreError::Unavailable`] on backend failures.
    async fn insert(&self, new_record: NewUrlRecord) -> Result<UrlRecord, StoreError>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
