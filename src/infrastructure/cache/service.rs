//! Cache service trait and error types.

use async_trait::async_trait;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Read-through cache for resolved short codes.
///
/// Records never change once written, so a cached target stays correct for as
/// long as the entry lives. Callers bound the entry TTL when expiry is enforced,
/// and anything that deletes records must [`CacheService::invalidate`] their
/// codes so a later record under the same code is not shadowed.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the target URL for a short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(url))` on cache hit
    /// - `Ok(None)` on cache miss
    ///
    /// # Errors
    ///
    /// Production implementations log failures and report a miss instead.
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>>;

    /// Stores a mapping with an optional TTL in seconds.
    ///
    /// `None` applies the implementation default; `Some` can only shorten it.
    async fn set_url(
        &self,
        short_code: &str,
        target_url: &str,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()>;

    /// Removes the entry for a short code, if any.
    ///
    /// # Errors
    ///
    /// Unlike lookups this is not fail-open: a failed delete is reported so
    /// the caller knows a stale entry may survive until its TTL.
    async fn invalidate(&self, short_code: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;

    /// Short backend name for health reporting.
    fn backend(&self) -> &'static str;
}

/// Invalidates every code in `codes`. Returns the codes whose entry could not
/// be removed.
pub async fn invalidate_codes(cache: &dyn CacheService, codes: &[String]) -> Vec<String> {
    let mut failed = Vec::new();

    for code in codes {
        if let Err(e) = cache.invalidate(code).await {
            tracing::warn!(short_code = %code, error = %e, "cache invalidation failed");
            failed.push(code.clone());
        }
    }

    failed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalidate_codes_reports_failures() {
        let mut cache = MockCacheService::new();

        cache
            .expect_invalidate()
            .withf(|code| code == "A8SlAtQ" || code == "yYTQaqz")
            .times(2)
            .returning(|_| Ok(()));

        cache
            .expect_invalidate()
            .withf(|code| code == "oldcode")
            .times(1)
            .returning(|_| Err(CacheError::OperationError("connection reset".into())));

        let codes = vec![
            "A8SlAtQ".to_string(),
            "oldcode".to_string(),
            "yYTQaqz".to_string(),
        ];

        let failed = invalidate_codes(&cache, &codes).await;
        assert_eq!(failed, vec!["oldcode".to_string()]);
    }

    #[tokio::test]
    async fn test_invalidate_codes_empty_is_noop() {
        let mut cache = MockCacheService::new();
        cache.expect_invalidate().times(0);

        assert!(invalidate_codes(&cache, &[]).await.is_empty());
    }
}
