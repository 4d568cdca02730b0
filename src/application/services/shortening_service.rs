//! Short link creation and resolution service.

use chrono::Utc;
use serde_json::json;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::domain::repositories::{StoreError, UrlStore};
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::{CodeGenerator, is_valid_short_code};
use crate::utils::url_validator::validate_url;

/// Whether `expires_at` is honoured on resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// Expired records still resolve; expiry is informational.
    #[default]
    Advisory,
    /// Expired records resolve to [`AppError::Expired`].
    Enforce,
}

impl FromStr for ExpiryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "advisory" => Ok(Self::Advisory),
            "enforce" => Ok(Self::Enforce),
            other => Err(format!(
                "expiry policy must be 'advisory' or 'enforce', got '{other}'"
            )),
        }
    }
}

/// Tuning for a [`ShorteningService`].
#[derive(Debug, Clone)]
pub struct ShortenerSettings {
    /// Lifetime stamped on new records.
    pub ttl_days: u32,
    /// Upper bound on every store call.
    pub store_timeout: Duration,
    pub expiry_policy: ExpiryPolicy,
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self {
            ttl_days: 7,
            store_timeout: Duration::from_secs(3),
            expiry_policy: ExpiryPolicy::Advisory,
        }
    }
}

/// Outcome of a successful shorten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortened {
    pub code: String,
    /// True if this call inserted the record, false if it already existed.
    pub created: bool,
}

/// Service for creating and resolving short links.
///
/// Codes are derived from the URL, so shortening is an idempotent
/// create-or-get: the first call for a URL inserts one record and every later
/// call returns the same code without touching the store's contents.
///
/// # Collisions
///
/// Distinct URLs can truncate to the same code. When the stored URL differs
/// from the requested one the service fails with [`AppError::Collision`]; it
/// never overwrites the record or hands out a code that resolves elsewhere.
///
/// # Timeouts
///
/// Every store call is bounded by [`ShortenerSettings::store_timeout`] and
/// surfaces [`AppError::StoreUnavailable`] when exceeded. Dropping a returned
/// future cancels the in-flight store call.
pub struct ShorteningService {
    store: Arc<dyn UrlStore>,
    cache: Arc<dyn CacheService>,
    generator: Arc<dyn CodeGenerator>,
    settings: ShortenerSettings,
}

impl ShorteningService {
    /// Creates a new shortening service.
    pub fn new(
        store: Arc<dyn UrlStore>,
        cache: Arc<dyn CacheService>,
        generator: Arc<dyn CodeGenerator>,
        settings: ShortenerSettings,
    ) -> Self {
        Self {
            store,
            cache,
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &ShortenerSettings {
        &self.settings
    }

    /// Shortens `url`, returning its code and whether a record was created.
    ///
    /// # Flow
    ///
    /// 1. Validate and trim the URL
    /// 2. Derive the code
    /// 3. Existing record with the same URL: return it (`created = false`)
    /// 4. No record: insert with the configured TTL (`created = true`)
    /// 5. Insert lost a race (duplicate key): re-read and apply step 3
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for malformed, oversized or private URLs
    /// - [`AppError::Collision`] if the code is bound to a different URL
    /// - [`AppError::Expired`] under [`ExpiryPolicy::Enforce`] if the URL's
    ///   record has expired; records are never renewed, so the code stays
    ///   dead until an operator purges it
    /// - [`AppError::StoreUnavailable`] on backend failure or timeout
    pub async fn shorten(&self, url: &str) -> Result<Shortened, AppError> {
        let target_url = validate_url(url)?;
        let code = self.generator.derive(&target_url);

        if let Some(existing) = self.lookup(&code).await? {
            return self.reconcile(existing, &target_url);
        }

        let new_record = NewUrlRecord {
            short_code: code.clone(),
            target_url: target_url.clone(),
            ttl_days: self.settings.ttl_days,
        };

        match self.bounded("insert", self.store.insert(new_record)).await? {
            Ok(record) => {
                info!(code = %record.short_code, expires_at = %record.expires_at, "short link created");
                metrics::counter!("shorten_requests_total", "outcome" => "created").increment(1);
                Ok(Shortened {
                    code: record.short_code,
                    created: true,
                })
            }
            Err(StoreError::DuplicateKey(_)) => {
                debug!(%code, "concurrent insert won, re-reading");
                match self.lookup(&code).await? {
                    Some(existing) => self.reconcile(existing, &target_url),
                    None => Err(AppError::StoreUnavailable(format!(
                        "short code '{code}' reported as duplicate but could not be read back"
                    ))),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolves a short code to its target URL.
    ///
    /// Codes that could not have been issued are rejected without a store
    /// lookup. Hits are served from the cache; misses read the store and
    /// populate the cache.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] for unknown codes
    /// - [`AppError::Expired`] for expired records under [`ExpiryPolicy::Enforce`]
    /// - [`AppError::StoreUnavailable`] on backend failure or timeout
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        if !is_valid_short_code(code) {
            return Err(not_found(code));
        }

        match self.cache.get_url(code).await {
            Ok(Some(url)) => {
                metrics::counter!("resolve_requests_total", "source" => "cache").increment(1);
                return Ok(url);
            }
            Ok(None) => {}
            Err(e) => warn!(%code, error = %e, "cache lookup failed, falling back to store"),
        }

        let record = self.lookup(code).await?.ok_or_else(|| not_found(code))?;

        let cache_ttl = match self.settings.expiry_policy {
            ExpiryPolicy::Advisory => None,
            ExpiryPolicy::Enforce => match record.remaining_ttl(Utc::now()) {
                Some(remaining) => Some(remaining.num_seconds().max(1) as u64),
                None => {
                    metrics::counter!("resolve_requests_total", "source" => "expired").increment(1);
                    return Err(AppError::Expired {
                        code: code.to_string(),
                    });
                }
            },
        };

        if let Err(e) = self
            .cache
            .set_url(code, &record.target_url, cache_ttl)
            .await
        {
            warn!(%code, error = %e, "failed to cache resolved url");
        }

        metrics::counter!("resolve_requests_total", "source" => "store").increment(1);
        Ok(record.target_url)
    }

    /// Reports whether the backing store is reachable within the timeout.
    pub async fn store_healthy(&self) -> bool {
        matches!(self.bounded("ping", self.store.ping()).await, Ok(Ok(())))
    }

    pub async fn cache_healthy(&self) -> bool {
        self.cache.health_check().await
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend()
    }

    fn reconcile(&self, existing: UrlRecord, target_url: &str) -> Result<Shortened, AppError> {
        if existing.target_url == target_url {
            if self.settings.expiry_policy == ExpiryPolicy::Enforce
                && existing.is_expired_at(Utc::now())
            {
                warn!(
                    code = %existing.short_code,
                    expires_at = %existing.expires_at,
                    "refusing to hand out an expired short link"
                );
                metrics::counter!("shorten_requests_total", "outcome" => "expired").increment(1);
                return Err(AppError::Expired {
                    code: existing.short_code,
                });
            }

            metrics::counter!("shorten_requests_total", "outcome" => "existing").increment(1);
            return Ok(Shortened {
                code: existing.short_code,
                created: false,
            });
        }

        error!(
            code = %existing.short_code,
            stored_url = %existing.target_url,
            requested_url = %target_url,
            "short code collision: derived code is bound to a different url"
        );
        metrics::counter!("shorten_requests_total", "outcome" => "collision").increment(1);

        Err(AppError::Collision {
            code: existing.short_code,
        })
    }

    async fn lookup(&self, code: &str) -> Result<Option<UrlRecord>, AppError> {
        Ok(self.bounded("lookup", self.store.lookup(code)).await??)
    }

    /// Runs a store call under the configured timeout.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, AppError>
    where
        F: Future<Output = T>,
    {
        let limit = self.settings.store_timeout;

        tokio::time::timeout(limit, call).await.map_err(|_| {
            warn!(operation, timeout_ms = limit.as_millis() as u64, "store call timed out");
            AppError::StoreUnavailable(format!("{operation} timed out after {limit:?}"))
        })
    }
}

fn not_found(code: &str) -> AppError {
    AppError::not_found(
        "the requested resource could not be found",
        json!({ "code": code }),
    )
}
