//! PostgreSQL implementation of the URL store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::domain::repositories::{StoreError, UrlStore};
use crate::utils::db_error::is_unique_violation;

#[derive(sqlx::FromRow)]
struct UrlRow {
    short_code: String,
    target_url: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<UrlRow> for UrlRecord {
    fn from(row: UrlRow) -> Self {
        UrlRecord::new(row.short_code, row.target_url, row.created_at, row.expires_at)
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

/// PostgreSQL store for short URL records.
///
/// Duplicate detection relies on the `short_urls` primary key, so concurrent
/// inserts of the same code are serialized by the database.
pub struct PgUrlStore {
    pool: Arc<PgPool>,
}

impl PgUrlStore {
    /// Creates a new store with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Counts all stored records.
    pub async fn count_all(&self) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM short_urls")
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(unavailable)
    }

    /// Counts records whose expiry has passed.
    pub async fn count_expired(&self) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM short_urls WHERE expires_at <= NOW()")
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(unavailable)
    }

    /// Deletes records whose expiry has passed. Returns the removed codes so
    /// their cache entries can be invalidated.
    ///
    /// Operator maintenance only; the service itself never deletes records.
    pub async fn purge_expired(&self) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar::<_, String>(
            "DELETE FROM short_urls WHERE expires_at <= NOW() RETURNING short_code",
        )
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(unavailable)
    }
}

#[async_trait]
impl UrlStore for PgUrlStore {
    async fn lookup(&self, short_code: &str) -> Result<Option<UrlRecord>, StoreError> {
        let row = sqlx::query_as::<_, UrlRow>(
            r#"
            SELECT short_code, target_url, created_at, expires_at
            FROM short_urls
            WHERE short_code = $1
            "#,
        )
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(unavailable)?;

        Ok(row.map(UrlRecord::from))
    }

    async fn insert(&self, new_record: NewUrlRecord) -> Result<UrlRecord, StoreError> {
        let ttl_days = i32::try_from(new_record.ttl_days).unwrap_or(i32::MAX);

        let row = sqlx::query_as::<_, UrlRow>(
            r#"
            INSERT INTO short_urls (short_code, target_url, created_at, expires_at)
            VALUES ($1, $2, NOW(), NOW() + make_interval(days => $3))
            RETURNING short_code, target_url, created_at, expires_at
            "#,
        )
        .bind(&new_record.short_code)
        .bind(&new_record.target_url)
        .bind(ttl_days)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateKey(new_record.short_code.clone())
            } else {
                unavailable(e)
            }
        })?;

        Ok(row.into())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .map_err(unavailable)?;

        Ok(())
    }
}
