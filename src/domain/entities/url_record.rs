//! Short URL record entity.

use chrono::{DateTime, Duration, Utc};

/// A stored mapping from a short code to its target URL.
///
/// Records are created once on the first successful shorten of a code and are
/// never mutated afterwards. `expires_at` is metadata; whether it is enforced on
/// resolve depends on the configured [`ExpiryPolicy`](crate::application::services::ExpiryPolicy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub short_code: String,
    pub target_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl UrlRecord {
    /// Creates a new UrlRecord instance.
    pub fn new(
        short_code: String,
        target_url: String,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            short_code,
            target_url,
            created_at,
            expires_at,
        }
    }

    /// Returns true if the record's expiry horizon is at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Returns true if the record has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Time left until expiry, or `None` once expired.
    pub fn remaining_ttl(&self, now: DateTime<Utc>) -> Option<Duration> {
        let remaining = self.expires_at - now;
        (remaining > Duration::zero()).then_some(remaining)
    }
}

/// Input data for inserting a new record.
///
/// The store stamps `created_at` and derives `expires_at = created_at + ttl_days`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrlRecord {
    pub short_code: String,
    pub target_url: String,
    pub ttl_days: u32,
}
