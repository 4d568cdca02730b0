//! In-process implementation of the URL store.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::domain::repositories::{StoreError, UrlStore};

/// Map-backed store living for the lifetime of the process.
///
/// Selected with `STORE_BACKEND=memory` and used by integration tests. The
/// write lock covers the check-and-insert, giving the same duplicate-key
/// guarantee as the database primary key.
#[derive(Default)]
pub struct MemoryUrlStore {
    records: RwLock<HashMap<String, UrlRecord>>,
}

impl MemoryUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a fully-formed record, replacing any existing one.
    ///
    /// Seeds fixtures such as already-expired records.
    pub fn put(&self, record: UrlRecord) {
        self.records.write().insert(record.short_code.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl UrlStore for MemoryUrlStore {
    async fn lookup(&self, short_code: &str) -> Result<Option<UrlRecord>, StoreError> {
        Ok(self.records.read().get(short_code).cloned())
    }

    async fn insert(&self, new_record: NewUrlRecord) -> Result<UrlRecord, StoreError> {
        let mut records = self.records.write();

        match records.entry(new_record.short_code) {
            Entry::Occupied(occupied) => Err(StoreError::DuplicateKey(occupied.key().clone())),
            Entry::Vacant(vacant) => {
                let created_at = Utc::now();
                let expires_at = Duration::try_days(i64::from(new_record.ttl_days))
                    .and_then(|ttl| created_at.checked_add_signed(ttl))
                    .ok_or_else(|| {
                        StoreError::Unavailable(format!(
                            "ttl of {} days is out of range",
                            new_record.ttl_days
                        ))
                    })?;
                let record = UrlRecord::new(
                    vacant.key().clone(),
                    new_record.target_url,
                    created_at,
                    expires_at,
                );
                vacant.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
