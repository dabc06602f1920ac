//! Query cache
//!
//! In-memory cache of query results keyed by [`QueryKey`]. Invalidating a
//! key prefix marks the matching entries stale and refetches them through a
//! [`QueryFetcher`].
//!
//! Each entry sits behind its own async mutex, so there is at most one
//! writer per key: concurrent fetches or invalidations of the same key run
//! one after another, while different keys proceed independently.

use anyhow::Result;
use async_trait::async_trait;
use campus_core::QueryKey;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use crate::error::InvalidationFailure;
use crate::repository::QueryFetcher;
use crate::scheduler::Invalidator;

/// Snapshot of a cached query
#[derive(Debug, Clone, PartialEq)]
pub struct CachedQuery {
    pub data: serde_json::Value,
    pub fetched_at: DateTime<Utc>,
    /// Set while a refetch is pending or after a failed refetch
    pub stale: bool,
}

#[derive(Debug, Default)]
struct Slot {
    entry: Option<CachedQuery>,
}

type SharedSlot = Arc<tokio::sync::Mutex<Slot>>;

/// Cache of query results that refetches on invalidation
pub struct QueryCache {
    fetcher: Arc<dyn QueryFetcher>,
    slots: Mutex<HashMap<QueryKey, SharedSlot>>,
}

impl QueryCache {
    pub fn new(fetcher: Arc<dyn QueryFetcher>) -> Self {
        Self {
            fetcher,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached data for `key`, fetching it if missing or stale
    pub async fn fetch(&self, key: &QueryKey) -> Result<serde_json::Value> {
        let slot = self.slot(key);
        let mut slot = slot.lock().await;

        if let Some(entry) = slot.entry.as_ref().filter(|entry| !entry.stale) {
            return Ok(entry.data.clone());
        }

        let data = self.fetcher.fetch(key).await?;
        slot.entry = Some(CachedQuery {
            data: data.clone(),
            fetched_at: Utc::now(),
            stale: false,
        });

        Ok(data)
    }

    /// Snapshot of the entry for `key`, if it has been fetched
    ///
    /// Returns `None` while a writer holds the entry.
    pub fn get(&self, key: &QueryKey) -> Option<CachedQuery> {
        let slot = self.lock_slots().get(key).cloned()?;
        let slot = slot.try_lock().ok()?;
        slot.entry.clone()
    }

    /// Marks every entry under `prefix` stale and refetches it
    ///
    /// Returns the number of entries refreshed. Keys that were never fetched
    /// are not touched, so an unknown prefix resolves with 0. A key whose
    /// first fetch failed is fetched again. The first failing refetch aborts
    /// the call and leaves its entry stale (or empty).
    pub async fn invalidate(&self, prefix: &QueryKey) -> Result<usize> {
        let matching: Vec<(QueryKey, SharedSlot)> = self
            .lock_slots()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, slot)| (key.clone(), Arc::clone(slot)))
            .collect();

        let mut refreshed = 0;

        for (key, slot) in matching {
            let mut slot = slot.lock().await;
            if let Some(entry) = slot.entry.as_mut() {
                entry.stale = true;
            }

            let data = self.fetcher.fetch(&key).await?;
            slot.entry = Some(CachedQuery {
                data,
                fetched_at: Utc::now(),
                stale: false,
            });

            debug!("Refreshed cached query '{}'", key);
            refreshed += 1;
        }

        Ok(refreshed)
    }

    /// Drops the entry for `key`
    pub fn remove(&self, key: &QueryKey) -> bool {
        self.lock_slots().remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock_slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_slots().is_empty()
    }

    fn slot(&self, key: &QueryKey) -> SharedSlot {
        Arc::clone(self.lock_slots().entry(key.clone()).or_default())
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<QueryKey, SharedSlot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Invalidator for QueryCache {
    async fn invalidate(&self, key: &QueryKey) -> Result<(), InvalidationFailure> {
        QueryCache::invalidate(self, key).await?;
        Ok(())
    }
}
