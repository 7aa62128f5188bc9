//! Per-item detail cache.
//!
//! All items share one storage key holding a JSON object keyed by
//! `mal_id`. Expired items are evicted lazily when they are next read.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use malview_api::jikan::AnimeRecord;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, age};
use crate::error::CacheError;
use crate::kv::KeyValueStore;

/// Storage key of the item map.
pub const ITEM_CACHE_KEY: &str = "malview-anime-item-cache";

/// Default freshness window (30 minutes).
pub const DEFAULT_ITEM_TTL: Duration = Duration::from_secs(30 * 60);

/// A cached record and its write time (epoch milliseconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedItem {
    data: AnimeRecord,
    timestamp: i64,
}

type ItemMap = BTreeMap<u64, CachedItem>;

/// Detail records keyed by `mal_id`, each with its own write time.
#[derive(Debug)]
pub struct ItemCache<S, C> {
    store: Arc<S>,
    clock: Arc<C>,
    ttl: Duration,
}

impl<S: KeyValueStore, C: Clock> ItemCache<S, C> {
    /// Creates a cache with the default window.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            store,
            clock,
            ttl: DEFAULT_ITEM_TTL,
        }
    }

    /// Overrides the freshness window.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the record if it was stored within the window.
    ///
    /// An expired record is removed before reporting the miss.
    pub fn get(&self, mal_id: u64) -> Option<AnimeRecord> {
        let mut items = self.load_or_empty();
        let item = items.get(&mal_id)?;

        let fresh = DateTime::from_timestamp_millis(item.timestamp)
            .is_some_and(|written_at| age(self.clock.now(), written_at) <= self.ttl);
        if fresh {
            tracing::debug!(mal_id = mal_id, "item cache hit");
            return Some(item.data.clone());
        }

        tracing::debug!(mal_id = mal_id, "item cache entry expired, evicting");
        items.remove(&mal_id);
        self.save_logged(&items);
        None
    }

    /// Stores a record with the current time, replacing any previous one.
    pub fn set(&self, mal_id: u64, record: &AnimeRecord) {
        let mut items = self.load_or_empty();
        items.insert(
            mal_id,
            CachedItem {
                data: record.clone(),
                timestamp: self.clock.now().timestamp_millis(),
            },
        );
        self.save_logged(&items);
    }

    /// Removes one record.
    pub fn remove(&self, mal_id: u64) {
        let mut items = self.load_or_empty();
        if items.remove(&mal_id).is_some() {
            self.save_logged(&items);
        }
    }

    /// Removes every record.
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(ITEM_CACHE_KEY) {
            tracing::warn!(error = ?e, "item cache clear failed");
        }
    }

    /// Number of stored records, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.load_or_empty().len()
    }

    /// Returns `true` when no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn load_or_empty(&self) -> ItemMap {
        self.try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "item cache read failed, treating as empty");
            ItemMap::new()
        })
    }

    fn try_load(&self) -> Result<ItemMap, CacheError> {
        let Some(raw) = self.store.get(ITEM_CACHE_KEY).map_err(CacheError::Storage)? else {
            return Ok(ItemMap::new());
        };
        serde_json::from_str(&raw).map_err(|source| CacheError::Corrupt {
            key: ITEM_CACHE_KEY,
            source,
        })
    }

    fn try_save(&self, items: &ItemMap) -> Result<(), CacheError> {
        let payload = serde_json::to_string(items).map_err(CacheError::Serialize)?;
        self.store
            .set(ITEM_CACHE_KEY, &payload)
            .map_err(CacheError::Storage)
    }

    fn save_logged(&self, items: &ItemMap) {
        if let Err(e) = self.try_save(items) {
            tracing::warn!(error = %e, "item cache write failed");
        }
    }
}
