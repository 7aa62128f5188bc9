//! User list snapshot cache.
//!
//! The snapshot lives under two keys: the JSON payload and the write time
//! in epoch milliseconds. Both are written in one atomic step.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::DateTime;
use malview_api::jikan::UserListEntry;

use crate::clock::{Clock, age};
use crate::error::CacheError;
use crate::kv::KeyValueStore;

/// Storage key of the list payload.
pub const LIST_CACHE_KEY: &str = "malview-anime-cache";

/// Storage key of the write timestamp (epoch milliseconds).
pub const LIST_CACHE_TIME_KEY: &str = "malview-anime-cache-time";

/// Default freshness window (1 hour).
pub const DEFAULT_LIST_TTL: Duration = Duration::from_secs(60 * 60);

/// Time-stamped snapshot of the user list.
#[derive(Debug)]
pub struct ListCache<S, C> {
    store: Arc<S>,
    clock: Arc<C>,
    ttl: Duration,
    invalidated: AtomicBool,
}

impl<S: KeyValueStore, C: Clock> ListCache<S, C> {
    /// Creates a cache with the default window.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            store,
            clock,
            ttl: DEFAULT_LIST_TTL,
            invalidated: AtomicBool::new(false),
        }
    }

    /// Overrides the freshness window.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the freshness window.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached list if a fresh, well-formed snapshot exists.
    ///
    /// Storage failures and corrupt payloads are logged and reported as a
    /// miss.
    pub fn read(&self) -> Option<Vec<UserListEntry>> {
        if self.invalidated.load(Ordering::Acquire) {
            tracing::debug!("list cache invalidated");
            return None;
        }
        match self.try_read() {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, "list cache read failed, treating as miss");
                None
            }
        }
    }

    /// Stores the list with the current time.
    ///
    /// Each entry is reduced to its display fields before serialising.
    /// Failures are logged and swallowed.
    pub fn write(&self, entries: &[UserListEntry]) {
        match self.try_write(entries) {
            Ok(()) => {
                self.invalidated.store(false, Ordering::Release);
                tracing::info!(count = entries.len(), "list cache written");
            }
            Err(e) => tracing::warn!(error = %e, "list cache write failed"),
        }
    }

    /// Removes the snapshot; `read` reports a miss until the next `write`.
    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::Release);
        if let Err(e) = self
            .store
            .remove_many(&[LIST_CACHE_KEY, LIST_CACHE_TIME_KEY])
        {
            tracing::warn!(error = ?e, "list cache invalidate failed");
        }
    }

    fn try_read(&self) -> Result<Option<Vec<UserListEntry>>, CacheError> {
        let Some(raw_time) = self
            .store
            .get(LIST_CACHE_TIME_KEY)
            .map_err(CacheError::Storage)?
        else {
            return Ok(None);
        };
        let Some(payload) = self.store.get(LIST_CACHE_KEY).map_err(CacheError::Storage)? else {
            return Ok(None);
        };

        let written_at = raw_time
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| CacheError::Timestamp {
                key: LIST_CACHE_TIME_KEY,
                value: raw_time.clone(),
            })?;

        let age = age(self.clock.now(), written_at);
        if age > self.ttl {
            tracing::debug!(age_secs = age.as_secs(), "list cache stale");
            return Ok(None);
        }

        let entries: Vec<UserListEntry> =
            serde_json::from_str(&payload).map_err(|source| CacheError::Corrupt {
                key: LIST_CACHE_KEY,
                source,
            })?;
        tracing::debug!(count = entries.len(), age_secs = age.as_secs(), "list cache hit");
        Ok(Some(entries))
    }

    fn try_write(&self, entries: &[UserListEntry]) -> Result<(), CacheError> {
        let projected: Vec<UserListEntry> = entries.iter().map(project).collect();
        let payload = serde_json::to_string(&projected).map_err(CacheError::Serialize)?;
        let written_at = self.clock.now().timestamp_millis().to_string();

        self.store
            .set_many(&[
                (LIST_CACHE_KEY, payload.as_str()),
                (LIST_CACHE_TIME_KEY, written_at.as_str()),
            ])
            .map_err(CacheError::Storage)
    }
}

/// Reduces an entry to the fields list views display.
fn project(entry: &UserListEntry) -> UserListEntry {
    let mut projected = entry.clone();
    projected.anime.synopsis = None;
    projected
}
