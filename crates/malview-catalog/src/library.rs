//! Cached list source.
//!
//! Puts the list and item caches in front of the Jikan API: a fresh cache
//! short-circuits the network, a miss fetches every page and writes the
//! result back.

use std::sync::atomic::{AtomicBool, Ordering};

use malview_api::jikan::{AnimeRecord, FetchError, LocalJikanApi, UserListEntry, fetch_all_entries};
use malview_db::{Clock, ItemCache, KeyValueStore, ListCache};
use tracing::instrument;

/// Failure of a library operation.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum LibraryError {
    /// The network fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A list fetch is already running.
    #[error("a list fetch is already in progress")]
    AlreadyInFlight,
}

/// Clears the in-flight flag when the fetch finishes or fails.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then_some(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A user's list, served from cache when fresh.
#[derive(Debug)]
pub struct Library<A, S, C> {
    api: A,
    username: String,
    list_cache: ListCache<S, C>,
    item_cache: ItemCache<S, C>,
    fetching: AtomicBool,
}

impl<A, S, C> Library<A, S, C>
where
    A: LocalJikanApi + Sync,
    S: KeyValueStore,
    C: Clock,
{
    /// Creates a library for `username`.
    pub fn new(
        api: A,
        username: impl Into<String>,
        list_cache: ListCache<S, C>,
        item_cache: ItemCache<S, C>,
    ) -> Self {
        Self {
            api,
            username: username.into(),
            list_cache,
            item_cache,
            fetching: AtomicBool::new(false),
        }
    }

    /// The user whose list this is.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the list, fetching it only when the cache has no fresh copy.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Fetch` if any page fails, or
    /// `LibraryError::AlreadyInFlight` if another fetch is running.
    #[instrument(skip_all, fields(username = %self.username))]
    pub async fn get_list(&self) -> Result<Vec<UserListEntry>, LibraryError> {
        if let Some(list) = self.list_cache.read() {
            tracing::info!(count = list.len(), "using cached list");
            return Ok(list);
        }
        tracing::debug!(
            ttl_secs = self.list_cache.ttl().as_secs(),
            "list cache miss"
        );
        self.fetch_and_store().await
    }

    /// Drops the cached list and fetches it again.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_list`].
    #[instrument(skip_all, fields(username = %self.username))]
    pub async fn refresh(&self) -> Result<Vec<UserListEntry>, LibraryError> {
        self.list_cache.invalidate();
        self.fetch_and_store().await
    }

    /// Returns full details for one record, from the item cache when
    /// fresh.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Fetch` if the request fails.
    #[instrument(skip_all, fields(mal_id = mal_id))]
    pub async fn anime_details(&self, mal_id: u64) -> Result<AnimeRecord, LibraryError> {
        if let Some(record) = self.item_cache.get(mal_id) {
            return Ok(record);
        }
        let record = self.api.anime_by_id(mal_id).await?;
        self.item_cache.set(mal_id, &record);
        Ok(record)
    }

    /// Clears both caches.
    pub fn invalidate(&self) {
        self.list_cache.invalidate();
        self.item_cache.clear();
        tracing::info!("caches cleared");
    }

    async fn fetch_and_store(&self) -> Result<Vec<UserListEntry>, LibraryError> {
        let _guard = InFlightGuard::acquire(&self.fetching).ok_or(LibraryError::AlreadyInFlight)?;
        let entries = fetch_all_entries(&self.api, &self.username).await?;
        self.list_cache.write(&entries);
        Ok(entries)
    }
}
