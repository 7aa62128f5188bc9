//! Favorites list.
//!
//! Favorites are user data, not a cache: storage failures are returned to
//! the caller instead of being swallowed.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use malview_api::jikan::AnimeRecord;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::kv::KeyValueStore;

/// Storage key of the favorites array.
pub const FAVORITES_KEY: &str = "malview-anime-favorites";

/// A favorited record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    /// The record as it was when favorited.
    pub anime: AnimeRecord,
    /// When it was added.
    pub added_at: DateTime<Utc>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Persistent favorites, in insertion order.
#[derive(Debug)]
pub struct FavoritesStore<S, C> {
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S: KeyValueStore, C: Clock> FavoritesStore<S, C> {
    /// Creates a favorites store over the given medium.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Returns all favorites.
    ///
    /// A corrupt payload is logged and read as an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read.
    pub fn list(&self) -> Result<Vec<Favorite>> {
        let Some(raw) = self
            .store
            .get(FAVORITES_KEY)
            .context("failed to read favorites")?
        else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(favorites) => Ok(favorites),
            Err(e) => {
                tracing::warn!(error = %e, "favorites payload is corrupt, starting empty");
                Ok(Vec::new())
            }
        }
    }

    /// Adds a record, replacing an existing favorite with the same ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read or written.
    pub fn add(&self, anime: AnimeRecord, notes: Option<String>) -> Result<()> {
        let mut favorites = self.list()?;
        favorites.retain(|f| f.anime.mal_id != anime.mal_id);
        tracing::info!(mal_id = anime.mal_id, title = %anime.title, "favorite added");
        favorites.push(Favorite {
            anime,
            added_at: self.clock.now(),
            notes,
        });
        self.save(&favorites)
    }

    /// Removes a favorite. Returns `false` if it was not present.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read or written.
    pub fn remove(&self, mal_id: u64) -> Result<bool> {
        let mut favorites = self.list()?;
        let before = favorites.len();
        favorites.retain(|f| f.anime.mal_id != mal_id);
        if favorites.len() == before {
            return Ok(false);
        }
        self.save(&favorites)?;
        tracing::info!(mal_id = mal_id, "favorite removed");
        Ok(true)
    }

    /// Returns `true` if the record is a favorite.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read.
    pub fn is_favorite(&self, mal_id: u64) -> Result<bool> {
        Ok(self.list()?.iter().any(|f| f.anime.mal_id == mal_id))
    }

    /// Replaces the notes of a favorite. Returns `false` if it was not
    /// present.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read or written.
    pub fn update_notes(&self, mal_id: u64, notes: Option<String>) -> Result<bool> {
        let mut favorites = self.list()?;
        let Some(favorite) = favorites.iter_mut().find(|f| f.anime.mal_id == mal_id) else {
            return Ok(false);
        };
        favorite.notes = notes;
        self.save(&favorites)?;
        Ok(true)
    }

    fn save(&self, favorites: &[Favorite]) -> Result<()> {
        let payload =
            serde_json::to_string(favorites).context("failed to serialise favorites")?;
        self.store
            .set(FAVORITES_KEY, &payload)
            .context("failed to write favorites")
    }
}
