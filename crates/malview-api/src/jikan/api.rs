//! `JikanApi` trait definition.
#![allow(clippy::future_not_send)]

use super::error::FetchError;
use super::types::{AnimeRecord, ListPage};

/// Jikan API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(JikanApi: Send)]
pub trait LocalJikanApi {
    /// Fetches one page of a user's anime list (pages start at 1).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the API answers with a
    /// non-success status, or the envelope cannot be decoded.
    async fn user_anime_list_page(&self, username: &str, page: u32) -> Result<ListPage, FetchError>;

    /// Fetches full details for a single record.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the API answers with a
    /// non-success status, or the envelope cannot be decoded.
    async fn anime_by_id(&self, mal_id: u64) -> Result<AnimeRecord, FetchError>;
}
