//! Jikan API client module.
//!
//! Handles HTTP requests to the Jikan v4 REST API and walks the
//! paginated `users/{username}/animelist` resource.

mod api;
mod client;
mod error;
mod fetch;
mod rate_limiter;
mod types;
mod wire;

#[allow(clippy::module_name_repetitions)]
pub use api::{JikanApi, LocalJikanApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{JikanClient, JikanClientBuilder};
pub use error::FetchError;
pub use fetch::fetch_all_entries;
#[allow(clippy::module_name_repetitions)]
pub use rate_limiter::JikanRateLimiter;
pub use types::{
    AnimeRecord, Genre, ImageUrls, Images, ListPage, MediaType, ParseEnumError, UserListEntry,
    UserListStatus, WatchStatus,
};
