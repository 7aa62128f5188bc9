//! API client library for malview.
//!
//! Provides a rate-limited client for the Jikan v4 API (an unofficial
//! read-only `MyAnimeList` mirror) and the paginated user list fetcher.

/// Jikan API client.
pub mod jikan;
