//! Jikan response envelopes and list entry shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use super::types::{AnimeRecord, ListPage, UserListEntry, UserListStatus, WatchStatus};

/// Pagination descriptor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    /// Last page number.
    #[serde(default)]
    pub last_visible_page: u32,
    /// Sole continuation signal.
    #[serde(default)]
    pub has_next_page: bool,
    /// Page number of this response.
    #[serde(default)]
    pub current_page: u32,
}

/// Response from `users/{username}/animelist`.
#[derive(Debug, Deserialize)]
pub struct AnimeListResponse {
    /// Entries; `null` is treated as empty, a missing key is a decode error.
    #[serde(deserialize_with = "nullable")]
    pub data: Option<Vec<RawListEntry>>,
    /// Pagination descriptor; missing means no further pages.
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Response from `anime/{id}`.
#[derive(Debug, Deserialize)]
pub struct AnimeResponse {
    /// The record.
    pub data: AnimeRecord,
}

/// A list entry in either of the shapes the API produces.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawListEntry {
    /// `{ "anime": {...}, "watching_status": 2, "score": 8, ... }`
    Wrapped(WrappedEntry),
    /// `{ "mal_id": 1, "title": ..., "my_list_status": {...} }`
    Bare(BareEntry),
}

/// List entry with the record nested under `anime`.
#[derive(Debug, Deserialize)]
pub struct WrappedEntry {
    anime: AnimeRecord,
    #[serde(default, alias = "watching_status", deserialize_with = "lenient")]
    status: Option<WatchStatus>,
    #[serde(default)]
    score: Option<u8>,
    #[serde(default)]
    episodes_watched: Option<u32>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// List entry with the record at the top level.
#[derive(Debug, Deserialize)]
pub struct BareEntry {
    #[serde(flatten)]
    anime: AnimeRecord,
    #[serde(default, alias = "list_status", deserialize_with = "lenient")]
    my_list_status: Option<UserListStatus>,
}

/// Requires the key to be present while still accepting `null`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

/// Drops a value that does not parse instead of failing the whole page.
///
/// The list is still shown; the entry just loses its status.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    match serde_json::from_value::<T>(value.clone()) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            tracing::warn!(value = %value, error = %e, "ignoring unrecognised list status");
            Ok(None)
        }
    }
}

/// Highest valid user score.
const MAX_USER_SCORE: u8 = 10;

impl From<RawListEntry> for UserListEntry {
    fn from(raw: RawListEntry) -> Self {
        let (mut anime, list_status) = match raw {
            RawListEntry::Wrapped(w) => {
                let list_status = w.status.map(|status| UserListStatus {
                    status,
                    score: w.score.unwrap_or(0),
                    episodes_watched: w.episodes_watched.unwrap_or(0),
                    updated_at: w.updated_at,
                });
                (w.anime, list_status)
            }
            RawListEntry::Bare(b) => (b.anime, b.my_list_status),
        };

        anime.dedup_genres();
        let list_status = list_status.map(|mut s| {
            s.score = s.score.min(MAX_USER_SCORE);
            s
        });

        Self { anime, list_status }
    }
}

impl AnimeListResponse {
    /// Converts the envelope into a [`ListPage`].
    ///
    /// `requested_page` is used when the descriptor is missing.
    pub fn into_page(self, requested_page: u32) -> ListPage {
        let entries: Vec<UserListEntry> = self
            .data
            .unwrap_or_default()
            .into_iter()
            .map(UserListEntry::from)
            .collect();

        match self.pagination {
            Some(p) => ListPage {
                entries,
                has_next_page: p.has_next_page,
                current_page: if p.current_page == 0 {
                    requested_page
                } else {
                    p.current_page
                },
                last_visible_page: Some(p.last_visible_page),
            },
            None => ListPage {
                entries,
                has_next_page: false,
                current_page: requested_page,
                last_visible_page: None,
            },
        }
    }
}
