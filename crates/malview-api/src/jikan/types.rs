//! Jikan domain types shared by the fetcher, caches and views.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error returned when a status or media type label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enumeration was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

// --- Media type ---

/// Media type of a catalog entry.
///
/// Parsing is case-insensitive. `null` and unrecognised labels coming from
/// the API map to [`MediaType::Unknown`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum MediaType {
    /// TV series.
    Tv,
    /// Theatrical movie.
    Movie,
    /// Original video animation.
    Ova,
    /// Special episode.
    Special,
    /// Original net animation.
    Ona,
    /// Music video.
    Music,
    /// Missing or unrecognised.
    #[default]
    Unknown,
}

impl MediaType {
    /// All known media types, in display order.
    pub const ALL: [Self; 7] = [
        Self::Tv,
        Self::Movie,
        Self::Ova,
        Self::Special,
        Self::Ona,
        Self::Music,
        Self::Unknown,
    ];

    /// Returns the canonical label (`"TV"`, `"OVA"`, ...).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tv => "TV",
            Self::Movie => "Movie",
            Self::Ova => "OVA",
            Self::Special => "Special",
            Self::Ona => "ONA",
            Self::Music => "Music",
            Self::Unknown => "Unknown",
        }
    }

    /// Maps a label to a known media type, if any.
    fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tv" => Some(Self::Tv),
            "movie" => Some(Self::Movie),
            "ova" => Some(Self::Ova),
            "special" => Some(Self::Special),
            "ona" => Some(Self::Ona),
            "music" => Some(Self::Music),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl From<Option<String>> for MediaType {
    fn from(value: Option<String>) -> Self {
        value
            .as_deref()
            .and_then(Self::from_label)
            .unwrap_or(Self::Unknown)
    }
}

impl From<MediaType> for Option<String> {
    fn from(value: MediaType) -> Self {
        match value {
            MediaType::Unknown => None,
            known => Some(String::from(known.label())),
        }
    }
}

impl FromStr for MediaType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| ParseEnumError {
            kind: "media type",
            value: String::from(s),
        })
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// --- Watch status ---

/// A user's watch status for a list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawWatchStatus", into = "String")]
pub enum WatchStatus {
    /// Currently watching.
    Watching,
    /// Finished.
    Completed,
    /// Paused.
    OnHold,
    /// Abandoned.
    Dropped,
    /// Not started yet.
    PlanToWatch,
}

/// Wire representation of a watch status: Jikan uses numeric codes on some
/// endpoints and strings on others.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawWatchStatus {
    Code(u8),
    Name(String),
}

impl WatchStatus {
    /// All statuses, in display order.
    pub const ALL: [Self; 5] = [
        Self::Watching,
        Self::Completed,
        Self::OnHold,
        Self::Dropped,
        Self::PlanToWatch,
    ];

    /// Returns the snake case identifier (`"on_hold"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Watching => "watching",
            Self::Completed => "completed",
            Self::OnHold => "on_hold",
            Self::Dropped => "dropped",
            Self::PlanToWatch => "plan_to_watch",
        }
    }

    /// Returns the human readable label (`"On Hold"`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Watching => "Watching",
            Self::Completed => "Completed",
            Self::OnHold => "On Hold",
            Self::Dropped => "Dropped",
            Self::PlanToWatch => "Plan to Watch",
        }
    }

    /// Maps a Jikan numeric status code.
    const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Watching),
            2 => Some(Self::Completed),
            3 => Some(Self::OnHold),
            4 => Some(Self::Dropped),
            6 => Some(Self::PlanToWatch),
            _ => None,
        }
    }
}

impl TryFrom<RawWatchStatus> for WatchStatus {
    type Error = ParseEnumError;

    fn try_from(value: RawWatchStatus) -> Result<Self, Self::Error> {
        match value {
            RawWatchStatus::Code(code) => Self::from_code(code).ok_or_else(|| ParseEnumError {
                kind: "watch status code",
                value: code.to_string(),
            }),
            RawWatchStatus::Name(name) => name.parse(),
        }
    }
}

impl From<WatchStatus> for String {
    fn from(value: WatchStatus) -> Self {
        Self::from(value.as_str())
    }
}

impl FromStr for WatchStatus {
    type Err = ParseEnumError;

    /// Accepts `on_hold`, `On-Hold`, `on hold`, `Plan to Watch`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "watching" => Ok(Self::Watching),
            "completed" => Ok(Self::Completed),
            "on_hold" | "onhold" => Ok(Self::OnHold),
            "dropped" => Ok(Self::Dropped),
            "plan_to_watch" | "plantowatch" => Ok(Self::PlanToWatch),
            _ => Err(ParseEnumError {
                kind: "watch status",
                value: String::from(s),
            }),
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// --- Anime record ---

/// A genre tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    /// `MyAnimeList` genre ID.
    #[serde(alias = "id")]
    pub mal_id: u32,
    /// Genre name.
    pub name: String,
    /// Tag kind (`"anime"`), if reported.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Genre page URL, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Image URLs in one encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrls {
    /// Default size.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Thumbnail size.
    #[serde(default)]
    pub small_image_url: Option<String>,
    /// Large size.
    #[serde(default)]
    pub large_image_url: Option<String>,
}

/// Image URL set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Images {
    /// JPEG variants.
    #[serde(default)]
    pub jpg: Option<ImageUrls>,
    /// `WebP` variants.
    #[serde(default)]
    pub webp: Option<ImageUrls>,
}

impl Images {
    /// Returns the best available cover URL (large `WebP`, then large JPEG,
    /// then any default size).
    #[must_use]
    pub fn best_url(&self) -> Option<&str> {
        fn large(urls: &Option<ImageUrls>) -> Option<&str> {
            urls.as_ref()
                .and_then(|u| u.large_image_url.as_deref())
                .filter(|s| !s.is_empty())
        }
        fn default(urls: &Option<ImageUrls>) -> Option<&str> {
            urls.as_ref()
                .and_then(|u| u.image_url.as_deref())
                .filter(|s| !s.is_empty())
        }
        large(&self.webp)
            .or_else(|| large(&self.jpg))
            .or_else(|| default(&self.webp))
            .or_else(|| default(&self.jpg))
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeRecord {
    /// `MyAnimeList` ID (stable, assigned remotely).
    #[serde(alias = "id")]
    pub mal_id: u64,
    /// Display title.
    pub title: String,
    /// English title.
    #[serde(default)]
    pub title_english: Option<String>,
    /// Japanese title.
    #[serde(default)]
    pub title_japanese: Option<String>,
    /// Cover images.
    #[serde(default)]
    pub images: Images,
    /// Mean community score.
    #[serde(default, alias = "mean")]
    pub score: Option<f64>,
    /// Media type.
    #[serde(rename = "type", alias = "media_type", default)]
    pub media_type: MediaType,
    /// Episode count, when known.
    #[serde(default, alias = "num_episodes")]
    pub episodes: Option<u32>,
    /// Synopsis.
    #[serde(default)]
    pub synopsis: Option<String>,
    /// Genre tags, unique by ID.
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// Detail page URL.
    #[serde(default)]
    pub url: String,
}

impl AnimeRecord {
    /// Removes genres whose ID was already seen, keeping the first occurrence.
    pub fn dedup_genres(&mut self) {
        let mut seen = HashSet::new();
        self.genres.retain(|g| seen.insert(g.mal_id));
    }

    /// Returns `true` if any genre carries the given name (ASCII
    /// case-insensitive).
    #[must_use]
    pub fn has_genre(&self, name: &str) -> bool {
        self.genres.iter().any(|g| g.name.eq_ignore_ascii_case(name))
    }
}

// --- User list ---

/// A user's tracking state for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserListStatus {
    /// Watch status.
    pub status: WatchStatus,
    /// User score, 0 meaning unrated.
    #[serde(default)]
    pub score: u8,
    /// Episodes watched. May exceed the record's episode count.
    #[serde(default, alias = "num_episodes_watched")]
    pub episodes_watched: u32,
    /// Last time the user touched this entry.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One entry of a user's anime list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserListEntry {
    /// The catalog record.
    pub anime: AnimeRecord,
    /// The user's tracking state, if any.
    #[serde(default)]
    pub list_status: Option<UserListStatus>,
}

impl UserListEntry {
    /// Creates an entry.
    #[must_use]
    pub const fn new(anime: AnimeRecord, list_status: Option<UserListStatus>) -> Self {
        Self { anime, list_status }
    }

    /// Returns the watch status, if any.
    #[must_use]
    pub fn status(&self) -> Option<WatchStatus> {
        self.list_status.as_ref().map(|s| s.status)
    }

    /// Returns the user score (0 when unrated or missing).
    #[must_use]
    pub fn user_score(&self) -> u8 {
        self.list_status.as_ref().map_or(0, |s| s.score)
    }

    /// Returns the number of episodes watched (0 when missing).
    #[must_use]
    pub fn episodes_watched(&self) -> u32 {
        self.list_status.as_ref().map_or(0, |s| s.episodes_watched)
    }

    /// Returns the last-updated timestamp, if any.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.list_status.as_ref().and_then(|s| s.updated_at)
    }
}

/// One page of a user's anime list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    /// Entries on this page, in API order.
    pub entries: Vec<UserListEntry>,
    /// Whether the API reported a further page.
    pub has_next_page: bool,
    /// Page number reported by the API (falls back to the requested page).
    pub current_page: u32,
    /// Last page number reported by the API, if any.
    pub last_visible_page: Option<u32>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    #[test]
    fn test_media_type_parse_case_insensitive() {
        // Arrange & Act & Assert
        assert_eq!("tv".parse::<MediaType>().unwrap(), MediaType::Tv);
        assert_eq!("OVA".parse::<MediaType>().unwrap(), MediaType::Ova);
        assert_eq!("Movie".parse::<MediaType>().unwrap(), MediaType::Movie);
        assert!("cartoon".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_media_type_unknown_from_wire() {
        // Arrange
        let json = r#"[null, "TV", "tv_special"]"#;

        // Act
        let types: Vec<MediaType> = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(
            types,
            vec![MediaType::Unknown, MediaType::Tv, MediaType::Unknown]
        );
    }

    #[test]
    fn test_watch_status_accepts_all_wire_forms() {
        // Arrange
        let json = r#"["on_hold", "On-Hold", "Plan to Watch", 2, 6, "watching"]"#;

        // Act
        let statuses: Vec<WatchStatus> = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(
            statuses,
            vec![
                WatchStatus::OnHold,
                WatchStatus::OnHold,
                WatchStatus::PlanToWatch,
                WatchStatus::Completed,
                WatchStatus::PlanToWatch,
                WatchStatus::Watching,
            ]
        );
    }

    #[test]
    fn test_watch_status_rejects_unknown_code() {
        // Arrange & Act
        let result: Result<WatchStatus, _> = serde_json::from_str("5");

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_watch_status_serializes_snake_case() {
        // Arrange & Act
        let json = serde_json::to_string(&WatchStatus::PlanToWatch).unwrap();

        // Assert
        assert_eq!(json, r#""plan_to_watch""#);
    }

    #[test]
    fn test_anime_record_minimal_fields() {
        // Arrange
        let json = r#"{"mal_id": 1, "title": "Cowboy Bebop"}"#;

        // Act
        let record: AnimeRecord = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(record.mal_id, 1);
        assert_eq!(record.media_type, MediaType::Unknown);
        assert!(record.genres.is_empty());
        assert!(record.score.is_none());
        assert!(record.episodes.is_none());
    }

    #[test]
    fn test_dedup_genres_keeps_first() {
        // Arrange
        let mut record: AnimeRecord = serde_json::from_str(
            r#"{"mal_id": 1, "title": "X", "genres": [
                {"mal_id": 1, "name": "Action"},
                {"mal_id": 2, "name": "Drama"},
                {"mal_id": 1, "name": "Action (dup)"}
            ]}"#,
        )
        .unwrap();

        // Act
        record.dedup_genres();

        // Assert
        assert_eq!(record.genres.len(), 2);
        assert_eq!(record.genres[0].name, "Action");
        assert_eq!(record.genres[1].name, "Drama");
    }

    #[test]
    fn test_best_image_url_prefers_large_webp() {
        // Arrange
        let images = Images {
            jpg: Some(ImageUrls {
                image_url: Some(String::from("a.jpg")),
                small_image_url: None,
                large_image_url: Some(String::from("large.jpg")),
            }),
            webp: Some(ImageUrls {
                image_url: Some(String::from("a.webp")),
                small_image_url: None,
                large_image_url: Some(String::from("large.webp")),
            }),
        };

        // Act & Assert
        assert_eq!(images.best_url(), Some("large.webp"));
        assert_eq!(Images::default().best_url(), None);
    }

    #[test]
    fn test_best_image_url_falls_back_to_default_size() {
        // Arrange
        let images = Images {
            jpg: Some(ImageUrls {
                image_url: Some(String::from("a.jpg")),
                small_image_url: None,
                large_image_url: Some(String::new()),
            }),
            webp: None,
        };

        // Act
        let url = images.best_url().map(String::from);

        // Assert
        assert_eq!(url.as_deref(), Some("a.jpg"));
    }

    #[test]
    fn test_entry_accessors_default_to_zero() {
        // Arrange
        let record: AnimeRecord = serde_json::from_str(r#"{"mal_id": 1, "title": "X"}"#).unwrap();
        let entry = UserListEntry::new(record, None);

        // Act & Assert
        assert_eq!(entry.status(), None);
        assert_eq!(entry.user_score(), 0);
        assert_eq!(entry.episodes_watched(), 0);
        assert!(entry.updated_at().is_none());
    }
}
