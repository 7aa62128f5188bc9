//! Filter and sort engine.
//!
//! [`apply`] is pure: it never mutates its input and returns a new list.
//! Filters are conjunctive and run before the (stable) sort, so applying
//! the same spec twice yields the same list.

use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use malview_api::jikan::{MediaType, ParseEnumError, UserListEntry, WatchStatus};
use unicode_normalization::UnicodeNormalization;

/// Sort order applied after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Title ascending (compatibility-normalised, case-insensitive).
    Title,
    /// Mean community score descending.
    Score,
    /// Episode count descending.
    Episodes,
    /// Most recently updated first.
    LastUpdated,
    /// User score descending.
    UserScore,
}

impl SortKey {
    /// Returns the command-line name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Score => "score",
            Self::Episodes => "episodes",
            Self::LastUpdated => "updated",
            Self::UserScore => "user-score",
        }
    }
}

impl FromStr for SortKey {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "title" => Ok(Self::Title),
            "score" => Ok(Self::Score),
            "episodes" => Ok(Self::Episodes),
            "updated" | "last-updated" => Ok(Self::LastUpdated),
            "user-score" => Ok(Self::UserScore),
            _ => Err(ParseEnumError {
                kind: "sort key",
                value: String::from(s),
            }),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter and sort parameters.
///
/// An empty set or an empty query places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Accepted watch statuses. Entries without a status never match a
    /// non-empty set.
    pub statuses: BTreeSet<WatchStatus>,
    /// Accepted media types.
    pub media_types: BTreeSet<MediaType>,
    /// Genre names; an entry matches if it carries any of them.
    pub genres: BTreeSet<String>,
    /// Case-insensitive substring matched against all titles.
    pub query: String,
    /// Sort order; `None` keeps list order.
    pub sort: Option<SortKey>,
}

impl FilterSpec {
    /// Creates a spec that matches everything and keeps list order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to the given statuses.
    #[must_use]
    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = WatchStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    /// Restricts to the given media types.
    #[must_use]
    pub fn with_media_types(mut self, media_types: impl IntoIterator<Item = MediaType>) -> Self {
        self.media_types = media_types.into_iter().collect();
        self
    }

    /// Restricts to entries carrying any of the given genres.
    #[must_use]
    pub fn with_genres<G: Into<String>>(mut self, genres: impl IntoIterator<Item = G>) -> Self {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the title search text.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Sets the sort order.
    #[must_use]
    pub const fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    fn matches(&self, entry: &UserListEntry, needle: &str) -> bool {
        if !self.statuses.is_empty()
            && !entry.status().is_some_and(|s| self.statuses.contains(&s))
        {
            return false;
        }
        if !self.media_types.is_empty() && !self.media_types.contains(&entry.anime.media_type) {
            return false;
        }
        if !self.genres.is_empty() && !self.genres.iter().any(|g| entry.anime.has_genre(g)) {
            return false;
        }
        needle.is_empty() || titles(entry).any(|t| fold(t).contains(needle))
    }
}

/// Returns the entries matching `spec`, in `spec.sort` order.
#[must_use]
pub fn apply(list: &[UserListEntry], spec: &FilterSpec) -> Vec<UserListEntry> {
    let needle = fold(&spec.query);
    let mut result: Vec<UserListEntry> = list
        .iter()
        .filter(|e| spec.matches(e, &needle))
        .cloned()
        .collect();

    match spec.sort {
        None => {}
        Some(SortKey::Title) => {
            result.sort_by_cached_key(|e| (fold(&e.anime.title), e.anime.title.clone()));
        }
        Some(SortKey::Score) => result.sort_by(|a, b| {
            let sa = a.anime.score.unwrap_or(0.0);
            let sb = b.anime.score.unwrap_or(0.0);
            sb.total_cmp(&sa)
        }),
        Some(SortKey::Episodes) => result.sort_by_key(|e| Reverse(e.anime.episodes.unwrap_or(0))),
        Some(SortKey::LastUpdated) => {
            result.sort_by_key(|e| Reverse(e.updated_at().map_or(0, |t| t.timestamp_millis())));
        }
        Some(SortKey::UserScore) => result.sort_by_key(|e| Reverse(e.user_score())),
    }

    tracing::debug!(input = list.len(), output = result.len(), "filter applied");
    result
}

/// All non-empty titles of an entry.
fn titles(entry: &UserListEntry) -> impl Iterator<Item = &str> {
    std::iter::once(entry.anime.title.as_str())
        .chain(entry.anime.title_english.as_deref())
        .chain(entry.anime.title_japanese.as_deref())
}

/// Compatibility-normalised, lowercased form used for search and ordering.
fn fold(s: &str) -> String {
    s.nfkc().collect::<String>().to_lowercase()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use malview_api::jikan::{AnimeRecord, UserListStatus};

    use super::*;

    fn entry(
        mal_id: u64,
        title: &str,
        status: Option<WatchStatus>,
        extra: &serde_json::Value,
    ) -> UserListEntry {
        let mut json = serde_json::json!({ "mal_id": mal_id, "title": title });
        if let (Some(obj), Some(more)) = (json.as_object_mut(), extra.as_object()) {
            obj.extend(more.clone());
        }
        let anime: AnimeRecord = serde_json::from_value(json).unwrap();
        UserListEntry::new(
            anime,
            status.map(|status| UserListStatus {
                status,
                score: 0,
                episodes_watched: 0,
                updated_at: None,
            }),
        )
    }

    fn tracked(mal_id: u64, score: u8, updated_at: Option<&str>) -> UserListEntry {
        let mut e = entry(
            mal_id,
            &format!("Title {mal_id}"),
            Some(WatchStatus::Watching),
            &serde_json::json!({}),
        );
        if let Some(status) = e.list_status.as_mut() {
            status.score = score;
            status.updated_at = updated_at.map(|t| t.parse().unwrap());
        }
        e
    }

    fn untracked(mal_id: u64) -> UserListEntry {
        entry(mal_id, &format!("Title {mal_id}"), None, &serde_json::json!({}))
    }

    fn ids(list: &[UserListEntry]) -> Vec<u64> {
        list.iter().map(|e| e.anime.mal_id).collect()
    }

    fn sample() -> Vec<UserListEntry> {
        vec![
            entry(
                1,
                "Cowboy Bebop",
                Some(WatchStatus::Completed),
                &serde_json::json!({
                    "type": "TV", "score": 8.75, "episodes": 26,
                    "genres": [{"mal_id": 1, "name": "Action"}, {"mal_id": 24, "name": "Sci-Fi"}]
                }),
            ),
            entry(
                21,
                "One Piece",
                Some(WatchStatus::Watching),
                &serde_json::json!({
                    "type": "TV", "score": 8.7,
                    "genres": [{"mal_id": 2, "name": "Adventure"}]
                }),
            ),
            entry(
                199,
                "Sen to Chihiro no Kamikakushi",
                Some(WatchStatus::Completed),
                &serde_json::json!({
                    "type": "Movie", "score": 8.77, "episodes": 1,
                    "title_english": "Spirited Away",
                    "genres": [{"mal_id": 2, "name": "Adventure"}]
                }),
            ),
            entry(
                5114,
                "Fullmetal Alchemist: Brotherhood",
                None,
                &serde_json::json!({ "type": "TV", "episodes": 64 }),
            ),
        ]
    }

    #[test]
    fn test_empty_spec_keeps_everything_in_order() {
        // Arrange
        let list = sample();

        // Act
        let result = apply(&list, &FilterSpec::new());

        // Assert
        assert_eq!(result, list);
    }

    #[test]
    fn test_status_filter_keeps_original_order() {
        // Arrange
        let list = sample();
        let spec = FilterSpec::new().with_statuses([WatchStatus::Completed]);

        // Act
        let result = apply(&list, &spec);

        // Assert
        assert_eq!(ids(&result), vec![1, 199]);
    }

    #[test]
    fn test_status_filter_excludes_entries_without_status() {
        // Arrange
        let list = sample();
        let spec = FilterSpec::new().with_statuses(WatchStatus::ALL);

        // Act
        let result = apply(&list, &spec);

        // Assert
        assert!(!ids(&result).contains(&5114));
    }

    #[test]
    fn test_media_type_and_genre_filters_are_conjunctive() {
        // Arrange
        let list = sample();
        let spec = FilterSpec::new()
            .with_media_types([MediaType::Tv])
            .with_genres(["adventure"]);

        // Act
        let result = apply(&list, &spec);

        // Assert
        assert_eq!(ids(&result), vec![21]);
    }

    #[test]
    fn test_genre_filter_matches_any() {
        // Arrange
        let list = sample();
        let spec = FilterSpec::new().with_genres(["Sci-Fi", "Adventure"]);

        // Act
        let result = apply(&list, &spec);

        // Assert
        assert_eq!(ids(&result), vec![1, 21, 199]);
    }

    #[test]
    fn test_query_matches_english_title_case_insensitively() {
        // Arrange
        let list = sample();
        let spec = FilterSpec::new().with_query("SPIRITED ");

        // Act
        let result = apply(&list, &spec);

        // Assert
        assert_eq!(ids(&result), vec![199]);
    }

    #[test]
    fn test_whitespace_query_is_not_trimmed() {
        // Arrange
        let mut list = sample();
        list.push(entry(
            9253,
            "Steins;Gate",
            Some(WatchStatus::Completed),
            &serde_json::json!({}),
        ));

        // Act
        let spaced = apply(&list, &FilterSpec::new().with_query(" "));
        let padded = apply(&list, &FilterSpec::new().with_query(" gate"));

        // Assert
        assert_eq!(ids(&spaced), vec![1, 21, 199, 5114]);
        assert!(padded.is_empty());
    }

    #[test]
    fn test_query_matches_fullwidth_input() {
        // Arrange
        let list = sample();
        let spec = FilterSpec::new().with_query("ＢＥＢＯＰ");

        // Act
        let result = apply(&list, &spec);

        // Assert
        assert_eq!(ids(&result), vec![1]);
    }

    #[test]
    fn test_sort_by_title() {
        // Arrange
        let list = sample();
        let spec = FilterSpec::new().with_sort(SortKey::Title);

        // Act
        let result = apply(&list, &spec);

        // Assert
        assert_eq!(ids(&result), vec![1, 5114, 21, 199]);
    }

    #[test]
    fn test_sort_by_score_missing_last() {
        // Arrange
        let list = sample();
        let spec = FilterSpec::new().with_sort(SortKey::Score);

        // Act
        let result = apply(&list, &spec);

        // Assert
        assert_eq!(ids(&result), vec![199, 1, 21, 5114]);
    }

    #[test]
    fn test_sort_by_episodes_is_stable_for_ties() {
        // Arrange
        let list = sample();
        let spec = FilterSpec::new().with_sort(SortKey::Episodes);

        // Act
        let result = apply(&list, &spec);

        // Assert: One Piece has no count and sorts as 0, after the movie
        assert_eq!(ids(&result), vec![5114, 1, 199, 21]);
    }

    #[test]
    fn test_sort_by_user_score_descending_missing_as_zero() {
        // Arrange
        let list = vec![
            tracked(10, 7, None),
            untracked(11),
            tracked(12, 9, None),
            tracked(13, 0, None),
            tracked(14, 7, None),
            tracked(15, 10, None),
        ];
        let spec = FilterSpec::new().with_sort(SortKey::UserScore);

        // Act
        let result = apply(&list, &spec);

        // Assert: ties keep input order, unrated and untracked sort as 0
        assert_eq!(ids(&result), vec![15, 12, 10, 14, 11, 13]);
    }

    #[test]
    fn test_sort_by_last_updated_newest_first() {
        // Arrange
        let list = vec![
            tracked(20, 5, Some("2023-05-01T12:00:00Z")),
            untracked(21),
            tracked(22, 5, Some("2024-02-10T08:30:00+09:00")),
            tracked(23, 5, None),
            tracked(24, 5, Some("2024-02-09T23:30:00Z")),
            tracked(25, 5, Some("2023-05-01T12:00:00Z")),
        ];
        let spec = FilterSpec::new().with_sort(SortKey::LastUpdated);

        // Act
        let result = apply(&list, &spec);

        // Assert: 22 is 2024-02-09T23:30Z as well, so it stays ahead of 24
        assert_eq!(ids(&result), vec![22, 24, 20, 25, 21, 23]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        // Arrange
        let list = sample();
        let specs = [
            FilterSpec::new(),
            FilterSpec::new().with_sort(SortKey::Title),
            FilterSpec::new()
                .with_genres(["Adventure"])
                .with_sort(SortKey::Score),
            FilterSpec::new()
                .with_statuses([WatchStatus::Completed])
                .with_sort(SortKey::UserScore),
            FilterSpec::new().with_sort(SortKey::LastUpdated),
        ];

        for spec in &specs {
            // Act
            let once = apply(&list, spec);
            let twice = apply(&once, spec);

            // Assert
            assert_eq!(once, twice, "not idempotent for {spec:?}");
        }
    }

    #[test]
    fn test_sort_key_parse() {
        // Arrange & Act & Assert
        assert_eq!("user_score".parse::<SortKey>().unwrap(), SortKey::UserScore);
        assert_eq!("Updated".parse::<SortKey>().unwrap(), SortKey::LastUpdated);
        assert!("random".parse::<SortKey>().is_err());
    }
}
