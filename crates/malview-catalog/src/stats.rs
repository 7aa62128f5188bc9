//! Summary statistics over a user list.

use std::collections::{BTreeMap, HashMap, HashSet};

use malview_api::jikan::{UserListEntry, WatchStatus};

/// Number of genres reported by [`ListStats::top_genres`].
pub const TOP_GENRE_COUNT: usize = 5;

/// Summary of a non-empty list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListStats {
    /// Number of entries.
    pub total: usize,
    /// Entries per status. Entries without a status are counted as
    /// plan-to-watch. Statuses with no entries are absent.
    pub status_counts: BTreeMap<WatchStatus, usize>,
    /// Sum of episodes watched.
    pub total_episodes_watched: u64,
    /// Mean of the non-zero user scores, `None` if nothing is rated.
    pub average_score: Option<f64>,
    /// Entries per genre name in first-seen order. An entry counts each
    /// distinct genre name once.
    pub genre_counts: Vec<(String, usize)>,
    /// Entries per user score 1 to 10. Unrated entries are excluded.
    pub score_distribution: BTreeMap<u8, usize>,
}

impl ListStats {
    /// Number of entries with the given status.
    #[must_use]
    pub fn status_count(&self, status: WatchStatus) -> usize {
        self.status_counts.get(&status).copied().unwrap_or(0)
    }

    /// Share of entries with the given status, in percent.
    #[must_use]
    pub fn status_share(&self, status: WatchStatus) -> f64 {
        let count = u32::try_from(self.status_count(status)).unwrap_or(u32::MAX);
        let total = u32::try_from(self.total).unwrap_or(u32::MAX);
        if total == 0 {
            return 0.0;
        }
        f64::from(count) * 100.0 / f64::from(total)
    }

    /// The most frequent genres, highest count first, ties in first-seen
    /// order.
    #[must_use]
    pub fn top_genres(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .genre_counts
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(TOP_GENRE_COUNT);
        ranked
    }
}

/// Computes statistics for `list`; `None` when the list is empty.
#[must_use]
pub fn summarize(list: &[UserListEntry]) -> Option<ListStats> {
    if list.is_empty() {
        return None;
    }

    let mut status_counts: BTreeMap<WatchStatus, usize> = BTreeMap::new();
    let mut total_episodes_watched: u64 = 0;
    let mut score_sum: u32 = 0;
    let mut rated: u32 = 0;
    let mut genre_index: HashMap<&str, usize> = HashMap::new();
    let mut genre_counts: Vec<(String, usize)> = Vec::new();
    let mut score_distribution: BTreeMap<u8, usize> = BTreeMap::new();

    for entry in list {
        let status = entry.status().unwrap_or(WatchStatus::PlanToWatch);
        bump(status_counts.entry(status).or_insert(0));

        total_episodes_watched =
            total_episodes_watched.saturating_add(u64::from(entry.episodes_watched()));

        let score = entry.user_score();
        if score > 0 {
            score_sum = score_sum.saturating_add(u32::from(score));
            rated = rated.saturating_add(1);
            bump(score_distribution.entry(score).or_insert(0));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for genre in &entry.anime.genres {
            let name = genre.name.as_str();
            if !seen.insert(name) {
                continue;
            }
            if let Some(slot) = genre_index
                .get(name)
                .and_then(|&idx| genre_counts.get_mut(idx))
            {
                bump(&mut slot.1);
            } else {
                genre_index.insert(name, genre_counts.len());
                genre_counts.push((String::from(name), 1));
            }
        }
    }

    let average_score = (rated > 0).then(|| f64::from(score_sum) / f64::from(rated));

    tracing::debug!(total = list.len(), rated = rated, "list summarized");

    Some(ListStats {
        total: list.len(),
        status_counts,
        total_episodes_watched,
        average_score,
        genre_counts,
        score_distribution,
    })
}

fn bump(counter: &mut usize) {
    *counter = counter.saturating_add(1);
}
