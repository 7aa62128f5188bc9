//! Plain-text rendering of list entries, statistics and details.

use malview_api::jikan::{AnimeRecord, UserListEntry, WatchStatus};
use malview_catalog::ListStats;
use malview_db::Favorite;

/// Placeholder for missing values.
const MISSING: &str = "-";

/// Header matching [`entry_line`].
pub const ENTRY_HEADER: &str = "ID\tStatus\t\tScore\tMine\tEps\tType\tTitle";

/// One tab-separated list row.
#[must_use]
pub fn entry_line(entry: &UserListEntry) -> String {
    let anime = &entry.anime;
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        anime.mal_id,
        entry.status().map_or(MISSING, WatchStatus::label),
        mean_score(anime),
        user_score(entry.user_score()),
        episodes(entry.episodes_watched(), anime.episodes),
        anime.media_type,
        anime.title,
    )
}

/// Lines of the statistics view.
#[must_use]
pub fn stats_lines(stats: &ListStats) -> Vec<String> {
    let mut lines = vec![
        format!("Total entries: {}", stats.total),
        format!("Episodes watched: {}", stats.total_episodes_watched),
        format!(
            "Average score: {}",
            stats
                .average_score
                .map_or_else(|| String::from("n/a"), |s| format!("{s:.2}"))
        ),
        String::from("Status:"),
    ];
    for status in WatchStatus::ALL {
        lines.push(format!(
            "  {:<14}{:>5}  ({:.1}%)",
            status.label(),
            stats.status_count(status),
            stats.status_share(status),
        ));
    }
    lines.push(String::from("Top genres:"));
    for (name, count) in stats.top_genres() {
        lines.push(format!("  {name:<14}{count:>5}"));
    }
    lines.push(String::from("Score distribution:"));
    for (score, count) in &stats.score_distribution {
        lines.push(format!("  {score:>2}  {count}"));
    }
    lines
}

/// Lines of the detail view.
#[must_use]
pub fn detail_lines(anime: &AnimeRecord, favorite: Option<&Favorite>) -> Vec<String> {
    let mut lines = vec![format!("{} [{}]", anime.title, anime.mal_id)];
    if let Some(english) = anime.title_english.as_deref() {
        lines.push(format!("English: {english}"));
    }
    if let Some(japanese) = anime.title_japanese.as_deref() {
        lines.push(format!("Japanese: {japanese}"));
    }
    lines.push(format!("Type: {}", anime.media_type));
    lines.push(format!(
        "Episodes: {}",
        anime
            .episodes
            .map_or_else(|| String::from(MISSING), |e| e.to_string())
    ));
    lines.push(format!("Score: {}", mean_score(anime)));
    if !anime.genres.is_empty() {
        let names: Vec<&str> = anime.genres.iter().map(|g| g.name.as_str()).collect();
        lines.push(format!("Genres: {}", names.join(", ")));
    }
    if let Some(image) = anime.images.best_url() {
        lines.push(format!("Image: {image}"));
    }
    if !anime.url.is_empty() {
        lines.push(format!("URL: {}", anime.url));
    }
    if let Some(fav) = favorite {
        lines.push(format!(
            "Favorite since {}{}",
            fav.added_at.format("%Y-%m-%d"),
            fav.notes
                .as_deref()
                .map_or_else(String::new, |n| format!(": {n}"))
        ));
    }
    if let Some(synopsis) = anime.synopsis.as_deref() {
        lines.push(String::new());
        lines.push(String::from(synopsis));
    }
    lines
}

/// One favorites row.
#[must_use]
pub fn favorite_line(favorite: &Favorite) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        favorite.anime.mal_id,
        favorite.added_at.format("%Y-%m-%d"),
        favorite.anime.title,
        favorite.notes.as_deref().unwrap_or(MISSING),
    )
}

fn mean_score(anime: &AnimeRecord) -> String {
    anime
        .score
        .map_or_else(|| String::from(MISSING), |s| format!("{s:.2}"))
}

fn user_score(score: u8) -> String {
    if score == 0 {
        String::from(MISSING)
    } else {
        score.to_string()
    }
}

fn episodes(watched: u32, total: Option<u32>) -> String {
    total.map_or_else(|| format!("{watched}/?"), |t| format!("{watched}/{t}"))
}
