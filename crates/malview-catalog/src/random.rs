//! Uniform random selection.

use std::fmt;
use std::str::FromStr;

use malview_api::jikan::{ParseEnumError, UserListEntry, WatchStatus};
use rand::Rng;
use rand::seq::SliceRandom;

/// Returned when a pick is attempted on an empty list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("nothing to pick from: the selection is empty")]
pub struct EmptySelectionError;

/// Picks one element uniformly at random.
///
/// Each call is independent; repeats are possible.
///
/// # Errors
///
/// Returns `EmptySelectionError` if `items` is empty.
pub fn pick<'a, T, R: Rng + ?Sized>(
    items: &'a [T],
    rng: &mut R,
) -> Result<&'a T, EmptySelectionError> {
    items.choose(rng).ok_or(EmptySelectionError)
}

/// Which part of the list a random pick draws from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RandomSource {
    /// Every entry.
    All,
    /// Every entry except dropped ones.
    #[default]
    AllExceptDropped,
    /// Completed entries.
    CompletedOnly,
    /// Plan-to-watch entries.
    PlanToWatchOnly,
    /// Watching and on-hold entries.
    WatchingAndOnHold,
}

impl RandomSource {
    /// Returns the command-line name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::AllExceptDropped => "all-except-dropped",
            Self::CompletedOnly => "completed",
            Self::PlanToWatchOnly => "plan-to-watch",
            Self::WatchingAndOnHold => "watching-and-on-hold",
        }
    }

    /// Returns `true` if an entry with this status belongs to the source.
    ///
    /// A missing status is treated as plan-to-watch.
    #[must_use]
    pub const fn includes(self, status: Option<WatchStatus>) -> bool {
        let status = match status {
            Some(s) => s,
            None => WatchStatus::PlanToWatch,
        };
        match self {
            Self::All => true,
            Self::AllExceptDropped => !matches!(status, WatchStatus::Dropped),
            Self::CompletedOnly => matches!(status, WatchStatus::Completed),
            Self::PlanToWatchOnly => matches!(status, WatchStatus::PlanToWatch),
            Self::WatchingAndOnHold => {
                matches!(status, WatchStatus::Watching | WatchStatus::OnHold)
            }
        }
    }
}

impl FromStr for RandomSource {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "all" => Ok(Self::All),
            "all-except-dropped" => Ok(Self::AllExceptDropped),
            "completed" | "completed-only" => Ok(Self::CompletedOnly),
            "plan-to-watch" | "plan-to-watch-only" => Ok(Self::PlanToWatchOnly),
            "watching-and-on-hold" => Ok(Self::WatchingAndOnHold),
            _ => Err(ParseEnumError {
                kind: "random source",
                value: String::from(s),
            }),
        }
    }
}

impl fmt::Display for RandomSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks one entry from the part of the list selected by `source`.
///
/// # Errors
///
/// Returns `EmptySelectionError` if no entry belongs to `source`.
pub fn pick_from_source<'a, R: Rng + ?Sized>(
    list: &'a [UserListEntry],
    source: RandomSource,
    rng: &mut R,
) -> Result<&'a UserListEntry, EmptySelectionError> {
    let candidates: Vec<&UserListEntry> =
        list.iter().filter(|e| source.includes(e.status())).collect();
    tracing::debug!(source = %source, candidates = candidates.len(), "random pick");
    pick(&candidates, rng).copied()
}
