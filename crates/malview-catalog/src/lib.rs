//! Read-only views over a user's anime list.
//!
//! - [`query`]: filtering and sorting.
//! - [`stats`]: summary statistics.
//! - [`random`]: uniform random selection.
//! - [`library`]: the list source that puts the cache in front of the API.

/// Cached list source.
pub mod library;
/// Filter and sort engine.
pub mod query;
/// Random selection.
pub mod random;
/// Summary statistics.
pub mod stats;

pub use library::{Library, LibraryError};
pub use query::{FilterSpec, SortKey, apply};
pub use random::{EmptySelectionError, RandomSource, pick, pick_from_source};
pub use stats::{ListStats, summarize};
