//! Local persistence for malview.
//!
//! Uses `rusqlite` (bundled `SQLite`) as a synchronous string key-value
//! store. On top of it sit the list snapshot cache, the per-item detail
//! cache (each with its own expiry window) and the favorites list.

mod clock;
/// Per-user data and config locations.
pub mod dirs;
mod error;
/// Favorites list.
pub mod favorites;
/// Per-item detail cache.
pub mod item_cache;
mod kv;
/// User list snapshot cache.
pub mod list_cache;
mod migrations;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dirs::{AppDir, CONFIG_FILE, DB_FILE};
pub use error::CacheError;
pub use favorites::{Favorite, FavoritesStore};
pub use item_cache::ItemCache;
pub use kv::{KeyValueStore, MemoryStore, SqliteStore};
pub use list_cache::ListCache;
