//! `AppConfig` struct and TOML read/write.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Default gap between Jikan requests, in milliseconds.
const DEFAULT_MIN_INTERVAL_MS: u64 = 1000;
/// Default list cache window, in seconds.
const DEFAULT_LIST_TTL_SECS: u64 = 60 * 60;
/// Default item cache window, in seconds.
const DEFAULT_ITEM_TTL_SECS: u64 = 30 * 60;

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Jikan API settings.
    #[serde(default)]
    pub jikan: JikanConfig,
    /// Cache windows.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Jikan API configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JikanConfig {
    /// `MyAnimeList` username whose list is shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// API base URL override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Minimum gap between requests.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

/// Cache window configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Freshness window of the list snapshot.
    #[serde(default = "default_list_ttl_secs")]
    pub list_ttl_secs: u64,
    /// Freshness window of each detail record.
    #[serde(default = "default_item_ttl_secs")]
    pub item_ttl_secs: u64,
}

const fn default_min_interval_ms() -> u64 {
    DEFAULT_MIN_INTERVAL_MS
}

const fn default_list_ttl_secs() -> u64 {
    DEFAULT_LIST_TTL_SECS
}

const fn default_item_ttl_secs() -> u64 {
    DEFAULT_ITEM_TTL_SECS
}

impl Default for JikanConfig {
    fn default() -> Self {
        Self {
            username: None,
            base_url: None,
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            list_ttl_secs: DEFAULT_LIST_TTL_SECS,
            item_ttl_secs: DEFAULT_ITEM_TTL_SECS,
        }
    }
}

impl JikanConfig {
    /// Minimum gap between requests.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl CacheConfig {
    /// List snapshot window.
    #[must_use]
    pub const fn list_ttl(&self) -> Duration {
        Duration::from_secs(self.list_ttl_secs)
    }

    /// Detail record window.
    #[must_use]
    pub const fn item_ttl(&self) -> Duration {
        Duration::from_secs(self.item_ttl_secs)
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Resolves the username: the command-line override wins over the
    /// config file.
    ///
    /// # Errors
    ///
    /// Returns an error if neither provides a non-blank username.
    pub fn username(&self, override_user: Option<&str>) -> Result<String> {
        let candidate = override_user
            .or(self.jikan.username.as_deref())
            .map(str::trim)
            .filter(|u| !u.is_empty());
        match candidate {
            Some(user) => Ok(String::from(user)),
            None => bail!(
                "no username configured: pass --user <NAME> or run `malview config set-user <NAME>`"
            ),
        }
    }
}
