//! Per-user file locations.
//!
//! Every malview file lives under one application directory. `--dir`
//! replaces that directory outright; otherwise the XDG base directory
//! variables are honoured, falling back to the usual `$HOME` locations.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Application directory name under the XDG base directories.
const APP_NAME: &str = "malview";

/// Database file name.
pub const DB_FILE: &str = "malview.db";

/// Config file name.
pub const CONFIG_FILE: &str = "config.toml";

/// Kind of per-user directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppDir {
    /// Cache database (`$XDG_DATA_HOME`, `~/.local/share`).
    Data,
    /// Config file (`$XDG_CONFIG_HOME`, `~/.config`).
    Config,
}

impl AppDir {
    const fn xdg_var(self) -> &'static str {
        match self {
            Self::Data => "XDG_DATA_HOME",
            Self::Config => "XDG_CONFIG_HOME",
        }
    }

    const fn home_relative(self) -> &'static [&'static str] {
        match self {
            Self::Data => &[".local", "share"],
            Self::Config => &[".config"],
        }
    }

    /// Returns the path of `file_name` in this directory.
    ///
    /// `override_dir` wins over the environment when given.
    ///
    /// # Errors
    ///
    /// Returns an error if no override is given and neither the XDG
    /// variable nor `HOME` is usable.
    pub fn file(self, override_dir: Option<&Path>, file_name: &str) -> Result<PathBuf> {
        self.file_with_env(override_dir, file_name, |key| std::env::var(key).ok())
    }

    fn file_with_env(
        self,
        override_dir: Option<&Path>,
        file_name: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<PathBuf> {
        if let Some(dir) = override_dir {
            return Ok(dir.join(file_name));
        }

        // Relative XDG values are invalid and ignored.
        if let Some(base) = env(self.xdg_var())
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
        {
            return Ok(base.join(APP_NAME).join(file_name));
        }

        let Some(home) = env("HOME").filter(|h| !h.is_empty()) else {
            bail!(
                "neither {} nor HOME is set; pass --dir to choose a location",
                self.xdg_var()
            );
        };
        let mut path = PathBuf::from(home);
        path.extend(self.home_relative());
        Ok(path.join(APP_NAME).join(file_name))
    }
}
