//! Application configuration module.
//!
//! Manages the TOML config file holding the Jikan username, request pacing
//! and cache windows.

#[allow(clippy::module_inception)]
mod config;

#[allow(clippy::module_name_repetitions)]
pub use config::AppConfig;
