// SPDX-License-Identifier: MPL-2.0
//! User preferences stored in a `settings.toml` file.
//!
//! # Configuration Sections
//!
//! - `[general]` - Language and theme mode
//! - `[preview]` - Waveform add-on, volume and autoplay
//!
//! # Path Resolution
//!
//! 1. `load_from_path()`/`save_to_path()` with an explicit path
//! 2. `--config-dir` on the command line
//! 3. `ICED_PREVIEW_CONFIG_DIR` environment variable
//! 4. The platform config directory
//!
//! # Examples
//!
//! ```no_run
//! use iced_preview::config::{self, Config};
//!
//! let (mut config, _warning) = config::load();
//! config.preview.show_waveform = Some(false);
//! config::save(&config).expect("Failed to save config");
//! ```

pub mod defaults;

pub use defaults::*;

use crate::app::paths;
use crate::error::{Error, Result};
use crate::ui::theming::ThemeMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";

/// i18n key of the warning shown when `settings.toml` cannot be parsed.
pub const LOAD_ERROR_KEY: &str = "notification-config-load-error";

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// UI language code (e.g., "en-US", "fr").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(
        default = "default_theme_mode",
        deserialize_with = "deserialize_theme_mode"
    )]
    pub theme_mode: ThemeMode,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            language: None,
            theme_mode: default_theme_mode(),
        }
    }
}

/// Preview widget settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviewConfig {
    /// Attach the waveform add-on to loaded videos.
    #[serde(
        default = "default_show_waveform",
        skip_serializing_if = "Option::is_none"
    )]
    pub show_waveform: Option<bool>,

    /// Playback volume (0.0 to 1.0).
    #[serde(default = "default_volume", skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,

    /// Number of waveform peak bins.
    #[serde(
        default = "default_waveform_bins",
        skip_serializing_if = "Option::is_none"
    )]
    pub waveform_bins: Option<u32>,

    /// Start playing once a video with audio is ready.
    #[serde(default = "default_autoplay", skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<bool>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            show_waveform: default_show_waveform(),
            volume: default_volume(),
            waveform_bins: default_waveform_bins(),
            autoplay: default_autoplay(),
        }
    }
}

impl PreviewConfig {
    #[must_use]
    pub fn effective_show_waveform(&self) -> bool {
        self.show_waveform.unwrap_or(DEFAULT_SHOW_WAVEFORM)
    }

    /// Volume clamped to the supported range; non-finite values fall back to the default.
    #[must_use]
    pub fn effective_volume(&self) -> f32 {
        match self.volume {
            Some(v) if v.is_finite() => v.clamp(MIN_VOLUME, MAX_VOLUME),
            _ => DEFAULT_VOLUME,
        }
    }

    #[must_use]
    pub fn effective_waveform_bins(&self) -> usize {
        self.waveform_bins
            .unwrap_or(DEFAULT_WAVEFORM_BINS)
            .clamp(MIN_WAVEFORM_BINS, MAX_WAVEFORM_BINS) as usize
    }

    #[must_use]
    pub fn effective_autoplay(&self) -> bool {
        self.autoplay.unwrap_or(DEFAULT_AUTOPLAY)
    }
}

/// Application configuration with logical sections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub preview: PreviewConfig,
}

fn default_theme_mode() -> ThemeMode {
    ThemeMode::System
}

fn default_show_waveform() -> Option<bool> {
    Some(DEFAULT_SHOW_WAVEFORM)
}

fn default_volume() -> Option<f32> {
    Some(DEFAULT_VOLUME)
}

fn default_waveform_bins() -> Option<u32> {
    Some(DEFAULT_WAVEFORM_BINS)
}

fn default_autoplay() -> Option<bool> {
    Some(DEFAULT_AUTOPLAY)
}

fn deserialize_theme_mode<'de, D>(deserializer: D) -> std::result::Result<ThemeMode, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw = String::deserialize(deserializer)?;
    match raw.to_lowercase().as_str() {
        "light" => Ok(ThemeMode::Light),
        "dark" => Ok(ThemeMode::Dark),
        "system" => Ok(ThemeMode::System),
        other => Err(D::Error::custom(format!("invalid theme_mode: {}", other))),
    }
}

fn get_config_path_with_override(base_dir: Option<PathBuf>) -> Option<PathBuf> {
    paths::get_app_config_dir_with_override(base_dir).map(|mut path| {
        path.push(CONFIG_FILE);
        path
    })
}

/// Loads the configuration from the default path.
///
/// Returns `(config, warning_key)`. A missing file is not a warning; an
/// unreadable one yields the defaults together with [`LOAD_ERROR_KEY`].
pub fn load() -> (Config, Option<String>) {
    load_with_override(None)
}

/// Loads the configuration from a custom directory.
pub fn load_with_override(base_dir: Option<PathBuf>) -> (Config, Option<String>) {
    if let Some(path) = get_config_path_with_override(base_dir) {
        if path.exists() {
            match load_from_path(&path) {
                Ok(config) => return (config, None),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load settings");
                    return (Config::default(), Some(LOAD_ERROR_KEY.to_string()));
                }
            }
        }
    }
    (Config::default(), None)
}

/// Loads configuration from a specific path.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Saves the configuration to the default path.
pub fn save(config: &Config) -> Result<()> {
    save_with_override(config, None)
}

/// Saves the configuration to a custom directory.
pub fn save_with_override(config: &Config, base_dir: Option<PathBuf>) -> Result<()> {
    if let Some(path) = get_config_path_with_override(base_dir) {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Saves configuration to a specific path, creating parent directories.
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config).map_err(Error::from)?;
    fs::write(path, content)?;
    Ok(())
}
