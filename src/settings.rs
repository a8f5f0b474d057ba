use anyhow::Result;
use chrono::Locale;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::helpers::parse_locale;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Episode API settings
    pub api: ApiSettings,
    /// Playback behaviour
    pub playback: PlaybackSettings,
    /// Audio output settings
    pub audio: AudioSettings,
    /// Theme preferences
    pub theme: ThemeSettings,
    /// Locale used for dates, e.g. `en_US` or `pt_BR`
    pub locale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    /// How many episodes the home page fetches
    pub listing_limit: usize,
    /// How many of those are shown as latest releases
    pub latest_count: usize,
    /// Seconds before listing data is fetched again
    pub revalidate_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Volume level (0.0 to 1.0)
    pub default_volume: f32,
    /// Skip interval in seconds
    pub skip_interval: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSettings {
    /// None means use system default
    pub selected_device: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThemeSettings {
    pub theme_name: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            playback: PlaybackSettings::default(),
            audio: AudioSettings::default(),
            theme: ThemeSettings::default(),
            locale: "en_US".to_string(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3333".to_string(),
            listing_limit: 12,
            latest_count: 2,
            revalidate_secs: 60 * 60 * 8,
        }
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            default_volume: 0.7,
            skip_interval: 15,
        }
    }
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            theme_name: "Podcastr".to_string(),
        }
    }
}

pub struct SettingsManager {
    settings_path: PathBuf,
    settings: AppSettings,
}

impl SettingsManager {
    pub fn new() -> Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Ok(Self::with_path(settings_path))
    }

    /// Loads settings from `settings_path`, using defaults when the file is
    /// missing or unreadable.
    pub fn with_path(settings_path: PathBuf) -> Self {
        let settings = match Self::load_from_file(&settings_path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!(
                    "Failed to load settings from {}, using defaults: {}",
                    settings_path.display(),
                    e
                );
                AppSettings::default()
            }
        };

        Self {
            settings_path,
            settings,
        }
    }

    pub fn get_settings_path() -> Result<PathBuf> {
        let home_dir = home::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;

        Ok(home_dir.join(".config").join("podcastr").join("settings.json"))
    }

    fn load_from_file(path: &Path) -> Result<AppSettings> {
        if !path.exists() {
            return Ok(AppSettings::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: AppSettings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, content)?;
        log::info!("Settings saved to: {}", self.settings_path.display());
        Ok(())
    }

    pub fn get(&self) -> &AppSettings {
        &self.settings
    }

    pub fn update<F>(&mut self, updater: F) -> Result<()>
    where
        F: FnOnce(&mut AppSettings),
    {
        updater(&mut self.settings);
        self.save()
    }

    // Convenience getters
    pub fn api_base_url(&self) -> &str {
        &self.settings.api.base_url
    }

    pub fn listing_limit(&self) -> usize {
        self.settings.api.listing_limit
    }

    pub fn latest_count(&self) -> usize {
        self.settings.api.latest_count
    }

    pub fn revalidate_after(&self) -> Duration {
        Duration::from_secs(self.settings.api.revalidate_secs)
    }

    pub fn default_volume(&self) -> f32 {
        self.settings.playback.default_volume
    }

    pub fn skip_interval(&self) -> u64 {
        self.settings.playback.skip_interval
    }

    pub fn selected_audio_device(&self) -> Option<&str> {
        self.settings.audio.selected_device.as_deref()
    }

    pub fn theme_name(&self) -> &str {
        &self.settings.theme.theme_name
    }

    pub fn locale(&self) -> Locale {
        parse_locale(&self.settings.locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let manager = SettingsManager::with_path(dir.path().join("settings.json"));

        assert_eq!(manager.get(), &AppSettings::default());
        assert_eq!(manager.api_base_url(), "http://localhost:3333");
        assert_eq!(manager.listing_limit(), 12);
        assert_eq!(manager.latest_count(), 2);
        assert_eq!(manager.revalidate_after(), Duration::from_secs(28_800));
        assert_eq!(manager.skip_interval(), 15);
        assert!(manager.selected_audio_device().is_none());
    }

    #[test]
    fn update_persists_to_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut manager = SettingsManager::with_path(path.clone());
        manager
            .update(|s| {
                s.api.base_url = "https://podcastr.example.com".to_string();
                s.locale = "pt_BR".to_string();
            })
            .unwrap();

        let reloaded = SettingsManager::with_path(path);
        assert_eq!(reloaded.api_base_url(), "https://podcastr.example.com");
        assert!(matches!(reloaded.locale(), Locale::pt_BR));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "playback": { "skip_interval": 30 } }"#).unwrap();

        let manager = SettingsManager::with_path(path);
        assert_eq!(manager.skip_interval(), 30);
        assert_eq!(manager.default_volume(), 0.7);
        assert_eq!(manager.theme_name(), "Podcastr");
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let manager = SettingsManager::with_path(path);
        assert_eq!(manager.get(), &AppSettings::default());
    }
}
