//! User settings persistence
//!
//! Stored in ~/.config/mediashelf/settings.json. A missing file means
//! defaults; unknown or missing fields fall back to their defaults too.

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Persistent user settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Settings format version
    pub version: u32,
    /// Where the media stores live (defaults to the platform data dir)
    pub data_dir: Option<PathBuf>,
    /// Seconds between slideshow advances
    pub slideshow_interval_secs: u64,
    /// Seconds skipped by the forward/back controls
    pub skip_secs: f64,
    /// "Previous" rewinds the current track when past this many seconds
    pub restart_threshold_secs: f64,
    /// Files read concurrently during ingestion
    pub read_parallelism: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            data_dir: None,
            slideshow_interval_secs: 5,
            skip_secs: 10.0,
            restart_threshold_secs: 5.0,
            read_parallelism: 4,
        }
    }
}

impl Settings {
    /// Load settings from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::settings_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;

        let settings: Self =
            serde_json::from_str(&contents).with_context(|| "Failed to parse settings")?;
        settings
            .validate()
            .with_context(|| format!("Invalid settings in {:?}", path))?;

        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Reject values the widgets cannot run with
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.slideshow_interval_secs > 0,
            "Slideshow interval must be at least one second"
        );
        ensure!(
            self.skip_secs.is_finite() && self.skip_secs > 0.0,
            "Skip length must be positive"
        );
        ensure!(
            self.restart_threshold_secs.is_finite() && self.restart_threshold_secs >= 0.0,
            "Restart threshold must not be negative"
        );
        ensure!(self.read_parallelism > 0, "Parallel reads must be at least one");
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize settings")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;

        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Get the settings file path
    pub fn settings_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("mediashelf").join("settings.json"))
    }

    /// Data directory: explicit override, then settings, then the platform default
    pub fn data_dir(&self, override_dir: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = override_dir.or_else(|| self.data_dir.clone()) {
            return Ok(dir);
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(data_dir.join("mediashelf"))
    }

    pub fn slideshow_interval(&self) -> Duration {
        Duration::from_secs(self.slideshow_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(label: &str) -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir()
            .join(format!("mediashelf_{}_{}_{}", label, std::process::id(), suffix))
            .join("settings.json")
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = Settings::load_from(&temp_file("missing")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.slideshow_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_file("save");
        let settings = Settings {
            slideshow_interval_secs: 8,
            data_dir: Some(PathBuf::from("/srv/media")),
            ..Settings::default()
        };

        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);

        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = temp_file("partial");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "skip_secs": 15.0 }"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.skip_secs, 15.0);
        assert_eq!(settings.read_parallelism, 4);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let path = temp_file("invalid");
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        for body in [
            r#"{ "skip_secs": -10.0 }"#,
            r#"{ "restart_threshold_secs": -1.0 }"#,
            r#"{ "read_parallelism": 0 }"#,
            r#"{ "slideshow_interval_secs": 0 }"#,
        ] {
            fs::write(&path, body).unwrap();
            assert!(Settings::load_from(&path).is_err(), "accepted {}", body);
        }

        fs::write(&path, r#"{ "restart_threshold_secs": 0.0 }"#).unwrap();
        assert!(Settings::load_from(&path).is_ok());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_data_dir_override_wins() {
        let settings = Settings {
            data_dir: Some(PathBuf::from("/from/settings")),
            ..Settings::default()
        };
        assert_eq!(
            settings.data_dir(Some(PathBuf::from("/from/cli"))).unwrap(),
            PathBuf::from("/from/cli")
        );
        assert_eq!(
            settings.data_dir(None).unwrap(),
            PathBuf::from("/from/settings")
        );
    }
}
