//! Configuration file handling for ~/.mtwlink/config.ini.
//!
//! Loads and saves user configuration with sensible defaults.
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

pub use super::settings::*;

use crate::controller::ControllerConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.mtwlink/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.mtwlink/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }

    /// Runtime settings for a controller run.
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig::default()
            .with_update_rate(self.master.update_rate)
            .with_radio_channel(self.master.radio_channel)
            .with_log_file(self.session.log_file.clone())
            .with_expected_trackers(self.session.expected_trackers)
            .with_connect_timeout(self.session.connect_timeout.map(Duration::from_secs))
            .with_first_data_timeout(self.session.first_data_timeout.map(Duration::from_secs))
            .with_queue_capacity(self.ingest.queue_capacity)
            .with_publish_every(self.ingest.print_every)
    }
}

/// Get the path to the config directory (~/.mtwlink).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mtwlink")
}

/// Get the path to the config file (~/.mtwlink/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.master.update_rate, 75);
        assert_eq!(config.master.radio_channel, 19);
        assert_eq!(config.session.log_file, "logfile.mtb");
        assert!(config.session.expected_trackers.is_none());
        assert_eq!(config.ingest.queue_capacity, 300);
        assert_eq!(config.ingest.print_every, DEFAULT_PRINT_EVERY);
        assert!(config.logging.file.ends_with("mtwlink.log"));
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sub").join("config.ini");

        let mut config = ConfigFile::default();
        config.master.update_rate = 100;
        config.master.radio_channel = 11;
        config.session.expected_trackers = Some(4);
        config.session.connect_timeout = Some(30);
        config.ingest.print_every = 10;
        config.save_to(&config_path).unwrap();

        let loaded = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_controller_config_conversion() {
        let mut config = ConfigFile::default();
        config.master.update_rate = 120;
        config.session.expected_trackers = Some(2);
        config.session.first_data_timeout = Some(5);
        config.ingest.queue_capacity = 50;

        let runtime = config.controller_config();
        assert_eq!(runtime.update_rate, 120);
        assert_eq!(runtime.radio_channel, 19);
        assert_eq!(runtime.expected_trackers, Some(2));
        assert!(runtime.connect_timeout.is_none());
        assert_eq!(runtime.first_data_timeout, Some(Duration::from_secs(5)));
        assert_eq!(runtime.queue_capacity, 50);
        assert_eq!(runtime.publish_every, 1);
    }
}
