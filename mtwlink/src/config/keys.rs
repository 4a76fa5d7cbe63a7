//! Configuration key access and validation.
//!
//! This module provides a type-safe interface for getting and setting
//! configuration values by key name, with validation via the Specification Pattern.

use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use super::defaults::{MAX_RADIO_CHANNEL, MIN_RADIO_CHANNEL};
use super::file::ConfigFile;
use super::parser::expand_tilde;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
///
/// Each key maps to a specific field in [`ConfigFile`] and knows how to
/// get and set its value with proper validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    // Master settings
    MasterUpdateRate,
    MasterRadioChannel,

    // Session settings
    SessionLogFile,
    SessionExpectedTrackers,
    SessionConnectTimeout,
    SessionFirstDataTimeout,

    // Ingest settings
    IngestQueueCapacity,
    IngestPrintEvery,

    // Logging settings
    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == lower)
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "master.update_rate").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::MasterUpdateRate => "master.update_rate",
            ConfigKey::MasterRadioChannel => "master.radio_channel",
            ConfigKey::SessionLogFile => "session.log_file",
            ConfigKey::SessionExpectedTrackers => "session.expected_trackers",
            ConfigKey::SessionConnectTimeout => "session.connect_timeout",
            ConfigKey::SessionFirstDataTimeout => "session.first_data_timeout",
            ConfigKey::IngestQueueCapacity => "ingest.queue_capacity",
            ConfigKey::IngestPrintEvery => "ingest.print_every",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Get the section name (e.g., "master").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "update_rate").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config file as a string.
    ///
    /// Unset optional values are returned as an empty string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::MasterUpdateRate => config.master.update_rate.to_string(),
            ConfigKey::MasterRadioChannel => config.master.radio_channel.to_string(),
            ConfigKey::SessionLogFile => config.session.log_file.clone(),
            ConfigKey::SessionExpectedTrackers => {
                optional_to_string(config.session.expected_trackers)
            }
            ConfigKey::SessionConnectTimeout => optional_to_string(config.session.connect_timeout),
            ConfigKey::SessionFirstDataTimeout => {
                optional_to_string(config.session.first_data_timeout)
            }
            ConfigKey::IngestQueueCapacity => config.ingest.queue_capacity.to_string(),
            ConfigKey::IngestPrintEvery => config.ingest.print_every.to_string(),
            ConfigKey::LoggingFile => path_to_display(&config.logging.file),
        }
    }

    /// Set the value in a config file.
    ///
    /// Validates the value according to the key's specification before setting.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let value = value.trim();
        self.validate(value)?;

        let invalid = |reason: &str| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: reason.to_string(),
        };

        match self {
            ConfigKey::MasterUpdateRate => {
                config.master.update_rate = value.parse().map_err(|_| invalid("out of range"))?;
            }
            ConfigKey::MasterRadioChannel => {
                config.master.radio_channel =
                    value.parse().map_err(|_| invalid("out of range"))?;
            }
            ConfigKey::SessionLogFile => {
                config.session.log_file = value.to_string();
            }
            ConfigKey::SessionExpectedTrackers => {
                config.session.expected_trackers =
                    parse_optional(value).map_err(|_| invalid("out of range"))?;
            }
            ConfigKey::SessionConnectTimeout => {
                config.session.connect_timeout =
                    parse_optional(value).map_err(|_| invalid("out of range"))?;
            }
            ConfigKey::SessionFirstDataTimeout => {
                config.session.first_data_timeout =
                    parse_optional(value).map_err(|_| invalid("out of range"))?;
            }
            ConfigKey::IngestQueueCapacity => {
                config.ingest.queue_capacity =
                    value.parse().map_err(|_| invalid("out of range"))?;
            }
            ConfigKey::IngestPrintEvery => {
                config.ingest.print_every = value.parse().map_err(|_| invalid("out of range"))?;
            }
            ConfigKey::LoggingFile => {
                config.logging.file = expand_tilde(value);
            }
        }
        Ok(())
    }

    /// Validate a value according to this key's specification.
    pub fn validate(&self, value: &str) -> Result<(), ConfigKeyError> {
        self.specification()
            .is_satisfied_by(value.trim())
            .map_err(|reason| ConfigKeyError::ValidationFailed {
                key: self.name().to_string(),
                reason,
            })
    }

    /// Get the validation specification for this key.
    fn specification(&self) -> Box<dyn ValueSpecification> {
        match self {
            ConfigKey::MasterUpdateRate => Box::new(PositiveIntegerSpec),
            ConfigKey::MasterRadioChannel => Box::new(RangeSpec {
                min: MIN_RADIO_CHANNEL as u64,
                max: MAX_RADIO_CHANNEL as u64,
            }),
            ConfigKey::SessionLogFile => Box::new(NonEmptySpec),
            ConfigKey::SessionExpectedTrackers
            | ConfigKey::SessionConnectTimeout
            | ConfigKey::SessionFirstDataTimeout => Box::new(OptionalPositiveIntegerSpec),
            ConfigKey::IngestQueueCapacity => Box::new(PositiveIntegerSpec),
            ConfigKey::IngestPrintEvery => Box::new(PositiveIntegerSpec),
            ConfigKey::LoggingFile => Box::new(NonEmptySpec),
        }
    }

    /// Get all supported configuration keys.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::MasterUpdateRate,
            ConfigKey::MasterRadioChannel,
            ConfigKey::SessionLogFile,
            ConfigKey::SessionExpectedTrackers,
            ConfigKey::SessionConnectTimeout,
            ConfigKey::SessionFirstDataTimeout,
            ConfigKey::IngestQueueCapacity,
            ConfigKey::IngestPrintEvery,
            ConfigKey::LoggingFile,
        ]
    }
}

// ============================================================================
// Value Specifications (Specification Pattern)
// ============================================================================

/// Trait for value validation specifications.
trait ValueSpecification {
    /// Returns Ok(()) if valid, Err(reason) if invalid.
    fn is_satisfied_by(&self, value: &str) -> Result<(), String>;
}

/// Integer greater than zero.
struct PositiveIntegerSpec;

impl ValueSpecification for PositiveIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<u64>() {
            Ok(n) if n > 0 => Ok(()),
            _ => Err("must be a positive integer".to_string()),
        }
    }
}

/// Like [`PositiveIntegerSpec`], but empty means "not set".
struct OptionalPositiveIntegerSpec;

impl ValueSpecification for OptionalPositiveIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Ok(());
        }
        PositiveIntegerSpec
            .is_satisfied_by(value)
            .map_err(|reason| format!("{} (or empty)", reason))
    }
}

/// Integer within an inclusive range.
struct RangeSpec {
    min: u64,
    max: u64,
}

impl ValueSpecification for RangeSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<u64>() {
            Ok(n) if (self.min..=self.max).contains(&n) => Ok(()),
            _ => Err(format!(
                "must be an integer between {} and {}",
                self.min, self.max
            )),
        }
    }
}

/// Any non-empty value.
struct NonEmptySpec;

impl ValueSpecification for NonEmptySpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            Err("must not be empty".to_string())
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn optional_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_optional<T: FromStr>(value: &str) -> Result<Option<T>, T::Err> {
    if value.is_empty() {
        Ok(None)
    } else {
        value.parse().map(Some)
    }
}

/// Convert path to display string, collapsing home dir to ~.
fn path_to_display(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_key_parsing() {
        assert_eq!(
            "master.update_rate".parse::<ConfigKey>().unwrap(),
            ConfigKey::MasterUpdateRate
        );
        // Case insensitive
        assert_eq!(
            "SESSION.LOG_FILE".parse::<ConfigKey>().unwrap(),
            ConfigKey::SessionLogFile
        );
        assert!("invalid.key".parse::<ConfigKey>().is_err());
    }

    #[test]
    fn test_section_and_key_name() {
        assert_eq!(ConfigKey::IngestPrintEvery.section(), "ingest");
        assert_eq!(ConfigKey::IngestPrintEvery.key_name(), "print_every");
    }

    #[test]
    fn test_every_key_round_trips_by_name() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
        }
    }

    #[test]
    fn test_get_and_set() {
        let mut config = ConfigFile::default();

        ConfigKey::MasterUpdateRate.set(&mut config, "100").unwrap();
        assert_eq!(ConfigKey::MasterUpdateRate.get(&config), "100");

        ConfigKey::SessionExpectedTrackers.set(&mut config, "3").unwrap();
        assert_eq!(config.session.expected_trackers, Some(3));
        ConfigKey::SessionExpectedTrackers.set(&mut config, "").unwrap();
        assert_eq!(config.session.expected_trackers, None);
        assert_eq!(ConfigKey::SessionExpectedTrackers.get(&config), "");
    }

    #[test]
    fn test_radio_channel_validation() {
        let mut config = ConfigFile::default();
        assert!(ConfigKey::MasterRadioChannel.set(&mut config, "10").is_err());
        assert!(ConfigKey::MasterRadioChannel.set(&mut config, "26").is_err());
        ConfigKey::MasterRadioChannel.set(&mut config, "11").unwrap();
        assert_eq!(config.master.radio_channel, 11);
    }

    #[test]
    fn test_positive_validation() {
        assert!(ConfigKey::IngestQueueCapacity.validate("0").is_err());
        assert!(ConfigKey::IngestQueueCapacity.validate("-5").is_err());
        assert!(ConfigKey::IngestQueueCapacity.validate("300").is_ok());
        assert!(ConfigKey::SessionLogFile.validate("").is_err());
    }

    #[test]
    fn test_overflowing_value_rejected_on_set() {
        let mut config = ConfigFile::default();
        let err = ConfigKey::MasterUpdateRate
            .set(&mut config, "99999999999")
            .unwrap_err();
        assert!(matches!(err, ConfigKeyError::ValidationFailed { .. }));
        assert_eq!(config.master.update_rate, 75);
    }
}
