//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::Ini;

use super::defaults::{MAX_RADIO_CHANNEL, MIN_RADIO_CHANNEL};
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [master] section
    if let Some(section) = ini.section(Some("master")) {
        if let Some(v) = section.get("update_rate") {
            config.master.update_rate = parse_positive("master", "update_rate", v)?;
        }
        if let Some(v) = section.get("radio_channel") {
            let channel: u8 = v.trim().parse().map_err(|_| channel_error(v))?;
            if !(MIN_RADIO_CHANNEL..=MAX_RADIO_CHANNEL).contains(&channel) {
                return Err(channel_error(v));
            }
            config.master.radio_channel = channel;
        }
    }

    // [session] section
    if let Some(section) = ini.section(Some("session")) {
        if let Some(v) = section.get("log_file") {
            let v = v.trim();
            if v.is_empty() {
                return Err(invalid("session", "log_file", v, "must not be empty"));
            }
            config.session.log_file = v.to_string();
        }
        if let Some(v) = section.get("expected_trackers") {
            config.session.expected_trackers =
                parse_optional_positive("session", "expected_trackers", v)?;
        }
        if let Some(v) = section.get("connect_timeout") {
            config.session.connect_timeout =
                parse_optional_positive("session", "connect_timeout", v)?;
        }
        if let Some(v) = section.get("first_data_timeout") {
            config.session.first_data_timeout =
                parse_optional_positive("session", "first_data_timeout", v)?;
        }
    }

    // [ingest] section
    if let Some(section) = ini.section(Some("ingest")) {
        if let Some(v) = section.get("queue_capacity") {
            config.ingest.queue_capacity = parse_positive("ingest", "queue_capacity", v)?;
        }
        if let Some(v) = section.get("print_every") {
            config.ingest.print_every = parse_positive("ingest", "print_every", v)?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn channel_error(value: &str) -> ConfigFileError {
    invalid(
        "master",
        "radio_channel",
        value,
        &format!(
            "must be an integer between {} and {}",
            MIN_RADIO_CHANNEL, MAX_RADIO_CHANNEL
        ),
    )
}

/// Parse an integer greater than zero.
fn parse_positive<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(invalid(section, key, value, "must be a positive integer")),
    }
}

/// Like [`parse_positive`], but an empty value means "not set".
fn parse_optional_positive<T>(
    section: &str,
    key: &str,
    value: &str,
) -> Result<Option<T>, ConfigFileError>
where
    T: FromStr + PartialOrd + Default,
{
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_positive(section, key, value).map(Some)
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_overlays_values() {
        let config = parse(
            r#"
[master]
update_rate = 120
radio_channel = 25

[session]
log_file = take1.mtb
expected_trackers = 6
connect_timeout = 60
first_data_timeout =

[ingest]
queue_capacity = 500
print_every = 5
"#,
        )
        .unwrap();

        assert_eq!(config.master.update_rate, 120);
        assert_eq!(config.master.radio_channel, 25);
        assert_eq!(config.session.log_file, "take1.mtb");
        assert_eq!(config.session.expected_trackers, Some(6));
        assert_eq!(config.session.connect_timeout, Some(60));
        assert_eq!(config.session.first_data_timeout, None);
        assert_eq!(config.ingest.queue_capacity, 500);
        assert_eq!(config.ingest.print_every, 5);
    }

    #[test]
    fn test_channel_out_of_range() {
        for value in ["10", "26", "abc", "-1"] {
            let err = parse(&format!("[master]\nradio_channel = {}\n", value)).unwrap_err();
            match err {
                ConfigFileError::InvalidValue { section, key, .. } => {
                    assert_eq!(section, "master");
                    assert_eq!(key, "radio_channel");
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_zero_rejected_for_positive_keys() {
        assert!(parse("[master]\nupdate_rate = 0\n").is_err());
        assert!(parse("[ingest]\nqueue_capacity = 0\n").is_err());
        assert!(parse("[ingest]\nprint_every = 0\n").is_err());
        assert!(parse("[session]\nexpected_trackers = 0\n").is_err());
    }

    #[test]
    fn test_empty_log_file_rejected() {
        assert!(parse("[session]\nlog_file =\n").is_err());
    }

    #[test]
    fn test_logging_file_expands_tilde() {
        let config = parse("[logging]\nfile = ~/logs/run.log\n").unwrap();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.logging.file, home.join("logs/run.log"));
        }
    }

    #[test]
    fn test_channel_bounds_inclusive() {
        let low = parse(&format!("[master]\nradio_channel = {}\n", MIN_RADIO_CHANNEL)).unwrap();
        let high = parse(&format!("[master]\nradio_channel = {}\n", MAX_RADIO_CHANNEL)).unwrap();
        assert_eq!(low.master.radio_channel, MIN_RADIO_CHANNEL);
        assert_eq!(high.master.radio_channel, MAX_RADIO_CHANNEL);
    }
}
