//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Master radio settings
    pub master: MasterSettings,
    /// Recording session settings
    pub session: SessionSettings,
    /// Packet ingestion settings
    pub ingest: IngestSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Wireless master configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterSettings {
    /// Desired update rate in Hz (the closest supported rate is applied)
    pub update_rate: u32,
    /// Radio channel (11-25)
    pub radio_channel: u8,
}

/// Recording session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Name of the recording file created by the master
    pub log_file: String,
    /// Start automatically once this many trackers are connected
    pub expected_trackers: Option<usize>,
    /// Seconds to wait for trackers before giving up
    pub connect_timeout: Option<u64>,
    /// Seconds to wait for first data from every tracker
    pub first_data_timeout: Option<u64>,
}

/// Ingestion configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSettings {
    /// Packets retained per tracker before the oldest are dropped
    pub queue_capacity: usize,
    /// Print every Nth orientation batch
    pub print_every: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
