//! Default values and constants for all configuration settings.

use super::settings::*;
use crate::controller::{DEFAULT_LOG_FILE, DEFAULT_RADIO_CHANNEL, DEFAULT_UPDATE_RATE};
use crate::ingest::DEFAULT_QUEUE_CAPACITY;

/// Lowest radio channel a master accepts.
pub const MIN_RADIO_CHANNEL: u8 = 11;

/// Highest radio channel a master accepts.
pub const MAX_RADIO_CHANNEL: u8 = 25;

/// Default throttle for printed orientation batches.
pub const DEFAULT_PRINT_EVERY: u64 = 1;

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            master: MasterSettings {
                update_rate: DEFAULT_UPDATE_RATE,
                radio_channel: DEFAULT_RADIO_CHANNEL,
            },
            session: SessionSettings {
                log_file: DEFAULT_LOG_FILE.to_string(),
                expected_trackers: None,
                connect_timeout: None,
                first_data_timeout: None,
            },
            ingest: IngestSettings {
                queue_capacity: DEFAULT_QUEUE_CAPACITY,
                print_every: DEFAULT_PRINT_EVERY,
            },
            logging: LoggingSettings {
                file: crate::logging::default_log_path(),
            },
        }
    }
}
