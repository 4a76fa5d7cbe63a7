//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::defaults::{MAX_RADIO_CHANNEL, MIN_RADIO_CHANNEL};
use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[master]
; Desired update rate in Hz. If the master does not support it for the
; current number of trackers, the closest supported rate is used.
update_rate = {}
; Radio channel ({}-{})
radio_channel = {}

[session]
; Recording file created by the master when measurement starts
log_file = {}
; Start automatically once this many trackers are connected.
; Leave empty to wait for the operator to press 'y'.
expected_trackers = {}
; Seconds to wait for trackers to connect (empty = wait forever)
connect_timeout = {}
; Seconds to wait for the first packet from every tracker (empty = wait forever)
first_data_timeout = {}

[ingest]
; Packets kept per tracker before the oldest are dropped
queue_capacity = {}
; Print every Nth orientation update (1 = every update)
print_every = {}

[logging]
; Log file location
file = {}
"#,
        config.master.update_rate,
        MIN_RADIO_CHANNEL,
        MAX_RADIO_CHANNEL,
        config.master.radio_channel,
        config.session.log_file,
        optional(config.session.expected_trackers),
        optional(config.session.connect_timeout),
        optional(config.session.first_data_timeout),
        config.ingest.queue_capacity,
        config.ingest.print_every,
        path_to_string(&config.logging.file),
    )
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Convert path to string, collapsing home dir to ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
