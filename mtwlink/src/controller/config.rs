//! Runtime configuration for a controller run.

use std::time::Duration;

use crate::ingest::DEFAULT_QUEUE_CAPACITY;

pub const DEFAULT_UPDATE_RATE: u32 = 75;
pub const DEFAULT_RADIO_CHANNEL: u8 = 19;
pub const DEFAULT_LOG_FILE: &str = "logfile.mtb";
pub const DEFAULT_CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_FIRST_DATA_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_IDLE_WAIT: Duration = Duration::from_millis(10);

/// Settings for [`MasterController`](super::MasterController).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Desired update rate in Hz; the closest supported rate is used.
    pub update_rate: u32,
    pub radio_channel: u8,
    /// Name of the recording artifact the master creates.
    pub log_file: String,
    pub queue_capacity: usize,
    /// Publish every Nth ingestion batch.
    pub publish_every: u64,
    /// Start automatically once this many trackers are connected.
    pub expected_trackers: Option<usize>,
    pub connect_poll_interval: Duration,
    pub first_data_poll_interval: Duration,
    pub connect_timeout: Option<Duration>,
    pub first_data_timeout: Option<Duration>,
    /// Longest the ingestion loop parks when no queue has data.
    pub idle_wait: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            update_rate: DEFAULT_UPDATE_RATE,
            radio_channel: DEFAULT_RADIO_CHANNEL,
            log_file: DEFAULT_LOG_FILE.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            publish_every: 1,
            expected_trackers: None,
            connect_poll_interval: DEFAULT_CONNECT_POLL_INTERVAL,
            first_data_poll_interval: DEFAULT_FIRST_DATA_POLL_INTERVAL,
            connect_timeout: None,
            first_data_timeout: None,
            idle_wait: DEFAULT_IDLE_WAIT,
        }
    }
}

impl ControllerConfig {
    pub fn with_update_rate(mut self, rate: u32) -> Self {
        self.update_rate = rate;
        self
    }

    pub fn with_radio_channel(mut self, channel: u8) -> Self {
        self.radio_channel = channel;
        self
    }

    pub fn with_log_file(mut self, name: impl Into<String>) -> Self {
        self.log_file = name.into();
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_publish_every(mut self, every: u64) -> Self {
        self.publish_every = every;
        self
    }

    pub fn with_expected_trackers(mut self, count: Option<usize>) -> Self {
        self.expected_trackers = count;
        self
    }

    pub fn with_connect_poll_interval(mut self, interval: Duration) -> Self {
        self.connect_poll_interval = interval;
        self
    }

    pub fn with_first_data_poll_interval(mut self, interval: Duration) -> Self {
        self.first_data_poll_interval = interval;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_first_data_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.first_data_timeout = timeout;
        self
    }

    pub fn with_idle_wait(mut self, wait: Duration) -> Self {
        self.idle_wait = wait;
        self
    }
}
