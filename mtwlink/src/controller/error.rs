//! Controller error types.

use std::time::Duration;

use thiserror::Error;

use super::state::MasterState;
use crate::device::{DeviceError, DeviceId};

/// Fatal errors of a controller run.
///
/// Every error aborts the run; teardown still closes the control handle.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("no wireless master found on any port")]
    NoMasterFound,

    #[error("failed to open master on port {port}")]
    PortOpen {
        port: String,
        #[source]
        source: DeviceError,
    },

    #[error("failed to put master into configuration mode")]
    ConfigMode {
        #[source]
        source: DeviceError,
    },

    #[error("failed to set update rate to {rate} Hz")]
    RateSet {
        rate: u32,
        #[source]
        source: DeviceError,
    },

    #[error("failed to disable radio")]
    RadioDisable {
        #[source]
        source: DeviceError,
    },

    #[error("failed to enable radio on channel {channel}")]
    RadioEnable {
        channel: u8,
        #[source]
        source: DeviceError,
    },

    #[error("failed to put master into measurement mode")]
    MeasurementMode {
        #[source]
        source: DeviceError,
    },

    #[error("failed to create device for tracker {device}")]
    TrackerInstantiation { device: DeviceId },

    #[error("no trackers connected")]
    NoTrackersConnected,

    #[error("failed to create log file {file}")]
    LogCreation {
        file: String,
        #[source]
        source: DeviceError,
    },

    #[error("failed to start recording")]
    RecordingStart {
        #[source]
        source: DeviceError,
    },

    #[error("failed to stop recording")]
    RecordingStop {
        #[source]
        source: DeviceError,
    },

    #[error("timed out after {timeout:?} waiting for trackers ({connected} connected)")]
    ConnectTimeout { timeout: Duration, connected: usize },

    #[error("timed out after {timeout:?} waiting for first data ({pending} trackers silent)")]
    FirstDataTimeout { timeout: Duration, pending: usize },

    #[error("cancelled while {state}")]
    Cancelled { state: MasterState },

    #[error("controller panicked: {message}")]
    Panicked { message: String },

    #[error("controller already started (state: {state})")]
    AlreadyStarted { state: MasterState },
}

impl ControllerError {
    /// Short name of the step that failed.
    pub fn step(&self) -> &'static str {
        match self {
            Self::NoMasterFound => "scan ports",
            Self::PortOpen { .. } => "open port",
            Self::ConfigMode { .. } => "enter configuration mode",
            Self::RateSet { .. } => "set update rate",
            Self::RadioDisable { .. } => "disable radio",
            Self::RadioEnable { .. } => "enable radio",
            Self::MeasurementMode { .. } => "enter measurement mode",
            Self::TrackerInstantiation { .. } | Self::NoTrackersConnected => "create trackers",
            Self::LogCreation { .. } => "create log file",
            Self::RecordingStart { .. } => "start recording",
            Self::RecordingStop { .. } => "stop recording",
            Self::ConnectTimeout { .. } => "wait for trackers",
            Self::FirstDataTimeout { .. } => "wait for first data",
            Self::Cancelled { .. } => "cancelled",
            Self::Panicked { .. } => "internal error",
            Self::AlreadyStarted { .. } => "start controller",
        }
    }

    /// True if the run ended because the caller cancelled it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_source_is_device_error() {
        let err = ControllerError::RadioEnable {
            channel: 19,
            source: DeviceError::rejected("enable_radio", "busy"),
        };
        assert_eq!(err.to_string(), "failed to enable radio on channel 19");
        assert_eq!(err.step(), "enable radio");
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("enable_radio rejected: busy".to_string())
        );
    }

    #[test]
    fn test_cancelled_names_state() {
        let err = ControllerError::Cancelled {
            state: MasterState::AwaitingTrackers,
        };
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "cancelled while awaiting trackers");
    }
}
