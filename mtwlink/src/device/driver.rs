//! Traits at the boundary between the core and a device driver.
//!
//! A driver binding implements [`DeviceControl`] (the control handle that
//! scans, opens and hands out devices) and [`Device`] (one master or tracker).
//! Asynchronous notifications flow back through the two handler traits,
//! which the core implements with its thread-safe structures.
//!
//! Handlers are invoked on driver-owned threads. Implementations must only
//! do bounded, non-blocking work there.

use std::sync::Arc;

use thiserror::Error;

use super::types::{ConnectivityState, DeviceId, Packet, PortInfo};

/// Errors reported by a device driver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    /// The device refused the operation.
    #[error("{operation} rejected: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },

    /// The device answered with a non-OK status code.
    #[error("{operation} returned status {code}")]
    Status { operation: &'static str, code: u32 },

    /// The device does not implement the operation (e.g. radio on a tracker).
    #[error("{operation} is not supported by this device")]
    Unsupported { operation: &'static str },

    /// No device with this identity is known to the driver.
    #[error("device {device} not found")]
    NotFound { device: DeviceId },
}

impl DeviceError {
    pub fn rejected(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Rejected {
            operation,
            reason: reason.into(),
        }
    }
}

/// Receives wireless association changes from a master.
pub trait ConnectivityHandler: Send + Sync {
    fn on_connectivity_changed(&self, device: DeviceId, state: ConnectivityState);
}

/// Receives live packets from a tracker.
pub trait DataHandler: Send + Sync {
    fn on_live_data(&self, device: DeviceId, packet: Packet);
}

/// One opened master or tracker.
pub trait Device: Send + Sync {
    /// Identity of this device.
    fn device_id(&self) -> DeviceId;

    /// Enter configuration mode.
    fn goto_config(&self) -> Result<(), DeviceError>;

    /// Enter measurement mode.
    fn goto_measurement(&self) -> Result<(), DeviceError>;

    /// Register a handler for connectivity changes of associated trackers.
    fn add_connectivity_handler(&self, handler: Arc<dyn ConnectivityHandler>);

    /// Register a handler for live packets produced by this device.
    fn add_data_handler(&self, handler: Arc<dyn DataHandler>);

    /// Update rates (Hz) valid for the current configuration.
    fn supported_update_rates(&self) -> Vec<u32>;

    fn set_update_rate(&self, rate_hz: u32) -> Result<(), DeviceError>;

    fn is_radio_enabled(&self) -> bool;

    fn disable_radio(&self) -> Result<(), DeviceError>;

    fn enable_radio(&self, channel: u8) -> Result<(), DeviceError>;

    /// Ask the master to open a recording artifact it manages itself.
    fn create_log_file(&self, name: &str) -> Result<(), DeviceError>;

    fn start_recording(&self) -> Result<(), DeviceError>;

    fn stop_recording(&self) -> Result<(), DeviceError>;
}

/// The control handle of a driver stack.
pub trait DeviceControl: Send + Sync {
    /// Enumerate ports with an attached device.
    fn scan_ports(&self) -> Vec<PortInfo>;

    /// Open a scanned port so its device becomes available.
    fn open_port(&self, port: &PortInfo) -> Result<(), DeviceError>;

    /// Resolve an identity to a live device handle.
    fn device(&self, id: DeviceId) -> Option<Arc<dyn Device>>;

    /// Every device currently known to the control handle, in enumeration order.
    fn device_ids(&self) -> Vec<DeviceId>;

    /// Release all ports and stop every driver thread.
    fn close(&self);
}
