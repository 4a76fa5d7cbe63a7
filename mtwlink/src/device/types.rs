//! Value types exchanged with the device layer.
//!
//! - [`DeviceId`] - Identity of a master or tracker, used as a set/map key
//! - [`PortInfo`] - One entry of a port scan
//! - [`ConnectivityState`] / [`ConnectivityEvent`] - Wireless association changes
//! - [`Packet`] / [`EulerAngles`] - Live samples delivered by a tracker

use std::fmt;
use std::time::Instant;

/// Role a device reports about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceRole {
    /// Radio base unit coordinating the wireless trackers.
    WirelessMaster,
    /// Wireless inertial measurement unit.
    Tracker,
    /// Anything else found on a scanned port.
    Other,
}

/// Unique device identifier.
///
/// Two identifiers are equal only when both serial and role match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId {
    serial: u32,
    role: DeviceRole,
}

impl DeviceId {
    /// Create an identifier from a serial number and role.
    pub fn new(serial: u32, role: DeviceRole) -> Self {
        Self { serial, role }
    }

    /// Identifier of a wireless master.
    pub fn master(serial: u32) -> Self {
        Self::new(serial, DeviceRole::WirelessMaster)
    }

    /// Identifier of a wireless tracker.
    pub fn tracker(serial: u32) -> Self {
        Self::new(serial, DeviceRole::Tracker)
    }

    /// Serial number.
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Role reported by the device.
    pub fn role(&self) -> DeviceRole {
        self.role
    }

    /// True if this device advertises the wireless-master role.
    pub fn is_wireless_master(&self) -> bool {
        self.role() == DeviceRole::WirelessMaster
    }

    /// True if this device is a wireless tracker.
    pub fn is_tracker(&self) -> bool {
        self.role() == DeviceRole::Tracker
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.serial)
    }
}

/// One port found by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Identity of the device attached to the port.
    pub device_id: DeviceId,
    /// OS port name (e.g. `/dev/ttyUSB0`, `COM3`).
    pub port_name: String,
    /// Baud rate the device was detected at.
    pub baudrate: u32,
}

impl PortInfo {
    pub fn new(device_id: DeviceId, port_name: impl Into<String>, baudrate: u32) -> Self {
        Self {
            device_id,
            port_name: port_name.into(),
            baudrate,
        }
    }

    /// True if the device on this port is a wireless master.
    pub fn is_wireless_master(&self) -> bool {
        self.device_id.is_wireless_master()
    }
}

impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Port: {} @ {:>7} Bd, ID: {}",
            self.port_name, self.baudrate, self.device_id
        )
    }
}

/// Wireless association state reported for a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectivityState {
    /// Associated with the master over the radio.
    Connected,
    /// Lost the radio link.
    Disconnected,
    /// Refused by the master.
    Rejected,
    /// Plugged into a wired dock.
    PluggedIn,
    /// Replaying from a file rather than live.
    FileMode,
    /// State could not be determined.
    Unknown,
    /// Device reported an error.
    Error,
}

impl ConnectivityState {
    /// Only a wireless connection counts as available for measurement.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "Connected"),
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Rejected => write!(f, "Rejected"),
            Self::PluggedIn => write!(f, "PluggedIn"),
            Self::FileMode => write!(f, "File"),
            Self::Unknown => write!(f, "Unknown"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// A connectivity change for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityEvent {
    pub device: DeviceId,
    pub state: ConnectivityState,
}

impl ConnectivityEvent {
    pub fn new(device: DeviceId, state: ConnectivityState) -> Self {
        Self { device, state }
    }
}

/// Orientation as roll/pitch/yaw in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl EulerAngles {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }
}

/// One live sample from a tracker.
///
/// Packets are immutable once handed to the core. Only the orientation is
/// interpreted; everything else the device layer decodes stays opaque.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    counter: u32,
    received_at: Instant,
    orientation: Option<EulerAngles>,
}

impl Packet {
    /// Create a packet stamped with the current time.
    pub fn new(counter: u32, orientation: Option<EulerAngles>) -> Self {
        Self {
            counter,
            received_at: Instant::now(),
            orientation,
        }
    }

    /// Create a packet carrying an orientation sample.
    pub fn with_orientation(counter: u32, orientation: EulerAngles) -> Self {
        Self::new(counter, Some(orientation))
    }

    /// Device-side sample counter.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// When the packet reached the core.
    pub fn received_at(&self) -> Instant {
        self.received_at
    }

    /// Orientation carried by this packet, if the device included one.
    pub fn orientation_euler(&self) -> Option<EulerAngles> {
        self.orientation
    }
}
