//! Device seam.
//!
//! The core never talks to hardware directly. Everything it needs from a
//! driver stack goes through the traits in [`driver`], and the values that
//! cross the boundary live in [`types`]. [`sim`] provides an in-process
//! implementation used by the CLI and the tests.

mod driver;
pub mod sim;
mod types;

pub use driver::{ConnectivityHandler, DataHandler, Device, DeviceControl, DeviceError};
pub use sim::{SimCall, SimConfig, SimFault, SimulatedControl};
pub use types::{
    ConnectivityEvent, ConnectivityState, DeviceId, DeviceRole, EulerAngles, Packet, PortInfo,
};
