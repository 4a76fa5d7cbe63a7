//! mtwlink - Wireless motion tracker master control
//!
//! This library drives a wireless motion-capture master through a recording
//! run and streams the trackers' orientation packets to a consumer.
//!
//! - [`device`] - Driver seam (control handle, devices, callbacks) and a simulator
//! - [`connectivity`] - Set of trackers currently associated with the master
//! - [`ingest`] - Bounded per-tracker queues and the draining loop
//! - [`controller`] - The master state machine
//! - [`config`] / [`logging`] - User configuration and tracing setup
//!
//! ```no_run
//! use std::sync::Arc;
//! use mtwlink::controller::{ManualOperator, MasterController};
//! use mtwlink::config::ConfigFile;
//! use mtwlink::device::SimulatedControl;
//! use mtwlink::ingest::TracingSink;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigFile::load()?
//!     .controller_config()
//!     .with_expected_trackers(Some(2));
//! let controller = MasterController::new(Arc::new(SimulatedControl::with_trackers(2)), config);
//! let summary = controller
//!     .run(&ManualOperator::new(), &mut TracingSink, CancellationToken::new())
//!     .await?;
//! println!("recorded {} trackers", summary.trackers.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connectivity;
pub mod controller;
pub mod device;
pub mod ingest;
pub mod logging;

/// Version of the mtwlink library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
