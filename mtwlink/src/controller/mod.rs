//! Master controller state machine.
//!
//! [`MasterController`] sequences a whole recording run against a
//! [`DeviceControl`]:
//!
//! 1. Scan ports and open the first wireless master
//! 2. Enter configuration mode, select the update rate, cycle the radio
//! 3. Wait until the operator starts (or enough trackers are connected)
//! 4. Enter measurement mode and build one [`TrackerSession`] per tracker
//! 5. Create the log file, wait for first data from every tracker, record
//! 6. Drain packets through the [`IngestionLoop`] until stopped
//! 7. Stop recording, return to configuration mode, disable the radio
//!
//! Any failure aborts the remaining steps. The control handle is closed on
//! every exit path, including panics and a dropped run future.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mtwlink::controller::{ControllerConfig, ManualOperator, MasterController};
//! use mtwlink::device::SimulatedControl;
//! use mtwlink::ingest::TracingSink;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let control = Arc::new(SimulatedControl::with_trackers(2));
//! let config = ControllerConfig::default().with_expected_trackers(Some(2));
//! let controller = MasterController::new(control, config);
//! let operator = ManualOperator::new();
//! let summary = controller
//!     .run(&operator, &mut TracingSink, CancellationToken::new())
//!     .await;
//! # }
//! ```

mod config;
mod error;
mod operator;
mod rate;
mod state;

pub use config::{
    ControllerConfig, DEFAULT_CONNECT_POLL_INTERVAL, DEFAULT_FIRST_DATA_POLL_INTERVAL,
    DEFAULT_IDLE_WAIT, DEFAULT_LOG_FILE, DEFAULT_RADIO_CHANNEL, DEFAULT_UPDATE_RATE,
};
pub use error::ControllerError;
pub use operator::{ManualOperator, Operator};
pub use rate::select_update_rate;
pub use state::MasterState;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::connectivity::ConnectivitySet;
use crate::device::{ConnectivityHandler, Device, DeviceControl, DeviceError, DeviceId};
use crate::ingest::{IngestStats, IngestionLoop, OrientationSink, TrackerSession};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Recorded trackers in session order.
    pub trackers: Vec<DeviceId>,
    /// Update rate actually applied.
    pub update_rate: u32,
    pub radio_channel: u8,
    pub stats: IngestStats,
}

/// Drives one wireless master through a recording run.
///
/// A controller is single use: a second call to [`run`](Self::run) fails
/// with [`ControllerError::AlreadyStarted`].
pub struct MasterController {
    control: Arc<dyn DeviceControl>,
    config: ControllerConfig,
    state: Mutex<MasterState>,
    started: AtomicBool,
}

impl MasterController {
    pub fn new(control: Arc<dyn DeviceControl>, config: ControllerConfig) -> Self {
        Self {
            control,
            config,
            state: Mutex::new(MasterState::Idle),
            started: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> MasterState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, operator: &dyn Operator, next: MasterState) {
        let previous = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *state, next)
        };
        debug!(from = %previous, to = %next, "Controller state change");
        operator.state_changed(next);
    }

    /// Run the full sequence.
    ///
    /// # Arguments
    ///
    /// * `operator` - Source of the start and stop signals
    /// * `sink` - Receives orientation batches while draining
    /// * `cancel` - Aborts the waits with [`ControllerError::Cancelled`];
    ///   while draining it stops ingestion and the run finishes normally
    pub async fn run(
        &self,
        operator: &dyn Operator,
        sink: &mut dyn OrientationSink,
        cancel: CancellationToken,
    ) -> Result<RunSummary, ControllerError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ControllerError::AlreadyStarted {
                state: self.state(),
            });
        }

        let _teardown = Teardown {
            control: self.control.as_ref(),
        };

        let outcome = AssertUnwindSafe(self.execute(operator, sink, &cancel))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(ControllerError::Panicked {
                    message: panic_message(payload.as_ref()),
                })
            });

        match &outcome {
            Ok(summary) => {
                self.transition(operator, MasterState::Stopped);
                info!(
                    trackers = summary.trackers.len(),
                    packets = summary.stats.packets_drained,
                    "Run finished"
                );
            }
            Err(e) => {
                error!(step = e.step(), error = %e, "Run aborted");
                self.transition(operator, MasterState::Failed);
            }
        }

        outcome
    }

    async fn execute(
        &self,
        operator: &dyn Operator,
        sink: &mut dyn OrientationSink,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, ControllerError> {
        let master = self.open_master()?;
        self.transition(operator, MasterState::PortOpened);

        let connectivity = Arc::new(ConnectivitySet::new());
        let update_rate = self.configure(master.as_ref(), &connectivity)?;
        self.transition(operator, MasterState::Configured);

        self.transition(operator, MasterState::AwaitingTrackers);
        self.await_trackers(&connectivity, operator, cancel).await?;

        let notify = Arc::new(Notify::new());
        let sessions = self.create_sessions(master.as_ref(), &notify)?;
        self.transition(operator, MasterState::Recording);

        self.arm_recording(master.as_ref(), &sessions, cancel).await?;
        self.transition(operator, MasterState::Measuring);

        self.transition(operator, MasterState::Draining);
        let stats = IngestionLoop::new(
            &sessions,
            notify,
            self.config.publish_every,
            self.config.idle_wait,
        )
        .run(sink, cancel, || operator.stop_requested())
        .await;

        self.restore(master.as_ref())?;

        Ok(RunSummary {
            trackers: sessions.iter().map(|s| s.id()).collect(),
            update_rate,
            radio_channel: self.config.radio_channel,
            stats,
        })
    }

    /// Step 1: find and open the master.
    fn open_master(&self) -> Result<Arc<dyn Device>, ControllerError> {
        info!("Scanning for devices");
        let ports = self.control.scan_ports();
        for port in &ports {
            debug!(port = %port, master = port.is_wireless_master(), "Found port");
        }

        let port = ports
            .into_iter()
            .find(|p| p.is_wireless_master())
            .ok_or(ControllerError::NoMasterFound)?;
        info!(
            port = %port.port_name,
            baudrate = port.baudrate,
            master = %port.device_id,
            "Opening master"
        );

        self.control
            .open_port(&port)
            .map_err(|source| ControllerError::PortOpen {
                port: port.port_name.clone(),
                source,
            })?;

        self.control
            .device(port.device_id)
            .ok_or_else(|| ControllerError::PortOpen {
                port: port.port_name.clone(),
                source: DeviceError::NotFound {
                    device: port.device_id,
                },
            })
    }

    /// Step 2: configuration mode, update rate and radio. Returns the applied rate.
    fn configure(
        &self,
        master: &dyn Device,
        connectivity: &Arc<ConnectivitySet>,
    ) -> Result<u32, ControllerError> {
        master
            .goto_config()
            .map_err(|source| ControllerError::ConfigMode { source })?;

        master.add_connectivity_handler(Arc::clone(connectivity) as Arc<dyn ConnectivityHandler>);

        let supported = master.supported_update_rates();
        let rate = select_update_rate(&supported, self.config.update_rate);
        if rate != self.config.update_rate {
            warn!(
                desired = self.config.update_rate,
                selected = rate,
                ?supported,
                "Desired update rate not supported"
            );
        }
        info!(rate, "Setting update rate");
        master
            .set_update_rate(rate)
            .map_err(|source| ControllerError::RateSet { rate, source })?;

        if master.is_radio_enabled() {
            info!("Radio already enabled, disabling first");
            master
                .disable_radio()
                .map_err(|source| ControllerError::RadioDisable { source })?;
        }

        let channel = self.config.radio_channel;
        info!(channel, "Enabling radio");
        master
            .enable_radio(channel)
            .map_err(|source| ControllerError::RadioEnable { channel, source })?;

        Ok(rate)
    }

    /// Step 3: poll the connectivity set until a start condition.
    async fn await_trackers(
        &self,
        connectivity: &ConnectivitySet,
        operator: &dyn Operator,
        cancel: &CancellationToken,
    ) -> Result<(), ControllerError> {
        let started_at = Instant::now();
        let mut last_count = connectivity.snapshot().len();

        info!(expected = ?self.config.expected_trackers, "Waiting for trackers");
        loop {
            let count = connectivity.snapshot().len();
            if count != last_count {
                info!(connected = count, "Trackers connected");
                operator.tracker_count_changed(count);
                last_count = count;
            }

            if operator.start_requested() {
                info!(connected = count, "Start requested");
                return Ok(());
            }
            if let Some(expected) = self.config.expected_trackers {
                if count >= expected {
                    info!(connected = count, "Expected trackers connected");
                    return Ok(());
                }
            }
            if let Some(timeout) = self.config.connect_timeout {
                if started_at.elapsed() >= timeout {
                    return Err(ControllerError::ConnectTimeout {
                        timeout,
                        connected: count,
                    });
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(ControllerError::Cancelled {
                        state: MasterState::AwaitingTrackers,
                    });
                }
                _ = tokio::time::sleep(self.config.connect_poll_interval) => {}
            }
        }
    }

    /// Step 4: measurement mode and one session per enumerated tracker.
    fn create_sessions(
        &self,
        master: &dyn Device,
        notify: &Arc<Notify>,
    ) -> Result<Vec<TrackerSession>, ControllerError> {
        info!("Entering measurement mode");
        master
            .goto_measurement()
            .map_err(|source| ControllerError::MeasurementMode { source })?;

        let tracker_ids: Vec<DeviceId> = self
            .control
            .device_ids()
            .into_iter()
            .filter(|id| id.is_tracker())
            .collect();
        if tracker_ids.is_empty() {
            return Err(ControllerError::NoTrackersConnected);
        }

        let mut sessions = Vec::with_capacity(tracker_ids.len());
        for (index, id) in tracker_ids.into_iter().enumerate() {
            let device = self
                .control
                .device(id)
                .ok_or(ControllerError::TrackerInstantiation { device: id })?;
            let session =
                TrackerSession::new(index, device, self.config.queue_capacity, Arc::clone(notify));
            session.attach();
            info!(index, tracker = %id, "Tracker session created");
            sessions.push(session);
        }

        Ok(sessions)
    }

    /// Step 5: log file, first data from every tracker, start recording.
    async fn arm_recording(
        &self,
        master: &dyn Device,
        sessions: &[TrackerSession],
        cancel: &CancellationToken,
    ) -> Result<(), ControllerError> {
        let file = &self.config.log_file;
        info!(file = %file, "Creating log file");
        master
            .create_log_file(file)
            .map_err(|source| ControllerError::LogCreation {
                file: file.clone(),
                source,
            })?;

        let started_at = Instant::now();
        let mut seen = vec![false; sessions.len()];
        loop {
            for (flag, session) in seen.iter_mut().zip(sessions) {
                if !*flag && session.has_data() {
                    debug!(tracker = %session.id(), "First data received");
                    *flag = true;
                }
            }

            let pending = seen.iter().filter(|s| !**s).count();
            if pending == 0 {
                break;
            }
            if let Some(timeout) = self.config.first_data_timeout {
                if started_at.elapsed() >= timeout {
                    return Err(ControllerError::FirstDataTimeout { timeout, pending });
                }
            }

            debug!(pending, "Waiting for first data");
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(ControllerError::Cancelled {
                        state: MasterState::Recording,
                    });
                }
                _ = tokio::time::sleep(self.config.first_data_poll_interval) => {}
            }
        }

        info!("Starting recording");
        master
            .start_recording()
            .map_err(|source| ControllerError::RecordingStart { source })
    }

    /// Step 7: undo what steps 2 and 5 changed.
    ///
    /// Every step is attempted even if an earlier one fails, so the radio
    /// is never left enabled. The first failure is returned.
    fn restore(&self, master: &dyn Device) -> Result<(), ControllerError> {
        info!("Stopping recording");
        let stopped = master
            .stop_recording()
            .map_err(|source| ControllerError::RecordingStop { source });
        if let Err(e) = &stopped {
            warn!(error = %e, "Continuing teardown after failed stop");
        }

        info!("Setting config mode");
        let configured = master
            .goto_config()
            .map_err(|source| ControllerError::ConfigMode { source });
        if let Err(e) = &configured {
            warn!(error = %e, "Continuing teardown after failed mode switch");
        }

        info!("Disabling radio");
        let disabled = master
            .disable_radio()
            .map_err(|source| ControllerError::RadioDisable { source });

        stopped.and(configured).and(disabled)
    }
}

/// Closes the control handle when the run ends, however it ends.
struct Teardown<'a> {
    control: &'a dyn DeviceControl,
}

impl Drop for Teardown<'_> {
    fn drop(&mut self) {
        info!("Closing device control");
        self.control.close();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
