//! In-process simulated driver stack.
//!
//! [`SimulatedControl`] implements [`DeviceControl`] with one wireless master
//! and a configurable set of trackers. It behaves like a real stack from the
//! core's point of view:
//!
//! - Enabling the radio starts a worker thread that associates each tracker
//!   after `connect_delay` and raises `Connected` events.
//! - Entering measurement mode starts a worker thread that streams synthetic
//!   orientation packets for every connected tracker.
//! - Handlers are always invoked from worker threads (or the caller of the
//!   `emit_*` helpers) with no simulator lock held.
//!
//! Every operation is appended to a call log ([`SimCall`]) and any operation
//! can be made to fail with [`SimulatedControl::inject_fault`], which makes
//! the simulator suitable for driving the controller in tests.

use std::collections::{HashMap, HashSet};
use std::f64::consts::TAU;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, trace};

use super::driver::{ConnectivityHandler, DataHandler, Device, DeviceControl, DeviceError};
use super::types::{ConnectivityState, DeviceId, DeviceRole, EulerAngles, Packet, PortInfo};

/// Status code returned when log file creation is made to fail.
pub const SIM_LOG_FILE_ERROR: u32 = 1;

const MASTER_PORT: &str = "/dev/ttyUSB1";
const MASTER_BAUDRATE: u32 = 2_000_000;

/// Simulator configuration.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Serial of the wireless master.
    pub master_serial: u32,
    /// Whether a master is attached at all.
    pub master_present: bool,
    /// Serials of the trackers in range, in enumeration order.
    pub tracker_serials: Vec<u32>,
    /// Update rates the master reports as valid.
    pub supported_rates: Vec<u32>,
    /// Radio state before the controller touches it.
    pub radio_enabled: bool,
    /// Associate trackers automatically once the radio is enabled.
    pub auto_connect: bool,
    /// Delay before each tracker associates.
    pub connect_delay: Duration,
    /// Stream packets automatically in measurement mode.
    pub auto_stream: bool,
    /// Interval between packets; derived from the update rate when `None`.
    pub packet_interval: Option<Duration>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            master_serial: 0x0011_2233,
            master_present: true,
            tracker_serials: vec![0x00B4_2001, 0x00B4_2002],
            supported_rates: vec![60, 75, 80, 100, 120],
            radio_enabled: false,
            auto_connect: true,
            connect_delay: Duration::from_millis(250),
            auto_stream: true,
            packet_interval: None,
        }
    }
}

impl SimConfig {
    /// Default configuration with `count` trackers.
    pub fn with_trackers(count: usize) -> Self {
        Self {
            tracker_serials: (0..count as u32).map(|i| 0x00B4_2001 + i).collect(),
            ..Default::default()
        }
    }
}

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimFault {
    OpenPort,
    ResolveMaster,
    ResolveTracker,
    GotoConfig,
    GotoMeasurement,
    SetUpdateRate,
    DisableRadio,
    EnableRadio,
    CreateLogFile,
    StartRecording,
    StopRecording,
}

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCall {
    ScanPorts,
    OpenPort(String),
    GotoConfig,
    GotoMeasurement,
    SetUpdateRate(u32),
    DisableRadio,
    EnableRadio(u8),
    CreateLogFile(String),
    StartRecording,
    StopRecording,
    Close,
}

#[derive(Default)]
struct SimState {
    calls: Vec<SimCall>,
    faults: HashSet<SimFault>,
    port_open: bool,
    closed: bool,
    radio_enabled: bool,
    radio_channel: Option<u8>,
    update_rate: u32,
    measuring: bool,
    streaming: bool,
    recording: bool,
    log_file: Option<String>,
    connected: Vec<DeviceId>,
    counters: HashMap<DeviceId, u32>,
    connectivity_handlers: Vec<Arc<dyn ConnectivityHandler>>,
    data_handlers: HashMap<DeviceId, Vec<Arc<dyn DataHandler>>>,
}

struct SimInner {
    config: SimConfig,
    state: Mutex<SimState>,
    shutdown: Mutex<bool>,
    wake: Condvar,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl SimInner {
    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn master_id(&self) -> DeviceId {
        DeviceId::master(self.config.master_serial)
    }

    fn tracker_ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.config
            .tracker_serials
            .iter()
            .map(|serial| DeviceId::tracker(*serial))
    }

    /// Record a call and report whether it was made to fail.
    fn record(&self, call: SimCall, fault: Option<SimFault>) -> bool {
        let mut state = self.state();
        state.calls.push(call);
        fault.is_some_and(|f| state.faults.contains(&f))
    }

    fn emit_connectivity(&self, device: DeviceId, new_state: ConnectivityState) {
        let handlers = {
            let mut state = self.state();
            if new_state.is_connected() {
                if !state.connected.contains(&device) {
                    state.connected.push(device);
                }
            } else {
                state.connected.retain(|d| *d != device);
            }
            state.connectivity_handlers.clone()
        };

        trace!(tracker = %device, state = %new_state, "Simulated connectivity change");
        for handler in handlers {
            handler.on_connectivity_changed(device, new_state);
        }
    }

    fn emit_packet(&self, device: DeviceId, packet: Packet) {
        let handlers = self
            .state()
            .data_handlers
            .get(&device)
            .cloned()
            .unwrap_or_default();

        for handler in handlers {
            handler.on_live_data(device, packet.clone());
        }
    }

    /// Sleep for `duration`, returning early once shutdown is signalled.
    ///
    /// Returns false if the simulator is shutting down.
    fn pause(&self, duration: Duration) -> bool {
        let stopping = self.shutdown.lock().unwrap_or_else(PoisonError::into_inner);
        let (stopping, _) = self
            .wake
            .wait_timeout_while(stopping, duration, |stopping| !*stopping)
            .unwrap_or_else(PoisonError::into_inner);
        !*stopping
    }

    fn is_shutting_down(&self) -> bool {
        *self.shutdown.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn signal_shutdown(&self) {
        *self.shutdown.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.wake.notify_all();
    }

    fn packet_interval(&self) -> Duration {
        self.config.packet_interval.unwrap_or_else(|| {
            let rate = self.state().update_rate.max(1);
            Duration::from_secs_f64(1.0 / rate as f64)
        })
    }

    fn spawn_worker<F>(self: &Arc<Self>, name: &str, work: F)
    where
        F: FnOnce(Arc<SimInner>) + Send + 'static,
    {
        let inner = Arc::clone(self);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || work(inner))
            .expect("Failed to spawn simulator worker thread");

        self.workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    fn connect_worker(self: Arc<Self>) {
        // Associate in reverse order so arrival order differs from enumeration order
        let trackers: Vec<DeviceId> = self.tracker_ids().collect();
        for tracker in trackers.into_iter().rev() {
            if !self.pause(self.config.connect_delay) || !self.state().radio_enabled {
                debug!("Simulated association stopped early");
                return;
            }
            self.emit_connectivity(tracker, ConnectivityState::Connected);
        }
    }

    fn stream_worker(self: Arc<Self>) {
        let interval = self.packet_interval();
        debug!(interval_us = interval.as_micros() as u64, "Simulated streaming started");

        loop {
            if self.is_shutting_down() {
                break;
            }

            let batch: Vec<(DeviceId, u32)> = {
                let mut state = self.state();
                if !state.measuring {
                    state.streaming = false;
                    break;
                }
                let connected = state.connected.clone();
                connected
                    .into_iter()
                    .map(|tracker| {
                        let counter = state.counters.entry(tracker).or_insert(0);
                        *counter = counter.wrapping_add(1);
                        (tracker, *counter)
                    })
                    .collect()
            };

            for (tracker, counter) in batch {
                let orientation = synthetic_orientation(tracker, counter);
                let packet = Packet::with_orientation(counter, orientation);
                self.emit_packet(tracker, packet);
            }

            if !self.pause(interval) {
                break;
            }
        }

        debug!("Simulated streaming stopped");
    }
}

/// Smooth, tracker-specific motion so separate trackers are distinguishable.
fn synthetic_orientation(tracker: DeviceId, counter: u32) -> EulerAngles {
    let phase = (tracker.serial() % 16) as f64 * 0.4;
    let t = counter as f64 / 100.0;
    EulerAngles::new(
        30.0 * (TAU * 0.25 * t + phase).sin(),
        15.0 * (TAU * 0.5 * t + phase).cos(),
        ((counter as f64 * 0.5 + phase * 20.0) % 360.0) - 180.0,
    )
}

/// Simulated control handle.
///
/// Cloning yields another handle to the same simulated hardware.
#[derive(Clone)]
pub struct SimulatedControl {
    inner: Arc<SimInner>,
}

impl SimulatedControl {
    pub fn new(config: SimConfig) -> Self {
        let state = SimState {
            radio_enabled: config.radio_enabled,
            update_rate: config.supported_rates.first().copied().unwrap_or(0),
            ..Default::default()
        };

        Self {
            inner: Arc::new(SimInner {
                config,
                state: Mutex::new(state),
                shutdown: Mutex::new(false),
                wake: Condvar::new(),
                workers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Simulator with default settings and `count` trackers.
    pub fn with_trackers(count: usize) -> Self {
        Self::new(SimConfig::with_trackers(count))
    }

    pub fn config(&self) -> &SimConfig {
        &self.inner.config
    }

    /// Make an operation fail from now on.
    pub fn inject_fault(&self, fault: SimFault) {
        self.inner.state().faults.insert(fault);
    }

    /// Let a previously failing operation succeed again.
    pub fn clear_fault(&self, fault: SimFault) {
        self.inner.state().faults.remove(&fault);
    }

    /// Every driver call made so far, in order.
    pub fn calls(&self) -> Vec<SimCall> {
        self.inner.state().calls.clone()
    }

    /// Identity of the simulated master.
    pub fn master_id(&self) -> DeviceId {
        self.inner.master_id()
    }

    /// Identities of all simulated trackers, in enumeration order.
    pub fn tracker_ids(&self) -> Vec<DeviceId> {
        self.inner.tracker_ids().collect()
    }

    /// Trackers currently associated with the master, in association order.
    pub fn connected_trackers(&self) -> Vec<DeviceId> {
        self.inner.state().connected.clone()
    }

    pub fn is_radio_enabled(&self) -> bool {
        self.inner.state().radio_enabled
    }

    pub fn radio_channel(&self) -> Option<u8> {
        self.inner.state().radio_channel
    }

    pub fn update_rate(&self) -> u32 {
        self.inner.state().update_rate
    }

    pub fn is_recording(&self) -> bool {
        self.inner.state().recording
    }

    pub fn log_file(&self) -> Option<String> {
        self.inner.state().log_file.clone()
    }

    /// True once `close()` has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.state().closed
    }

    /// Raise a connectivity change as if the radio reported it.
    pub fn emit_connectivity(&self, device: DeviceId, state: ConnectivityState) {
        self.inner.emit_connectivity(device, state);
    }

    /// Deliver a packet as if the tracker sent it.
    pub fn emit_packet(&self, device: DeviceId, packet: Packet) {
        self.inner.emit_packet(device, packet);
    }
}

impl DeviceControl for SimulatedControl {
    fn scan_ports(&self) -> Vec<PortInfo> {
        self.inner.record(SimCall::ScanPorts, None);

        let mut ports = vec![PortInfo::new(
            DeviceId::new(0x0033_0001, DeviceRole::Other),
            "/dev/ttyUSB0",
            115_200,
        )];
        if self.inner.config.master_present {
            ports.push(PortInfo::new(
                self.inner.master_id(),
                MASTER_PORT,
                MASTER_BAUDRATE,
            ));
        }
        ports
    }

    fn open_port(&self, port: &PortInfo) -> Result<(), DeviceError> {
        if self.inner.record(SimCall::OpenPort(port.port_name.clone()), Some(SimFault::OpenPort)) {
            return Err(DeviceError::rejected("open_port", "port is busy"));
        }
        if port.device_id != self.inner.master_id() || !self.inner.config.master_present {
            return Err(DeviceError::NotFound {
                device: port.device_id,
            });
        }
        self.inner.state().port_open = true;
        Ok(())
    }

    fn device(&self, id: DeviceId) -> Option<Arc<dyn Device>> {
        let state = self.inner.state();
        if !state.port_open {
            return None;
        }

        let known = if id == self.inner.master_id() {
            !state.faults.contains(&SimFault::ResolveMaster)
        } else if id.is_tracker() {
            self.inner.tracker_ids().any(|t| t == id)
                && !state.faults.contains(&SimFault::ResolveTracker)
        } else {
            false
        };
        drop(state);

        known.then(|| {
            Arc::new(SimDevice {
                id,
                inner: Arc::clone(&self.inner),
            }) as Arc<dyn Device>
        })
    }

    fn device_ids(&self) -> Vec<DeviceId> {
        let state = self.inner.state();
        if !state.port_open {
            return Vec::new();
        }

        let mut ids = vec![self.inner.master_id()];
        ids.extend(self.inner.tracker_ids().filter(|t| state.connected.contains(t)));
        ids
    }

    fn close(&self) {
        {
            let mut state = self.inner.state();
            state.calls.push(SimCall::Close);
            state.closed = true;
            state.port_open = false;
            state.measuring = false;
            state.recording = false;
            state.connectivity_handlers.clear();
            state.data_handlers.clear();
        }
        self.inner.signal_shutdown();

        let workers: Vec<JoinHandle<()>> = self
            .inner
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for worker in workers {
            if worker.join().is_err() {
                tracing::warn!("Simulator worker thread panicked");
            }
        }
    }
}

/// A simulated master or tracker.
struct SimDevice {
    id: DeviceId,
    inner: Arc<SimInner>,
}

impl SimDevice {
    fn require_master(&self, operation: &'static str) -> Result<(), DeviceError> {
        if self.id.is_wireless_master() {
            Ok(())
        } else {
            Err(DeviceError::Unsupported { operation })
        }
    }
}

impl Device for SimDevice {
    fn device_id(&self) -> DeviceId {
        self.id
    }

    fn goto_config(&self) -> Result<(), DeviceError> {
        self.require_master("goto_config")?;
        if self.inner.record(SimCall::GotoConfig, Some(SimFault::GotoConfig)) {
            return Err(DeviceError::rejected("goto_config", "device did not acknowledge"));
        }
        let mut state = self.inner.state();
        state.measuring = false;
        state.recording = false;
        Ok(())
    }

    fn goto_measurement(&self) -> Result<(), DeviceError> {
        self.require_master("goto_measurement")?;
        if self.inner.record(SimCall::GotoMeasurement, Some(SimFault::GotoMeasurement)) {
            return Err(DeviceError::rejected("goto_measurement", "device did not acknowledge"));
        }

        let start_stream = {
            let mut state = self.inner.state();
            state.measuring = true;
            let start = self.inner.config.auto_stream && !state.streaming;
            if start {
                state.streaming = true;
            }
            start
        };
        if start_stream {
            self.inner.spawn_worker("sim-stream", SimInner::stream_worker);
        }
        Ok(())
    }

    fn add_connectivity_handler(&self, handler: Arc<dyn ConnectivityHandler>) {
        self.inner.state().connectivity_handlers.push(handler);
    }

    fn add_data_handler(&self, handler: Arc<dyn DataHandler>) {
        self.inner
            .state()
            .data_handlers
            .entry(self.id)
            .or_default()
            .push(handler);
    }

    fn supported_update_rates(&self) -> Vec<u32> {
        if self.id.is_wireless_master() {
            self.inner.config.supported_rates.clone()
        } else {
            Vec::new()
        }
    }

    fn set_update_rate(&self, rate_hz: u32) -> Result<(), DeviceError> {
        self.require_master("set_update_rate")?;
        if self.inner.record(SimCall::SetUpdateRate(rate_hz), Some(SimFault::SetUpdateRate)) {
            return Err(DeviceError::rejected("set_update_rate", "device did not acknowledge"));
        }
        if !self.inner.config.supported_rates.contains(&rate_hz) {
            return Err(DeviceError::rejected(
                "set_update_rate",
                format!("{} Hz is not a supported rate", rate_hz),
            ));
        }
        self.inner.state().update_rate = rate_hz;
        Ok(())
    }

    fn is_radio_enabled(&self) -> bool {
        self.id.is_wireless_master() && self.inner.state().radio_enabled
    }

    fn disable_radio(&self) -> Result<(), DeviceError> {
        self.require_master("disable_radio")?;
        if self.inner.record(SimCall::DisableRadio, Some(SimFault::DisableRadio)) {
            return Err(DeviceError::rejected("disable_radio", "device did not acknowledge"));
        }

        let dropped = {
            let mut state = self.inner.state();
            state.radio_enabled = false;
            state.radio_channel = None;
            state.connected.clone()
        };
        for tracker in dropped {
            self.inner
                .emit_connectivity(tracker, ConnectivityState::Disconnected);
        }
        Ok(())
    }

    fn enable_radio(&self, channel: u8) -> Result<(), DeviceError> {
        self.require_master("enable_radio")?;
        if self.inner.record(SimCall::EnableRadio(channel), Some(SimFault::EnableRadio)) {
            return Err(DeviceError::rejected("enable_radio", "device did not acknowledge"));
        }

        {
            let mut state = self.inner.state();
            if state.radio_enabled {
                return Err(DeviceError::rejected("enable_radio", "radio is already enabled"));
            }
            state.radio_enabled = true;
            state.radio_channel = Some(channel);
        }

        if self.inner.config.auto_connect {
            self.inner.spawn_worker("sim-connect", SimInner::connect_worker);
        }
        Ok(())
    }

    fn create_log_file(&self, name: &str) -> Result<(), DeviceError> {
        self.require_master("create_log_file")?;
        let call = SimCall::CreateLogFile(name.to_string());
        if self.inner.record(call, Some(SimFault::CreateLogFile)) {
            return Err(DeviceError::Status {
                operation: "create_log_file",
                code: SIM_LOG_FILE_ERROR,
            });
        }
        self.inner.state().log_file = Some(name.to_string());
        Ok(())
    }

    fn start_recording(&self) -> Result<(), DeviceError> {
        self.require_master("start_recording")?;
        if self.inner.record(SimCall::StartRecording, Some(SimFault::StartRecording)) {
            return Err(DeviceError::rejected("start_recording", "device did not acknowledge"));
        }
        let mut state = self.inner.state();
        if !state.measuring {
            return Err(DeviceError::rejected("start_recording", "not in measurement mode"));
        }
        state.recording = true;
        Ok(())
    }

    fn stop_recording(&self) -> Result<(), DeviceError> {
        self.require_master("stop_recording")?;
        if self.inner.record(SimCall::StopRecording, Some(SimFault::StopRecording)) {
            return Err(DeviceError::rejected("stop_recording", "device did not acknowledge"));
        }
        self.inner.state().recording = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    struct CountingHandler {
        connected: AtomicUsize,
        packets: AtomicUsize,
    }

    impl CountingHandler {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                connected: AtomicUsize::new(0),
                packets: AtomicUsize::new(0),
            })
        }
    }

    impl ConnectivityHandler for CountingHandler {
        fn on_connectivity_changed(&self, _device: DeviceId, state: ConnectivityState) {
            if state.is_connected() {
                self.connected.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    impl DataHandler for CountingHandler {
        fn on_live_data(&self, _device: DeviceId, _packet: Packet) {
            self.packets.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn manual_sim() -> SimulatedControl {
        SimulatedControl::new(SimConfig {
            auto_connect: false,
            auto_stream: false,
            ..SimConfig::with_trackers(2)
        })
    }

    fn open_master(sim: &SimulatedControl) -> Arc<dyn Device> {
        let port = sim
            .scan_ports()
            .into_iter()
            .find(|p| p.is_wireless_master())
            .unwrap();
        sim.open_port(&port).unwrap();
        sim.device(port.device_id).unwrap()
    }

    #[test]
    fn test_scan_reports_master_and_other_port() {
        let sim = manual_sim();
        let ports = sim.scan_ports();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports.iter().filter(|p| p.is_wireless_master()).count(), 1);
    }

    #[test]
    fn test_scan_without_master() {
        let sim = SimulatedControl::new(SimConfig {
            master_present: false,
            ..Default::default()
        });
        assert!(sim.scan_ports().iter().all(|p| !p.is_wireless_master()));
    }

    #[test]
    fn test_devices_unavailable_before_open() {
        let sim = manual_sim();
        assert!(sim.device(sim.master_id()).is_none());
        assert!(sim.device_ids().is_empty());
    }

    #[test]
    fn test_device_ids_list_connected_trackers_in_enumeration_order() {
        let sim = manual_sim();
        let _master = open_master(&sim);
        let trackers = sim.tracker_ids();

        sim.emit_connectivity(trackers[1], ConnectivityState::Connected);
        sim.emit_connectivity(trackers[0], ConnectivityState::Connected);

        assert_eq!(
            sim.device_ids(),
            vec![sim.master_id(), trackers[0], trackers[1]]
        );
    }

    #[test]
    fn test_enable_radio_twice_is_rejected() {
        let sim = manual_sim();
        let master = open_master(&sim);
        master.enable_radio(19).unwrap();
        assert!(master.enable_radio(19).is_err());
        master.disable_radio().unwrap();
        master.enable_radio(11).unwrap();
        assert_eq!(sim.radio_channel(), Some(11));
    }

    #[test]
    fn test_injected_fault_fails_operation() {
        let sim = manual_sim();
        let master = open_master(&sim);
        sim.inject_fault(SimFault::SetUpdateRate);
        assert!(master.set_update_rate(75).is_err());
        sim.clear_fault(SimFault::SetUpdateRate);
        master.set_update_rate(75).unwrap();
        assert_eq!(sim.update_rate(), 75);
    }

    #[test]
    fn test_unsupported_rate_rejected() {
        let sim = manual_sim();
        let master = open_master(&sim);
        assert!(master.set_update_rate(77).is_err());
    }

    #[test]
    fn test_tracker_rejects_master_operations() {
        let sim = manual_sim();
        let _master = open_master(&sim);
        let tracker = sim.device(sim.tracker_ids()[0]).unwrap();
        assert_eq!(
            tracker.enable_radio(19),
            Err(DeviceError::Unsupported {
                operation: "enable_radio"
            })
        );
    }

    #[test]
    fn test_emitted_events_reach_handlers() {
        let sim = manual_sim();
        let master = open_master(&sim);
        let handler = CountingHandler::new();
        master.add_connectivity_handler(handler.clone());

        let tracker_id = sim.tracker_ids()[0];
        let tracker = sim.device(tracker_id).unwrap();
        tracker.add_data_handler(handler.clone());

        sim.emit_connectivity(tracker_id, ConnectivityState::Connected);
        sim.emit_packet(tracker_id, Packet::new(1, None));
        sim.emit_packet(sim.tracker_ids()[1], Packet::new(1, None));

        assert_eq!(handler.connected.load(Ordering::SeqCst), 1);
        assert_eq!(handler.packets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_auto_connect_and_stream() {
        let sim = SimulatedControl::new(SimConfig {
            connect_delay: Duration::from_millis(1),
            packet_interval: Some(Duration::from_millis(1)),
            ..SimConfig::with_trackers(2)
        });
        let master = open_master(&sim);
        let handler = CountingHandler::new();
        master.add_connectivity_handler(handler.clone());
        master.enable_radio(19).unwrap();

        for _ in 0..500 {
            if sim.connected_trackers().len() == 2 {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(sim.connected_trackers().len(), 2);
        assert_eq!(handler.connected.load(Ordering::SeqCst), 2);

        for id in sim.tracker_ids() {
            sim.device(id).unwrap().add_data_handler(handler.clone());
        }
        master.goto_measurement().unwrap();
        for _ in 0..500 {
            if handler.packets.load(Ordering::SeqCst) >= 10 {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        assert!(handler.packets.load(Ordering::SeqCst) >= 10);

        sim.close();
        assert!(sim.is_closed());
        assert_eq!(sim.calls().last(), Some(&SimCall::Close));
    }

    #[test]
    fn test_close_interrupts_pending_association() {
        let sim = SimulatedControl::new(SimConfig {
            connect_delay: Duration::from_secs(10),
            ..SimConfig::with_trackers(2)
        });
        let master = open_master(&sim);
        master.enable_radio(19).unwrap();

        let started = Instant::now();
        sim.close();

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(sim.connected_trackers().is_empty());
    }

    #[test]
    fn test_start_recording_requires_measurement() {
        let sim = manual_sim();
        let master = open_master(&sim);
        assert!(master.start_recording().is_err());
        master.goto_measurement().unwrap();
        master.start_recording().unwrap();
        assert!(sim.is_recording());
    }

    #[test]
    fn test_log_file_fault_reports_status() {
        let sim = manual_sim();
        let master = open_master(&sim);
        sim.inject_fault(SimFault::CreateLogFile);
        assert_eq!(
            master.create_log_file("logfile.mtb"),
            Err(DeviceError::Status {
                operation: "create_log_file",
                code: SIM_LOG_FILE_ERROR
            })
        );
    }
}
