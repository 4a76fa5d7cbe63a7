//! Keyboard-driven operator.
//!
//! In interactive mode the terminal is switched to raw mode and a polling
//! thread translates key presses into controller signals:
//!
//! - `y` / `Y` while waiting for trackers: start recording
//! - any key once measurement is running: stop
//! - `Ctrl+C` at any time: cancel the run
//!
//! Raw mode swallows SIGINT, so Ctrl+C arrives here as a key event and
//! cancels the same token the signal handler would.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use mtwlink::controller::{MasterState, Operator};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::console;

/// How long the key thread blocks in `event::poll` before rechecking shutdown.
const KEY_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Signals shared between the key thread and the controller.
#[derive(Debug)]
struct Signals {
    start: AtomicBool,
    stop: AtomicBool,
    measuring: AtomicBool,
    shutdown: AtomicBool,
    cancel: CancellationToken,
}

impl Signals {
    fn new(cancel: CancellationToken) -> Self {
        Self {
            start: AtomicBool::new(false),
            stop: AtomicBool::new(false),
            measuring: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            cancel,
        }
    }

    fn on_key(&self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            info!("Ctrl+C pressed, cancelling run");
            self.cancel.cancel();
            return;
        }

        if self.measuring.load(Ordering::SeqCst) {
            if !self.stop.swap(true, Ordering::SeqCst) {
                info!("Stop requested from keyboard");
            }
        } else if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
            if !self.start.swap(true, Ordering::SeqCst) {
                info!("Start requested from keyboard");
            }
        } else {
            debug!(key = ?key.code, "Ignoring key");
        }
    }
}

/// Restores cooked mode when dropped.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// [`Operator`] backed by the terminal.
pub struct KeyboardOperator {
    signals: Arc<Signals>,
    interactive: bool,
    worker: Option<JoinHandle<()>>,
    // Dropped after the worker is joined
    raw_mode: Option<RawModeGuard>,
}

impl KeyboardOperator {
    /// Take over the terminal and start listening for keys.
    pub fn interactive(cancel: CancellationToken) -> io::Result<Self> {
        let raw_mode = RawModeGuard::enable()?;
        let signals = Arc::new(Signals::new(cancel));

        let thread_signals = Arc::clone(&signals);
        let worker = thread::Builder::new()
            .name("mtwlink-keys".to_string())
            .spawn(move || key_loop(&thread_signals))?;

        Ok(Self {
            signals,
            interactive: true,
            worker: Some(worker),
            raw_mode: Some(raw_mode),
        })
    }

    /// Operator for runs without a terminal.
    ///
    /// It never asks to start or stop; the run relies on auto-start and on
    /// cancellation (signal handler or `--duration`).
    pub fn unattended(cancel: CancellationToken) -> Self {
        Self {
            signals: Arc::new(Signals::new(cancel)),
            interactive: false,
            worker: None,
            raw_mode: None,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Stop the key thread and restore the terminal.
    pub fn shutdown(&mut self) {
        self.signals.shutdown.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Keyboard thread panicked");
            }
        }
        self.raw_mode = None;
    }
}

impl Drop for KeyboardOperator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Operator for KeyboardOperator {
    fn start_requested(&self) -> bool {
        self.signals.start.load(Ordering::SeqCst)
    }

    fn stop_requested(&self) -> bool {
        self.signals.stop.load(Ordering::SeqCst)
    }

    fn tracker_count_changed(&self, count: usize) {
        if self.interactive {
            console::line(format!(
                "Number of connected MTWs: {}. Press 'y' to start measurement.",
                count
            ));
        } else {
            console::line(format!("Number of connected MTWs: {}", count));
        }
    }

    fn state_changed(&self, state: MasterState) {
        if matches!(state, MasterState::Measuring | MasterState::Draining) {
            self.signals.measuring.store(true, Ordering::SeqCst);
        }
        if let Some(message) = state_message(state, self.interactive) {
            console::line(message);
        }
    }
}

fn key_loop(signals: &Signals) {
    while !signals.shutdown.load(Ordering::SeqCst) {
        match event::poll(KEY_POLL_INTERVAL) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => signals.on_key(key),
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Failed to read terminal event");
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "Failed to poll terminal events");
                break;
            }
        }
    }
}

/// Console line announcing a state, if the state has one.
fn state_message(state: MasterState, interactive: bool) -> Option<&'static str> {
    match state {
        MasterState::PortOpened => Some("Wireless master opened."),
        MasterState::Configured => Some("Update rate set and radio enabled."),
        MasterState::AwaitingTrackers if interactive => Some(
            "Waiting for MTW to wirelessly connect... Press 'y' to start measurement, Ctrl+C to quit.",
        ),
        MasterState::AwaitingTrackers => Some("Waiting for MTW to wirelessly connect..."),
        MasterState::Recording => Some("Creating log file and waiting for data from every MTW..."),
        MasterState::Measuring if interactive => Some("Recording. Press any key to stop."),
        MasterState::Measuring => Some("Recording."),
        MasterState::Stopped => Some("Measurement stopped."),
        _ => None,
    }
}
