//! Operator input seen by the controller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::state::MasterState;

/// Non-blocking start/stop signals plus progress notifications.
///
/// The controller polls the signals from its own task; implementations must
/// return immediately.
pub trait Operator: Send + Sync {
    /// True once the operator wants recording to begin.
    fn start_requested(&self) -> bool;

    /// True once the operator wants measurement to end.
    fn stop_requested(&self) -> bool;

    /// Number of connected trackers changed while waiting.
    fn tracker_count_changed(&self, _count: usize) {}

    /// Controller entered a new state.
    fn state_changed(&self, _state: MasterState) {}
}

/// Operator driven programmatically.
///
/// Also records what the controller reported, which makes it convenient in
/// tests.
#[derive(Debug, Default)]
pub struct ManualOperator {
    start: AtomicBool,
    stop: AtomicBool,
    counts: Mutex<Vec<usize>>,
    states: Mutex<Vec<MasterState>>,
}

impl ManualOperator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operator that has already asked to start.
    pub fn started() -> Self {
        let operator = Self::new();
        operator.request_start();
        operator
    }

    pub fn request_start(&self) {
        self.start.store(true, Ordering::SeqCst);
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Tracker count most recently reported, zero if none was.
    pub fn last_count(&self) -> usize {
        self.count_reports().last().copied().unwrap_or(0)
    }

    /// Every tracker count the controller reported, in order.
    pub fn count_reports(&self) -> Vec<usize> {
        self.counts
            .lock()
            .map(|counts| counts.clone())
            .unwrap_or_default()
    }

    /// Every state the controller announced, in order.
    pub fn states(&self) -> Vec<MasterState> {
        self.states
            .lock()
            .map(|states| states.clone())
            .unwrap_or_default()
    }
}

impl Operator for ManualOperator {
    fn start_requested(&self) -> bool {
        self.start.load(Ordering::SeqCst)
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn tracker_count_changed(&self, count: usize) {
        if let Ok(mut counts) = self.counts.lock() {
            counts.push(count);
        }
    }

    fn state_changed(&self, state: MasterState) {
        if let Ok(mut states) = self.states.lock() {
            states.push(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_operator_signals() {
        let operator = ManualOperator::new();
        assert!(!operator.start_requested());
        operator.request_start();
        assert!(operator.start_requested());
        assert!(!operator.stop_requested());
        operator.request_stop();
        assert!(operator.stop_requested());
    }

    #[test]
    fn test_manual_operator_records_progress() {
        let operator = ManualOperator::new();
        assert_eq!(operator.last_count(), 0);
        operator.tracker_count_changed(1);
        operator.tracker_count_changed(2);
        operator.state_changed(MasterState::PortOpened);
        operator.state_changed(MasterState::Configured);
        assert_eq!(operator.last_count(), 2);
        assert_eq!(operator.count_reports(), vec![1, 2]);
        assert_eq!(
            operator.states(),
            vec![MasterState::PortOpened, MasterState::Configured]
        );
    }
}
