//! Set of trackers currently associated with the master.
//!
//! Connectivity events arrive on driver threads; the controller polls
//! [`ConnectivitySet::snapshot`] while waiting for trackers. Only a
//! `Connected` state adds an identity, every other state removes it.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::info;

use crate::device::{ConnectivityEvent, ConnectivityHandler, ConnectivityState, DeviceId};

/// Thread-safe set of connected tracker identities.
#[derive(Debug, Default)]
pub struct ConnectivitySet {
    connected: Mutex<HashSet<DeviceId>>,
}

impl ConnectivitySet {
    pub fn new() -> Self {
        Self::default()
    }

    fn connected(&self) -> MutexGuard<'_, HashSet<DeviceId>> {
        self.connected.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply an event. Returns true if membership changed.
    ///
    /// Removing an absent identity and re-adding a present one are no-ops.
    pub fn on_event(&self, event: ConnectivityEvent) -> bool {
        let changed = {
            let mut connected = self.connected();
            if event.state.is_connected() {
                connected.insert(event.device)
            } else {
                connected.remove(&event.device)
            }
        };

        info!(
            tracker = %event.device,
            state = %event.state,
            "EVENT: MTW {} -> {}",
            event.state,
            event.device
        );
        changed
    }

    /// Point-in-time copy of the connected identities.
    pub fn snapshot(&self) -> HashSet<DeviceId> {
        self.connected().clone()
    }

    pub fn len(&self) -> usize {
        self.connected().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connected().is_empty()
    }

    pub fn contains(&self, device: &DeviceId) -> bool {
        self.connected().contains(device)
    }
}

impl ConnectivityHandler for ConnectivitySet {
    fn on_connectivity_changed(&self, device: DeviceId, state: ConnectivityState) {
        self.on_event(ConnectivityEvent::new(device, state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn event(serial: u32, state: ConnectivityState) -> ConnectivityEvent {
        ConnectivityEvent::new(DeviceId::tracker(serial), state)
    }

    #[test]
    fn test_connected_adds() {
        let set = ConnectivitySet::new();
        assert!(set.on_event(event(1, ConnectivityState::Connected)));
        assert!(set.contains(&DeviceId::tracker(1)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_double_connected_keeps_size() {
        let set = ConnectivitySet::new();
        set.on_event(event(1, ConnectivityState::Connected));
        assert!(!set.on_event(event(1, ConnectivityState::Connected)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_disconnect_absent_is_noop() {
        let set = ConnectivitySet::new();
        set.on_event(event(1, ConnectivityState::Connected));
        assert!(!set.on_event(event(2, ConnectivityState::Disconnected)));
        assert_eq!(set.snapshot(), HashSet::from([DeviceId::tracker(1)]));
    }

    #[test]
    fn test_every_other_state_removes() {
        for state in [
            ConnectivityState::Disconnected,
            ConnectivityState::Rejected,
            ConnectivityState::PluggedIn,
            ConnectivityState::FileMode,
            ConnectivityState::Unknown,
            ConnectivityState::Error,
        ] {
            let set = ConnectivitySet::new();
            set.on_event(event(1, ConnectivityState::Connected));
            assert!(set.on_event(event(1, state)), "{} should remove", state);
            assert!(set.is_empty());
        }
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let set = ConnectivitySet::new();
        set.on_event(event(1, ConnectivityState::Connected));
        let snapshot = set.snapshot();
        set.on_event(event(1, ConnectivityState::Disconnected));
        assert_eq!(snapshot.len(), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_handler_from_many_threads() {
        let set = Arc::new(ConnectivitySet::new());
        let handles: Vec<_> = (0..8u32)
            .map(|serial| {
                let set = Arc::clone(&set);
                thread::spawn(move || {
                    let id = DeviceId::tracker(serial);
                    set.on_connectivity_changed(id, ConnectivityState::Connected);
                    set.on_connectivity_changed(id, ConnectivityState::Connected);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(set.len(), 8);
    }
}
