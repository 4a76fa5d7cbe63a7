//! Per-tracker session state.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Notify;

use super::queue::BoundedPacketQueue;
use crate::device::{DataHandler, Device, DeviceId, Packet};

/// One tracker taking part in a recording.
///
/// The session owns the tracker's queue. The only other holder is the
/// device's data callback, registered by [`TrackerSession::attach`].
pub struct TrackerSession {
    index: usize,
    id: DeviceId,
    device: Arc<dyn Device>,
    queue: Arc<BoundedPacketQueue>,
}

impl TrackerSession {
    /// Create a session for `device` at display position `index`.
    pub fn new(
        index: usize,
        device: Arc<dyn Device>,
        capacity: usize,
        notify: Arc<Notify>,
    ) -> Self {
        Self {
            index,
            id: device.device_id(),
            device,
            queue: Arc::new(BoundedPacketQueue::with_notify(capacity, notify)),
        }
    }

    /// Register the session's queue as the device's data handler.
    pub fn attach(&self) {
        self.device
            .add_data_handler(Arc::clone(&self.queue) as Arc<dyn DataHandler>);
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn has_data(&self) -> bool {
        self.queue.has_data()
    }

    pub fn pop_oldest(&self) -> Option<Packet> {
        self.queue.pop_oldest()
    }

    pub fn queue(&self) -> &BoundedPacketQueue {
        &self.queue
    }
}

impl fmt::Debug for TrackerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerSession")
            .field("index", &self.index)
            .field("id", &self.id)
            .field("queued", &self.queue.len())
            .finish()
    }
}
