//! Bounded per-tracker packet queue.
//!
//! The queue sits between a driver callback thread (producer) and the
//! ingestion loop (consumer). It never blocks the producer: a push past
//! capacity evicts the oldest packet, so the queue always holds the newest
//! `capacity` packets in arrival order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::Notify;

use crate::device::{DataHandler, DeviceId, Packet};

/// Number of packets retained per tracker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 300;

/// Errors from queue inspection.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("packet queue is empty")]
    Empty,
}

/// Fixed-capacity FIFO with drop-oldest overflow.
///
/// All operations take the single internal lock for O(1) work. When a
/// [`Notify`] is attached, every push wakes it after the lock is released.
pub struct BoundedPacketQueue {
    packets: Mutex<VecDeque<Packet>>,
    capacity: usize,
    dropped: AtomicU64,
    notify: Option<Arc<Notify>>,
}

impl BoundedPacketQueue {
    /// Create a queue holding at most `capacity` packets.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            packets: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            dropped: AtomicU64::new(0),
            notify: None,
        }
    }

    /// Create a queue that wakes `notify` whenever a packet arrives.
    pub fn with_notify(capacity: usize, notify: Arc<Notify>) -> Self {
        Self {
            notify: Some(notify),
            ..Self::new(capacity)
        }
    }

    fn packets(&self) -> MutexGuard<'_, VecDeque<Packet>> {
        self.packets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a packet, evicting the oldest one if the queue is full.
    pub fn push(&self, packet: Packet) {
        let evicted = {
            let mut packets = self.packets();
            packets.push_back(packet);
            if packets.len() > self.capacity {
                packets.pop_front();
                true
            } else {
                false
            }
        };

        if evicted {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(notify) = &self.notify {
            notify.notify_one();
        }
    }

    pub fn has_data(&self) -> bool {
        !self.packets().is_empty()
    }

    /// Copy of the oldest packet without removing it.
    pub fn peek_oldest(&self) -> Result<Packet, QueueError> {
        self.packets().front().cloned().ok_or(QueueError::Empty)
    }

    /// Remove and return the oldest packet. `None` when empty.
    pub fn pop_oldest(&self) -> Option<Packet> {
        self.packets().pop_front()
    }

    pub fn len(&self) -> usize {
        self.packets().len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_data()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Packets evicted by overflow since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for BoundedPacketQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl DataHandler for BoundedPacketQueue {
    fn on_live_data(&self, _device: DeviceId, packet: Packet) {
        self.push(packet);
    }
}
