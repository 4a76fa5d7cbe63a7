//! Destinations for drained orientation samples.

use tracing::info;

use crate::device::{DeviceId, EulerAngles};

/// Latest orientation of one tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationSample {
    /// Display position of the tracker's session.
    pub index: usize,
    pub id: DeviceId,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl OrientationSample {
    pub fn new(index: usize, id: DeviceId, euler: EulerAngles) -> Self {
        Self {
            index,
            id,
            roll: euler.roll,
            pitch: euler.pitch,
            yaw: euler.yaw,
        }
    }
}

/// Receives batches of orientation samples from the ingestion loop.
///
/// A batch holds the latest sample of every tracker that has produced one,
/// ordered by session index. Implementations run on the ingestion task and
/// should return quickly.
pub trait OrientationSink: Send {
    fn publish(&mut self, batch: &[OrientationSample]);
}

/// Sink that emits each sample as a `debug!` event.
#[derive(Debug, Default)]
pub struct TracingSink;

impl OrientationSink for TracingSink {
    fn publish(&mut self, batch: &[OrientationSample]) {
        for sample in batch {
            tracing::debug!(
                index = sample.index,
                tracker = %sample.id,
                roll = sample.roll,
                pitch = sample.pitch,
                yaw = sample.yaw,
                "Orientation"
            );
        }
    }
}

/// Sink that stores every batch. Useful for tests and offline inspection.
#[derive(Debug, Default)]
pub struct CollectingSink {
    batches: Vec<Vec<OrientationSample>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> &[Vec<OrientationSample>] {
        &self.batches
    }

    pub fn into_batches(self) -> Vec<Vec<OrientationSample>> {
        self.batches
    }
}

impl OrientationSink for CollectingSink {
    fn publish(&mut self, batch: &[OrientationSample]) {
        if self.batches.is_empty() {
            info!(trackers = batch.len(), "First orientation batch received");
        }
        self.batches.push(batch.to_vec());
    }
}
