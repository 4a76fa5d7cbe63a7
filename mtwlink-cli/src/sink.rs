//! Console output for orientation batches.

use mtwlink::ingest::{OrientationSample, OrientationSink};

use crate::console;

/// Prints one line per tracker for every published batch.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    batches: u64,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches printed so far.
    pub fn batches(&self) -> u64 {
        self.batches
    }
}

impl OrientationSink for ConsoleSink {
    fn publish(&mut self, batch: &[OrientationSample]) {
        for sample in batch {
            console::line(format_sample(sample));
        }
        self.batches += 1;
    }
}

/// Render a sample as `[i]: ID: <id>, Roll: .., Pitch: .., Yaw: ..`.
pub fn format_sample(sample: &OrientationSample) -> String {
    format!(
        "[{}]: ID: {}, Roll: {:7.2}, Pitch: {:7.2}, Yaw: {:7.2}",
        sample.index, sample.id, sample.roll, sample.pitch, sample.yaw
    )
}
