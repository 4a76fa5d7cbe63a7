//! Packet ingestion core.
//!
//! - [`BoundedPacketQueue`] - Per-tracker drop-oldest FIFO fed by the driver
//! - [`TrackerSession`] - A tracker's identity, display index and queue
//! - [`IngestionLoop`] - Round-robin draining into an [`OrientationSink`]

mod drain;
mod queue;
mod session;
mod sink;

pub use drain::{IngestStats, IngestionLoop};
pub use queue::{BoundedPacketQueue, QueueError, DEFAULT_QUEUE_CAPACITY};
pub use session::TrackerSession;
pub use sink::{CollectingSink, OrientationSample, OrientationSink, TracingSink};
