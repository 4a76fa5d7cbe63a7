//! Steady-state draining of tracker queues.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::session::TrackerSession;
use super::sink::{OrientationSample, OrientationSink};

/// Counters collected while draining.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Loop iterations, productive or not.
    pub iterations: u64,
    /// Packets removed from all queues.
    pub packets_drained: u64,
    /// Drained packets that carried no orientation.
    pub packets_without_orientation: u64,
    /// Iterations that drained at least one packet.
    pub batches: u64,
    /// Batches handed to the sink.
    pub batches_published: u64,
}

/// Drains every session's queue into an [`OrientationSink`].
///
/// Each iteration visits the sessions in index order and takes at most one
/// packet from each, so trackers are serviced round-robin and each queue is
/// consumed in FIFO order. When an iteration finds nothing the loop parks on
/// the shared [`Notify`] (bounded by `idle_wait`) instead of spinning.
pub struct IngestionLoop<'a> {
    sessions: &'a [TrackerSession],
    notify: Arc<Notify>,
    publish_every: u64,
    idle_wait: Duration,
    latest: Vec<Option<OrientationSample>>,
    stats: IngestStats,
}

impl<'a> IngestionLoop<'a> {
    /// # Arguments
    ///
    /// * `sessions` - Sessions sorted by index
    /// * `notify` - Woken by every queue push
    /// * `publish_every` - Publish every Nth batch (values below 1 mean every batch)
    /// * `idle_wait` - Upper bound on a single idle park
    pub fn new(
        sessions: &'a [TrackerSession],
        notify: Arc<Notify>,
        publish_every: u64,
        idle_wait: Duration,
    ) -> Self {
        Self {
            sessions,
            notify,
            publish_every: publish_every.max(1),
            idle_wait,
            latest: vec![None; sessions.len()],
            stats: IngestStats::default(),
        }
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Run one pass over all sessions. Returns the number of packets drained.
    pub fn drain_once(&mut self, sink: &mut dyn OrientationSink) -> usize {
        self.stats.iterations += 1;

        let mut drained = 0;
        for (slot, session) in self.sessions.iter().enumerate() {
            if !session.has_data() {
                continue;
            }
            let Some(packet) = session.pop_oldest() else {
                continue;
            };
            drained += 1;

            match packet.orientation_euler() {
                Some(euler) => {
                    self.latest[slot] =
                        Some(OrientationSample::new(session.index(), session.id(), euler));
                }
                None => self.stats.packets_without_orientation += 1,
            }
        }

        if drained == 0 {
            return 0;
        }

        self.stats.packets_drained += drained as u64;
        self.stats.batches += 1;

        if (self.stats.batches - 1) % self.publish_every == 0 {
            let batch: Vec<OrientationSample> = self.latest.iter().flatten().copied().collect();
            if !batch.is_empty() {
                sink.publish(&batch);
                self.stats.batches_published += 1;
            }
        }

        drained
    }

    /// Drain until `cancel` fires or `should_stop` returns true.
    ///
    /// The stop conditions are checked once per iteration.
    pub async fn run<F>(
        mut self,
        sink: &mut dyn OrientationSink,
        cancel: &CancellationToken,
        mut should_stop: F,
    ) -> IngestStats
    where
        F: FnMut() -> bool,
    {
        info!(trackers = self.sessions.len(), "Ingestion started");

        loop {
            if cancel.is_cancelled() {
                debug!("Ingestion cancelled");
                break;
            }
            if should_stop() {
                debug!("Ingestion stop requested");
                break;
            }

            if self.drain_once(sink) > 0 {
                tokio::task::yield_now().await;
                continue;
            }

            tokio::select! {
                _ = self.notify.notified() => {}
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(self.idle_wait) => {}
            }
        }

        for session in self.sessions {
            let dropped = session.queue().dropped();
            if dropped > 0 {
                info!(tracker = %session.id(), dropped, "Packets lost to queue overflow");
            }
        }
        info!(
            iterations = self.stats.iterations,
            drained = self.stats.packets_drained,
            published = self.stats.batches_published,
            "Ingestion stopped"
        );

        self.stats
    }
}
