//! Worker pool draining the work queue.
//!
//! Each worker owns one transmission channel and sends the shared
//! [`PacketTemplate`] to every address it takes off the queue. A failed
//! send drops that packet, logs a warning and swaps in a freshly opened
//! channel. Failing to open a channel is fatal.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{PtreeError, PtreeResult};
use crate::packet::PacketTemplate;
use crate::queue::QueueConsumer;
use crate::transmit::ChannelOpener;

// ── WorkerStats ──────────────────────────────────────────────────

/// Per-worker counters, returned when the worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Packets handed to the channel successfully.
    pub sent: u64,
    /// Packets lost to a failed send.
    pub dropped: u64,
    /// Replacement channels opened after a failure.
    pub reopened: u64,
}

impl std::ops::AddAssign for WorkerStats {
    fn add_assign(&mut self, rhs: Self) {
        self.sent += rhs.sent;
        self.dropped += rhs.dropped;
        self.reopened += rhs.reopened;
    }
}

// ── Worker ───────────────────────────────────────────────────────

/// A single consumer loop.
pub struct Worker {
    id: usize,
    opener: Arc<dyn ChannelOpener>,
    packet: PacketTemplate,
    queue: QueueConsumer,
}

impl Worker {
    pub fn new(
        id: usize,
        opener: Arc<dyn ChannelOpener>,
        packet: PacketTemplate,
        queue: QueueConsumer,
    ) -> Self {
        Self {
            id,
            opener,
            packet,
            queue,
        }
    }

    /// Drain the queue until it closes.
    ///
    /// Returns [`PtreeError::ChannelOpen`] if the initial or a
    /// replacement channel cannot be opened.
    pub async fn run(self) -> PtreeResult<WorkerStats> {
        info!(worker = self.id, "starting worker");
        let mut stats = WorkerStats::default();
        let mut channel = self.opener.open().await.map_err(PtreeError::ChannelOpen)?;

        while let Some(addr) = self.queue.pop().await {
            match channel.transmit(self.packet.as_bytes(), addr).await {
                Ok(()) => stats.sent += 1,
                Err(e) => {
                    stats.dropped += 1;
                    warn!(worker = self.id, %addr, "could not send ping packet: {e}");
                    channel = self.opener.open().await.map_err(PtreeError::ChannelOpen)?;
                    stats.reopened += 1;
                }
            }
        }

        debug!(worker = self.id, ?stats, "queue closed, worker stopping");
        Ok(stats)
    }
}

// ── WorkerPool ───────────────────────────────────────────────────

/// A set of workers sharing one queue, one opener and one packet.
pub struct WorkerPool {
    workers: JoinSet<PtreeResult<WorkerStats>>,
}

impl WorkerPool {
    /// Spawn `count` workers onto the current runtime.
    pub fn spawn(
        count: usize,
        opener: Arc<dyn ChannelOpener>,
        packet: PacketTemplate,
        queue: QueueConsumer,
    ) -> Self {
        let mut workers = JoinSet::new();
        for id in 0..count {
            let worker = Worker::new(id, Arc::clone(&opener), packet.clone(), queue.clone());
            workers.spawn(worker.run());
        }
        Self { workers }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Wait for every worker to stop.
    ///
    /// On the first fatal worker error `cancel` is triggered, the
    /// remaining workers are aborted and the error is returned.
    pub async fn join(mut self, cancel: &CancellationToken) -> PtreeResult<WorkerStats> {
        let mut total = WorkerStats::default();
        while let Some(joined) = self.workers.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => continue,
                Err(e) => Err(PtreeError::Other(format!("worker panicked: {e}"))),
            };
            match result {
                Ok(stats) => total += stats,
                Err(e) => {
                    error!("worker failed: {e}");
                    cancel.cancel();
                    self.workers.abort_all();
                    return Err(e);
                }
            }
        }
        Ok(total)
    }
}

// ── Tests ────────────────────────────────────────────────────────
