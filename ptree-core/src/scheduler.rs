//! Animation scheduler: the only producer on the work queue.
//!
//! Two independent clocks drive it:
//!
//! - the **frame timer**, armed once per frame for that frame's display
//!   delay, and
//! - the **redraw timer**, armed before every pass for `1s / rate`.
//!
//! Each pass pushes the current frame's addresses (waiting on a full
//! queue), then the two deadlines race: the frame timer advances to the
//! next frame, the redraw timer triggers another pass over the same
//! frame. The scheduler loops over the animation forever, or exactly
//! once in run-once mode, after which it waits for the queue to drain
//! and triggers shutdown.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::PtreeResult;
use crate::frame::Animation;
use crate::queue::QueueProducer;

/// Interval between redraw passes for `rate` passes per second.
pub fn redraw_interval(rate: u32) -> Duration {
    Duration::from_secs(1) / rate.max(1)
}

// ── Boundary ─────────────────────────────────────────────────────

/// Which deadline fired first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// The frame has been shown long enough; advance.
    FrameElapsed,
    /// Time for another pass over the current frame.
    Redraw,
}

/// Wait for the earlier of two deadlines. The frame deadline wins ties.
pub async fn race(frame_deadline: Instant, redraw_deadline: Instant) -> Boundary {
    tokio::select! {
        biased;
        _ = sleep_until(frame_deadline) => Boundary::FrameElapsed,
        _ = sleep_until(redraw_deadline) => Boundary::Redraw,
    }
}

// ── ScheduleStats ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleStats {
    /// Full passes pushed into the queue.
    pub passes: u64,
    /// Frame boundaries crossed.
    pub frames: u64,
    /// Addresses pushed.
    pub addrs: u64,
}

// ── Scheduler ────────────────────────────────────────────────────

pub struct Scheduler {
    animation: Animation,
    queue: QueueProducer,
    interval: Duration,
    once: bool,
    shutdown: CancellationToken,
    stats: ScheduleStats,
}

impl Scheduler {
    /// `interval` is the redraw interval, see [`redraw_interval`].
    pub fn new(
        animation: Animation,
        queue: QueueProducer,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            animation,
            queue,
            interval,
            once: false,
            shutdown,
            stats: ScheduleStats::default(),
        }
    }

    /// Stop after one pass over every frame.
    pub fn run_once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    /// Produce until shutdown is requested, the queue closes, or the
    /// single pass of run-once mode completes.
    ///
    /// In run-once mode the scheduler cancels `shutdown` itself once the
    /// queue has drained.
    pub async fn run(mut self) -> PtreeResult<ScheduleStats> {
        info!(
            frames = self.animation.len(),
            interval = ?self.interval,
            once = self.once,
            "starting scheduler"
        );

        let shutdown = self.shutdown.clone();
        tokio::select! {
            result = self.schedule() => result?,
            _ = shutdown.cancelled() => debug!("scheduler cancelled"),
        }

        debug!(stats = ?self.stats, "scheduler stopped");
        Ok(self.stats)
    }

    async fn schedule(&mut self) -> PtreeResult<()> {
        loop {
            let count = self.animation.len();
            for idx in 0..count {
                let frame_deadline = Instant::now() + self.animation.frames()[idx].delay;
                self.stream_frame(idx, frame_deadline).await?;

                if self.once && idx + 1 < count {
                    sleep_until(frame_deadline).await;
                }
                self.stats.frames += 1;
                debug!(frame = idx, passes = self.stats.passes, "frame boundary");
            }

            if self.once {
                self.queue.drained().await;
                info!(addrs = self.stats.addrs, "single pass sent, queue drained");
                self.shutdown.cancel();
                return Ok(());
            }

            if count == 0 {
                // Nothing to draw; idle until shutdown.
                std::future::pending::<()>().await;
            }
        }
    }

    /// Redraw frame `idx` until its display deadline passes.
    async fn stream_frame(&mut self, idx: usize, frame_deadline: Instant) -> PtreeResult<()> {
        loop {
            let redraw_deadline = Instant::now() + self.interval;

            let addrs = self.animation.frames()[idx].frame.addrs();
            self.queue.push_all(addrs).await?;
            self.stats.passes += 1;
            self.stats.addrs += addrs.len() as u64;

            if self.once {
                return Ok(());
            }

            match race(frame_deadline, redraw_deadline).await {
                Boundary::FrameElapsed => return Ok(()),
                Boundary::Redraw => continue,
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
