//! Pinger service core logic.
//!
//! Wires the pieces together: decode the image, build the animation,
//! size the work queue, then run the scheduler against the worker pool
//! until shutdown is requested, run-once mode completes, or a worker
//! fails fatally.

use std::path::PathBuf;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use ptree_core::{
    Animation, Frame, FrameBuilder, PacketTemplate, PtreeError, PtreeResult, Scheduler, WorkQueue,
    WorkerPool,
};

use crate::config::PtreeConfig;
use crate::decode::{DecodedImage, decode_path};

/// How long workers get to flush the queue after shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

// ── PtreeService ─────────────────────────────────────────────────

/// The top-level pinger service.
pub struct PtreeService {
    config: PtreeConfig,
    shutdown: CancellationToken,
}

impl PtreeService {
    /// Create a new service with the given config.
    pub fn new(config: PtreeConfig) -> Self {
        Self {
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Obtain a handle that stops the service when cancelled.
    pub fn stop_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Signal the service to stop.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Whether shutdown has been requested.
    pub fn is_stopping(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Run the service until stopped.
    ///
    /// Setup failures (bad config, undecodable image, unsupported
    /// backend) and fatal worker failures are returned as errors.
    pub async fn run(&self) -> PtreeResult<()> {
        self.config.validate()?;
        let opener = self.config.opener()?;

        let path = self.image_path()?;
        let decoded = decode_path(&path)?;
        let (width, height) = decoded.dimensions();
        info!("image bounds: {width} {height}");

        let animation = self.build_animation(decoded)?;
        let capacity = animation.largest_frame();
        info!(
            frames = animation.len(),
            pixels = animation.total_addrs(),
            "queue length: {capacity}"
        );

        let (producer, consumer) = WorkQueue::bounded(capacity);
        let packet = PacketTemplate::echo_request();
        let pool = WorkerPool::spawn(self.config.transmit.workers, opener, packet, consumer);

        let scheduler = Scheduler::new(
            animation,
            producer,
            self.config.redraw_interval(),
            self.shutdown.clone(),
        )
        .run_once(self.config.playback.once);
        let scheduler = tokio::spawn(scheduler.run());

        let mut pool_done = std::pin::pin!(pool.join(&self.shutdown));
        tokio::select! {
            result = &mut pool_done => {
                let stats = result?;
                info!(?stats, "all workers stopped");
            }
            _ = self.shutdown.cancelled() => {
                match tokio::time::timeout(SHUTDOWN_GRACE, &mut pool_done).await {
                    Ok(Ok(stats)) => info!(?stats, "workers flushed"),
                    Ok(Err(e)) => return Err(e),
                    Err(_) => warn!("workers did not flush within {SHUTDOWN_GRACE:?}"),
                }
            }
        }

        match scheduler.await {
            Ok(Ok(stats)) => info!(?stats, "scheduler stopped"),
            Ok(Err(e)) => {
                error!("scheduler failed: {e}");
                return Err(e);
            }
            Err(e) => return Err(PtreeError::Other(format!("scheduler panicked: {e}"))),
        }

        info!("exiting...");
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────

    fn image_path(&self) -> PtreeResult<PathBuf> {
        self.config
            .image
            .path
            .clone()
            .ok_or_else(|| PtreeError::InvalidConfig("the image path must be provided".into()))
    }

    /// Encode every decoded raster and pair it with its delay.
    fn build_animation(&self, decoded: DecodedImage) -> PtreeResult<Animation> {
        let prefix = self.config.prefix()?;
        let encoding = self.config.encoding();
        let builder = FrameBuilder::new(encoding.as_ref(), prefix)
            .with_offset(self.config.image.x, self.config.image.y);

        let mut rng = match self.config.playback.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let frames: Vec<Frame> = decoded
            .frames
            .iter()
            .map(|img| builder.build(img, &mut rng))
            .collect();

        info!(encoding = encoding.name(), %prefix, "built {} frame(s)", frames.len());
        Ok(Animation::new(
            frames,
            decoded.delays,
            self.config.redraw_interval(),
        ))
    }
}

// ── Tests ────────────────────────────────────────────────────────
