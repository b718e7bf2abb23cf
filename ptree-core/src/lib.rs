//! # ptree-core
//!
//! Core library for drawing images on an IPv6 "pixel tree": a display
//! that lights one pixel for every address in its network that receives
//! a ping.
//!
//! This crate contains:
//! - **Encoding**: `AddressEncoding` with the `ByteOffset` and `TextSegment` layouts
//! - **Frames**: `FrameBuilder`, `Frame`, `Animation`
//! - **Queue**: `WorkQueue`, the bounded channel between producer and workers
//! - **Scheduler**: the animation loop with frame and redraw timers
//! - **Packet**: `PacketTemplate`, the shared ICMPv6 Echo Request
//! - **Transmit**: `ChannelOpener` / `Transmitter` and the ICMPv6 socket sender
//! - **Worker**: `Worker` and `WorkerPool` with per-worker channel recovery
//! - **Error**: `PtreeError`, a typed `thiserror`-based error hierarchy

pub mod encoding;
pub mod error;
pub mod frame;
pub mod packet;
pub mod queue;
pub mod scheduler;
pub mod transmit;
pub mod worker;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use encoding::{AddressEncoding, ByteOffset, Pixel, TextSegment};
pub use error::{PtreeError, PtreeResult};
pub use frame::{Animation, AnimationFrame, Frame, FrameBuilder};
pub use packet::PacketTemplate;
pub use queue::{QueueConsumer, QueueProducer, WorkQueue};
pub use scheduler::{Boundary, ScheduleStats, Scheduler, redraw_interval};
pub use transmit::{ChannelOpener, IcmpSocketOpener, SocketType, Transmitter};
pub use worker::{Worker, WorkerPool, WorkerStats};
