//! # ptree — IPv6 pixel tree pinger
//!
//! Draws a still image or an animated GIF on a pixel tree display by
//! continuously pinging one IPv6 address per visible pixel.
//!
//! ## Pieces
//!
//! - **config**: TOML configuration with CLI overrides applied in `main`.
//! - **decode**: image / GIF decoding into RGBA rasters and delays.
//! - **service**: builds the animation and runs the scheduler against
//!   the worker pool until shutdown.

pub mod config;
pub mod decode;
pub mod service;
