//! Domain-specific error types for the pixel tree pinger.
//!
//! Setup failures are returned as `Result<T, PtreeError>` and are fatal
//! to the process. Per-packet send failures never leave the worker
//! that observed them.

use thiserror::Error;

/// The canonical error type for `ptree-core`.
#[derive(Debug, Error)]
pub enum PtreeError {
    // ── Configuration Errors ─────────────────────────────────────
    /// The destination network could not be parsed as an IPv6 address.
    #[error("invalid destination prefix {input:?}: {reason}")]
    InvalidPrefix { input: String, reason: String },

    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The selected transmission backend is not built into this binary.
    #[error("transmission backend {backend} is not available (interface {interface:?})")]
    UnsupportedBackend {
        backend: &'static str,
        interface: String,
    },

    // ── Image Errors ─────────────────────────────────────────────
    /// The source image could not be decoded.
    #[error("could not decode image: {0}")]
    ImageDecode(String),

    // ── Transmission Errors ──────────────────────────────────────
    /// A transmission channel (ping socket) could not be opened.
    #[error("could not open ping socket: {0}")]
    ChannelOpen(#[source] std::io::Error),

    // ── Queue Errors ─────────────────────────────────────────────
    /// The work queue was closed while the scheduler was still producing.
    #[error("work queue closed")]
    QueueClosed,

    // ── Generic ──────────────────────────────────────────────────
    /// The OS/IO layer reported an error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used across the crate.
pub type PtreeResult<T> = Result<T, PtreeError>;

// ── Convenient From implementations ──────────────────────────────

impl From<String> for PtreeError {
    fn from(s: String) -> Self {
        PtreeError::Other(s)
    }
}

impl From<&str> for PtreeError {
    fn from(s: &str) -> Self {
        PtreeError::Other(s.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for PtreeError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        PtreeError::QueueClosed
    }
}

impl From<image::ImageError> for PtreeError {
    fn from(e: image::ImageError) -> Self {
        PtreeError::ImageDecode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = PtreeError::InvalidPrefix {
            input: "not-an-ip".into(),
            reason: "invalid IPv6 address syntax".into(),
        };
        assert!(e.to_string().contains("not-an-ip"));

        let e = PtreeError::UnsupportedBackend {
            backend: "pcap",
            interface: "eth0".into(),
        };
        assert!(e.to_string().contains("pcap"));
        assert!(e.to_string().contains("eth0"));
    }

    #[test]
    fn from_string() {
        let e: PtreeError = "something broke".into();
        assert!(matches!(e, PtreeError::Other(_)));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no raw sockets");
        let e: PtreeError = io_err.into();
        assert!(matches!(e, PtreeError::Io(_)));
    }

    #[tokio::test]
    async fn from_send_error() {
        let (tx, rx) = tokio::sync::mpsc::channel::<u8>(1);
        drop(rx);
        let e: PtreeError = tx.send(1).await.unwrap_err().into();
        assert!(matches!(e, PtreeError::QueueClosed));
    }
}
