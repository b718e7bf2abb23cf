//! Configuration for the pixel tree pinger.

use std::net::Ipv6Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ptree_core::encoding::{DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH, TEXT_SEGMENT_LIMIT};
use ptree_core::{
    AddressEncoding, ByteOffset, ChannelOpener, IcmpSocketOpener, PtreeError, PtreeResult,
    SocketType, TextSegment,
};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PtreeConfig {
    /// Target display.
    pub display: DisplayConfig,
    /// Source image and placement.
    pub image: ImageConfig,
    /// Redraw timing.
    pub playback: PlaybackConfig,
    /// Packet senders.
    pub transmit: TransmitConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Display configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Destination network of the pixel tree.
    pub dst_net: String,
    /// Address layout understood by the display.
    pub encoding: EncodingKind,
    /// Display width (text-segment layout only).
    pub max_width: u32,
    /// Display height (text-segment layout only).
    pub max_height: u32,
}

/// Address layout selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingKind {
    /// Binary x/y/bgra in the low 64 bits.
    #[default]
    ByteOffset,
    /// Decimal x/y and hex colour groups.
    TextSegment,
}

/// Image configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Image or animated GIF to draw.
    pub path: Option<PathBuf>,
    /// Horizontal placement offset.
    pub x: i64,
    /// Vertical placement offset.
    pub y: i64,
}

/// Playback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Redraws per second.
    pub rate: u32,
    /// Stop after one pass over all frames.
    pub once: bool,
    /// Fixed shuffle seed; random when unset.
    pub seed: Option<u64>,
}

/// Transmission configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmitConfig {
    /// Number of concurrent senders.
    pub workers: usize,
    /// Which sender to use.
    pub backend: Backend,
    /// Outgoing interface for the pcap / PF_RING senders.
    pub interface: String,
    /// ICMPv6 socket type for the socket sender.
    pub socket_type: SocketKind,
}

/// Packet sender selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    #[default]
    Socket,
    Pcap,
    PfRing,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::Socket => "socket",
            Backend::Pcap => "pcap",
            Backend::PfRing => "pf-ring",
        }
    }
}

/// ICMPv6 socket flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SocketKind {
    #[default]
    Raw,
    Dgram,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            dst_net: "2001:610:1908:a000::".into(),
            encoding: EncodingKind::ByteOffset,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            rate: 5,
            once: false,
            seed: None,
        }
    }
}

impl Default for TransmitConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            backend: Backend::Socket,
            interface: String::new(),
            socket_type: SocketKind::Raw,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl PtreeConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults. A file that exists but cannot
    /// be read or parsed is an error.
    pub fn load(path: &Path) -> PtreeResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(PtreeError::InvalidConfig(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };
        toml::from_str(&contents)
            .map_err(|e| PtreeError::InvalidConfig(format!("{}: {e}", path.display())))
    }

    // ── Validation ───────────────────────────────────────────────

    /// Check everything that can be checked before touching the network.
    pub fn validate(&self) -> PtreeResult<()> {
        if self.playback.rate == 0 {
            return Err(PtreeError::InvalidConfig("rate must be at least 1".into()));
        }
        if self.transmit.workers == 0 {
            return Err(PtreeError::InvalidConfig(
                "workers must be at least 1".into(),
            ));
        }
        if self.display.encoding == EncodingKind::TextSegment
            && (self.display.max_width > TEXT_SEGMENT_LIMIT
                || self.display.max_height > TEXT_SEGMENT_LIMIT)
        {
            return Err(PtreeError::InvalidConfig(format!(
                "text-segment display is limited to {TEXT_SEGMENT_LIMIT}x{TEXT_SEGMENT_LIMIT}"
            )));
        }
        self.prefix()?;
        Ok(())
    }

    /// Parsed destination network.
    pub fn prefix(&self) -> PtreeResult<Ipv6Addr> {
        self.display
            .dst_net
            .parse()
            .map_err(|e: std::net::AddrParseError| PtreeError::InvalidPrefix {
                input: self.display.dst_net.clone(),
                reason: e.to_string(),
            })
    }

    /// The selected address layout.
    pub fn encoding(&self) -> Arc<dyn AddressEncoding> {
        match self.display.encoding {
            EncodingKind::ByteOffset => Arc::new(ByteOffset),
            EncodingKind::TextSegment => {
                Arc::new(TextSegment::new(self.display.max_width, self.display.max_height))
            }
        }
    }

    /// The selected packet sender.
    ///
    /// pcap and PF_RING senders live outside this binary; selecting one
    /// is a setup error.
    pub fn opener(&self) -> PtreeResult<Arc<dyn ChannelOpener>> {
        match self.transmit.backend {
            Backend::Socket => {
                let socket_type = match self.transmit.socket_type {
                    SocketKind::Raw => SocketType::Raw,
                    SocketKind::Dgram => SocketType::Dgram,
                };
                Ok(Arc::new(IcmpSocketOpener::new(socket_type)))
            }
            backend => Err(PtreeError::UnsupportedBackend {
                backend: backend.name(),
                interface: self.transmit.interface.clone(),
            }),
        }
    }

    /// Interval between redraw passes.
    pub fn redraw_interval(&self) -> Duration {
        ptree_core::redraw_interval(self.playback.rate)
    }
}

// ── Tests ────────────────────────────────────────────────────────
