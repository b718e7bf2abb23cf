//! Pixel → IPv6 address encodings.
//!
//! The display lights one pixel per address it receives a ping on. Two
//! address layouts are in use across deployments:
//!
//! - [`ByteOffset`]: the low 64 bits of the prefix carry binary
//!   `x`, `y`, `b`, `g`, `r`, `a` fields.
//! - [`TextSegment`]: the prefix's first three groups followed by the
//!   decimal coordinates and hex colour bytes as separate groups.
//!
//! Both are selected once at startup and used through the
//! [`AddressEncoding`] trait.

use std::net::Ipv6Addr;

// ── Pixel ────────────────────────────────────────────────────────

/// One 8-bit RGBA colour sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully transparent pixels are never drawn.
    pub const fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Scale the colour channels by alpha.
    ///
    /// Works in 16-bit channel space and shifts back down to 8 bits, so
    /// opaque pixels come out unchanged.
    pub fn premultiplied(self) -> Self {
        let a = self.a as u32;
        let scale = |c: u8| ((c as u32 * a * 0x101 / 0xff) >> 8) as u8;
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
            a: self.a,
        }
    }
}

impl From<image::Rgba<u8>> for Pixel {
    fn from(px: image::Rgba<u8>) -> Self {
        let [r, g, b, a] = px.0;
        Self { r, g, b, a }
    }
}

// ── AddressEncoding ──────────────────────────────────────────────

/// Maps a display coordinate and colour onto a target address.
pub trait AddressEncoding: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Exclusive upper bounds `(width, height)` of the addressable area.
    fn bounds(&self) -> (u32, u32);

    /// Encode one pixel.
    ///
    /// Returns `None` for transparent pixels and for coordinates outside
    /// [`bounds`](Self::bounds).
    fn encode(&self, prefix: Ipv6Addr, x: u32, y: u32, pixel: Pixel) -> Option<Ipv6Addr>;

    /// Whether `(x, y)` lies inside the addressable area.
    fn contains(&self, x: u32, y: u32) -> bool {
        let (w, h) = self.bounds();
        x < w && y < h
    }
}

// ── ByteOffset ───────────────────────────────────────────────────

/// Binary layout in the low 64 bits of the address.
///
/// ```text
/// bytes 0..8   prefix (unchanged)
/// bytes 8..10  x  (big-endian u16)
/// bytes 10..12 y  (big-endian u16)
/// byte  12     blue
/// byte  13     green
/// byte  14     red
/// byte  15     alpha
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteOffset;

impl ByteOffset {
    /// Recover `(x, y, pixel)` from an address produced by [`encode`](AddressEncoding::encode).
    pub fn decode(addr: Ipv6Addr) -> (u16, u16, Pixel) {
        let o = addr.octets();
        let x = u16::from_be_bytes([o[8], o[9]]);
        let y = u16::from_be_bytes([o[10], o[11]]);
        (x, y, Pixel::new(o[14], o[13], o[12], o[15]))
    }
}

impl AddressEncoding for ByteOffset {
    fn name(&self) -> &'static str {
        "byte-offset"
    }

    fn bounds(&self) -> (u32, u32) {
        (u16::MAX as u32 + 1, u16::MAX as u32 + 1)
    }

    fn encode(&self, prefix: Ipv6Addr, x: u32, y: u32, pixel: Pixel) -> Option<Ipv6Addr> {
        if pixel.is_transparent() || !self.contains(x, y) {
            return None;
        }

        let mut o = prefix.octets();
        o[8..10].copy_from_slice(&(x as u16).to_be_bytes());
        o[10..12].copy_from_slice(&(y as u16).to_be_bytes());
        o[12] = pixel.b;
        o[13] = pixel.g;
        o[14] = pixel.r;
        o[15] = pixel.a;
        Some(Ipv6Addr::from(o))
    }
}

// ── TextSegment ──────────────────────────────────────────────────

/// Default display width for the text-segment layout.
pub const DEFAULT_MAX_WIDTH: u32 = 1920;
/// Default display height for the text-segment layout.
pub const DEFAULT_MAX_HEIGHT: u32 = 1080;

/// Largest bound representable: four decimal digits per group.
pub const TEXT_SEGMENT_LIMIT: u32 = 10_000;

/// Textual layout: `{p0}:{p1}:{p2}:{x}:{y}:{rr}:{gg}:{bb}`.
///
/// `x` and `y` are written in decimal and read back as hex groups, so
/// the display is limited to four decimal digits per axis.
#[derive(Debug, Clone, Copy)]
pub struct TextSegment {
    max_width: u32,
    max_height: u32,
}

impl TextSegment {
    /// Bounds are clamped to [`TEXT_SEGMENT_LIMIT`].
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width: max_width.min(TEXT_SEGMENT_LIMIT),
            max_height: max_height.min(TEXT_SEGMENT_LIMIT),
        }
    }
}

impl Default for TextSegment {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WIDTH, DEFAULT_MAX_HEIGHT)
    }
}

impl AddressEncoding for TextSegment {
    fn name(&self) -> &'static str {
        "text-segment"
    }

    fn bounds(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }

    fn encode(&self, prefix: Ipv6Addr, x: u32, y: u32, pixel: Pixel) -> Option<Ipv6Addr> {
        if pixel.is_transparent() || !self.contains(x, y) {
            return None;
        }

        let s = prefix.segments();
        format!(
            "{:x}:{:x}:{:x}:{}:{}:{:02x}:{:02x}:{:02x}",
            s[0], s[1], s[2], x, y, pixel.r, pixel.g, pixel.b
        )
        .parse()
        .ok()
    }
}

// ── Tests ────────────────────────────────────────────────────────
