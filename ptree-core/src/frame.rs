//! Frames and animations.
//!
//! A [`Frame`] is every address needed to draw one raster image, in a
//! shuffled order so the display does not fill in visible scan lines.
//! An [`Animation`] is the ordered list of frames with their display
//! delays.

use std::net::Ipv6Addr;
use std::time::Duration;

use image::RgbaImage;
use rand::Rng;

use crate::encoding::{AddressEncoding, Pixel};

// ── FrameBuilder ─────────────────────────────────────────────────

/// Converts decoded rasters into [`Frame`]s for one destination prefix.
pub struct FrameBuilder<'a> {
    encoding: &'a dyn AddressEncoding,
    prefix: Ipv6Addr,
    x_offset: i64,
    y_offset: i64,
}

impl<'a> FrameBuilder<'a> {
    pub fn new(encoding: &'a dyn AddressEncoding, prefix: Ipv6Addr) -> Self {
        Self {
            encoding,
            prefix,
            x_offset: 0,
            y_offset: 0,
        }
    }

    /// Place the image at `(x, y)` on the display.
    pub fn with_offset(mut self, x: i64, y: i64) -> Self {
        self.x_offset = x;
        self.y_offset = y;
        self
    }

    /// Encode every visible pixel of `image`, then shuffle.
    ///
    /// Pixel selection walks the image in row-major order; only the final
    /// ordering depends on `rng`.
    pub fn build<R: Rng + ?Sized>(&self, image: &RgbaImage, rng: &mut R) -> Frame {
        let mut addrs = self.collect(image);
        shuffle(&mut addrs, rng);
        Frame { addrs }
    }

    fn collect(&self, image: &RgbaImage) -> Vec<Ipv6Addr> {
        let mut addrs = Vec::new();
        for (x, y, px) in image.enumerate_pixels() {
            let pixel = Pixel::from(*px);
            if pixel.is_transparent() {
                continue;
            }
            let Some((dx, dy)) = self.place(x, y) else {
                continue;
            };
            if let Some(addr) = self.encoding.encode(self.prefix, dx, dy, pixel.premultiplied()) {
                addrs.push(addr);
            }
        }
        addrs
    }

    /// Apply the offset; `None` when the result falls off the display.
    fn place(&self, x: u32, y: u32) -> Option<(u32, u32)> {
        let dx = u32::try_from(i64::from(x).checked_add(self.x_offset)?).ok()?;
        let dy = u32::try_from(i64::from(y).checked_add(self.y_offset)?).ok()?;
        self.encoding.contains(dx, dy).then_some((dx, dy))
    }
}

/// In-place shuffle where element `i` swaps with a partner drawn from `0..=i`.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in 0..items.len() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

// ── Frame ────────────────────────────────────────────────────────

/// The shuffled addresses for one raster image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    addrs: Vec<Ipv6Addr>,
}

impl Frame {
    pub fn addrs(&self) -> &[Ipv6Addr] {
        &self.addrs
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }
}

impl From<Vec<Ipv6Addr>> for Frame {
    fn from(addrs: Vec<Ipv6Addr>) -> Self {
        Self { addrs }
    }
}

// ── Animation ────────────────────────────────────────────────────

/// One frame together with how long it stays on the display.
#[derive(Debug, Clone)]
pub struct AnimationFrame {
    pub frame: Frame,
    pub delay: Duration,
}

/// Frames in display order. A still image is a one-frame animation.
#[derive(Debug, Clone)]
pub struct Animation {
    frames: Vec<AnimationFrame>,
}

impl Animation {
    /// Pair frames with their delays.
    ///
    /// `delays == None` means a still image: only the first frame is
    /// kept and it is shown for one `rate_interval`. Zero delays (and
    /// frames without a matching delay) also fall back to `rate_interval`.
    pub fn new(frames: Vec<Frame>, delays: Option<Vec<Duration>>, rate_interval: Duration) -> Self {
        let frames = match delays {
            None => frames
                .into_iter()
                .take(1)
                .map(|frame| AnimationFrame {
                    frame,
                    delay: rate_interval,
                })
                .collect(),
            Some(delays) => frames
                .into_iter()
                .enumerate()
                .map(|(i, frame)| {
                    let delay = delays
                        .get(i)
                        .copied()
                        .filter(|d| !d.is_zero())
                        .unwrap_or(rate_interval);
                    AnimationFrame { frame, delay }
                })
                .collect(),
        };
        Self { frames }
    }

    /// A single still frame shown for `delay`.
    pub fn still(frame: Frame, delay: Duration) -> Self {
        Self {
            frames: vec![AnimationFrame { frame, delay }],
        }
    }

    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Address count of the largest frame.
    pub fn largest_frame(&self) -> usize {
        self.frames.iter().map(|f| f.frame.len()).max().unwrap_or(0)
    }

    /// Total addresses across all frames.
    pub fn total_addrs(&self) -> usize {
        self.frames.iter().map(|f| f.frame.len()).sum()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{ByteOffset, TextSegment};
    use image::Rgba;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn prefix() -> Ipv6Addr {
        "2001:db8::".parse().unwrap()
    }

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([x as u8, y as u8, 0x80, 0xff])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }

    #[test]
    fn skips_transparent_pixels() {
        let img = checker(4, 4);
        let frame = FrameBuilder::new(&ByteOffset, prefix()).build(&img, &mut StdRng::seed_from_u64(1));
        assert_eq!(frame.len(), 8);
        for addr in frame.addrs() {
            let (x, y, px) = ByteOffset::decode(*addr);
            assert_eq!((x + y) % 2, 0);
            assert_eq!(px, Pixel::new(x as u8, y as u8, 0x80, 0xff));
        }
    }

    #[test]
    fn applies_offset() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 255]));
        let frame = FrameBuilder::new(&ByteOffset, prefix())
            .with_offset(10, 20)
            .build(&img, &mut StdRng::seed_from_u64(0));
        assert_eq!(ByteOffset::decode(frame.addrs()[0]), (10, 20, Pixel::new(1, 2, 3, 255)));
    }

    #[test]
    fn negative_offset_drops_offscreen_pixels() {
        let img = RgbaImage::from_pixel(3, 1, Rgba([9, 9, 9, 255]));
        let frame = FrameBuilder::new(&ByteOffset, prefix())
            .with_offset(-2, 0)
            .build(&img, &mut StdRng::seed_from_u64(0));
        assert_eq!(frame.len(), 1);
        assert_eq!(ByteOffset::decode(frame.addrs()[0]).0, 0);
    }

    #[test]
    fn extreme_offsets_drop_pixels() {
        let img = RgbaImage::from_pixel(2, 1, Rgba([9, 9, 9, 255]));
        let mut rng = StdRng::seed_from_u64(0);
        for (x, y) in [(i64::MAX, 0), (0, i64::MAX), (i64::MIN, 0), (0, i64::MIN)] {
            let frame = FrameBuilder::new(&ByteOffset, prefix())
                .with_offset(x, y)
                .build(&img, &mut rng);
            assert!(frame.is_empty(), "offset ({x}, {y})");
        }
    }

    #[test]
    fn text_segment_filters_beyond_display() {
        let enc = TextSegment::new(4, 4);
        let img = RgbaImage::from_pixel(3, 3, Rgba([1, 1, 1, 255]));
        let frame = FrameBuilder::new(&enc, prefix())
            .with_offset(2, 2)
            .build(&img, &mut StdRng::seed_from_u64(0));
        // Only (2,2) (3,2) (2,3) (3,3) stay on a 4x4 display.
        assert_eq!(frame.len(), 4);
    }

    #[test]
    fn shuffle_is_deterministic_for_a_seed() {
        let img = checker(16, 16);
        let builder = FrameBuilder::new(&ByteOffset, prefix());
        let a = builder.build(&img, &mut StdRng::seed_from_u64(42));
        let b = builder.build(&img, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);

        let unshuffled = builder.collect(&img);
        let mut sorted_a = a.addrs().to_vec();
        let mut sorted_u = unshuffled.clone();
        sorted_a.sort();
        sorted_u.sort();
        assert_eq!(sorted_a, sorted_u);
    }

    #[test]
    fn shuffle_draws_partner_from_prefix() {
        let mut items: Vec<usize> = (0..32).collect();
        let mut rng = StdRng::seed_from_u64(7);
        shuffle(&mut items, &mut rng);

        let mut expected: Vec<usize> = (0..32).collect();
        let mut rng = StdRng::seed_from_u64(7);
        for i in 0..expected.len() {
            let j = rng.gen_range(0..=i);
            expected.swap(i, j);
        }
        assert_eq!(items, expected);
    }

    #[test]
    fn still_animation_uses_rate_interval() {
        let interval = Duration::from_millis(200);
        let anim = Animation::new(vec![Frame::default(), Frame::default()], None, interval);
        assert_eq!(anim.len(), 1);
        assert_eq!(anim.frames()[0].delay, interval);
    }

    #[test]
    fn zero_delays_fall_back_to_rate_interval() {
        let interval = Duration::from_millis(200);
        let anim = Animation::new(
            vec![Frame::default(), Frame::default()],
            Some(vec![Duration::ZERO, Duration::from_millis(70)]),
            interval,
        );
        assert_eq!(anim.frames()[0].delay, interval);
        assert_eq!(anim.frames()[1].delay, Duration::from_millis(70));
    }

    #[test]
    fn largest_frame() {
        let addr = prefix();
        let anim = Animation::new(
            vec![Frame::from(vec![addr; 3]), Frame::from(vec![addr; 7]), Frame::default()],
            Some(vec![Duration::from_millis(10); 3]),
            Duration::from_millis(100),
        );
        assert_eq!(anim.largest_frame(), 7);
        assert_eq!(anim.total_addrs(), 10);
    }
}
