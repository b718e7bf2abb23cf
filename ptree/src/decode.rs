//! Image decoding.
//!
//! Turns an image file into RGBA rasters. Animated GIFs yield every
//! frame plus its display delay; all other formats yield one still
//! frame and no delays.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::path::Path;
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageFormat, ImageReader, RgbaImage};

use ptree_core::{PtreeError, PtreeResult};

/// Decoded rasters in display order.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub frames: Vec<RgbaImage>,
    /// Per-frame delays; `None` for still images.
    pub delays: Option<Vec<Duration>>,
}

impl DecodedImage {
    /// Dimensions of the first frame.
    pub fn dimensions(&self) -> (u32, u32) {
        self.frames.first().map(|f| f.dimensions()).unwrap_or((0, 0))
    }
}

/// Open and decode `path`.
pub fn decode_path(path: &Path) -> PtreeResult<DecodedImage> {
    let file = File::open(path)
        .map_err(|e| PtreeError::ImageDecode(format!("{}: {e}", path.display())))?;
    decode_reader(BufReader::new(file))
}

/// Decode from any seekable reader, guessing the format from its contents.
pub fn decode_reader<R: BufRead + Seek>(reader: R) -> PtreeResult<DecodedImage> {
    let reader = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(|e| PtreeError::ImageDecode(e.to_string()))?;

    match reader.format() {
        Some(ImageFormat::Gif) => decode_gif(reader.into_inner()),
        _ => {
            let image = reader.decode()?;
            Ok(DecodedImage {
                frames: vec![image.to_rgba8()],
                delays: None,
            })
        }
    }
}

fn decode_gif<R: BufRead + Seek>(reader: R) -> PtreeResult<DecodedImage> {
    let frames = GifDecoder::new(reader)?.into_frames().collect_frames()?;
    if frames.is_empty() {
        return Err(PtreeError::ImageDecode("gif contains no frames".into()));
    }

    let delays = frames.iter().map(|f| Duration::from(f.delay())).collect();
    let frames = frames.into_iter().map(|f| f.into_buffer()).collect();
    Ok(DecodedImage {
        frames,
        delays: Some(delays),
    })
}
