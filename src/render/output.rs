//! PNG encoding of the final canvas.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use serde::Serialize;

use crate::error::EncodeError;

/// PNG compression/speed trade-off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Fastest,
    Smallest,
    #[default]
    Balanced,
    /// Stored deflate blocks with no row filtering.
    Uncompressed,
}

impl Compression {
    /// Maps the configuration level: 0 fastest, 1 smallest, 2 balanced,
    /// 3 none.
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Compression::Fastest),
            1 => Some(Compression::Smallest),
            2 => Some(Compression::Balanced),
            3 => Some(Compression::Uncompressed),
            _ => None,
        }
    }

    fn encoder_params(self) -> (CompressionType, FilterType) {
        match self {
            Compression::Fastest => (CompressionType::Fast, FilterType::Adaptive),
            Compression::Smallest => (CompressionType::Best, FilterType::Adaptive),
            Compression::Balanced => (CompressionType::Default, FilterType::Adaptive),
            Compression::Uncompressed => (CompressionType::Uncompressed, FilterType::NoFilter),
        }
    }
}

/// Encodes `canvas` as an RGBA PNG.
pub fn encode_png(canvas: &RgbaImage, compression: Compression) -> Result<Vec<u8>, EncodeError> {
    let (kind, filter) = compression.encoder_params();
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, kind, filter);
    encoder.write_image(
        canvas.as_raw(),
        canvas.width(),
        canvas.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}
