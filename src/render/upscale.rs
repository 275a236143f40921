//! Nearest-neighbour integer upscaling.

use std::num::NonZeroUsize;
use std::thread;

use image::RgbaImage;
use tracing::debug;

use crate::error::{ConfigError, RenderError};

const CHANNELS: usize = 4;

/// Replicates every source pixel into a `factor x factor` block.
///
/// Source rows are split into one band per available core; each worker
/// writes only the output rows of its band.
///
/// # Errors
/// Returns [`RenderError::CanvasTooLarge`] when the output size overflows or
/// cannot be allocated.
pub fn upscale(src: &RgbaImage, factor: u32) -> Result<RgbaImage, RenderError> {
    if factor == 0 {
        return Err(ConfigError::Invalid("scale factor must be at least 1".to_string()).into());
    }
    let (width, height) = src.dimensions();
    let too_large = || RenderError::CanvasTooLarge {
        width,
        height,
        scale: factor,
    };
    let out_width = width.checked_mul(factor).ok_or_else(too_large)?;
    let out_height = height.checked_mul(factor).ok_or_else(too_large)?;

    if factor == 1 {
        return Ok(src.clone());
    }
    if width == 0 || height == 0 {
        return Ok(RgbaImage::new(out_width, out_height));
    }

    let k = factor as usize;
    let src_row = width as usize * CHANNELS;
    let out_row = src_row.checked_mul(k).ok_or_else(too_large)?;
    let block_rows = out_row.checked_mul(k).ok_or_else(too_large)?;
    let total = block_rows
        .checked_mul(height as usize)
        .ok_or_else(too_large)?;

    let mut raw = Vec::new();
    raw.try_reserve_exact(total).map_err(|_| too_large())?;
    raw.resize(total, 0u8);

    let workers = thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(height as usize);
    let rows_per_band = (height as usize).div_ceil(workers);
    let source = src.as_raw();

    thread::scope(|s| {
        let handles: Vec<_> = raw
            .chunks_mut(block_rows * rows_per_band)
            .enumerate()
            .map(|(band, out)| {
                s.spawn(move || {
                    let first = band * rows_per_band;
                    for (i, block) in out.chunks_mut(block_rows).enumerate() {
                        let offset = (first + i) * src_row;
                        let row = &source[offset..offset + src_row];
                        let (head, tail) = block.split_at_mut(out_row);
                        for (dst, pixel) in head
                            .chunks_exact_mut(CHANNELS * k)
                            .zip(row.chunks_exact(CHANNELS))
                        {
                            for cell in dst.chunks_exact_mut(CHANNELS) {
                                cell.copy_from_slice(pixel);
                            }
                        }
                        for copy in tail.chunks_exact_mut(out_row) {
                            copy.copy_from_slice(head);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            if let Err(panic) = handle.join() {
                std::panic::resume_unwind(panic);
            }
        }
    });

    debug!(out_width, out_height, factor, workers, "upscaled canvas");
    RgbaImage::from_raw(out_width, out_height, raw).ok_or_else(too_large)
}
