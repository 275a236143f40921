//! Layer compositing into the unscaled canvas.
//!
//! Layers are drawn group by group (floor, wall, segment). Within a group
//! each layer is claimed by one worker of a scoped pool; the group is joined
//! before the next starts, so later groups always paint over earlier ones.
//! Pixels are stored as packed RGBA in atomics, which lets workers write
//! without locks while overlapping writes inside one group stay well defined.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::thread;

use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use super::coloring::SegmentColors;
use super::rotation::CanvasTransform;
use crate::config::Palette;
use crate::error::RenderError;
use crate::map::{Coord, Grid, Layer, LayerKind, MapIndex};

/// Result of compositing.
#[derive(Debug)]
pub struct Composite {
    pub image: RgbaImage,
    /// Span cells that fell outside the canvas and were skipped.
    pub clipped: u64,
}

/// Unscaled canvas shared by compositing workers.
struct SharedCanvas {
    width: i64,
    height: i64,
    pixels: Vec<AtomicU32>,
}

impl SharedCanvas {
    fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let too_large = || RenderError::CanvasTooLarge {
            width,
            height,
            scale: 1,
        };
        let len = usize::try_from(width)
            .ok()
            .zip(usize::try_from(height).ok())
            .and_then(|(w, h)| w.checked_mul(h))
            .filter(|len| len.checked_mul(4).is_some())
            .ok_or_else(too_large)?;

        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len).map_err(|_| too_large())?;
        pixels.extend((0..len).map(|_| AtomicU32::new(0)));
        Ok(Self {
            width: i64::from(width),
            height: i64::from(height),
            pixels,
        })
    }

    #[inline]
    fn set(&self, x: i64, y: i64, color: u32) {
        if let Ok(index) = usize::try_from(y * self.width + x) {
            if let Some(pixel) = self.pixels.get(index) {
                pixel.store(color, Ordering::Relaxed);
            }
        }
    }

    fn into_image(self, width: u32, height: u32) -> Result<RgbaImage, RenderError> {
        let raw: Vec<u8> = self
            .pixels
            .into_iter()
            .flat_map(|pixel| pixel.into_inner().to_le_bytes())
            .collect();
        RgbaImage::from_raw(width, height, raw).ok_or(RenderError::CanvasTooLarge {
            width,
            height,
            scale: 1,
        })
    }
}

/// Draws the floor, wall and segment layers of `index` into a canvas of
/// `transform.width x transform.height` pixels.
///
/// Span cells are offset by `origin` (the robot bounds minimum) and rotated
/// with the discrete transform. Cells outside the canvas are skipped and
/// counted.
pub fn composite(
    index: &MapIndex<'_>,
    origin: Coord<Grid>,
    transform: CanvasTransform,
    palette: &Palette,
    segment_colors: &SegmentColors,
) -> Result<Composite, RenderError> {
    let width = u32::try_from(transform.width).map_err(|_| too_large(transform))?;
    let height = u32::try_from(transform.height).map_err(|_| too_large(transform))?;
    let canvas = SharedCanvas::new(width, height)?;

    let fallback_segment = palette.segments.first().copied().unwrap_or(palette.floor);
    let groups: [Vec<(&Layer, Rgba<u8>)>; 3] = [
        with_color(index.layers(&LayerKind::Floor), |_| palette.floor),
        with_color(index.layers(&LayerKind::Wall), |_| palette.wall),
        with_color(index.segments(), |layer| {
            layer
                .segment_id()
                .and_then(|id| segment_colors.get(id))
                .copied()
                .unwrap_or(fallback_segment)
        }),
    ];

    let mut clipped = 0;
    for jobs in &groups {
        clipped += draw_group(&canvas, jobs, origin, transform);
    }

    if clipped > 0 {
        warn!(clipped, "skipped layer pixels outside the canvas");
    }
    debug!(width, height, "composited layers");

    Ok(Composite {
        image: canvas.into_image(width, height)?,
        clipped,
    })
}

fn too_large(transform: CanvasTransform) -> RenderError {
    RenderError::CanvasTooLarge {
        width: u32::try_from(transform.width).unwrap_or(u32::MAX),
        height: u32::try_from(transform.height).unwrap_or(u32::MAX),
        scale: 1,
    }
}

fn with_color<'a>(
    layers: &[&'a Layer],
    color: impl Fn(&Layer) -> Rgba<u8>,
) -> Vec<(&'a Layer, Rgba<u8>)> {
    layers.iter().map(|layer| (*layer, color(layer))).collect()
}

/// Draws one group with a scoped worker pool and returns the clipped
/// cell count once every worker has finished.
fn draw_group(
    canvas: &SharedCanvas,
    jobs: &[(&Layer, Rgba<u8>)],
    origin: Coord<Grid>,
    transform: CanvasTransform,
) -> u64 {
    if jobs.is_empty() {
        return 0;
    }
    let workers = thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(jobs.len());
    let next_job = AtomicUsize::new(0);
    let clipped = AtomicU64::new(0);

    thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let next_job = &next_job;
                let clipped = &clipped;
                s.spawn(move || loop {
                    let job = next_job.fetch_add(1, Ordering::Relaxed);
                    let Some((layer, color)) = jobs.get(job) else {
                        break;
                    };
                    let skipped = draw_layer(canvas, layer, *color, origin, transform);
                    clipped.fetch_add(skipped, Ordering::Relaxed);
                })
            })
            .collect();

        for handle in handles {
            if let Err(panic) = handle.join() {
                std::panic::resume_unwind(panic);
            }
        }
    });

    clipped.into_inner()
}

fn draw_layer(
    canvas: &SharedCanvas,
    layer: &Layer,
    color: Rgba<u8>,
    origin: Coord<Grid>,
    transform: CanvasTransform,
) -> u64 {
    let packed = u32::from_le_bytes(color.0);
    // Spans live in the unrotated frame.
    let (area_w, area_h) = transform
        .rotation
        .rotated_size(canvas.width, canvas.height);
    let mut clipped = 0u64;

    for span in &layer.spans {
        let run = i64::from(span.run);
        let y = span.start.y.saturating_sub(origin.y);
        let x0 = span.start.x.saturating_sub(origin.x);
        let lo = x0.max(0);
        let hi = x0.saturating_add(run).min(area_w);

        if y < 0 || y >= area_h || hi <= lo {
            clipped += u64::from(span.run);
            continue;
        }
        clipped += (run - (hi - lo)) as u64;

        for x in lo..hi {
            let (px, py) = transform.pixel(x, y);
            canvas.set(px, py, packed);
        }
    }
    clipped
}
