//! Map rendering pipeline.
//!
//! A [`Renderer`] owns validated [`RenderSettings`] and the sprite cache
//! built from them. Each call to [`Renderer::render`] runs, in order:
//!
//! 1. [`payload::decode`](crate::payload::decode) and [`map::parse`](crate::map::parse)
//! 2. robot bounds and segment coloring
//! 3. layer compositing into the unscaled canvas
//! 4. upscaling
//! 5. entity drawing
//! 6. calibration and PNG encoding
//!
//! Every stage completes before the next one starts. Nothing is kept
//! between calls except the sprites.

mod calibration;
mod coloring;
mod composite;
mod entities;
mod output;
mod rotation;
mod sprites;
mod upscale;

pub use calibration::{calibration_points, CalibrationPoint, ImagePoint};
pub use coloring::{assign_colors, hue_spread_color, AdjacencyGraph, SegmentColors};
pub use composite::{composite, Composite};
pub use entities::{draw_entities, Projection};
pub use output::{encode_png, Compression};
pub use rotation::{CanvasTransform, Rotation};
pub use sprites::{heading_index, SpriteCache, BASE_SPRITE_SIZE};
pub use upscale::upscale;

use std::time::{Duration, Instant};

use image::RgbaImage;
use serde::Serialize;
use tracing::debug;

use crate::config::RenderSettings;
use crate::error::RenderError;
use crate::map::{self, Bounds, MapDocument, MapIndex, RobotBounds};
use crate::payload;

/// Upper limit on output pixels, about 1 GiB of RGBA.
pub const MAX_OUTPUT_PIXELS: u64 = 1 << 28;

/// Pixel dimensions of the output image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// A drawn but not yet encoded map.
#[derive(Debug, Clone)]
pub struct DrawnMap {
    pub image: RgbaImage,
    pub image_size: ImageSize,
    pub robot_bounds: RobotBounds,
    pub calibration: [CalibrationPoint; 3],
    /// Vacuum units per grid cell of the source document.
    pub pixel_size: i64,
    pub segment_colors: SegmentColors,
    /// Layer cells dropped for falling outside the robot bounds.
    pub clipped_pixels: u64,
}

/// Output of one render call.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub encoded_image: Vec<u8>,
    pub image: RgbaImage,
    pub image_size: ImageSize,
    pub robot_bounds: RobotBounds,
    pub settings: RenderSettings,
    pub calibration: [CalibrationPoint; 3],
    pub pixel_size: i64,
    pub draw_time: Duration,
    pub encode_time: Duration,
}

impl RenderResult {
    /// The serializable part handed to consumers next to the image.
    pub fn metadata(&self) -> RenderMetadata<'_> {
        RenderMetadata {
            calibration: &self.calibration,
            image_size: self.image_size,
            robot_bounds: self.robot_bounds,
            pixel_size: self.pixel_size,
        }
    }
}

/// Calibration record written next to the PNG.
#[derive(Debug, Serialize)]
pub struct RenderMetadata<'a> {
    pub calibration: &'a [CalibrationPoint; 3],
    pub image_size: ImageSize,
    pub robot_bounds: RobotBounds,
    pub pixel_size: i64,
}

/// Renders map payloads with fixed settings.
#[derive(Debug, Clone)]
pub struct Renderer {
    settings: RenderSettings,
    sprites: SpriteCache,
}

impl Renderer {
    /// Builds a renderer, loading or generating its sprites.
    pub fn new(settings: RenderSettings) -> Result<Self, RenderError> {
        let sprites = SpriteCache::new(
            settings.scale,
            settings.robot_sprite.as_deref(),
            settings.charger_sprite.as_deref(),
        )?;
        Ok(Self { settings, sprites })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Decodes, draws and encodes `payload`.
    pub fn render(&self, payload: &[u8]) -> Result<RenderResult, RenderError> {
        let started = Instant::now();
        let drawn = self.draw(payload)?;
        let draw_time = started.elapsed();

        let started = Instant::now();
        let encoded_image = encode_png(&drawn.image, self.settings.compression)?;
        let encode_time = started.elapsed();
        debug!(
            bytes = encoded_image.len(),
            encode_ms = encode_time.as_millis() as u64,
            "encoded map image"
        );

        Ok(RenderResult {
            encoded_image,
            image: drawn.image,
            image_size: drawn.image_size,
            robot_bounds: drawn.robot_bounds,
            settings: self.settings.clone(),
            calibration: drawn.calibration,
            pixel_size: drawn.pixel_size,
            draw_time,
            encode_time,
        })
    }

    /// Decodes and draws `payload` without encoding.
    pub fn draw(&self, payload: &[u8]) -> Result<DrawnMap, RenderError> {
        let bytes = payload::decode(payload)?;
        let document = map::parse(&bytes)?;
        self.draw_document(&document)
    }

    /// Draws an already parsed document.
    pub fn draw_document(&self, document: &MapDocument) -> Result<DrawnMap, RenderError> {
        let settings = &self.settings;
        let index = MapIndex::new(document);
        let bounds = robot_bounds(document, settings.static_limits.as_ref())?;

        let (width, height) = settings
            .rotation
            .rotated_size(bounds.width(), bounds.height());
        let image_size = output_size(width, height, settings.scale)?;
        let transform = CanvasTransform::new(settings.rotation, width, height);

        let threshold = settings.adjacency_threshold.unwrap_or(document.pixel_size);
        let segment_colors =
            assign_colors(index.segments(), threshold, &settings.palette.segments);

        let layers = composite(
            &index,
            bounds.min,
            transform,
            &settings.palette,
            &segment_colors,
        )?;
        let canvas = upscale(&layers.image, settings.scale)?;

        let projection = Projection {
            pixel_size: document.pixel_size,
            origin: bounds.min,
            transform,
            scale: settings.scale,
        };
        let image = draw_entities(
            canvas,
            &index,
            &projection,
            &settings.palette,
            &self.sprites,
        );
        let calibration = calibration_points(&bounds, &projection)?;

        debug!(
            width = image_size.width,
            height = image_size.height,
            segments = segment_colors.len(),
            "drew map"
        );

        Ok(DrawnMap {
            image,
            image_size,
            robot_bounds: bounds,
            calibration,
            pixel_size: document.pixel_size,
            segment_colors,
            clipped_pixels: layers.clipped,
        })
    }
}

/// Robot bounds of `document` in grid cells.
///
/// With `static_limits` (vacuum units) the crop is used as is, divided by
/// the pixel size. Otherwise it is the union of every layer's bounding box.
///
/// # Errors
/// [`RenderError::EmptyMap`] when no layer has any extent and no crop is
/// set; [`RenderError::InvalidBounds`] when the result has min > max.
pub fn robot_bounds(
    document: &MapDocument,
    static_limits: Option<&Bounds<map::Vacuum>>,
) -> Result<RobotBounds, RenderError> {
    let bounds = match static_limits {
        Some(limits) => Bounds::new(
            limits.min.to_grid(document.pixel_size),
            limits.max.to_grid(document.pixel_size),
        ),
        None => document
            .layers
            .iter()
            .filter_map(|layer| layer.bounds())
            .reduce(|acc, b| acc.union(&b))
            .ok_or(RenderError::EmptyMap)?,
    };

    let spans_fit = bounds
        .max
        .x
        .checked_sub(bounds.min.x)
        .zip(bounds.max.y.checked_sub(bounds.min.y))
        .is_some_and(|(dx, dy)| dx < i64::MAX && dy < i64::MAX);
    if !bounds.is_ordered() || !spans_fit {
        return Err(RenderError::InvalidBounds {
            min_x: bounds.min.x,
            min_y: bounds.min.y,
            max_x: bounds.max.x,
            max_y: bounds.max.y,
        });
    }
    Ok(bounds)
}

fn output_size(width: i64, height: i64, scale: u32) -> Result<ImageSize, RenderError> {
    let too_large = || RenderError::CanvasTooLarge {
        width: u32::try_from(width).unwrap_or(u32::MAX),
        height: u32::try_from(height).unwrap_or(u32::MAX),
        scale,
    };
    let scaled = |v: i64| {
        u32::try_from(v)
            .ok()
            .and_then(|v| v.checked_mul(scale))
            .ok_or_else(too_large)
    };
    let size = ImageSize {
        width: scaled(width)?,
        height: scaled(height)?,
    };
    if u64::from(size.width) * u64::from(size.height) > MAX_OUTPUT_PIXELS {
        return Err(too_large());
    }
    Ok(size)
}
