//! Robot and charger marker sprites.
//!
//! Sprites are built once per [`Renderer`](super::Renderer) and only read
//! afterwards. The robot sprite is stored pre-rotated for every whole degree
//! so drawing a heading is a lookup.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_polygon_mut,
};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::point::Point;
use imageproc::rect::Rect;
use tracing::debug;

use super::rotation::Rotation;
use crate::error::RenderError;

/// Edge length of the built-in sprites, sized for scale 4.
pub const BASE_SPRITE_SIZE: u32 = 32;

/// Scale at which sprites are drawn at their native size.
const NATIVE_SCALE: u32 = 4;

const ROBOT_BODY: Rgba<u8> = Rgba([0xF5, 0xF5, 0xF5, 0xFF]);
const ROBOT_RIM: Rgba<u8> = Rgba([0x40, 0x40, 0x40, 0xFF]);
const ROBOT_TURRET: Rgba<u8> = Rgba([0x9E, 0x9E, 0x9E, 0xFF]);
const ROBOT_HEADING: Rgba<u8> = Rgba([0x1E, 0x88, 0xE5, 0xFF]);
const CHARGER_BODY: Rgba<u8> = Rgba([0x2E, 0xCC, 0x71, 0xFF]);
const CHARGER_MARK: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);

/// Pre-scaled marker sprites.
#[derive(Debug, Clone)]
pub struct SpriteCache {
    /// Index `d` holds the robot turned `d` degrees clockwise.
    robot: Vec<RgbaImage>,
    charger: RgbaImage,
}

impl SpriteCache {
    /// Builds the cache for `scale`, using the PNG overrides when given.
    pub fn new(
        scale: u32,
        robot_override: Option<&Path>,
        charger_override: Option<&Path>,
    ) -> Result<Self, RenderError> {
        let robot = match robot_override {
            Some(path) => load_sprite(path)?,
            None => robot_sprite(),
        };
        let charger = match charger_override {
            Some(path) => load_sprite(path)?,
            None => charger_sprite(),
        };

        let robot = scale_sprite(&robot, scale);
        let robot = (0..360u16)
            .map(|degrees| rotate_clockwise(&robot, f32::from(degrees)))
            .collect();
        debug!(scale, "built sprite cache");

        Ok(Self {
            robot,
            charger: scale_sprite(&charger, scale),
        })
    }

    /// Robot sprite for a heading in degrees, adjusted for the display
    /// rotation.
    pub fn robot(&self, angle: f64, rotation: Rotation) -> &RgbaImage {
        &self.robot[heading_index(angle, rotation)]
    }

    pub fn charger(&self) -> &RgbaImage {
        &self.charger
    }
}

/// `(angle + quarter_turns * 90) mod 360`, rounded to a whole degree.
pub fn heading_index(angle: f64, rotation: Rotation) -> usize {
    let degrees = if angle.is_finite() {
        (angle.round() % 360.0) as i64
    } else {
        0
    };
    (degrees + i64::from(rotation.degrees())).rem_euclid(360) as usize
}

fn load_sprite(path: &Path) -> Result<RgbaImage, RenderError> {
    image::open(path)
        .map(|sprite| sprite.to_rgba8())
        .map_err(|source| RenderError::Sprite {
            path: path.to_path_buf(),
            source,
        })
}

/// Resizes by `scale / 4`, never below one pixel.
fn scale_sprite(sprite: &RgbaImage, scale: u32) -> RgbaImage {
    let (w, h) = sprite.dimensions();
    let target = |v: u32| (u64::from(v) * u64::from(scale) / u64::from(NATIVE_SCALE)).max(1);
    let (tw, th) = (target(w), target(h));
    if (tw, th) == (u64::from(w), u64::from(h)) {
        return sprite.clone();
    }
    let tw = u32::try_from(tw).unwrap_or(u32::MAX);
    let th = u32::try_from(th).unwrap_or(u32::MAX);
    imageops::resize(sprite, tw, th, FilterType::Triangle)
}

fn rotate_clockwise(sprite: &RgbaImage, degrees: f32) -> RgbaImage {
    if degrees == 0.0 {
        return sprite.clone();
    }
    rotate_about_center(
        sprite,
        degrees.to_radians(),
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
    )
}

/// Round robot seen from above, heading up.
fn robot_sprite() -> RgbaImage {
    let size = BASE_SPRITE_SIZE as i32;
    let c = size / 2;
    let mut sprite = RgbaImage::new(BASE_SPRITE_SIZE, BASE_SPRITE_SIZE);

    draw_filled_circle_mut(&mut sprite, (c, c), c - 2, ROBOT_BODY);
    draw_hollow_circle_mut(&mut sprite, (c, c), c - 2, ROBOT_RIM);
    draw_filled_circle_mut(&mut sprite, (c, c), 5, ROBOT_TURRET);
    draw_polygon_mut(
        &mut sprite,
        &[
            Point::new(c, 3),
            Point::new(c + 5, 10),
            Point::new(c - 5, 10),
        ],
        ROBOT_HEADING,
    );
    sprite
}

/// Dock marker: a green disc with a white plug mark.
fn charger_sprite() -> RgbaImage {
    let size = BASE_SPRITE_SIZE as i32;
    let c = size / 2;
    let mut sprite = RgbaImage::new(BASE_SPRITE_SIZE, BASE_SPRITE_SIZE);

    draw_filled_circle_mut(&mut sprite, (c, c), c - 4, CHARGER_BODY);
    draw_filled_rect_mut(&mut sprite, Rect::at(c - 5, c - 2).of_size(10, 8), CHARGER_MARK);
    draw_filled_rect_mut(&mut sprite, Rect::at(c - 4, c - 7).of_size(2, 5), CHARGER_MARK);
    draw_filled_rect_mut(&mut sprite, Rect::at(c + 2, c - 7).of_size(2, 5), CHARGER_MARK);
    sprite
}
