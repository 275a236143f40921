//! Quarter-turn rotation shared by the compositor and the entity drawer.
//!
//! Two flavours of the same transform exist and are intentionally kept
//! apart:
//! - [`CanvasTransform::pixel`] addresses discrete cells (`0..W`), so the
//!   far edge is `W - 1`.
//! - [`CanvasTransform::point`] maps continuous positions (`0..=W`), so the
//!   far edge is `W`.
//!
//! `W` and `H` are always the dimensions of the unscaled, already rotated
//! canvas.

use serde::Serialize;

/// Display rotation in clockwise quarter turns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
pub enum Rotation {
    #[default]
    #[value(name = "0")]
    None,
    #[value(name = "1")]
    Quarter,
    #[value(name = "2")]
    Half,
    #[value(name = "3")]
    ThreeQuarters,
}

impl Rotation {
    pub fn from_quarter_turns(turns: u8) -> Option<Self> {
        match turns {
            0 => Some(Rotation::None),
            1 => Some(Rotation::Quarter),
            2 => Some(Rotation::Half),
            3 => Some(Rotation::ThreeQuarters),
            _ => None,
        }
    }

    pub fn quarter_turns(self) -> u8 {
        match self {
            Rotation::None => 0,
            Rotation::Quarter => 1,
            Rotation::Half => 2,
            Rotation::ThreeQuarters => 3,
        }
    }

    pub fn degrees(self) -> u32 {
        u32::from(self.quarter_turns()) * 90
    }

    /// Returns true for 90° and 270°, where width and height trade places.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Quarter | Rotation::ThreeQuarters)
    }

    /// Canvas dimensions after rotating a `width x height` area.
    pub fn rotated_size<T>(self, width: T, height: T) -> (T, T) {
        if self.swaps_axes() {
            (height, width)
        } else {
            (width, height)
        }
    }
}

/// Rotation bound to the unscaled canvas it maps into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanvasTransform {
    pub rotation: Rotation,
    /// Unscaled canvas width, after rotation.
    pub width: i64,
    /// Unscaled canvas height, after rotation.
    pub height: i64,
}

impl CanvasTransform {
    pub fn new(rotation: Rotation, width: i64, height: i64) -> Self {
        Self {
            rotation,
            width,
            height,
        }
    }

    /// Discrete variant for pixel fills.
    #[inline]
    pub fn pixel(&self, x: i64, y: i64) -> (i64, i64) {
        let (w, h) = (self.width, self.height);
        match self.rotation {
            Rotation::None => (x, y),
            Rotation::Quarter => (w - 1 - y, x),
            Rotation::Half => (w - 1 - x, h - 1 - y),
            Rotation::ThreeQuarters => (y, h - 1 - x),
        }
    }

    /// Continuous variant for vector drawing and calibration.
    #[inline]
    pub fn point(&self, x: f64, y: f64) -> (f64, f64) {
        let (w, h) = (self.width as f64, self.height as f64);
        match self.rotation {
            Rotation::None => (x, y),
            Rotation::Quarter => (w - y, x),
            Rotation::Half => (w - x, h - y),
            Rotation::ThreeQuarters => (y, h - x),
        }
    }
}
