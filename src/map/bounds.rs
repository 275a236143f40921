//! Inclusive axis-aligned rectangles on integer coordinates.

use serde::{Deserialize, Serialize};

use super::coord::Coord;
use super::space::Grid;

/// An inclusive axis-aligned rectangle (`min..=max` on both axes).
///
/// Unlike a pixel-count rectangle, `width()` and `height()` count cells:
/// a box with `min.x == max.x` is one cell wide.
pub struct Bounds<TSpace> {
    pub min: Coord<TSpace>,
    pub max: Coord<TSpace>,
}

impl<TSpace> Clone for Bounds<TSpace> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<TSpace> Copy for Bounds<TSpace> {}

impl<TSpace> PartialEq for Bounds<TSpace> {
    fn eq(&self, other: &Self) -> bool {
        self.min == other.min && self.max == other.max
    }
}

impl<TSpace> Eq for Bounds<TSpace> {}

/// Rectangle in map-grid cells enclosing everything that gets rendered.
/// It defines the unscaled canvas size.
pub type RobotBounds = Bounds<Grid>;

impl<TSpace> Bounds<TSpace> {
    #[inline]
    pub fn new(min: Coord<TSpace>, max: Coord<TSpace>) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_xyxy(min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> Self {
        Self::new(Coord::new(min_x, min_y), Coord::new(max_x, max_y))
    }

    /// Smallest box containing every point, or `None` for no points.
    pub fn enclosing(points: impl IntoIterator<Item = Coord<TSpace>>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Self::new(p, p),
                Some(b) => b.union(&Self::new(p, p)),
            })
        })
    }

    /// Returns true if min <= max on both axes.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    /// Number of cells covered horizontally.
    #[inline]
    pub fn width(&self) -> i64 {
        self.max.x - self.min.x + 1
    }

    /// Number of cells covered vertically.
    #[inline]
    pub fn height(&self) -> i64 {
        self.max.y - self.min.y + 1
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::from_xyxy(
            self.min.x.min(other.min.x),
            self.min.y.min(other.min.y),
            self.max.x.max(other.max.x),
            self.max.y.max(other.max.y),
        )
    }

    /// Grows the box by `margin` cells on every side, saturating at the
    /// `i64` range.
    pub fn expanded(&self, margin: i64) -> Self {
        Self::from_xyxy(
            self.min.x.saturating_sub(margin),
            self.min.y.saturating_sub(margin),
            self.max.x.saturating_add(margin),
            self.max.y.saturating_add(margin),
        )
    }

    /// Returns true if the two boxes share at least one cell.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.max.x >= other.min.x
            && self.min.x <= other.max.x
            && self.max.y >= other.min.y
            && self.min.y <= other.max.y
    }
}

impl<TSpace> std::fmt::Debug for Bounds<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bounds")
            .field("min_x", &self.min.x)
            .field("min_y", &self.min.y)
            .field("max_x", &self.max.x)
            .field("max_y", &self.max.y)
            .finish()
    }
}

// Custom serde implementation to avoid TSpace: Serialize/Deserialize bounds
impl<TSpace> Serialize for Bounds<TSpace> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Bounds", 4)?;
        state.serialize_field("minX", &self.min.x)?;
        state.serialize_field("minY", &self.min.y)?;
        state.serialize_field("maxX", &self.max.x)?;
        state.serialize_field("maxY", &self.max.y)?;
        state.end()
    }
}

impl<'de, TSpace> Deserialize<'de> for Bounds<TSpace> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct BoundsData {
            min_x: i64,
            min_y: i64,
            max_x: i64,
            max_y: i64,
        }
        let data = BoundsData::deserialize(deserializer)?;
        Ok(Bounds::from_xyxy(
            data.min_x, data.min_y, data.max_x, data.max_y,
        ))
    }
}
