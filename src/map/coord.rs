//! Integer coordinates tagged with their unit space.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

use super::space::{Grid, Vacuum};

/// A 2D integer coordinate with a type-level marker for its space.
pub struct Coord<TSpace> {
    pub x: i64,
    pub y: i64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> Coord<TSpace> {
    #[inline]
    pub fn new(x: i64, y: i64) -> Self {
        Self {
            x,
            y,
            _space: PhantomData,
        }
    }
}

impl Coord<Vacuum> {
    /// Converts to grid cells by truncating division by `pixel_size`.
    ///
    /// `pixel_size` must be positive; documents with a non-positive pixel
    /// size are rejected at parse time.
    #[inline]
    pub fn to_grid(self, pixel_size: i64) -> Coord<Grid> {
        Coord::new(self.x / pixel_size, self.y / pixel_size)
    }
}

impl Coord<Grid> {
    /// Scales up to vacuum units, or `None` when that leaves the `i64`
    /// range.
    #[inline]
    pub fn to_vacuum(self, pixel_size: i64) -> Option<Coord<Vacuum>> {
        Some(Coord::new(
            self.x.checked_mul(pixel_size)?,
            self.y.checked_mul(pixel_size)?,
        ))
    }
}

// Manual impls so the marker type needs no bounds of its own.
impl<TSpace> Clone for Coord<TSpace> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<TSpace> Copy for Coord<TSpace> {}

impl<TSpace> PartialEq for Coord<TSpace> {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl<TSpace> Eq for Coord<TSpace> {}

impl<TSpace> std::hash::Hash for Coord<TSpace> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::hash::Hash::hash(&self.x, state);
        std::hash::Hash::hash(&self.y, state);
    }
}

impl<TSpace> std::fmt::Debug for Coord<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coord")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

impl<TSpace> Default for Coord<TSpace> {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

// Custom serde implementation to avoid TSpace: Serialize/Deserialize bounds
impl<TSpace> Serialize for Coord<TSpace> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Coord", 2)?;
        state.serialize_field("x", &self.x)?;
        state.serialize_field("y", &self.y)?;
        state.end()
    }
}

impl<'de, TSpace> Deserialize<'de> for Coord<TSpace> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct CoordData {
            x: i64,
            y: i64,
        }
        let data = CoordData::deserialize(deserializer)?;
        Ok(Coord::new(data.x, data.y))
    }
}
