//! Coordinate space marker types.
//!
//! Zero-sized types used as type parameters so that map-grid positions and
//! vacuum positions cannot be mixed at compile time.

use std::fmt;

/// Marker for the map grid: the integer cells that layer spans and
/// dimensions are expressed in.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grid {}

/// Marker for vacuum units: grid cells multiplied by the document's
/// `pixelSize`. Entity points are expressed in this space.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vacuum {}

impl fmt::Debug for Grid {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Vacuum {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
