//! Map document model for Valetudo map payloads.
//!
//! A document is parsed once per render into [`MapDocument`] and then
//! indexed by kind through [`MapIndex`]. Positions are tagged with the
//! space they live in: layer spans and dimensions are in [`Grid`] cells,
//! entity points are in [`Vacuum`] units (`grid * pixelSize`).
//!
//! # Example
//!
//! ```
//! use valetudo_render::map::{parse, LayerKind, MapIndex};
//!
//! let doc = parse(br#"{
//!     "pixelSize": 5,
//!     "layers": [{"type": "floor", "compressedPixels": [0, 0, 3]}],
//!     "entities": []
//! }"#)?;
//! let index = MapIndex::new(&doc);
//! assert_eq!(index.layers(&LayerKind::Floor).len(), 1);
//! # Ok::<(), valetudo_render::error::ParseError>(())
//! ```

mod bounds;
mod coord;
mod ids;
mod index;
mod model;
mod space;

pub use bounds::{Bounds, RobotBounds};
pub use coord::Coord;
pub use ids::SegmentId;
pub use index::MapIndex;
pub use model::{
    Dimension, Dimensions, DocumentMetaData, EntityKind, Layer, LayerKind, LayerMetaData,
    MapDocument, MapEntity, MapSize, Span,
};
pub use space::{Grid, Vacuum};

use crate::error::ParseError;

/// Parses canonical document bytes into a [`MapDocument`].
///
/// # Errors
/// Returns [`ParseError::InvalidDocument`] if the bytes are not a valid map
/// document or if its pixel size is not positive.
pub fn parse(bytes: &[u8]) -> Result<MapDocument, ParseError> {
    let document: MapDocument = serde_json::from_slice(bytes)?;
    if document.pixel_size <= 0 {
        return Err(ParseError::InvalidDocument(format!(
            "pixelSize must be positive, got {}",
            document.pixel_size
        )));
    }
    Ok(document)
}
