//! Map document model.
//!
//! This is the typed form of the `ValetudoMap` JSON document. Layers keep
//! their run-length encoded pixels; entities are converted into a closed
//! sum type at parse time so that every drawable kind carries exactly the
//! geometry it needs.

use serde::Deserialize;

use super::bounds::Bounds;
use super::coord::Coord;
use super::ids::SegmentId;
use super::space::{Grid, Vacuum};

/// A parsed map document.
///
/// Unknown fields are ignored. `pixelSize`, `layers` and `entities` are
/// required.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDocument {
    /// Vacuum units per grid cell.
    pub pixel_size: i64,

    /// Area layers (floor, wall, segments).
    pub layers: Vec<Layer>,

    /// Point, line and area markers.
    pub entities: Vec<MapEntity>,

    /// Optional overall map size in vacuum units.
    #[serde(default)]
    pub size: Option<MapSize>,

    #[serde(default)]
    pub meta_data: DocumentMetaData,
}

/// Map size as reported by the robot.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct MapSize {
    pub x: i64,
    pub y: i64,
}

/// Document level metadata.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetaData {
    #[serde(default)]
    pub version: Option<i64>,

    #[serde(default)]
    pub nonce: Option<String>,

    #[serde(default)]
    pub total_layer_area: Option<i64>,
}

/// The kind of an area layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Floor,
    Wall,
    Segment,
    Other(String),
}

impl LayerKind {
    pub fn name(&self) -> &str {
        match self {
            LayerKind::Floor => "floor",
            LayerKind::Wall => "wall",
            LayerKind::Segment => "segment",
            LayerKind::Other(name) => name,
        }
    }
}

impl From<String> for LayerKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "floor" => LayerKind::Floor,
            "wall" => LayerKind::Wall,
            "segment" => LayerKind::Segment,
            _ => LayerKind::Other(name),
        }
    }
}

impl<'de> Deserialize<'de> for LayerKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(LayerKind::from)
    }
}

/// An area layer described by run-length encoded pixel spans.
#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "LayerData")]
pub struct Layer {
    pub kind: LayerKind,
    pub meta_data: LayerMetaData,
    pub dimensions: Option<Dimensions>,
    pub spans: Vec<Span>,
}

impl Layer {
    /// The segment id for segment layers.
    pub fn segment_id(&self) -> Option<&SegmentId> {
        self.meta_data.segment_id.as_ref()
    }

    /// Bounding box in grid cells.
    ///
    /// Uses the reported dimensions when present, otherwise derives the
    /// box from the spans. Returns `None` for a layer with neither.
    pub fn bounds(&self) -> Option<Bounds<Grid>> {
        if let Some(dim) = &self.dimensions {
            return Some(Bounds::from_xyxy(dim.x.min, dim.y.min, dim.x.max, dim.y.max));
        }
        Bounds::enclosing(
            self.spans
                .iter()
                .filter(|span| span.run > 0)
                .flat_map(|span| [span.start, span.last()]),
        )
    }
}

/// Segment metadata carried by layers.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerMetaData {
    #[serde(default, deserialize_with = "de_segment_id")]
    pub segment_id: Option<SegmentId>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub active: Option<bool>,

    #[serde(default)]
    pub area: Option<i64>,
}

/// Per-axis statistics of a layer.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    pub x: Dimension,
    pub y: Dimension,
    #[serde(default)]
    pub pixel_count: i64,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Dimension {
    pub min: i64,
    pub max: i64,
    #[serde(default)]
    pub mid: i64,
    #[serde(default)]
    pub avg: i64,
}

/// `run` consecutive cells starting at `start`, along +x.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: Coord<Grid>,
    pub run: u32,
}

impl Span {
    pub fn new(x: i64, y: i64, run: u32) -> Self {
        Self {
            start: Coord::new(x, y),
            run,
        }
    }

    /// Last cell covered by the span. Equal to `start` for empty spans,
    /// saturating at `i64::MAX`.
    pub fn last(&self) -> Coord<Grid> {
        Coord::new(
            self.start.x.saturating_add(i64::from(self.run.max(1)) - 1),
            self.start.y,
        )
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayerData {
    #[serde(rename = "type")]
    kind: LayerKind,
    #[serde(default)]
    meta_data: LayerMetaData,
    #[serde(default)]
    dimensions: Option<Dimensions>,
    #[serde(default)]
    compressed_pixels: Option<Vec<i64>>,
    /// Legacy uncompressed `[x, y, x, y, ...]` pixel list.
    #[serde(default)]
    pixels: Option<Vec<i64>>,
}

impl TryFrom<LayerData> for Layer {
    type Error = String;

    fn try_from(data: LayerData) -> Result<Self, Self::Error> {
        let spans = match (data.compressed_pixels, data.pixels) {
            (Some(compressed), _) => decode_compressed(&compressed)?,
            (None, Some(pixels)) => decode_pixels(&pixels)?,
            (None, None) => Vec::new(),
        };
        Ok(Layer {
            kind: data.kind,
            meta_data: data.meta_data,
            dimensions: data.dimensions,
            spans,
        })
    }
}

fn decode_compressed(values: &[i64]) -> Result<Vec<Span>, String> {
    if values.len() % 3 != 0 {
        return Err(format!(
            "compressedPixels has {} values, expected a multiple of 3",
            values.len()
        ));
    }
    values
        .chunks_exact(3)
        .map(|triplet| {
            let run = u32::try_from(triplet[2])
                .map_err(|_| format!("invalid compressed pixel run length {}", triplet[2]))?;
            Ok(Span::new(triplet[0], triplet[1], run))
        })
        .collect()
}

fn decode_pixels(values: &[i64]) -> Result<Vec<Span>, String> {
    if values.len() % 2 != 0 {
        return Err(format!(
            "pixels has {} values, expected a multiple of 2",
            values.len()
        ));
    }
    Ok(values
        .chunks_exact(2)
        .map(|pair| Span::new(pair[0], pair[1], 1))
        .collect())
}

fn de_segment_id<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<SegmentId>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }
    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(s) => SegmentId::new(s),
        RawId::Number(n) => SegmentId::new(n.to_string()),
    }))
}

/// Kind tag of an entity, used for grouping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Path,
    VirtualWall,
    NoGoArea,
    ChargerLocation,
    RobotPosition,
    Other,
}

/// A map entity, typed by kind.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "EntityData")]
pub enum MapEntity {
    /// Polyline through every point.
    Path(Vec<Coord<Vacuum>>),

    /// Line segment between two points.
    VirtualWall {
        start: Coord<Vacuum>,
        end: Coord<Vacuum>,
    },

    /// Rectangle normalized so that min <= max.
    NoGoArea(Bounds<Vacuum>),

    ChargerLocation(Coord<Vacuum>),

    /// Robot position with its heading in degrees.
    RobotPosition { position: Coord<Vacuum>, angle: f64 },

    /// A kind that is parsed but not drawn (`no_mop_area`, `obstacle`, ...).
    Other { kind: String },
}

impl MapEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            MapEntity::Path(_) => EntityKind::Path,
            MapEntity::VirtualWall { .. } => EntityKind::VirtualWall,
            MapEntity::NoGoArea(_) => EntityKind::NoGoArea,
            MapEntity::ChargerLocation(_) => EntityKind::ChargerLocation,
            MapEntity::RobotPosition { .. } => EntityKind::RobotPosition,
            MapEntity::Other { .. } => EntityKind::Other,
        }
    }

    /// The wire name of the entity type.
    pub fn type_name(&self) -> &str {
        match self {
            MapEntity::Path(_) => "path",
            MapEntity::VirtualWall { .. } => "virtual_wall",
            MapEntity::NoGoArea(_) => "no_go_area",
            MapEntity::ChargerLocation(_) => "charger_location",
            MapEntity::RobotPosition { .. } => "robot_position",
            MapEntity::Other { kind } => kind,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityData {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    points: Vec<i64>,
    #[serde(default)]
    meta_data: EntityMetaData,
}

#[derive(Default, Deserialize)]
struct EntityMetaData {
    #[serde(default)]
    angle: Option<f64>,
}

impl TryFrom<EntityData> for MapEntity {
    type Error = String;

    fn try_from(data: EntityData) -> Result<Self, Self::Error> {
        if data.points.len() % 2 != 0 {
            return Err(format!(
                "{} entity has {} point values, expected pairs",
                data.kind,
                data.points.len()
            ));
        }
        let points: Vec<Coord<Vacuum>> = data
            .points
            .chunks_exact(2)
            .map(|pair| Coord::new(pair[0], pair[1]))
            .collect();
        let require = |n: usize| {
            if points.len() < n {
                Err(format!(
                    "{} entity has {} point(s), expected at least {}",
                    data.kind,
                    points.len(),
                    n
                ))
            } else {
                Ok(())
            }
        };

        let entity = match data.kind.as_str() {
            "path" => MapEntity::Path(points),
            "virtual_wall" => {
                require(2)?;
                MapEntity::VirtualWall {
                    start: points[0],
                    end: points[1],
                }
            }
            "no_go_area" => {
                require(2)?;
                // Corners arrive as a closed polygon; its extent is the area.
                match Bounds::enclosing(points.iter().copied()) {
                    Some(area) => MapEntity::NoGoArea(area),
                    None => return Err("no_go_area entity has no points".to_string()),
                }
            }
            "charger_location" => {
                require(1)?;
                MapEntity::ChargerLocation(points[0])
            }
            "robot_position" => {
                require(1)?;
                MapEntity::RobotPosition {
                    position: points[0],
                    angle: data.meta_data.angle.unwrap_or(0.0),
                }
            }
            _ => MapEntity::Other { kind: data.kind },
        };
        Ok(entity)
    }
}
