//! Segment (room) coloring.
//!
//! Rooms are colored so that neighbours differ: an adjacency graph is
//! built from expanded bounding boxes and colored greedily, highest degree
//! first (Welsh-Powell). The palette is cycled when more colors are needed
//! than it holds. When some segment has no usable geometry, every segment
//! instead gets a deterministic hue from its position in id order.

use std::collections::{BTreeMap, BTreeSet};

use image::Rgba;

use crate::map::{Bounds, Grid, Layer, SegmentId};

/// Segment id to fill color.
pub type SegmentColors = BTreeMap<SegmentId, Rgba<u8>>;

/// Undirected adjacency between segments, keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdjacencyGraph {
    edges: BTreeMap<SegmentId, BTreeSet<SegmentId>>,
}

impl AdjacencyGraph {
    /// Builds the graph over `segments`. Two segments are adjacent when
    /// their boxes overlap after growing each by `threshold` cells.
    pub fn from_bounds(segments: &[(SegmentId, Bounds<Grid>)], threshold: i64) -> Self {
        let mut graph = Self::default();
        for (id, _) in segments {
            graph.add_vertex(id.clone());
        }
        for (i, (a_id, a)) in segments.iter().enumerate() {
            let a = a.expanded(threshold);
            for (b_id, b) in &segments[i + 1..] {
                if a_id != b_id && a.overlaps(&b.expanded(threshold)) {
                    graph.add_edge(a_id, b_id);
                }
            }
        }
        graph
    }

    pub fn add_vertex(&mut self, id: SegmentId) {
        self.edges.entry(id).or_default();
    }

    pub fn add_edge(&mut self, a: &SegmentId, b: &SegmentId) {
        self.edges.entry(a.clone()).or_default().insert(b.clone());
        self.edges.entry(b.clone()).or_default().insert(a.clone());
    }

    pub fn neighbours(&self, id: &SegmentId) -> impl Iterator<Item = &SegmentId> {
        self.edges.get(id).into_iter().flatten()
    }

    pub fn degree(&self, id: &SegmentId) -> usize {
        self.edges.get(id).map_or(0, BTreeSet::len)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &SegmentId> {
        self.edges.keys()
    }

    /// Greedy coloring: vertices in order of decreasing degree (ties by
    /// ascending id) each take the smallest color index unused by an
    /// already colored neighbour.
    pub fn greedy_coloring(&self) -> BTreeMap<SegmentId, usize> {
        let mut order: Vec<&SegmentId> = self.vertices().collect();
        order.sort_by(|a, b| self.degree(b).cmp(&self.degree(a)).then_with(|| a.cmp(b)));

        let mut colors: BTreeMap<SegmentId, usize> = BTreeMap::new();
        for id in order {
            let taken: BTreeSet<usize> = self
                .neighbours(id)
                .filter_map(|n| colors.get(n).copied())
                .collect();
            let color = (0..).find(|c| !taken.contains(c)).unwrap_or(0);
            colors.insert(id.clone(), color);
        }
        colors
    }
}

/// Assigns a fill color to every segment layer with an id.
///
/// `threshold` is the adjacency margin in grid cells. `palette` must not be
/// empty.
pub fn assign_colors(segments: &[&Layer], threshold: i64, palette: &[Rgba<u8>]) -> SegmentColors {
    let mut with_id: Vec<(SegmentId, Option<Bounds<Grid>>)> = segments
        .iter()
        .filter_map(|layer| layer.segment_id().map(|id| (id.clone(), layer.bounds())))
        .collect();
    if with_id.is_empty() || palette.is_empty() {
        return SegmentColors::new();
    }
    with_id.sort_by(|a, b| a.0.cmp(&b.0));

    let geometry: Option<Vec<(SegmentId, Bounds<Grid>)>> = with_id
        .iter()
        .map(|(id, bounds)| bounds.map(|b| (id.clone(), b)))
        .collect();

    match geometry {
        Some(geometry) => AdjacencyGraph::from_bounds(&geometry, threshold)
            .greedy_coloring()
            .into_iter()
            .map(|(id, index)| (id, palette[index % palette.len()]))
            .collect(),
        None => {
            let count = with_id.len();
            with_id
                .into_iter()
                .enumerate()
                .map(|(i, (id, _))| (id, hue_spread_color(i, count)))
                .collect()
        }
    }
}

/// Light pastel color for position `index` of `count`, with hue kept
/// between 60° and 180° to stay clear of the floor blue and no-go red.
pub fn hue_spread_color(index: usize, count: usize) -> Rgba<u8> {
    use std::f64::consts::PI;

    let fraction = if count == 0 {
        0.0
    } else {
        index as f64 / count as f64
    };
    let mut hue = (fraction * 120.0 + 60.0).to_radians();

    let (r, g, b) = if hue < 2.0 * PI / 3.0 {
        (
            (0.70 * (1.0 - hue.cos() / 2.0)).max(0.6),
            (0.70 * (1.0 + hue.cos() / 2.0)).max(0.6),
            (0.70 * (1.0 - hue.sin() / 2.0)).max(0.6),
        )
    } else {
        hue -= 2.0 * PI / 3.0;
        (
            (0.70 * (1.0 - hue.sin() / 2.0)).max(0.6),
            (0.70 * (1.0 - hue.cos() / 2.0)).max(0.6),
            (0.70 * (1.0 + hue.cos() / 2.0)).max(0.6),
        )
    };
    Rgba([(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8, 255])
}
