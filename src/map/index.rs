//! Kind-indexed lookup tables over a parsed document.

use std::collections::HashMap;

use super::model::{EntityKind, Layer, LayerKind, MapDocument, MapEntity};

/// Layers and entities grouped by kind, preserving source order within
/// each group.
///
/// Built once after parsing so that every render stage can fetch its group
/// without rescanning the whole document.
#[derive(Debug)]
pub struct MapIndex<'a> {
    layers: HashMap<LayerKind, Vec<&'a Layer>>,
    entities: HashMap<EntityKind, Vec<&'a MapEntity>>,
}

impl<'a> MapIndex<'a> {
    pub fn new(document: &'a MapDocument) -> Self {
        let mut layers: HashMap<LayerKind, Vec<&'a Layer>> = HashMap::new();
        for layer in &document.layers {
            layers.entry(layer.kind.clone()).or_default().push(layer);
        }

        let mut entities: HashMap<EntityKind, Vec<&'a MapEntity>> = HashMap::new();
        for entity in &document.entities {
            entities.entry(entity.kind()).or_default().push(entity);
        }

        Self { layers, entities }
    }

    /// All layers of `kind`, in document order.
    pub fn layers(&self, kind: &LayerKind) -> &[&'a Layer] {
        self.layers.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All entities of `kind`, in document order.
    pub fn entities(&self, kind: EntityKind) -> &[&'a MapEntity] {
        self.entities.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn segments(&self) -> &[&'a Layer] {
        self.layers(&LayerKind::Segment)
    }
}
