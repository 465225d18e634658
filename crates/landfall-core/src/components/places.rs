//! World graph components: locations, root locations, passages, terrain.

use std::collections::BTreeMap;

use hecs::Entity;
use serde::{Deserialize, Serialize};

use landfall_logic::geography::Point;
use landfall_logic::geometry::Polygon;
use landfall_logic::pathfinding::TraversalClass;
use landfall_logic::traversal::{TerrainCost, TerrainPatch};

/// A node in the world graph that can contain entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub location_type: String,
    /// Non-negative.
    pub weight: f64,
}

impl Location {
    pub fn new(location_type: impl Into<String>) -> Self {
        Self {
            location_type: location_type.into(),
            weight: 0.0,
        }
    }
}

/// A parentless location placed on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootLocation {
    /// Always normalized onto the map.
    pub position: Point,
    pub mobile: bool,
    /// Heading in degrees when mobile.
    pub heading: Option<f64>,
    /// Survives being emptied of contents.
    pub persistent: bool,
}

impl RootLocation {
    pub fn fixed(position: Point) -> Self {
        Self {
            position,
            mobile: false,
            heading: None,
            persistent: true,
        }
    }
}

/// Edge between two distinct locations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    #[serde(with = "crate::serde_helpers::entity")]
    pub a: Entity,
    #[serde(with = "crate::serde_helpers::entity")]
    pub b: Entity,
    pub open: bool,
    pub class: TraversalClass,
}

impl Passage {
    /// The end opposite `location`, if `location` is an end at all.
    pub fn other_end(&self, location: Entity) -> Option<Entity> {
        if self.a == location {
            Some(self.b)
        } else if self.b == location {
            Some(self.a)
        } else {
            None
        }
    }

    pub fn connects(&self, location: Entity) -> bool {
        self.a == location || self.b == location
    }
}

/// Terrain polygon with per-layer movement costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainArea {
    pub terrain_type: String,
    /// Higher wins where areas overlap.
    pub priority: i32,
    pub polygon: Polygon,
    /// Cost layer name → scalars. Layers an area does not list cost (1, 1).
    pub layers: BTreeMap<String, TerrainCost>,
}

impl TerrainArea {
    pub fn new(terrain_type: impl Into<String>, priority: i32, polygon: Polygon) -> Self {
        Self {
            terrain_type: terrain_type.into(),
            priority,
            polygon,
            layers: BTreeMap::new(),
        }
    }

    pub fn with_layer(mut self, layer: &str, cost: TerrainCost) -> Self {
        self.layers.insert(layer.to_string(), cost);
        self
    }

    pub fn cost(&self, layer: &str) -> TerrainCost {
        self.layers.get(layer).copied().unwrap_or_default()
    }

    /// This area as seen through one cost layer.
    pub fn patch(&self, layer: &str) -> TerrainPatch {
        TerrainPatch::new(
            self.terrain_type.clone(),
            self.priority,
            self.polygon.clone(),
            self.cost(layer),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_end() {
        let mut world = hecs::World::new();
        let (a, b, c) = (world.spawn(()), world.spawn(()), world.spawn(()));
        let passage = Passage {
            a,
            b,
            open: true,
            class: TraversalClass::Limited,
        };
        assert_eq!(passage.other_end(a), Some(b));
        assert_eq!(passage.other_end(b), Some(a));
        assert_eq!(passage.other_end(c), None);
        assert!(passage.connects(b));
    }

    #[test]
    fn test_missing_layer_costs_unit() {
        let forest = TerrainArea::new("forest", 1, Polygon::rect(0.0, 0.0, 1.0, 1.0))
            .with_layer("land_traversability", TerrainCost::new(0.5, 1.0));
        assert_eq!(forest.cost("land_traversability").speed(), 0.5);
        assert_eq!(forest.cost("visibility"), TerrainCost::default());
        assert_eq!(forest.patch("visibility").terrain_type, "forest");
    }
}
