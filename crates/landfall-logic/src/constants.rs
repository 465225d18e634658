//! World constants: map size, reachability policy, cost layers and tags.
//!
//! Plain constants with no ECS dependency. Both the simulation core and the
//! headless simtest use these.

/// Width of the world map. The x axis wraps around at this value.
pub const MAP_WIDTH: f64 = 6000.0;

/// Height of the world map. The y axis is mirrored (not wrapped) at 0 and here.
pub const MAP_HEIGHT: f64 = 3000.0;

/// A location is reachable or visible through at most this many limited
/// passages (doors). Applies to every range kind regardless of distance.
pub const MAX_DOORS_PASSED: u32 = 2;

/// Tolerance for distance comparisons along rays and segments.
pub const DISTANCE_EPSILON: f64 = 1e-6;

/// Minimum number of map-edge crossings a single ray may be split at; longer
/// rays get a bound derived from their extent.
pub const MAX_WRAP_SPLITS: usize = 8;

pub mod layers {
    /// Cost layer consulted for line-of-sight.
    pub const VISIBILITY: &str = "visibility";
    /// Cost layer consulted for travel on foot or by land vehicle.
    pub const LAND_TRAVERSABILITY: &str = "land_traversability";
    /// Cost layer consulted for travel by boat.
    pub const WATER_TRAVERSABILITY: &str = "water_traversability";
}

pub mod terrain_types {
    pub const GRASSLAND: &str = "grassland";
    pub const FOREST: &str = "forest";
    pub const DESERT: &str = "desert";
    pub const MOUNTAIN: &str = "mountain";
    pub const WATER: &str = "water";
    pub const ROAD: &str = "road";

    /// Terrain a walking character may enter.
    pub const WALKABLE: [&str; 5] = [GRASSLAND, FOREST, DESERT, MOUNTAIN, ROAD];
}

pub mod location_types {
    pub const OUTSIDE: &str = "outside";
    pub const BUILDING: &str = "building";
    pub const ROOM: &str = "room";
    pub const VEHICLE: &str = "vehicle";
}

pub mod capability_tags {
    /// Item usable as a tool; params map tool group to efficiency.
    pub const TOOL: &str = "tool";
    /// Entity usable as a machine; params list the machine groups it serves.
    pub const MACHINE: &str = "machine";
}
