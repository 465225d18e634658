//! Terrain-weighted traversal along a ray.
//!
//! Given a heading, a caller-supplied distance estimate and a travel budget,
//! walk the ray across terrain patches and report how far the traveller
//! actually gets. Each stretch of length `L` on terrain with speed `v`
//! consumes `L / v` budget; terrain outside the allowed set stops travel at
//! its boundary.
//!
//! ```
//! use std::collections::BTreeSet;
//! use landfall_logic::geography::{MapBounds, Point};
//! use landfall_logic::geometry::Polygon;
//! use landfall_logic::traversal::{max_traversable_distance, TerrainCost, TerrainPatch, TraversalRequest};
//!
//! let map = MapBounds::new(100.0, 100.0);
//! let grass = TerrainPatch::new("grassland", 0, Polygon::rect(0.0, 0.0, 100.0, 100.0), TerrainCost::new(1.0, 1.0));
//! let allowed: BTreeSet<String> = ["grassland".to_string()].into();
//! let request = TraversalRequest {
//!     origin: Point::new(10.0, 10.0),
//!     direction: 0.0,
//!     estimated_distance: 5.0,
//!     budget: 10.0,
//!     allowed_terrain: &allowed,
//! };
//! assert!((max_traversable_distance(&map, &[grass], None, &request) - 5.0).abs() < 1e-9);
//! ```

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constants::DISTANCE_EPSILON;
use crate::geography::{MapBounds, Point, Segment};
use crate::geometry::Polygon;

/// Movement scalars of one cost layer on one terrain area.
///
/// `multiplier` is the terrain's base speed factor; `ease` is the
/// layer-specific modifier on top of it. Travel speed is their product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainCost {
    pub multiplier: f64,
    pub ease: f64,
}

impl Default for TerrainCost {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            ease: 1.0,
        }
    }
}

impl TerrainCost {
    pub const fn new(multiplier: f64, ease: f64) -> Self {
        Self { multiplier, ease }
    }

    pub fn speed(&self) -> f64 {
        self.multiplier * self.ease
    }
}

/// One terrain polygon as seen through a single cost layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainPatch {
    pub terrain_type: String,
    /// Higher priority wins where patches overlap.
    pub priority: i32,
    pub polygon: Polygon,
    pub cost: TerrainCost,
}

impl TerrainPatch {
    pub fn new(
        terrain_type: impl Into<String>,
        priority: i32,
        polygon: Polygon,
        cost: TerrainCost,
    ) -> Self {
        Self {
            terrain_type: terrain_type.into(),
            priority,
            polygon,
            cost,
        }
    }
}

/// Parameters for [`max_traversable_distance`].
#[derive(Debug, Clone, Copy)]
pub struct TraversalRequest<'a> {
    pub origin: Point,
    /// Heading in degrees, counter-clockwise from +x.
    pub direction: f64,
    /// Naive straight-line distance the caller wants to cover.
    pub estimated_distance: f64,
    pub budget: f64,
    pub allowed_terrain: &'a BTreeSet<String>,
}

/// Higher priority first; on equal priority the smaller (more specific) area.
fn compare_patches(a: &TerrainPatch, b: &TerrainPatch) -> Ordering {
    a.priority.cmp(&b.priority).then_with(|| {
        b.polygon
            .area()
            .partial_cmp(&a.polygon.area())
            .unwrap_or(Ordering::Equal)
    })
}

fn governing_index(patches: &[TerrainPatch], p: Point) -> Option<usize> {
    patches
        .iter()
        .enumerate()
        .filter(|(_, patch)| patch.polygon.contains(p))
        .max_by(|(_, a), (_, b)| compare_patches(a, b))
        .map(|(i, _)| i)
}

/// The patch that governs terrain at `p`, if any covers it.
pub fn governing_patch(patches: &[TerrainPatch], p: Point) -> Option<&TerrainPatch> {
    governing_index(patches, p).map(|i| &patches[i])
}

/// A piece of a segment governed by a single patch (or by none).
#[derive(Debug, Clone, Copy, PartialEq)]
struct Stretch {
    t0: f64,
    t1: f64,
    patch: Option<usize>,
}

/// Cut `segment` at every patch boundary and tag each piece with the patch
/// that governs its midpoint. Adjacent pieces under the same patch merge.
fn stretches(patches: &[TerrainPatch], segment: &Segment) -> Vec<Stretch> {
    let mut cuts = vec![0.0, 1.0];
    for patch in patches {
        cuts.extend(patch.polygon.segment_crossings(segment));
    }
    cuts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    cuts.dedup_by(|a, b| (*a - *b).abs() < DISTANCE_EPSILON);

    let mut result: Vec<Stretch> = Vec::new();
    for pair in cuts.windows(2) {
        let (t0, t1) = (pair[0], pair[1]);
        let patch = governing_index(patches, segment.point_at((t0 + t1) / 2.0));
        match result.last_mut() {
            Some(last) if last.patch == patch => last.t1 = t1,
            _ => result.push(Stretch { t0, t1, patch }),
        }
    }
    result
}

/// How far along `request.direction` the traveller gets, never more than
/// `request.estimated_distance`.
///
/// Ground covered by no patch costs `uncovered` (free travel when `None`)
/// and is always allowed. Returns 0 when the terrain at the origin is not
/// allowed.
pub fn max_traversable_distance(
    map: &MapBounds,
    patches: &[TerrainPatch],
    uncovered: Option<TerrainCost>,
    request: &TraversalRequest<'_>,
) -> f64 {
    if request.estimated_distance <= 0.0 {
        return 0.0;
    }

    let segments = map.split_ray(
        request.origin,
        request.direction,
        request.estimated_distance,
    );
    let mut covered = 0.0;
    let mut remaining = request.budget.max(0.0);

    for segment in &segments {
        let segment_length = segment.length();
        for stretch in stretches(patches, segment) {
            let length = segment_length * (stretch.t1 - stretch.t0);
            let cost = match stretch.patch {
                Some(i) => {
                    let patch = &patches[i];
                    if !request.allowed_terrain.contains(&patch.terrain_type) {
                        return covered;
                    }
                    patch.cost
                }
                None => match uncovered {
                    Some(cost) => cost,
                    None => {
                        covered += length;
                        continue;
                    }
                },
            };

            let speed = cost.speed();
            if speed <= 0.0 {
                return covered;
            }
            let needed = length / speed;
            if needed > remaining + DISTANCE_EPSILON {
                return covered + remaining * speed;
            }
            remaining -= needed;
            covered += length;
        }
    }

    covered.min(request.estimated_distance)
}
