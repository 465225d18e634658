//! Range: "what and who is near" a subject.
//!
//! A [`Range`] is one reachability policy. Every variant answers the same
//! question, [`Range::locations_near`], from which items, characters and
//! root locations near a subject are derived by filtering contents.
//!
//! | Variant | Near means |
//! |---------|-----------|
//! | `SameLocation` | the subject's enclosing location |
//! | `Inside` | the subject and every location inside it |
//! | `Neighbouring` | door-budgeted BFS from the subject's location |
//! | `VisibilityBased` | BFS from the subject's root and from every root within plain map distance |
//! | `TraversabilityBased` | as above, but roots must be reachable across terrain within budget |

use std::collections::BTreeSet;

use hecs::Entity;
use serde::{Deserialize, Serialize};

use landfall_logic::constants::DISTANCE_EPSILON;
use landfall_logic::pathfinding::{self, visit_subgraph};
use landfall_logic::traversal::{max_traversable_distance, TraversalRequest};

use crate::components::{Character, Item};
use crate::world::WorldState;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Range {
    #[default]
    SameLocation,
    Inside,
    Neighbouring {
        only_through_unlimited: bool,
    },
    VisibilityBased {
        distance: f64,
        only_through_unlimited: bool,
    },
    TraversabilityBased {
        distance: f64,
        only_through_unlimited: bool,
        allowed_terrain: BTreeSet<String>,
    },
}

impl Range {
    /// Locations considered near `subject` under this policy.
    pub fn locations_near(&self, world: &WorldState, subject: Entity) -> BTreeSet<Entity> {
        if !world.exists(subject) {
            return BTreeSet::new();
        }
        match self {
            Range::SameLocation => world.location_of(subject).into_iter().collect(),
            Range::Inside => {
                let mut near: BTreeSet<Entity> = world
                    .contents_recursive(subject)
                    .into_iter()
                    .filter(|e| world.is_location(*e))
                    .collect();
                near.insert(subject);
                near
            }
            Range::Neighbouring {
                only_through_unlimited,
            } => match origin_location(world, subject) {
                Some(origin) => visit_subgraph(world, origin, *only_through_unlimited)
                    .into_iter()
                    .collect(),
                None => BTreeSet::new(),
            },
            Range::VisibilityBased {
                distance,
                only_through_unlimited,
            } => near_roots(world, subject, *only_through_unlimited, |world, from, to| {
                world.map().distance(from, to) <= *distance
            }),
            Range::TraversabilityBased {
                distance,
                only_through_unlimited,
                allowed_terrain,
            } => {
                let patches = world.terrain_patches(&world.config().traversability_layer);
                let uncovered = world.config().uncovered_terrain_cost;
                near_roots(world, subject, *only_through_unlimited, |world, from, to| {
                    let map = world.map();
                    let straight = map.distance(from, to);
                    if straight > *distance {
                        return false;
                    }
                    if straight < DISTANCE_EPSILON {
                        return true;
                    }
                    let request = TraversalRequest {
                        origin: from,
                        direction: map.bearing(from, to),
                        estimated_distance: straight,
                        budget: *distance,
                        allowed_terrain,
                    };
                    max_traversable_distance(map, &patches, uncovered, &request) + DISTANCE_EPSILON
                        >= straight
                })
            }
        }
    }

    /// Items lying directly in a near location (or, for `Inside`, directly
    /// inside the subject).
    pub fn items_near(&self, world: &WorldState, subject: Entity) -> BTreeSet<Entity> {
        world.contained_with::<Item>(&self.locations_near(world, subject))
    }

    pub fn characters_near(&self, world: &WorldState, subject: Entity) -> BTreeSet<Entity> {
        world.contained_with::<Character>(&self.locations_near(world, subject))
    }

    pub fn root_locations_near(&self, world: &WorldState, subject: Entity) -> BTreeSet<Entity> {
        self.locations_near(world, subject)
            .into_iter()
            .filter(|e| world.is_root(*e))
            .collect()
    }

    /// Whether `b` is near `a`: `b`, or one of its containers up to and
    /// including its location, is among `a`'s near locations.
    ///
    /// Not symmetric for `Inside`: a bag's contents are near the bag, the
    /// bag is not near its contents.
    pub fn is_near(&self, world: &WorldState, a: Entity, b: Entity) -> bool {
        let near = self.locations_near(world, a);
        if near.contains(&b) {
            return true;
        }
        for container in world.ancestors(b) {
            if near.contains(&container) {
                return true;
            }
            if world.is_location(container) {
                break;
            }
        }
        false
    }

    /// Fewest-hops location path between two locations through open
    /// passages, both ends included.
    pub fn shortest_path(world: &WorldState, from: Entity, to: Entity) -> Option<Vec<Entity>> {
        pathfinding::shortest_path(world, from, to)
    }
}

/// The location a graph search starts from: the subject's enclosing
/// location, or the subject itself when it is a location with no parent.
fn origin_location(world: &WorldState, subject: Entity) -> Option<Entity> {
    world
        .location_of(subject)
        .or_else(|| world.is_location(subject).then_some(subject))
}

/// Union of BFS subgraphs from the subject's root and from every other root
/// accepted by `reachable`.
fn near_roots<F>(world: &WorldState, subject: Entity, only_through_unlimited: bool, reachable: F) -> BTreeSet<Entity>
where
    F: Fn(&WorldState, landfall_logic::geography::Point, landfall_logic::geography::Point) -> bool,
{
    let Some(root) = world.root_of(subject) else {
        return BTreeSet::new();
    };
    let Some(origin) = world.root_position(root) else {
        return BTreeSet::new();
    };

    let mut near: BTreeSet<Entity> = visit_subgraph(world, root, only_through_unlimited)
        .into_iter()
        .collect();
    for (other, position) in world.roots() {
        if other == root || near.contains(&other) {
            continue;
        }
        if reachable(world, origin, position) {
            near.extend(visit_subgraph(world, other, only_through_unlimited));
        }
    }
    near
}
