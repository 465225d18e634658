//! Settlement generation - hamlets of connected root locations with
//! buildings, rooms, terrain and a few people.

use hecs::Entity;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use landfall_logic::constants::{layers, location_types, terrain_types};
use landfall_logic::geography::Point;
use landfall_logic::geometry::Polygon;
use landfall_logic::pathfinding::TraversalClass;
use landfall_logic::traversal::TerrainCost;

use crate::components::{Item, MachineCapability, TerrainArea, ToolCapability};
use crate::error::WorldError;
use crate::world::WorldState;

use super::names::{generate_name, generate_place_name};

/// Configuration for settlement generation
#[derive(Debug, Clone)]
pub struct SettlementConfig {
    pub seed: u64,
    pub hamlets: usize,
    /// Root locations per hamlet, strung along the x axis.
    pub roots_per_hamlet: usize,
    pub buildings_per_root: usize,
    pub rooms_per_building: usize,
    pub characters_per_root: usize,
    /// Map distance between neighbouring roots of a hamlet.
    pub root_spacing: f64,
    /// Chance that a generated door starts closed.
    pub closed_door_chance: f64,
    pub forest_patches: usize,
    pub water_patches: usize,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            seed: 0x1a4d_fa11,
            hamlets: 3,
            roots_per_hamlet: 3,
            buildings_per_root: 2,
            rooms_per_building: 2,
            characters_per_root: 2,
            root_spacing: 20.0,
            closed_door_chance: 0.25,
            forest_patches: 4,
            water_patches: 2,
        }
    }
}

/// Handles to everything generated, grouped by role.
#[derive(Debug, Clone, Default)]
pub struct Settlement {
    pub roots: Vec<Entity>,
    pub buildings: Vec<Entity>,
    pub rooms: Vec<Entity>,
    pub doors: Vec<Entity>,
    pub characters: Vec<Entity>,
    pub workbenches: Vec<Entity>,
    pub tools: Vec<Entity>,
}

/// Populate `world` according to `config`. Same seed, same world.
pub fn generate_settlement(world: &mut WorldState, config: &SettlementConfig) -> Result<Settlement, WorldError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut settlement = Settlement::default();

    generate_terrain(world, config, &mut rng);

    let map = *world.map();
    for _ in 0..config.hamlets {
        let origin = Point::new(rng.gen_range(0.0..map.width), rng.gen_range(0.0..map.height));
        let mut previous: Option<Entity> = None;

        for i in 0..config.roots_per_hamlet {
            let position = origin.offset(i as f64 * config.root_spacing, rng.gen_range(-2.0..2.0));
            let root = world.spawn_root_location(location_types::OUTSIDE, &generate_place_name(&mut rng), position)?;
            if let Some(prev) = previous {
                world.connect(prev, root, TraversalClass::Unlimited, true)?;
            }
            previous = Some(root);
            settlement.roots.push(root);

            for b in 0..config.buildings_per_root {
                let building = world.spawn_location(location_types::BUILDING, &format!("house {}", b + 1), root)?;
                settlement.doors.push(door(world, &mut rng, config, root, building)?);
                settlement.buildings.push(building);

                for r in 0..config.rooms_per_building {
                    let room = world.spawn_location(location_types::ROOM, &format!("room {}", r + 1), building)?;
                    settlement.doors.push(door(world, &mut rng, config, building, room)?);
                    settlement.rooms.push(room);
                }

                if b == 0 {
                    let bench = world.spawn_item(Item::new("workbench", 1.0, 1), building)?;
                    world.add_capability(bench, "machine", MachineCapability::params(&["workbench"]))?;
                    settlement.workbenches.push(bench);
                }
            }

            for _ in 0..config.characters_per_root {
                let character = world.spawn_character(&generate_name(&mut rng), root)?;
                world.set_skill(character, "carpentry", rng.gen_range(0..4))?;
                if rng.gen_bool(0.5) {
                    let saw = world.spawn_item(Item::new("saw", rng.gen_range(0.5..1.0), 1), character)?;
                    let efficiency = rng.gen_range(1.0..1.5);
                    world.add_capability(saw, "tool", ToolCapability::params(&[("woodworking", efficiency)]))?;
                    settlement.tools.push(saw);
                }
                settlement.characters.push(character);
            }
        }
    }

    info!(
        "generated settlement: {} roots, {} buildings, {} rooms, {} characters",
        settlement.roots.len(),
        settlement.buildings.len(),
        settlement.rooms.len(),
        settlement.characters.len()
    );
    Ok(settlement)
}

fn door(
    world: &mut WorldState,
    rng: &mut StdRng,
    config: &SettlementConfig,
    outer: Entity,
    inner: Entity,
) -> Result<Entity, WorldError> {
    let open = !rng.gen_bool(config.closed_door_chance.clamp(0.0, 1.0));
    world.connect(outer, inner, TraversalClass::Limited, open)
}

/// A grassland base covering the map, with forest and water patches on top.
fn generate_terrain(world: &mut WorldState, config: &SettlementConfig, rng: &mut StdRng) {
    let map = *world.map();
    world.add_terrain(
        TerrainArea::new(terrain_types::GRASSLAND, 0, Polygon::rect(0.0, 0.0, map.width, map.height))
            .with_layer(layers::LAND_TRAVERSABILITY, TerrainCost::new(1.0, 1.0))
            .with_layer(layers::VISIBILITY, TerrainCost::new(1.0, 1.0)),
    );

    let mut patch = |terrain_type: &str, priority: i32, land: TerrainCost, sight: TerrainCost| {
        let width = rng.gen_range(10.0..60.0_f64).min(map.width);
        let height = rng.gen_range(10.0..60.0_f64).min(map.height);
        let x = rng.gen_range(0.0..(map.width - width).max(f64::EPSILON));
        let y = rng.gen_range(0.0..(map.height - height).max(f64::EPSILON));
        world.add_terrain(
            TerrainArea::new(terrain_type, priority, Polygon::rect(x, y, width, height))
                .with_layer(layers::LAND_TRAVERSABILITY, land)
                .with_layer(layers::VISIBILITY, sight),
        );
    };
    for _ in 0..config.forest_patches {
        patch(terrain_types::FOREST, 1, TerrainCost::new(0.5, 1.0), TerrainCost::new(0.3, 1.0));
    }
    for _ in 0..config.water_patches {
        patch(terrain_types::WATER, 2, TerrainCost::new(1.0, 1.0), TerrainCost::new(1.0, 1.0));
    }
}
