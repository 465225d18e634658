//! World snapshots: save a running simulation and resume it later.
//!
//! Uses bincode for the whole snapshot. Components are serialized per entity
//! as optionals and re-attached on load. Entity handles are kept (via
//! `spawn_at`) so that containment, passages and work assignments still point
//! at the right entities afterwards.

use std::io::{Read, Write};

use hecs::{Entity, World};
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::*;
use crate::config::WorldConfig;
use crate::notifications::NotificationLog;
use crate::serde_helpers::{entity_bits, entity_from_bits};
use crate::systems::EventLog;
use crate::world::WorldState;

/// Bumped whenever the snapshot layout changes.
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("invalid entity handle {0:#x} in save")]
    BadEntity(u64),
}

/// Everything needed to resume: world, logs and tick counter.
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub tick: u64,
    pub config: WorldConfig,
    pub events: EventLog,
    pub notifications: NotificationLog,
    pub entities: Vec<SerializableEntity>,
}

/// One entity and whichever components it carries.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SerializableEntity {
    pub id: u64,
    pub name: Option<Name>,
    pub contained_in: Option<ContainedIn>,

    // Places
    pub location: Option<Location>,
    pub root: Option<RootLocation>,
    pub passage: Option<Passage>,
    pub terrain: Option<TerrainArea>,

    // People and things
    pub character: Option<Character>,
    pub item: Option<Item>,
    pub skills: Option<Skills>,
    pub works_on: Option<WorksOn>,
    pub capabilities: Option<Capabilities>,

    pub activity: Option<Activity>,
}

fn cloned<T: hecs::Component + Clone>(world: &World, entity: Entity) -> Option<T> {
    world.get::<&T>(entity).ok().map(|c| (*c).clone())
}

/// Snapshot every live entity, in handle order.
fn serialize_entities(world: &World) -> Vec<SerializableEntity> {
    let mut handles: Vec<Entity> = world.iter().map(|e| e.entity()).collect();
    handles.sort();

    handles
        .into_iter()
        .map(|e| SerializableEntity {
            id: entity_bits(e),
            name: cloned(world, e),
            contained_in: cloned(world, e),
            location: cloned(world, e),
            root: cloned(world, e),
            passage: cloned(world, e),
            terrain: cloned(world, e),
            character: cloned(world, e),
            item: cloned(world, e),
            skills: cloned(world, e),
            works_on: cloned(world, e),
            capabilities: cloned(world, e),
            activity: cloned(world, e),
        })
        .collect()
}

fn insert<T: hecs::Component>(world: &mut World, entity: Entity, component: Option<T>) {
    if let Some(c) = component {
        // just spawned, so the entity exists
        let _ = world.insert_one(entity, c);
    }
}

/// Rebuild a world from serialized entities, keeping their handles.
fn deserialize_entities(entities: Vec<SerializableEntity>) -> Result<World, SaveError> {
    let mut world = World::new();
    for se in entities {
        let entity = entity_from_bits(se.id).ok_or(SaveError::BadEntity(se.id))?;
        world.spawn_at(entity, ());
        insert(&mut world, entity, se.name);
        insert(&mut world, entity, se.contained_in);
        insert(&mut world, entity, se.location);
        insert(&mut world, entity, se.root);
        insert(&mut world, entity, se.passage);
        insert(&mut world, entity, se.terrain);
        insert(&mut world, entity, se.character);
        insert(&mut world, entity, se.item);
        insert(&mut world, entity, se.skills);
        insert(&mut world, entity, se.works_on);
        insert(&mut world, entity, se.capabilities);
        insert(&mut world, entity, se.activity);
    }
    Ok(world)
}

/// Write a snapshot of the simulation to `writer`.
pub fn save_simulation<W: Write>(
    writer: W,
    world: &WorldState,
    events: &EventLog,
    notifications: &NotificationLog,
    tick: u64,
) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        tick,
        config: world.config().clone(),
        events: events.clone(),
        notifications: notifications.clone(),
        entities: serialize_entities(world.ecs()),
    };
    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// In-memory copy of a world, taken before a multi-step change so the
/// change can be undone as a whole.
pub struct WorldSnapshot {
    config: WorldConfig,
    entities: Vec<SerializableEntity>,
}

impl WorldSnapshot {
    pub fn capture(world: &WorldState) -> Self {
        Self {
            config: world.config().clone(),
            entities: serialize_entities(world.ecs()),
        }
    }

    /// Rebuild the world exactly as captured, entity handles included.
    pub fn restore(self) -> Result<WorldState, SaveError> {
        let ecs = deserialize_entities(self.entities)?;
        Ok(WorldState::from_ecs(ecs, self.config))
    }
}

/// A restored simulation, ready to hand back to the engine.
pub struct LoadedSimulation {
    pub world: WorldState,
    pub events: EventLog,
    pub notifications: NotificationLog,
    pub tick: u64,
}

/// Read a snapshot written by [`save_simulation`].
pub fn load_simulation<R: Read>(reader: R) -> Result<LoadedSimulation, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let count = save_data.entities.len();
    let ecs = deserialize_entities(save_data.entities)?;
    info!("loaded {} entities at tick {}", count, save_data.tick);

    Ok(LoadedSimulation {
        world: WorldState::from_ecs(ecs, save_data.config),
        events: save_data.events,
        notifications: save_data.notifications,
        tick: save_data.tick,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use landfall_logic::geography::Point;
    use landfall_logic::pathfinding::TraversalClass;

    #[test]
    fn test_handles_survive_roundtrip() {
        let mut world = WorldState::default();
        let root = world.spawn_root_location("outside", "ford", Point::new(10.0, 10.0)).unwrap();
        let hut = world.spawn_location("building", "hut", root).unwrap();
        // the door reuses this slot with a newer generation
        let gone = world.spawn_character("Gone", root).unwrap();
        world.despawn_recursive(gone).unwrap();
        let door = world.connect(root, hut, TraversalClass::Limited, false).unwrap();
        let ferryman = world.spawn_character("Ferryman", hut).unwrap();

        let mut buffer = Vec::new();
        save_simulation(&mut buffer, &world, &EventLog::new(), &NotificationLog::new(), 7).unwrap();
        let loaded = load_simulation(&buffer[..]).unwrap();

        assert_eq!(loaded.tick, 7);
        assert_eq!(loaded.world.entity_count(), world.entity_count());
        assert_eq!(loaded.world.name(ferryman).as_deref(), Some("Ferryman"));
        assert_eq!(loaded.world.location_of(ferryman), Some(hut));
        assert_eq!(loaded.world.passages_of(hut), vec![door]);
        assert!(!loaded.world.passage(door).unwrap().open);
        assert!(!loaded.world.exists(gone));
    }

    #[test]
    fn test_snapshot_undoes_later_changes() {
        let mut world = WorldState::default();
        let root = world.spawn_root_location("outside", "quay", Point::new(3.0, 3.0)).unwrap();
        let net = world.spawn_item(Item::new("net", 0.5, 2), root).unwrap();
        let snapshot = WorldSnapshot::capture(&world);

        let fish = world.spawn_item(Item::new("fish", 1.0, 5), root).unwrap();
        world.set_item_amount(net, 1).unwrap();

        let world = snapshot.restore().unwrap();
        assert!(!world.exists(fish));
        assert_eq!(world.item(net).unwrap().amount, 2);
        assert_eq!(world.contents(root), vec![net]);
    }

    #[test]
    fn test_version_mismatch() {
        let data = SaveData {
            version: SAVE_VERSION + 1,
            tick: 0,
            config: WorldConfig::default(),
            events: EventLog::new(),
            notifications: NotificationLog::new(),
            entities: Vec::new(),
        };
        let bytes = bincode::serialize(&data).unwrap();
        assert!(matches!(
            load_simulation(&bytes[..]),
            Err(SaveError::VersionMismatch { found, .. }) if found == SAVE_VERSION + 1
        ));
    }
}
