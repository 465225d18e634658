//! The world store: an ECS world plus the passage index.
//!
//! All structural mutation goes through [`WorldState`] so the containment
//! tree stays acyclic and the passage index stays in sync with the
//! `Passage` components. Read access to the raw `hecs::World` is available
//! for ad-hoc queries.

use std::collections::{BTreeSet, HashMap, VecDeque};

use hecs::{Entity, World};
use log::{debug, info};
use serde_json::{json, Value};

use landfall_logic::geography::{MapBounds, Point};
use landfall_logic::pathfinding::{Adjacent, LocationGraph, PassageState, TraversalClass};
use landfall_logic::traversal::{governing_patch, TerrainPatch};

use crate::components::*;
use crate::config::WorldConfig;
use crate::error::WorldError;
use crate::serde_helpers::entity_bits;

/// Coarse entity classification used for display and dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Character,
    Item,
    Location,
    Activity,
    Passage,
    Terrain,
    Other,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Character => "character",
            EntityKind::Item => "item",
            EntityKind::Location => "location",
            EntityKind::Activity => "activity",
            EntityKind::Passage => "passage",
            EntityKind::Terrain => "terrain",
            EntityKind::Other => "entity",
        }
    }
}

pub struct WorldState {
    ecs: World,
    config: WorldConfig,
    /// location → passages touching it
    passage_index: HashMap<Entity, Vec<Entity>>,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl WorldState {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            ecs: World::new(),
            config,
            passage_index: HashMap::new(),
        }
    }

    /// Wrap an already populated ECS world (e.g. after loading a save).
    pub fn from_ecs(ecs: World, config: WorldConfig) -> Self {
        let mut state = Self {
            ecs,
            config,
            passage_index: HashMap::new(),
        };
        state.rebuild_passage_index();
        state
    }

    pub fn rebuild_passage_index(&mut self) {
        self.passage_index.clear();
        let mut passages: Vec<(Entity, Passage)> = self
            .ecs
            .query::<&Passage>()
            .iter()
            .map(|(e, p)| (e, *p))
            .collect();
        passages.sort_by_key(|(e, _)| *e);
        for (entity, passage) in passages {
            self.passage_index.entry(passage.a).or_default().push(entity);
            self.passage_index.entry(passage.b).or_default().push(entity);
        }
        debug!("passage index rebuilt: {} locations", self.passage_index.len());
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn map(&self) -> &MapBounds {
        &self.config.map
    }

    pub fn ecs(&self) -> &World {
        &self.ecs
    }

    /// Raw mutable access. Adding or removing `Passage` components through
    /// this requires a [`rebuild_passage_index`](Self::rebuild_passage_index).
    pub fn ecs_mut(&mut self) -> &mut World {
        &mut self.ecs
    }

    pub fn entity_count(&self) -> u32 {
        self.ecs.len()
    }

    // ── Spawning ──────────────────────────────────────────────────────

    pub fn spawn_root_location(
        &mut self,
        location_type: &str,
        name: &str,
        position: Point,
    ) -> Result<Entity, WorldError> {
        let position = self.checked_position(position)?;
        Ok(self.ecs.spawn((
            Location::new(location_type),
            RootLocation::fixed(position),
            Name::new(name),
        )))
    }

    pub fn spawn_location(
        &mut self,
        location_type: &str,
        name: &str,
        parent: Entity,
    ) -> Result<Entity, WorldError> {
        self.require_location(parent)?;
        Ok(self.ecs.spawn((
            Location::new(location_type),
            Name::new(name),
            ContainedIn::new(parent),
        )))
    }

    pub fn spawn_character(&mut self, name: &str, location: Entity) -> Result<Entity, WorldError> {
        self.require_location(location)?;
        Ok(self.ecs.spawn((
            Character,
            Name::new(name),
            Skills::default(),
            ContainedIn::new(location),
        )))
    }

    /// Spawn an item inside any existing container (a location, a
    /// character's inventory, another item).
    pub fn spawn_item(&mut self, item: Item, container: Entity) -> Result<Entity, WorldError> {
        self.require_exists(container)?;
        let name = Name::new(item.item_type.clone());
        Ok(self.ecs.spawn((item, name, ContainedIn::new(container))))
    }

    pub fn spawn_activity(&mut self, activity: Activity, location: Entity) -> Result<Entity, WorldError> {
        self.require_location(location)?;
        let name = Name::new(activity.name.clone());
        Ok(self.ecs.spawn((activity, name, ContainedIn::new(location))))
    }

    pub fn add_terrain(&mut self, area: TerrainArea) -> Entity {
        self.ecs.spawn((area,))
    }

    pub fn add_capability(&mut self, entity: Entity, tag: &str, params: Value) -> Result<(), WorldError> {
        self.require_exists(entity)?;
        if let Ok(mut caps) = self.ecs.get::<&mut Capabilities>(entity) {
            caps.tags.insert(tag.to_string(), params);
            return Ok(());
        }
        let caps = Capabilities::default().with(tag, params);
        self.ecs
            .insert_one(entity, caps)
            .map_err(|_| WorldError::NoSuchEntity(entity))
    }

    pub fn set_skill(&mut self, character: Entity, skill: &str, level: u32) -> Result<(), WorldError> {
        let mut skills = self
            .ecs
            .get::<&mut Skills>(character)
            .map_err(|_| WorldError::NotACharacter(character))?;
        skills.set(skill, level);
        Ok(())
    }

    // ── Passages ──────────────────────────────────────────────────────

    pub fn connect(
        &mut self,
        a: Entity,
        b: Entity,
        class: TraversalClass,
        open: bool,
    ) -> Result<Entity, WorldError> {
        if a == b {
            return Err(WorldError::SelfPassage(a));
        }
        self.require_location(a)?;
        self.require_location(b)?;
        let passage = self.ecs.spawn((Passage { a, b, open, class },));
        self.passage_index.entry(a).or_default().push(passage);
        self.passage_index.entry(b).or_default().push(passage);
        Ok(passage)
    }

    pub fn set_passage_open(&mut self, passage: Entity, open: bool) -> Result<(), WorldError> {
        let mut p = self
            .ecs
            .get::<&mut Passage>(passage)
            .map_err(|_| WorldError::NotAPassage(passage))?;
        p.open = open;
        Ok(())
    }

    pub fn passage(&self, passage: Entity) -> Option<Passage> {
        self.ecs.get::<&Passage>(passage).ok().map(|p| *p)
    }

    pub fn passages_of(&self, location: Entity) -> Vec<Entity> {
        self.passage_index.get(&location).cloned().unwrap_or_default()
    }

    // ── Containment ───────────────────────────────────────────────────

    /// Put `entity` inside `container`. A root location that is moved
    /// loses its map position.
    pub fn move_into(&mut self, entity: Entity, container: Entity) -> Result<(), WorldError> {
        self.require_exists(entity)?;
        self.require_exists(container)?;
        if entity == container || self.ancestors(container).contains(&entity) {
            return Err(WorldError::ContainmentCycle { entity, container });
        }
        if self.is_root(entity) {
            let _ = self.ecs.remove_one::<RootLocation>(entity);
        }
        self.ecs
            .insert_one(entity, ContainedIn::new(container))
            .map_err(|_| WorldError::NoSuchEntity(entity))
    }

    /// Move a root location across the map.
    pub fn move_root(&mut self, root: Entity, position: Point) -> Result<(), WorldError> {
        let position = self.checked_position(position)?;
        let mut r = self
            .ecs
            .get::<&mut RootLocation>(root)
            .map_err(|_| WorldError::NotALocation(root))?;
        r.position = position;
        Ok(())
    }

    pub fn container_of(&self, entity: Entity) -> Option<Entity> {
        self.ecs.get::<&ContainedIn>(entity).ok().map(|c| c.container)
    }

    /// Containers of `entity`, innermost first.
    ///
    /// # Panics
    /// If the containment chain loops, which `move_into` never allows.
    pub fn ancestors(&self, entity: Entity) -> Vec<Entity> {
        let mut chain = Vec::new();
        let mut current = entity;
        while let Some(parent) = self.container_of(current) {
            assert!(
                chain.len() <= self.ecs.len() as usize,
                "containment cycle above {entity:?}"
            );
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Nearest enclosing location (never `entity` itself).
    pub fn location_of(&self, entity: Entity) -> Option<Entity> {
        self.ancestors(entity).into_iter().find(|a| self.is_location(*a))
    }

    /// The root location `entity` is ultimately inside, or `entity` itself
    /// when it is a root.
    pub fn root_of(&self, entity: Entity) -> Option<Entity> {
        if self.is_root(entity) {
            return Some(entity);
        }
        self.ancestors(entity).into_iter().last().filter(|top| self.is_root(*top))
    }

    pub fn root_position(&self, root: Entity) -> Option<Point> {
        self.ecs.get::<&RootLocation>(root).ok().map(|r| r.position)
    }

    pub fn roots(&self) -> Vec<(Entity, Point)> {
        let mut roots: Vec<(Entity, Point)> = self
            .ecs
            .query::<&RootLocation>()
            .iter()
            .map(|(e, r)| (e, r.position))
            .collect();
        roots.sort_by_key(|(e, _)| *e);
        roots
    }

    /// Direct contents, sorted.
    pub fn contents(&self, container: Entity) -> Vec<Entity> {
        let mut found: Vec<Entity> = self
            .ecs
            .query::<&ContainedIn>()
            .iter()
            .filter(|(_, c)| c.container == container)
            .map(|(e, _)| e)
            .collect();
        found.sort();
        found
    }

    /// Everything inside `container` at any depth.
    pub fn contents_recursive(&self, container: Entity) -> Vec<Entity> {
        let mut children: HashMap<Entity, Vec<Entity>> = HashMap::new();
        for (entity, contained) in self.ecs.query::<&ContainedIn>().iter() {
            children.entry(contained.container).or_default().push(entity);
        }

        let mut found = Vec::new();
        let mut queue = VecDeque::from([container]);
        while let Some(current) = queue.pop_front() {
            if let Some(inner) = children.get(&current) {
                for &child in inner {
                    found.push(child);
                    queue.push_back(child);
                }
            }
        }
        found.sort();
        found
    }

    /// Entities directly inside any of `containers` that have component `T`.
    pub fn contained_with<T: hecs::Component>(&self, containers: &BTreeSet<Entity>) -> BTreeSet<Entity> {
        self.ecs
            .query::<(&ContainedIn, &T)>()
            .iter()
            .filter(|(_, (c, _))| containers.contains(&c.container))
            .map(|(e, _)| e)
            .collect()
    }

    // ── Removal ───────────────────────────────────────────────────────

    /// Despawn `entity` and everything inside it, along with passages
    /// touching any removed location and work assignments on any removed
    /// activity. Returns every removed entity.
    pub fn despawn_recursive(&mut self, entity: Entity) -> Result<Vec<Entity>, WorldError> {
        self.require_exists(entity)?;
        let mut doomed = vec![entity];
        doomed.extend(self.contents_recursive(entity));

        let mut passages = BTreeSet::new();
        for e in &doomed {
            passages.extend(self.passages_of(*e));
            if self.is_passage(*e) {
                passages.insert(*e);
            }
        }

        let doomed_set: BTreeSet<Entity> = doomed.iter().copied().collect();
        let orphaned_workers: Vec<Entity> = self
            .ecs
            .query::<&WorksOn>()
            .iter()
            .filter(|(e, w)| doomed_set.contains(&w.activity) && !doomed_set.contains(e))
            .map(|(e, _)| e)
            .collect();
        for worker in orphaned_workers {
            let _ = self.ecs.remove_one::<WorksOn>(worker);
        }

        for passage in &passages {
            if let Some(p) = self.passage(*passage) {
                for end in [p.a, p.b] {
                    if let Some(list) = self.passage_index.get_mut(&end) {
                        list.retain(|x| x != passage);
                    }
                }
            }
            let _ = self.ecs.despawn(*passage);
        }

        for e in &doomed {
            self.passage_index.remove(e);
            let _ = self.ecs.despawn(*e);
        }

        let mut removed = doomed;
        removed.extend(passages.into_iter().filter(|p| !doomed_set.contains(p)));
        debug!("despawned {:?} and {} dependents", entity, removed.len() - 1);
        Ok(removed)
    }

    /// Remove root locations that are empty and not marked persistent.
    pub fn prune_empty_roots(&mut self) -> Vec<Entity> {
        let candidates: Vec<Entity> = self
            .ecs
            .query::<&RootLocation>()
            .iter()
            .filter(|(_, r)| !r.persistent)
            .map(|(e, _)| e)
            .collect();

        let mut pruned = Vec::new();
        for root in candidates {
            if self.contents(root).is_empty() && self.despawn_recursive(root).is_ok() {
                pruned.push(root);
            }
        }
        if !pruned.is_empty() {
            info!("pruned {} empty root locations", pruned.len());
        }
        pruned.sort();
        pruned
    }

    // ── Classification ────────────────────────────────────────────────

    pub fn exists(&self, entity: Entity) -> bool {
        self.ecs.contains(entity)
    }

    fn has<T: hecs::Component>(&self, entity: Entity) -> bool {
        self.ecs.entity(entity).map(|e| e.has::<T>()).unwrap_or(false)
    }

    pub fn is_location(&self, entity: Entity) -> bool {
        self.has::<Location>(entity)
    }

    pub fn is_root(&self, entity: Entity) -> bool {
        self.has::<RootLocation>(entity)
    }

    pub fn is_character(&self, entity: Entity) -> bool {
        self.has::<Character>(entity)
    }

    pub fn is_item(&self, entity: Entity) -> bool {
        self.has::<Item>(entity)
    }

    pub fn is_activity(&self, entity: Entity) -> bool {
        self.has::<Activity>(entity)
    }

    pub fn is_passage(&self, entity: Entity) -> bool {
        self.has::<Passage>(entity)
    }

    pub fn kind(&self, entity: Entity) -> Option<EntityKind> {
        if !self.exists(entity) {
            return None;
        }
        Some(if self.is_character(entity) {
            EntityKind::Character
        } else if self.is_item(entity) {
            EntityKind::Item
        } else if self.is_location(entity) {
            EntityKind::Location
        } else if self.is_activity(entity) {
            EntityKind::Activity
        } else if self.is_passage(entity) {
            EntityKind::Passage
        } else if self.has::<TerrainArea>(entity) {
            EntityKind::Terrain
        } else {
            EntityKind::Other
        })
    }

    pub fn name(&self, entity: Entity) -> Option<String> {
        self.ecs.get::<&Name>(entity).ok().map(|n| n.0.clone())
    }

    /// Display representation: `{"id", "kind", "name"}`.
    pub fn describe(&self, entity: Entity) -> Value {
        json!({
            "id": entity_bits(entity),
            "kind": self.kind(entity).map(|k| k.as_str()),
            "name": self.name(entity),
        })
    }

    pub fn location_type(&self, location: Entity) -> Option<String> {
        self.ecs
            .get::<&Location>(location)
            .ok()
            .map(|l| l.location_type.clone())
    }

    pub fn item(&self, entity: Entity) -> Option<Item> {
        self.ecs.get::<&Item>(entity).ok().map(|i| (*i).clone())
    }

    pub fn set_item_amount(&mut self, entity: Entity, amount: u32) -> Result<(), WorldError> {
        let mut item = self
            .ecs
            .get::<&mut Item>(entity)
            .map_err(|_| WorldError::NotAnItem(entity))?;
        item.amount = amount;
        Ok(())
    }

    pub fn activity(&self, entity: Entity) -> Option<Activity> {
        self.ecs.get::<&Activity>(entity).ok().map(|a| (*a).clone())
    }

    pub fn set_activity(&mut self, entity: Entity, activity: Activity) -> Result<(), WorldError> {
        let mut current = self
            .ecs
            .get::<&mut Activity>(entity)
            .map_err(|_| WorldError::NotAnActivity(entity))?;
        *current = activity;
        Ok(())
    }

    pub fn skill_level(&self, character: Entity, skill: &str) -> u32 {
        self.ecs
            .get::<&Skills>(character)
            .map(|s| s.level(skill))
            .unwrap_or(0)
    }

    // ── Capabilities ──────────────────────────────────────────────────

    pub fn has_capability(&self, entity: Entity, tag: &str) -> bool {
        self.ecs
            .get::<&Capabilities>(entity)
            .map(|c| c.has(tag))
            .unwrap_or(false)
    }

    /// Typed capability view, e.g. `world.capability::<ToolCapability>(saw)`.
    pub fn capability<C: Capability>(&self, entity: Entity) -> Option<C> {
        self.ecs.get::<&Capabilities>(entity).ok()?.view::<C>()
    }

    // ── Terrain ───────────────────────────────────────────────────────

    /// Every terrain area as seen through `layer`, in spawn order.
    pub fn terrain_patches(&self, layer: &str) -> Vec<TerrainPatch> {
        let mut areas: Vec<(Entity, TerrainPatch)> = self
            .ecs
            .query::<&TerrainArea>()
            .iter()
            .map(|(e, area)| (e, area.patch(layer)))
            .collect();
        areas.sort_by_key(|(e, _)| *e);
        areas.into_iter().map(|(_, patch)| patch).collect()
    }

    /// Type of the terrain area governing `point`, if any covers it.
    pub fn terrain_type_at(&self, point: Point) -> Option<String> {
        let patches = self.terrain_patches(&self.config.traversability_layer);
        let point = self.map().normalize(point);
        governing_patch(&patches, point).map(|p| p.terrain_type.clone())
    }

    // ── Helpers ───────────────────────────────────────────────────────

    fn checked_position(&self, position: Point) -> Result<Point, WorldError> {
        if !(position.x.is_finite() && position.y.is_finite()) {
            return Err(WorldError::InvalidPosition {
                x: position.x,
                y: position.y,
            });
        }
        Ok(self.map().normalize(position))
    }

    fn require_exists(&self, entity: Entity) -> Result<(), WorldError> {
        if self.exists(entity) {
            Ok(())
        } else {
            Err(WorldError::NoSuchEntity(entity))
        }
    }

    fn require_location(&self, entity: Entity) -> Result<(), WorldError> {
        self.require_exists(entity)?;
        if self.is_location(entity) {
            Ok(())
        } else {
            Err(WorldError::NotALocation(entity))
        }
    }
}

impl LocationGraph for WorldState {
    type Node = Entity;

    fn adjacent(&self, node: Entity) -> Vec<Adjacent<Entity>> {
        self.passages_of(node)
            .into_iter()
            .filter_map(|id| {
                let passage = self.passage(id)?;
                Some(Adjacent {
                    location: passage.other_end(node)?,
                    passage: PassageState {
                        open: passage.open,
                        class: passage.class,
                    },
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landfall_logic::constants::location_types;
    use landfall_logic::geometry::Polygon;
    use landfall_logic::pathfinding::{shortest_path, visit_subgraph};

    fn small_world() -> WorldState {
        WorldState::new(WorldConfig {
            map: MapBounds::new(100.0, 100.0),
            ..Default::default()
        })
    }

    #[test]
    fn test_root_position_is_normalized() {
        let mut world = small_world();
        let root = world
            .spawn_root_location(location_types::OUTSIDE, "field", Point::new(130.0, 10.0))
            .unwrap();
        assert_eq!(world.root_position(root), Some(Point::new(30.0, 10.0)));
        assert!(matches!(
            world.spawn_root_location("outside", "void", Point::new(f64::NAN, 0.0)),
            Err(WorldError::InvalidPosition { .. })
        ));
    }

    #[test]
    fn test_containment_chain() {
        let mut world = small_world();
        let root = world.spawn_root_location("outside", "square", Point::new(1.0, 1.0)).unwrap();
        let house = world.spawn_location("building", "house", root).unwrap();
        let kitchen = world.spawn_location("room", "kitchen", house).unwrap();
        let cook = world.spawn_character("Ada", kitchen).unwrap();
        let knife = world.spawn_item(Item::new("knife", 1.0, 1), cook).unwrap();

        assert_eq!(world.location_of(knife), Some(kitchen));
        assert_eq!(world.location_of(cook), Some(kitchen));
        assert_eq!(world.location_of(kitchen), Some(house));
        assert_eq!(world.root_of(knife), Some(root));
        assert_eq!(world.root_of(root), Some(root));
        assert_eq!(world.ancestors(knife), vec![cook, kitchen, house, root]);
        assert_eq!(world.contents(cook), vec![knife]);
        assert_eq!(world.contents_recursive(house).len(), 3);
    }

    #[test]
    fn test_move_into_rejects_cycles() {
        let mut world = small_world();
        let root = world.spawn_root_location("outside", "square", Point::new(1.0, 1.0)).unwrap();
        let house = world.spawn_location("building", "house", root).unwrap();
        let room = world.spawn_location("room", "hall", house).unwrap();

        assert_eq!(
            world.move_into(house, room),
            Err(WorldError::ContainmentCycle {
                entity: house,
                container: room
            })
        );
        assert!(world.move_into(house, house).is_err());
    }

    #[test]
    fn test_self_passage_rejected() {
        let mut world = small_world();
        let root = world.spawn_root_location("outside", "square", Point::new(1.0, 1.0)).unwrap();
        assert_eq!(
            world.connect(root, root, TraversalClass::Limited, true),
            Err(WorldError::SelfPassage(root))
        );
    }

    #[test]
    fn test_graph_view_follows_passages() {
        let mut world = small_world();
        let root = world.spawn_root_location("outside", "square", Point::new(1.0, 1.0)).unwrap();
        let hall = world.spawn_location("building", "hall", root).unwrap();
        let cellar = world.spawn_location("room", "cellar", hall).unwrap();
        let door = world.connect(root, hall, TraversalClass::Limited, true).unwrap();
        world.connect(hall, cellar, TraversalClass::Limited, true).unwrap();

        assert_eq!(
            shortest_path(&world, root, cellar),
            Some(vec![root, hall, cellar])
        );
        world.set_passage_open(door, false).unwrap();
        assert_eq!(visit_subgraph(&world, root, false).len(), 1);
    }

    #[test]
    fn test_despawn_removes_contents_passages_and_assignments() {
        let mut world = small_world();
        let root = world.spawn_root_location("outside", "square", Point::new(1.0, 1.0)).unwrap();
        let hut = world.spawn_location("building", "hut", root).unwrap();
        world.connect(root, hut, TraversalClass::Limited, true).unwrap();
        let bench = world.spawn_item(Item::new("bench", 1.0, 1), hut).unwrap();
        let job = world
            .spawn_activity(Recipe::new("carve", 2).instantiate(None), hut)
            .unwrap();
        let carver = world.spawn_character("Bo", root).unwrap();
        world.ecs_mut().insert_one(carver, WorksOn { activity: job }).unwrap();

        let removed = world.despawn_recursive(hut).unwrap();
        assert!(removed.contains(&bench));
        assert!(removed.contains(&job));
        assert!(!world.exists(hut));
        assert!(world.passages_of(root).is_empty());
        assert!(world.ecs().get::<&WorksOn>(carver).is_err());
        assert!(world.exists(carver));
    }

    #[test]
    fn test_prune_keeps_persistent_and_occupied_roots() {
        let mut world = small_world();
        let kept = world.spawn_root_location("outside", "square", Point::new(1.0, 1.0)).unwrap();
        let camp = world.spawn_root_location("outside", "camp", Point::new(5.0, 5.0)).unwrap();
        let busy = world.spawn_root_location("outside", "market", Point::new(9.0, 9.0)).unwrap();
        for root in [camp, busy] {
            world.ecs_mut().get::<&mut RootLocation>(root).unwrap().persistent = false;
        }
        world.spawn_character("Cy", busy).unwrap();

        assert_eq!(world.prune_empty_roots(), vec![camp]);
        assert!(world.exists(kept));
        assert!(world.exists(busy));
    }

    #[test]
    fn test_describe_and_capabilities() {
        let mut world = small_world();
        let root = world.spawn_root_location("outside", "square", Point::new(1.0, 1.0)).unwrap();
        let saw = world.spawn_item(Item::new("saw", 0.8, 1), root).unwrap();
        world
            .add_capability(saw, "tool", ToolCapability::params(&[("woodworking", 1.25)]))
            .unwrap();

        assert!(world.has_capability(saw, "tool"));
        assert!(!world.has_capability(saw, "machine"));
        assert_eq!(
            world.capability::<ToolCapability>(saw).and_then(|t| t.efficiency("woodworking")),
            Some(1.25)
        );
        assert_eq!(
            world.describe(saw),
            json!({"id": entity_bits(saw), "kind": "item", "name": "saw"})
        );
    }

    #[test]
    fn test_terrain_type_at_uses_priority() {
        let mut world = small_world();
        world.add_terrain(TerrainArea::new("grassland", 0, Polygon::rect(0.0, 0.0, 100.0, 100.0)));
        world.add_terrain(TerrainArea::new("water", 2, Polygon::rect(40.0, 40.0, 10.0, 10.0)));
        assert_eq!(world.terrain_type_at(Point::new(45.0, 45.0)).as_deref(), Some("water"));
        assert_eq!(world.terrain_type_at(Point::new(5.0, 5.0)).as_deref(), Some("grassland"));
    }
}
