//! Built-in activity result actions.
//!
//! Every call receives two implicit leading arguments: the completing
//! activity and its initiator (`Null` when there is none). Explicit
//! arguments follow.

use hecs::Entity;

use landfall_logic::deferred::{CallArg, CallArgs, CallRegistry, DeferredError};
use landfall_logic::pathfinding::TraversalClass;

use crate::components::Item;
use crate::serde_helpers::{entity_bits, entity_from_bits};
use crate::world::WorldState;

pub const PRODUCE_ITEM: &str = "produce_item";
pub const INTO_INVENTORY: &str = "into_inventory";
pub const BUILD_LOCATION: &str = "build_location";

pub fn register_builtin_actions(registry: &mut CallRegistry<WorldState>) {
    registry.register(PRODUCE_ITEM, produce_item);
    registry.register(INTO_INVENTORY, into_inventory);
    registry.register(BUILD_LOCATION, build_location);
}

fn entity_arg(world: &WorldState, args: &CallArgs, index: usize) -> Result<Entity, DeferredError> {
    entity_from_bits(args.entity(index)?)
        .filter(|e| world.exists(*e))
        .ok_or_else(|| args.fail(format!("argument {index} is not a live entity")))
}

/// The activity's location: where its products appear.
fn site(world: &WorldState, args: &CallArgs) -> Result<(Entity, Entity), DeferredError> {
    let activity = entity_arg(world, args, 0)?;
    let location = world
        .location_of(activity)
        .ok_or_else(|| args.fail("activity is not inside a location"))?;
    Ok((activity, location))
}

/// `produce_item(item_type, amount)`: a new item of the activity's mean
/// quality in the activity's location.
fn produce_item(world: &mut WorldState, args: &CallArgs) -> Result<CallArg, DeferredError> {
    let (activity, location) = site(world, args)?;
    let item_type = args.text(2)?.to_string();
    let amount = u32::try_from(args.int(3)?)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| args.fail("amount must be positive"))?;
    let quality = world.activity(activity).map(|a| a.quality()).unwrap_or(1.0);

    let item = world
        .spawn_item(Item::new(item_type, quality, amount), location)
        .map_err(|e| args.fail(e.to_string()))?;
    Ok(CallArg::Entity(entity_bits(item)))
}

/// `into_inventory(entity)`: move `entity` to the initiator.
fn into_inventory(world: &mut WorldState, args: &CallArgs) -> Result<CallArg, DeferredError> {
    if matches!(args.get(1), Some(CallArg::Null)) {
        return Err(args.fail("activity has no initiator"));
    }
    let initiator = entity_arg(world, args, 1)?;
    let entity = entity_arg(world, args, 2)?;
    world
        .move_into(entity, initiator)
        .map_err(|e| args.fail(e.to_string()))?;
    Ok(CallArg::Entity(entity_bits(entity)))
}

/// `build_location(location_type, name)`: a new sub-location of the
/// activity's location, reachable through an open door.
fn build_location(world: &mut WorldState, args: &CallArgs) -> Result<CallArg, DeferredError> {
    let (_, parent) = site(world, args)?;
    let location_type = args.text(2)?.to_string();
    let name = args.text(3)?.to_string();

    let built = world
        .spawn_location(&location_type, &name, parent)
        .map_err(|e| args.fail(e.to_string()))?;
    world
        .connect(parent, built, TraversalClass::Limited, true)
        .map_err(|e| args.fail(e.to_string()))?;
    Ok(CallArg::Entity(entity_bits(built)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Recipe;
    use crate::config::WorldConfig;
    use landfall_logic::deferred::DeferredCall;
    use landfall_logic::geography::{MapBounds, Point};

    fn setup() -> (WorldState, CallRegistry<WorldState>, Entity, Entity, Entity) {
        let mut world = WorldState::new(WorldConfig {
            map: MapBounds::new(100.0, 100.0),
            ..Default::default()
        });
        let root = world.spawn_root_location("outside", "field", Point::new(5.0, 5.0)).unwrap();
        let potter = world.spawn_character("Potter", root).unwrap();
        let mut activity = Recipe::new("throw pots", 1).instantiate(Some(potter));
        activity.quality_sum = 1.5;
        activity.quality_ticks = 2.0;
        let a = world.spawn_activity(activity, root).unwrap();
        let mut registry = CallRegistry::new();
        register_builtin_actions(&mut registry);
        (world, registry, root, potter, a)
    }

    fn implicit(activity: Entity, initiator: Option<Entity>) -> [CallArg; 2] {
        [
            CallArg::Entity(entity_bits(activity)),
            initiator.map_or(CallArg::Null, |e| CallArg::Entity(entity_bits(e))),
        ]
    }

    #[test]
    fn test_produce_item_uses_activity_quality() {
        let (mut world, registry, root, potter, a) = setup();
        let call = DeferredCall::new(PRODUCE_ITEM, vec!["pot".into(), 2_i64.into()]);
        let result = registry
            .resolve(&call)
            .unwrap()
            .invoke(&mut world, &implicit(a, Some(potter)))
            .unwrap();
        let CallArg::Entity(bits) = result else {
            panic!("expected entity, got {result:?}");
        };
        let pot = entity_from_bits(bits).unwrap();
        let item = world.item(pot).unwrap();
        assert_eq!(item.item_type, "pot");
        assert_eq!(item.amount, 2);
        assert_eq!(item.quality, 0.75);
        assert_eq!(world.container_of(pot), Some(root));
    }

    #[test]
    fn test_nested_into_inventory() {
        let (mut world, registry, _, potter, a) = setup();
        let call = DeferredCall::new(
            INTO_INVENTORY,
            vec![DeferredCall::new(PRODUCE_ITEM, vec!["bowl".into(), 1_i64.into()]).into()],
        );
        registry
            .resolve(&call)
            .unwrap()
            .invoke(&mut world, &implicit(a, Some(potter)))
            .unwrap();
        let held = world.contents(potter);
        assert_eq!(held.len(), 1);
        assert_eq!(world.item(held[0]).unwrap().item_type, "bowl");
    }

    #[test]
    fn test_into_inventory_without_initiator_fails() {
        let (mut world, registry, _, _, a) = setup();
        let call = DeferredCall::new(
            INTO_INVENTORY,
            vec![DeferredCall::new(PRODUCE_ITEM, vec!["bowl".into(), 1_i64.into()]).into()],
        );
        let err = registry
            .resolve(&call)
            .unwrap()
            .invoke(&mut world, &implicit(a, None))
            .unwrap_err();
        assert!(matches!(err, DeferredError::Failed { .. }));
    }

    #[test]
    fn test_build_location_adds_door() {
        let (mut world, registry, root, potter, a) = setup();
        let call = DeferredCall::new(BUILD_LOCATION, vec!["building".into(), "kiln house".into()]);
        let result = registry
            .resolve(&call)
            .unwrap()
            .invoke(&mut world, &implicit(a, Some(potter)))
            .unwrap();
        let CallArg::Entity(bits) = result else {
            panic!("expected entity, got {result:?}");
        };
        let house = entity_from_bits(bits).unwrap();
        assert_eq!(world.name(house).as_deref(), Some("kiln house"));
        assert_eq!(Some(vec![root, house]), crate::range::Range::shortest_path(&world, root, house));
    }

    #[test]
    fn test_bad_amount() {
        let (mut world, registry, _, potter, a) = setup();
        let call = DeferredCall::new(PRODUCE_ITEM, vec!["pot".into(), 0_i64.into()]);
        assert!(registry
            .resolve(&call)
            .unwrap()
            .invoke(&mut world, &implicit(a, Some(potter)))
            .is_err());
    }
}
