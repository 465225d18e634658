//! Character commands that set up and feed activities.
//!
//! Each command validates first and only then mutates, so a rejected command
//! leaves the world untouched.

use hecs::Entity;
use log::debug;

use landfall_logic::deferred::CallRegistry;

use crate::components::{Recipe, Requirements, WorksOn};
use crate::error::{ActionError, CommandError, WorldError};
use crate::range::Range;
use crate::systems::activity::workers_of;
use crate::world::WorldState;

fn require_character(world: &WorldState, character: Entity) -> Result<(), WorldError> {
    if world.is_character(character) {
        Ok(())
    } else {
        Err(WorldError::NotACharacter(character))
    }
}

fn proximity_for(world: &WorldState, requirements: &Requirements) -> Range {
    requirements
        .proximity
        .clone()
        .unwrap_or_else(|| world.config().default_proximity.clone())
}

/// Location and terrain constraints that can be judged before any work
/// starts.
fn check_site(world: &WorldState, requirements: &Requirements, location: Entity) -> Result<(), ActionError> {
    if !requirements.location_types.is_empty() {
        let location_type = world.location_type(location).unwrap_or_default();
        if !requirements.location_types.contains(&location_type) {
            return Err(ActionError::InvalidLocationType { location_type });
        }
    }
    if !requirements.terrain_types.is_empty() {
        let terrain_type = world
            .root_of(location)
            .and_then(|root| world.root_position(root))
            .and_then(|pos| world.terrain_type_at(pos));
        if !terrain_type
            .as_ref()
            .is_some_and(|t| requirements.terrain_types.contains(t))
        {
            return Err(ActionError::InvalidTerrainType { terrain_type });
        }
    }
    Ok(())
}

/// Instantiate `recipe` where `character` stands, with `character` as the
/// initiator and first worker.
pub fn start_activity(
    world: &mut WorldState,
    registry: &CallRegistry<WorldState>,
    recipe: &Recipe,
    character: Entity,
) -> Result<Entity, CommandError> {
    require_character(world, character)?;
    let location = world
        .location_of(character)
        .ok_or(WorldError::NoLocation(character))?;
    check_site(world, &recipe.requirements, location)?;
    for action in &recipe.result_actions {
        registry.resolve(action)?;
    }

    let activity = world.spawn_activity(recipe.instantiate(Some(character)), location)?;
    world
        .ecs_mut()
        .insert_one(character, WorksOn { activity })
        .map_err(|_| WorldError::NoSuchEntity(character))?;
    debug!("{:?} started {} as {:?}", character, recipe.name, activity);
    Ok(activity)
}

/// Assign `character` to `activity`, replacing any earlier assignment.
pub fn join_activity(world: &mut WorldState, character: Entity, activity: Entity) -> Result<(), CommandError> {
    require_character(world, character)?;
    let state = world
        .activity(activity)
        .ok_or(WorldError::NotAnActivity(activity))?;

    if !proximity_for(world, &state.requirements).is_near(world, character, activity) {
        return Err(ActionError::ActivityTargetTooFarAway { activity }.into());
    }
    let workers = workers_of(world, activity);
    if workers.contains(&character) {
        return Ok(());
    }
    if let Some(max) = state.requirements.max_workers {
        if workers.len() as u32 >= max {
            return Err(ActionError::TooManyParticipants {
                workers: workers.len() as u32 + 1,
                max,
            }
            .into());
        }
    }
    world
        .ecs_mut()
        .insert_one(character, WorksOn { activity })
        .map_err(|_| WorldError::NoSuchEntity(character))?;
    Ok(())
}

/// Stop working. Returns the activity left, if any.
pub fn leave_activity(world: &mut WorldState, character: Entity) -> Result<Option<Entity>, CommandError> {
    require_character(world, character)?;
    Ok(world
        .ecs_mut()
        .remove_one::<WorksOn>(character)
        .ok()
        .map(|w| w.activity))
}

/// Hand `amount` of a held item over to an activity's input requirement.
/// Returns how much of that input is still needed.
pub fn contribute_input(
    world: &mut WorldState,
    character: Entity,
    activity: Entity,
    item: Entity,
    amount: u32,
) -> Result<u32, CommandError> {
    require_character(world, character)?;
    let mut state = world
        .activity(activity)
        .ok_or(WorldError::NotAnActivity(activity))?;
    let held = world.item(item).ok_or(WorldError::NotAnItem(item))?;

    if amount == 0 {
        return Err(ActionError::InvalidAmount { amount }.into());
    }
    if !world.ancestors(item).contains(&character) {
        return Err(ActionError::EntityNotInInventory { entity: item }.into());
    }
    if !proximity_for(world, &state.requirements).is_near(world, character, activity) {
        return Err(ActionError::ActivityTargetTooFarAway { activity }.into());
    }
    let needed = state
        .requirements
        .inputs
        .get(&held.item_type)
        .copied()
        .unwrap_or(0);
    if needed == 0 || amount > needed || amount > held.amount {
        return Err(ActionError::InvalidAmount { amount }.into());
    }

    if held.amount == amount {
        world.despawn_recursive(item)?;
    } else {
        world.set_item_amount(item, held.amount - amount)?;
    }
    let remaining = needed - amount;
    state.requirements.inputs.insert(held.item_type, remaining);
    world.set_activity(activity, state)?;
    Ok(remaining)
}

/// Take an item lying in the same location into the inventory.
pub fn pick_up(world: &mut WorldState, character: Entity, item: Entity) -> Result<(), CommandError> {
    require_character(world, character)?;
    if !world.is_item(item) {
        return Err(WorldError::NotAnItem(item).into());
    }
    if !Range::SameLocation.is_near(world, character, item) {
        return Err(ActionError::EntityTooFarAway { entity: item }.into());
    }
    world.move_into(item, character)?;
    Ok(())
}
