//! Activity progress - requirement checks and per-tick advancement.
//!
//! Checking is read-only: [`check_activity`] returns the activity as it would
//! be after this tick, and the engine writes it back only once the tick's
//! transaction commits. A failed check therefore never leaves a partial
//! decrement behind.
//!
//! Requirement categories are checked in a fixed order so the first failure
//! reported for a given world state is always the same one:
//!
//! 1. participant bounds
//! 2. location type
//! 3. terrain type at the activity's root
//! 4. machines in the activity's location
//! 5. tools, per worker (mandatory, then optional)
//! 6. outstanding input materials
//! 7. proximity, per worker
//! 8. minimum skill, per worker

use hecs::Entity;
use log::debug;

use crate::components::{Activity, MachineCapability, ToolCapability, WorksOn};
use crate::error::{ActionError, WorldError};
use crate::world::WorldState;

/// A requirement check that failed, and the characters it is attributed to.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckFailure {
    pub error: ActionError,
    pub culprits: Vec<Entity>,
}

impl CheckFailure {
    fn everyone(error: ActionError, workers: &[Entity]) -> Self {
        Self {
            error,
            culprits: workers.to_vec(),
        }
    }

    fn one(error: ActionError, worker: Entity) -> Self {
        Self {
            error,
            culprits: vec![worker],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nobody is working on it.
    Idle,
    /// All checks passed; the activity after this tick.
    Advanced(Activity),
    Failed(CheckFailure),
}

/// Every activity in the world, in stable order.
pub fn pending_activities(world: &WorldState) -> Vec<Entity> {
    let mut activities: Vec<Entity> = world
        .ecs()
        .query::<&Activity>()
        .iter()
        .map(|(e, _)| e)
        .collect();
    activities.sort();
    activities
}

/// Characters currently assigned to `activity`.
pub fn workers_of(world: &WorldState, activity: Entity) -> Vec<Entity> {
    let mut workers: Vec<Entity> = world
        .ecs()
        .query::<&WorksOn>()
        .iter()
        .filter(|(e, w)| w.activity == activity && world.is_character(*e))
        .map(|(e, _)| e)
        .collect();
    workers.sort();
    workers
}

/// Best score a character's tools reach for `group`: the highest
/// `efficiency × quality` among held items with a tool capability for it.
pub fn best_tool_score(world: &WorldState, character: Entity, group: &str) -> Option<f64> {
    world
        .contents_recursive(character)
        .into_iter()
        .filter_map(|e| {
            let efficiency = world.capability::<ToolCapability>(e)?.efficiency(group)?;
            let quality = world.item(e)?.quality;
            Some(efficiency * quality)
        })
        .fold(None, |best: Option<f64>, score| match best {
            Some(b) if b >= score => Some(b),
            _ => Some(score),
        })
}

/// Run every requirement check for one tick of `activity`.
///
/// Returns `Err` only when the world graph itself is inconsistent, e.g. an
/// activity that is not inside any location.
pub fn check_activity(world: &WorldState, activity_entity: Entity) -> Result<TickOutcome, WorldError> {
    let mut activity = world
        .activity(activity_entity)
        .ok_or(WorldError::NotAnActivity(activity_entity))?;
    let location = world
        .location_of(activity_entity)
        .ok_or(WorldError::NoLocation(activity_entity))?;

    let workers = workers_of(world, activity_entity);
    if workers.is_empty() {
        return Ok(TickOutcome::Idle);
    }
    let req = &activity.requirements;

    let count = workers.len() as u32;
    if count < req.min_workers {
        return Ok(TickOutcome::Failed(CheckFailure::everyone(
            ActionError::TooFewParticipants {
                workers: count,
                min: req.min_workers,
            },
            &workers,
        )));
    }
    if let Some(max) = req.max_workers {
        if count > max {
            return Ok(TickOutcome::Failed(CheckFailure::everyone(
                ActionError::TooManyParticipants { workers: count, max },
                &workers,
            )));
        }
    }

    if !req.location_types.is_empty() {
        let location_type = world.location_type(location).unwrap_or_default();
        if !req.location_types.contains(&location_type) {
            return Ok(TickOutcome::Failed(CheckFailure::everyone(
                ActionError::InvalidLocationType { location_type },
                &workers,
            )));
        }
    }

    if !req.terrain_types.is_empty() {
        let terrain_type = world
            .root_of(activity_entity)
            .and_then(|root| world.root_position(root))
            .and_then(|pos| world.terrain_type_at(pos));
        let allowed = terrain_type
            .as_ref()
            .is_some_and(|t| req.terrain_types.contains(t));
        if !allowed {
            return Ok(TickOutcome::Failed(CheckFailure::everyone(
                ActionError::InvalidTerrainType { terrain_type },
                &workers,
            )));
        }
    }

    if !req.machines.is_empty() {
        let present = world.contents(location).into_iter().any(|e| {
            world
                .capability::<MachineCapability>(e)
                .is_some_and(|m| m.serves_any(&req.machines))
        });
        if !present {
            return Ok(TickOutcome::Failed(CheckFailure::everyone(
                ActionError::NoMachineForActivity {
                    groups: req.machines.iter().cloned().collect(),
                },
                &workers,
            )));
        }
    }

    let mut quality_sum = 0.0;
    let mut quality_ticks = 0.0;
    let mut total_rate = 0.0;
    for &worker in &workers {
        let mut rate = 1.0;
        for group in &req.mandatory_tools {
            match best_tool_score(world, worker, group) {
                Some(score) => {
                    quality_sum += score;
                    quality_ticks += 1.0;
                }
                None => {
                    return Ok(TickOutcome::Failed(CheckFailure::one(
                        ActionError::NoToolForActivity { group: group.clone() },
                        worker,
                    )));
                }
            }
        }
        for (group, bonus) in &req.optional_tools {
            if let Some(score) = best_tool_score(world, worker, group) {
                quality_sum += score;
                quality_ticks += 1.0;
                rate *= 1.0 + bonus * score;
            }
        }
        total_rate += rate;
    }

    if let Some((item_type, missing)) = req.inputs.iter().find(|(_, missing)| **missing > 0) {
        return Ok(TickOutcome::Failed(CheckFailure::everyone(
            ActionError::NoInputMaterial {
                item_type: item_type.clone(),
                missing: *missing,
            },
            &workers,
        )));
    }

    let proximity = req
        .proximity
        .clone()
        .unwrap_or_else(|| world.config().default_proximity.clone());
    for &worker in &workers {
        if !proximity.is_near(world, worker, activity_entity) {
            return Ok(TickOutcome::Failed(CheckFailure::one(
                ActionError::TooFarFromActivity {
                    activity: activity_entity,
                },
                worker,
            )));
        }
    }

    if let Some(skill) = &req.skill {
        for &worker in &workers {
            let level = world.skill_level(worker, &skill.skill);
            if level < skill.level {
                return Ok(TickOutcome::Failed(CheckFailure::one(
                    ActionError::TooLowSkill {
                        skill: skill.skill.clone(),
                        level,
                        required: skill.level,
                    },
                    worker,
                )));
            }
        }
    }

    activity.quality_sum += quality_sum;
    activity.quality_ticks += quality_ticks;
    activity.ticks_left = (activity.ticks_left - total_rate).max(0.0);
    debug!(
        "activity {:?} ({}) advanced by {:.2}, {:.2} ticks left",
        activity_entity, activity.name, total_rate, activity.ticks_left
    );
    Ok(TickOutcome::Advanced(activity))
}
