//! Error types for the simulation core.
//!
//! [`ActionError`] covers failures a player caused (missing tools, wrong
//! place, too far away). They are reported back as notifications and never
//! abort a tick. [`WorldError`] means the world graph itself is inconsistent
//! or a caller passed the wrong kind of entity.

use hecs::Entity;
use serde_json::{json, Value};
use thiserror::Error;

use landfall_logic::deferred::DeferredError;

use crate::serde_helpers::entity_bits;

/// User-attributable failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("no {item_type} left to use ({missing} still needed)")]
    NoInputMaterial { item_type: String, missing: u32 },
    #[error("no tool of group `{group}`")]
    NoToolForActivity { group: String },
    #[error("no machine of groups {groups:?} here")]
    NoMachineForActivity { groups: Vec<String> },
    #[error("too far from activity {activity:?}")]
    TooFarFromActivity { activity: Entity },
    #[error("too few participants: {workers} of {min}")]
    TooFewParticipants { workers: u32, min: u32 },
    #[error("too many participants: {workers} of {max}")]
    TooManyParticipants { workers: u32, max: u32 },
    #[error("{skill} skill {level} is below {required}")]
    TooLowSkill {
        skill: String,
        level: u32,
        required: u32,
    },
    #[error("activity not possible in a {location_type}")]
    InvalidLocationType { location_type: String },
    #[error("activity not possible on {terrain_type:?}")]
    InvalidTerrainType { terrain_type: Option<String> },
    #[error("activity {activity:?} is too far away")]
    ActivityTargetTooFarAway { activity: Entity },
    #[error("entity {entity:?} is too far away")]
    EntityTooFarAway { entity: Entity },
    #[error("invalid amount {amount}")]
    InvalidAmount { amount: u32 },
    #[error("entity {entity:?} is not in inventory")]
    EntityNotInInventory { entity: Entity },
}

impl ActionError {
    /// Stable snake_case tag used for notifications and hooks.
    pub fn tag(&self) -> &'static str {
        match self {
            ActionError::NoInputMaterial { .. } => "no_input_material",
            ActionError::NoToolForActivity { .. } => "no_tool_for_activity",
            ActionError::NoMachineForActivity { .. } => "no_machine_for_activity",
            ActionError::TooFarFromActivity { .. } => "too_far_from_activity",
            ActionError::TooFewParticipants { .. } => "too_few_participants",
            ActionError::TooManyParticipants { .. } => "too_many_participants",
            ActionError::TooLowSkill { .. } => "too_low_skill",
            ActionError::InvalidLocationType { .. } => "invalid_location_type",
            ActionError::InvalidTerrainType { .. } => "invalid_terrain_type",
            ActionError::ActivityTargetTooFarAway { .. } => "activity_target_too_far_away",
            ActionError::EntityTooFarAway { .. } => "entity_too_far_away",
            ActionError::InvalidAmount { .. } => "invalid_amount",
            ActionError::EntityNotInInventory { .. } => "entity_not_in_inventory",
        }
    }

    /// Parameters for rendering the failure to the player.
    pub fn params(&self) -> Value {
        match self {
            ActionError::NoInputMaterial { item_type, missing } => {
                json!({ "item_type": item_type, "missing": missing })
            }
            ActionError::NoToolForActivity { group } => json!({ "group": group }),
            ActionError::NoMachineForActivity { groups } => json!({ "groups": groups }),
            ActionError::TooFarFromActivity { activity }
            | ActionError::ActivityTargetTooFarAway { activity } => {
                json!({ "activity": entity_bits(*activity) })
            }
            ActionError::TooFewParticipants { workers, min } => {
                json!({ "workers": workers, "min": min })
            }
            ActionError::TooManyParticipants { workers, max } => {
                json!({ "workers": workers, "max": max })
            }
            ActionError::TooLowSkill {
                skill,
                level,
                required,
            } => json!({ "skill": skill, "level": level, "required": required }),
            ActionError::InvalidLocationType { location_type } => {
                json!({ "location_type": location_type })
            }
            ActionError::InvalidTerrainType { terrain_type } => {
                json!({ "terrain_type": terrain_type })
            }
            ActionError::EntityTooFarAway { entity } | ActionError::EntityNotInInventory { entity } => {
                json!({ "entity": entity_bits(*entity) })
            }
            ActionError::InvalidAmount { amount } => json!({ "amount": amount }),
        }
    }
}

/// Structural errors: the world graph is inconsistent or an entity is of the
/// wrong kind for the requested operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    #[error("no such entity {0:?}")]
    NoSuchEntity(Entity),
    #[error("{0:?} is not a location")]
    NotALocation(Entity),
    #[error("{0:?} is not a character")]
    NotACharacter(Entity),
    #[error("{0:?} is not an item")]
    NotAnItem(Entity),
    #[error("{0:?} is not an activity")]
    NotAnActivity(Entity),
    #[error("{0:?} is not a passage")]
    NotAPassage(Entity),
    #[error("{0:?} is not inside any location")]
    NoLocation(Entity),
    #[error("moving {entity:?} into {container:?} would make it its own ancestor")]
    ContainmentCycle { entity: Entity, container: Entity },
    #[error("a passage cannot connect {0:?} to itself")]
    SelfPassage(Entity),
    #[error("map position ({x}, {y}) is not finite")]
    InvalidPosition { x: f64, y: f64 },
}

/// Failure to commit a transaction scope.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("transaction commit failed: {0}")]
pub struct TransactionError(pub String);

/// Errors from a player command: either the player's fault, or a
/// structural/registry problem.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error(transparent)]
    Deferred(#[from] DeferredError),
}

impl CommandError {
    /// The user-attributable part, if that is what went wrong.
    pub fn action(&self) -> Option<&ActionError> {
        match self {
            CommandError::Action(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors that abort a whole engine operation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    World(#[from] WorldError),
    #[error(transparent)]
    Deferred(#[from] DeferredError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Save(#[from] crate::persistence::SaveError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_unique() {
        let mut world = hecs::World::new();
        let e = world.spawn(());
        let all = vec![
            ActionError::NoInputMaterial {
                item_type: "plank".into(),
                missing: 2,
            },
            ActionError::NoToolForActivity { group: "saw".into() },
            ActionError::NoMachineForActivity { groups: vec![] },
            ActionError::TooFarFromActivity { activity: e },
            ActionError::TooFewParticipants { workers: 1, min: 2 },
            ActionError::TooManyParticipants { workers: 3, max: 2 },
            ActionError::TooLowSkill {
                skill: "carpentry".into(),
                level: 1,
                required: 3,
            },
            ActionError::InvalidLocationType {
                location_type: "room".into(),
            },
            ActionError::InvalidTerrainType { terrain_type: None },
            ActionError::ActivityTargetTooFarAway { activity: e },
            ActionError::EntityTooFarAway { entity: e },
            ActionError::InvalidAmount { amount: 0 },
            ActionError::EntityNotInInventory { entity: e },
        ];
        let tags: std::collections::HashSet<_> = all.iter().map(ActionError::tag).collect();
        assert_eq!(tags.len(), 13);
    }

    #[test]
    fn test_params_carry_fields() {
        let err = ActionError::NoInputMaterial {
            item_type: "plank".into(),
            missing: 2,
        };
        assert_eq!(err.params(), json!({"item_type": "plank", "missing": 2}));
        assert_eq!(err.to_string(), "no plank left to use (2 still needed)");
    }

    #[test]
    fn test_command_error_exposes_action() {
        let err: CommandError = ActionError::InvalidAmount { amount: 0 }.into();
        assert_eq!(err.action().map(ActionError::tag), Some("invalid_amount"));
        let err: CommandError = WorldError::SelfPassage(hecs::World::new().spawn(())).into();
        assert!(err.action().is_none());
    }
}
