//! Long-running activities and the recipes that create them.

use std::collections::{BTreeMap, BTreeSet};

use hecs::Entity;
use serde::{Deserialize, Serialize};

use landfall_logic::deferred::DeferredCall;

use crate::range::Range;

/// Minimum level in one skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub skill: String,
    pub level: u32,
}

/// What an activity needs in order to make progress. Every category is
/// optional; an empty collection means "no constraint".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirements {
    /// Item type → amount still to be contributed.
    pub inputs: BTreeMap<String, u32>,
    /// Machine groups; one machine serving any of them must be present.
    pub machines: BTreeSet<String>,
    /// Tool groups every worker must hold a tool for.
    pub mandatory_tools: BTreeSet<String>,
    /// Tool group → rate bonus per unit of tool score.
    pub optional_tools: BTreeMap<String, f64>,
    pub skill: Option<SkillRequirement>,
    pub location_types: BTreeSet<String>,
    pub terrain_types: BTreeSet<String>,
    pub min_workers: u32,
    pub max_workers: Option<u32>,
    /// How near a worker must be. `None` uses the world default.
    pub proximity: Option<Range>,
}

impl Default for Requirements {
    fn default() -> Self {
        Self {
            inputs: BTreeMap::new(),
            machines: BTreeSet::new(),
            mandatory_tools: BTreeSet::new(),
            optional_tools: BTreeMap::new(),
            skill: None,
            location_types: BTreeSet::new(),
            terrain_types: BTreeSet::new(),
            min_workers: 1,
            max_workers: None,
            proximity: None,
        }
    }
}

/// An in-progress task. Lives inside the location it is performed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    pub requirements: Requirements,
    /// Counts down to 0; never negative.
    pub ticks_left: f64,
    pub ticks_needed: f64,
    pub quality_sum: f64,
    pub quality_ticks: f64,
    /// Run in order once `ticks_left` reaches 0.
    pub result_actions: Vec<DeferredCall>,
    #[serde(with = "crate::serde_helpers::option_entity")]
    pub initiator: Option<Entity>,
}

impl Activity {
    /// Mean tool score over all scored ticks, or 1.0 when nothing was scored.
    pub fn quality(&self) -> f64 {
        if self.quality_ticks > 0.0 {
            self.quality_sum / self.quality_ticks
        } else {
            1.0
        }
    }

    pub fn is_complete(&self) -> bool {
        self.ticks_left <= 0.0
    }

    /// Fraction done, 0.0 to 1.0.
    pub fn progress(&self) -> f64 {
        if self.ticks_needed <= 0.0 {
            return 1.0;
        }
        (1.0 - self.ticks_left / self.ticks_needed).clamp(0.0, 1.0)
    }
}

/// Template an activity is instantiated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub requirements: Requirements,
    pub ticks_needed: u32,
    #[serde(default)]
    pub result_actions: Vec<DeferredCall>,
}

impl Recipe {
    pub fn new(name: impl Into<String>, ticks_needed: u32) -> Self {
        Self {
            name: name.into(),
            requirements: Requirements::default(),
            ticks_needed,
            result_actions: Vec::new(),
        }
    }

    pub fn with_requirements(mut self, requirements: Requirements) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_result(mut self, action: DeferredCall) -> Self {
        self.result_actions.push(action);
        self
    }

    pub fn instantiate(&self, initiator: Option<Entity>) -> Activity {
        Activity {
            name: self.name.clone(),
            requirements: self.requirements.clone(),
            ticks_left: self.ticks_needed as f64,
            ticks_needed: self.ticks_needed as f64,
            quality_sum: 0.0,
            quality_ticks: 0.0,
            result_actions: self.result_actions.clone(),
            initiator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_defaults_to_one() {
        let activity = Recipe::new("whittle", 3).instantiate(None);
        assert_eq!(activity.quality(), 1.0);
        assert_eq!(activity.ticks_left, 3.0);
        assert_eq!(activity.progress(), 0.0);
        assert!(!activity.is_complete());
    }

    #[test]
    fn test_quality_is_mean() {
        let mut activity = Recipe::new("whittle", 3).instantiate(None);
        activity.quality_sum = 3.0;
        activity.quality_ticks = 2.0;
        assert_eq!(activity.quality(), 1.5);
    }

    #[test]
    fn test_default_requirements_need_one_worker() {
        let req = Requirements::default();
        assert_eq!(req.min_workers, 1);
        assert!(req.proximity.is_none());
    }
}
