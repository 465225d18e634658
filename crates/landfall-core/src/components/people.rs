//! Characters, items, skills and capability tags.

use std::collections::{BTreeMap, BTreeSet};

use hecs::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use landfall_logic::constants::capability_tags;

/// Marker component identifying an entity as a character
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character;

/// A physical item. Stackable items carry an `amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub item_type: String,
    /// 0.0 (junk) to 1.0 (masterwork), but higher values are allowed.
    pub quality: f64,
    pub amount: u32,
}

impl Item {
    pub fn new(item_type: impl Into<String>, quality: f64, amount: u32) -> Self {
        Self {
            item_type: item_type.into(),
            quality,
            amount,
        }
    }
}

/// Skill levels by skill name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    pub levels: BTreeMap<String, u32>,
}

impl Skills {
    pub fn level(&self, skill: &str) -> u32 {
        self.levels.get(skill).copied().unwrap_or(0)
    }

    pub fn set(&mut self, skill: &str, level: u32) {
        self.levels.insert(skill.to_string(), level);
    }
}

/// Assignment of a character to an activity. A character works on at most
/// one activity at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorksOn {
    #[serde(with = "crate::serde_helpers::entity")]
    pub activity: Entity,
}

/// Capability tags with free-form parameters, e.g.
/// `"tool" → {"woodworking": 1.5}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(with = "crate::serde_helpers::json_text")]
    pub tags: BTreeMap<String, Value>,
}

impl Capabilities {
    pub fn with(mut self, tag: &str, params: Value) -> Self {
        self.tags.insert(tag.to_string(), params);
        self
    }

    pub fn has(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    pub fn params(&self, tag: &str) -> Option<&Value> {
        self.tags.get(tag)
    }

    /// Typed view of one capability, if present and well-formed.
    pub fn view<C: Capability>(&self) -> Option<C> {
        self.params(C::TAG).and_then(C::from_params)
    }
}

/// A typed adapter over one capability tag's parameters.
pub trait Capability: Sized {
    const TAG: &'static str;

    fn from_params(params: &Value) -> Option<Self>;
}

/// Item usable as a tool. Params: `{group: efficiency}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCapability {
    pub groups: BTreeMap<String, f64>,
}

impl ToolCapability {
    pub fn efficiency(&self, group: &str) -> Option<f64> {
        self.groups.get(group).copied()
    }

    pub fn params(groups: &[(&str, f64)]) -> Value {
        Value::Object(
            groups
                .iter()
                .map(|(group, efficiency)| (group.to_string(), Value::from(*efficiency)))
                .collect(),
        )
    }
}

impl Capability for ToolCapability {
    const TAG: &'static str = capability_tags::TOOL;

    fn from_params(params: &Value) -> Option<Self> {
        let object = params.as_object()?;
        let mut groups = BTreeMap::new();
        for (group, efficiency) in object {
            groups.insert(group.clone(), efficiency.as_f64()?);
        }
        Some(Self { groups })
    }
}

/// Entity usable as a machine. Params: `[group, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineCapability {
    pub groups: BTreeSet<String>,
}

impl MachineCapability {
    pub fn serves_any(&self, wanted: &BTreeSet<String>) -> bool {
        !self.groups.is_disjoint(wanted)
    }

    pub fn params(groups: &[&str]) -> Value {
        Value::Array(groups.iter().map(|g| Value::from(*g)).collect())
    }
}

impl Capability for MachineCapability {
    const TAG: &'static str = capability_tags::MACHINE;

    fn from_params(params: &Value) -> Option<Self> {
        let groups = params
            .as_array()?
            .iter()
            .map(|g| g.as_str().map(str::to_string))
            .collect::<Option<BTreeSet<_>>>()?;
        Some(Self { groups })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_view() {
        let caps = Capabilities::default().with("tool", ToolCapability::params(&[("woodworking", 1.5)]));
        assert!(caps.has("tool"));
        let tool = caps.view::<ToolCapability>().unwrap();
        assert_eq!(tool.efficiency("woodworking"), Some(1.5));
        assert_eq!(tool.efficiency("smithing"), None);
        assert!(caps.view::<MachineCapability>().is_none());
    }

    #[test]
    fn test_malformed_params_give_no_view() {
        let caps = Capabilities::default()
            .with("tool", json!({"woodworking": "fast"}))
            .with("machine", json!(["workbench", 3]));
        assert!(caps.view::<ToolCapability>().is_none());
        assert!(caps.view::<MachineCapability>().is_none());
    }

    #[test]
    fn test_machine_serves_any() {
        let caps = Capabilities::default().with("machine", MachineCapability::params(&["workbench", "anvil"]));
        let machine = caps.view::<MachineCapability>().unwrap();
        let wanted: BTreeSet<String> = ["anvil".to_string()].into();
        assert!(machine.serves_any(&wanted));
        assert!(!machine.serves_any(&BTreeSet::new()));
    }

    #[test]
    fn test_skills_default_zero() {
        let mut skills = Skills::default();
        assert_eq!(skills.level("carpentry"), 0);
        skills.set("carpentry", 3);
        assert_eq!(skills.level("carpentry"), 3);
    }
}
