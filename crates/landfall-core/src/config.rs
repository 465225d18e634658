//! World configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use landfall_logic::constants::layers;
use landfall_logic::geography::MapBounds;
use landfall_logic::traversal::TerrainCost;

use crate::range::Range;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for one world. Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub map: MapBounds,
    /// Cost of ground no terrain area covers. `None` = free travel.
    pub uncovered_terrain_cost: Option<TerrainCost>,
    /// Cost layer consulted by traversability ranges.
    pub traversability_layer: String,
    /// Store a notification for the responsible worker when an activity
    /// tick fails.
    pub notify_failures: bool,
    /// Range a worker must be within when an activity sets no proximity.
    pub default_proximity: Range,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            map: MapBounds::default(),
            uncovered_terrain_cost: None,
            traversability_layer: layers::LAND_TRAVERSABILITY.to_string(),
            notify_failures: true,
            default_proximity: Range::SameLocation,
        }
    }
}

impl WorldConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let MapBounds { width, height } = self.map;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "map must have positive finite size, got {width}x{height}"
            )));
        }
        if let Some(cost) = self.uncovered_terrain_cost {
            if !(cost.multiplier.is_finite() && cost.ease.is_finite()) {
                return Err(ConfigError::Invalid("uncovered terrain cost must be finite".into()));
            }
        }
        if self.traversability_layer.is_empty() {
            return Err(ConfigError::Invalid("traversability layer name is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = WorldConfig::from_json_str("{}").unwrap();
        assert_eq!(config, WorldConfig::default());
        assert_eq!(config.map.width, 6000.0);
    }

    #[test]
    fn test_partial_override() {
        let config = WorldConfig::from_json_str(
            r#"{"map": {"width": 100.0, "height": 50.0},
                "uncovered_terrain_cost": {"multiplier": 0.5, "ease": 1.0},
                "default_proximity": {"neighbouring": {"only_through_unlimited": true}}}"#,
        )
        .unwrap();
        assert_eq!(config.map, MapBounds::new(100.0, 50.0));
        assert_eq!(config.uncovered_terrain_cost, Some(TerrainCost::new(0.5, 1.0)));
        assert_eq!(
            config.default_proximity,
            Range::Neighbouring {
                only_through_unlimited: true
            }
        );
        assert!(config.notify_failures);
    }

    #[test]
    fn test_rejects_bad_map() {
        let err = WorldConfig::from_json_str(r#"{"map": {"width": 0.0, "height": 50.0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = WorldConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
