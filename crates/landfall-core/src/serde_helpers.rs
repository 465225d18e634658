//! `#[serde(with = ...)]` adapters for fields bincode can't carry directly.
//!
//! `hecs::Entity` has no serde impls, so handles travel as their 64-bit
//! form and are restored with `Entity::from_bits`. Free-form JSON
//! (`serde_json::Value`) needs a self-describing format to deserialize, so
//! it is stored as JSON text.

use hecs::Entity;

pub fn entity_from_bits(bits: u64) -> Option<Entity> {
    Entity::from_bits(bits)
}

pub fn entity_bits(entity: Entity) -> u64 {
    entity.to_bits().get()
}

pub mod entity {
    use super::{entity_bits, entity_from_bits};
    use hecs::Entity;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(entity: &Entity, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(entity_bits(*entity))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Entity, D::Error> {
        let bits = u64::deserialize(deserializer)?;
        entity_from_bits(bits).ok_or_else(|| D::Error::custom(format!("invalid entity handle {bits}")))
    }
}

pub mod option_entity {
    use super::{entity_bits, entity_from_bits};
    use hecs::Entity;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(entity: &Option<Entity>, serializer: S) -> Result<S::Ok, S::Error> {
        entity.map(entity_bits).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Entity>, D::Error> {
        match Option::<u64>::deserialize(deserializer)? {
            None => Ok(None),
            Some(bits) => entity_from_bits(bits)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid entity handle {bits}"))),
        }
    }
}

/// Any serde value stored as a JSON string.
pub mod json_text {
    use serde::de::{DeserializeOwned, Error as _};
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T: Serialize, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        let text = serde_json::to_string(value).map_err(S::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, T: DeserializeOwned, D: Deserializer<'de>>(deserializer: D) -> Result<T, D::Error> {
        let text = String::deserialize(deserializer)?;
        serde_json::from_str(&text).map_err(D::Error::custom)
    }
}
