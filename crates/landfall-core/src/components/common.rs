//! Components shared by every kind of entity.

use hecs::Entity;
use serde::{Deserialize, Serialize};

/// Containment link. Every entity except root locations, passages and
/// terrain areas is inside exactly one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainedIn {
    #[serde(with = "crate::serde_helpers::entity")]
    pub container: Entity,
}

impl ContainedIn {
    pub fn new(container: Entity) -> Self {
        Self { container }
    }
}

/// Display name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
