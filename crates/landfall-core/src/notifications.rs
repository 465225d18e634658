//! Stored per-character notifications for failed activity ticks.

use hecs::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ActionError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(with = "crate::serde_helpers::entity")]
    pub character: Entity,
    pub tag: String,
    #[serde(with = "crate::serde_helpers::json_text")]
    pub params: Value,
    pub tick: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationLog {
    entries: Vec<Notification>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, character: Entity, error: &ActionError, tick: u64) -> &Notification {
        self.entries.push(Notification {
            character,
            tag: error.tag().to_string(),
            params: error.params(),
            tick,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn all(&self) -> &[Notification] {
        &self.entries
    }

    pub fn for_character(&self, character: Entity) -> impl Iterator<Item = &Notification> {
        self.entries.iter().filter(move |n| n.character == character)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_filter() {
        let mut world = hecs::World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let mut log = NotificationLog::new();
        log.push(a, &ActionError::NoToolForActivity { group: "saw".into() }, 3);
        log.push(b, &ActionError::TooFewParticipants { workers: 1, min: 2 }, 3);

        assert_eq!(log.len(), 2);
        let mine: Vec<_> = log.for_character(a).collect();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].tag, "no_tool_for_activity");
        assert_eq!(mine[0].params["group"], "saw");
        assert_eq!(mine[0].tick, 3);
    }
}
