//! Event fan-out: one occurrence, one tailored view per audience role.
//!
//! `stage_event` builds the full set of rows for an occurrence without
//! touching the log; the caller applies the batch with [`EventLog::commit`]
//! once its transaction has committed. A batch is never partially applied.
//!
//! | Role | Tag | Extra groups |
//! |------|-----|--------------|
//! | actor | `{base}_doer` | `target` |
//! | target | `{base}_target` | `doer` |
//! | each bystander | `{base}_observer` (one shared event) | `doer`, `target` |

use std::collections::{BTreeMap, BTreeSet};

use hecs::Entity;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::range::Range;
use crate::world::WorldState;

/// Event parameter before rendering. Entities are replaced by their display
/// representation when the event is staged.
#[derive(Debug, Clone, PartialEq)]
pub enum EventValue {
    Json(Value),
    Entity(Entity),
    Map(BTreeMap<String, EventValue>),
    List(Vec<EventValue>),
}

pub type EventParams = BTreeMap<String, EventValue>;

impl EventValue {
    pub fn render(&self, world: &WorldState) -> Value {
        match self {
            EventValue::Json(v) => v.clone(),
            EventValue::Entity(e) => world.describe(*e),
            EventValue::Map(m) => render_params(m, world),
            EventValue::List(items) => Value::Array(items.iter().map(|v| v.render(world)).collect()),
        }
    }
}

impl From<Entity> for EventValue {
    fn from(e: Entity) -> Self {
        EventValue::Entity(e)
    }
}

impl From<Value> for EventValue {
    fn from(v: Value) -> Self {
        EventValue::Json(v)
    }
}

impl From<&str> for EventValue {
    fn from(s: &str) -> Self {
        EventValue::Json(Value::from(s))
    }
}

impl From<i64> for EventValue {
    fn from(n: i64) -> Self {
        EventValue::Json(Value::from(n))
    }
}

impl From<EventParams> for EventValue {
    fn from(m: EventParams) -> Self {
        EventValue::Map(m)
    }
}

fn render_params(params: &EventParams, world: &WorldState) -> Value {
    Value::Object(
        params
            .iter()
            .map(|(k, v)| (k.clone(), v.render(world)))
            .collect::<Map<String, Value>>(),
    )
}

/// An immutable occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub tag: String,
    #[serde(with = "crate::serde_helpers::json_text")]
    pub params: Value,
}

/// Delivery of one event to one observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventObserver {
    pub id: u64,
    pub event_id: u64,
    #[serde(with = "crate::serde_helpers::entity")]
    pub observer: Entity,
}

/// Rows for one occurrence, not yet visible to readers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventBatch {
    pub events: Vec<Event>,
    pub observers: Vec<EventObserver>,
}

impl EventBatch {
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
    observers: Vec<EventObserver>,
    next_event_id: u64,
    next_observer_id: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every row for an occurrence. Any of `actor`, `target` and
    /// `range` may be absent; each absent one only drops its own rows.
    pub fn stage_event(
        &self,
        world: &WorldState,
        tag_base: &str,
        range: Option<&Range>,
        params: &EventParams,
        actor: Option<Entity>,
        target: Option<Entity>,
    ) -> EventBatch {
        let base = render_params(params, world);
        let doer_view = actor.map(|a| world.describe(a));
        let target_view = target.map(|t| world.describe(t));

        let mut batch = EventBatch::default();
        let mut next_event = self.next_event_id;
        let mut next_observer = self.next_observer_id;
        let mut emit = |batch: &mut EventBatch, suffix: &str, params: Value, audience: &[Entity]| {
            let event_id = next_event;
            next_event += 1;
            batch.events.push(Event {
                id: event_id,
                tag: format!("{tag_base}_{suffix}"),
                params,
            });
            for observer in audience {
                batch.observers.push(EventObserver {
                    id: next_observer,
                    event_id,
                    observer: *observer,
                });
                next_observer += 1;
            }
        };

        if let Some(actor) = actor {
            let params = with_groups(&base, &[("target", target_view.as_ref())]);
            emit(&mut batch, "doer", params, &[actor]);
        }
        if let Some(target) = target {
            let params = with_groups(&base, &[("doer", doer_view.as_ref())]);
            emit(&mut batch, "target", params, &[target]);
        }
        if let Some(range) = range {
            let mut audience = BTreeSet::new();
            for subject in actor.iter().chain(target.iter()) {
                audience.extend(range.characters_near(world, *subject));
            }
            for subject in actor.iter().chain(target.iter()) {
                audience.remove(subject);
            }
            if !audience.is_empty() {
                let params = with_groups(
                    &base,
                    &[("doer", doer_view.as_ref()), ("target", target_view.as_ref())],
                );
                let audience: Vec<Entity> = audience.into_iter().collect();
                emit(&mut batch, "observer", params, &audience);
            }
        }
        batch
    }

    /// Apply a staged batch. Ids continue from the batch's last row.
    pub fn commit(&mut self, batch: EventBatch) {
        if let Some(last) = batch.events.last() {
            self.next_event_id = self.next_event_id.max(last.id + 1);
        }
        if let Some(last) = batch.observers.last() {
            self.next_observer_id = self.next_observer_id.max(last.id + 1);
        }
        self.events.extend(batch.events);
        self.observers.extend(batch.observers);
    }

    pub fn event(&self, id: u64) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn observers(&self) -> &[EventObserver] {
        &self.observers
    }

    /// Everything `character` has observed, oldest first.
    pub fn seen_by(&self, character: Entity) -> Vec<(&EventObserver, &Event)> {
        self.observers
            .iter()
            .filter(|o| o.observer == character)
            .filter_map(|o| Some((o, self.event(o.event_id)?)))
            .collect()
    }
}

fn with_groups(base: &Value, groups: &[(&str, Option<&Value>)]) -> Value {
    let mut params = base.clone();
    if let Value::Object(map) = &mut params {
        for (name, view) in groups {
            if let Some(view) = view {
                map.insert(name.to_string(), (*view).clone());
            }
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use landfall_logic::geography::{MapBounds, Point};
    use serde_json::json;

    fn world() -> WorldState {
        WorldState::new(WorldConfig {
            map: MapBounds::new(100.0, 100.0),
            ..Default::default()
        })
    }

    #[test]
    fn test_entities_render_recursively() {
        let mut w = world();
        let root = w.spawn_root_location("outside", "square", Point::new(1.0, 1.0)).unwrap();
        let ann = w.spawn_character("Ann", root).unwrap();
        let mut inner = EventParams::new();
        inner.insert("who".into(), ann.into());
        let value = EventValue::List(vec![EventValue::Map(inner), "plain".into()]);
        let rendered = value.render(&w);
        assert_eq!(rendered[0]["who"]["name"], "Ann");
        assert_eq!(rendered[0]["who"]["kind"], "character");
        assert_eq!(rendered[1], "plain");
    }

    #[test]
    fn test_actor_only() {
        let mut w = world();
        let root = w.spawn_root_location("outside", "square", Point::new(1.0, 1.0)).unwrap();
        let ann = w.spawn_character("Ann", root).unwrap();
        let _bob = w.spawn_character("Bob", root).unwrap();
        let log = EventLog::new();
        let mut params = EventParams::new();
        params.insert("what".into(), json!("sneezes").into());

        let batch = log.stage_event(&w, "sneeze", None, &params, Some(ann), None);
        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.events[0].tag, "sneeze_doer");
        assert_eq!(batch.events[0].params, json!({"what": "sneezes"}));
        assert_eq!(batch.observers.len(), 1);
    }

    #[test]
    fn test_no_observer_event_for_empty_audience() {
        let mut w = world();
        let root = w.spawn_root_location("outside", "square", Point::new(1.0, 1.0)).unwrap();
        let ann = w.spawn_character("Ann", root).unwrap();
        let log = EventLog::new();
        let batch = log.stage_event(&w, "wave", Some(&Range::SameLocation), &EventParams::new(), Some(ann), None);
        assert_eq!(batch.events.len(), 1);
    }

    #[test]
    fn test_range_without_actor_or_target_is_empty() {
        let w = world();
        let log = EventLog::new();
        let batch = log.stage_event(&w, "thunder", Some(&Range::SameLocation), &EventParams::new(), None, None);
        assert!(batch.is_empty());
        assert!(batch.events.is_empty());
    }

    #[test]
    fn test_commit_advances_ids() {
        let mut w = world();
        let root = w.spawn_root_location("outside", "square", Point::new(1.0, 1.0)).unwrap();
        let ann = w.spawn_character("Ann", root).unwrap();
        let bob = w.spawn_character("Bob", root).unwrap();
        let mut log = EventLog::new();

        let first = log.stage_event(&w, "greet", None, &EventParams::new(), Some(ann), Some(bob));
        log.commit(first);
        let second = log.stage_event(&w, "greet", None, &EventParams::new(), Some(bob), Some(ann));
        assert_eq!(second.events[0].id, 2);
        assert_eq!(second.observers[0].id, 2);
        log.commit(second);

        assert_eq!(log.events().len(), 4);
        let seen: Vec<&str> = log.seen_by(bob).iter().map(|(_, e)| e.tag.as_str()).collect();
        assert_eq!(seen, vec!["greet_target", "greet_doer"]);
    }
}
