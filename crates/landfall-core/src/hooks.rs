//! Fire-and-forget callbacks for the transport layer.

use hecs::Entity;
use serde_json::Value;

use crate::systems::{Event, EventObserver};

type EventHook = Box<dyn FnMut(&EventObserver, &Event)>;
type FailureHook = Box<dyn FnMut(Entity, &str, &Value)>;

/// Registered listeners. Hooks run after the triggering write has committed.
#[derive(Default)]
pub struct HookRegistry {
    event_hooks: Vec<EventHook>,
    failure_hooks: Vec<FailureHook>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once per created observer record.
    pub fn on_event(&mut self, hook: impl FnMut(&EventObserver, &Event) + 'static) {
        self.event_hooks.push(Box::new(hook));
    }

    /// Called once per responsible character when an activity tick fails.
    pub fn on_activity_failure(&mut self, hook: impl FnMut(Entity, &str, &Value) + 'static) {
        self.failure_hooks.push(Box::new(hook));
    }

    pub(crate) fn fire_event(&mut self, observer: &EventObserver, event: &Event) {
        for hook in &mut self.event_hooks {
            hook(observer, event);
        }
    }

    pub(crate) fn fire_failure(&mut self, character: Entity, tag: &str, params: &Value) {
        for hook in &mut self.failure_hooks {
            hook(character, tag, params);
        }
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("event_hooks", &self.event_hooks.len())
            .field("failure_hooks", &self.failure_hooks.len())
            .finish()
    }
}
