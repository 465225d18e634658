//! Simulation engine - owns the world and runs the activity scheduler

use std::io::{Read, Write};

use hecs::Entity;
use log::{info, warn};

use landfall_logic::deferred::{CallArg, CallRegistry, DeferredError, PreparedCall};

use crate::components::{Activity, Recipe};
use crate::config::WorldConfig;
use crate::error::{CommandError, EngineError};
use crate::generation::{generate_settlement, Settlement, SettlementConfig};
use crate::hooks::HookRegistry;
use crate::notifications::NotificationLog;
use crate::persistence::{load_simulation, save_simulation, SaveError, WorldSnapshot};
use crate::range::Range;
use crate::serde_helpers::entity_bits;
use crate::systems::*;
use crate::transaction::{InMemoryScope, TransactionScope};
use crate::world::WorldState;

/// What one scheduler pass did to each activity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub advanced: Vec<Entity>,
    pub failed: Vec<Entity>,
    pub completed: Vec<Entity>,
    pub idle: Vec<Entity>,
}

/// Main simulation engine
pub struct Engine {
    pub world: WorldState,
    pub events: EventLog,
    pub notifications: NotificationLog,
    pub registry: CallRegistry<WorldState>,
    pub hooks: HookRegistry,
    transaction: Box<dyn TransactionScope>,
    tick: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl Engine {
    /// Create an empty world with the built-in result actions registered.
    pub fn new(config: WorldConfig) -> Self {
        let mut registry = CallRegistry::new();
        register_builtin_actions(&mut registry);
        Self {
            world: WorldState::new(config),
            events: EventLog::new(),
            notifications: NotificationLog::new(),
            registry,
            hooks: HookRegistry::new(),
            transaction: Box::new(InMemoryScope::new()),
            tick: 0,
        }
    }

    /// Use `scope` for every transaction boundary from now on.
    pub fn with_transaction(mut self, scope: impl TransactionScope + 'static) -> Self {
        self.transaction = Box::new(scope);
        self
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Populate the world with a generated settlement.
    pub fn generate(&mut self, config: &SettlementConfig) -> Result<Settlement, EngineError> {
        Ok(generate_settlement(&mut self.world, config)?)
    }

    // ── Scheduler ─────────────────────────────────────────────────────

    /// Run one scheduler pass over every pending activity.
    ///
    /// A failed requirement check only affects its own activity. Structural
    /// errors and unresolvable result actions abort the pass.
    pub fn tick(&mut self) -> Result<TickReport, EngineError> {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..Default::default()
        };

        for activity in pending_activities(&self.world) {
            // An earlier completion may have removed it
            if !self.world.exists(activity) {
                continue;
            }
            self.tick_activity(activity, &mut report)?;
        }
        Ok(report)
    }

    fn tick_activity(&mut self, activity: Entity, report: &mut TickReport) -> Result<(), EngineError> {
        self.transaction.begin();
        let outcome = match check_activity(&self.world, activity) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.transaction.rollback();
                return Err(e.into());
            }
        };

        match outcome {
            TickOutcome::Idle => {
                self.transaction.rollback();
                report.idle.push(activity);
            }
            TickOutcome::Failed(failure) => {
                self.transaction.rollback();
                self.report_failure(activity, &failure);
                report.failed.push(activity);
            }
            TickOutcome::Advanced(next) if next.is_complete() => {
                self.complete_activity(activity, next, report)?;
            }
            TickOutcome::Advanced(next) => {
                if let Err(e) = self.transaction.commit() {
                    self.transaction.rollback();
                    return Err(e.into());
                }
                self.world.set_activity(activity, next)?;
                report.advanced.push(activity);
            }
        }
        Ok(())
    }

    fn report_failure(&mut self, activity: Entity, failure: &CheckFailure) {
        warn!(
            "activity {:?} made no progress: {} (workers {:?})",
            activity, failure.error, failure.culprits
        );
        let params = failure.error.params();
        for &culprit in &failure.culprits {
            if self.world.config().notify_failures {
                self.notifications.push(culprit, &failure.error, self.tick);
            }
            self.hooks.fire_failure(culprit, failure.error.tag(), &params);
        }
    }

    /// Apply the final tick, run every result action and remove the
    /// activity, inside the transaction the tick opened.
    ///
    /// All actions are resolved before any runs; an unknown function aborts
    /// the pass. If an action fails while running, the world is restored to
    /// its state before the tick and only this activity is reported failed.
    fn complete_activity(
        &mut self,
        activity: Entity,
        next: Activity,
        report: &mut TickReport,
    ) -> Result<(), EngineError> {
        let prepared = match next
            .result_actions
            .iter()
            .map(|call| self.registry.resolve(call))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(prepared) => prepared,
            Err(e) => {
                self.transaction.rollback();
                return Err(e.into());
            }
        };

        let name = next.name.clone();
        let quality = next.quality();
        let snapshot = WorldSnapshot::capture(&self.world);
        let applied = run_completion(&mut self.world, activity, next, &prepared);
        drop(prepared);

        match applied {
            Ok(()) => {
                if let Err(e) = self.transaction.commit() {
                    self.world = snapshot.restore()?;
                    self.transaction.rollback();
                    return Err(e.into());
                }
            }
            Err(EngineError::Deferred(e)) if !matches!(e, DeferredError::UnknownFunction(_)) => {
                self.world = snapshot.restore()?;
                self.transaction.rollback();
                warn!("activity {:?} ({}) could not complete: {}", activity, name, e);
                report.failed.push(activity);
                return Ok(());
            }
            Err(e) => {
                self.world = snapshot.restore()?;
                self.transaction.rollback();
                return Err(e);
            }
        }

        info!(
            "activity {:?} ({}) completed with quality {:.2}",
            activity, name, quality
        );
        report.advanced.push(activity);
        report.completed.push(activity);
        Ok(())
    }

    // ── Events ────────────────────────────────────────────────────────

    /// Fan an occurrence out to actor, target and the bystanders `range`
    /// finds around them. Returns the observer records created.
    pub fn create_event(
        &mut self,
        tag_base: &str,
        range: Option<&Range>,
        params: &EventParams,
        actor: Option<Entity>,
        target: Option<Entity>,
    ) -> Result<Vec<EventObserver>, EngineError> {
        self.transaction.begin();
        let batch = self
            .events
            .stage_event(&self.world, tag_base, range, params, actor, target);
        if let Err(e) = self.transaction.commit() {
            self.transaction.rollback();
            return Err(e.into());
        }

        let observers = batch.observers.clone();
        let events = batch.events.clone();
        self.events.commit(batch);
        for observer in &observers {
            if let Some(event) = events.iter().find(|e| e.id == observer.event_id) {
                self.hooks.fire_event(observer, event);
            }
        }
        Ok(observers)
    }

    // ── Character commands ────────────────────────────────────────────

    pub fn start_activity(&mut self, recipe: &Recipe, character: Entity) -> Result<Entity, CommandError> {
        start_activity(&mut self.world, &self.registry, recipe, character)
    }

    pub fn join_activity(&mut self, character: Entity, activity: Entity) -> Result<(), CommandError> {
        join_activity(&mut self.world, character, activity)
    }

    pub fn leave_activity(&mut self, character: Entity) -> Result<Option<Entity>, CommandError> {
        leave_activity(&mut self.world, character)
    }

    pub fn contribute_input(
        &mut self,
        character: Entity,
        activity: Entity,
        item: Entity,
        amount: u32,
    ) -> Result<u32, CommandError> {
        contribute_input(&mut self.world, character, activity, item, amount)
    }

    pub fn pick_up(&mut self, character: Entity, item: Entity) -> Result<(), CommandError> {
        pick_up(&mut self.world, character, item)
    }

    // ── Save/Load ─────────────────────────────────────────────────────

    /// Save the simulation to a writer
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        save_simulation(writer, &self.world, &self.events, &self.notifications, self.tick)
    }

    /// Load a simulation from a reader, replacing the current state. The
    /// registry, hooks and transaction scope are kept.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let loaded = load_simulation(reader)?;
        self.world = loaded.world;
        self.events = loaded.events;
        self.notifications = loaded.notifications;
        self.tick = loaded.tick;
        Ok(())
    }
}

/// Store the finished state, invoke the result actions in order with the
/// activity and its initiator as implicit arguments, then despawn the
/// activity together with everything inside it.
fn run_completion(
    world: &mut WorldState,
    activity: Entity,
    finished: Activity,
    prepared: &[PreparedCall<'_, WorldState>],
) -> Result<(), EngineError> {
    let implicit = [
        CallArg::Entity(entity_bits(activity)),
        finished
            .initiator
            .map_or(CallArg::Null, |e| CallArg::Entity(entity_bits(e))),
    ];
    world.set_activity(activity, finished)?;
    for call in prepared {
        call.invoke(world, &implicit)?;
    }
    world.despawn_recursive(activity)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Item, Requirements, ToolCapability};
    use landfall_logic::geography::Point;

    fn engine_with_worker() -> (Engine, Entity, Entity) {
        let mut engine = Engine::default();
        let root = engine
            .world
            .spawn_root_location("outside", "clearing", Point::new(50.0, 50.0))
            .unwrap();
        let worker = engine.world.spawn_character("Worker", root).unwrap();
        (engine, root, worker)
    }

    #[test]
    fn test_reaches_zero_after_exactly_n_ticks() {
        let (mut engine, _, worker) = engine_with_worker();
        let a = engine.start_activity(&Recipe::new("dig", 4), worker).unwrap();
        for _ in 0..3 {
            let report = engine.tick().unwrap();
            assert_eq!(report.advanced, vec![a]);
            assert!(report.completed.is_empty());
        }
        assert_eq!(engine.world.activity(a).unwrap().ticks_left, 1.0);
        let report = engine.tick().unwrap();
        assert_eq!(report.completed, vec![a]);
        assert!(!engine.world.exists(a));
        assert_eq!(engine.current_tick(), 4);
    }

    #[test]
    fn test_failed_tool_check_leaves_ticks_unchanged() {
        let (mut engine, _, worker) = engine_with_worker();
        let recipe = Recipe::new("saw planks", 5).with_requirements(Requirements {
            mandatory_tools: ["woodworking".to_string()].into(),
            ..Default::default()
        });
        let saw = engine.world.spawn_item(Item::new("saw", 1.0, 1), worker).unwrap();
        engine
            .world
            .add_capability(saw, "tool", ToolCapability::params(&[("woodworking", 1.0)]))
            .unwrap();
        let a = engine.start_activity(&recipe, worker).unwrap();

        engine.tick().unwrap();
        let before = engine.world.activity(a).unwrap().ticks_left;
        assert_eq!(before, 4.0);

        // the saw goes missing before tick k
        engine.world.despawn_recursive(saw).unwrap();
        let report = engine.tick().unwrap();
        assert_eq!(report.failed, vec![a]);
        assert_eq!(engine.world.activity(a).unwrap().ticks_left, before);

        let notes: Vec<_> = engine.notifications.for_character(worker).collect();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].tag, "no_tool_for_activity");
        assert_eq!(notes[0].tick, 2);
    }

    #[test]
    fn test_failure_in_one_activity_does_not_stop_others() {
        let (mut engine, root, worker) = engine_with_worker();
        let other = engine.world.spawn_character("Other", root).unwrap();
        let blocked = engine
            .start_activity(
                &Recipe::new("smelt", 3).with_requirements(Requirements {
                    machines: ["furnace".to_string()].into(),
                    ..Default::default()
                }),
                worker,
            )
            .unwrap();
        let fine = engine.start_activity(&Recipe::new("sweep", 3), other).unwrap();

        let report = engine.tick().unwrap();
        assert_eq!(report.failed, vec![blocked]);
        assert_eq!(report.advanced, vec![fine]);
    }

    #[test]
    fn test_result_actions_run_on_completion() {
        let (mut engine, root, worker) = engine_with_worker();
        let recipe = Recipe::new("carve", 1).with_result(landfall_logic::deferred::DeferredCall::new(
            PRODUCE_ITEM,
            vec!["spoon".into(), 3_i64.into()],
        ));
        engine.start_activity(&recipe, worker).unwrap();
        let report = engine.tick().unwrap();
        assert_eq!(report.completed.len(), 1);

        let spoons: Vec<Entity> = engine
            .world
            .contents(root)
            .into_iter()
            .filter(|e| engine.world.item(*e).is_some_and(|i| i.item_type == "spoon"))
            .collect();
        assert_eq!(spoons.len(), 1);
        assert_eq!(engine.world.item(spoons[0]).unwrap().amount, 3);
        // the worker is free again
        assert_eq!(engine.leave_activity(worker).unwrap(), None);
    }

    #[test]
    fn test_unknown_result_action_is_fatal() {
        let (mut engine, _, worker) = engine_with_worker();
        let a = engine.start_activity(&Recipe::new("vanish", 1), worker).unwrap();
        let mut state = engine.world.activity(a).unwrap();
        state
            .result_actions
            .push(landfall_logic::deferred::DeferredCall::new("not_registered", vec![]));
        engine.world.set_activity(a, state).unwrap();

        assert!(matches!(engine.tick(), Err(EngineError::Deferred(_))));
        // nothing ran and the activity is still there
        assert!(engine.world.exists(a));
        assert_eq!(engine.world.activity(a).unwrap().ticks_left, 1.0);
    }

    fn bowl_count(engine: &Engine) -> usize {
        engine
            .world
            .ecs()
            .query::<&Item>()
            .iter()
            .filter(|(_, item)| item.item_type == "bowl")
            .count()
    }

    #[test]
    fn test_failed_result_action_undoes_earlier_actions() {
        let (mut engine, root, turner) = engine_with_worker();
        let helper = engine.world.spawn_character("Helper", root).unwrap();
        let sweeper = engine.world.spawn_character("Sweeper", root).unwrap();
        let recipe = Recipe::new("turn bowl", 1).with_result(landfall_logic::deferred::DeferredCall::new(
            INTO_INVENTORY,
            vec![landfall_logic::deferred::DeferredCall::new(
                PRODUCE_ITEM,
                vec!["bowl".into(), 1_i64.into()],
            )
            .into()],
        ));
        let bowl_job = engine.start_activity(&recipe, turner).unwrap();
        engine.join_activity(helper, bowl_job).unwrap();
        let sweep = engine.start_activity(&Recipe::new("sweep", 3), sweeper).unwrap();

        // the initiator is gone, so the bowl has nowhere to go
        engine.world.despawn_recursive(turner).unwrap();

        for tick in 1..=3 {
            let report = engine.tick().unwrap();
            assert_eq!(report.failed, vec![bowl_job]);
            assert_eq!(bowl_count(&engine), 0);
            assert_eq!(engine.world.activity(bowl_job).unwrap().ticks_left, 1.0);
            if tick < 3 {
                assert_eq!(report.advanced, vec![sweep]);
            } else {
                assert_eq!(report.completed, vec![sweep]);
            }
        }
        assert!(!engine.world.exists(sweep));
        assert_eq!(engine.leave_activity(helper).unwrap(), Some(bowl_job));
    }

    #[test]
    fn test_idle_activity_is_reported() {
        let (mut engine, _, worker) = engine_with_worker();
        let a = engine.start_activity(&Recipe::new("wait", 2), worker).unwrap();
        engine.leave_activity(worker).unwrap();
        let report = engine.tick().unwrap();
        assert_eq!(report.idle, vec![a]);
        assert_eq!(engine.world.activity(a).unwrap().ticks_left, 2.0);
    }
}
