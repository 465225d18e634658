//! Landfall Headless Simulation Harness
//!
//! Validates world logic and shipped data end to end.
//! Runs entirely in-process: no storage backend, no networking, no clients.
//!
//! Usage:
//!   cargo run -p landfall-simtest
//!   cargo run -p landfall-simtest -- --verbose

use std::collections::BTreeSet;

use hecs::Entity;
use landfall_core::generation::SettlementConfig;
use landfall_core::prelude::*;
use landfall_logic::constants::{location_types, terrain_types, MAX_DOORS_PASSED};
use landfall_logic::deferred::{CallArg, CallArgs, CallRegistry, DeferredCall, DeferredError};
use landfall_logic::geography::{path_length, MapBounds, Point};
use landfall_logic::geometry::Polygon;
use landfall_logic::pathfinding::{door_counts, visit_subgraph, PassageEdge, PassageGraph, TraversalClass};
use landfall_logic::traversal::{max_traversable_distance, TerrainCost, TerrainPatch, TraversalRequest};

// ── Shipped data (same JSON a host would load) ──────────────────────────
const WORLD_CONFIG_JSON: &str = include_str!("../../../data/world_config.json");
const RECIPES_JSON: &str = include_str!("../../../data/recipes.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Landfall Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Config and recipe data
    results.extend(validate_data(verbose));

    // 2. Wrap-around geography
    results.extend(validate_geography(verbose));

    // 3. Door-budgeted reachability
    results.extend(validate_reachability(verbose));

    // 4. Terrain-weighted traversal
    results.extend(validate_traversal(verbose));

    // 5. Ranges over a generated settlement
    results.extend(validate_settlement_ranges(verbose));

    // 6. Event fan-out
    results.extend(validate_event_fanout(verbose));

    // 7. Activities from shipped recipes
    results.extend(validate_activities(verbose));

    // 8. Deferred call composition
    results.extend(validate_deferred(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_config() -> Result<WorldConfig, String> {
    WorldConfig::from_json_str(WORLD_CONFIG_JSON).map_err(|e| e.to_string())
}

fn load_recipes() -> Result<Vec<Recipe>, String> {
    serde_json::from_str(RECIPES_JSON).map_err(|e| e.to_string())
}

// ── 1. Data ─────────────────────────────────────────────────────────────

fn validate_data(verbose: bool) -> Vec<TestResult> {
    println!("--- Config & Recipe Data ---");
    let mut results = Vec::new();

    let config = match load_config() {
        Ok(c) => c,
        Err(e) => {
            results.push(check("data_config_parse", false, e));
            return results;
        }
    };
    results.push(check(
        "data_config_parse",
        true,
        format!("map {}x{}", config.map.width, config.map.height),
    ));

    let recipes = match load_recipes() {
        Ok(r) => r,
        Err(e) => {
            results.push(check("data_recipes_parse", false, e));
            return results;
        }
    };
    results.push(check(
        "data_recipes_parse",
        !recipes.is_empty(),
        format!("{} recipes", recipes.len()),
    ));

    let engine = Engine::new(config);
    let mut unresolved = Vec::new();
    for recipe in &recipes {
        for action in &recipe.result_actions {
            if let Err(e) = engine.registry.resolve(action) {
                unresolved.push(format!("{}: {}", recipe.name, e));
            }
        }
        if verbose {
            println!(
                "  {} ({} ticks, {} result actions)",
                recipe.name,
                recipe.ticks_needed,
                recipe.result_actions.len()
            );
        }
    }
    results.push(check(
        "data_result_actions_registered",
        unresolved.is_empty(),
        if unresolved.is_empty() {
            "every result action names a registered function".to_string()
        } else {
            unresolved.join("; ")
        },
    ));

    let names: BTreeSet<&str> = recipes.iter().map(|r| r.name.as_str()).collect();
    results.push(check(
        "data_recipe_names_unique",
        names.len() == recipes.len(),
        format!("{} distinct names", names.len()),
    ));

    let positive = recipes.iter().all(|r| r.ticks_needed > 0);
    results.push(check(
        "data_recipe_ticks_positive",
        positive,
        "every recipe takes at least one tick",
    ));

    results
}

// ── 2. Geography ────────────────────────────────────────────────────────

fn validate_geography(verbose: bool) -> Vec<TestResult> {
    println!("--- Geography ---");
    let mut results = Vec::new();
    let map = MapBounds::new(100.0, 100.0);

    let cases = [
        ("direct", Point::new(10.0, 10.0), Point::new(13.0, 14.0), 1),
        ("wrap_x", Point::new(98.0, 50.0), Point::new(3.0, 50.0), 2),
        ("pole", Point::new(20.0, 98.0), Point::new(70.0, 97.0), 2),
        ("wrap_x_and_pole", Point::new(99.0, 98.0), Point::new(52.0, 98.0), 3),
    ];
    for (label, a, b, expected) in cases {
        let segments = map.split_wrapped_segment(a, b);
        let length = path_length(&segments);
        let distance = map.distance(a, b);
        if verbose {
            println!(
                "  {}: {} segments, length {:.3}, distance {:.3}",
                label,
                segments.len(),
                length,
                distance
            );
        }
        results.push(check(
            &format!("geo_split_{}", label),
            segments.len() == expected && (length - distance).abs() < 1e-6,
            format!("{} segments (expected {}), length {:.3}", segments.len(), expected, length),
        ));
    }

    let p = Point::new(40.0, 40.0);
    results.push(check(
        "geo_split_coincident",
        map.split_wrapped_segment(p, p).is_empty(),
        "same point gives no segments",
    ));

    let normalized = map.normalize(Point::new(-5.0, 103.0));
    results.push(check(
        "geo_normalize_in_bounds",
        map.contains(normalized),
        format!("({:.1}, {:.1})", normalized.x, normalized.y),
    ));

    let symmetric = (map.distance(Point::new(1.0, 1.0), Point::new(90.0, 95.0))
        - map.distance(Point::new(90.0, 95.0), Point::new(1.0, 1.0)))
    .abs()
        < 1e-9;
    results.push(check("geo_distance_symmetric", symmetric, "d(a,b) == d(b,a)"));

    results
}

// ── 3. Reachability ─────────────────────────────────────────────────────

fn edge(id: u64, a: u64, b: u64, class: TraversalClass) -> PassageEdge {
    PassageEdge {
        id,
        location_a: a,
        location_b: b,
        open: true,
        class,
    }
}

fn validate_reachability(verbose: bool) -> Vec<TestResult> {
    println!("--- Reachability ---");
    let mut results = Vec::new();

    // 1 ═ 2 ═ 3 are open air; 3 ─ 4 ─ 5 ─ 6 are doors
    let mut graph = PassageGraph::from_passages(&[
        edge(10, 1, 2, TraversalClass::Unlimited),
        edge(11, 2, 3, TraversalClass::Unlimited),
        edge(12, 3, 4, TraversalClass::Limited),
        edge(13, 4, 5, TraversalClass::Limited),
        edge(14, 5, 6, TraversalClass::Limited),
    ]);

    let counts = door_counts(&graph, 1, false);
    if verbose {
        let mut sorted: Vec<_> = counts.iter().collect();
        sorted.sort();
        println!("  door counts from 1: {:?}", sorted);
    }
    results.push(check(
        "reach_open_air_is_free",
        counts.get(&3) == Some(&0),
        format!("doors to 3: {:?}", counts.get(&3)),
    ));
    results.push(check(
        "reach_counts_doors",
        counts.get(&6) == Some(&3),
        format!("doors to 6: {:?}", counts.get(&6)),
    ));

    let near = visit_subgraph(&graph, 1, false);
    let expected: std::collections::HashSet<u64> = [1, 2, 3, 4, 5].into_iter().collect();
    results.push(check(
        "reach_door_budget",
        near == expected,
        format!("{} locations within {} doors", near.len(), MAX_DOORS_PASSED),
    ));

    let open_air = visit_subgraph(&graph, 1, true);
    results.push(check(
        "reach_only_unlimited",
        open_air.len() == 3 && !open_air.contains(&4),
        format!("{} locations through open air", open_air.len()),
    ));

    graph.set_open(12, false);
    let closed = visit_subgraph(&graph, 1, false);
    results.push(check(
        "reach_closed_door_blocks",
        !closed.contains(&4),
        format!("{} locations with door 12 closed", closed.len()),
    ));

    let lonely = visit_subgraph(&graph, 99, false);
    results.push(check(
        "reach_unknown_origin",
        lonely.len() == 1 && lonely.contains(&99),
        "origin alone when it has no passages",
    ));

    results
}

// ── 4. Traversal ────────────────────────────────────────────────────────

fn validate_traversal(verbose: bool) -> Vec<TestResult> {
    println!("--- Terrain Traversal ---");
    let mut results = Vec::new();
    let map = MapBounds::new(200.0, 100.0);
    let patches = vec![
        TerrainPatch::new(
            terrain_types::GRASSLAND,
            0,
            Polygon::rect(0.0, 0.0, 200.0, 100.0),
            TerrainCost::new(1.0, 1.0),
        ),
        TerrainPatch::new(
            terrain_types::WATER,
            1,
            Polygon::rect(60.0, 0.0, 20.0, 100.0),
            TerrainCost::new(1.0, 1.0),
        ),
    ];
    let walkable: BTreeSet<String> = [terrain_types::GRASSLAND.to_string()].into();

    let request = TraversalRequest {
        origin: Point::new(10.0, 50.0),
        direction: 0.0,
        estimated_distance: 40.0,
        budget: 100.0,
        allowed_terrain: &walkable,
    };
    let full = max_traversable_distance(&map, &patches, None, &request);
    results.push(check(
        "traverse_unit_cost_full",
        (full - 40.0).abs() < 1e-6,
        format!("covered {:.3} of 40", full),
    ));

    let to_shore = TraversalRequest {
        estimated_distance: 100.0,
        ..request
    };
    let shore = max_traversable_distance(&map, &patches, None, &to_shore);
    results.push(check(
        "traverse_stops_at_water",
        (shore - 50.0).abs() < 1e-6,
        format!("covered {:.3}, water starts at 50", shore),
    ));

    let swimming = TraversalRequest {
        origin: Point::new(70.0, 50.0),
        ..request
    };
    let stuck = max_traversable_distance(&map, &patches, None, &swimming);
    results.push(check(
        "traverse_disallowed_origin",
        stuck == 0.0,
        format!("covered {:.3} from inside water", stuck),
    ));

    let tired = TraversalRequest {
        budget: 10.0,
        ..request
    };
    let short = max_traversable_distance(&map, &patches, None, &tired);
    if verbose {
        println!("  full={:.3} shore={:.3} stuck={:.3} short={:.3}", full, shore, stuck, short);
    }
    results.push(check(
        "traverse_budget_bounds",
        short <= 10.0 + 1e-6,
        format!("covered {:.3} with budget 10", short),
    ));

    results
}

// ── 5. Settlement ranges ────────────────────────────────────────────────

fn validate_settlement_ranges(verbose: bool) -> Vec<TestResult> {
    println!("--- Settlement Ranges ---");
    let mut results = Vec::new();
    let config = match load_config() {
        Ok(c) => c,
        Err(e) => {
            results.push(check("ranges_config", false, e));
            return results;
        }
    };

    let mut engine = Engine::new(config);
    let settlement = match engine.generate(&SettlementConfig::default()) {
        Ok(s) => s,
        Err(e) => {
            results.push(check("ranges_generate", false, e.to_string()));
            return results;
        }
    };
    let world = &engine.world;
    if verbose {
        println!(
            "  {} roots, {} buildings, {} rooms, {} characters",
            settlement.roots.len(),
            settlement.buildings.len(),
            settlement.rooms.len(),
            settlement.characters.len()
        );
    }

    let neighbouring = Range::Neighbouring {
        only_through_unlimited: false,
    };
    let mut over_budget = 0;
    for character in &settlement.characters {
        let Some(origin) = world.location_of(*character) else {
            over_budget += 1;
            continue;
        };
        let counts = door_counts(world, origin, false);
        for location in neighbouring.locations_near(world, *character) {
            if counts.get(&location).map_or(true, |d| *d > MAX_DOORS_PASSED) {
                over_budget += 1;
            }
        }
    }
    results.push(check(
        "ranges_door_budget",
        over_budget == 0,
        format!("{} near locations past the door budget", over_budget),
    ));

    let self_seen = settlement
        .characters
        .iter()
        .all(|c| Range::SameLocation.characters_near(world, *c).contains(c));
    results.push(check(
        "ranges_same_location_self",
        self_seen,
        "every character is near itself",
    ));

    let open_air = Range::Neighbouring {
        only_through_unlimited: true,
    };
    let hamlet = SettlementConfig::default().roots_per_hamlet;
    let linked = settlement.roots.iter().all(|root| {
        let near = open_air.locations_near(world, *root);
        near.iter().filter(|l| world.is_root(**l)).count() >= hamlet
            && near.iter().all(|l| world.location_type(*l).as_deref() == Some(location_types::OUTSIDE))
    });
    results.push(check(
        "ranges_hamlet_open_air",
        linked,
        format!("each root reaches its {} hamlet roots without doors", hamlet),
    ));

    let inside = settlement.buildings.iter().all(|b| {
        let near = Range::Inside.locations_near(world, *b);
        near.contains(b) && near.iter().all(|l| *l == *b || world.ancestors(*l).contains(b))
    });
    results.push(check(
        "ranges_inside_nested",
        inside,
        "inside range is the building and its rooms",
    ));

    results
}

// ── 6. Event fan-out ────────────────────────────────────────────────────

fn validate_event_fanout(verbose: bool) -> Vec<TestResult> {
    println!("--- Event Fan-out ---");
    let mut results = Vec::new();

    let mut engine = Engine::new(WorldConfig {
        map: MapBounds::new(200.0, 100.0),
        ..Default::default()
    });
    let scene = (|| -> Result<(Entity, Entity, Entity, Entity), WorldError> {
        let w = &mut engine.world;
        let market = w.spawn_root_location(location_types::OUTSIDE, "market", Point::new(10.0, 10.0))?;
        let stall = w.spawn_root_location(location_types::OUTSIDE, "stall", Point::new(15.0, 10.0))?;
        let hill = w.spawn_root_location(location_types::OUTSIDE, "hill", Point::new(150.0, 70.0))?;
        Ok((
            w.spawn_character("Seller", market)?,
            w.spawn_character("Buyer", market)?,
            w.spawn_character("Onlooker", stall)?,
            w.spawn_character("Hermit", hill)?,
        ))
    })();
    let (seller, buyer, onlooker, hermit) = match scene {
        Ok(s) => s,
        Err(e) => {
            results.push(check("events_scene", false, e.to_string()));
            return results;
        }
    };

    let sight = Range::VisibilityBased {
        distance: 10.0,
        only_through_unlimited: false,
    };
    let mut params = EventParams::new();
    params.insert("item".into(), "bread".into());
    let created = match engine.create_event("sell", Some(&sight), &params, Some(seller), Some(buyer)) {
        Ok(c) => c,
        Err(e) => {
            results.push(check("events_create", false, e.to_string()));
            return results;
        }
    };
    results.push(check(
        "events_three_observers",
        created.len() == 3,
        format!("{} observers", created.len()),
    ));

    let tag_for = |who: Entity| -> Option<String> {
        engine.events.seen_by(who).first().map(|(_, event)| event.tag.clone())
    };
    let tags = [tag_for(seller), tag_for(buyer), tag_for(onlooker)];
    if verbose {
        println!("  views: {:?}", tags);
    }
    results.push(check(
        "events_role_views",
        tags == [
            Some("sell_doer".to_string()),
            Some("sell_target".to_string()),
            Some("sell_observer".to_string()),
        ],
        format!("{:?}", tags),
    ));
    results.push(check(
        "events_out_of_sight",
        engine.events.seen_by(hermit).is_empty(),
        "distant character sees nothing",
    ));

    let quiet = engine.create_event("whisper", None, &EventParams::new(), Some(seller), None);
    results.push(check(
        "events_no_range_actor_only",
        matches!(quiet.as_ref().map(Vec::len), Ok(1)),
        "no range means only the actor is told",
    ));

    results
}

// ── 7. Activities ───────────────────────────────────────────────────────

struct Workshop {
    yard: Entity,
    shed: Entity,
    carver: Entity,
    helper: Entity,
}

fn workshop(engine: &mut Engine) -> Result<Workshop, WorldError> {
    let w = &mut engine.world;
    let yard = w.spawn_root_location(location_types::OUTSIDE, "yard", Point::new(300.0, 300.0))?;
    let shed = w.spawn_location(location_types::BUILDING, "shed", yard)?;
    w.connect(yard, shed, TraversalClass::Limited, true)?;
    let carver = w.spawn_character("Carver", shed)?;
    let helper = w.spawn_character("Helper", yard)?;
    let knife = w.spawn_item(Item::new("knife", 1.0, 1), carver)?;
    w.add_capability(knife, "tool", ToolCapability::params(&[("woodworking", 1.0)]))?;
    let bench = w.spawn_item(Item::new("workbench", 1.0, 1), shed)?;
    w.add_capability(bench, "machine", MachineCapability::params(&["workbench"]))?;
    Ok(Workshop {
        yard,
        shed,
        carver,
        helper,
    })
}

/// Tick until `activity` completes. Returns the number of ticks taken.
fn run_to_completion(engine: &mut Engine, activity: Entity, limit: u32) -> Result<Option<u32>, EngineError> {
    for n in 1..=limit {
        if engine.tick()?.completed.contains(&activity) {
            return Ok(Some(n));
        }
    }
    Ok(None)
}

fn held_types(engine: &Engine, character: Entity) -> Vec<String> {
    engine
        .world
        .contents(character)
        .into_iter()
        .filter_map(|i| engine.world.item(i))
        .map(|i| i.item_type)
        .collect()
}

fn validate_activities(verbose: bool) -> Vec<TestResult> {
    println!("--- Activities ---");
    let mut results = Vec::new();
    let (config, recipes) = match (load_config(), load_recipes()) {
        (Ok(c), Ok(r)) => (c, r),
        (Err(e), _) | (_, Err(e)) => {
            results.push(check("activity_data", false, e));
            return results;
        }
    };
    let recipe = |name: &str| recipes.iter().find(|r| r.name == name).cloned();
    let (Some(spoon), Some(stool), Some(shelter)) =
        (recipe("whittle spoon"), recipe("build stool"), recipe("raise shelter"))
    else {
        results.push(check("activity_recipes_present", false, "shipped recipe missing"));
        return results;
    };

    let mut engine = Engine::new(config.clone());
    let ws = match workshop(&mut engine) {
        Ok(ws) => ws,
        Err(e) => {
            results.push(check("activity_workshop", false, e.to_string()));
            return results;
        }
    };

    // Optional tool speeds the spoon up to 1.5 per tick
    let outcome = engine
        .start_activity(&spoon, ws.carver)
        .map_err(|e| e.to_string())
        .and_then(|a| run_to_completion(&mut engine, a, 10).map_err(|e| e.to_string()));
    let spoon_held = held_types(&engine, ws.carver).iter().any(|t| t == "spoon");
    results.push(check(
        "activity_optional_tool_rate",
        matches!(outcome, Ok(Some(n)) if n < spoon.ticks_needed) && spoon_held,
        format!("{:?} ticks, spoon held: {}", outcome, spoon_held),
    ));

    let outcome = engine
        .start_activity(&stool, ws.carver)
        .map_err(|e| e.to_string())
        .and_then(|a| run_to_completion(&mut engine, a, 10).map_err(|e| e.to_string()));
    let stool_made = engine
        .world
        .contents(ws.shed)
        .into_iter()
        .filter_map(|i| engine.world.item(i))
        .any(|i| i.item_type == "stool");
    results.push(check(
        "activity_machine_and_tool",
        matches!(outcome, Ok(Some(n)) if n == stool.ticks_needed) && stool_made,
        format!("{:?} ticks, stool in shed: {}", outcome, stool_made),
    ));

    // A lone worker cannot raise a shelter
    let built = (|| -> Result<(bool, bool), String> {
        engine.world.move_into(ws.carver, ws.yard).map_err(|e| e.to_string())?;
        let activity = engine.start_activity(&shelter, ws.carver).map_err(|e| e.to_string())?;
        let report = engine.tick().map_err(|e| e.to_string())?;
        let refused = report.failed.contains(&activity);
        engine.join_activity(ws.helper, activity).map_err(|e| e.to_string())?;
        let done = run_to_completion(&mut engine, activity, 10).map_err(|e| e.to_string())?;
        Ok((refused, done.is_some()))
    })();
    let shelter_exists = engine
        .world
        .contents(ws.yard)
        .into_iter()
        .any(|l| engine.world.is_location(l) && engine.world.name(l).as_deref() == Some("shelter"));
    if verbose {
        println!("  shelter: {:?}, exists: {}", built, shelter_exists);
        println!("  notifications: {}", engine.notifications.len());
    }
    results.push(check(
        "activity_min_workers_then_build",
        matches!(built, Ok((true, true))) && shelter_exists,
        format!("{:?}, shelter exists: {}", built, shelter_exists),
    ));
    results.push(check(
        "activity_failure_notified",
        engine
            .notifications
            .for_character(ws.carver)
            .any(|n| n.tag == "too_few_participants"),
        format!("{} notifications", engine.notifications.len()),
    ));

    results.extend(validate_save_resume(config, &stool));
    results
}

fn validate_save_resume(config: WorldConfig, stool: &Recipe) -> Vec<TestResult> {
    let mut results = Vec::new();
    let mut engine = Engine::new(config.clone());
    let resumed = (|| -> Result<(u64, Option<u32>), String> {
        let ws = workshop(&mut engine).map_err(|e| e.to_string())?;
        let activity = engine.start_activity(stool, ws.carver).map_err(|e| e.to_string())?;
        engine.tick().map_err(|e| e.to_string())?;

        let mut buffer = Vec::new();
        engine.save(&mut buffer).map_err(|e| e.to_string())?;
        let mut loaded = Engine::new(config);
        loaded.load(&buffer[..]).map_err(|e| e.to_string())?;
        let left = run_to_completion(&mut loaded, activity, 10).map_err(|e| e.to_string())?;
        Ok((loaded.current_tick(), left))
    })();
    results.push(check(
        "activity_save_resume",
        matches!(resumed, Ok((_, Some(n))) if n + 1 == stool.ticks_needed),
        format!("{:?}", resumed),
    ));
    results
}

// ── 8. Deferred calls ───────────────────────────────────────────────────

fn validate_deferred(verbose: bool) -> Vec<TestResult> {
    println!("--- Deferred Calls ---");
    let mut results = Vec::new();

    let mut registry: CallRegistry<Vec<String>> = CallRegistry::new();
    registry.register("square", |log: &mut Vec<String>, args: &CallArgs| {
        log.push("square".into());
        let n = args.int(1)?;
        Ok(CallArg::Int(n * n))
    });
    registry.register("count", |log: &mut Vec<String>, args: &CallArgs| {
        log.push("count".into());
        Ok(CallArg::Int(args.len() as i64))
    });

    let call = DeferredCall::new(
        "count",
        vec![DeferredCall::new("square", vec![3_i64.into()]).into()],
    );
    let mut log = Vec::new();
    let result = registry
        .resolve(&call)
        .and_then(|prepared| prepared.invoke(&mut log, &[CallArg::Int(7)]));
    if verbose {
        println!("  count(square(3)) = {:?}, order {:?}", result, log);
    }
    results.push(check(
        "deferred_nested_inner_first",
        result == Ok(CallArg::Int(2)) && log == ["square", "count"],
        format!("{:?}, order {:?}", result, log),
    ));

    let stored = call.encode();
    let mut again = Vec::new();
    let replayed = registry
        .resolve_value(&stored)
        .and_then(|prepared| prepared.invoke(&mut again, &[CallArg::Int(7)]));
    results.push(check(
        "deferred_json_replay",
        replayed == result,
        format!("{}", stored),
    ));

    let broken = DeferredCall::new("count", vec![DeferredCall::new("explode", vec![]).into()]);
    let rejected = registry.resolve(&broken).err();
    results.push(check(
        "deferred_unknown_nested",
        rejected == Some(DeferredError::UnknownFunction("explode".into())),
        format!("{:?}", rejected),
    ));

    results
}
