//! Property tests for the pure world algorithms.
//!
//! Exercises: door-budgeted reachability, shortest path, terrain-weighted
//! traversal and deferred-call composition over randomly generated inputs.

use std::collections::{BTreeSet, HashSet, VecDeque};

use landfall_logic::constants::MAX_DOORS_PASSED;
use landfall_logic::deferred::{CallArg, CallArgs, CallRegistry, DeferredCall};
use landfall_logic::geography::{MapBounds, Point};
use landfall_logic::geometry::Polygon;
use landfall_logic::pathfinding::{
    door_counts, shortest_path, visit_subgraph, LocationGraph, PassageEdge, PassageGraph,
    TraversalClass,
};
use landfall_logic::traversal::{
    max_traversable_distance, TerrainCost, TerrainPatch, TraversalRequest,
};
use proptest::prelude::*;

// ── Strategies ─────────────────────────────────────────────────────────

const NODES: u64 = 10;

fn edge_strategy() -> impl Strategy<Value = (u64, u64, bool, bool)> {
    (0..NODES, 0..NODES, any::<bool>(), any::<bool>())
}

fn build_graph(raw: &[(u64, u64, bool, bool)], force_unlimited: bool) -> PassageGraph {
    let mut graph = PassageGraph::new();
    for (id, &(a, b, open, limited)) in raw.iter().enumerate() {
        if a == b {
            continue;
        }
        graph.add_passage(PassageEdge {
            id: id as u64,
            location_a: a,
            location_b: b,
            open,
            class: if limited && !force_unlimited {
                TraversalClass::Limited
            } else {
                TraversalClass::Unlimited
            },
        });
    }
    graph
}

/// Plain connected component over open passages.
fn component(graph: &PassageGraph, origin: u64) -> HashSet<u64> {
    let mut seen = HashSet::from([origin]);
    let mut queue = VecDeque::from([origin]);
    while let Some(node) = queue.pop_front() {
        for edge in graph.adjacent(node) {
            if edge.passage.open && seen.insert(edge.location) {
                queue.push_back(edge.location);
            }
        }
    }
    seen
}

fn patch_strategy() -> impl Strategy<Value = TerrainPatch> {
    (
        0.0..80.0f64,
        0.0..80.0f64,
        1.0..20.0f64,
        1.0..20.0f64,
        -3..3i32,
        0.2..2.0f64,
        prop::sample::select(vec!["grassland", "forest", "desert"]),
    )
        .prop_map(|(x, y, w, h, priority, multiplier, terrain)| {
            TerrainPatch::new(
                terrain,
                priority,
                Polygon::rect(x, y, w, h),
                TerrainCost::new(multiplier, 1.0),
            )
        })
}

fn walkable() -> BTreeSet<String> {
    ["grassland", "forest", "desert"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// ── Reachability ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn door_budget_holds_for_every_result(
        raw in prop::collection::vec(edge_strategy(), 0..30),
        origin in 0..NODES,
        only_unlimited in any::<bool>(),
    ) {
        let graph = build_graph(&raw, false);
        let doors = door_counts(&graph, origin, only_unlimited);
        let reached = visit_subgraph(&graph, origin, only_unlimited);

        prop_assert_eq!(doors[&origin], 0);
        prop_assert!(reached.contains(&origin));
        for node in &reached {
            prop_assert!(doors[node] <= MAX_DOORS_PASSED);
        }
        for (node, passed) in &doors {
            prop_assert_eq!(reached.contains(node), *passed <= MAX_DOORS_PASSED);
        }
    }

    #[test]
    fn unlimited_graph_reaches_whole_component(
        raw in prop::collection::vec(edge_strategy(), 0..30),
        origin in 0..NODES,
    ) {
        let graph = build_graph(&raw, true);
        prop_assert_eq!(visit_subgraph(&graph, origin, false), component(&graph, origin));
    }

    #[test]
    fn shortest_path_is_a_valid_walk(
        raw in prop::collection::vec(edge_strategy(), 0..30),
        from in 0..NODES,
        to in 0..NODES,
    ) {
        let graph = build_graph(&raw, false);
        let reachable = component(&graph, from).contains(&to);
        match shortest_path(&graph, from, to) {
            None => prop_assert!(!reachable),
            Some(path) => {
                prop_assert!(reachable);
                prop_assert_eq!(path.first(), Some(&from));
                prop_assert_eq!(path.last(), Some(&to));
                for pair in path.windows(2) {
                    let linked = graph
                        .adjacent(pair[0])
                        .iter()
                        .any(|edge| edge.location == pair[1] && edge.passage.open);
                    prop_assert!(linked);
                }
                let unique: HashSet<_> = path.iter().collect();
                prop_assert_eq!(unique.len(), path.len());
            }
        }
    }
}

// ── Terrain traversal ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn traversal_never_exceeds_estimate(
        patches in prop::collection::vec(patch_strategy(), 0..6),
        x in 0.0..100.0f64,
        y in 0.0..100.0f64,
        direction in 0.0..360.0f64,
        distance in 0.0..150.0f64,
        budget in 0.0..200.0f64,
    ) {
        let map = MapBounds::new(100.0, 100.0);
        let allowed = walkable();
        let request = TraversalRequest {
            origin: Point::new(x, y),
            direction,
            estimated_distance: distance,
            budget,
            allowed_terrain: &allowed,
        };
        let reached = max_traversable_distance(&map, &patches, None, &request);
        prop_assert!(reached >= 0.0);
        prop_assert!(reached <= distance + 1e-9);
    }

    #[test]
    fn unit_cost_with_enough_budget_covers_estimate(
        x in 0.0..100.0f64,
        y in 0.0..100.0f64,
        direction in 0.0..360.0f64,
        distance in 0.0..150.0f64,
    ) {
        let map = MapBounds::new(100.0, 100.0);
        let ground = TerrainPatch::new(
            "grassland",
            0,
            Polygon::rect(0.0, 0.0, 100.0, 100.0),
            TerrainCost::default(),
        );
        let allowed = walkable();
        let request = TraversalRequest {
            origin: Point::new(x, y),
            direction,
            estimated_distance: distance,
            budget: distance + 1.0,
            allowed_terrain: &allowed,
        };
        let reached = max_traversable_distance(&map, &[ground], None, &request);
        prop_assert!((reached - distance).abs() < 1e-6);
    }

    #[test]
    fn disallowed_terrain_never_helps(
        patches in prop::collection::vec(patch_strategy(), 0..5),
        wx in 0.0..90.0f64,
        wy in 0.0..90.0f64,
        x in 0.0..100.0f64,
        y in 0.0..100.0f64,
        direction in 0.0..360.0f64,
        distance in 0.0..120.0f64,
        budget in 0.0..200.0f64,
    ) {
        let map = MapBounds::new(100.0, 100.0);
        let allowed = walkable();
        let request = TraversalRequest {
            origin: Point::new(x, y),
            direction,
            estimated_distance: distance,
            budget,
            allowed_terrain: &allowed,
        };
        let without = max_traversable_distance(&map, &patches, None, &request);

        let mut with_lake = patches.clone();
        with_lake.push(TerrainPatch::new(
            "water",
            10,
            Polygon::rect(wx, wy, 10.0, 10.0),
            TerrainCost::default(),
        ));
        let with = max_traversable_distance(&map, &with_lake, None, &request);
        prop_assert!(with <= without + 1e-5);
    }

    #[test]
    fn more_budget_never_shortens_travel(
        patches in prop::collection::vec(patch_strategy(), 0..6),
        x in 0.0..100.0f64,
        y in 0.0..100.0f64,
        direction in 0.0..360.0f64,
        distance in 0.0..120.0f64,
        budget in 0.0..100.0f64,
        extra in 0.0..100.0f64,
    ) {
        let map = MapBounds::new(100.0, 100.0);
        let allowed = walkable();
        let walk = |budget: f64| {
            let request = TraversalRequest {
                origin: Point::new(x, y),
                direction,
                estimated_distance: distance,
                budget,
                allowed_terrain: &allowed,
            };
            max_traversable_distance(&map, &patches, None, &request)
        };
        prop_assert!(walk(budget + extra) + 1e-5 >= walk(budget));
    }
}

// ── Deferred calls ─────────────────────────────────────────────────────

fn double(x: i64) -> i64 {
    x.wrapping_mul(2)
}

fn negate(x: i64) -> i64 {
    x.wrapping_neg()
}

fn add_seven(x: i64) -> i64 {
    x.wrapping_add(7)
}

fn square(x: i64) -> i64 {
    x.wrapping_mul(x)
}

const PURE_FUNCTIONS: [(&str, fn(i64) -> i64); 4] = [
    ("double", double),
    ("negate", negate),
    ("add_seven", add_seven),
    ("square", square),
];

fn pure_registry() -> CallRegistry<()> {
    let mut registry = CallRegistry::new();
    for (name, f) in PURE_FUNCTIONS {
        registry.register(name, move |_: &mut (), args: &CallArgs| {
            Ok(CallArg::Int(f(args.int(0)?)))
        });
    }
    registry
}

proptest! {
    #[test]
    fn composed_calls_equal_composed_functions(
        fi in 0..PURE_FUNCTIONS.len(),
        gi in 0..PURE_FUNCTIONS.len(),
        x in any::<i64>(),
    ) {
        let registry = pure_registry();
        let (f_name, f) = PURE_FUNCTIONS[fi];
        let (g_name, g) = PURE_FUNCTIONS[gi];

        let inner = registry.serialize(g_name, vec![CallArg::Int(x)]).unwrap();
        let outer = registry.serialize(f_name, vec![inner.into()]).unwrap();

        // Through durable storage and back
        let stored = outer.encode();
        let restored = DeferredCall::decode(&stored).unwrap();
        let result = registry.resolve(&restored).unwrap().invoke(&mut (), &[]).unwrap();

        prop_assert_eq!(result, CallArg::Int(f(g(x))));
    }
}
