//! Reachability and pathfinding over the passage graph.
//!
//! Locations are nodes; passages are undirected edges that may be closed and
//! are either *unlimited* (open air, not counted) or *limited* (a door,
//! counted). [`visit_subgraph`] is a breadth-first search bounded by the
//! number of doors passed rather than by depth. [`shortest_path`] is a plain
//! BFS with predecessor tracking.
//!
//! Any world store can be searched by implementing [`LocationGraph`];
//! [`PassageGraph`] is a self-contained adjacency list for tools and tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_DOORS_PASSED;

/// How a passage counts against a door budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraversalClass {
    /// Open air, a road, a gap in a fence. Never counted.
    Unlimited,
    /// A literal door. Counts as one door passed.
    Limited,
}

/// Current state of a passage as seen by a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassageState {
    pub open: bool,
    pub class: TraversalClass,
}

impl PassageState {
    /// A passage is traversable iff it is open, and, when
    /// `only_through_unlimited` is requested, iff it is unlimited.
    pub fn is_traversable(&self, only_through_unlimited: bool) -> bool {
        self.open && (!only_through_unlimited || self.class == TraversalClass::Unlimited)
    }

    pub fn door_cost(&self) -> u32 {
        match self.class {
            TraversalClass::Unlimited => 0,
            TraversalClass::Limited => 1,
        }
    }
}

/// One edge leaving a location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjacent<N> {
    pub location: N,
    pub passage: PassageState,
}

/// Read-only view of a location graph.
pub trait LocationGraph {
    type Node: Copy + Eq + Hash;

    /// Every (neighbour, passage) pair leaving `node`, closed passages included.
    fn adjacent(&self, node: Self::Node) -> Vec<Adjacent<Self::Node>>;
}

/// Breadth-first search from `origin` recording the doors passed to reach
/// every visited location. `doors[origin] == 0`.
///
/// Locations past the door budget are still expanded so counts propagate
/// through them; [`visit_subgraph`] filters them out afterwards.
pub fn door_counts<G: LocationGraph>(
    graph: &G,
    origin: G::Node,
    only_through_unlimited: bool,
) -> HashMap<G::Node, u32> {
    let mut doors = HashMap::new();
    let mut queue = VecDeque::new();
    doors.insert(origin, 0);
    queue.push_back(origin);

    while let Some(current) = queue.pop_front() {
        let passed = doors[&current];
        for edge in graph.adjacent(current) {
            if !edge.passage.is_traversable(only_through_unlimited) {
                continue;
            }
            if doors.contains_key(&edge.location) {
                continue;
            }
            doors.insert(edge.location, passed + edge.passage.door_cost());
            queue.push_back(edge.location);
        }
    }

    doors
}

/// Locations reachable from `origin` through at most
/// [`MAX_DOORS_PASSED`] limited passages. Always contains `origin`.
pub fn visit_subgraph<G: LocationGraph>(
    graph: &G,
    origin: G::Node,
    only_through_unlimited: bool,
) -> HashSet<G::Node> {
    door_counts(graph, origin, only_through_unlimited)
        .into_iter()
        .filter(|(_, passed)| *passed <= MAX_DOORS_PASSED)
        .map(|(node, _)| node)
        .collect()
}

/// Fewest-hops route from `from` to `to` through open passages, both
/// endpoints included. `Some(vec![from])` when they are the same location,
/// `None` when `to` cannot be reached.
pub fn shortest_path<G: LocationGraph>(graph: &G, from: G::Node, to: G::Node) -> Option<Vec<G::Node>> {
    if from == to {
        return Some(vec![from]);
    }

    let mut previous: HashMap<G::Node, G::Node> = HashMap::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(from);
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        for edge in graph.adjacent(current) {
            if !edge.passage.is_traversable(false) || !visited.insert(edge.location) {
                continue;
            }
            previous.insert(edge.location, current);
            if edge.location == to {
                let mut path = vec![to];
                let mut step = to;
                while let Some(&prev) = previous.get(&step) {
                    path.push(prev);
                    step = prev;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(edge.location);
        }
    }

    None
}

/// A passage edge in a standalone graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassageEdge {
    pub id: u64,
    pub location_a: u64,
    pub location_b: u64,
    pub open: bool,
    pub class: TraversalClass,
}

/// Adjacency-list passage graph keyed by plain location ids.
#[derive(Debug, Clone, Default)]
pub struct PassageGraph {
    /// location → list of passage ids touching it
    adj: HashMap<u64, Vec<u64>>,
    passages: HashMap<u64, PassageEdge>,
}

impl PassageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from passage edges.
    ///
    /// # Panics
    /// If an edge connects a location to itself.
    pub fn from_passages(edges: &[PassageEdge]) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            graph.add_passage(*edge);
        }
        graph
    }

    pub fn add_passage(&mut self, edge: PassageEdge) {
        assert_ne!(
            edge.location_a, edge.location_b,
            "passage {} connects location {} to itself",
            edge.id, edge.location_a
        );
        self.adj.entry(edge.location_a).or_default().push(edge.id);
        self.adj.entry(edge.location_b).or_default().push(edge.id);
        self.passages.insert(edge.id, edge);
    }

    /// Open or close a passage. Returns false if no such passage exists.
    pub fn set_open(&mut self, passage_id: u64, open: bool) -> bool {
        match self.passages.get_mut(&passage_id) {
            Some(edge) => {
                edge.open = open;
                true
            }
            None => false,
        }
    }

    pub fn has_location(&self, location: u64) -> bool {
        self.adj.contains_key(&location)
    }

    pub fn location_count(&self) -> usize {
        self.adj.len()
    }

    pub fn passage_count(&self) -> usize {
        self.passages.len()
    }
}

impl LocationGraph for PassageGraph {
    type Node = u64;

    fn adjacent(&self, node: u64) -> Vec<Adjacent<u64>> {
        let Some(ids) = self.adj.get(&node) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| self.passages.get(id))
            .map(|edge| Adjacent {
                location: if edge.location_a == node {
                    edge.location_b
                } else {
                    edge.location_a
                },
                passage: PassageState {
                    open: edge.open,
                    class: edge.class,
                },
            })
            .collect()
    }
}
