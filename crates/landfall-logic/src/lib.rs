//! Pure world logic for Landfall.
//!
//! This crate contains the algorithms that are independent of the ECS world
//! store: map geometry, passage-graph search, terrain-weighted travel and
//! the deferred-call registry. Functions take plain data and return results,
//! so they are unit-testable on their own and shared by the simulation core
//! and the headless simtest.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`constants`] | Map size, door budget, cost layer names, terrain and location tags |
//! | [`deferred`] | Named, serializable function calls with nested-call arguments |
//! | [`geography`] | Wrap-around map distance, bearing, and edge-splitting of paths |
//! | [`geometry`] | Polygon containment, segment crossings, area |
//! | [`pathfinding`] | Door-budgeted BFS reachability and shortest path over passages |
//! | [`traversal`] | How far a ray gets across priority-ordered terrain on a budget |

pub mod constants;
pub mod deferred;
pub mod geography;
pub mod geometry;
pub mod pathfinding;
pub mod traversal;
