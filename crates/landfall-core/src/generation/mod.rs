//! Generation - procedural creation of settlements, names, terrain.

mod names;
mod settlement;

pub use names::*;
pub use settlement::*;
