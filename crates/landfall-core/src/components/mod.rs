//! Component definitions for the ECS world.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in the world store and systems.

mod activity;
mod common;
mod people;
mod places;

pub use activity::*;
pub use common::*;
pub use people::*;
pub use places::*;
