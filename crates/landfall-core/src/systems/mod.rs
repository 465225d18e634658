//! Systems - logic that operates on the world store

mod actions;
mod activity;
mod events;
mod results;

pub use actions::*;
pub use activity::*;
pub use events::*;
pub use results::*;
