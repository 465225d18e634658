//! Landfall Core - world graph simulation engine
//!
//! An ECS-based simulation of a persistent text world: locations nested
//! inside one another and linked by passages, root locations placed on a
//! wrap-around map with terrain, and characters who cooperate on
//! long-running activities.
//!
//! # Architecture
//!
//! The world is stored in a `hecs` ECS behind [`world::WorldState`]:
//! - **Entities**: locations, passages, terrain areas, characters, items, activities
//! - **Components**: pure data attached to entities (`Location`, `Passage`, `Activity`, ...)
//! - **Ranges**: policies answering "what and who is near" a subject
//! - **Systems**: event fan-out, activity progress, character commands
//!
//! # Example
//!
//! ```rust,no_run
//! use landfall_core::prelude::*;
//! use landfall_core::generation::SettlementConfig;
//!
//! let mut engine = Engine::default();
//! let settlement = engine.generate(&SettlementConfig::default())?;
//! let carpenter = settlement.characters[0];
//! engine.start_activity(&Recipe::new("whittle", 5), carpenter)?;
//!
//! loop {
//!     let report = engine.tick()?;
//!     if !report.completed.is_empty() {
//!         break;
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod hooks;
pub mod notifications;
pub mod persistence;
pub mod range;
pub mod serde_helpers;
pub mod systems;
pub mod transaction;
pub mod world;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::WorldConfig;
    pub use crate::engine::{Engine, TickReport};
    pub use crate::error::{ActionError, CommandError, EngineError, WorldError};
    pub use crate::range::Range;
    pub use crate::systems::{EventParams, EventValue};
    pub use crate::world::WorldState;
}
