//! Embermobs - server-side scripted boss and mob behavior engine
//!
//! Boss behavior is data: TOML script files name trigger events, targets,
//! conditions, schedules and effects, and the engine interprets them against
//! an in-memory world model each tick.

pub mod core;
pub mod events;
pub mod powers;
pub mod scheduler;
pub mod scripts;
pub mod world;

pub use crate::core::config::EngineConfig;
pub use crate::core::error::{EmberError, Result};
pub use crate::scripts::ScriptEngine;
pub use crate::world::GameWorld;
