//! The scripted behavior system
//!
//! Blueprints come in as TOML, get bound into `Script` objects, and run
//! through the engine when trigger events arrive.

pub mod action;
pub mod blueprint;
pub mod conditions;
pub mod data;
pub mod engine;
pub mod particles;
pub mod script;
pub mod targets;
pub mod vector;
pub mod zone;

pub use engine::ScriptEngine;
pub use script::{Script, ScriptRegistry};
