//! gamelib - A lightweight 2D game engine core
//!
//! Core modules:
//! - `vector`: `Vector2` (double precision) and its helper trait
//! - `events`: Per-object named event dispatch (`bind` / `trigger`)
//! - `compose`: Module composition with before/after method hooks
//! - `sim`: Bounds, collision math, rigid-body separation, entities and the world
//! - `settings`: Data-driven world configuration

pub mod compose;
pub mod error;
pub mod events;
pub mod settings;
pub mod sim;
pub mod vector;

pub use compose::{Composable, MethodBundle, Module, ModuleRegistry};
pub use error::{EngineError, EngineResult};
pub use events::{Bindable, Event, EventDispatcher, ListenerId};
pub use settings::Settings;
pub use sim::{Entity, EntityData, EntityId, World};
pub use vector::{Vector2, VectorExt};

/// Engine configuration constants
pub mod consts {
    /// Default simulation rate (frames per second)
    pub const DEFAULT_FPS: u32 = 30;

    /// Entity defaults
    pub const DEFAULT_WIDTH: f64 = 8.0;
    pub const DEFAULT_HEIGHT: f64 = 8.0;
    pub const DEFAULT_MASS: f64 = 1.0;
    pub const DEFAULT_COLOR: &str = "#196";

    /// Modules every entity is composed from, in order
    pub const DEFAULT_ENTITY_MODULES: [&str; 3] = ["bounded", "drawable", "durable"];
    /// Modules every world is composed from, in order
    pub const DEFAULT_WORLD_MODULES: [&str; 2] = ["delay", "collision"];
}
