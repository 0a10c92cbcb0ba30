//! Simulation module
//!
//! Everything that advances or queries the game state lives here:
//! - Bounding shapes and the geometric overlap tests
//! - Rigid-body separation with side masks
//! - Entities composed from modules, and the class registry
//! - The world tick cycle, its modules and the fixed timestep clock
//!
//! Nothing in here renders or touches the platform.

pub mod bounds;
pub mod collidable;
pub mod collision;
pub mod emitter;
pub mod engine_modules;
pub mod entity;
pub mod modules;
pub mod registry;
pub mod tick;
pub mod world;

pub use bounds::{Bounded, Bounds, CenteredBounds, Circle};
pub use collidable::{CollisionFlags, RigidBody, separate};
pub use collision::{circular, collide, ray_circle, ray_rectangle, rectangular};
pub use emitter::{EmitterConfig, EmitterModule, ParticleGenerator};
pub use engine_modules::{CollisionModule, DelayModule, builtin_world_modules};
pub use entity::{Entity, EntityData, EntityId};
pub use modules::{
    BoundedModule, CollidableModule, DrawableModule, DurableModule, MovableModule,
    RotatableModule, builtin_entity_modules,
};
pub use registry::{ClassFactory, ClassRegistry};
pub use tick::FrameClock;
pub use world::{DelayedFn, RayHit, Registries, World};
