//! Built-in entity modules
//!
//! Each module is registered by name and included in composition order.
//! `bounded`, `drawable` and `durable` are part of every entity unless
//! excluded; the rest are opted into through `includedModules`. The particle
//! emitter lives in `sim::emitter`.

use serde::Serialize;
use serde_json::{Value, json};

use super::bounds::Bounded;
use super::collidable::CollisionFlags;
use super::emitter::EmitterModule;
use super::entity::Entity;
use crate::compose::{MethodBundle, Module, ModuleRegistry};
use crate::error::EngineResult;
use crate::events::{Bindable, Event};
use crate::vector::Vector2;

fn to_json<S: Serialize>(value: S) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn arg_f64(args: &[Value], index: usize) -> Option<f64> {
    args.get(index).and_then(Value::as_f64)
}

/// Offset given as `(x, y)` numbers at the start of `args`, zero if absent
fn offset_arg(args: &[Value]) -> Vector2 {
    Vector2::new(arg_f64(args, 0).unwrap_or(0.0), arg_f64(args, 1).unwrap_or(0.0))
}

/// Late-bound accessors for the bounding shapes
pub struct BoundedModule;

impl Module<Entity> for BoundedModule {
    fn name(&self) -> &str {
        "bounded"
    }

    fn build(&self, _entity: &mut Entity) -> EngineResult<MethodBundle<Entity>> {
        Ok(MethodBundle::new()
            .method("position", |e: &mut Entity, args| {
                if let (Some(x), Some(y)) = (arg_f64(args, 0), arg_f64(args, 1)) {
                    e.set_position(Vector2::new(x, y));
                }
                to_json(e.position())
            })
            .method("center", |e: &mut Entity, _| to_json(e.center()))
            .method("bounds", |e: &mut Entity, args| {
                to_json(e.offset_bounds(offset_arg(args)))
            })
            .method("centeredBounds", |e: &mut Entity, _| to_json(e.centered_bounds()))
            .method("collisionBounds", |e: &mut Entity, args| {
                to_json(e.offset_collision_bounds(offset_arg(args)))
            })
            .method("circle", |e: &mut Entity, _| to_json(e.circle())))
    }
}

/// Drawing entry point. `draw` does no drawing itself; listeners on
/// `beforeTransform`, `draw` and `afterTransform` do.
pub struct DrawableModule;

impl Module<Entity> for DrawableModule {
    fn name(&self) -> &str {
        "drawable"
    }

    fn build(&self, _entity: &mut Entity) -> EngineResult<MethodBundle<Entity>> {
        Ok(MethodBundle::new().method("draw", |e: &mut Entity, _| {
            // Listeners get the column-major 2x3 transform
            let transform = json!(e.transform().to_cols_array());
            e.trigger(Event::BeforeTransform, &[]);
            e.trigger(Event::Draw, &[transform]);
            e.trigger(Event::AfterTransform, &[]);
            Value::Null
        }))
    }
}

/// Deactivates the entity once it has lived `duration` updates
pub struct DurableModule;

impl Module<Entity> for DurableModule {
    fn name(&self) -> &str {
        "durable"
    }

    fn build(&self, _entity: &mut Entity) -> EngineResult<MethodBundle<Entity>> {
        Ok(MethodBundle::new().before("update", |e: &mut Entity, _| {
            if let Some(duration) = e.data.duration {
                if e.data.age >= duration {
                    e.data.active = false;
                }
            }
        }))
    }
}

/// Integrates acceleration and velocity before each update
pub struct MovableModule;

impl Module<Entity> for MovableModule {
    fn name(&self) -> &str {
        "movable"
    }

    fn build(&self, _entity: &mut Entity) -> EngineResult<MethodBundle<Entity>> {
        Ok(MethodBundle::new().before("update", |e: &mut Entity, _| {
            let data = &mut e.data;
            data.velocity += data.acceleration;
            if let Some(max_speed) = data.max_speed {
                let speed = data.velocity.length();
                if speed > max_speed {
                    data.velocity *= max_speed / speed;
                }
            }
            data.x += data.velocity.x;
            data.y += data.velocity.y;
        }))
    }
}

pub struct RotatableModule;

impl Module<Entity> for RotatableModule {
    fn name(&self) -> &str {
        "rotatable"
    }

    fn build(&self, _entity: &mut Entity) -> EngineResult<MethodBundle<Entity>> {
        Ok(MethodBundle::new().before("update", |e: &mut Entity, _| {
            e.data.rotation += e.data.rotational_velocity;
        }))
    }
}

/// Rigid-body participation
///
/// `touching` is cleared before every update so it only reflects contacts
/// resolved since. `solid` maps onto `allowCollisions`.
pub struct CollidableModule;

impl Module<Entity> for CollidableModule {
    fn name(&self) -> &str {
        "collidable"
    }

    fn build(&self, _entity: &mut Entity) -> EngineResult<MethodBundle<Entity>> {
        Ok(MethodBundle::new()
            .method("solid", |e: &mut Entity, args| {
                if let Some(solid) = args.first().and_then(Value::as_bool) {
                    e.data.allow_collisions = if solid {
                        CollisionFlags::ANY
                    } else {
                        CollisionFlags::NONE
                    };
                }
                json!(e.data.allow_collisions.bits())
            })
            .method("touching", |e: &mut Entity, _| json!(e.data.touching.bits()))
            .before("update", |e: &mut Entity, _| {
                e.data.touching = CollisionFlags::NONE;
            }))
    }
}

/// Registry holding every built-in entity module
pub fn builtin_entity_modules() -> ModuleRegistry<Entity> {
    let mut registry = ModuleRegistry::new();
    registry
        .register(BoundedModule)
        .register(DrawableModule)
        .register(DurableModule)
        .register(MovableModule)
        .register(RotatableModule)
        .register(CollidableModule)
        .register(EmitterModule::new());
    registry
}
