//! Built-in world modules
//!
//! `delay` drives callbacks scheduled with [`World::delay`]. `collision`
//! exposes the world's collision queries as late-bound methods taking and
//! returning JSON, for callers that only hold a method name.

use serde_json::{Value, json};

use super::bounds::Bounds;
use super::world::{World, entity_arg};
use crate::compose::{MethodBundle, Module, ModuleRegistry};
use crate::error::EngineResult;
use crate::events::{Bindable, Event};
use crate::vector::Vector2;

/// Fires delayed callbacks after every update
pub struct DelayModule;

impl Module<World> for DelayModule {
    fn name(&self) -> &str {
        "delay"
    }

    fn build(&self, world: &mut World) -> EngineResult<MethodBundle<World>> {
        world.bind(Event::AfterUpdate, |w: &mut World, _| w.fire_delayed());
        Ok(MethodBundle::new().method("pendingDelays", |w: &mut World, _| {
            json!(w.pending_delays())
        }))
    }
}

fn bounds_arg(args: &[Value]) -> Option<Bounds> {
    args.first()
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

fn vector_arg(args: &[Value], index: usize) -> Option<Vector2> {
    args.get(index)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

/// `collides(bounds, exclude?)`, `collidesWith(bounds, exclude?)` and
/// `rayCollides(source, direction, exclude?)`
pub struct CollisionModule;

impl Module<World> for CollisionModule {
    fn name(&self) -> &str {
        "collision"
    }

    fn build(&self, _world: &mut World) -> EngineResult<MethodBundle<World>> {
        Ok(MethodBundle::new()
            .method("collides", |w: &mut World, args| match bounds_arg(args) {
                Some(bounds) => json!(w.collides(&bounds, entity_arg(args, 1))),
                None => json!(false),
            })
            .method("collidesWith", |w: &mut World, args| {
                let Some(bounds) = bounds_arg(args) else {
                    return Value::Null;
                };
                let ids: Vec<u32> = w
                    .collides_with(&bounds, entity_arg(args, 1))
                    .into_iter()
                    .map(|id| id.0)
                    .collect();
                // Nothing collided: null rather than an empty list
                if ids.is_empty() {
                    Value::Null
                } else {
                    json!(ids)
                }
            })
            .method("rayCollides", |w: &mut World, args| {
                let (Some(source), Some(direction)) = (vector_arg(args, 0), vector_arg(args, 1))
                else {
                    return Value::Null;
                };
                match w.ray_collides(source, direction, entity_arg(args, 2)) {
                    Some(hit) => json!({
                        "x": hit.point.x,
                        "y": hit.point.y,
                        "entity": hit.entity.0,
                        "distance": hit.distance,
                    }),
                    None => Value::Null,
                }
            }))
    }
}

/// Registry holding every built-in world module
pub fn builtin_world_modules() -> ModuleRegistry<World> {
    let mut registry = ModuleRegistry::new();
    registry.register(DelayModule).register(CollisionModule);
    registry
}
