//! Composed simulation objects
//!
//! An [`Entity`] is built from a plain [`EntityData`] record plus the
//! modules named by the defaults and the record's `includedModules` /
//! `excludedModules`. Its lifecycle (`update`, `destroy`) is a late-bound
//! method so modules can hook around it.

use glam::DAffine2;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};

use super::bounds::Bounded;
use super::collidable::{CollisionFlags, RigidBody};
use crate::compose::{Composable, MethodBundle, MethodTable, ModuleRegistry};
use crate::consts::*;
use crate::error::EngineResult;
use crate::events::{Bindable, Event, EventDispatcher};
use crate::vector::Vector2;

/// World-unique entity handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

fn positive_mass<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let mass = f64::deserialize(deserializer)?;
    if mass > 0.0 {
        Ok(mass)
    } else {
        Err(D::Error::custom(format!("mass must be positive, got {}", mass)))
    }
}

/// Instance variables of an entity
///
/// Every field has a default, so `{}` is a valid record. Keys that no module
/// knows about are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EntityData {
    /// Registered class to construct with, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    // === Lifecycle ===
    pub age: u64,
    pub active: bool,
    pub created: bool,
    pub destroyed: bool,
    pub solid: bool,
    /// Updates before the entity deactivates itself; `None` lives forever
    pub duration: Option<u64>,

    // === Bounds ===
    /// Center of the entity
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    pub collision_margin: Vector2,

    // === Motion ===
    pub velocity: Vector2,
    pub acceleration: Vector2,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,
    pub rotation: f64,
    pub rotational_velocity: f64,

    // === Rigid body ===
    /// Always positive
    #[serde(deserialize_with = "positive_mass")]
    pub mass: f64,
    pub elasticity: f64,
    pub immovable: bool,
    pub allow_collisions: CollisionFlags,
    pub touching: CollisionFlags,

    // === Drawing ===
    pub z_index: i32,
    pub color: String,
    pub hflip: bool,
    pub vflip: bool,

    // === Composition ===
    pub included_modules: Vec<String>,
    pub excluded_modules: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for EntityData {
    fn default() -> Self {
        Self {
            class: None,

            age: 0,
            active: true,
            created: false,
            destroyed: false,
            solid: false,
            duration: None,

            x: 0.0,
            y: 0.0,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            radius: None,
            collision_margin: Vector2::ZERO,

            velocity: Vector2::ZERO,
            acceleration: Vector2::ZERO,
            max_speed: None,
            rotation: 0.0,
            rotational_velocity: 0.0,

            mass: DEFAULT_MASS,
            elasticity: 0.0,
            immovable: false,
            allow_collisions: CollisionFlags::ANY,
            touching: CollisionFlags::NONE,

            z_index: 0,
            color: DEFAULT_COLOR.to_string(),
            hflip: false,
            vflip: false,

            included_modules: Vec::new(),
            excluded_modules: Vec::new(),

            extra: Map::new(),
        }
    }
}

impl EntityData {
    /// Default record centered at `(x, y)`
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    pub fn with_velocity(mut self, x: f64, y: f64) -> Self {
        self.velocity = Vector2::new(x, y);
        self
    }

    pub fn solid(mut self) -> Self {
        self.solid = true;
        self
    }

    /// Add a module to `includedModules`
    pub fn including(mut self, module: &str) -> Self {
        self.included_modules.push(module.to_string());
        self
    }

    /// Add a module to `excludedModules`
    pub fn excluding(mut self, module: &str) -> Self {
        self.excluded_modules.push(module.to_string());
        self
    }

    pub fn from_value(value: Value) -> EngineResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Methods every entity starts with, before any module is applied
fn lifecycle_methods() -> MethodBundle<Entity> {
    MethodBundle::new()
        .method("update", |entity: &mut Entity, _| {
            if entity.data.active {
                entity.trigger(Event::Step, &[]);
                entity.trigger(Event::Update, &[]);
                entity.data.age += 1;
            }
            json!(entity.data.active)
        })
        .method("destroy", |entity: &mut Entity, _| {
            if !entity.data.destroyed {
                entity.trigger(Event::Destroy, &[]);
            }
            entity.data.destroyed = true;
            entity.data.active = false;
            Value::Null
        })
}

/// A simulated object with position, lifecycle state and composed behavior
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    pub data: EntityData,
    events: EventDispatcher<Entity>,
    methods: MethodTable<Entity>,
}

impl Entity {
    /// Compose an entity and publish `create`
    pub fn new(
        id: EntityId,
        data: EntityData,
        modules: &ModuleRegistry<Entity>,
    ) -> EngineResult<Self> {
        Self::with_setup(id, data, modules, |_| Ok(()))
    }

    /// Compose an entity, run `setup` on it, then publish `create`
    ///
    /// `setup` runs after every module is applied, so it can bind `create`
    /// listeners or add class-specific methods and hooks.
    pub fn with_setup<F>(
        id: EntityId,
        data: EntityData,
        modules: &ModuleRegistry<Entity>,
        setup: F,
    ) -> EngineResult<Self>
    where
        F: FnOnce(&mut Entity) -> EngineResult<()>,
    {
        let mut entity = Self {
            id,
            data,
            events: EventDispatcher::new(),
            methods: MethodTable::new(),
        };
        entity.extend("gameObject", lifecycle_methods())?;

        let resolved = modules.resolve(
            &DEFAULT_ENTITY_MODULES,
            &entity.data.included_modules,
            &entity.data.excluded_modules,
        )?;
        for module in resolved {
            entity.include(module.as_ref())?;
        }

        setup(&mut entity)?;

        if !entity.data.created {
            entity.trigger(Event::Create, &[]);
        }
        entity.data.created = true;
        Ok(entity)
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn class(&self) -> Option<&str> {
        self.data.class.as_deref()
    }

    pub fn age(&self) -> u64 {
        self.data.age
    }

    pub fn active(&self) -> bool {
        self.data.active
    }

    pub fn destroyed(&self) -> bool {
        self.data.destroyed
    }

    pub fn z_index(&self) -> i32 {
        self.data.z_index
    }

    /// Advance one tick. Returns whether the entity is still active.
    ///
    /// An inactive entity is inert: no hooks run and no events fire.
    pub fn update(&mut self) -> bool {
        if !self.data.active {
            return false;
        }
        match self.call("update", &[]) {
            Ok(active) => active.as_bool().unwrap_or(false),
            Err(err) => {
                log::warn!("Entity {} failed to update: {}", self.id, err);
                false
            }
        }
    }

    /// Deactivate the entity; `destroy` is published only the first time
    pub fn destroy(&mut self) {
        if let Err(err) = self.call("destroy", &[]) {
            log::warn!("Entity {} failed to destroy: {}", self.id, err);
        }
    }

    /// Run the composed `draw` method, if a drawing module is included
    pub fn draw(&mut self) {
        if self.responds_to("draw") {
            if let Err(err) = self.call("draw", &[]) {
                log::warn!("Entity {} failed to draw: {}", self.id, err);
            }
        }
    }

    /// Whether world collision queries consider this entity.
    /// With `collidable` this follows `allowCollisions`.
    pub fn solid(&self) -> bool {
        if self.has_module("collidable") {
            !self.data.allow_collisions.is_empty()
        } else {
            self.data.solid
        }
    }

    pub fn set_solid(&mut self, solid: bool) {
        if self.has_module("collidable") {
            self.data.allow_collisions = if solid {
                CollisionFlags::ANY
            } else {
                CollisionFlags::NONE
            };
        } else {
            self.data.solid = solid;
        }
    }

    /// Drawing transform: translate to the center, rotate, flip, then offset
    /// by half the size so local `(0, 0)` is the top-left corner
    pub fn transform(&self) -> DAffine2 {
        let mut transform =
            DAffine2::from_translation(self.center()) * DAffine2::from_angle(self.data.rotation);
        if self.data.hflip {
            transform = transform * DAffine2::from_scale(Vector2::new(-1.0, 1.0));
        }
        if self.data.vflip {
            transform = transform * DAffine2::from_scale(Vector2::new(1.0, -1.0));
        }
        transform * DAffine2::from_translation(-self.size() / 2.0)
    }
}

impl Bindable for Entity {
    fn dispatcher(&self) -> &EventDispatcher<Self> {
        &self.events
    }

    fn dispatcher_mut(&mut self) -> &mut EventDispatcher<Self> {
        &mut self.events
    }
}

impl Composable for Entity {
    fn method_table(&self) -> &MethodTable<Self> {
        &self.methods
    }

    fn method_table_mut(&mut self) -> &mut MethodTable<Self> {
        &mut self.methods
    }
}

impl Bounded for Entity {
    fn position(&self) -> Vector2 {
        Vector2::new(self.data.x, self.data.y)
    }

    fn set_position(&mut self, position: Vector2) {
        self.data.x = position.x;
        self.data.y = position.y;
    }

    fn size(&self) -> Vector2 {
        Vector2::new(self.data.width, self.data.height)
    }

    fn collision_margin(&self) -> Vector2 {
        self.data.collision_margin
    }

    fn radius(&self) -> Option<f64> {
        self.data.radius
    }
}

impl RigidBody for Entity {
    fn velocity(&self) -> Vector2 {
        self.data.velocity
    }

    fn set_velocity(&mut self, velocity: Vector2) {
        self.data.velocity = velocity;
    }

    fn mass(&self) -> f64 {
        self.data.mass
    }

    fn elasticity(&self) -> f64 {
        self.data.elasticity
    }

    fn immovable(&self) -> bool {
        self.data.immovable
    }

    fn allow_collisions(&self) -> CollisionFlags {
        self.data.allow_collisions
    }

    fn touching(&self) -> CollisionFlags {
        self.data.touching
    }

    fn set_touching(&mut self, touching: CollisionFlags) {
        self.data.touching = touching;
    }
}
