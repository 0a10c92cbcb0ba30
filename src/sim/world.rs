//! The world: entity collection and tick cycle
//!
//! A tick publishes `update`, updates every entity, drops the ones that went
//! inactive (publishing `remove` on each), then merges entities added during
//! the tick and publishes `afterUpdate`. While the world is running and not
//! paused, `add` queues new entities so nothing observes the collection
//! change mid-tick.

use serde_json::{Value, json};

use super::bounds::{Bounded, Bounds};
use super::collidable::separate;
use super::collision::ray_rectangle;
use super::engine_modules::builtin_world_modules;
use super::entity::{Entity, EntityData, EntityId};
use super::modules::builtin_entity_modules;
use super::registry::ClassRegistry;
use super::tick::FrameClock;
use crate::compose::{Composable, MethodTable, ModuleRegistry};
use crate::consts::DEFAULT_WORLD_MODULES;
use crate::error::{EngineError, EngineResult};
use crate::events::{Bindable, Event, EventDispatcher};
use crate::settings::Settings;
use crate::vector::Vector2;

/// Callback scheduled with [`World::delay`]
pub type DelayedFn = Box<dyn FnOnce(&mut World)>;

/// Everything a world composes from, injected at construction
pub struct Registries {
    pub world_modules: ModuleRegistry<World>,
    pub entity_modules: ModuleRegistry<Entity>,
    pub classes: ClassRegistry,
}

impl Default for Registries {
    fn default() -> Self {
        Self {
            world_modules: builtin_world_modules(),
            entity_modules: builtin_entity_modules(),
            classes: ClassRegistry::new(),
        }
    }
}

/// Nearest entity hit by a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vector2,
    pub entity: EntityId,
    /// Distance from the ray source to `point`
    pub distance: f64,
}

pub struct World {
    entities: Vec<Entity>,
    queued: Vec<Entity>,
    next_id: u32,
    running: bool,
    advancing: bool,
    age: u64,
    settings: Settings,
    clock: FrameClock,
    delayed: Vec<(i64, DelayedFn)>,
    entity_modules: ModuleRegistry<Entity>,
    classes: ClassRegistry,
    events: EventDispatcher<World>,
    methods: MethodTable<World>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.len())
            .field("queued", &self.queued.len())
            .field("running", &self.running)
            .field("age", &self.age)
            .field("settings", &self.settings)
            .field("methods", &self.methods)
            .finish()
    }
}

impl World {
    /// Compose a world from `settings` and the given registries, then publish `init`
    pub fn new(settings: Settings, registries: Registries) -> EngineResult<Self> {
        let Registries {
            world_modules,
            entity_modules,
            classes,
        } = registries;

        let mut world = Self {
            entities: Vec::new(),
            queued: Vec::new(),
            next_id: 1,
            running: false,
            advancing: false,
            age: 0,
            clock: FrameClock::new(settings.fps),
            settings,
            delayed: Vec::new(),
            entity_modules,
            classes,
            events: EventDispatcher::new(),
            methods: MethodTable::new(),
        };

        let resolved = world_modules.resolve(
            &DEFAULT_WORLD_MODULES,
            &world.settings.included_modules,
            &world.settings.excluded_modules,
        )?;
        for module in resolved {
            world.include(module.as_ref())?;
        }

        world.trigger(Event::Init, &[]);
        log::info!(
            "World initialized ({} fps, modules: {:?})",
            world.settings.fps,
            world.method_table().modules()
        );
        Ok(world)
    }

    /// World with the built-in modules and no registered classes
    pub fn with_settings(settings: Settings) -> EngineResult<Self> {
        Self::new(settings, Registries::default())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn classes_mut(&mut self) -> &mut ClassRegistry {
        &mut self.classes
    }

    pub fn entity_modules_mut(&mut self) -> &mut ModuleRegistry<Entity> {
        &mut self.entity_modules
    }

    /// Number of steps taken while not paused (or frame advancing)
    pub fn age(&self) -> u64 {
        self.age
    }

    // === Entities ===

    /// Build an entity from `data` and add it to the world
    ///
    /// Publishes `beforeAdd` with the data record and `afterAdd` with the new
    /// id and the constructed entity's data.
    pub fn add(&mut self, data: EntityData) -> EngineResult<EntityId> {
        self.trigger(Event::BeforeAdd, &[data.to_value()]);

        let id = EntityId(self.next_id);
        self.next_id += 1;
        let entity = self.classes.construct(id, data, &self.entity_modules)?;

        self.trigger(Event::AfterAdd, &[json!(id.0), entity.data.to_value()]);

        if self.running && !self.settings.paused {
            self.queued.push(entity);
        } else {
            self.entities.push(entity);
        }
        Ok(id)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Entities added during the current tick, merged after it
    pub fn queued(&self) -> &[Entity] {
        &self.queued
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id() == id)
    }

    fn index_of(&self, id: EntityId) -> EngineResult<usize> {
        self.entities
            .iter()
            .position(|e| e.id() == id)
            .ok_or(EngineError::UnknownEntity(id.0))
    }

    /// The last entity whose bounds overlap a 1x1 box at `(x, y)`
    pub fn object_at(&self, x: f64, y: f64) -> Option<EntityId> {
        let probe = Bounds::new(x, y, 1.0, 1.0);
        self.entities
            .iter()
            .rev()
            .find(|e| e.collides(&probe))
            .map(Entity::id)
    }

    // === Tick cycle ===

    pub fn update(&mut self) {
        self.trigger(Event::Update, &[]);

        let mut kept = Vec::with_capacity(self.entities.len());
        let mut removed = Vec::new();
        for mut entity in std::mem::take(&mut self.entities) {
            if entity.update() {
                kept.push(entity);
            } else {
                removed.push(entity);
            }
        }
        self.entities = kept;

        for mut entity in removed {
            entity.trigger(Event::Remove, &[]);
            log::debug!("Removed entity {}", entity.id());
        }

        self.entities.append(&mut self.queued);
        self.trigger(Event::AfterUpdate, &[]);
    }

    /// Publish `beforeDraw`, draw every entity (by `zIndex` when `zSort`
    /// is set), then publish `draw` and `overlay`
    pub fn draw(&mut self) {
        self.trigger(Event::BeforeDraw, &[]);

        let mut order: Vec<usize> = (0..self.entities.len()).collect();
        if self.settings.z_sort {
            order.sort_by_key(|&i| self.entities[i].z_index());
        }
        for i in order {
            self.entities[i].draw();
        }

        self.trigger(Event::Draw, &[]);
        self.trigger(Event::Overlay, &[]);
    }

    /// Update (unless paused) and draw
    pub fn step(&mut self) {
        if !self.settings.paused || self.advancing {
            self.update();
            self.age += 1;
        }
        self.draw();
    }

    /// Step if the frame clock says one is due at `timestamp_ms`.
    /// Does nothing while the world is stopped.
    pub fn run_frame(&mut self, timestamp_ms: f64) -> bool {
        if !self.running {
            return false;
        }
        if self.clock.advance(timestamp_ms) {
            self.step();
            true
        } else {
            false
        }
    }

    pub fn start(&mut self) {
        if !self.running {
            // The clock keeps its last step across stop/start
            self.running = true;
            log::info!("World started");
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            log::info!("World stopped at age {}", self.age);
        }
        self.running = false;
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn pause(&mut self) {
        self.settings.paused = true;
    }

    pub fn play(&mut self) {
        self.settings.paused = false;
    }

    pub fn paused(&self) -> bool {
        self.settings.paused
    }

    /// Pause and run exactly one update
    pub fn frame_advance(&mut self) {
        self.settings.paused = true;
        self.advancing = true;
        self.step();
        self.advancing = false;
    }

    pub fn set_framerate(&mut self, fps: u32) {
        self.settings.fps = fps;
        self.clock.set_fps(fps);
        log::info!("Framerate set to {} fps", self.clock.fps());
        self.stop();
        self.start();
    }

    // === Delay ===

    /// Run `callback` once `steps` more updates have completed
    pub fn delay<F>(&mut self, steps: u32, callback: F) -> EngineResult<()>
    where
        F: FnOnce(&mut World) + 'static,
    {
        if !self.has_module("delay") {
            return Err(EngineError::ModuleNotIncluded("delay".to_string()));
        }
        self.delayed.push((i64::from(steps), Box::new(callback)));
        Ok(())
    }

    pub fn pending_delays(&self) -> usize {
        self.delayed.len()
    }

    /// Count every delay down by one and fire the ones that expired
    pub(crate) fn fire_delayed(&mut self) {
        let (waiting, firing): (Vec<_>, Vec<_>) = std::mem::take(&mut self.delayed)
            .into_iter()
            .map(|(steps, callback)| (steps - 1, callback))
            .partition(|(steps, _)| *steps >= 0);
        self.delayed = waiting;
        for (_, callback) in firing {
            callback(self);
        }
    }

    // === Collision queries ===

    fn solid_entities(&self, exclude: Option<EntityId>) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(move |e| e.solid() && Some(e.id()) != exclude)
    }

    /// Whether any solid entity (other than `exclude`) overlaps `bounds`
    pub fn collides(&self, bounds: &Bounds, exclude: Option<EntityId>) -> bool {
        self.solid_entities(exclude).any(|e| e.collides(bounds))
    }

    /// Every solid entity (other than `exclude`) overlapping `bounds`
    pub fn collides_with(&self, bounds: &Bounds, exclude: Option<EntityId>) -> Vec<EntityId> {
        self.solid_entities(exclude)
            .filter(|e| e.collides(bounds))
            .map(Entity::id)
            .collect()
    }

    /// Nearest solid entity hit by a ray from `source` along `direction`
    pub fn ray_collides(
        &self,
        source: Vector2,
        direction: Vector2,
        exclude: Option<EntityId>,
    ) -> Option<RayHit> {
        let mut nearest: Option<RayHit> = None;
        for entity in self.solid_entities(exclude) {
            let Some(point) = ray_rectangle(source, direction, &entity.centered_bounds()) else {
                continue;
            };
            let distance = point.distance(source);
            if nearest.is_none_or(|hit| distance < hit.distance) {
                nearest = Some(RayHit {
                    point,
                    entity: entity.id(),
                    distance,
                });
            }
        }
        nearest
    }

    // === Collision response ===

    fn pair_mut(&mut self, a: EntityId, b: EntityId) -> EngineResult<(&mut Entity, &mut Entity)> {
        let ia = self.index_of(a)?;
        let ib = self.index_of(b)?;
        if ia < ib {
            let (left, right) = self.entities.split_at_mut(ib);
            Ok((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.entities.split_at_mut(ia);
            Ok((&mut right[0], &mut left[ib]))
        }
    }

    /// Separate two entities. An entity never collides with itself.
    pub fn separate(&mut self, a: EntityId, b: EntityId) -> EngineResult<bool> {
        if a == b {
            self.index_of(a)?;
            return Ok(false);
        }
        let (a, b) = self.pair_mut(a, b)?;
        Ok(separate(a, b))
    }

    /// Separate every pair of solid entities, in collection order.
    /// Returns how many pairs were corrected.
    pub fn separate_all(&mut self) -> usize {
        let mut resolved = 0;
        for j in 1..self.entities.len() {
            let (left, right) = self.entities.split_at_mut(j);
            let b = &mut right[0];
            if !b.solid() {
                continue;
            }
            for a in left.iter_mut().filter(|a| a.solid()) {
                if separate(a, b) {
                    resolved += 1;
                }
            }
        }
        resolved
    }
}

impl Bindable for World {
    fn dispatcher(&self) -> &EventDispatcher<Self> {
        &self.events
    }

    fn dispatcher_mut(&mut self) -> &mut EventDispatcher<Self> {
        &mut self.events
    }
}

impl Composable for World {
    fn method_table(&self) -> &MethodTable<Self> {
        &self.methods
    }

    fn method_table_mut(&mut self) -> &mut MethodTable<Self> {
        &mut self.methods
    }
}

/// Argument helper for late-bound world methods
pub(crate) fn entity_arg(args: &[Value], index: usize) -> Option<EntityId> {
    args.get(index)
        .and_then(Value::as_u64)
        .and_then(|id| u32::try_from(id).ok())
        .map(EntityId)
}
