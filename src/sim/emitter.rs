//! Particle emitter module
//!
//! An `emitterable` entity owns a private swarm of particles. Before each
//! update it rolls `batchSize` times and spawns one particle from
//! `particleData` per successful roll, until `particleCount` particles have
//! been emitted. Particles are ordinary entities that the emitter updates
//! and draws itself; they never join the world. Once the last particle is
//! emitted and every particle has expired, the emitter deactivates.

use std::cell::RefCell;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::bounds::Bounded;
use super::entity::{Entity, EntityData, EntityId};
use super::modules::builtin_entity_modules;
use crate::compose::{Composable, MethodBundle, Module, ModuleRegistry};
use crate::error::EngineResult;
use crate::vector::Vector2;

/// Adjusts a particle record before the particle is built.
/// Receives the emission index and the emitter's RNG.
pub type ParticleGenerator = Rc<dyn Fn(u64, &mut Pcg32, &mut EntityData)>;

fn default_particle_data() -> Map<String, Value> {
    let defaults = json!({
        "acceleration": [0.0, 0.1],
        "color": "blue",
        "duration": 30,
        "height": 2.0,
        "includedModules": ["movable"],
        "maxSpeed": 2.0,
        "offset": [0.0, 0.0],
        "velocity": [-0.25, 1.0],
        "width": 2.0,
    });
    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Emitter settings, read from the emitter's own entity record
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmitterConfig {
    /// Spawn attempts per update
    pub batch_size: u32,
    /// Chance in `[0, 1]` that an attempt spawns a particle
    pub emission_rate: f64,
    /// Total particles to emit; `None` emits forever
    pub particle_count: Option<u64>,
    /// Base record for every particle. `offset` shifts the spawn point.
    pub particle_data: Map<String, Value>,
    /// Fixed values laid over `particleData`
    pub generator: Map<String, Value>,
    /// RNG seed, the emitter's id when absent
    pub seed: Option<u64>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            emission_rate: 1.0,
            particle_count: None,
            particle_data: default_particle_data(),
            generator: Map::new(),
            seed: None,
        }
    }
}

impl EmitterConfig {
    /// Settings found among the record's extra keys
    pub fn from_data(data: &EntityData) -> EngineResult<Self> {
        Ok(serde_json::from_value(Value::Object(data.extra.clone()))?)
    }
}

struct Swarm {
    particles: Vec<Entity>,
    emitted: u64,
    rng: Pcg32,
}

/// Spawns, updates and draws particles around the entity's center
#[derive(Default, Clone)]
pub struct EmitterModule {
    generator: Option<ParticleGenerator>,
    particle_modules: Option<ModuleRegistry<Entity>>,
}

impl EmitterModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emitter that runs `generator` on every particle record
    pub fn with_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn(u64, &mut Pcg32, &mut EntityData) + 'static,
    {
        self.generator = Some(Rc::new(generator));
        self
    }

    /// Modules particles are composed from; the built-ins when unset
    pub fn with_particle_modules(mut self, modules: ModuleRegistry<Entity>) -> Self {
        self.particle_modules = Some(modules);
        self
    }
}

fn spawn_particle(
    config: &EmitterConfig,
    generator: Option<&ParticleGenerator>,
    modules: &ModuleRegistry<Entity>,
    center: Vector2,
    index: u64,
    rng: &mut Pcg32,
) -> EngineResult<Entity> {
    let mut record = config.particle_data.clone();
    record.insert("x".to_string(), json!(center.x));
    record.insert("y".to_string(), json!(center.y));
    for (key, value) in &config.generator {
        record.insert(key.clone(), value.clone());
    }
    let offset: Vector2 = match record.remove("offset") {
        Some(value) => serde_json::from_value(value)?,
        None => Vector2::ZERO,
    };

    let mut data = EntityData::from_value(Value::Object(record))?;
    if let Some(generator) = generator {
        generator(index, rng, &mut data);
    }
    data.x += offset.x;
    data.y += offset.y;
    Entity::new(EntityId(index as u32), data, modules)
}

impl Module<Entity> for EmitterModule {
    fn name(&self) -> &str {
        "emitterable"
    }

    fn build(&self, entity: &mut Entity) -> EngineResult<MethodBundle<Entity>> {
        let config = EmitterConfig::from_data(&entity.data)?;
        let seed = config.seed.unwrap_or(u64::from(entity.id().0));
        let swarm = Rc::new(RefCell::new(Swarm {
            particles: Vec::new(),
            emitted: 0,
            rng: Pcg32::seed_from_u64(seed),
        }));
        let modules = self
            .particle_modules
            .clone()
            .unwrap_or_else(builtin_entity_modules);
        let generator = self.generator.clone();

        let listed = Rc::clone(&swarm);
        let counted = Rc::clone(&swarm);
        let drawn = Rc::clone(&swarm);
        let mut bundle = MethodBundle::new()
            .method("particles", move |_: &mut Entity, _| {
                let swarm = listed.borrow();
                Value::Array(swarm.particles.iter().map(|p| p.data.to_value()).collect())
            })
            .method("emitted", move |_: &mut Entity, _| json!(counted.borrow().emitted))
            .before("update", move |e: &mut Entity, _| {
                let mut guard = swarm.borrow_mut();
                let swarm = &mut *guard;
                let center = e.center();

                for _ in 0..config.batch_size {
                    if config.particle_count.is_some_and(|count| swarm.emitted >= count) {
                        break;
                    }
                    if swarm.rng.random::<f64>() >= config.emission_rate {
                        continue;
                    }
                    let index = swarm.emitted;
                    match spawn_particle(
                        &config,
                        generator.as_ref(),
                        &modules,
                        center,
                        index,
                        &mut swarm.rng,
                    ) {
                        Ok(particle) => swarm.particles.push(particle),
                        Err(err) => log::warn!("Emitter {} dropped particle {}: {}", e.id(), index, err),
                    }
                    swarm.emitted += 1;
                }

                swarm.particles.retain_mut(|particle| particle.update());

                if config.particle_count == Some(swarm.emitted) && swarm.particles.is_empty() {
                    e.data.active = false;
                }
            });

        // Particles draw before the emitter itself
        if entity.responds_to("draw") {
            bundle = bundle.before("draw", move |_: &mut Entity, _| {
                for particle in drawn.borrow_mut().particles.iter_mut() {
                    particle.draw();
                }
            });
        }

        Ok(bundle)
    }
}
