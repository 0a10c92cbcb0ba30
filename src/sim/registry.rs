//! Named entity constructors
//!
//! Entity data may name a `class`; the world resolves it here instead of
//! looking anything up dynamically. Records without a class build a plain
//! [`Entity`].

use std::collections::HashMap;
use std::rc::Rc;

use super::entity::{Entity, EntityData, EntityId};
use crate::compose::ModuleRegistry;
use crate::error::{EngineError, EngineResult};

/// Builds an entity of one class from its data record
pub type ClassFactory =
    Rc<dyn Fn(EntityId, EntityData, &ModuleRegistry<Entity>) -> EngineResult<Entity>>;

/// Class name -> constructor
#[derive(Default, Clone)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassFactory>,
}

impl std::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.classes.keys().collect();
        names.sort();
        f.debug_struct("ClassRegistry").field("classes", &names).finish()
    }
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the constructor for `name`
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(EntityId, EntityData, &ModuleRegistry<Entity>) -> EngineResult<Entity> + 'static,
    {
        let factory: ClassFactory = Rc::new(factory);
        self.classes.insert(name.to_string(), factory);
        log::debug!("Registered class `{}`", name);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn resolve(&self, name: &str) -> EngineResult<ClassFactory> {
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownClass(name.to_string()))
    }

    /// Construct from `data`, dispatching on its `class` field
    pub fn construct(
        &self,
        id: EntityId,
        data: EntityData,
        modules: &ModuleRegistry<Entity>,
    ) -> EngineResult<Entity> {
        match data.class.clone() {
            Some(class) => {
                let factory = self.resolve(&class)?;
                factory(id, data, modules)
            }
            None => Entity::new(id, data, modules),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::bounds::Bounded;
    use crate::sim::modules::builtin_entity_modules;

    fn registry() -> ClassRegistry {
        let mut classes = ClassRegistry::new();
        classes.register("Wall", |id, mut data, modules| {
            data.immovable = true;
            data.solid = true;
            data.width = 32.0;
            Entity::new(id, data, modules)
        });
        classes
    }

    #[test]
    fn test_construct_by_class() {
        let wall = registry()
            .construct(
                EntityId(3),
                EntityData::default().with_class("Wall"),
                &builtin_entity_modules(),
            )
            .unwrap();
        assert_eq!(wall.id(), EntityId(3));
        assert_eq!(wall.class(), Some("Wall"));
        assert!(wall.data.immovable);
        assert_eq!(wall.size().x, 32.0);
    }

    #[test]
    fn test_construct_without_class_is_plain_entity() {
        let entity = registry()
            .construct(EntityId(1), EntityData::default(), &builtin_entity_modules())
            .unwrap();
        assert_eq!(entity.class(), None);
        assert!(!entity.data.immovable);
    }

    #[test]
    fn test_unknown_class_is_lookup_error() {
        let err = registry()
            .construct(
                EntityId(1),
                EntityData::default().with_class("Dragon"),
                &builtin_entity_modules(),
            )
            .unwrap_err();
        assert_eq!(err, EngineError::UnknownClass("Dragon".into()));
        assert!(err.is_lookup());
    }
}
