//! # Component Registry — Components by Name
//!
//! Loaders outside the core (recipe files, tooling) know components only by
//! name and hand over a dictionary of initial field values. The registry maps
//! each name to monomorphized functions that build the typed component with
//! serde and insert it.
//!
//! ```ignore
//! let mut registry = ComponentRegistry::new();
//! registry.register::<Transform>();
//!
//! let fields = json!({ "position": [0.0, 2.0, 0.0] });
//! registry.add_component(&mut world, entity, "Transform", fields.as_object())?;
//! ```
//!
//! Registered types are expected to use `#[serde(default)]`, so fields the
//! dictionary leaves out take the component's own defaults.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::component::Component;
use super::entity::Entity;
use super::world::World;
use crate::error::EcsError;

type AddFn = fn(&mut World, Entity, Value) -> Result<(), EcsError>;
type RemoveFn = fn(&mut World, Entity) -> bool;
type HasFn = fn(&World, Entity) -> bool;

struct ComponentFns {
    add: AddFn,
    remove: RemoveFn,
    has: HasFn,
}

/// Name → component constructor table.
#[derive(Default)]
pub struct ComponentRegistry {
    by_name: HashMap<String, ComponentFns>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under its short type name (`Transform`, `Body`, ...).
    pub fn register<T>(&mut self)
    where
        T: Component + DeserializeOwned,
    {
        let full = std::any::type_name::<T>();
        let short = full.rsplit("::").next().unwrap_or(full);
        self.register_as::<T>(short);
    }

    /// Register `T` under an explicit name. A later registration under the
    /// same name replaces the earlier one.
    pub fn register_as<T>(&mut self, name: &str)
    where
        T: Component + DeserializeOwned,
    {
        let fns = ComponentFns {
            add: |world, entity, fields| {
                let component: T =
                    serde_json::from_value(fields).map_err(|err| EcsError::InvalidFields {
                        component: std::any::type_name::<T>().to_string(),
                        reason: err.to_string(),
                    })?;
                world.insert(entity, component)
            },
            remove: |world, entity| world.remove::<T>(entity).is_some(),
            has: |world, entity| world.has::<T>(entity),
        };
        self.by_name.insert(name.to_string(), fns);
    }

    fn lookup(&self, name: &str) -> Result<&ComponentFns, EcsError> {
        self.by_name
            .get(name)
            .ok_or_else(|| EcsError::UnknownComponent(name.to_string()))
    }

    /// Build component `name` from `fields` and insert it on `entity`.
    ///
    /// `None` means "all defaults". An existing component of the same type is
    /// replaced.
    pub fn add_component(
        &self,
        world: &mut World,
        entity: Entity,
        name: &str,
        fields: Option<&Map<String, Value>>,
    ) -> Result<(), EcsError> {
        let fns = self.lookup(name)?;
        let fields = Value::Object(fields.cloned().unwrap_or_default());
        (fns.add)(world, entity, fields).map_err(|err| match err {
            EcsError::InvalidFields { reason, .. } => EcsError::InvalidFields {
                component: name.to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Remove component `name` from `entity`. Returns whether it was present.
    pub fn remove_component(
        &self,
        world: &mut World,
        entity: Entity,
        name: &str,
    ) -> Result<bool, EcsError> {
        Ok((self.lookup(name)?.remove)(world, entity))
    }

    pub fn has_component(&self, world: &World, entity: Entity, name: &str) -> Result<bool, EcsError> {
        Ok((self.lookup(name)?.has)(world, entity))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct Health {
        current: u32,
        max: u32,
    }

    fn registry() -> ComponentRegistry {
        let mut registry = ComponentRegistry::new();
        registry.register::<Health>();
        registry
    }

    #[test]
    fn missing_fields_use_defaults() {
        let registry = registry();
        let mut world = World::new();
        let e = world.spawn_empty();
        let fields = json!({ "max": 10 });
        registry
            .add_component(&mut world, e, "Health", fields.as_object())
            .unwrap();
        assert_eq!(world.get::<Health>(e), Some(&Health { current: 0, max: 10 }));
    }

    #[test]
    fn no_fields_means_all_defaults() {
        let registry = registry();
        let mut world = World::new();
        let e = world.spawn_empty();
        registry.add_component(&mut world, e, "Health", None).unwrap();
        assert!(registry.has_component(&world, e, "Health").unwrap());
        assert!(registry.remove_component(&mut world, e, "Health").unwrap());
        assert!(!world.has::<Health>(e));
    }

    #[test]
    fn unknown_name_is_an_error() {
        let registry = registry();
        let mut world = World::new();
        let e = world.spawn_empty();
        let err = registry.add_component(&mut world, e, "Mana", None).unwrap_err();
        assert_eq!(err, EcsError::UnknownComponent("Mana".into()));
    }

    #[test]
    fn wrong_field_type_is_invalid_fields() {
        let registry = registry();
        let mut world = World::new();
        let e = world.spawn_empty();
        let fields = json!({ "max": "lots" });
        let err = registry
            .add_component(&mut world, e, "Health", fields.as_object())
            .unwrap_err();
        assert!(matches!(err, EcsError::InvalidFields { ref component, .. } if component == "Health"));
    }

    #[test]
    fn dead_entity_is_reported() {
        let registry = registry();
        let mut world = World::new();
        let e = world.spawn_empty();
        world.despawn(e);
        let err = registry.add_component(&mut world, e, "Health", None).unwrap_err();
        assert_eq!(err, EcsError::DeadEntity(e));
    }

    #[test]
    fn aliases_share_the_type() {
        let mut registry = registry();
        registry.register_as::<Health>("hp");
        assert_eq!(registry.names(), vec!["Health", "hp"]);
        assert!(registry.contains("hp"));
    }
}
