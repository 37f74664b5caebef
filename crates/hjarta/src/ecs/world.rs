//! # World — Entities, Components, Resources
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ World                                                │
//! │                                                      │
//! │  allocator: generational entity ids                  │
//! │                                                      │
//! │  archetypes: HashMap<ArchetypeKey, Archetype>        │
//! │    key   = sorted Vec<TypeId>                        │
//! │    value = one Vec<T> per component + entity list    │
//! │                                                      │
//! │  locations: HashMap<u32, EntityLocation>             │
//! │    entity index → (archetype key, row)               │
//! │                                                      │
//! │  resources: HashMap<TypeId, Box<dyn Any>>            │
//! │    singletons such as Time or PhysicsContext         │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure policy
//!
//! Lookups that may legitimately miss (`get`, `get_mut`, `remove`) return
//! `Option`. Calls where a missing entity or component is a caller mistake
//! (`insert`, `component`, `component_mut`) return [`EcsError`] so systems
//! can propagate it with `?`.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use super::archetype::{Archetype, ArchetypeKey, archetype_key};
use super::component::{Column, Component, downcast_mut, downcast_ref, new_column};
use super::entity::{Entity, EntityAllocator};
use super::hierarchy::Parent;
use super::query::QueryParam;
use crate::error::EcsError;

#[derive(Clone)]
struct EntityLocation {
    key: ArchetypeKey,
    row: usize,
}

/// Owns every entity, its components, and the global resources.
pub struct World {
    allocator: EntityAllocator,
    archetypes: HashMap<ArchetypeKey, Archetype>,
    locations: HashMap<u32, EntityLocation>,
    resources: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    #[cfg(feature = "diagnostics")]
    spawned_this_step: u32,
    #[cfg(feature = "diagnostics")]
    despawned_this_step: u32,
}

impl World {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            archetypes: HashMap::new(),
            locations: HashMap::new(),
            resources: HashMap::new(),
            #[cfg(feature = "diagnostics")]
            spawned_this_step: 0,
            #[cfg(feature = "diagnostics")]
            despawned_this_step: 0,
        }
    }

    // ── Resources ────────────────────────────────────────────────────

    /// Insert a resource, replacing any previous value of the same type.
    pub fn insert_resource<T: Component>(&mut self, value: T) {
        self.resources.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// # Panics
    ///
    /// Panics if the resource hasn't been inserted.
    pub fn resource<T: Component>(&self) -> &T {
        self.get_resource::<T>().unwrap_or_else(|| {
            panic!(
                "Resource `{}` not found. Did you forget to insert it?",
                std::any::type_name::<T>()
            )
        })
    }

    /// # Panics
    ///
    /// Panics if the resource hasn't been inserted.
    pub fn resource_mut<T: Component>(&mut self) -> &mut T {
        self.get_resource_mut::<T>().unwrap_or_else(|| {
            panic!(
                "Resource `{}` not found. Did you forget to insert it?",
                std::any::type_name::<T>()
            )
        })
    }

    pub fn get_resource<T: Component>(&self) -> Option<&T> {
        self.resources
            .get(&TypeId::of::<T>())
            .and_then(|r| r.downcast_ref::<T>())
    }

    pub fn get_resource_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.resources
            .get_mut(&TypeId::of::<T>())
            .and_then(|r| r.downcast_mut::<T>())
    }

    pub fn has_resource<T: Component>(&self) -> bool {
        self.resources.contains_key(&TypeId::of::<T>())
    }

    /// Take a resource out of the world.
    ///
    /// Systems that need a resource and the component tables at the same
    /// time remove it, work, then insert it back.
    pub fn resource_remove<T: Component>(&mut self) -> Option<T> {
        self.resources
            .remove(&TypeId::of::<T>())
            .and_then(|r| r.downcast::<T>().ok())
            .map(|b| *b)
    }

    // ── Entities ─────────────────────────────────────────────────────

    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Spawn an entity from a tuple of components.
    ///
    /// ```ignore
    /// let e = world.spawn((Transform::default(), Body::dynamic()));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the bundle names the same component type twice.
    pub fn spawn<B: SpawnBundle>(&mut self, bundle: B) -> Entity {
        let type_ids = B::type_ids();
        let key = archetype_key(type_ids.clone());
        assert_eq!(
            key.len(),
            type_ids.len(),
            "spawn bundle `{}` repeats a component type",
            std::any::type_name::<B>()
        );

        let entity = self.allocator.allocate();
        #[cfg(feature = "diagnostics")]
        {
            self.spawned_this_step += 1;
        }

        let arch = self
            .archetypes
            .entry(key.clone())
            .or_insert_with(|| Archetype::new(B::create_columns()));
        for (tid, name) in B::type_names() {
            arch.type_names.entry(tid).or_insert(name);
        }
        let row = arch.len();
        arch.entities.push(entity);
        bundle.push_into(&mut arch.columns);
        self.locations.insert(entity.index, EntityLocation { key, row });
        entity
    }

    pub fn spawn_empty(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        #[cfg(feature = "diagnostics")]
        {
            self.spawned_this_step += 1;
        }

        let key = archetype_key(Vec::new());
        let arch = self
            .archetypes
            .entry(key.clone())
            .or_insert_with(|| Archetype::new(HashMap::new()));
        let row = arch.len();
        arch.entities.push(entity);
        self.locations.insert(entity.index, EntityLocation { key, row });
        entity
    }

    /// Spawn an entity and point its [`Parent`] at `parent`.
    ///
    /// The link is weak: `parent` may be dead or may never get a
    /// `Transform`, in which case the child simply doesn't resolve.
    pub fn spawn_child<B: SpawnBundle>(&mut self, parent: Entity, bundle: B) -> Entity {
        let child = self.spawn(bundle);
        self.attach(child, Parent { entity: parent });
        child
    }

    /// Despawn an entity and drop all of its components.
    ///
    /// Children are not touched; their `Parent` link just stops resolving.
    /// Returns `false` for dead or unknown ids.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.allocator.is_alive(entity) {
            return false;
        }
        if let Some(loc) = self.locations.remove(&entity.index) {
            if let Some(arch) = self.archetypes.get_mut(&loc.key) {
                if let Some(swapped) = arch.swap_remove(loc.row) {
                    if let Some(swapped_loc) = self.locations.get_mut(&swapped.index) {
                        swapped_loc.row = loc.row;
                    }
                }
            }
        }
        self.allocator.deallocate(entity);
        #[cfg(feature = "diagnostics")]
        {
            self.despawned_this_step += 1;
        }
        true
    }

    /// Spawn/despawn counts since the last call.
    #[cfg(feature = "diagnostics")]
    pub(crate) fn take_entity_churn(&mut self) -> (u32, u32) {
        let churn = (self.spawned_this_step, self.despawned_this_step);
        self.spawned_this_step = 0;
        self.despawned_this_step = 0;
        churn
    }

    // ── Per-entity access ────────────────────────────────────────────

    fn location(&self, entity: Entity) -> Option<&EntityLocation> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        self.locations.get(&entity.index)
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.location(entity)
            .and_then(|loc| self.archetypes.get(&loc.key))
            .is_some_and(|arch| arch.has_component(&TypeId::of::<T>()))
    }

    /// Returns `None` if the entity is dead or lacks `T`.
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let loc = self.location(entity)?;
        let column = self.archetypes.get(&loc.key)?.columns.get(&TypeId::of::<T>())?;
        downcast_ref::<T>(column.as_ref()).get(loc.row)
    }

    /// Returns `None` if the entity is dead or lacks `T`.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let loc = self.location(entity)?.clone();
        let column = self
            .archetypes
            .get_mut(&loc.key)?
            .columns
            .get_mut(&TypeId::of::<T>())?;
        downcast_mut::<T>(column.as_mut()).get_mut(loc.row)
    }

    /// Like [`get`](Self::get), but a miss is an error.
    pub fn component<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        if !self.allocator.is_alive(entity) {
            return Err(EcsError::DeadEntity(entity));
        }
        self.get::<T>(entity).ok_or(EcsError::MissingComponent {
            entity,
            component: short_type_name::<T>(),
        })
    }

    /// Like [`get_mut`](Self::get_mut), but a miss is an error.
    pub fn component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        if !self.allocator.is_alive(entity) {
            return Err(EcsError::DeadEntity(entity));
        }
        self.get_mut::<T>(entity).ok_or(EcsError::MissingComponent {
            entity,
            component: short_type_name::<T>(),
        })
    }

    // ── Adding and removing components ───────────────────────────────

    /// Add `component` to `entity`, replacing an existing `T` in place.
    ///
    /// A new component type moves the entity into the archetype for its new
    /// signature.
    pub fn insert<T: Component>(&mut self, entity: Entity, component: T) -> Result<(), EcsError> {
        let loc = self
            .location(entity)
            .cloned()
            .ok_or(EcsError::DeadEntity(entity))?;

        if let Some(existing) = self.get_mut::<T>(entity) {
            *existing = component;
            return Ok(());
        }

        let mut type_ids = loc.key.clone();
        type_ids.push(TypeId::of::<T>());
        let new_key = archetype_key(type_ids);
        self.relocate(entity, &loc, &new_key, |src| {
            src.derive_with(new_column::<T>(), std::any::type_name::<T>())
        });
        if let Some(column) = self
            .archetypes
            .get_mut(&new_key)
            .and_then(|arch| arch.columns.get_mut(&TypeId::of::<T>()))
        {
            downcast_mut::<T>(column.as_mut()).push(component);
        }
        Ok(())
    }

    /// Remove `T` from `entity` and hand it back.
    ///
    /// Returns `None` if the entity is dead or didn't have `T`.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let loc = self.location(entity)?.clone();
        let tid = TypeId::of::<T>();

        // Lift the column out first so the migration below only sees the
        // columns that travel with the entity.
        let mut column = self.archetypes.get_mut(&loc.key)?.columns.remove(&tid)?;
        let value = downcast_mut::<T>(column.as_mut()).swap_remove(loc.row);

        let new_key: ArchetypeKey = loc.key.iter().copied().filter(|t| *t != tid).collect();
        self.relocate(entity, &loc, &new_key, |src| src.derive_without(tid));
        if let Some(arch) = self.archetypes.get_mut(&loc.key) {
            arch.columns.insert(tid, column);
        }
        Some(value)
    }

    /// Insert a [`Parent`] without going through the error path; used where
    /// the entity was just spawned.
    fn attach(&mut self, entity: Entity, parent: Parent) {
        if self.insert(entity, parent).is_err() {
            log::warn!("attach: entity {entity} vanished before its parent link was set");
        }
    }

    /// Move `entity`'s row from `loc` into the archetype at `to`, creating it
    /// from `template` if needed. Columns not present in the destination are
    /// dropped; destination columns not present in the source are left for
    /// the caller to push.
    fn relocate(
        &mut self,
        entity: Entity,
        loc: &EntityLocation,
        to: &ArchetypeKey,
        template: impl FnOnce(&Archetype) -> Archetype,
    ) {
        let Some(mut src) = self.archetypes.remove(&loc.key) else {
            return;
        };
        let dst = self
            .archetypes
            .entry(to.clone())
            .or_insert_with(|| template(&src));
        let swapped = src.move_row(loc.row, dst);
        let new_row = dst.len() - 1;
        self.archetypes.insert(loc.key.clone(), src);

        if let Some(swapped) = swapped {
            if let Some(swapped_loc) = self.locations.get_mut(&swapped.index) {
                swapped_loc.row = loc.row;
            }
        }
        self.locations.insert(
            entity.index,
            EntityLocation {
                key: to.clone(),
                row: new_row,
            },
        );
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Every entity that has a `T`.
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        let type_id = TypeId::of::<T>();
        let mut result = Vec::new();
        for arch in self.archetypes.values() {
            if arch.has_component(&type_id) {
                result.extend_from_slice(&arch.entities);
            }
        }
        result
    }

    fn matching_keys(&self, required: &[TypeId], excluded: Option<TypeId>) -> Vec<ArchetypeKey> {
        self.archetypes
            .iter()
            .filter(|(_, arch)| !arch.entities.is_empty() && arch.matches(required))
            .filter(|(_, arch)| excluded.is_none_or(|tid| !arch.has_component(&tid)))
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn run_query<Q: QueryParam>(
        &mut self,
        keys: Vec<ArchetypeKey>,
        mut f: impl FnMut(Entity, Q::Item<'_>),
    ) {
        for key in keys {
            let Some(arch) = self.archetypes.get_mut(&key) else {
                continue;
            };
            let mut cols = Q::extract(&mut arch.columns);
            for row in 0..arch.entities.len() {
                f(arch.entities[row], Q::fetch(&mut cols, row));
            }
            Q::restore(cols, &mut arch.columns);
        }
    }

    /// Visit every entity that has all of `Q`'s components.
    ///
    /// ```ignore
    /// world.query::<(&mut Transform, &Body)>(|entity, (transform, body)| {
    ///     transform.position = body.position;
    /// });
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `Q` names the same component twice.
    pub fn query<Q: QueryParam>(&mut self, f: impl FnMut(Entity, Q::Item<'_>)) {
        let keys = self.matching_keys(&Q::type_ids(), None);
        self.run_query::<Q>(keys, f);
    }

    /// Like [`query`](Self::query), restricted to entities that also have `F`.
    pub fn query_filtered<Q: QueryParam, F: Component>(
        &mut self,
        f: impl FnMut(Entity, Q::Item<'_>),
    ) {
        let mut required = Q::type_ids();
        required.push(TypeId::of::<F>());
        let keys = self.matching_keys(&required, None);
        self.run_query::<Q>(keys, f);
    }

    /// Like [`query`](Self::query), skipping entities that have `F`.
    pub fn query_without<Q: QueryParam, F: Component>(
        &mut self,
        f: impl FnMut(Entity, Q::Item<'_>),
    ) {
        let keys = self.matching_keys(&Q::type_ids(), Some(TypeId::of::<F>()));
        self.run_query::<Q>(keys, f);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

// ── Spawn bundles ────────────────────────────────────────────────────────

/// A tuple of components spawned together. Implemented for tuples up to
/// eight elements.
pub trait SpawnBundle: 'static {
    fn type_ids() -> Vec<TypeId>;

    fn type_names() -> Vec<(TypeId, &'static str)>;

    fn create_columns() -> HashMap<TypeId, Box<dyn Column>>;

    fn push_into(self, columns: &mut HashMap<TypeId, Box<dyn Column>>);
}

fn push_value<T: Component>(columns: &mut HashMap<TypeId, Box<dyn Column>>, value: T) {
    if let Some(column) = columns.get_mut(&TypeId::of::<T>()) {
        downcast_mut::<T>(column.as_mut()).push(value);
    }
}

macro_rules! impl_spawn_bundle {
    ($($T:ident),+) => {
        impl<$($T: Component),+> SpawnBundle for ($($T,)+) {
            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$T>()),+]
            }

            fn type_names() -> Vec<(TypeId, &'static str)> {
                vec![$((TypeId::of::<$T>(), std::any::type_name::<$T>())),+]
            }

            fn create_columns() -> HashMap<TypeId, Box<dyn Column>> {
                let mut map = HashMap::new();
                $(map.insert(TypeId::of::<$T>(), new_column::<$T>());)+
                map
            }

            #[allow(non_snake_case)]
            fn push_into(self, columns: &mut HashMap<TypeId, Box<dyn Column>>) {
                let ($($T,)+) = self;
                $(push_value::<$T>(columns, $T);)+
            }
        }
    };
}

impl_spawn_bundle!(A);
impl_spawn_bundle!(A, B);
impl_spawn_bundle!(A, B, C);
impl_spawn_bundle!(A, B, C, D);
impl_spawn_bundle!(A, B, C, D, E);
impl_spawn_bundle!(A, B, C, D, E, F);
impl_spawn_bundle!(A, B, C, D, E, F, G);
impl_spawn_bundle!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    #[derive(Debug, PartialEq)]
    struct Health(u32);

    struct Marker;

    #[test]
    fn spawn_and_query() {
        let mut world = World::new();
        world.spawn((Position { x: 1.0, y: 2.0 }, Velocity { dx: 0.5, dy: -0.5 }));
        world.spawn((Position { x: 3.0, y: 4.0 }, Velocity { dx: 1.0, dy: 1.0 }));
        world.spawn((Position { x: 5.0, y: 6.0 },));

        let mut results = Vec::new();
        world.query::<(&Position, &Velocity)>(|_, (p, v)| {
            results.push((p.x, p.y, v.dx, v.dy));
        });
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn query_mutate() {
        let mut world = World::new();
        let e = world.spawn((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 2.0 }));
        world.query::<(&mut Position, &Velocity)>(|_, (pos, vel)| {
            pos.x += vel.dx;
            pos.y += vel.dy;
        });
        assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 2.0 }));
    }

    #[test]
    fn filtered_and_excluding_queries() {
        let mut world = World::new();
        world.spawn((Position { x: 0.0, y: 0.0 }, Marker));
        world.spawn((Position { x: 1.0, y: 1.0 },));

        let mut with = Vec::new();
        world.query_filtered::<(&Position,), Marker>(|_, (p,)| with.push(p.x));
        assert_eq!(with, vec![0.0]);

        let mut without = Vec::new();
        world.query_without::<(&Position,), Marker>(|_, (p,)| without.push(p.x));
        assert_eq!(without, vec![1.0]);
    }

    #[test]
    fn despawn_swap_remove_preserves_data() {
        let mut world = World::new();
        let e0 = world.spawn((Health(10),));
        let e1 = world.spawn((Health(20),));
        let e2 = world.spawn((Health(30),));
        assert!(world.despawn(e0));
        assert!(!world.despawn(e0));

        assert_eq!(world.get::<Health>(e1), Some(&Health(20)));
        assert_eq!(world.get::<Health>(e2), Some(&Health(30)));
        assert_eq!(world.get::<Health>(e0), None);
        assert_eq!(world.entity_count(), 2);
    }

    #[test]
    fn insert_migrates_and_keeps_existing_data() {
        let mut world = World::new();
        let other = world.spawn((Position { x: 9.0, y: 9.0 },));
        let e = world.spawn((Position { x: 1.0, y: 2.0 },));
        world.insert(e, Velocity { dx: 3.0, dy: 4.0 }).unwrap();

        assert_eq!(world.get::<Velocity>(e), Some(&Velocity { dx: 3.0, dy: 4.0 }));
        assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 2.0 }));
        assert_eq!(world.get::<Position>(other), Some(&Position { x: 9.0, y: 9.0 }));
    }

    #[test]
    fn insert_moves_swapped_entity_row() {
        let mut world = World::new();
        let a = world.spawn((Health(1),));
        let b = world.spawn((Health(2),));
        world.insert(a, Marker).unwrap();
        // `b` was swapped into row 0 of the old table.
        assert_eq!(world.get::<Health>(b), Some(&Health(2)));
        assert_eq!(world.get::<Health>(a), Some(&Health(1)));
        assert!(world.has::<Marker>(a));
        assert!(!world.has::<Marker>(b));
    }

    #[test]
    fn insert_replaces_existing_component() {
        let mut world = World::new();
        let e = world.spawn((Health(50),));
        world.insert(e, Health(100)).unwrap();
        assert_eq!(world.get::<Health>(e), Some(&Health(100)));
        assert_eq!(world.archetype_count(), 1);
    }

    #[test]
    fn insert_on_dead_entity_is_an_error() {
        let mut world = World::new();
        let e = world.spawn_empty();
        world.despawn(e);
        assert_eq!(world.insert(e, Health(1)), Err(EcsError::DeadEntity(e)));
    }

    #[test]
    fn remove_returns_the_value() {
        let mut world = World::new();
        let first = world.spawn((Position { x: 5.0, y: 5.0 }, Health(7)));
        let e = world.spawn((Position { x: 1.0, y: 2.0 }, Health(3)));
        assert_eq!(world.remove::<Health>(e), Some(Health(3)));
        assert_eq!(world.remove::<Health>(e), None);
        assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 2.0 }));
        assert_eq!(world.get::<Health>(first), Some(&Health(7)));
    }

    #[test]
    fn remove_from_first_row_keeps_table_consistent() {
        let mut world = World::new();
        let a = world.spawn((Position { x: 0.0, y: 0.0 }, Health(1)));
        let b = world.spawn((Position { x: 1.0, y: 1.0 }, Health(2)));
        assert_eq!(world.remove::<Health>(a), Some(Health(1)));
        assert_eq!(world.get::<Health>(b), Some(&Health(2)));
        assert_eq!(world.get::<Position>(b), Some(&Position { x: 1.0, y: 1.0 }));

        let mut healths = Vec::new();
        world.query::<(&Health,)>(|_, (h,)| healths.push(h.0));
        assert_eq!(healths, vec![2]);
    }

    #[test]
    fn component_reports_missing_type() {
        let mut world = World::new();
        let e = world.spawn((Health(1),));
        let err = world.component::<Position>(e).unwrap_err();
        assert_eq!(
            err,
            EcsError::MissingComponent {
                entity: e,
                component: "Position",
            }
        );
        world.component_mut::<Health>(e).unwrap().0 = 4;
        assert_eq!(world.component::<Health>(e).unwrap(), &Health(4));
    }

    #[test]
    fn stale_handle_does_not_see_new_occupant() {
        let mut world = World::new();
        let old = world.spawn((Health(1),));
        world.despawn(old);
        let new = world.spawn((Health(2),));
        assert_eq!(new.index(), old.index());
        assert!(world.get::<Health>(old).is_none());
        assert!(!world.has::<Health>(old));
    }

    #[test]
    fn spawn_child_links_parent() {
        let mut world = World::new();
        let parent = world.spawn_empty();
        let child = world.spawn_child(parent, (Health(1),));
        assert_eq!(world.get::<Parent>(child).map(|p| p.entity), Some(parent));
    }

    #[test]
    #[should_panic(expected = "repeats a component type")]
    fn duplicate_bundle_types_panic() {
        let mut world = World::new();
        world.spawn((Health(1), Health(2)));
    }

    #[test]
    fn resources_and_extract_reinsert() {
        let mut world = World::new();
        world.insert_resource(42u32);
        assert_eq!(*world.resource::<u32>(), 42);
        *world.resource_mut::<u32>() = 7;

        let taken = world.resource_remove::<u32>();
        assert_eq!(taken, Some(7));
        assert!(!world.has_resource::<u32>());
        assert!(world.get_resource::<u32>().is_none());
        world.insert_resource(taken.unwrap());
        assert_eq!(*world.resource::<u32>(), 7);
    }

    #[test]
    fn entities_with_lists_every_holder() {
        let mut world = World::new();
        let a = world.spawn((Health(1),));
        let b = world.spawn((Health(2), Marker));
        world.spawn((Marker,));
        let mut found = world.entities_with::<Health>();
        found.sort();
        assert_eq!(found, vec![a, b]);
    }
}
