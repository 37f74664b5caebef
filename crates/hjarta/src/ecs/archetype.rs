//! # Archetypes — Tables Keyed by Component Signature
//!
//! Entities with exactly the same component set share one [`Archetype`]: a
//! table with one typed column per component plus a parallel entity list.
//!
//! ```text
//! Archetype [Transform, WorldTransform]
//!   Transform:      [t0, t1, t2]
//!   WorldTransform: [w0, w1, w2]
//!   entities:       [e4, e9, e1]
//! ```
//!
//! Adding or removing a component migrates the entity's row into the table
//! for the new signature. Queries scan only tables whose signature is a
//! superset of what they ask for.

use std::any::TypeId;
use std::collections::HashMap;

use super::component::Column;
use super::entity::Entity;

/// Sorted, deduplicated component type set identifying an archetype.
pub(crate) type ArchetypeKey = Vec<TypeId>;

pub(crate) fn archetype_key(mut type_ids: Vec<TypeId>) -> ArchetypeKey {
    type_ids.sort();
    type_ids.dedup();
    type_ids
}

pub(crate) struct Archetype {
    pub columns: HashMap<TypeId, Box<dyn Column>>,
    pub entities: Vec<Entity>,
    /// Component type names for error messages and diagnostics.
    pub type_names: HashMap<TypeId, &'static str>,
}

impl Archetype {
    pub fn new(columns: HashMap<TypeId, Box<dyn Column>>) -> Self {
        Self {
            columns,
            entities: Vec::new(),
            type_names: HashMap::new(),
        }
    }

    /// An empty table with the same columns as `self` minus `without`.
    pub fn derive_without(&self, without: TypeId) -> Self {
        let columns = self
            .columns
            .iter()
            .filter(|(tid, _)| **tid != without)
            .map(|(tid, col)| (*tid, col.empty()))
            .collect();
        let mut derived = Self::new(columns);
        derived.type_names = self
            .type_names
            .iter()
            .filter(|(tid, _)| **tid != without)
            .map(|(tid, name)| (*tid, *name))
            .collect();
        derived
    }

    /// An empty table with the same columns as `self` plus `column`.
    pub fn derive_with(&self, column: Box<dyn Column>, name: &'static str) -> Self {
        let type_id = column.element_type();
        let mut columns: HashMap<TypeId, Box<dyn Column>> = self
            .columns
            .iter()
            .map(|(tid, col)| (*tid, col.empty()))
            .collect();
        columns.insert(type_id, column);
        let mut derived = Self::new(columns);
        derived.type_names = self.type_names.clone();
        derived.type_names.insert(type_id, name);
        derived
    }

    pub fn has_component(&self, type_id: &TypeId) -> bool {
        self.columns.contains_key(type_id)
    }

    pub fn matches(&self, required: &[TypeId]) -> bool {
        required.iter().all(|tid| self.columns.contains_key(tid))
    }

    /// Drop the row at `row`. Returns the entity swapped into the hole, if
    /// any, so the caller can fix its location.
    pub fn swap_remove(&mut self, row: usize) -> Option<Entity> {
        for column in self.columns.values_mut() {
            column.swap_remove(row);
        }
        self.entities.swap_remove(row);
        self.entities.get(row).copied()
    }

    /// Move the row at `row` into `dst`. Columns absent from `dst` are
    /// dropped; `dst` columns absent here must be pushed by the caller.
    /// Returns the entity swapped into the hole, if any.
    pub fn move_row(&mut self, row: usize, dst: &mut Archetype) -> Option<Entity> {
        for (tid, column) in self.columns.iter_mut() {
            match dst.columns.get_mut(tid) {
                Some(target) => column.move_row(row, target.as_mut()),
                None => column.swap_remove(row),
            }
        }
        let entity = self.entities.swap_remove(row);
        dst.entities.push(entity);
        self.entities.get(row).copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }
}
