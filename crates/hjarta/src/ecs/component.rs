//! # Component Columns — Typed Struct-of-Arrays Storage
//!
//! Each archetype stores one dense `Vec<T>` per component type. Row `i` of
//! every column belongs to the same entity, so a query over `(Body, Collider)`
//! walks two contiguous arrays in lockstep.
//!
//! Archetypes are assembled at runtime, so the table cannot name `T`. The
//! [`Column`] trait erases it: `Vec<T>` implements `Column`, and typed access
//! goes through a single `downcast` of the whole vector rather than one per
//! element. Moving a row between archetypes ([`Column::move_row`]) stays typed
//! end to end, so no `unsafe` is involved.

use std::any::{Any, TypeId};

/// Marker bound for anything storable as a component.
pub trait Component: 'static + Send + Sync {}

impl<T: 'static + Send + Sync> Component for T {}

/// A type-erased dense column. Implemented for `Vec<T>`.
///
/// Opaque outside the crate; it only appears in query and bundle plumbing.
pub trait Column: Any + Send + Sync {
    /// An empty column of the same element type.
    fn empty(&self) -> Box<dyn Column>;

    /// Drop row `row`, moving the last row into its place.
    fn swap_remove(&mut self, row: usize);

    /// Swap-remove row `row` and push it onto `dst`, which must hold the same
    /// element type.
    fn move_row(&mut self, row: usize, dst: &mut dyn Column);

    fn len(&self) -> usize;

    fn element_type(&self) -> TypeId;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> Column for Vec<T> {
    fn empty(&self) -> Box<dyn Column> {
        Box::new(Vec::<T>::new())
    }

    fn swap_remove(&mut self, row: usize) {
        Vec::swap_remove(self, row);
    }

    fn move_row(&mut self, row: usize, dst: &mut dyn Column) {
        let value = Vec::swap_remove(self, row);
        downcast_mut::<T>(dst).push(value);
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn element_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Create an empty boxed column for `T`.
pub(crate) fn new_column<T: Component>() -> Box<dyn Column> {
    Box::new(Vec::<T>::new())
}

/// View an erased column as `Vec<T>`.
///
/// # Panics
///
/// Panics if the column holds a different type, which means the archetype
/// bookkeeping is corrupt.
pub(crate) fn downcast_ref<T: Component>(column: &dyn Column) -> &Vec<T> {
    column.as_any().downcast_ref::<Vec<T>>().unwrap_or_else(|| {
        panic!(
            "column type mismatch: expected `{}`",
            std::any::type_name::<T>()
        )
    })
}

/// Mutable counterpart of [`downcast_ref`].
pub(crate) fn downcast_mut<T: Component>(column: &mut dyn Column) -> &mut Vec<T> {
    column.as_any_mut().downcast_mut::<Vec<T>>().unwrap_or_else(|| {
        panic!(
            "column type mismatch: expected `{}`",
            std::any::type_name::<T>()
        )
    })
}
