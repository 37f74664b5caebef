//! # Query — Closure Iteration over Matching Archetypes
//!
//! ```text
//! world.query::<(&mut Body, &Collider)>(|entity, (body, collider)| { ... });
//! ```
//!
//! The requested columns are lifted out of the archetype's column map for the
//! duration of the scan, which lets the borrow checker see that `&mut Body`
//! and `&Collider` never alias. A fetch downcasts the lifted column to
//! `Vec<T>` (one `TypeId` compare) and indexes the row.

use std::any::TypeId;
use std::collections::HashMap;

use super::component::{Column, Component, downcast_mut, downcast_ref};

type Columns = HashMap<TypeId, Box<dyn Column>>;

/// Something that can be fetched per row from an archetype.
///
/// Implemented for `&T`, `&mut T`, and tuples of those up to eight elements.
pub trait QueryParam {
    type Item<'w>;

    /// Columns lifted out of the archetype while the query runs.
    type Column;

    fn type_ids() -> Vec<TypeId>;

    fn extract(columns: &mut Columns) -> Self::Column;

    fn restore(col: Self::Column, columns: &mut Columns);

    fn fetch(col: &mut Self::Column, row: usize) -> Self::Item<'_>;
}

fn lift<T: Component>(columns: &mut Columns) -> (TypeId, Box<dyn Column>) {
    let tid = TypeId::of::<T>();
    let col = columns.remove(&tid).unwrap_or_else(|| {
        panic!(
            "query requested `{}` twice or from a non-matching archetype",
            std::any::type_name::<T>()
        )
    });
    (tid, col)
}

impl<T: Component> QueryParam for &T {
    type Item<'w> = &'w T;
    type Column = (TypeId, Box<dyn Column>);

    fn type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn extract(columns: &mut Columns) -> Self::Column {
        lift::<T>(columns)
    }

    fn restore(col: Self::Column, columns: &mut Columns) {
        columns.insert(col.0, col.1);
    }

    fn fetch(col: &mut Self::Column, row: usize) -> Self::Item<'_> {
        &downcast_ref::<T>(col.1.as_ref())[row]
    }
}

impl<T: Component> QueryParam for &mut T {
    type Item<'w> = &'w mut T;
    type Column = (TypeId, Box<dyn Column>);

    fn type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn extract(columns: &mut Columns) -> Self::Column {
        lift::<T>(columns)
    }

    fn restore(col: Self::Column, columns: &mut Columns) {
        columns.insert(col.0, col.1);
    }

    fn fetch(col: &mut Self::Column, row: usize) -> Self::Item<'_> {
        &mut downcast_mut::<T>(col.1.as_mut())[row]
    }
}

macro_rules! impl_query_tuple {
    ($($P:ident),+) => {
        impl<$($P: QueryParam),+> QueryParam for ($($P,)+) {
            type Item<'w> = ($($P::Item<'w>,)+);
            type Column = ($($P::Column,)+);

            fn type_ids() -> Vec<TypeId> {
                let mut ids = Vec::new();
                $(ids.extend($P::type_ids());)+
                ids
            }

            fn extract(columns: &mut Columns) -> Self::Column {
                ($($P::extract(columns),)+)
            }

            #[allow(non_snake_case)]
            fn restore(col: Self::Column, columns: &mut Columns) {
                let ($($P,)+) = col;
                $($P::restore($P, columns);)+
            }

            #[allow(non_snake_case)]
            fn fetch(col: &mut Self::Column, row: usize) -> Self::Item<'_> {
                let ($($P,)+) = col;
                ($($P::fetch($P, row),)+)
            }
        }
    };
}

impl_query_tuple!(A);
impl_query_tuple!(A, B);
impl_query_tuple!(A, B, C);
impl_query_tuple!(A, B, C, D);
impl_query_tuple!(A, B, C, D, E);
impl_query_tuple!(A, B, C, D, E, F);
impl_query_tuple!(A, B, C, D, E, F, G);
impl_query_tuple!(A, B, C, D, E, F, G, H);
