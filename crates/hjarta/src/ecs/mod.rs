//! # Archetype-Based ECS
//!
//! Entities are generational ids, components live in typed struct-of-arrays
//! tables grouped by component signature, and systems are plain functions
//! over `&mut World` run by a phased [`Schedule`].
//!
//! ## Module Overview
//!
//! - [`entity`] — Generational entity IDs
//! - [`component`] — Typed columns behind a type-erased trait
//! - [`archetype`] — Groups entities by component signature
//! - [`world`] — Central container (entities + components + resources)
//! - [`query`] — Closure-based iteration over matching archetypes
//! - [`system`] — System trait, phases, and the schedule runner
//! - [`hierarchy`] — Weak parent links and the transform resolver
//! - [`registry`] — Components by name, built from field dictionaries

pub(crate) mod archetype;
pub(crate) mod component;
pub mod entity;
pub mod hierarchy;
pub(crate) mod query;
pub mod registry;
pub mod system;
pub mod world;

pub use component::Component;
pub use entity::Entity;
pub use hierarchy::{Parent, TransformPlugin, WorldTransform, resolve_transforms};
pub use query::QueryParam;
pub use registry::ComponentRegistry;
pub use system::{Phase, Placement, Schedule, System};
#[cfg(feature = "diagnostics")]
pub use system::SystemTiming;
pub use world::{SpawnBundle, World};
