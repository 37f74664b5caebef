//! # Hjarta — Game Simulation Core
//!
//! A headless simulation runtime: an archetype ECS, a phased system
//! scheduler with a fixed-timestep phase, a transform hierarchy resolver,
//! render interpolation between fixed ticks and (with `physics3d`) a Rapier
//! physics bridge.
//!
//! Start with `use hjarta::prelude::*`, build a [`State`], and call
//! [`State::step`] once per frame.

pub mod config;
pub mod ecs;
pub mod error;
pub mod interpolation;
pub mod math;
pub mod prelude;
pub mod state;
pub mod time;

#[cfg(feature = "physics3d")]
pub mod physics;

pub use config::SimConfig;
pub use error::{ConfigError, EcsError, StepError};
pub use state::{Plugin, State};
