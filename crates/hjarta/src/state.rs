//! Simulation state and plugin system.
//!
//! [`State`] owns the [`World`], the [`Schedule`], and the component registry.
//! Hosts configure it with plugins and systems, then call
//! [`step`](State::step) once per frame.
//!
//! ```ignore
//! use hjarta::prelude::*;
//!
//! let mut state = State::with_defaults();
//! state.add_system(Phase::Simulation, spin);
//!
//! loop {
//!     state.step(frame_delta)?;
//! }
//! ```

use std::any::TypeId;
use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::config::SimConfig;
use crate::ecs::hierarchy::{Parent, TransformPlugin};
use crate::ecs::registry::ComponentRegistry;
use crate::ecs::system::{Phase, Placement, Schedule, System};
use crate::ecs::{Entity, World};
use crate::error::{EcsError, StepError};
use crate::interpolation::{InterpolatedTransform, InterpolationPlugin};
use crate::math::Transform;
use crate::time::Time;

/// Bundles related resources and systems.
///
/// ```ignore
/// pub struct WindPlugin;
///
/// impl Plugin for WindPlugin {
///     fn build(&self, state: &mut State) {
///         state.world_mut().insert_resource(Wind::default());
///         state.add_system(Phase::Fixed, apply_wind);
///     }
/// }
/// ```
pub trait Plugin {
    fn build(&self, state: &mut State);
}

/// The simulation: world, systems, and timing.
pub struct State {
    world: World,
    schedule: Schedule,
    registry: ComponentRegistry,
    config: SimConfig,
    plugins: HashSet<TypeId>,
}

impl State {
    /// An empty state with default configuration and no plugins.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// An empty state with the given configuration and no plugins.
    pub fn with_config(config: SimConfig) -> Self {
        let mut world = World::new();
        world.insert_resource(
            Time::new(config.fixed_timestep)
                .with_max_accumulated_steps(config.max_accumulated_steps),
        );

        let mut registry = ComponentRegistry::new();
        registry.register::<Transform>();
        registry.register::<Parent>();
        registry.register::<InterpolatedTransform>();
        #[cfg(feature = "physics3d")]
        crate::physics::register_components(&mut registry);

        log::info!(
            "simulation state created (fixed timestep {:.4}s)",
            config.fixed_timestep
        );
        Self {
            world,
            schedule: Schedule::new(),
            registry,
            config,
            plugins: HashSet::new(),
        }
    }

    /// Default configuration with every built-in plugin installed.
    pub fn with_defaults() -> Self {
        let mut state = Self::new();
        state.add_default_plugins();
        state
    }

    /// Install the transform, interpolation and (with `physics3d`) physics
    /// plugins.
    pub fn add_default_plugins(&mut self) -> &mut Self {
        self.add_plugin(TransformPlugin);
        self.add_plugin(InterpolationPlugin);
        #[cfg(feature = "physics3d")]
        self.add_plugin(crate::physics::PhysicsPlugin);
        self
    }

    /// Install a plugin. Installing the same plugin type twice is a no-op.
    pub fn add_plugin<P: Plugin + 'static>(&mut self, plugin: P) -> &mut Self {
        let name = std::any::type_name::<P>();
        if !self.plugins.insert(TypeId::of::<P>()) {
            log::warn!("plugin {name} already installed, skipping");
            return self;
        }
        plugin.build(self);
        log::info!("installed plugin {name}");
        self
    }

    pub fn add_system<S: System>(&mut self, phase: Phase, system: S) -> &mut Self {
        self.schedule.add_system(phase, system);
        self
    }

    pub fn add_system_at<S: System>(
        &mut self,
        phase: Phase,
        placement: Placement,
        system: S,
    ) -> &mut Self {
        self.schedule.add_system_at(phase, placement, system);
        self
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    pub fn schedule_mut(&mut self) -> &mut Schedule {
        &mut self.schedule
    }

    /// Add a component by registered name from a dictionary of field values.
    pub fn add_component(
        &mut self,
        entity: Entity,
        name: &str,
        fields: Option<&Map<String, Value>>,
    ) -> Result<(), EcsError> {
        self.registry
            .add_component(&mut self.world, entity, name, fields)
    }

    /// Advance the simulation by `delta` seconds of caller time.
    ///
    /// Every phase runs exactly once; the fixed phase always integrates one
    /// constant [`fixed_timestep`](Time::fixed_timestep). A `delta` of zero
    /// still runs every phase. If a system fails, the systems after it are
    /// skipped and the error is returned.
    pub fn step(&mut self, delta: f32) -> Result<(), StepError> {
        self.world.resource_mut::<Time>().advance(delta);
        self.schedule.run(&mut self.world)?;

        #[cfg(feature = "diagnostics")]
        {
            let (spawned, despawned) = self.world.take_entity_churn();
            let total_us: f64 = self.schedule.timings().iter().map(|t| t.duration_us).sum();
            log::trace!(
                "step {} took {:.1}us ({} spawned, {} despawned, {} alive)",
                self.world.resource::<Time>().step_count(),
                total_us,
                spawned,
                despawned,
                self.world.entity_count()
            );
        }
        Ok(())
    }

    /// [`step`](Self::step) with the configured default delta.
    pub fn step_default(&mut self) -> Result<(), StepError> {
        self.step(self.config.default_delta)
    }

    /// Per-system wall-clock timings from the most recent step.
    #[cfg(feature = "diagnostics")]
    pub fn system_timings(&self) -> &[crate::ecs::SystemTiming] {
        self.schedule.timings()
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
