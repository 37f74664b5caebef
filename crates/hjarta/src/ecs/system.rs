//! # System — Functions That Operate on the World
//!
//! A system is a function that takes `&mut World` and returns a
//! [`SystemResult`]. Systems are grouped into [`Phase`]s that always run in
//! the same order every step:
//!
//! ```text
//! Setup → Fixed → Simulation → Draw
//! ```
//!
//! Inside a phase a system may ask to go [`First`](Placement::First) or
//! [`Last`](Placement::Last); everything else keeps registration order. The
//! [`Schedule`] sorts stably by `(phase, placement, registration index)`, so
//! two runs with the same registrations always execute in the same order.
//!
//! A system that returns `Err` stops the step right there. Systems after it
//! don't run and nothing is rolled back.

use super::world::World;
use crate::error::{StepError, SystemResult};

/// Execution group. Phases run in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Setup,
    /// Runs once per step with the constant fixed timestep.
    Fixed,
    Simulation,
    /// Read-only consumers of the resolved scene.
    Draw,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Setup, Phase::Fixed, Phase::Simulation, Phase::Draw];
}

/// Ordering hint within a phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placement {
    First,
    #[default]
    Default,
    Last,
}

/// Something the [`Schedule`] can run.
///
/// Any `FnMut(&mut World) -> SystemResult` is a system. Implement the trait
/// on a struct to get a [`setup`](System::setup) hook, which is called once,
/// right before the system's first run.
pub trait System: 'static {
    fn setup(&mut self, _world: &mut World) -> SystemResult {
        Ok(())
    }

    fn run(&mut self, world: &mut World) -> SystemResult;

    /// Short name used in errors and timings.
    fn name(&self) -> String {
        short_system_name(std::any::type_name::<Self>())
    }
}

impl<F: FnMut(&mut World) -> SystemResult + 'static> System for F {
    fn run(&mut self, world: &mut World) -> SystemResult {
        (self)(world)
    }
}

struct ScheduledSystem {
    name: String,
    phase: Phase,
    placement: Placement,
    order: usize,
    initialized: bool,
    system: Box<dyn System>,
}

/// Wall-clock time of one system during the most recent run.
#[cfg(feature = "diagnostics")]
#[derive(Clone, Debug)]
pub struct SystemTiming {
    pub name: String,
    pub phase: Phase,
    pub duration_us: f64,
}

/// All registered systems, kept in execution order.
pub struct Schedule {
    systems: Vec<ScheduledSystem>,
    next_order: usize,
    sorted: bool,
    #[cfg(feature = "diagnostics")]
    timings: Vec<SystemTiming>,
}

impl Schedule {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            next_order: 0,
            sorted: true,
            #[cfg(feature = "diagnostics")]
            timings: Vec::new(),
        }
    }

    /// Add a system to `phase` with default placement.
    pub fn add_system<S: System>(&mut self, phase: Phase, system: S) {
        self.add_system_at(phase, Placement::Default, system);
    }

    /// Add a system to `phase` with an explicit placement.
    pub fn add_system_at<S: System>(&mut self, phase: Phase, placement: Placement, system: S) {
        self.systems.push(ScheduledSystem {
            name: system.name(),
            phase,
            placement,
            order: self.next_order,
            initialized: false,
            system: Box::new(system),
        });
        self.next_order += 1;
        self.sorted = false;
    }

    fn sort(&mut self) {
        if !self.sorted {
            self.systems
                .sort_by_key(|s| (s.phase, s.placement, s.order));
            self.sorted = true;
        }
    }

    /// Run every system once, phase by phase.
    pub fn run(&mut self, world: &mut World) -> Result<(), StepError> {
        self.sort();
        #[cfg(feature = "diagnostics")]
        self.timings.clear();

        for scheduled in &mut self.systems {
            #[cfg(feature = "diagnostics")]
            let start = std::time::Instant::now();

            let result = if scheduled.initialized {
                scheduled.system.run(world)
            } else {
                scheduled.initialized = true;
                scheduled
                    .system
                    .setup(world)
                    .and_then(|()| scheduled.system.run(world))
            };

            #[cfg(feature = "diagnostics")]
            self.timings.push(SystemTiming {
                name: scheduled.name.clone(),
                phase: scheduled.phase,
                duration_us: start.elapsed().as_secs_f64() * 1_000_000.0,
            });

            if let Err(source) = result {
                return Err(StepError::SystemFailed {
                    system: scheduled.name.clone(),
                    phase: scheduled.phase,
                    source,
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// System names in execution order.
    pub fn system_names(&mut self) -> Vec<(Phase, String)> {
        self.sort();
        self.systems
            .iter()
            .map(|s| (s.phase, s.name.clone()))
            .collect()
    }

    #[cfg(feature = "diagnostics")]
    pub fn timings(&self) -> &[SystemTiming] {
        &self.timings
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip the module path from a type name (`game::gravity_system` →
/// `gravity_system`, `{{closure}}` → `<closure>`).
fn short_system_name(full: &str) -> String {
    let name = full.rsplit("::").next().unwrap_or(full);
    if name.contains("closure") {
        "<closure>".to_string()
    } else {
        name.to_string()
    }
}
