//! Error types.
//!
//! Configuration mistakes (wrong entity, missing component, unknown
//! descriptor) surface as [`EcsError`] at the call site. A failing system
//! aborts the step and surfaces as [`StepError`]. Dangling parents and
//! degenerate collider dimensions are not errors.

use std::error::Error;
use std::fmt;

use crate::ecs::Entity;
use crate::ecs::system::Phase;

/// Boxed error returned by systems.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// What every system returns.
pub type SystemResult = Result<(), BoxError>;

/// Errors from the component store and the component registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EcsError {
    /// The entity was despawned or never existed.
    DeadEntity(Entity),
    /// The entity is alive but lacks a component the caller required.
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },
    /// No component descriptor is registered under this name.
    UnknownComponent(String),
    /// The initial field values could not be converted into the component.
    InvalidFields { component: String, reason: String },
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadEntity(entity) => write!(f, "entity {entity} is not alive"),
            Self::MissingComponent { entity, component } => {
                write!(f, "entity {entity} has no `{component}` component")
            }
            Self::UnknownComponent(name) => write!(f, "no component registered as '{name}'"),
            Self::InvalidFields { component, reason } => {
                write!(f, "invalid fields for component '{component}': {reason}")
            }
        }
    }
}

impl Error for EcsError {}

/// A system failed; the rest of the step was skipped.
#[derive(Debug)]
pub enum StepError {
    SystemFailed {
        system: String,
        phase: Phase,
        source: BoxError,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SystemFailed {
                system,
                phase,
                source,
            } => write!(f, "system '{system}' failed in {phase:?} phase: {source}"),
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SystemFailed { source, .. } => Some(source.as_ref()),
        }
    }
}

/// A configuration document could not be parsed.
#[derive(Debug)]
pub struct ConfigError(pub(crate) serde_json::Error);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid simulation config: {}", self.0)
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}
