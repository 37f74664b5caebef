//! Touch reporting.
//!
//! The engine reports contact start/stop per collider pair while it steps.
//! [`EventCollector`] buffers those reports, and after the step the bridge
//! translates them into entity pairs in the [`TouchEvents`] resource.

use std::sync::{Mutex, PoisonError};

use rapier3d::prelude::*;

use super::components::CollisionEvents;
use super::context::PhysicsContext;
use crate::ecs::{Entity, World};

/// Two entities whose colliders started or stopped touching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TouchEvent {
    pub a: Entity,
    pub b: Entity,
    /// At least one of the colliders is a sensor.
    pub sensor: bool,
}

impl TouchEvent {
    /// Whether `entity` is one side of the pair.
    pub fn involves(&self, entity: Entity) -> bool {
        self.a == entity || self.b == entity
    }

    /// The other side of the pair, if `entity` is one side.
    pub fn other(&self, entity: Entity) -> Option<Entity> {
        if self.a == entity {
            Some(self.b)
        } else if self.b == entity {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Touches that began or ended during the most recent fixed tick.
///
/// Cleared at the start of every tick, so read it from a system that runs
/// after physics in the same step.
#[derive(Debug, Default)]
pub struct TouchEvents {
    pub touched: Vec<TouchEvent>,
    pub ended: Vec<TouchEvent>,
}

impl TouchEvents {
    pub fn clear(&mut self) {
        self.touched.clear();
        self.ended.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.touched.is_empty() && self.ended.is_empty()
    }
}

/// Buffers engine collision events during a step.
#[derive(Default)]
pub(crate) struct EventCollector {
    events: Mutex<Vec<CollisionEvent>>,
}

impl EventCollector {
    pub(crate) fn drain(&self) -> Vec<CollisionEvent> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *events)
    }
}

impl EventHandler for EventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
    }
}

pub(crate) fn reports_touches(world: &World, entity: Entity) -> bool {
    world
        .get::<CollisionEvents>(entity)
        .is_some_and(|flag| flag.enabled)
}

/// Turn this step's engine events into [`TouchEvents`].
///
/// A pair is reported when either entity opted in with
/// [`CollisionEvents`]. A collider released this tick still resolves to its
/// entity, so its pairs get their `ended` entry.
pub(crate) fn publish_touch_events(ctx: &mut PhysicsContext, world: &mut World) {
    let raw = ctx.events.drain();
    if raw.is_empty() {
        ctx.forget_retired();
        return;
    }

    let mut touched = Vec::new();
    let mut ended = Vec::new();
    for event in raw {
        let (Some(a), Some(b)) = (
            ctx.collider_owner(event.collider1()),
            ctx.collider_owner(event.collider2()),
        ) else {
            continue;
        };
        let reports = |handle, entity| {
            ctx.retired_reports_touches(handle)
                .unwrap_or_else(|| reports_touches(world, entity))
        };
        if !reports(event.collider1(), a) && !reports(event.collider2(), b) {
            continue;
        }
        let touch = TouchEvent {
            a,
            b,
            sensor: event.sensor(),
        };
        if event.started() {
            log::trace!("touch started: {a} / {b}");
            touched.push(touch);
        } else {
            log::trace!("touch ended: {a} / {b}");
            ended.push(touch);
        }
    }

    ctx.forget_retired();
    match world.get_resource_mut::<TouchEvents>() {
        Some(events) => {
            events.touched.extend(touched);
            events.ended.extend(ended);
        }
        None => world.insert_resource(TouchEvents { touched, ended }),
    }
}
