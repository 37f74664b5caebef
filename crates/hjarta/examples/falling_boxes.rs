//! Falling Boxes — a headless physics run.
//!
//! A stack of boxes drops onto a fixed ground next to a sensor pad. One box
//! gets kicked sideways after a second. Touches with the pad and the drawn
//! (interpolated) heights are logged.
//!
//! Run with `RUST_LOG=info cargo run --example falling_boxes`.

use hjarta::prelude::*;

const STEPS: u32 = 240;

/// Builds the scene on its first run and kicks the top box later.
#[derive(Default)]
struct Scene {
    boxes: Vec<Entity>,
}

impl System for Scene {
    fn setup(&mut self, world: &mut World) -> SystemResult {
        world.spawn((
            Transform::from_xyz(0.0, -0.5, 0.0),
            Body::fixed(),
            Collider::cuboid(10.0, 0.5, 10.0),
        ));

        world.spawn((
            Transform::from_xyz(3.0, 0.1, 0.0),
            Body::fixed(),
            Collider::cuboid(1.0, 0.1, 1.0).with_sensor(true),
            CollisionEvents::default(),
        ));

        for i in 0..4 {
            let y = 2.0 + i as f32 * 1.2;
            let tilt = Vec3::new(0.0, i as f32 * 15.0, 5.0);
            let b = world.spawn((
                Transform::from_xyz(0.0, y, 0.0).with_euler_degrees(tilt),
                Body::dynamic(),
                Collider::cuboid(0.5, 0.5, 0.5).with_restitution(0.2),
                InterpolatedTransform::default(),
            ));
            self.boxes.push(b);
        }
        log::info!("scene ready: {} boxes", self.boxes.len());
        Ok(())
    }

    fn run(&mut self, world: &mut World) -> SystemResult {
        if world.resource::<Time>().step_count() != 60 {
            return Ok(());
        }
        if let Some(&top) = self.boxes.last() {
            world.insert(top, ApplyImpulse::new(Vec3::new(4.0, 2.0, 0.0)))?;
            world.insert(top, ClearCommands {})?;
            log::info!("kicked box {top}");
        }
        Ok(())
    }
}

fn report_touches(world: &mut World) -> SystemResult {
    let events = world.resource::<TouchEvents>();
    for touch in &events.touched {
        log::info!("{} touched {} (sensor: {})", touch.a, touch.b, touch.sensor);
    }
    for touch in &events.ended {
        log::info!("{} left {}", touch.a, touch.b);
    }
    Ok(())
}

fn print_heights(world: &mut World) -> SystemResult {
    let step = world.resource::<Time>().step_count();
    if step % 30 != 0 {
        return Ok(());
    }
    let mut heights = Vec::new();
    world.query_filtered::<(&WorldTransform,), InterpolatedTransform>(|entity, (wt,)| {
        heights.push(format!("{entity}: {:.2}", wt.position().y));
    });
    heights.sort();
    println!("step {step:>3} | {}", heights.join(" | "));
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut state = State::with_defaults();
    state
        .add_system_at(Phase::Setup, Placement::First, Scene::default())
        .add_system_at(Phase::Fixed, Placement::Last, report_touches)
        .add_system(Phase::Draw, print_heights);

    // Frame times that don't line up with the fixed tick.
    let frames = [0.012, 0.021, 0.016, 0.019];
    for i in 0..STEPS {
        state.step(frames[i as usize % frames.len()])?;
    }

    let ctx = state.world().resource::<PhysicsContext>();
    println!("done: {} bodies, {} colliders", ctx.body_count(), ctx.collider_count());
    Ok(())
}
