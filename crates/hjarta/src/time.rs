//! Step timing.
//!
//! The [`Time`] resource is advanced by [`State::step`](crate::State::step)
//! before any system runs. Fixed-phase systems read
//! [`fixed_timestep`](Time::fixed_timestep); render-side consumers read
//! [`alpha`](Time::alpha).
//!
//! ```text
//! step(delta):  fixed phase runs once      (always one fixed_timestep)
//!               remainder = delta mod fixed_timestep, capped
//!               alpha = remainder / fixed_timestep
//! ```
//!
//! The remainder is per step and never carried over: the fixed phase
//! advances exactly one tick per step, so there is no debt to pay back.

const REMAINDER_EPSILON: f32 = 1e-4;

/// Step timing resource.
#[derive(Clone, Copy, Debug)]
pub struct Time {
    delta: f32,
    elapsed: f64,
    fixed_timestep: f32,
    remainder: f32,
    max_remainder: f32,
    alpha: f32,
    step_count: u64,
}

impl Time {
    pub fn new(fixed_timestep: f32) -> Self {
        Self {
            delta: 0.0,
            elapsed: 0.0,
            fixed_timestep,
            remainder: 0.0,
            max_remainder: fixed_timestep,
            alpha: 0.0,
            step_count: 0,
        }
    }

    /// Cap the remainder at `steps` fixed intervals. Zero disables blending.
    pub(crate) fn with_max_accumulated_steps(mut self, steps: u32) -> Self {
        self.max_remainder = self.fixed_timestep * steps as f32;
        self
    }

    /// Account for `delta` seconds of caller time. Negative deltas count as
    /// zero.
    pub(crate) fn advance(&mut self, delta: f32) {
        let delta = delta.max(0.0);
        self.delta = delta;
        self.elapsed += f64::from(delta);
        self.step_count += 1;

        if self.fixed_timestep <= 0.0 {
            self.remainder = 0.0;
            self.alpha = 0.0;
            return;
        }
        let mut remainder = delta % self.fixed_timestep;
        // Whole multiples can land a rounding error short of a full interval.
        if self.fixed_timestep - remainder < self.fixed_timestep * REMAINDER_EPSILON {
            remainder = 0.0;
        }
        self.remainder = remainder.clamp(0.0, self.max_remainder);
        self.alpha = (self.remainder / self.fixed_timestep).clamp(0.0, 1.0);
    }

    #[cfg(test)]
    pub(crate) fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    /// Delta passed to the current step, in seconds.
    pub fn delta_secs(&self) -> f32 {
        self.delta
    }

    /// Sum of all step deltas.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed
    }

    /// The constant step the fixed phase integrates with.
    pub fn fixed_timestep(&self) -> f32 {
        self.fixed_timestep
    }

    /// Part of the current delta beyond whole fixed intervals.
    pub fn remainder(&self) -> f32 {
        self.remainder
    }

    /// Progress through the current fixed interval, in `[0, 1]`.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Number of completed `step` calls, including the current one.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }
}
