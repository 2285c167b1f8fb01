//! Timed Actuator Motion
//!
//! ## Overview
//!
//! A remote trigger swings the actuator to a trigger position, holds it there
//! for a fixed time, then returns it to rest. The hold is tracked as a motion
//! record that the control loop services on every tick:
//!
//! ```text
//! command_move(30, 800, t0)          service(t0 + 800)
//!         ↓                                 ↓
//!   position = 30  ──── hold 800 ms ────→ position = 0, MotionComplete
//! ```
//!
//! [`ActuatorController::service`] is O(1) and never blocks, so radio frames
//! and scheduled tasks keep flowing while the actuator is held.
//!
//! ## Overlapping Triggers
//!
//! A new command overwrites the in-flight motion. The actuator jumps to the new
//! target and the hold restarts from the new command's time; there is never
//! more than one pending return to rest.
//!
//! ## Blocking Ramp
//!
//! [`ActuatorController::ramp_to`] is the one **blocking** operation in the
//! crate. It interpolates to a target over a fixed duration in fixed steps,
//! sleeping between steps. It is never called from a scheduler task; callers
//! use the `on_step` hook to keep the link serviced while it runs.

use crate::constants::thresholds::{ACTUATOR_REST_ANGLE, ACTUATOR_TRIGGER_ANGLE};
use crate::constants::time::{ACTUATOR_HOLD_MS, RAMP_DURATION_MS, RAMP_STEPS};
use crate::time::{elapsed_ms, Delay, Timestamp};
use crate::traits::{Actuator, Angle};

/// Actuator positions and timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ActuatorSettings {
    /// Position commanded by a remote trigger
    pub trigger_angle: Angle,
    /// How long the trigger position is held (ms)
    pub hold_ms: u32,
    /// Position returned to after the hold
    pub rest_angle: Angle,
    /// Number of steps in a blocking ramp
    pub ramp_steps: u16,
    /// Total duration of a blocking ramp (ms)
    pub ramp_duration_ms: u32,
}

impl Default for ActuatorSettings {
    fn default() -> Self {
        Self {
            trigger_angle: ACTUATOR_TRIGGER_ANGLE,
            hold_ms: ACTUATOR_HOLD_MS,
            rest_angle: ACTUATOR_REST_ANGLE,
            ramp_steps: RAMP_STEPS,
            ramp_duration_ms: RAMP_DURATION_MS,
        }
    }
}

/// In-flight timed motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorMotion {
    /// Position before the command
    pub start_position: Angle,
    /// Position being held
    pub target_position: Angle,
    /// When the command was issued
    pub start_time: Timestamp,
    /// Hold duration (ms)
    pub duration_ms: u32,
}

impl ActuatorMotion {
    /// When the actuator returns to rest
    pub fn deadline(&self) -> Timestamp {
        self.start_time + self.duration_ms as Timestamp
    }
}

/// Returned once when a timed motion finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionComplete {
    /// The motion that finished
    pub motion: ActuatorMotion,
    /// Time the rest position was set
    pub completed_at: Timestamp,
}

/// Drives one actuator through timed motions
#[derive(Debug)]
pub struct ActuatorController<A: Actuator> {
    actuator: A,
    motion: Option<ActuatorMotion>,
    settings: ActuatorSettings,
}

impl<A: Actuator> ActuatorController<A> {
    /// Controller; the actuator is left where it is
    pub fn new(actuator: A, settings: ActuatorSettings) -> Self {
        Self { actuator, motion: None, settings }
    }

    /// Settings in use
    pub fn settings(&self) -> &ActuatorSettings {
        &self.settings
    }

    /// Underlying actuator
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Current position
    pub fn position(&self) -> Angle {
        self.actuator.position()
    }

    /// Motion currently being held, if any
    pub fn motion(&self) -> Option<&ActuatorMotion> {
        self.motion.as_ref()
    }

    /// Jump to `target` and return to rest after `hold_ms`
    ///
    /// Replaces any motion already in flight.
    pub fn command_move(&mut self, target: Angle, hold_ms: u32, now: Timestamp) {
        if let Some(_previous) = self.motion {
            log_debug!("actuator motion to {} superseded", _previous.target_position);
        }

        let motion = ActuatorMotion {
            start_position: self.actuator.position(),
            target_position: target,
            start_time: now,
            duration_ms: hold_ms,
        };
        self.actuator.set_position(target);
        self.motion = Some(motion);
        log_info!("actuator to {} for {} ms", target, hold_ms);
    }

    /// Trigger motion using the configured angle and hold
    pub fn trigger(&mut self, now: Timestamp) {
        self.command_move(self.settings.trigger_angle, self.settings.hold_ms, now);
    }

    /// Finish the motion if its hold has elapsed
    ///
    /// Call every tick. Returns `Some` exactly once per motion.
    pub fn service(&mut self, now: Timestamp) -> Option<MotionComplete> {
        let motion = self.motion?;
        if now < motion.deadline() {
            return None;
        }

        self.actuator.set_position(self.settings.rest_angle);
        self.motion = None;
        log_info!("actuator back to rest after {} ms", elapsed_ms(motion.start_time, now));
        Some(MotionComplete { motion, completed_at: now })
    }

    /// Interpolate to `target` over the configured ramp duration. **Blocks.**
    ///
    /// Each step sets a truncated intermediate position, calls `on_step`, then
    /// sleeps `ramp_duration_ms / ramp_steps`. The final position is always
    /// set to `target` exactly. Any timed motion is cancelled.
    pub fn ramp_to<D, F>(&mut self, target: Angle, delay: &mut D, mut on_step: F)
    where
        D: Delay,
        F: FnMut(),
    {
        self.motion = None;

        let start = self.actuator.position();
        let steps = self.settings.ramp_steps.max(1);
        let step_delay = self.settings.ramp_duration_ms / steps as u32;
        let span = (target - start) as f32;

        for step in 1..=steps {
            let fraction = step as f32 / steps as f32;
            let position = start + (span * fraction) as Angle;
            self.actuator.set_position(position);
            on_step();
            delay.delay_ms(step_delay);
        }

        self.actuator.set_position(target);
        log_debug!("actuator ramp {} -> {} done", start, target);
    }
}
