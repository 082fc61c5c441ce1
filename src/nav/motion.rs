//! Own-body motion: primitive progress tracking and forward projection
//!
//! The host executes turn and ahead primitives over many ticks. The tracker
//! infers how much of the current primitive is left from telemetry, and the
//! projection replays the same actuation limits to find where the agent will
//! be when a shot leaves the gun.

use serde::{Deserialize, Serialize};

use crate::game::constants::nav::{DISTANCE_EPSILON, STALL_TICKS, TURN_EPSILON};
use crate::game::constants::rules::{
    max_turn_rate, ACCELERATION, DECELERATION, MAX_TURN_RATE_DEG, MAX_VELOCITY,
};
use crate::game::events::{NavCommand, SelfState};
use crate::util::angle::{normal_absolute, normal_relative, sign};
use crate::util::vec2::Vec2;

/// Distance covered while braking from `speed` to a standstill
pub fn stopping_distance(speed: f64) -> f64 {
    let mut speed = speed.abs();
    let mut distance = 0.0;
    while speed > 0.0 {
        speed = (speed - DECELERATION).max(0.0);
        distance += speed;
    }
    distance
}

/// Velocity after one tick of driving toward `remaining` units ahead
///
/// Accelerates by 1 up to the cap, brakes by 2 once the stopping distance
/// reaches what is left, and never overshoots the remaining distance.
pub fn next_velocity(velocity: f64, remaining: f64) -> f64 {
    if remaining.abs() < f64::EPSILON {
        return velocity - sign(velocity) * velocity.abs().min(DECELERATION);
    }
    let direction = sign(remaining);
    let speed = velocity * direction;
    if speed < 0.0 {
        // Moving the wrong way: brake first
        return velocity + direction * (-speed).min(DECELERATION);
    }
    let left = remaining.abs();
    let next = if stopping_distance(speed) >= left - speed {
        (speed - DECELERATION).max(0.0)
    } else {
        (speed + ACCELERATION).min(MAX_VELOCITY)
    };
    // Always make some progress when nearly there
    let next = if next == 0.0 { left.min(ACCELERATION) } else { next };
    next.min(left) * direction
}

/// Ticks to cover `distance` from a standstill
///
/// Legs of at least 48 units reach full speed: 12 ticks to accelerate and
/// brake, plus cruising. Shorter legs follow a triangular profile.
pub fn time_to_travel(distance: f64) -> f64 {
    let full_speed_distance = 48.0;
    let d = distance.abs();
    if d >= full_speed_distance {
        12.0 + (d - full_speed_distance) / MAX_VELOCITY
    } else {
        // Peak speed v covers v²/2 accelerating and v²/4 braking
        let peak = (4.0 * d / 3.0).sqrt();
        1.5 * peak
    }
}

/// One tick of body rotation toward `remaining_turn`
#[inline]
fn turn_step(remaining_turn: f64, velocity: f64, cap: f64) -> f64 {
    let limit = max_turn_rate(velocity).min(cap);
    remaining_turn.clamp(-limit, limit)
}

/// Kinematic state advanced under the host's actuation limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub position: Vec2,
    pub heading: f64,
    pub velocity: f64,
    pub remaining_distance: f64,
    pub remaining_turn: f64,
    /// Current turn rate cap (radians per tick)
    pub turn_cap: f64,
}

impl BodyState {
    /// Advance one tick: rotate, then update velocity, then move
    pub fn step(&mut self) {
        let dh = turn_step(self.remaining_turn, self.velocity, self.turn_cap);
        self.heading = normal_absolute(self.heading + dh);
        self.remaining_turn -= dh;

        self.velocity = next_velocity(self.velocity, self.remaining_distance);
        self.remaining_distance -= self.velocity;
        self.position = self.position.project(self.heading, self.velocity);
    }
}

/// Tracks progress of the current movement primitive from telemetry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionTracker {
    remaining_distance: f64,
    remaining_turn: f64,
    turn_cap: f64,
    last: Option<(Vec2, f64)>,
    stalled: u32,
}

impl Default for MotionTracker {
    fn default() -> Self {
        Self {
            remaining_distance: 0.0,
            remaining_turn: 0.0,
            turn_cap: MAX_TURN_RATE_DEG.to_radians(),
            last: None,
            stalled: 0,
        }
    }
}

impl MotionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a freshly issued primitive
    pub fn begin(&mut self, command: &NavCommand) {
        self.remaining_distance = command.distance;
        self.remaining_turn = command.turn;
        if let Some(rate) = command.max_turn_rate {
            self.turn_cap = rate;
        }
        self.stalled = 0;
    }

    /// Drop whatever is left of the current primitive
    pub fn abort(&mut self) {
        self.remaining_distance = 0.0;
        self.remaining_turn = 0.0;
        self.stalled = 0;
    }

    /// Account for the progress visible in a new status report
    pub fn observe(&mut self, state: &SelfState) {
        if let Some((position, heading)) = self.last {
            let moved = position.distance_to(state.position);
            let turned = normal_relative(state.heading - heading);

            if self.remaining_distance.abs() > 0.0 {
                let left = (self.remaining_distance.abs() - moved).max(0.0);
                self.remaining_distance = left * sign(self.remaining_distance);
            }
            if self.remaining_turn.abs() > 0.0 {
                let after = self.remaining_turn - turned;
                // Overshoot counts as done
                self.remaining_turn = if after * self.remaining_turn <= 0.0 { 0.0 } else { after };
            }

            if !self.is_done() && moved < DISTANCE_EPSILON && turned.abs() < TURN_EPSILON {
                self.stalled += 1;
            } else {
                self.stalled = 0;
            }
        }
        self.last = Some((state.position, state.heading));
    }

    fn is_done(&self) -> bool {
        self.remaining_distance.abs() < DISTANCE_EPSILON && self.remaining_turn.abs() < TURN_EPSILON
    }

    /// The primitive has completed, or made no progress for several ticks
    pub fn is_finished(&self) -> bool {
        self.is_done() || self.stalled >= STALL_TICKS
    }

    pub fn remaining_distance(&self) -> f64 {
        self.remaining_distance
    }

    pub fn remaining_turn(&self) -> f64 {
        self.remaining_turn
    }

    pub fn turn_cap(&self) -> f64 {
        self.turn_cap
    }

    /// Where the body will be `ticks` from now if the primitive runs on
    pub fn project(&self, state: &SelfState, ticks: u64) -> Vec2 {
        let mut body = BodyState {
            position: state.position,
            heading: state.heading,
            velocity: state.velocity,
            remaining_distance: self.remaining_distance,
            remaining_turn: self.remaining_turn,
            turn_cap: self.turn_cap,
        };
        for _ in 0..ticks {
            body.step();
        }
        body.position
    }

    /// Forget all tracked state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_stopping_distance() {
        assert_eq!(stopping_distance(0.0), 0.0);
        assert_eq!(stopping_distance(8.0), 12.0);
        assert_eq!(stopping_distance(-3.0), 1.0);
    }

    #[test]
    fn test_time_to_travel_profile() {
        assert_eq!(time_to_travel(48.0), 12.0);
        assert_eq!(time_to_travel(-128.0), 22.0);
        // Triangular profile meets the trapezoid at the crossover
        assert!((time_to_travel(47.999) - 12.0).abs() < 1e-3);
        assert_eq!(time_to_travel(0.0), 0.0);
    }

    #[test]
    fn test_drive_covers_distance_exactly() {
        let mut body = BodyState {
            position: Vec2::new(100.0, 100.0),
            heading: 0.0,
            velocity: 0.0,
            remaining_distance: 100.0,
            remaining_turn: 0.0,
            turn_cap: MAX_TURN_RATE_DEG.to_radians(),
        };
        let mut peak: f64 = 0.0;
        for _ in 0..40 {
            body.step();
            peak = peak.max(body.velocity);
            assert!(body.velocity.abs() <= MAX_VELOCITY);
        }
        assert_eq!(peak, MAX_VELOCITY);
        assert!(body.remaining_distance.abs() < 1e-9);
        assert!(body.position.approx_eq(Vec2::new(100.0, 200.0), 1e-6));
        assert_eq!(body.velocity, 0.0);
    }

    #[test]
    fn test_reverse_brakes_first() {
        assert_eq!(next_velocity(8.0, -100.0), 6.0);
        assert_eq!(next_velocity(1.0, -100.0), 0.0);
        assert_eq!(next_velocity(0.0, -100.0), -1.0);
    }

    #[test]
    fn test_turn_rate_limited_by_speed() {
        let mut body = BodyState {
            position: Vec2::ZERO,
            heading: 0.0,
            velocity: 8.0,
            remaining_distance: 1000.0,
            remaining_turn: FRAC_PI_2,
            turn_cap: MAX_TURN_RATE_DEG.to_radians(),
        };
        body.step();
        assert!((body.heading - 4f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_tracker_progress_and_finish() {
        let mut tracker = MotionTracker::new();
        let mut state = SelfState {
            position: Vec2::new(100.0, 100.0),
            ..Default::default()
        };
        tracker.observe(&state);
        tracker.begin(&NavCommand::new(0.0, 20.0));
        assert!(!tracker.is_finished());

        state.position = Vec2::new(100.0, 110.0);
        tracker.observe(&state);
        assert!((tracker.remaining_distance() - 10.0).abs() < 1e-9);

        state.position = Vec2::new(100.0, 120.0);
        tracker.observe(&state);
        assert!(tracker.is_finished());
    }

    #[test]
    fn test_tracker_stall() {
        let mut tracker = MotionTracker::new();
        let state = SelfState::default();
        tracker.observe(&state);
        tracker.begin(&NavCommand::new(0.0, 50.0));
        for _ in 0..STALL_TICKS {
            assert!(!tracker.is_finished());
            tracker.observe(&state);
        }
        assert!(tracker.is_finished());
    }

    #[test]
    fn test_turn_overshoot_counts_as_done() {
        let mut tracker = MotionTracker::new();
        let mut state = SelfState::default();
        tracker.observe(&state);
        tracker.begin(&NavCommand::new(0.1, 0.0));
        state.heading = 0.15;
        tracker.observe(&state);
        assert_eq!(tracker.remaining_turn(), 0.0);
        assert!(tracker.is_finished());
    }

    #[test]
    fn test_projection_matches_stepping() {
        let mut tracker = MotionTracker::new();
        let state = SelfState {
            position: Vec2::new(300.0, 300.0),
            heading: FRAC_PI_2,
            velocity: 4.0,
            ..Default::default()
        };
        tracker.begin(&NavCommand::new(0.0, 50.0));
        assert_eq!(tracker.project(&state, 0), state.position);
        let ahead = tracker.project(&state, 30);
        assert!(ahead.approx_eq(Vec2::new(350.0, 300.0), 1e-6));
    }
}
