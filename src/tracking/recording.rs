//! Kinematic samples and forward extrapolation
//!
//! A recording is extrapolated as a sequence of constant-length steps whose
//! heading rotates by a constant turn rate: step `k` moves `velocity` units
//! along `heading + k * turn_rate`. The closed form below is the exact sum of
//! that series; [`Recording::advance_stepwise`] is kept as its oracle.

use serde::{Deserialize, Serialize};

use crate::util::vec2::Vec2;

/// Turn rates smaller than this use the straight-line sum
const STRAIGHT_EPSILON: f64 = 1e-9;

/// One immutable kinematic sample of an opponent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub tick: u64,
    pub position: Vec2,
    /// Absolute compass heading (radians)
    pub heading: f64,
    /// Signed speed along the heading
    pub velocity: f64,
    /// Heading change per tick, radians in (-π, π]
    pub turn_rate: f64,
    pub energy: f64,
    /// Absolute bearing from the observer at sampling time
    pub bearing: f64,
    /// Which way the opponent is breaking across the line of sight, +1 or -1
    pub lateral_direction: f64,
}

impl Recording {
    /// Displacement over `steps` ticks by the closed-form sum
    pub fn displacement(&self, steps: u64) -> Vec2 {
        if steps == 0 {
            return Vec2::ZERO;
        }
        let n = steps as f64;
        let a = self.turn_rate;
        if a.abs() < STRAIGHT_EPSILON {
            return Vec2::from_heading(self.heading) * (self.velocity * n);
        }
        // sum_{k<n} sin(h + k a) = sin(h + (n-1)a/2) sin(na/2) / sin(a/2), same for cos
        let mid = self.heading + (n - 1.0) * a / 2.0;
        let scale = self.velocity * (n * a / 2.0).sin() / (a / 2.0).sin();
        Vec2::from_heading(mid) * scale
    }

    /// Extrapolated position at `tick`; ticks at or before the sample return it unchanged
    pub fn advance(&self, tick: u64) -> Vec2 {
        self.position + self.displacement(tick.saturating_sub(self.tick))
    }

    /// Tick-by-tick integration of the same motion
    pub fn advance_stepwise(&self, tick: u64) -> Vec2 {
        let steps = tick.saturating_sub(self.tick);
        let mut position = self.position;
        let mut heading = self.heading;
        for _ in 0..steps {
            position = position.project(heading, self.velocity);
            heading += self.turn_rate;
        }
        position
    }

    /// Heading expected at `tick` under the constant turn rate
    pub fn heading_at(&self, tick: u64) -> f64 {
        let steps = tick.saturating_sub(self.tick) as f64;
        crate::util::angle::normal_absolute(self.heading + steps * self.turn_rate)
    }
}
