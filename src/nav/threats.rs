//! Enemy shots inferred from energy drops
//!
//! Firing costs the shooter exactly the bullet power, so an energy drop of at
//! most 3 between two sightings is read as a shot aimed at us. Each inferred
//! shot can be spread into a fan of lines covering lateral velocities -8..8,
//! weighted toward the head-on line.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::game::arena::Arena;
use crate::game::constants::field::{FAN_OFFSETS, PROJECTILE_WEIGHT};
use crate::game::constants::rules::{bullet_speed, MIN_BULLET_POWER};
use crate::game::constants::tracking::MAX_SHOT_ENERGY_DROP;
use crate::tracking::recording::Recording;
use crate::util::angle::{bearing, normal_absolute, normal_relative};
use crate::util::vec2::Vec2;

/// One line of a conjectured enemy shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferredShot {
    pub shooter: String,
    pub origin: Vec2,
    pub heading: f64,
    pub speed: f64,
    pub fire_tick: u64,
    /// Lateral velocity this line assumes we escape with
    pub offset: f64,
}

impl InferredShot {
    pub fn position(&self, tick: u64) -> Vec2 {
        let travelled = tick.saturating_sub(self.fire_tick) as f64 * self.speed;
        self.origin.project(self.heading, travelled)
    }

    /// Repulsion weight: head-on lines matter most
    pub fn weight(&self) -> f64 {
        PROJECTILE_WEIGHT / (self.offset.abs() + 1.0)
    }

    /// Still in the arena and still approaching `me`
    pub fn is_live(&self, tick: u64, me: Vec2, arena: &Arena) -> bool {
        let p = self.position(tick);
        arena.contains(p) && normal_relative(self.heading - bearing(p, me)).abs() <= std::f64::consts::FRAC_PI_2
    }
}

pub struct ThreatTracker {
    shots: Mutex<Vec<InferredShot>>,
    fan: bool,
}

impl ThreatTracker {
    pub fn new(fan: bool) -> Self {
        Self {
            shots: Mutex::new(Vec::new()),
            fan,
        }
    }

    /// Compare two consecutive sightings of `shooter`; returns lines added
    pub fn infer(&self, shooter: &str, previous: &Recording, current: &Recording, me: Vec2) -> usize {
        let drop = previous.energy - current.energy;
        if !(drop > 0.0 && drop <= MAX_SHOT_ENERGY_DROP) {
            return 0;
        }
        let speed = bullet_speed(drop.max(MIN_BULLET_POWER));
        let head_on = bearing(current.position, me);
        let offsets: &[f64] = if self.fan { &FAN_OFFSETS } else { &[0.0] };

        let mut shots = self.shots.lock();
        for &offset in offsets {
            let lead = (offset / speed).clamp(-1.0, 1.0).asin();
            shots.push(InferredShot {
                shooter: shooter.to_string(),
                origin: current.position,
                heading: normal_absolute(head_on + lead),
                speed,
                fire_tick: previous.tick,
                offset,
            });
        }
        trace!(shooter, power = drop, lines = offsets.len(), "Inferred enemy shot");
        offsets.len()
    }

    /// Drop lines that left the arena or already passed `me`
    pub fn prune(&self, tick: u64, me: Vec2, arena: &Arena) -> usize {
        let mut shots = self.shots.lock();
        let before = shots.len();
        shots.retain(|shot| shot.is_live(tick, me, arena));
        before - shots.len()
    }

    /// (position, weight) of every tracked line at `tick`
    pub fn positions(&self, tick: u64) -> Vec<(Vec2, f64)> {
        self.shots
            .lock()
            .iter()
            .map(|shot| (shot.position(tick), shot.weight()))
            .collect()
    }

    pub fn drop_shooter(&self, shooter: &str) {
        self.shots.lock().retain(|shot| shot.shooter != shooter);
    }

    pub fn len(&self) -> usize {
        self.shots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shots.lock().is_empty()
    }

    pub fn clear(&self) {
        self.shots.lock().clear();
    }
}

impl Default for ThreatTracker {
    fn default() -> Self {
        Self::new(true)
    }
}
