//! Waves: expanding shot frontiers that turn outcomes into histogram writes

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::learning::guess_factor::{
    bucket_index, guess_factor, max_escape_angle, CellKey, GuessFactorContext,
};
use crate::util::angle::{bearing, normal_relative};
use crate::util::vec2::Vec2;

/// Outcome of testing a wave against its target's current position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveState {
    /// Frontier has not reached the target yet
    Active,
    /// Frontier is breaking over the target; carries the angular bucket
    Hit(usize),
    /// Frontier has passed the target
    Passed,
}

/// One real or conjectured shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    pub origin: Vec2,
    /// Head-on bearing from the origin to the target at launch
    pub heading: f64,
    /// Radial speed of the frontier
    pub speed: f64,
    pub fire_tick: u64,
    pub target: String,
    /// Target's lateral break direction at launch, +1 or -1
    pub direction: f64,
    /// Histogram row this wave writes to
    pub key: CellKey,
    /// Whether an actual bullet was fired
    pub real: bool,
}

impl Wave {
    /// Distance the frontier has covered by `tick`
    pub fn radius(&self, tick: u64) -> f64 {
        tick.saturating_sub(self.fire_tick) as f64 * self.speed
    }

    /// Classify against the target's position at `tick`
    pub fn test(&self, target: Vec2, tick: u64, tolerance: f64, buckets: usize) -> WaveState {
        let dp = self.origin.distance_to(target) - self.radius(tick);
        if dp.abs() <= tolerance {
            let offset = normal_relative(bearing(self.origin, target) - self.heading);
            let factor = guess_factor(offset, max_escape_angle(self.speed), self.direction);
            WaveState::Hit(bucket_index(factor, buckets))
        } else if dp < -tolerance {
            WaveState::Passed
        } else {
            WaveState::Active
        }
    }
}

/// Tally of wave resolutions from one update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveReport {
    pub hits: usize,
    pub passes: usize,
}

impl WaveReport {
    pub fn resolved(&self) -> usize {
        self.hits + self.passes
    }
}

/// Active waves; each one leaves the set the moment it resolves
pub struct WaveSet {
    waves: Mutex<Vec<Wave>>,
    tolerance: f64,
}

impl WaveSet {
    pub fn new(tolerance: f64) -> Self {
        Self {
            waves: Mutex::new(Vec::new()),
            tolerance,
        }
    }

    pub fn launch(&self, wave: Wave) {
        self.waves.lock().push(wave);
    }

    /// Test every active wave aimed at `target`, writing hits to the histogram
    pub fn update(
        &self,
        target: &str,
        position: Vec2,
        tick: u64,
        context: &GuessFactorContext,
    ) -> WaveReport {
        let mut report = WaveReport::default();
        let buckets = context.buckets();
        self.waves.lock().retain(|wave| {
            if wave.target != target {
                return true;
            }
            match wave.test(position, tick, self.tolerance, buckets) {
                WaveState::Active => true,
                WaveState::Hit(bucket) => {
                    context.record(target, wave.key, bucket);
                    report.hits += 1;
                    false
                }
                WaveState::Passed => {
                    report.passes += 1;
                    false
                }
            }
        });
        if report.resolved() > 0 {
            trace!(target, tick, hits = report.hits, passes = report.passes, "Waves resolved");
        }
        report
    }

    /// Drop waves whose frontier has grown past `max_radius`; counted as passes
    pub fn expire(&self, tick: u64, max_radius: f64) -> usize {
        let mut waves = self.waves.lock();
        let before = waves.len();
        waves.retain(|wave| wave.radius(tick) <= max_radius);
        before - waves.len()
    }

    /// Drop every wave aimed at a dead opponent
    pub fn drop_target(&self, target: &str) -> usize {
        let mut waves = self.waves.lock();
        let before = waves.len();
        waves.retain(|wave| wave.target != target);
        before - waves.len()
    }

    pub fn len(&self) -> usize {
        self.waves.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.lock().is_empty()
    }

    pub fn clear(&self) {
        self.waves.lock().clear();
    }
}

impl Default for WaveSet {
    fn default() -> Self {
        Self::new(crate::game::constants::learning::WAVE_TOLERANCE)
    }
}
