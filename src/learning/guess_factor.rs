//! Guess-factor histograms
//!
//! A guess factor is the lateral offset at which a wave broke over its
//! target, normalized by the maximum escape angle into [-1, 1] and signed by
//! the target's break direction. Writing multiplies by the direction and
//! reading multiplies by it again, so the two mappings are exact inverses.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::game::constants::learning::{ANGULAR_BUCKETS, POWER_LEVELS, VELOCITY_BUCKETS};
use crate::game::constants::rules::{bullet_speed, MAX_VELOCITY};

/// Velocity bucket for a signed speed: |v| truncated, capped at the top bucket
#[inline]
pub fn velocity_bucket(velocity: f64) -> usize {
    (velocity.abs().trunc() as usize).min(VELOCITY_BUCKETS - 1)
}

/// Index of the configured power level nearest to `power`
pub fn power_index(levels: &[f64], power: f64) -> usize {
    levels
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - power).abs().total_cmp(&(*b - power).abs()))
        .map_or(0, |(i, _)| i)
}

/// Largest bearing offset a target at full speed can reach before a bullet arrives
#[inline]
pub fn max_escape_angle(bullet_speed: f64) -> f64 {
    (MAX_VELOCITY / bullet_speed).clamp(-1.0, 1.0).asin()
}

/// Signed, normalized guess factor for an observed bearing offset
#[inline]
pub fn guess_factor(offset: f64, max_escape: f64, direction: f64) -> f64 {
    if max_escape <= 0.0 {
        return 0.0;
    }
    (offset / max_escape).clamp(-1.0, 1.0) * direction
}

/// Angular bucket for a guess factor
#[inline]
pub fn bucket_index(factor: f64, buckets: usize) -> usize {
    let mid = (buckets - 1) as f64 / 2.0;
    let index = (mid * (factor.clamp(-1.0, 1.0) + 1.0)).round() as usize;
    index.min(buckets - 1)
}

/// Guess factor at the centre of an angular bucket
#[inline]
pub fn bucket_factor(index: usize, buckets: usize) -> f64 {
    let mid = (buckets - 1) as f64 / 2.0;
    (index as f64 - mid) / mid
}

/// Bearing offset to aim at for a guess factor
#[inline]
pub fn aim_offset(factor: f64, direction: f64, max_escape: f64) -> f64 {
    factor * direction * max_escape
}

/// Highest-count bucket; ties go to the bucket nearest the centre
pub fn best_bucket(counts: &[u32]) -> usize {
    let mid = counts.len().saturating_sub(1) / 2;
    let mut best = mid;
    for (i, &count) in counts.iter().enumerate() {
        let best_count = counts[best];
        if count > best_count || (count == best_count && i.abs_diff(mid) < best.abs_diff(mid)) {
            best = i;
        }
    }
    best
}

/// Address of one histogram row: (velocity bucket, power level)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub velocity: usize,
    pub power: usize,
}

/// Per-opponent histogram indexed by [velocity][power level][angular bucket]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessFactorTable {
    power_levels: usize,
    buckets: usize,
    counts: Vec<u32>,
}

impl GuessFactorTable {
    pub fn new(power_levels: usize, buckets: usize) -> Self {
        Self {
            power_levels,
            buckets,
            counts: vec![0; VELOCITY_BUCKETS * power_levels * buckets],
        }
    }

    pub fn buckets(&self) -> usize {
        self.buckets
    }

    fn offset(&self, key: CellKey) -> usize {
        let velocity = key.velocity.min(VELOCITY_BUCKETS - 1);
        let power = key.power.min(self.power_levels - 1);
        (velocity * self.power_levels + power) * self.buckets
    }

    pub fn row(&self, key: CellKey) -> &[u32] {
        let start = self.offset(key);
        &self.counts[start..start + self.buckets]
    }

    pub fn record(&mut self, key: CellKey, bucket: usize) {
        let start = self.offset(key);
        let slot = start + bucket.min(self.buckets - 1);
        self.counts[slot] = self.counts[slot].saturating_add(1);
    }

    /// Observations written to one row
    pub fn samples(&self, key: CellKey) -> u32 {
        self.row(key).iter().sum()
    }

    /// Most frequently observed guess factor of a row
    pub fn best_factor(&self, key: CellKey) -> f64 {
        bucket_factor(best_bucket(self.row(key)), self.buckets)
    }
}

/// Session-scoped histogram store shared by everything that aims or learns
///
/// Cloning shares the same tables. Create one per session and `reset()` it
/// between independent matches.
#[derive(Debug, Clone)]
pub struct GuessFactorContext {
    tables: Arc<Mutex<HashMap<String, GuessFactorTable>>>,
    power_levels: Arc<[f64]>,
    buckets: usize,
}

impl GuessFactorContext {
    pub fn new(power_levels: &[f64], buckets: usize) -> Self {
        let power_levels: Arc<[f64]> = if power_levels.is_empty() {
            Arc::from(&POWER_LEVELS[..])
        } else {
            Arc::from(power_levels)
        };
        Self {
            tables: Arc::new(Mutex::new(HashMap::new())),
            power_levels,
            buckets: buckets.max(1),
        }
    }

    pub fn power_levels(&self) -> &[f64] {
        &self.power_levels
    }

    pub fn buckets(&self) -> usize {
        self.buckets
    }

    /// Histogram row address for a target moving at `velocity` shot at `power`
    pub fn key(&self, velocity: f64, power: f64) -> CellKey {
        CellKey {
            velocity: velocity_bucket(velocity),
            power: power_index(&self.power_levels, power),
        }
    }

    /// Count one observation in the given bucket
    pub fn record(&self, target: &str, key: CellKey, bucket: usize) {
        let mut tables = self.tables.lock();
        tables
            .entry_ref(target)
            .or_insert_with(|| GuessFactorTable::new(self.power_levels.len(), self.buckets))
            .record(key, bucket);
    }

    pub fn samples(&self, target: &str, key: CellKey) -> u32 {
        self.tables
            .lock()
            .get(target)
            .map_or(0, |table| table.samples(key))
    }

    /// Learned bearing offset, once the row holds at least `min_samples` observations
    pub fn aim_offset(
        &self,
        target: &str,
        velocity: f64,
        power: f64,
        direction: f64,
        min_samples: u32,
    ) -> Option<f64> {
        let key = self.key(velocity, power);
        let tables = self.tables.lock();
        let table = tables.get(target)?;
        if table.samples(key) < min_samples.max(1) {
            return None;
        }
        let factor = table.best_factor(key);
        Some(aim_offset(factor, direction, max_escape_angle(bullet_speed(power))))
    }

    pub fn snapshot(&self, target: &str) -> Option<GuessFactorTable> {
        self.tables.lock().get(target).cloned()
    }

    /// Opponents with at least one observation
    pub fn len(&self) -> usize {
        self.tables.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.lock().is_empty()
    }

    /// Forget everything learned
    pub fn reset(&self) {
        self.tables.lock().clear();
    }
}

impl Default for GuessFactorContext {
    fn default() -> Self {
        Self::new(&POWER_LEVELS, ANGULAR_BUCKETS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_bucket() {
        assert_eq!(velocity_bucket(0.0), 0);
        assert_eq!(velocity_bucket(7.9), 7);
        assert_eq!(velocity_bucket(-8.0), 8);
        assert_eq!(velocity_bucket(12.0), 8);
    }

    #[test]
    fn test_power_index_nearest() {
        assert_eq!(power_index(&POWER_LEVELS, 0.1), 0);
        assert_eq!(power_index(&POWER_LEVELS, 1.9), 3);
        assert_eq!(power_index(&POWER_LEVELS, 2.8), 4);
    }

    #[test]
    fn test_bucket_mapping_endpoints() {
        assert_eq!(bucket_index(-1.0, 31), 0);
        assert_eq!(bucket_index(0.0, 31), 15);
        assert_eq!(bucket_index(1.0, 31), 30);
        assert_eq!(bucket_factor(0, 31), -1.0);
        assert_eq!(bucket_factor(15, 31), 0.0);
        assert_eq!(bucket_factor(30, 31), 1.0);
    }

    #[test]
    fn test_best_bucket_tie_breaks_toward_centre() {
        let mut counts = vec![0u32; 31];
        assert_eq!(best_bucket(&counts), 15);
        counts[2] = 4;
        counts[20] = 4;
        assert_eq!(best_bucket(&counts), 20);
        counts[2] = 5;
        assert_eq!(best_bucket(&counts), 2);
    }

    #[test]
    fn test_write_read_inverse_for_both_directions() {
        let mea = max_escape_angle(bullet_speed(2.0));
        for direction in [1.0, -1.0] {
            for target_factor in [-0.8, -0.2, 0.0, 0.4, 1.0] {
                // Bearing offset a target breaking `direction` ends up at
                let offset = target_factor * direction * mea;
                let written = guess_factor(offset, mea, direction);
                let bucket = bucket_index(written, 31);
                let read = aim_offset(bucket_factor(bucket, 31), direction, mea);
                assert!(
                    (read - offset).abs() <= mea / 15.0,
                    "dir {} gf {}: {} vs {}",
                    direction,
                    target_factor,
                    read,
                    offset
                );
            }
        }
    }

    #[test]
    fn test_context_min_samples_gate() {
        let context = GuessFactorContext::default();
        let key = context.key(8.0, 3.0);
        for _ in 0..4 {
            context.record("Walls", key, 25);
        }
        assert_eq!(context.samples("Walls", key), 4);
        assert_eq!(context.aim_offset("Walls", 8.0, 3.0, 1.0, 5), None);

        context.record("Walls", key, 25);
        let offset = context.aim_offset("Walls", 8.0, 3.0, 1.0, 5).unwrap_or_default();
        let expected = bucket_factor(25, 31) * max_escape_angle(11.0);
        assert!((offset - expected).abs() < 1e-12);

        let mirrored = context.aim_offset("Walls", 8.0, 3.0, -1.0, 5).unwrap_or_default();
        assert!((mirrored + expected).abs() < 1e-12);
    }

    #[test]
    fn test_context_shared_between_clones_and_reset() {
        let context = GuessFactorContext::default();
        let other = context.clone();
        other.record("Crazy", CellKey { velocity: 3, power: 1 }, 10);
        assert_eq!(context.len(), 1);
        assert!(context.snapshot("Crazy").is_some());
        context.reset();
        assert!(other.is_empty());
    }

    #[test]
    fn test_max_escape_angle_clamped() {
        assert!((max_escape_angle(8.0) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((max_escape_angle(16.0) - 0.5f64.asin()).abs() < 1e-12);
    }
}
