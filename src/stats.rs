//! Decision counters
//!
//! Lock-free counters bumped from the decision loop, plus a rolling window of
//! decision times. `snapshot()` gives a serializable view for reporting.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Samples kept for decision time percentiles
const TIME_HISTORY: usize = 1000;

#[derive(Debug)]
pub struct DecisionStats {
    pub ticks: AtomicU64,
    pub scans: AtomicU64,
    pub shots: AtomicU64,
    pub shots_guess_factor: AtomicU64,
    pub no_solution: AtomicU64,
    pub waves_launched: AtomicU64,
    pub waves_hit: AtomicU64,
    pub waves_passed: AtomicU64,
    pub inferred_shots: AtomicU64,
    pub recoils: AtomicU64,
    pub legs_planned: AtomicU64,

    // Decision timing (microseconds)
    pub decision_time_us: AtomicU64,
    pub decision_time_p95_us: AtomicU64,
    pub decision_time_max_us: AtomicU64,

    history: RwLock<VecDeque<u64>>,
}

/// Point-in-time copy of every counter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub ticks: u64,
    pub scans: u64,
    pub shots: u64,
    pub shots_guess_factor: u64,
    pub no_solution: u64,
    pub waves_launched: u64,
    pub waves_hit: u64,
    pub waves_passed: u64,
    pub inferred_shots: u64,
    pub recoils: u64,
    pub legs_planned: u64,
    pub decision_time_us: u64,
    pub decision_time_p95_us: u64,
    pub decision_time_max_us: u64,
}

impl DecisionStats {
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            scans: AtomicU64::new(0),
            shots: AtomicU64::new(0),
            shots_guess_factor: AtomicU64::new(0),
            no_solution: AtomicU64::new(0),
            waves_launched: AtomicU64::new(0),
            waves_hit: AtomicU64::new(0),
            waves_passed: AtomicU64::new(0),
            inferred_shots: AtomicU64::new(0),
            recoils: AtomicU64::new(0),
            legs_planned: AtomicU64::new(0),
            decision_time_us: AtomicU64::new(0),
            decision_time_p95_us: AtomicU64::new(0),
            decision_time_max_us: AtomicU64::new(0),
            history: RwLock::new(VecDeque::with_capacity(TIME_HISTORY)),
        }
    }

    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add(counter: &AtomicU64, n: u64) {
        if n > 0 {
            counter.fetch_add(n, Ordering::Relaxed);
        }
    }

    /// Record how long one tick's decision took and update percentiles
    pub fn record_decision_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.decision_time_us.store(us, Ordering::Relaxed);

        let mut history = self.history.write();
        history.push_back(us);
        while history.len() > TIME_HISTORY {
            history.pop_front();
        }

        if history.len() >= 10 {
            let mut sorted: Vec<u64> = history.iter().copied().collect();
            sorted.sort_unstable();
            let p95_idx = (sorted.len() as f64 * 0.95) as usize;
            self.decision_time_p95_us
                .store(sorted[p95_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.decision_time_max_us
                .store(sorted.last().copied().unwrap_or(0), Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            ticks: load(&self.ticks),
            scans: load(&self.scans),
            shots: load(&self.shots),
            shots_guess_factor: load(&self.shots_guess_factor),
            no_solution: load(&self.no_solution),
            waves_launched: load(&self.waves_launched),
            waves_hit: load(&self.waves_hit),
            waves_passed: load(&self.waves_passed),
            inferred_shots: load(&self.inferred_shots),
            recoils: load(&self.recoils),
            legs_planned: load(&self.legs_planned),
            decision_time_us: load(&self.decision_time_us),
            decision_time_p95_us: load(&self.decision_time_p95_us),
            decision_time_max_us: load(&self.decision_time_max_us),
        }
    }

    /// Snapshot as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for DecisionStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = DecisionStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_counters() {
        let stats = DecisionStats::new();
        DecisionStats::bump(&stats.shots);
        DecisionStats::bump(&stats.shots);
        DecisionStats::add(&stats.waves_hit, 3);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.shots, 2);
        assert_eq!(snapshot.waves_hit, 3);
    }

    #[test]
    fn test_record_decision_time() {
        let stats = DecisionStats::new();
        for i in 0..100 {
            stats.record_decision_time(Duration::from_micros(i));
        }
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.decision_time_us, 99);
        assert_eq!(snapshot.decision_time_max_us, 99);
        assert!(snapshot.decision_time_p95_us >= 90);
    }

    #[test]
    fn test_json_format() {
        let stats = DecisionStats::new();
        DecisionStats::bump(&stats.ticks);
        let json = stats.to_json();
        assert!(json.contains("\"ticks\":1"));
        let parsed: StatsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.ticks, 1);
    }
}
