use crate::game::constants::rules::{kill_power, MAX_BULLET_POWER, MIN_BULLET_POWER};
use crate::game::constants::targeting::{ENERGY_RESERVE, POWER_TABLE};

/// Chooses bullet power from distance, own energy and the target's energy
#[derive(Debug, Clone)]
pub struct PowerSelector {
    /// (max distance, power), ascending by distance
    table: Vec<(f64, f64)>,
    reserve: f64,
}

impl PowerSelector {
    pub fn new(table: Vec<(f64, f64)>, reserve: f64) -> Self {
        Self { table, reserve }
    }

    /// Table power for a distance; beyond the last row the last power applies
    pub fn base_power(&self, distance: f64) -> f64 {
        self.table
            .iter()
            .find(|(max_distance, _)| distance <= *max_distance)
            .or_else(|| self.table.last())
            .map_or(MIN_BULLET_POWER, |(_, power)| *power)
    }

    /// Power to fire with, or `None` when the agent cannot afford a shot
    pub fn select(&self, distance: f64, own_energy: f64, target_energy: f64) -> Option<f64> {
        let affordable = self.base_power(distance).min(own_energy - self.reserve);
        if affordable < MIN_BULLET_POWER {
            return None;
        }
        let power = affordable.min(kill_power(target_energy.max(0.0)));
        Some(power.clamp(MIN_BULLET_POWER, MAX_BULLET_POWER))
    }
}

impl Default for PowerSelector {
    fn default() -> Self {
        Self::new(POWER_TABLE.to_vec(), ENERGY_RESERVE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_table() {
        let selector = PowerSelector::default();
        assert_eq!(selector.base_power(100.0), 3.0);
        assert_eq!(selector.base_power(150.0), 3.0);
        assert_eq!(selector.base_power(300.0), 2.0);
        assert_eq!(selector.base_power(500.0), 1.5);
        assert_eq!(selector.base_power(900.0), 1.0);
    }

    #[test]
    fn test_energy_reserve_caps_power() {
        let selector = PowerSelector::default();
        assert_eq!(selector.select(100.0, 100.0, 100.0), Some(3.0));
        let power = selector.select(100.0, 1.5, 100.0).unwrap_or_default();
        assert!((power - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_shot_when_broke() {
        let selector = PowerSelector::default();
        assert_eq!(selector.select(100.0, 0.55, 100.0), None);
        assert_eq!(selector.select(100.0, 0.0, 100.0), None);
    }

    #[test]
    fn test_kill_power_cap() {
        let selector = PowerSelector::default();
        // 10 energy left needs (10 + 2) / 6 = 2
        let power = selector.select(100.0, 100.0, 10.0).unwrap_or_default();
        assert!((power - 2.0).abs() < 1e-12);
        // Tiny kills still respect the host minimum
        assert_eq!(selector.select(100.0, 100.0, 0.1), Some(MIN_BULLET_POWER));
    }

    #[test]
    fn test_empty_table_falls_back_to_minimum() {
        let selector = PowerSelector::new(Vec::new(), 0.5);
        assert_eq!(selector.base_power(10.0), MIN_BULLET_POWER);
    }
}
