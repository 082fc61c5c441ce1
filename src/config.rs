use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::game::arena::Arena;
use crate::game::constants::{learning, targeting, tracking};

/// Movement strategy driven by the navigation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavMode {
    /// Discrete circular-arc legs between random waypoints
    ArcPursuit,
    /// Continuous steering along summed repulsive forces
    PotentialField,
}

impl FromStr for NavMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "arc" | "arc_pursuit" | "arcpursuit" => Ok(NavMode::ArcPursuit),
            "field" | "potential_field" | "potentialfield" => Ok(NavMode::PotentialField),
            other => Err(format!("unknown navigation mode '{}'", other)),
        }
    }
}

/// How repulsive force falls off with distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForceFalloff {
    /// weight / d²
    InverseSquare,
    /// weight / d
    Inverse,
}

impl ForceFalloff {
    #[inline]
    pub fn magnitude(self, weight: f64, distance: f64) -> f64 {
        match self {
            ForceFalloff::InverseSquare => weight / (distance * distance),
            ForceFalloff::Inverse => weight / distance,
        }
    }
}

impl FromStr for ForceFalloff {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "square" | "inverse_square" => Ok(ForceFalloff::InverseSquare),
            "linear" | "inverse" => Ok(ForceFalloff::Inverse),
            other => Err(format!("unknown force falloff '{}'", other)),
        }
    }
}

/// Agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Arena the agent fights in
    pub arena: Arena,
    /// Navigation strategy
    pub nav_mode: NavMode,
    /// Seed for waypoint and dodge randomness
    pub rng_seed: u64,
    /// Recordings kept per opponent
    pub track_capacity: usize,
    /// Energy never spent on a shot
    pub energy_reserve: f64,
    /// (max distance, power) pairs, ascending by distance
    pub power_table: Vec<(f64, f64)>,
    /// Power levels the guess-factor histogram is split by
    pub power_levels: Vec<f64>,
    /// Angular buckets per histogram row (odd)
    pub angular_buckets: usize,
    /// Observations before a histogram cell biases aim
    pub min_samples: u32,
    /// |dp| under which a wave breaks over its target
    pub wave_tolerance: f64,
    /// Launch a conjectured wave per power level on every scan
    pub virtual_waves: bool,
    /// Potential field falloff
    pub force_falloff: ForceFalloff,
    /// Model each inferred enemy shot as a fan of offsets instead of one line
    pub shot_fan: bool,
    /// Pending host events before callbacks are rejected
    pub inbox_capacity: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            arena: Arena::default(),
            nav_mode: NavMode::ArcPursuit,
            rng_seed: 0x5eed,
            track_capacity: tracking::TRACK_CAPACITY,
            energy_reserve: targeting::ENERGY_RESERVE,
            power_table: targeting::POWER_TABLE.to_vec(),
            power_levels: learning::POWER_LEVELS.to_vec(),
            angular_buckets: learning::ANGULAR_BUCKETS,
            min_samples: learning::MIN_SAMPLES,
            wave_tolerance: learning::WAVE_TOLERANCE,
            virtual_waves: true,
            force_falloff: ForceFalloff::InverseSquare,
            shot_fan: true,
            inbox_capacity: 256,
        }
    }
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            None
        }
    }
}

fn parse_bool_env(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            None
        }
    }
}

impl AgentConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Some(mode) = parse_env::<NavMode>("NAV_MODE") {
            config.nav_mode = mode;
        }

        if let Some(seed) = parse_env::<u64>("RNG_SEED") {
            config.rng_seed = seed;
        }

        if let Some(width) = parse_env::<f64>("ARENA_WIDTH") {
            if width > 0.0 {
                config.arena.width = width;
            } else {
                tracing::warn!("ARENA_WIDTH must be > 0, using default");
            }
        }

        if let Some(height) = parse_env::<f64>("ARENA_HEIGHT") {
            if height > 0.0 {
                config.arena.height = height;
            } else {
                tracing::warn!("ARENA_HEIGHT must be > 0, using default");
            }
        }

        if let Some(capacity) = parse_env::<usize>("TRACK_CAPACITY") {
            if (1..=1000).contains(&capacity) {
                config.track_capacity = capacity;
            } else {
                tracing::warn!("TRACK_CAPACITY must be 1-1000, using default");
            }
        }

        if let Some(reserve) = parse_env::<f64>("ENERGY_RESERVE") {
            if reserve >= 0.0 {
                config.energy_reserve = reserve;
            } else {
                tracing::warn!("ENERGY_RESERVE must be >= 0, using default");
            }
        }

        if let Some(min_samples) = parse_env::<u32>("MIN_SAMPLES") {
            config.min_samples = min_samples;
        }

        if let Some(virtual_waves) = parse_bool_env("VIRTUAL_WAVES") {
            config.virtual_waves = virtual_waves;
        }

        if let Some(falloff) = parse_env::<ForceFalloff>("FORCE_FALLOFF") {
            config.force_falloff = falloff;
        }

        if let Some(fan) = parse_bool_env("SHOT_FAN") {
            config.shot_fan = fan;
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if !(self.arena.width > 0.0 && self.arena.height > 0.0) {
            return Err("arena dimensions must be positive".to_string());
        }
        if self.track_capacity == 0 {
            return Err("track_capacity must be at least 1".to_string());
        }
        if self.energy_reserve < 0.0 {
            return Err("energy_reserve cannot be negative".to_string());
        }
        if self.power_table.is_empty() {
            return Err("power_table cannot be empty".to_string());
        }
        if self
            .power_table
            .windows(2)
            .any(|pair| pair[0].0 >= pair[1].0)
        {
            return Err("power_table distances must be strictly ascending".to_string());
        }
        if self.power_levels.is_empty() {
            return Err("power_levels cannot be empty".to_string());
        }
        if self.angular_buckets < 3 || self.angular_buckets % 2 == 0 {
            return Err("angular_buckets must be odd and at least 3".to_string());
        }
        if self.wave_tolerance <= 0.0 {
            return Err("wave_tolerance must be positive".to_string());
        }
        if self.inbox_capacity == 0 {
            return Err("inbox_capacity must be at least 1".to_string());
        }
        Ok(())
    }
}
