/// Arena rules the host enforces - the planner must respect the same limits
pub mod rules {
    /// Maximum absolute velocity (units per tick)
    pub const MAX_VELOCITY: f64 = 8.0;
    /// Velocity gained per tick when accelerating
    pub const ACCELERATION: f64 = 1.0;
    /// Velocity lost per tick when braking
    pub const DECELERATION: f64 = 2.0;
    /// Maximum body turn rate at standstill (degrees per tick)
    pub const MAX_TURN_RATE_DEG: f64 = 10.0;
    /// Gun turret turn rate (degrees per tick)
    pub const GUN_TURN_RATE_DEG: f64 = 20.0;
    /// Radar turn rate (degrees per tick)
    pub const RADAR_TURN_RATE_DEG: f64 = 45.0;
    /// Body is a square of this side length
    pub const BODY_SIZE: f64 = 36.0;
    /// Half the body width, used as the hit tolerance for intercepts
    pub const HALF_BODY: f64 = BODY_SIZE / 2.0;
    /// Smallest bullet power the host accepts
    pub const MIN_BULLET_POWER: f64 = 0.1;
    /// Largest bullet power the host accepts
    pub const MAX_BULLET_POWER: f64 = 3.0;
    /// Gun heat lost per tick unless the host reports otherwise
    pub const DEFAULT_GUN_COOLING_RATE: f64 = 0.1;

    /// Bullet speed for a given power: 20 - 3 * power
    #[inline]
    pub fn bullet_speed(power: f64) -> f64 {
        20.0 - 3.0 * power
    }

    /// Gun heat generated by firing
    #[inline]
    pub fn gun_heat(power: f64) -> f64 {
        1.0 + power / 5.0
    }

    /// Damage dealt by a bullet of the given power
    pub fn bullet_damage(power: f64) -> f64 {
        let damage = 4.0 * power;
        if power > 1.0 {
            damage + 2.0 * (power - 1.0)
        } else {
            damage
        }
    }

    /// Body turn limit at a given speed (radians per tick)
    #[inline]
    pub fn max_turn_rate(velocity: f64) -> f64 {
        (MAX_TURN_RATE_DEG - 0.75 * velocity.abs()).to_radians()
    }

    /// Power whose damage just finishes an opponent with `energy` left
    pub fn kill_power(energy: f64) -> f64 {
        if energy > 4.0 {
            (energy + 2.0) / 6.0
        } else {
            energy / 4.0
        }
    }
}

/// Target tracking constants
pub mod tracking {
    /// Recordings kept per opponent
    pub const TRACK_CAPACITY: usize = 10;
    /// Energy at or below which an opponent is considered finishable
    pub const WEAK_ENERGY: f64 = 16.0;
    /// Largest energy drop read as a shot
    pub const MAX_SHOT_ENERGY_DROP: f64 = 3.0;
}

/// Gun and intercept constants
pub mod targeting {
    /// Gun heat above which a new target may be picked
    pub const RETARGET_GUN_HEAT: f64 = 0.7;
    /// Remaining gun turn at which the gun counts as aligned (degrees)
    pub const FIRE_ALIGNMENT_DEG: f64 = 2.0;
    /// Energy kept back when choosing bullet power
    pub const ENERGY_RESERVE: f64 = 0.5;
    /// Default (max distance, power) table, biased up close and down far
    pub const POWER_TABLE: [(f64, f64); 4] = [
        (150.0, 3.0),
        (350.0, 2.0),
        (600.0, 1.5),
        (f64::INFINITY, 1.0),
    ];
}

/// Guess-factor learning constants
pub mod learning {
    /// Distinct |velocity| buckets (0..=8 after truncation)
    pub const VELOCITY_BUCKETS: usize = 9;
    /// Angular buckets across [-1, 1]; odd so a centre bucket exists
    pub const ANGULAR_BUCKETS: usize = 31;
    /// Power levels the histogram is split by
    pub const POWER_LEVELS: [f64; 5] = [0.5, 1.0, 1.5, 2.0, 3.0];
    /// |dp| under which a wave counts as breaking over its target
    pub const WAVE_TOLERANCE: f64 = 10.0;
    /// Observations needed before a histogram cell biases aim
    pub const MIN_SAMPLES: u32 = 5;
}

/// Navigation constants
pub mod nav {
    /// Distance kept from walls when picking waypoints
    pub const WALL_BUFFER: f64 = super::rules::BODY_SIZE + 10.0;
    /// Recoil after ramming an opponent
    pub const ROBOT_RECOIL: f64 = 150.0;
    /// Recoil after hitting a wall
    pub const WALL_RECOIL: f64 = 60.0;
    /// Random dodge bounds after being hit by a bullet
    pub const DODGE_MIN: f64 = 30.0;
    pub const DODGE_MAX: f64 = 150.0;
    /// Remaining distance under which a move counts as done
    pub const DISTANCE_EPSILON: f64 = 0.5;
    /// Remaining turn under which a turn counts as done (radians)
    pub const TURN_EPSILON: f64 = 1e-3;
    /// Ticks without progress after which a primitive is treated as finished
    pub const STALL_TICKS: u32 = 3;
}

/// Potential field constants
pub mod field {
    /// Weight of the arena centre
    pub const CENTER_WEIGHT: f64 = 4.0;
    /// Minimum weight of each wall projection
    pub const MIN_WALL_WEIGHT: f64 = 2.0;
    /// Base weight of an opponent before the energy term
    pub const OPPONENT_BASE_WEIGHT: f64 = 2.0;
    /// Base weight of an inferred projectile
    pub const PROJECTILE_WEIGHT: f64 = 2.0;
    /// Force magnitude to travel distance gain
    pub const DISTANCE_GAIN: f64 = 40_000.0;
    /// Shortest forward step when any force acts
    pub const MIN_STEP: f64 = 16.0;
    /// Longest forward step per tick decision
    pub const MAX_STEP: f64 = 120.0;
    /// Lateral offsets of the inferred shot fan
    pub const FAN_OFFSETS: [f64; 9] = [-8.0, -6.0, -4.0, -2.0, 0.0, 2.0, 4.0, 6.0, 8.0];
}
